//! # date-resolver
//!
//! Deterministic resolution of casual day expressions for event lookups.
//!
//! Given free text such as `"tonight"`, `"friday"` or `"3rd May 2025"`, an
//! optional city name and an explicit "now", produce the `[timeMin, timeMax)`
//! UTC window covering the intended local calendar day in that city's
//! timezone. Nothing here touches the clock or the network.
//!
//! ## Modules
//!
//! - [`zones`] — city → IANA timezone table with a documented default
//! - [`expression`] — classify text into a [`TemporalExpression`]
//! - [`resolver`] — expression + zone + now → [`ResolvedRange`]
//! - [`range`] — the half-open UTC window and its query-string form
//! - [`error`] — Error types

pub mod error;
pub mod expression;
pub mod range;
pub mod resolver;
pub mod zones;

pub use error::ResolverError;
pub use expression::{RelativeDay, TemporalExpression};
pub use range::{format_instant, ResolvedRange};
pub use resolver::{resolve_expression, resolve_with, DateResolver, EVENING_START_HOUR};
pub use zones::{parse_timezone, TimeZoneMap, DEFAULT_ZONE};
