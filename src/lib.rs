//! Revenue and margin impact of a rate card uplift applied to a selection of
//! roles, from an effective month onward.

pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod loader;
pub mod output;
pub mod reports;
pub mod schema;
pub mod types;
pub mod util;

pub use dataset::{Dataset, MonthColumn, RateCardRow, RoleIdentity};
pub use error::{ConfigError, DatasetError, ExportError, LoadError, MarginIssue, UpliftError};
pub use types::{FilterCriteria, UpliftKind, UpliftOutcome, UpliftParams};
