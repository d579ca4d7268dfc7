//! Data Grid - jqGrid-style listings over table-mapper queries
//!
//! Client filter rules are translated into bound predicates, field names are checked
//! against the base query before they reach SQL, and results come back in the grid's
//! paging envelope together with a token for the filtered query.

pub mod adapter;
pub mod envelope;
pub mod errors;
pub mod rule;
pub mod translator;

pub use adapter::{FieldKind, Grid};
pub use config::{GridSettings, RulePolicy};
pub use envelope::{GridEnvelope, GridParams, GridState, PageSummary, QueryToken, UserData};
pub use errors::GridError;
pub use rule::{FilterRule, FilterRuleSet, GroupOp, RuleOperator};
pub use translator::translate;
