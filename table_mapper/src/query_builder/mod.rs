//! Query construction
//!
//! Descriptors for SELECT and write statements plus their Postgres rendering.

pub mod aggregation;
pub mod builder;
pub mod filter;
pub mod grouping;
pub mod join;
pub mod ordering;
pub mod pagination;
pub mod sql_generation;
pub mod statement;

#[cfg(test)]
mod tests;

pub use aggregation::{AggregateFunction, SelectField};
pub use builder::Select;
pub use filter::{LogicalOperator, QueryCondition, QueryFilter, QueryOperator};
pub use grouping::GroupBy;
pub use join::{JoinClause, JoinCondition, JoinType};
pub use ordering::SortOrder;
pub use pagination::Pagination;
pub use sql_generation::SqlGenerator;
pub use statement::{Delete, Insert, Statement, Update};
