//! Entity Filter - input validation for entities
//!
//! [`InputFilter`] is the contract a filter engine fulfils, [`InputFilterSet`] is a
//! rule-based engine on top of the `validator` crate, and [`Filterable`] lets an entity
//! own a filter and validate itself through it.

pub mod errors;
pub mod filterable;
pub mod input;
pub mod rules;

pub use errors::FilterError;
pub use filterable::{FilterSlot, Filterable};
pub use input::{FieldError, InputFilter, InputFilterExt};
pub use rules::{Check, FieldInput, InputFilterSet, Transform};
