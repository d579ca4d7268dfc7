//! Entity validation by composition
//!
//! An entity owns a [`FilterSlot`] and implements [`Filterable`] to say how validated
//! values are written back. Everything else comes from the trait's provided methods.

use crate::errors::FilterError;
use crate::input::{FieldError, InputFilter, InputFilterExt};
use serde_json::Value;
use table_mapper::{debug_log, to_row, Entity};

/// Holder for the input filter attached to an entity
#[derive(Default)]
pub struct FilterSlot {
    filter: Option<Box<dyn InputFilter>>,
}

impl std::fmt::Debug for FilterSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterSlot")
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl FilterSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_attached(&self) -> bool {
        self.filter.is_some()
    }

    pub fn get(&self) -> Option<&dyn InputFilter> {
        self.filter.as_deref()
    }

    pub fn get_mut(&mut self) -> Option<&mut (dyn InputFilter + 'static)> {
        self.filter.as_deref_mut()
    }

    /// Install `filter`, dropping any previous one
    pub fn attach(&mut self, filter: Box<dyn InputFilter>) -> &mut (dyn InputFilter + 'static) {
        &mut **self.filter.insert(filter)
    }

    pub fn detach(&mut self) -> Option<Box<dyn InputFilter>> {
        self.filter.take()
    }
}

pub trait Filterable: Entity {
    fn filter_slot(&self) -> &FilterSlot;

    fn filter_slot_mut(&mut self) -> &mut FilterSlot;

    /// Write one validated value into the entity; false when `field` is not one of its fields
    fn assign(&mut self, field: &str, value: Value) -> bool;

    /// Attach `filter`, seeded with the entity's current row
    fn add_filter(
        &mut self,
        mut filter: Box<dyn InputFilter>,
    ) -> Result<&mut (dyn InputFilter + 'static), FilterError> {
        let row = to_row(&*self)?;
        filter.set_data(row);
        Ok(self.filter_slot_mut().attach(filter))
    }

    fn remove_filters(&mut self, names: &[&str]) -> Result<(), FilterError> {
        let filter = self
            .filter_slot_mut()
            .get_mut()
            .ok_or_else(FilterError::missing_context::<Self>)?;
        filter.remove_filters(names);
        Ok(())
    }

    /// Validate the attached filter; on success copy its values onto known fields
    fn do_validate(&mut self) -> Result<bool, FilterError> {
        let filter = self
            .filter_slot_mut()
            .get_mut()
            .ok_or_else(FilterError::missing_context::<Self>)?;

        if !filter.is_valid() {
            return Ok(false);
        }

        let values = filter.values();
        for (field, value) in values {
            if !self.assign(&field, value) {
                debug_log!("[FILTER] '{}' is not a field of the entity", field);
            }
        }
        Ok(true)
    }

    fn filter(&self) -> Option<&dyn InputFilter> {
        self.filter_slot().get()
    }

    fn validation_errors(&self) -> Result<Vec<FieldError>, FilterError> {
        self.filter_slot()
            .get()
            .map(|filter| filter.errors_messages())
            .ok_or_else(FilterError::missing_context::<Self>)
    }
}
