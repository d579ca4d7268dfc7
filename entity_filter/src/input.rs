//! Input filter contract
//!
//! An input filter is seeded with a row of raw data, validates it against its inputs
//! and exposes the filtered values. [`InputFilterExt`] adds the helpers callers
//! actually use: flattened error messages, merged data and input pruning.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use table_mapper::Row;

/// One failed check on one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub message: String,
    pub field: String,
    /// Raw value as submitted, `null` when the field was missing
    pub value: Value,
}

pub trait InputFilter: Send + Sync {
    /// Replace the data under validation; previous results are discarded
    fn set_data(&mut self, data: Row);

    fn is_valid(&mut self) -> bool;

    /// Filtered values of the inputs that passed, keyed by input name
    fn values(&self) -> Row;

    /// Submitted keys that no input is registered for
    fn unknown(&self) -> Row;

    /// Messages of every failed input, in input order
    fn invalid_messages(&self) -> Vec<(String, Vec<String>)>;

    fn raw_value(&self, field: &str) -> Option<&Value>;

    fn input_names(&self) -> Vec<String>;

    /// Drop an input; true when it existed
    fn remove(&mut self, name: &str) -> bool;
}

pub trait InputFilterExt: InputFilter {
    /// Every failure as a `{message, field, value}` entry
    fn errors_messages(&self) -> Vec<FieldError> {
        self.invalid_messages()
            .into_iter()
            .flat_map(|(field, messages)| {
                let value = self.raw_value(&field).cloned().unwrap_or(Value::Null);
                messages.into_iter().map(move |message| FieldError {
                    message,
                    field: field.clone(),
                    value: value.clone(),
                })
            })
            .collect()
    }

    /// Filtered values followed by the keys no input knows about
    fn filter_data(&self) -> Row {
        let mut data = self.values();
        for (key, value) in self.unknown() {
            data.insert(key, value);
        }
        data
    }

    fn remove_filters(&mut self, names: &[&str]) {
        for name in names {
            self.remove(name);
        }
    }

    /// Keep only the named inputs
    fn apply_only(&mut self, names: &[&str]) {
        for input in self.input_names() {
            if !names.contains(&input.as_str()) {
                self.remove(&input);
            }
        }
    }
}

impl<T: InputFilter + ?Sized> InputFilterExt for T {}
