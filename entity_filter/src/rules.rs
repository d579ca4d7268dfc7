//! Rule-based input filter
//!
//! Each [`FieldInput`] transforms its raw value, then checks it. Checks are run by the
//! `validator` crate and reported through its `ValidationError` type.

use crate::input::InputFilter;
use serde_json::Value;
use std::borrow::Cow;
use table_mapper::{debug_log, Row};
use validator::{ValidateEmail, ValidateLength, ValidateRange, ValidateUrl, ValidationError};

const REQUIRED_MESSAGE: &str = "Value is required and can't be empty";

/// Value rewrite applied before checks
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    Trim,
    Lowercase,
    Uppercase,
    /// Integer-looking strings become numbers; anything else is left alone
    ToInt,
    /// `""` becomes `null`
    EmptyToNull,
}

impl Transform {
    fn apply(&self, value: Value) -> Value {
        match (self, value) {
            (Transform::Trim, Value::String(s)) => Value::String(s.trim().to_string()),
            (Transform::Lowercase, Value::String(s)) => Value::String(s.to_lowercase()),
            (Transform::Uppercase, Value::String(s)) => Value::String(s.to_uppercase()),
            (Transform::ToInt, Value::String(s)) => match s.trim().parse::<i64>() {
                Ok(n) => Value::from(n),
                Err(_) => Value::String(s),
            },
            (Transform::ToInt, Value::Number(n)) => match n.as_f64() {
                Some(f) if n.as_i64().is_none() => Value::from(f.trunc() as i64),
                _ => Value::Number(n),
            },
            (Transform::EmptyToNull, Value::String(s)) if s.is_empty() => Value::Null,
            (_, other) => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Check {
    NotEmpty,
    Email,
    Url,
    /// Character count bounds, inclusive
    Length { min: Option<u64>, max: Option<u64> },
    /// Numeric bounds, inclusive; numeric strings are accepted
    Range { min: Option<f64>, max: Option<f64> },
    OneOf(Vec<Value>),
}

impl Check {
    fn run(&self, value: &Value) -> Result<(), ValidationError> {
        match self {
            Check::NotEmpty => {
                if is_empty(value) {
                    return Err(failure("not_empty", REQUIRED_MESSAGE.to_string()));
                }
            }
            Check::Email => {
                if !as_text(value).is_some_and(|text| text.validate_email()) {
                    return Err(failure(
                        "email",
                        "The input is not a valid email address".to_string(),
                    ));
                }
            }
            Check::Url => {
                if !as_text(value).is_some_and(|text| text.validate_url()) {
                    return Err(failure("url", "The input is not a valid URL".to_string()));
                }
            }
            Check::Length { min, max } => {
                let fits = as_text(value).is_some_and(|text| {
                    let text: &str = &text;
                    text.validate_length(*min, *max, None)
                });
                if !fits {
                    return Err(failure("length", length_message(*min, *max)));
                }
            }
            Check::Range { min, max } => {
                let fits = as_number(value).is_some_and(|n| n.validate_range(*min, *max, None, None));
                if !fits {
                    return Err(failure("range", range_message(*min, *max)));
                }
            }
            Check::OneOf(allowed) => {
                if !allowed.contains(value) {
                    return Err(failure(
                        "one_of",
                        "The input was not found in the haystack".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn failure(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Owned(message));
    error
}

fn length_message(min: Option<u64>, max: Option<u64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("The input must be between {} and {} characters", min, max),
        (Some(min), None) => format!("The input is less than {} characters long", min),
        (None, Some(max)) => format!("The input is more than {} characters long", max),
        (None, None) => "The input has an invalid length".to_string(),
    }
}

fn range_message(min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("The input is not between {} and {}", min, max),
        (Some(min), None) => format!("The input is not greater than or equal to {}", min),
        (None, Some(max)) => format!("The input is not less than or equal to {}", max),
        (None, None) => "The input is not a number".to_string(),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn as_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// One named input: transforms then checks
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInput {
    name: String,
    required: bool,
    transforms: Vec<Transform>,
    checks: Vec<Check>,
}

impl FieldInput {
    /// A required input
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            transforms: Vec::new(),
            checks: Vec::new(),
        }
    }

    /// An input that may be missing or empty; checks only run on a value
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::new(name)
        }
    }

    pub fn transform(mut self, transform: Transform) -> Self {
        self.transforms.push(transform);
        self
    }

    pub fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// `Ok(None)` for an optional input that was not submitted
    fn evaluate(&self, raw: Option<&Value>) -> Result<Option<Value>, Vec<ValidationError>> {
        let value = match raw {
            Some(raw) => self
                .transforms
                .iter()
                .fold(raw.clone(), |value, transform| transform.apply(value)),
            None if self.required => {
                return Err(vec![failure("required", REQUIRED_MESSAGE.to_string())]);
            }
            None => return Ok(None),
        };

        if is_empty(&value) {
            if self.required {
                return Err(vec![failure("required", REQUIRED_MESSAGE.to_string())]);
            }
            return Ok(Some(value));
        }

        let errors: Vec<ValidationError> = self
            .checks
            .iter()
            .filter_map(|check| check.run(&value).err())
            .collect();

        if errors.is_empty() {
            Ok(Some(value))
        } else {
            Err(errors)
        }
    }
}

/// Input filter over a fixed list of [`FieldInput`]s
#[derive(Debug, Clone, Default)]
pub struct InputFilterSet {
    inputs: Vec<FieldInput>,
    data: Row,
    values: Row,
    invalid: Vec<(String, Vec<ValidationError>)>,
}

impl InputFilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an input, replacing one with the same name
    pub fn add(mut self, input: FieldInput) -> Self {
        self.inputs.retain(|existing| existing.name != input.name);
        self.inputs.push(input);
        self
    }

    pub fn input(&self, name: &str) -> Option<&FieldInput> {
        self.inputs.iter().find(|input| input.name == name)
    }

    pub fn data(&self) -> &Row {
        &self.data
    }

    /// Failures with their `validator` codes
    pub fn failures(&self) -> &[(String, Vec<ValidationError>)] {
        &self.invalid
    }

    fn has_input(&self, name: &str) -> bool {
        self.inputs.iter().any(|input| input.name == name)
    }
}

impl InputFilter for InputFilterSet {
    fn set_data(&mut self, data: Row) {
        self.data = data;
        self.values.clear();
        self.invalid.clear();
    }

    fn is_valid(&mut self) -> bool {
        self.values.clear();
        self.invalid.clear();

        for input in &self.inputs {
            match input.evaluate(self.data.get(&input.name)) {
                Ok(Some(value)) => {
                    self.values.insert(input.name.clone(), value);
                }
                Ok(None) => {}
                Err(errors) => {
                    debug_log!("[FILTER] '{}' failed {} check(s)", input.name, errors.len());
                    self.invalid.push((input.name.clone(), errors));
                }
            }
        }

        self.invalid.is_empty()
    }

    fn values(&self) -> Row {
        self.values.clone()
    }

    fn unknown(&self) -> Row {
        self.data
            .iter()
            .filter(|(key, _)| !self.has_input(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    fn invalid_messages(&self) -> Vec<(String, Vec<String>)> {
        self.invalid
            .iter()
            .map(|(field, errors)| {
                let messages = errors
                    .iter()
                    .map(|error| match &error.message {
                        Some(message) => message.to_string(),
                        None => error.code.to_string(),
                    })
                    .collect();
                (field.clone(), messages)
            })
            .collect()
    }

    fn raw_value(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    fn input_names(&self) -> Vec<String> {
        self.inputs.iter().map(|input| input.name.clone()).collect()
    }

    fn remove(&mut self, name: &str) -> bool {
        let before = self.inputs.len();
        self.inputs.retain(|input| input.name != name);
        self.values.remove(name);
        self.invalid.retain(|(field, _)| field != name);
        self.inputs.len() != before
    }
}
