//! Field schemas for REST routes
//!
//! A route's writable fields are described by a [`FieldSchema`]: an ordered
//! table of [`FieldDescriptor`]s, each pairing a [`Sanitizer`] with an
//! optional [`Validator`]. Field kinds are data, not types; the closed set of
//! built-in behaviours covers the common cases and `Custom` carries the rest.

use crate::validity::FieldError;
use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Number, Value};
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Custom sanitizer function
pub type SanitizeFn = Arc<dyn Fn(&Value) -> Sanitized + Send + Sync>;

/// Custom validator function
pub type ValidateFn = Arc<dyn Fn(&Value) -> Result<(), FieldError> + Send + Sync>;

/// Result of sanitizing one field value
///
/// Sanitizers never fail the overall operation; a value they refuse is
/// reported through the `Rejected` marker.
#[derive(Debug, Clone, PartialEq)]
pub enum Sanitized {
    /// Clean value to write back
    Value(Value),
    /// Value could not be coerced
    Rejected(FieldError),
}

/// Built-in sanitizers
#[derive(Clone, Default)]
pub enum Sanitizer {
    /// Pass through unchanged
    #[default]
    Identity,
    /// Trim surrounding whitespace from strings
    Trim,
    /// Coerce numbers and numeric strings to an `i64`
    Integer,
    /// Coerce `true`/`false`/`1`/`0` (and string forms) to a boolean
    Boolean,
    /// Coerce to a number clamped into `[min, max]`
    ///
    /// Bounds that are NaN or out of order reject every value.
    Clamp { min: f64, max: f64 },
    /// Caller-supplied function
    Custom(SanitizeFn),
}

impl Sanitizer {
    /// Wrap a custom function
    #[inline]
    #[must_use]
    pub fn custom(f: impl Fn(&Value) -> Sanitized + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }

    /// Apply to a raw value
    #[must_use]
    pub fn apply(&self, value: &Value) -> Sanitized {
        match self {
            Self::Identity => Sanitized::Value(value.clone()),
            Self::Trim => match value {
                Value::String(s) => Sanitized::Value(Value::String(s.trim().to_string())),
                other => Sanitized::Value(other.clone()),
            },
            Self::Integer => match as_i64(value) {
                Some(n) => Sanitized::Value(Value::from(n)),
                None => Sanitized::Rejected(type_error("integer", value)),
            },
            Self::Boolean => match value {
                Value::Bool(b) => Sanitized::Value(Value::Bool(*b)),
                Value::Number(n) if n.as_i64() == Some(0) => Sanitized::Value(Value::Bool(false)),
                Value::Number(n) if n.as_i64() == Some(1) => Sanitized::Value(Value::Bool(true)),
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" => Sanitized::Value(Value::Bool(true)),
                    "false" | "0" | "" => Sanitized::Value(Value::Bool(false)),
                    _ => Sanitized::Rejected(type_error("boolean", value)),
                },
                _ => Sanitized::Rejected(type_error("boolean", value)),
            },
            Self::Clamp { min, max } if min.is_nan() || max.is_nan() || min > max => {
                Sanitized::Rejected(
                    FieldError::new(
                        "rest_invalid_param",
                        format!("clamp bounds [{min}, {max}] are invalid"),
                    )
                    .with_data(serde_json::json!({ "min": min, "max": max })),
                )
            }
            Self::Clamp { min, max } => match as_f64(value) {
                Some(n) if n.is_finite() => Sanitized::Value(number(n.clamp(*min, *max))),
                _ => Sanitized::Rejected(type_error("number", value)),
            },
            Self::Custom(f) => f(value),
        }
    }
}

impl Debug for Sanitizer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => f.write_str("Identity"),
            Self::Trim => f.write_str("Trim"),
            Self::Integer => f.write_str("Integer"),
            Self::Boolean => f.write_str("Boolean"),
            Self::Clamp { min, max } => f
                .debug_struct("Clamp")
                .field("min", min)
                .field("max", max)
                .finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Built-in validators
#[derive(Clone)]
pub enum Validator {
    /// Strings must be non-empty, arrays/objects must have members
    NonEmpty { code: String, message: String },
    /// Numbers must lie in `[min, max]`
    Range { min: f64, max: f64 },
    /// Value must equal one of the listed values
    OneOf(Vec<Value>),
    /// String must match the pattern
    Pattern(Regex),
    /// Caller-supplied function
    Custom(ValidateFn),
}

impl Validator {
    /// Non-empty check with a specific error code
    #[inline]
    #[must_use]
    pub fn non_empty(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NonEmpty {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Wrap a custom function
    #[inline]
    #[must_use]
    pub fn custom(f: impl Fn(&Value) -> Result<(), FieldError> + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }

    /// Check a sanitized value
    ///
    /// # Errors
    /// Returns the named [`FieldError`] describing the failure.
    pub fn check(&self, value: &Value) -> Result<(), FieldError> {
        match self {
            Self::NonEmpty { code, message } => {
                let empty = match value {
                    Value::Null => true,
                    Value::String(s) => s.is_empty(),
                    Value::Array(a) => a.is_empty(),
                    Value::Object(o) => o.is_empty(),
                    Value::Bool(_) | Value::Number(_) => false,
                };
                if empty {
                    Err(FieldError::new(code.clone(), message.clone()))
                } else {
                    Ok(())
                }
            }
            Self::Range { min, max } => match as_f64(value) {
                Some(n) if n >= *min && n <= *max => Ok(()),
                _ => Err(FieldError::new(
                    "rest_invalid_param",
                    format!("value must be between {min} and {max}"),
                )
                .with_data(serde_json::json!({ "min": min, "max": max }))),
            },
            Self::OneOf(allowed) => {
                if allowed.contains(value) {
                    Ok(())
                } else {
                    Err(FieldError::new(
                        "rest_invalid_param",
                        format!("value is not one of {}", Value::Array(allowed.clone())),
                    ))
                }
            }
            Self::Pattern(re) => match value {
                Value::String(s) if re.is_match(s) => Ok(()),
                _ => Err(FieldError::new(
                    "rest_invalid_param",
                    format!("value does not match pattern {}", re.as_str()),
                )),
            },
            Self::Custom(f) => f(value),
        }
    }
}

impl Debug for Validator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonEmpty { code, .. } => f.debug_struct("NonEmpty").field("code", code).finish(),
            Self::Range { min, max } => f
                .debug_struct("Range")
                .field("min", min)
                .field("max", max)
                .finish(),
            Self::OneOf(values) => f.debug_tuple("OneOf").field(values).finish(),
            Self::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Description of one writable field
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: String,
    sanitizer: Sanitizer,
    validator: Option<Validator>,
    required: bool,
}

impl FieldDescriptor {
    /// Field with identity sanitizer and no validator
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sanitizer: Sanitizer::Identity,
            validator: None,
            required: false,
        }
    }

    /// With sanitizer
    #[inline]
    #[must_use]
    pub fn sanitize(mut self, sanitizer: Sanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// With validator
    #[inline]
    #[must_use]
    pub fn validate(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Mark as required on creation
    #[inline]
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }

    #[inline]
    #[must_use]
    pub fn validator(&self) -> Option<&Validator> {
        self.validator.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// Ordered field table for one route
///
/// Iteration order is insertion order and drives sanitization order.
#[derive(Debug, Clone, Default)]
pub struct FieldSchema {
    fields: IndexMap<String, FieldDescriptor>,
}

impl FieldSchema {
    /// Create empty schema
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, replacing any previous field of the same name in place
    #[must_use]
    pub fn field(mut self, descriptor: FieldDescriptor) -> Self {
        self.insert(descriptor);
        self
    }

    /// Add a field in place
    pub fn insert(&mut self, descriptor: FieldDescriptor) {
        self.fields.insert(descriptor.name.clone(), descriptor);
    }

    /// Descriptor by name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    /// Iterate descriptors in field order
    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }

    /// Field names in order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// Exact for i64 inputs; fractional values truncate toward zero
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn as_i64(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    if let Value::String(s) = value {
        if let Ok(n) = s.trim().parse::<i64>() {
            return Some(n);
        }
    }
    let n = as_f64(value)?.trunc();
    (n.is_finite() && n >= i64::MIN as f64 && n < i64::MAX as f64).then_some(n as i64)
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// Integral values stay integers in the canonical encoding
#[allow(clippy::cast_possible_truncation)]
fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

fn type_error(expected: &str, value: &Value) -> FieldError {
    FieldError::new(
        "rest_invalid_type",
        format!("{value} is not of type {expected}"),
    )
    .with_data(serde_json::json!({ "expected": expected }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trim_strings_only() {
        assert_eq!(Sanitizer::Trim.apply(&json!("  Hi  ")), Sanitized::Value(json!("Hi")));
        assert_eq!(Sanitizer::Trim.apply(&json!(3)), Sanitized::Value(json!(3)));
    }

    #[test]
    fn integer_coerces_numeric_strings() {
        assert_eq!(Sanitizer::Integer.apply(&json!("42")), Sanitized::Value(json!(42)));
        assert_eq!(Sanitizer::Integer.apply(&json!(7.9)), Sanitized::Value(json!(7)));
        assert!(matches!(
            Sanitizer::Integer.apply(&json!("abc")),
            Sanitized::Rejected(e) if e.code == "rest_invalid_type"
        ));
    }

    #[test]
    fn boolean_accepts_string_forms() {
        assert_eq!(Sanitizer::Boolean.apply(&json!("true")), Sanitized::Value(json!(true)));
        assert_eq!(Sanitizer::Boolean.apply(&json!(0)), Sanitized::Value(json!(false)));
        assert!(matches!(Sanitizer::Boolean.apply(&json!("maybe")), Sanitized::Rejected(_)));
    }

    #[test]
    fn clamp_bounds_numbers() {
        let clamp = Sanitizer::Clamp { min: 0.0, max: 10.0 };
        assert_eq!(clamp.apply(&json!(50)), Sanitized::Value(json!(10)));
        assert_eq!(clamp.apply(&json!(-3)), Sanitized::Value(json!(0)));
        assert_eq!(clamp.apply(&json!(2.5)), Sanitized::Value(json!(2.5)));
    }

    #[test]
    fn clamp_with_bad_bounds_rejects() {
        let inverted = Sanitizer::Clamp { min: 10.0, max: 0.0 };
        assert!(matches!(
            inverted.apply(&json!(5)),
            Sanitized::Rejected(e) if e.code == "rest_invalid_param"
        ));

        let nan = Sanitizer::Clamp { min: f64::NAN, max: 1.0 };
        assert!(matches!(nan.apply(&json!(0.5)), Sanitized::Rejected(_)));
    }

    #[test]
    fn integer_stays_in_i64() {
        assert_eq!(
            Sanitizer::Integer.apply(&json!(i64::MAX)),
            Sanitized::Value(json!(i64::MAX))
        );
        assert_eq!(
            Sanitizer::Integer.apply(&json!("9007199254740993")),
            Sanitized::Value(json!(9_007_199_254_740_993_i64))
        );
        assert_eq!(Sanitizer::Integer.apply(&json!(-2.7)), Sanitized::Value(json!(-2)));
        assert!(matches!(Sanitizer::Integer.apply(&json!(1e20)), Sanitized::Rejected(_)));
        assert!(matches!(Sanitizer::Integer.apply(&json!("-1e30")), Sanitized::Rejected(_)));
    }

    #[test]
    fn non_empty_uses_given_code() {
        let v = Validator::non_empty("empty_title", "Title cannot be empty");
        assert!(v.check(&json!("Hi")).is_ok());
        let err = v.check(&json!("")).unwrap_err();
        assert_eq!(err.code, "empty_title");
    }

    #[test]
    fn range_one_of_pattern() {
        assert!(Validator::Range { min: 1.0, max: 5.0 }.check(&json!(3)).is_ok());
        assert!(Validator::Range { min: 1.0, max: 5.0 }.check(&json!(9)).is_err());
        assert!(Validator::OneOf(vec![json!("draft"), json!("publish")])
            .check(&json!("draft"))
            .is_ok());
        let slug = Validator::Pattern(Regex::new("^[a-z-]+$").unwrap());
        assert!(slug.check(&json!("hello-world")).is_ok());
        assert!(slug.check(&json!("Hello World")).is_err());
    }

    #[test]
    fn schema_preserves_order() {
        let schema = FieldSchema::new()
            .field(FieldDescriptor::new("title").required())
            .field(FieldDescriptor::new("content"))
            .field(FieldDescriptor::new("status"));

        assert_eq!(schema.names(), vec!["title", "content", "status"]);
        assert!(schema.get("title").unwrap().is_required());
        assert!(!schema.get("content").unwrap().is_required());
        assert_eq!(schema.len(), 3);
    }
}
