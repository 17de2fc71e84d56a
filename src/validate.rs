//! Field validation, run separately from decoding.
//!
//! Every rule is evaluated and every violation kept. Violations are keyed by
//! a flat field path (`transformations[1].width`) in the order the fields
//! were checked.
use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

pub const BLANK: &str = "cannot be blank";
pub const INVALID_VALUE: &str = "must be a valid value";

pub fn no_less_than(min: impl fmt::Display) -> String {
    format!("must be no less than {min}")
}

pub fn no_greater_than(max: impl fmt::Display) -> String {
    format!("must be no greater than {max}")
}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

impl<T: Validate + ?Sized> Validate for Box<T> {
    fn validate(&self) -> Result<(), ValidationErrors> {
        (**self).validate()
    }
}

/// Aggregated violations: field path → message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(IndexMap<String, String>);

impl ValidationErrors {
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
    pub fn into_inner(self) -> IndexMap<String, String> {
        self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            if field.is_empty() {
                f.write_str(message)?;
            } else {
                write!(f, "{field}: {message}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Collects violations for one value.
#[derive(Debug, Default)]
pub struct Validator {
    errors: IndexMap<String, String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn violation(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.errors.entry(field.to_owned()).or_insert_with(|| message.into());
        self
    }

    pub fn check(&mut self, field: &str, ok: bool, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.violation(field, message);
        }
        self
    }

    /// Merges a child's violations under `field`; a child key of `""` is the field itself.
    pub fn merge(&mut self, field: &str, child: ValidationErrors) -> &mut Self {
        for (key, message) in child.0 {
            let key = match (field.is_empty(), key.is_empty()) {
                (_, true) => field.to_owned(),
                (true, false) => key,
                (false, false) if key.starts_with('[') => format!("{field}{key}"),
                (false, false) => format!("{field}.{key}"),
            };
            self.errors.entry(key).or_insert(message);
        }
        self
    }

    pub fn nested<T: Validate + ?Sized>(&mut self, field: &str, value: &T) -> &mut Self {
        if let Err(child) = value.validate() {
            self.merge(field, child);
        }
        self
    }

    /// Validates the value if present.
    pub fn optional<T: Validate>(&mut self, field: &str, value: &Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.nested(field, value);
        }
        self
    }

    /// Requires presence, then validates the value.
    pub fn required<T: Validate>(&mut self, field: &str, value: &Option<T>) -> &mut Self {
        match value {
            Some(value) => self.nested(field, value),
            None => self.violation(field, BLANK),
        }
    }

    pub fn each<T: Validate>(&mut self, field: &str, values: &[T]) -> &mut Self {
        for (index, value) in values.iter().enumerate() {
            self.nested(&format!("{field}[{index}]"), value);
        }
        self
    }

    /// Requires a non-empty list, then validates every member.
    pub fn required_each<T: Validate>(&mut self, field: &str, values: &[T]) -> &mut Self {
        if values.is_empty() {
            self.violation(field, BLANK);
        }
        self.each(field, values)
    }

    /// Inclusive bounds on a present value; literal-only callers pass `slot.literal()`.
    pub fn range<T>(&mut self, field: &str, value: Option<T>, min: Option<T>, max: Option<T>) -> &mut Self
    where
        T: PartialOrd + fmt::Display,
    {
        let Some(value) = value else { return self };
        if let Some(min) = min.filter(|min| value < *min) {
            return self.violation(field, no_less_than(min));
        }
        if let Some(max) = max.filter(|max| value > *max) {
            return self.violation(field, no_greater_than(max));
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), ValidationErrors> {
        let errors = std::mem::take(&mut self.errors);
        if errors.is_empty() { Ok(()) } else { Err(ValidationErrors(errors)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Leaf(Option<i64>);

    impl Validate for Leaf {
        fn validate(&self) -> Result<(), ValidationErrors> {
            Validator::new()
                .check("", self.0.is_some(), BLANK)
                .range("", self.0, Some(1), Some(100))
                .finish()
        }
    }

    #[test]
    fn aggregates_instead_of_short_circuiting() {
        let err = Validator::new()
            .violation("width", BLANK)
            .violation("height", BLANK)
            .finish()
            .unwrap_err();
        assert_eq!(err.len(), 2);
        assert_eq!(err.to_string(), "width: cannot be blank; height: cannot be blank");
    }

    #[test]
    fn nested_keys_flatten() {
        let leaves = vec![Leaf(Some(5)), Leaf(Some(0)), Leaf(None)];
        let err = Validator::new().each("items", &leaves).nested("solo", &Leaf(Some(101))).finish().unwrap_err();
        assert_eq!(err.get("items[1]"), Some("must be no less than 1"));
        assert_eq!(err.get("items[2]"), Some(BLANK));
        assert_eq!(err.get("solo"), Some("must be no greater than 100"));
        assert!(!err.contains("items[0]"));
    }

    #[test]
    fn required_reports_absent_values() {
        let missing: Option<Leaf> = None;
        let err = Validator::new().required("value", &missing).required_each::<Leaf>("list", &[]).finish().unwrap_err();
        assert_eq!(err.get("value"), Some(BLANK));
        assert_eq!(err.get("list"), Some(BLANK));
    }
}
