//! Field validation for build descriptors
//!
//! Validation collects every violation instead of stopping at the first one,
//! so a single run reports all problems in a descriptor.
//!
//! # Example
//!
//! ```rust
//! use buildspec_core::validation::Validator;
//!
//! let result = Validator::new()
//!     .required("namespace", "com.example.app")
//!     .ordered("sdk", ("min_sdk", 23), ("target_sdk", 35))
//!     .validate();
//!
//! assert!(result.is_valid());
//! ```

use regex::Regex;
use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Field that failed validation
    pub field: String,
    /// Error message
    pub message: String,
    /// Error code
    pub code: String,
    /// Expected value (if applicable)
    pub expected: Option<String>,
    /// Actual value (if applicable)
    pub actual: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// Create a new empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get all errors
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Add an error
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Join all error messages into one line
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Fluent validator builder
pub struct Validator {
    result: ValidationResult,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Create a new validator
    pub fn new() -> Self {
        Self {
            result: ValidationResult::new(),
        }
    }

    fn fail(
        mut self,
        field: &str,
        code: &str,
        message: String,
        expected: Option<String>,
        actual: Option<String>,
    ) -> Self {
        self.result.add_error(ValidationError {
            field: field.to_string(),
            message,
            code: code.to_string(),
            expected,
            actual,
        });
        self
    }

    /// Validate that a field is not empty
    pub fn required(self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            return self.fail(
                field,
                "REQUIRED",
                "Field is required".to_string(),
                Some("non-empty value".to_string()),
                Some("empty".to_string()),
            );
        }
        self
    }

    /// Validate against a precompiled pattern
    pub fn pattern(self, field: &str, value: &str, re: &Regex, description: &str) -> Self {
        if !re.is_match(value) {
            return self.fail(
                field,
                "PATTERN",
                format!("Must be {}", description),
                Some(description.to_string()),
                Some(value.to_string()),
            );
        }
        self
    }

    /// Validate a numeric range (inclusive)
    pub fn range<T: PartialOrd + Display>(self, field: &str, value: T, min: T, max: T) -> Self {
        if value < min || value > max {
            return self.fail(
                field,
                "RANGE",
                format!("Must be between {} and {}", min, max),
                Some(format!("{} - {}", min, max)),
                Some(value.to_string()),
            );
        }
        self
    }

    /// Validate that `lower.1 <= upper.1`
    pub fn ordered<T: PartialOrd + Display>(
        self,
        field: &str,
        lower: (&str, T),
        upper: (&str, T),
    ) -> Self {
        if lower.1 > upper.1 {
            return self.fail(
                field,
                "ORDER",
                format!(
                    "{} ({}) must not exceed {} ({})",
                    lower.0, lower.1, upper.0, upper.1
                ),
                Some(format!("{} <= {}", lower.0, upper.0)),
                Some(format!("{} > {}", lower.1, upper.1)),
            );
        }
        self
    }

    /// Validate that no value appears twice
    pub fn unique<T, I>(self, field: &str, values: I) -> Self
    where
        T: Eq + Hash + Display,
        I: IntoIterator<Item = T>,
    {
        let mut seen = HashSet::new();
        let duplicate = values.into_iter().find_map(|v| {
            let label = v.to_string();
            if seen.insert(v) { None } else { Some(label) }
        });
        match duplicate {
            Some(dup) => self.fail(
                field,
                "DUPLICATE",
                format!("Duplicate entry: {}", dup),
                Some("unique entries".to_string()),
                Some(dup),
            ),
            None => self,
        }
    }

    /// Validate that a collection is not empty
    pub fn non_empty<T>(self, field: &str, values: &[T]) -> Self {
        if values.is_empty() {
            return self.fail(
                field,
                "NON_EMPTY",
                "At least one entry is required".to_string(),
                Some("one or more entries".to_string()),
                Some("none".to_string()),
            );
        }
        self
    }

    /// Add a custom validation
    pub fn custom<F>(self, field: &str, f: F) -> Self
    where
        F: FnOnce() -> Option<String>,
    {
        match f() {
            Some(message) => self.fail(field, "CUSTOM", message, None, None),
            None => self,
        }
    }

    /// Complete validation and return result
    pub fn validate(self) -> ValidationResult {
        self.result
    }
}
