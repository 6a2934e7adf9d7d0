//! Typed access to a parsed descriptor document
//!
//! Keys are assumed to have passed [`crate::schema::check`]; the reader only
//! checks value types and ranges.

use crate::error::{DescriptorError, Result};
use crate::schema::join;
use toml::{Table, Value};

/// A table in the document together with its dotted key path.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Section<'a> {
    path: &'a str,
    table: &'a Table,
}

/// Owned key path for a section, kept alive while its [`Section`] is in use.
pub(crate) struct KeyPath(String);

impl KeyPath {
    pub(crate) fn root() -> Self {
        Self(String::new())
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'a> Section<'a> {
    pub(crate) fn new(path: &'a KeyPath, table: &'a Table) -> Self {
        Self {
            path: path.as_str(),
            table,
        }
    }

    /// Dotted path of a key in this section
    pub(crate) fn key_path(&self, key: &str) -> String {
        join(self.path, key)
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.table.contains_key(key)
    }

    fn missing(&self, key: &str) -> DescriptorError {
        DescriptorError::malformed(format!(
            "missing required setting {}",
            self.key_path(key)
        ))
    }

    fn mistyped(&self, key: &str, expected: &str) -> DescriptorError {
        DescriptorError::malformed(format!("{} must be {}", self.key_path(key), expected))
    }

    /// Nested table, with the path it must be read under
    pub(crate) fn table(&self, key: &str) -> Option<(KeyPath, &'a Table)> {
        self.table
            .get(key)
            .and_then(Value::as_table)
            .map(|t| (KeyPath(self.key_path(key)), t))
    }

    /// Nested table that must be present
    pub(crate) fn require_table(&self, key: &str) -> Result<(KeyPath, &'a Table)> {
        self.table(key).ok_or_else(|| self.missing(key))
    }

    /// Entries of a table whose keys are user-chosen names
    pub(crate) fn named_tables(&self, key: &str) -> Vec<(&'a str, KeyPath, &'a Table)> {
        let Some((path, table)) = self.table(key) else {
            return Vec::new();
        };
        table
            .iter()
            .filter_map(|(name, v)| {
                v.as_table()
                    .map(|t| (name.as_str(), KeyPath(join(path.as_str(), name)), t))
            })
            .collect()
    }

    /// Elements of an array of tables, in declaration order
    pub(crate) fn table_array(&self, key: &str) -> Vec<(KeyPath, &'a Table)> {
        let Some(items) = self.table.get(key).and_then(Value::as_array) else {
            return Vec::new();
        };
        items
            .iter()
            .enumerate()
            .filter_map(|(index, v)| {
                v.as_table()
                    .map(|t| (KeyPath(format!("{}[{}]", self.key_path(key), index)), t))
            })
            .collect()
    }

    pub(crate) fn string(&self, key: &str) -> Result<Option<String>> {
        match self.table.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.mistyped(key, "a string")),
        }
    }

    pub(crate) fn require_string(&self, key: &str) -> Result<String> {
        self.string(key)?.ok_or_else(|| self.missing(key))
    }

    /// Integer that must fit in `T`
    pub(crate) fn integer<T: TryFrom<i64>>(&self, key: &str) -> Result<Option<T>> {
        match self.table.get(key) {
            None => Ok(None),
            Some(Value::Integer(i)) => T::try_from(*i)
                .map(Some)
                .map_err(|_| self.mistyped(key, "a non-negative integer in range")),
            Some(_) => Err(self.mistyped(key, "an integer")),
        }
    }

    pub(crate) fn require_integer<T: TryFrom<i64>>(&self, key: &str) -> Result<T> {
        self.integer(key)?.ok_or_else(|| self.missing(key))
    }

    pub(crate) fn boolean(&self, key: &str) -> Result<Option<bool>> {
        match self.table.get(key) {
            None => Ok(None),
            Some(Value::Boolean(b)) => Ok(Some(*b)),
            Some(_) => Err(self.mistyped(key, "a boolean")),
        }
    }

    pub(crate) fn strings(&self, key: &str) -> Result<Option<Vec<String>>> {
        match self.table.get(key) {
            None => Ok(None),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    _ => Err(self.mistyped(key, "an array of strings")),
                })
                .collect::<Result<Vec<_>>>()
                .map(Some),
            Some(_) => Err(self.mistyped(key, "an array of strings")),
        }
    }
}
