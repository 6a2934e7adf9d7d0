//! Key schema for the descriptor grammar
//!
//! The whole document is checked against the schema before any value is read,
//! so a misspelled key is reported as such rather than as the missing setting
//! it was meant to be.

use crate::error::{DescriptorError, Result};
use toml::{Table, Value};

/// Shape of the value stored under a key.
#[derive(Debug, Clone, Copy)]
enum Shape {
    /// Scalar or array of scalars; types are checked when the value is read
    Value,
    /// Nested table with a fixed set of keys
    Table(&'static [Field]),
    /// Table of user-named entries, each a table with a fixed set of keys
    Named(&'static [Field]),
    /// Array of tables with a fixed set of keys
    Tables(&'static [Field]),
}

#[derive(Debug, Clone, Copy)]
struct Field {
    name: &'static str,
    shape: Shape,
}

const fn value(name: &'static str) -> Field {
    Field {
        name,
        shape: Shape::Value,
    }
}

const fn nested(name: &'static str, shape: Shape) -> Field {
    Field { name, shape }
}

const DEFAULT_CONFIG: &[Field] = &[
    value("application_id"),
    value("min_sdk"),
    value("target_sdk"),
    value("version_code"),
    value("version_name"),
    value("multi_dex_enabled"),
    value("abi_filters"),
];

const BUILD_FEATURES: &[Field] = &[value("build_config")];

const COMPILE_OPTIONS: &[Field] = &[
    value("source_compatibility"),
    value("target_compatibility"),
];

const KOTLIN_OPTIONS: &[Field] = &[value("jvm_target")];

const SIGNING_CONFIG: &[Field] = &[
    value("store_file"),
    value("store_password_env"),
    value("key_alias"),
    value("key_password_env"),
];

const BUILD_TYPE: &[Field] = &[
    value("minify_enabled"),
    value("shrink_resources"),
    value("signing_config"),
];

const PACKAGING: &[Field] = &[value("pick_first")];

const ANDROID: &[Field] = &[
    value("namespace"),
    value("compile_sdk"),
    nested("default_config", Shape::Table(DEFAULT_CONFIG)),
    nested("build_features", Shape::Table(BUILD_FEATURES)),
    nested("compile_options", Shape::Table(COMPILE_OPTIONS)),
    nested("kotlin_options", Shape::Table(KOTLIN_OPTIONS)),
    nested("signing_configs", Shape::Named(SIGNING_CONFIG)),
    nested("build_types", Shape::Named(BUILD_TYPE)),
    nested("packaging", Shape::Table(PACKAGING)),
];

const FLUTTER: &[Field] = &[value("source")];

const DEPENDENCY: &[Field] = &[
    value("configuration"),
    value("coordinate"),
    value("version"),
];

const ROOT: &[Field] = &[
    value("plugins"),
    nested("android", Shape::Table(ANDROID)),
    nested("flutter", Shape::Table(FLUTTER)),
    nested("dependencies", Shape::Tables(DEPENDENCY)),
];

/// Join a parent key path and a child key.
pub(crate) fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

#[derive(Default)]
struct Findings {
    unknown: Vec<String>,
    malformed: Vec<String>,
}

/// Check every key of the document against the grammar.
///
/// Unknown keys win over structural errors: if the document has both, the
/// first unknown key (in key order) is reported.
pub(crate) fn check(document: &Table) -> Result<()> {
    let mut findings = Findings::default();
    walk(document, ROOT, "", &mut findings);

    if let Some(path) = findings.unknown.into_iter().next() {
        return Err(DescriptorError::UnknownKey(path));
    }
    if !findings.malformed.is_empty() {
        return Err(DescriptorError::malformed(findings.malformed.join("; ")));
    }
    Ok(())
}

fn walk(table: &Table, fields: &[Field], path: &str, findings: &mut Findings) {
    for (key, entry) in table {
        let child = join(path, key);
        let Some(field) = fields.iter().find(|f| f.name == key.as_str()) else {
            findings.unknown.push(child);
            continue;
        };

        match field.shape {
            Shape::Value => {}
            Shape::Table(inner) => match entry {
                Value::Table(t) => walk(t, inner, &child, findings),
                _ => findings.malformed.push(format!("{} must be a table", child)),
            },
            Shape::Named(inner) => match entry {
                Value::Table(t) => {
                    for (name, item) in t {
                        let item_path = join(&child, name);
                        match item {
                            Value::Table(it) => walk(it, inner, &item_path, findings),
                            _ => findings
                                .malformed
                                .push(format!("{} must be a table", item_path)),
                        }
                    }
                }
                _ => findings.malformed.push(format!("{} must be a table", child)),
            },
            Shape::Tables(inner) => match entry {
                Value::Array(items) => {
                    for (index, item) in items.iter().enumerate() {
                        let item_path = format!("{}[{}]", child, index);
                        match item {
                            Value::Table(it) => walk(it, inner, &item_path, findings),
                            _ => findings
                                .malformed
                                .push(format!("{} must be a table", item_path)),
                        }
                    }
                }
                _ => findings
                    .malformed
                    .push(format!("{} must be an array of tables", child)),
            },
        }
    }
}
