//! The validated build descriptor
//!
//! [`ConfigDescriptor::load`] turns descriptor text into an immutable value.
//! Loading is all-or-nothing: either every setting is recognized and every
//! invariant holds, or an error is returned and nothing is kept.

use crate::error::{ensure, DescriptorError, Result};
use crate::model::{
    ApplicationIdentity, ArchitectureSet, BuildVariant, Dependency, DependencyConfiguration,
    SdkBounds, SigningConfig, ToolchainOptions, DEBUG_SIGNING,
};
use crate::packaging::{PackagingCandidate, PackagingRule};
use crate::reader::{KeyPath, Section};
use crate::schema;
use buildspec_core::validation::Validator;
use serde::Serialize;
use std::collections::BTreeMap;

/// Validated, read-only view of an application module's build settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigDescriptor {
    plugins: Vec<String>,
    identity: ApplicationIdentity,
    sdk: SdkBounds,
    architectures: ArchitectureSet,
    toolchain: ToolchainOptions,
    signing_configs: BTreeMap<String, SigningConfig>,
    variants: BTreeMap<String, BuildVariant>,
    packaging_rules: Vec<PackagingRule>,
    dependencies: Vec<Dependency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    flutter_source: Option<String>,
}

impl ConfigDescriptor {
    /// Parse and validate descriptor text.
    pub fn load(source: &str) -> Result<Self> {
        let document: toml::Table = toml::from_str(source)
            .map_err(|e| DescriptorError::malformed(format!("invalid TOML: {}", e.message())))?;
        schema::check(&document)?;

        let root_path = KeyPath::root();
        let root = Section::new(&root_path, &document);

        let plugins = read_plugins(&root)?;

        let (android_path, android_table) = root.require_table("android")?;
        let android = Section::new(&android_path, android_table);
        let (defaults_path, defaults_table) = android.require_table("default_config")?;
        let defaults = Section::new(&defaults_path, defaults_table);

        let identity = ApplicationIdentity::new(
            android.require_string("namespace")?,
            defaults.require_string("application_id")?,
            defaults.require_integer("version_code")?,
            defaults.require_string("version_name")?,
        )?;

        let sdk = SdkBounds::new(
            defaults.require_integer("min_sdk")?,
            defaults.require_integer("target_sdk")?,
            android.require_integer("compile_sdk")?,
        )?;

        let abi_filters = defaults.strings("abi_filters")?.ok_or_else(|| {
            DescriptorError::malformed(format!(
                "missing required setting {} (declare at least one architecture)",
                defaults.key_path("abi_filters")
            ))
        })?;
        let architectures = ArchitectureSet::parse(&abi_filters)?;

        let toolchain = read_toolchain(&android, &defaults)?;
        let signing_configs = read_signing_configs(&android)?;
        let variants = read_variants(&android, &signing_configs)?;
        let packaging_rules = read_packaging(&android)?;
        let dependencies = read_dependencies(&root)?;

        let flutter_source = match root.table("flutter") {
            Some((path, table)) => Some(Section::new(&path, table).require_string("source")?),
            None => None,
        };
        if let Some(source) = &flutter_source {
            ensure(
                Validator::new()
                    .required("flutter.source", source)
                    .validate(),
            )?;
        }

        let descriptor = Self {
            plugins,
            identity,
            sdk,
            architectures,
            toolchain,
            signing_configs,
            variants,
            packaging_rules,
            dependencies,
            flutter_source,
        };

        tracing::debug!(
            application_id = descriptor.identity.application_id(),
            architectures = descriptor.architectures.len(),
            variants = descriptor.variants.len(),
            dependencies = descriptor.dependencies.len(),
            "Loaded build descriptor"
        );

        Ok(descriptor)
    }

    /// Look up a declared build variant.
    pub fn resolve_variant(&self, name: &str) -> Result<&BuildVariant> {
        self.variants
            .get(name)
            .ok_or_else(|| DescriptorError::UnknownVariant {
                name: name.to_string(),
                declared: self.variants.keys().cloned().collect(),
            })
    }

    /// Pick the single candidate for a declared pick-first pattern.
    ///
    /// Among the candidates whose path matches `pattern`, the one shipped by
    /// the earliest declared dependency wins.
    pub fn resolve_packaging_conflict<'c>(
        &self,
        pattern: &str,
        candidates: &'c [PackagingCandidate],
    ) -> Result<&'c PackagingCandidate> {
        let rule = self
            .packaging_rules
            .iter()
            .find(|r| r.pattern() == pattern)
            .ok_or_else(|| {
                DescriptorError::ambiguous(pattern, "no pick-first rule is declared for this pattern")
            })?;

        rule.resolve(candidates, &self.dependencies).inspect_err(|e| {
            tracing::warn!(pattern, error = %e, "Packaging conflict left unresolved");
        })
    }

    /// First declared rule covering a package path
    pub fn packaging_rule_for(&self, path: &str) -> Option<&PackagingRule> {
        self.packaging_rules.iter().find(|r| r.matches(path))
    }

    /// Plugin ids in declaration order
    pub fn plugins(&self) -> &[String] {
        &self.plugins
    }

    /// Application identity and version
    pub fn identity(&self) -> &ApplicationIdentity {
        &self.identity
    }

    /// SDK levels
    pub fn sdk(&self) -> &SdkBounds {
        &self.sdk
    }

    /// ABIs to build native code for
    pub fn architectures(&self) -> &ArchitectureSet {
        &self.architectures
    }

    /// Compiler and packaging switches
    pub fn toolchain(&self) -> &ToolchainOptions {
        &self.toolchain
    }

    /// Declared variants by name
    pub fn variants(&self) -> impl Iterator<Item = &BuildVariant> {
        self.variants.values()
    }

    /// Signing configurations by name, including the built-in `debug`
    pub fn signing_configs(&self) -> impl Iterator<Item = &SigningConfig> {
        self.signing_configs.values()
    }

    /// Signing configuration by name
    pub fn signing_config(&self, name: &str) -> Option<&SigningConfig> {
        self.signing_configs.get(name)
    }

    /// Pick-first rules in declaration order
    pub fn packaging_rules(&self) -> &[PackagingRule] {
        &self.packaging_rules
    }

    /// Dependencies in declaration order
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Flutter project root, relative to the module
    pub fn flutter_source(&self) -> Option<&str> {
        self.flutter_source.as_deref()
    }
}

fn read_plugins(root: &Section<'_>) -> Result<Vec<String>> {
    let plugins = root.strings("plugins")?.unwrap_or_default();
    let mut validator = Validator::new().unique("plugins", plugins.iter());
    for plugin in &plugins {
        validator = validator.required("plugins", plugin);
    }
    ensure(validator.validate())?;
    Ok(plugins)
}

fn read_toolchain(android: &Section<'_>, defaults: &Section<'_>) -> Result<ToolchainOptions> {
    let mut options = ToolchainOptions {
        multi_dex_enabled: defaults.boolean("multi_dex_enabled")?.unwrap_or(false),
        ..ToolchainOptions::default()
    };

    if let Some((path, table)) = android.table("build_features") {
        options.build_config = Section::new(&path, table)
            .boolean("build_config")?
            .unwrap_or(false);
    }
    if let Some((path, table)) = android.table("compile_options") {
        let section = Section::new(&path, table);
        options.source_compatibility = section.integer("source_compatibility")?;
        options.target_compatibility = section.integer("target_compatibility")?;
    }
    if let Some((path, table)) = android.table("kotlin_options") {
        options.jvm_target = Section::new(&path, table).string("jvm_target")?;
    }

    options.validate()
}

fn read_signing_configs(android: &Section<'_>) -> Result<BTreeMap<String, SigningConfig>> {
    let mut configs = BTreeMap::new();
    configs.insert(DEBUG_SIGNING.to_string(), SigningConfig::debug());

    for (name, path, table) in android.named_tables("signing_configs") {
        let section = Section::new(&path, table);
        let config = SigningConfig::declared(
            name,
            section.require_string("store_file")?,
            section.require_string("key_alias")?,
            section.string("store_password_env")?,
            section.string("key_password_env")?,
        )?;
        configs.insert(name.to_string(), config);
    }

    Ok(configs)
}

fn read_variants(
    android: &Section<'_>,
    signing_configs: &BTreeMap<String, SigningConfig>,
) -> Result<BTreeMap<String, BuildVariant>> {
    let mut variants = BTreeMap::new();

    for (name, path, table) in android.named_tables("build_types") {
        let section = Section::new(&path, table);
        let signing = section.string("signing_config")?;
        if let Some(reference) = &signing {
            if !signing_configs.contains_key(reference) {
                let known: Vec<&str> = signing_configs.keys().map(String::as_str).collect();
                return Err(DescriptorError::malformed(format!(
                    "{} refers to undefined signing configuration {:?} (defined: {})",
                    section.key_path("signing_config"),
                    reference,
                    known.join(", ")
                )));
            }
        }

        let variant = BuildVariant::new(
            name,
            section.boolean("minify_enabled")?.unwrap_or(false),
            section.boolean("shrink_resources")?.unwrap_or(false),
            signing,
        )?;
        variants.insert(name.to_string(), variant);
    }

    Ok(variants)
}

fn read_packaging(android: &Section<'_>) -> Result<Vec<PackagingRule>> {
    let Some((path, table)) = android.table("packaging") else {
        return Ok(Vec::new());
    };
    let patterns = Section::new(&path, table)
        .strings("pick_first")?
        .unwrap_or_default();

    ensure(
        Validator::new()
            .unique("android.packaging.pick_first", patterns.iter())
            .validate(),
    )?;

    patterns
        .iter()
        .map(|p| PackagingRule::pick_first(p))
        .collect()
}

fn read_dependencies(root: &Section<'_>) -> Result<Vec<Dependency>> {
    let mut dependencies = Vec::new();

    for (path, table) in root.table_array("dependencies") {
        let section = Section::new(&path, table);
        let configuration = match section.string("configuration")? {
            Some(name) => name.parse()?,
            None => DependencyConfiguration::Implementation,
        };
        dependencies.push(Dependency::declared_at(
            path.as_str(),
            configuration,
            section.require_string("coordinate")?,
            section.require_string("version")?,
        )?);
    }

    ensure(
        Validator::new()
            .unique(
                "dependencies",
                dependencies
                    .iter()
                    .map(|d| format!("{} {}", d.configuration(), d.coordinate())),
            )
            .validate(),
    )?;

    Ok(dependencies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Architecture;

    const FLUTTER_APP: &str = r#"
plugins = ["com.android.application", "kotlin-android", "dev.flutter.flutter-gradle-plugin"]

[android]
namespace = "com.example.trackmentalhealth01"
compile_sdk = 36

[android.default_config]
application_id = "com.example.trackmentalhealth01"
min_sdk = 23
target_sdk = 35
version_code = 1
version_name = "1.0.0"
multi_dex_enabled = true
abi_filters = ["arm64-v8a", "armeabi-v7a", "x86_64"]

[android.build_features]
build_config = true

[android.compile_options]
source_compatibility = 11
target_compatibility = 11

[android.kotlin_options]
jvm_target = "21"

[android.build_types.release]
minify_enabled = false
shrink_resources = false
signing_config = "debug"

[android.build_types.debug]
minify_enabled = false
shrink_resources = false

[android.packaging]
pick_first = ["**/libaosl.so", "**/libc++_shared.so", "**/libjsc.so"]

[flutter]
source = "../.."

[[dependencies]]
coordinate = "androidx.multidex:multidex"
version = "2.0.1"

[[dependencies]]
coordinate = "com.google.android.gms:play-services-auth"
version = "21.0.0"
"#;

    fn with_line(extra: &str) -> String {
        format!("{}\n{}", FLUTTER_APP, extra)
    }

    fn replace(from: &str, to: &str) -> String {
        assert!(FLUTTER_APP.contains(from), "fixture lacks {:?}", from);
        FLUTTER_APP.replacen(from, to, 1)
    }

    #[test]
    fn test_load_returns_declared_values() {
        let d = ConfigDescriptor::load(FLUTTER_APP).unwrap();

        assert_eq!(d.plugins().len(), 3);
        assert_eq!(d.identity().namespace(), "com.example.trackmentalhealth01");
        assert_eq!(d.identity().application_id(), "com.example.trackmentalhealth01");
        assert_eq!(d.identity().version_code(), 1);
        assert_eq!(d.identity().version_name(), "1.0.0");
        assert_eq!(
            (d.sdk().min_sdk(), d.sdk().target_sdk(), d.sdk().compile_sdk()),
            (23, 35, 36)
        );
        assert_eq!(
            d.architectures().iter().collect::<Vec<_>>(),
            vec![Architecture::Arm64V8a, Architecture::ArmeabiV7a, Architecture::X86_64]
        );
        assert!(d.toolchain().multi_dex_enabled);
        assert!(d.toolchain().build_config);
        assert_eq!(d.toolchain().source_compatibility, Some(11));
        assert_eq!(d.toolchain().jvm_target.as_deref(), Some("21"));
        assert_eq!(d.variants().count(), 2);
        assert_eq!(d.packaging_rules()[1].pattern(), "**/libc++_shared.so");
        assert_eq!(
            d.dependencies()
                .iter()
                .map(Dependency::notation)
                .collect::<Vec<_>>(),
            vec![
                "androidx.multidex:multidex:2.0.1",
                "com.google.android.gms:play-services-auth:21.0.0"
            ]
        );
        assert_eq!(
            d.dependencies()[0].configuration(),
            DependencyConfiguration::Implementation
        );
        assert_eq!(d.flutter_source(), Some("../.."));
    }

    #[test]
    fn test_load_is_idempotent() {
        let first = ConfigDescriptor::load(FLUTTER_APP).unwrap();
        let second = ConfigDescriptor::load(FLUTTER_APP).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_release_reuses_debug_signing() {
        let d = ConfigDescriptor::load(FLUTTER_APP).unwrap();

        let release = d.resolve_variant("release").unwrap();
        assert_eq!(release.signing_config(), Some("debug"));
        assert!(!release.minify_enabled());
        assert!(d.signing_config("debug").unwrap().is_builtin());

        let debug = d.resolve_variant("debug").unwrap();
        assert_eq!(debug.signing_config(), None);
    }

    #[test]
    fn test_unknown_variant() {
        let d = ConfigDescriptor::load(FLUTTER_APP).unwrap();
        match d.resolve_variant("staging") {
            Err(DescriptorError::UnknownVariant { name, declared }) => {
                assert_eq!(name, "staging");
                assert_eq!(declared, vec!["debug".to_string(), "release".to_string()]);
            }
            other => panic!("expected UnknownVariant, got {:?}", other),
        }
    }

    #[test]
    fn test_pick_first_prefers_earlier_dependency() {
        let d = ConfigDescriptor::load(FLUTTER_APP).unwrap();
        let candidates = [
            PackagingCandidate::new(
                "libfoo/armeabi-v7a/libaosl.so",
                "androidx.multidex:multidex",
            ),
            PackagingCandidate::new(
                "libbar/x86/libaosl.so",
                "com.google.android.gms:play-services-auth",
            ),
        ];

        let winner = d
            .resolve_packaging_conflict("**/libaosl.so", &candidates)
            .unwrap();
        assert_eq!(winner.path, "libfoo/armeabi-v7a/libaosl.so");

        let reversed = [candidates[1].clone(), candidates[0].clone()];
        let winner = d
            .resolve_packaging_conflict("**/libaosl.so", &reversed)
            .unwrap();
        assert_eq!(winner.dependency, "androidx.multidex:multidex");
    }

    #[test]
    fn test_undeclared_pattern_is_ambiguous() {
        let d = ConfigDescriptor::load(FLUTTER_APP).unwrap();
        let candidates = [PackagingCandidate::new(
            "lib/x86/libfbjni.so",
            "androidx.multidex:multidex",
        )];
        assert!(matches!(
            d.resolve_packaging_conflict("**/libfbjni.so", &candidates),
            Err(DescriptorError::AmbiguousPackaging { .. })
        ));
    }

    #[test]
    fn test_packaging_rule_for_path() {
        let d = ConfigDescriptor::load(FLUTTER_APP).unwrap();
        assert_eq!(
            d.packaging_rule_for("lib/x86/libjsc.so").map(PackagingRule::pattern),
            Some("**/libjsc.so")
        );
        assert!(d.packaging_rule_for("lib/x86/libother.so").is_none());
    }

    #[test]
    fn test_min_sdk_above_target_is_malformed() {
        let source = replace("min_sdk = 23", "min_sdk = 36");
        let err = ConfigDescriptor::load(&source).unwrap_err();
        assert!(matches!(err, DescriptorError::MalformedConfig(_)));
        assert!(err.to_string().contains("min_sdk (36) must not exceed target_sdk (35)"));
    }

    #[test]
    fn test_target_above_compile_is_malformed() {
        let source = replace("compile_sdk = 36", "compile_sdk = 34");
        assert!(matches!(
            ConfigDescriptor::load(&source),
            Err(DescriptorError::MalformedConfig(_))
        ));
    }

    #[test]
    fn test_missing_required_fields() {
        for (from, to) in [
            ("application_id = \"com.example.trackmentalhealth01\"\n", ""),
            ("min_sdk = 23\n", ""),
            ("compile_sdk = 36\n", ""),
            ("abi_filters = [\"arm64-v8a\", \"armeabi-v7a\", \"x86_64\"]\n", ""),
            (
                "abi_filters = [\"arm64-v8a\", \"armeabi-v7a\", \"x86_64\"]",
                "abi_filters = []",
            ),
        ] {
            let source = replace(from, to);
            assert!(
                matches!(
                    ConfigDescriptor::load(&source),
                    Err(DescriptorError::MalformedConfig(_))
                ),
                "removing {:?} should be malformed",
                from
            );
        }
    }

    #[test]
    fn test_missing_android_section() {
        let err = ConfigDescriptor::load("plugins = []").unwrap_err();
        assert!(err.to_string().contains("missing required setting android"));
    }

    #[test]
    fn test_unknown_key_fails_closed() {
        let source = replace("min_sdk = 23", "min_skd = 23");
        match ConfigDescriptor::load(&source) {
            Err(DescriptorError::UnknownKey(path)) => {
                assert_eq!(path, "android.default_config.min_skd")
            }
            other => panic!("expected UnknownKey, got {:?}", other),
        }

        let source = with_line("[signing]\nstore = \"x\"");
        assert!(matches!(
            ConfigDescriptor::load(&source),
            Err(DescriptorError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_undefined_signing_reference() {
        let source = replace("signing_config = \"debug\"", "signing_config = \"upload\"");
        let err = ConfigDescriptor::load(&source).unwrap_err();
        assert!(err.to_string().contains("undefined signing configuration \"upload\""));
    }

    #[test]
    fn test_declared_signing_config_resolves() {
        let source = replace("signing_config = \"debug\"", "signing_config = \"upload\"");
        let source = format!(
            "{}\n[android.signing_configs.upload]\nstore_file = \"upload.jks\"\nkey_alias = \"upload\"\nstore_password_env = \"UPLOAD_STORE_PASSWORD\"\n",
            source
        );
        let d = ConfigDescriptor::load(&source).unwrap();
        let release = d.resolve_variant("release").unwrap();
        let signing = d.signing_config(release.signing_config().unwrap()).unwrap();
        assert_eq!(signing.store_file(), Some("upload.jks"));
        assert_eq!(signing.store_password_env(), Some("UPLOAD_STORE_PASSWORD"));
        assert_eq!(d.signing_configs().count(), 2);
    }

    #[test]
    fn test_invalid_identifiers_are_malformed() {
        let source = replace(
            "application_id = \"com.example.trackmentalhealth01\"",
            "application_id = \"trackmentalhealth\"",
        );
        assert!(matches!(
            ConfigDescriptor::load(&source),
            Err(DescriptorError::MalformedConfig(_))
        ));

        let source = replace("version_code = 1", "version_code = -1");
        assert!(matches!(
            ConfigDescriptor::load(&source),
            Err(DescriptorError::MalformedConfig(_))
        ));
    }

    #[test]
    fn test_unknown_architecture_is_malformed() {
        let source = replace("\"x86_64\"]", "\"mips\"]");
        let err = ConfigDescriptor::load(&source).unwrap_err();
        assert!(err.to_string().contains("unsupported architecture \"mips\""));
    }

    #[test]
    fn test_duplicate_dependency_is_malformed() {
        let source = with_line(
            "[[dependencies]]\ncoordinate = \"androidx.multidex:multidex\"\nversion = \"2.0.0\"",
        );
        assert!(matches!(
            ConfigDescriptor::load(&source),
            Err(DescriptorError::MalformedConfig(_))
        ));
    }

    #[test]
    fn test_bad_dependency_names_its_entry() {
        let source = replace(
            "com.google.android.gms:play-services-auth",
            "play-services-auth",
        );
        let err = ConfigDescriptor::load(&source).unwrap_err().to_string();
        assert!(err.contains("dependencies[1].coordinate"), "{}", err);

        let source = replace("version = \"21.0.0\"", "version = \"21.0 .0\"");
        let err = ConfigDescriptor::load(&source).unwrap_err().to_string();
        assert!(err.contains("dependencies[1].version"), "{}", err);
    }

    #[test]
    fn test_same_coordinate_in_other_configuration() {
        let source = with_line(
            "[[dependencies]]\nconfiguration = \"testImplementation\"\ncoordinate = \"androidx.multidex:multidex\"\nversion = \"2.0.1\"",
        );
        let d = ConfigDescriptor::load(&source).unwrap();
        assert_eq!(d.dependencies().len(), 3);
        assert_eq!(
            d.dependencies()[2].configuration(),
            DependencyConfiguration::TestImplementation
        );
    }

    #[test]
    fn test_invalid_toml_is_malformed() {
        assert!(matches!(
            ConfigDescriptor::load("[android\nnamespace = "),
            Err(DescriptorError::MalformedConfig(_))
        ));
    }

    #[test]
    fn test_serializes_for_build_executor() {
        let d = ConfigDescriptor::load(FLUTTER_APP).unwrap();
        let json = serde_json::to_value(&d).unwrap();

        assert_eq!(json["architectures"][1], "armeabi-v7a");
        assert_eq!(json["packaging_rules"][0], "**/libaosl.so");
        assert_eq!(json["variants"]["release"]["signing_config"], "debug");
        assert_eq!(json["dependencies"][0]["configuration"], "implementation");
    }
}
