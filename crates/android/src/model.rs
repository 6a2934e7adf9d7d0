//! Validated entities of a build descriptor
//!
//! Constructors validate every invariant and report all violations of an
//! entity at once as [`DescriptorError::MalformedConfig`].

use crate::error::{ensure, DescriptorError, Result};
use buildspec_core::validation::Validator;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Reverse-domain identifier: two or more dot-separated Java identifiers.
static REVERSE_DOMAIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(\.[A-Za-z][A-Za-z0-9_]*)+$").unwrap());

/// Maven coordinate without version: `group:artifact`.
static COORDINATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+:[A-Za-z0-9_.\-]+$").unwrap());

/// Build type names follow Gradle's lowerCamelCase convention.
static VARIANT_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][A-Za-z0-9]*$").unwrap());

/// Highest version code the Play Store accepts.
pub const MAX_VERSION_CODE: u32 = 2_100_000_000;

/// Name of the signing configuration that always exists.
pub const DEBUG_SIGNING: &str = "debug";

/// Namespace, application id and version of the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationIdentity {
    namespace: String,
    application_id: String,
    version_code: u32,
    version_name: String,
}

impl ApplicationIdentity {
    /// Build a validated identity.
    pub fn new(
        namespace: impl Into<String>,
        application_id: impl Into<String>,
        version_code: u32,
        version_name: impl Into<String>,
    ) -> Result<Self> {
        let identity = Self {
            namespace: namespace.into(),
            application_id: application_id.into(),
            version_code,
            version_name: version_name.into(),
        };

        ensure(
            Validator::new()
                .required("android.namespace", &identity.namespace)
                .pattern(
                    "android.namespace",
                    &identity.namespace,
                    &REVERSE_DOMAIN,
                    "a reverse-domain identifier",
                )
                .required("android.default_config.application_id", &identity.application_id)
                .pattern(
                    "android.default_config.application_id",
                    &identity.application_id,
                    &REVERSE_DOMAIN,
                    "a reverse-domain identifier",
                )
                .range(
                    "android.default_config.version_code",
                    identity.version_code,
                    1,
                    MAX_VERSION_CODE,
                )
                .custom("android.default_config.version_name", || {
                    semver::Version::parse(&identity.version_name)
                        .err()
                        .map(|e| format!("{:?} is not a semantic version: {}", identity.version_name, e))
                })
                .validate(),
        )?;

        Ok(identity)
    }

    /// Kotlin/Java namespace of generated classes
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Application id published to the store
    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    /// Monotonic store version code
    pub fn version_code(&self) -> u32 {
        self.version_code
    }

    /// SemVer version shown to users
    pub fn version_name(&self) -> &str {
        &self.version_name
    }
}

/// Minimum, target and compile SDK levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SdkBounds {
    min_sdk: u32,
    target_sdk: u32,
    compile_sdk: u32,
}

impl SdkBounds {
    /// Build bounds satisfying `1 <= min <= target <= compile`.
    pub fn new(min_sdk: u32, target_sdk: u32, compile_sdk: u32) -> Result<Self> {
        ensure(
            Validator::new()
                .range("android.default_config.min_sdk", min_sdk, 1, u32::MAX)
                .ordered("sdk", ("min_sdk", min_sdk), ("target_sdk", target_sdk))
                .ordered("sdk", ("target_sdk", target_sdk), ("compile_sdk", compile_sdk))
                .validate(),
        )?;

        Ok(Self {
            min_sdk,
            target_sdk,
            compile_sdk,
        })
    }

    /// Lowest supported API level
    pub fn min_sdk(&self) -> u32 {
        self.min_sdk
    }

    /// API level the app is tested against
    pub fn target_sdk(&self) -> u32 {
        self.target_sdk
    }

    /// API level the app is compiled against
    pub fn compile_sdk(&self) -> u32 {
        self.compile_sdk
    }
}

/// Native ABIs the Android toolchain can build for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Architecture {
    /// 32-bit ARM
    #[serde(rename = "armeabi-v7a")]
    ArmeabiV7a,
    /// 64-bit ARM
    #[serde(rename = "arm64-v8a")]
    Arm64V8a,
    /// 32-bit Intel
    #[serde(rename = "x86")]
    X86,
    /// 64-bit Intel
    #[serde(rename = "x86_64")]
    X86_64,
    /// 64-bit RISC-V
    #[serde(rename = "riscv64")]
    Riscv64,
}

impl Architecture {
    /// Every supported ABI
    pub const ALL: [Architecture; 5] = [
        Self::ArmeabiV7a,
        Self::Arm64V8a,
        Self::X86,
        Self::X86_64,
        Self::Riscv64,
    ];

    /// ABI name as used in `jniLibs` directories
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ArmeabiV7a => "armeabi-v7a",
            Self::Arm64V8a => "arm64-v8a",
            Self::X86 => "x86",
            Self::X86_64 => "x86_64",
            Self::Riscv64 => "riscv64",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Architecture {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|abi| abi.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(Architecture::as_str).collect();
                DescriptorError::malformed(format!(
                    "unsupported architecture {:?} (supported: {})",
                    s,
                    known.join(", ")
                ))
            })
    }
}

/// Non-empty, duplicate-free set of ABIs in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ArchitectureSet(Vec<Architecture>);

impl ArchitectureSet {
    /// Parse ABI names.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let abis = names
            .iter()
            .map(|n| n.as_ref().parse())
            .collect::<Result<Vec<Architecture>>>()?;

        ensure(
            Validator::new()
                .non_empty("android.default_config.abi_filters", &abis)
                .unique("android.default_config.abi_filters", abis.iter().copied())
                .validate(),
        )?;

        Ok(Self(abis))
    }

    /// True if `abi` is declared
    pub fn contains(&self, abi: Architecture) -> bool {
        self.0.contains(&abi)
    }

    /// ABIs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = Architecture> + '_ {
        self.0.iter().copied()
    }

    /// Number of declared ABIs
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a validated set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Key material reference for signing a variant.
///
/// Passwords are never stored in the descriptor; only the names of the
/// environment variables holding them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SigningConfig {
    name: String,
    store_file: Option<String>,
    key_alias: Option<String>,
    store_password_env: Option<String>,
    key_password_env: Option<String>,
}

impl SigningConfig {
    /// The toolchain-provided debug keystore.
    pub fn debug() -> Self {
        Self {
            name: DEBUG_SIGNING.to_string(),
            store_file: None,
            key_alias: None,
            store_password_env: None,
            key_password_env: None,
        }
    }

    /// A declared signing configuration; keystore and alias are required.
    pub fn declared(
        name: impl Into<String>,
        store_file: String,
        key_alias: String,
        store_password_env: Option<String>,
        key_password_env: Option<String>,
    ) -> Result<Self> {
        let name = name.into();
        let field = |key: &str| format!("android.signing_configs.{}.{}", name, key);
        ensure(
            Validator::new()
                .required(&field("store_file"), &store_file)
                .required(&field("key_alias"), &key_alias)
                .custom(&field("store_password_env"), || {
                    blank_env(store_password_env.as_deref())
                })
                .custom(&field("key_password_env"), || {
                    blank_env(key_password_env.as_deref())
                })
                .validate(),
        )?;

        Ok(Self {
            name,
            store_file: Some(store_file),
            key_alias: Some(key_alias),
            store_password_env,
            key_password_env,
        })
    }

    /// Configuration name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Keystore path; `None` means the toolchain's debug keystore
    pub fn store_file(&self) -> Option<&str> {
        self.store_file.as_deref()
    }

    /// Key alias inside the keystore
    pub fn key_alias(&self) -> Option<&str> {
        self.key_alias.as_deref()
    }

    /// Environment variable holding the keystore password
    pub fn store_password_env(&self) -> Option<&str> {
        self.store_password_env.as_deref()
    }

    /// Environment variable holding the key password
    pub fn key_password_env(&self) -> Option<&str> {
        self.key_password_env.as_deref()
    }

    /// True for the implicit debug keystore
    pub fn is_builtin(&self) -> bool {
        self.store_file.is_none()
    }
}

fn blank_env(name: Option<&str>) -> Option<String> {
    match name {
        Some(n) if n.trim().is_empty() => Some("Environment variable name is empty".to_string()),
        _ => None,
    }
}

/// A named build configuration profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildVariant {
    name: String,
    minify_enabled: bool,
    shrink_resources: bool,
    signing_config: Option<String>,
}

impl BuildVariant {
    /// Build a variant; signing references are resolved by the descriptor.
    pub fn new(
        name: impl Into<String>,
        minify_enabled: bool,
        shrink_resources: bool,
        signing_config: Option<String>,
    ) -> Result<Self> {
        let name = name.into();
        let field = format!("android.build_types.{}", name);
        ensure(
            Validator::new()
                .pattern(&field, &name, &VARIANT_NAME, "a lowerCamelCase build type name")
                .custom(&format!("{}.shrink_resources", field), || {
                    (shrink_resources && !minify_enabled).then(|| {
                        "Removing unused resources requires minify_enabled".to_string()
                    })
                })
                .validate(),
        )?;

        Ok(Self {
            name,
            minify_enabled,
            shrink_resources,
            signing_config,
        })
    }

    /// Variant name, e.g. `release`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Code shrinking and obfuscation
    pub fn minify_enabled(&self) -> bool {
        self.minify_enabled
    }

    /// Unused resource removal; requires minify
    pub fn shrink_resources(&self) -> bool {
        self.shrink_resources
    }

    /// Name of the signing configuration used for this variant
    pub fn signing_config(&self) -> Option<&str> {
        self.signing_config.as_deref()
    }
}

/// Gradle configuration a dependency is declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencyConfiguration {
    /// `implementation`
    Implementation,
    /// `api`
    Api,
    /// `compileOnly`
    CompileOnly,
    /// `runtimeOnly`
    RuntimeOnly,
    /// `testImplementation`
    TestImplementation,
    /// `androidTestImplementation`
    AndroidTestImplementation,
    /// `debugImplementation`
    DebugImplementation,
    /// `releaseImplementation`
    ReleaseImplementation,
}

impl DependencyConfiguration {
    const ALL: [DependencyConfiguration; 8] = [
        Self::Implementation,
        Self::Api,
        Self::CompileOnly,
        Self::RuntimeOnly,
        Self::TestImplementation,
        Self::AndroidTestImplementation,
        Self::DebugImplementation,
        Self::ReleaseImplementation,
    ];

    /// Name as written in Gradle
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Implementation => "implementation",
            Self::Api => "api",
            Self::CompileOnly => "compileOnly",
            Self::RuntimeOnly => "runtimeOnly",
            Self::TestImplementation => "testImplementation",
            Self::AndroidTestImplementation => "androidTestImplementation",
            Self::DebugImplementation => "debugImplementation",
            Self::ReleaseImplementation => "releaseImplementation",
        }
    }
}

impl fmt::Display for DependencyConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencyConfiguration {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(DependencyConfiguration::as_str).collect();
                DescriptorError::malformed(format!(
                    "unknown dependency configuration {:?} (expected one of: {})",
                    s,
                    known.join(", ")
                ))
            })
    }
}

/// One declared dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    configuration: DependencyConfiguration,
    coordinate: String,
    version: String,
}

impl Dependency {
    /// Build a dependency; `version` may be an exact version or a range.
    pub fn new(
        configuration: DependencyConfiguration,
        coordinate: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self> {
        let coordinate = coordinate.into();
        let entry = format!("dependencies.{}", coordinate);
        Self::declared_at(&entry, configuration, coordinate, version.into())
    }

    /// Build a dependency, naming `entry` as the key path in violations
    pub(crate) fn declared_at(
        entry: &str,
        configuration: DependencyConfiguration,
        coordinate: String,
        version: String,
    ) -> Result<Self> {
        let field = |key: &str| format!("{}.{}", entry, key);
        ensure(
            Validator::new()
                .pattern(
                    &field("coordinate"),
                    &coordinate,
                    &COORDINATE,
                    "a group:artifact coordinate",
                )
                .required(&field("version"), &version)
                .custom(&field("version"), || {
                    version
                        .contains(char::is_whitespace)
                        .then(|| format!("{:?} contains whitespace", version))
                })
                .validate(),
        )?;

        Ok(Self {
            configuration,
            coordinate,
            version,
        })
    }

    /// Configuration the dependency is declared in
    pub fn configuration(&self) -> DependencyConfiguration {
        self.configuration
    }

    /// `group:artifact`
    pub fn coordinate(&self) -> &str {
        &self.coordinate
    }

    /// Exact version or range
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Full Gradle notation, `group:artifact:version`
    pub fn notation(&self) -> String {
        format!("{}:{}", self.coordinate, self.version)
    }
}

/// Compiler and toolchain switches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToolchainOptions {
    /// Multidex packaging for apps above the 64K method limit
    pub multi_dex_enabled: bool,
    /// Generate the `BuildConfig` class
    pub build_config: bool,
    /// Java source level
    pub source_compatibility: Option<u32>,
    /// Java bytecode level
    pub target_compatibility: Option<u32>,
    /// Kotlin JVM target
    pub jvm_target: Option<String>,
}

impl ToolchainOptions {
    /// Lowest and highest Java levels accepted.
    pub const JAVA_LEVELS: (u32, u32) = (8, 25);

    pub(crate) fn validate(self) -> Result<Self> {
        let (lo, hi) = Self::JAVA_LEVELS;
        let mut validator = Validator::new();
        if let Some(level) = self.source_compatibility {
            validator = validator.range("android.compile_options.source_compatibility", level, lo, hi);
        }
        if let Some(level) = self.target_compatibility {
            validator = validator.range("android.compile_options.target_compatibility", level, lo, hi);
        }
        if let Some(target) = &self.jvm_target {
            validator = validator.required("android.kotlin_options.jvm_target", target);
        }
        ensure(validator.validate())?;
        Ok(self)
    }
}
