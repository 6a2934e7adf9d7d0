//! buildspec CLI
//!
//! Validates an Android application build descriptor and answers the queries
//! an external build executor needs: variants and packaging conflicts.

use anyhow::Result;
use buildspec_android::loader::{find_descriptor, load_file, DESCRIPTOR_CANDIDATES};
use buildspec_android::{ConfigDescriptor, PackagingCandidate};
use buildspec_cli::output::{format_count, format_duration, format_flag, Status};
use buildspec_core::error::{exit_codes, Error};
use buildspec_telemetry::{Timer, TelemetryConfig};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "buildspec")]
#[command(about = "Validate and query Android application build descriptors")]
#[command(version)]
struct Cli {
    /// Descriptor file path (default: search buildspec.toml, app/buildspec.toml, .config/buildspec.toml)
    #[arg(short, long, global = true, env = "BUILDSPEC_DESCRIPTOR")]
    descriptor: Option<PathBuf>,

    /// Increase output verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the descriptor and report whether it is valid
    Validate,

    /// Print every setting of the descriptor
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a build variant
    Variant {
        /// Variant name, e.g. release
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve a pick-first packaging conflict
    Pick {
        /// Declared pick-first pattern, e.g. "**/libc++_shared.so"
        pattern: String,
        /// Candidates as PATH=GROUP:ARTIFACT
        #[arg(required = true)]
        candidates: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        owo_colors::set_override(false);
    }

    buildspec_telemetry::init_with_config(
        TelemetryConfig::from_verbosity(cli.verbose, cli.quiet).with_ansi(!cli.no_color),
    )?;

    let exit_code = match resolve_descriptor_path(cli.descriptor.as_deref()) {
        Ok(path) => match cli.command {
            Commands::Validate => run_validate(&path, cli.quiet),
            Commands::Show { json } => run_show(&path, json),
            Commands::Variant { name, json } => run_variant(&path, &name, json),
            Commands::Pick { pattern, candidates } => run_pick(&path, &pattern, &candidates),
        },
        Err(e) => report(&e),
    };

    std::process::exit(exit_code);
}

fn resolve_descriptor_path(explicit: Option<&Path>) -> std::result::Result<PathBuf, Error> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir()?;
    find_descriptor(&cwd).ok_or_else(|| Error::config_not_found(&DESCRIPTOR_CANDIDATES))
}

fn report(err: &Error) -> i32 {
    tracing::debug!(code = %err.code, "Command failed");
    Status::error(&err.to_string());
    err.exit_code()
}

fn load(path: &Path) -> std::result::Result<ConfigDescriptor, Error> {
    load_file(path).map_err(|e| Error::from(e).with_context(format!("While loading {}", path.display())))
}

fn run_validate(path: &Path, quiet: bool) -> i32 {
    let timer = Timer::start("load");
    match load(path) {
        Ok(descriptor) => {
            let elapsed = timer.stop();
            if !quiet {
                Status::success(&format!(
                    "{} is valid ({}, {}, {}) in {}",
                    path.display(),
                    format_count(descriptor.architectures().len(), "architecture", "architectures"),
                    format_count(descriptor.variants().count(), "variant", "variants"),
                    format_count(descriptor.dependencies().len(), "dependency", "dependencies"),
                    format_duration(elapsed)
                ));
            }
            exit_codes::SUCCESS
        }
        Err(e) => report(&e),
    }
}

fn run_show(path: &Path, json: bool) -> i32 {
    let descriptor = match load(path) {
        Ok(d) => d,
        Err(e) => return report(&e),
    };

    if json {
        return print_json(&descriptor);
    }

    let identity = descriptor.identity();
    let sdk = descriptor.sdk();
    let toolchain = descriptor.toolchain();

    Status::header(identity.application_id());
    Status::field("Namespace", identity.namespace());
    Status::field(
        "Version",
        &format!("{} ({})", identity.version_name(), identity.version_code()),
    );
    Status::field(
        "SDK",
        &format!(
            "min {} / target {} / compile {}",
            sdk.min_sdk(),
            sdk.target_sdk(),
            sdk.compile_sdk()
        ),
    );
    let abis: Vec<&str> = descriptor.architectures().iter().map(|a| a.as_str()).collect();
    Status::field("Architectures", &abis.join(", "));
    if !descriptor.plugins().is_empty() {
        Status::field("Plugins", &descriptor.plugins().join(", "));
    }
    Status::field("Multidex", format_flag(toolchain.multi_dex_enabled));
    Status::field("BuildConfig", format_flag(toolchain.build_config));
    if let (Some(source), Some(target)) =
        (toolchain.source_compatibility, toolchain.target_compatibility)
    {
        Status::field("Java", &format!("source {} / target {}", source, target));
    }
    if let Some(jvm_target) = &toolchain.jvm_target {
        Status::field("Kotlin JVM target", jvm_target);
    }
    if let Some(source) = descriptor.flutter_source() {
        Status::field("Flutter source", source);
    }

    Status::header("Build variants");
    for variant in descriptor.variants() {
        Status::field(
            variant.name(),
            &format!(
                "minify {}, shrink resources {}, signing {}",
                format_flag(variant.minify_enabled()),
                format_flag(variant.shrink_resources()),
                variant.signing_config().unwrap_or("none")
            ),
        );
    }

    if !descriptor.packaging_rules().is_empty() {
        Status::header("Packaging");
        for rule in descriptor.packaging_rules() {
            Status::field("pick first", rule.pattern());
        }
    }

    if !descriptor.dependencies().is_empty() {
        Status::header("Dependencies");
        for dependency in descriptor.dependencies() {
            Status::field(dependency.configuration().as_str(), &dependency.notation());
        }
    }

    exit_codes::SUCCESS
}

fn run_variant(path: &Path, name: &str, json: bool) -> i32 {
    let descriptor = match load(path) {
        Ok(d) => d,
        Err(e) => return report(&e),
    };

    let variant = match descriptor.resolve_variant(name) {
        Ok(v) => v,
        Err(e) => return report(&Error::from(e)),
    };

    if json {
        return print_json(variant);
    }

    Status::header(variant.name());
    Status::field("Minify", format_flag(variant.minify_enabled()));
    Status::field("Shrink resources", format_flag(variant.shrink_resources()));
    match variant
        .signing_config()
        .and_then(|name| descriptor.signing_config(name))
    {
        Some(signing) if signing.is_builtin() => {
            Status::field("Signing", &format!("{} (debug keystore)", signing.name()));
        }
        Some(signing) => {
            Status::field(
                "Signing",
                &format!(
                    "{} ({}, alias {})",
                    signing.name(),
                    signing.store_file().unwrap_or_default(),
                    signing.key_alias().unwrap_or_default()
                ),
            );
        }
        None => Status::field("Signing", "none"),
    }

    exit_codes::SUCCESS
}

fn run_pick(path: &Path, pattern: &str, raw: &[String]) -> i32 {
    let candidates = match parse_candidates(raw) {
        Ok(c) => c,
        Err(e) => return report(&e),
    };

    let descriptor = match load(path) {
        Ok(d) => d,
        Err(e) => return report(&e),
    };

    match descriptor.resolve_packaging_conflict(pattern, &candidates) {
        Ok(winner) => {
            println!("{}", winner.path);
            exit_codes::SUCCESS
        }
        Err(e) => report(&Error::from(e)),
    }
}

fn parse_candidates(raw: &[String]) -> std::result::Result<Vec<PackagingCandidate>, Error> {
    raw.iter()
        .map(|entry| match entry.split_once('=') {
            Some((path, dependency)) if !path.is_empty() && !dependency.is_empty() => {
                Ok(PackagingCandidate::new(path, dependency))
            }
            _ => Err(Error::validation(format!("Invalid candidate: {}", entry))
                .with_suggestion("Use PATH=GROUP:ARTIFACT, e.g. jni/x86/libjsc.so=org.webkit:android-jsc")),
        })
        .collect()
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            exit_codes::SUCCESS
        }
        Err(e) => report(&Error::from(e)),
    }
}
