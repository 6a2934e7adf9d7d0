use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const DESCRIPTOR: &str = r#"
plugins = ["com.android.application", "kotlin-android"]

[android]
namespace = "com.example.app"
compile_sdk = 36

[android.default_config]
application_id = "com.example.app"
min_sdk = 23
target_sdk = 35
version_code = 7
version_name = "1.2.0"
abi_filters = ["arm64-v8a", "x86_64"]

[android.build_types.release]
minify_enabled = true
shrink_resources = true
signing_config = "debug"

[android.build_types.debug]

[android.packaging]
pick_first = ["**/libc++_shared.so"]

[[dependencies]]
coordinate = "com.facebook.react:hermes-android"
version = "0.74.0"

[[dependencies]]
coordinate = "org.webkit:android-jsc"
version = "r250231"
"#;

fn project(source: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("buildspec.toml"), source).unwrap();
    dir
}

fn buildspec(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("buildspec").unwrap();
    cmd.current_dir(dir)
        .env_remove("BUILDSPEC_DESCRIPTOR")
        .env_remove("RUST_LOG")
        .arg("--no-color");
    cmd
}

#[test]
fn validate_discovers_descriptor() {
    let dir = project(DESCRIPTOR);
    buildspec(dir.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"))
        .stdout(predicate::str::contains("2 variants"));
}

#[test]
fn validate_without_descriptor_is_config_error() {
    let dir = TempDir::new().unwrap();
    buildspec(dir.path())
        .arg("validate")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("No build descriptor found"));
}

#[test]
fn validate_reports_unknown_key() {
    let dir = project(&DESCRIPTOR.replace("min_sdk", "minSdk"));
    buildspec(dir.path())
        .arg("validate")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("android.default_config.minSdk"));
}

#[test]
fn validate_reports_sdk_order() {
    let dir = project(&DESCRIPTOR.replace("target_sdk = 35", "target_sdk = 37"));
    buildspec(dir.path())
        .arg("validate")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("target_sdk (37) must not exceed compile_sdk (36)"));
}

#[test]
fn explicit_descriptor_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, DESCRIPTOR).unwrap();

    buildspec(dir.path())
        .arg("--descriptor")
        .arg(&path)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("com.example.app"))
        .stdout(predicate::str::contains("min 23 / target 35 / compile 36"));
}

#[test]
fn show_json() {
    let dir = project(DESCRIPTOR);
    let output = buildspec(dir.path())
        .args(["show", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["identity"]["version_code"], 7);
    assert_eq!(json["architectures"][0], "arm64-v8a");
}

#[test]
fn variant_release() {
    let dir = project(DESCRIPTOR);
    buildspec(dir.path())
        .args(["variant", "release"])
        .assert()
        .success()
        .stdout(predicate::str::contains("debug (debug keystore)"));
}

#[test]
fn variant_unknown() {
    let dir = project(DESCRIPTOR);
    buildspec(dir.path())
        .args(["variant", "staging"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("Declared variants: debug, release"));
}

#[test]
fn pick_first_by_dependency_order() {
    let dir = project(DESCRIPTOR);
    buildspec(dir.path())
        .args([
            "pick",
            "**/libc++_shared.so",
            "jni/x86_64/libc++_shared.so=org.webkit:android-jsc",
            "lib/arm64-v8a/libc++_shared.so=com.facebook.react:hermes-android",
        ])
        .assert()
        .success()
        .stdout("lib/arm64-v8a/libc++_shared.so\n");
}

#[test]
fn pick_without_match_is_ambiguous() {
    let dir = project(DESCRIPTOR);
    buildspec(dir.path())
        .args([
            "pick",
            "**/libc++_shared.so",
            "jni/x86_64/libjsc.so=org.webkit:android-jsc",
        ])
        .assert()
        .code(7);
}

#[test]
fn pick_rejects_candidate_without_dependency() {
    let dir = project(DESCRIPTOR);
    buildspec(dir.path())
        .args(["pick", "**/libc++_shared.so", "lib/arm64-v8a/libc++_shared.so"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid candidate"));
}

#[test]
fn variant_json() {
    let dir = project(DESCRIPTOR);
    let output = buildspec(dir.path())
        .args(["variant", "release", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["name"], "release");
    assert_eq!(json["minify_enabled"], true);
    assert_eq!(json["signing_config"], "debug");
}

#[test]
fn no_color_output_is_plain() {
    let dir = project(DESCRIPTOR);
    for command in ["validate", "show"] {
        buildspec(dir.path())
            .arg(command)
            .assert()
            .success()
            .stdout(predicate::str::contains("\x1b[").not());
    }

    buildspec(dir.path())
        .args(["variant", "staging"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("\x1b[").not());

    buildspec(dir.path())
        .args(["pick", "**/libc++_shared.so", "jni/x86_64/libjsc.so=org.webkit:android-jsc"])
        .assert()
        .code(7)
        .stderr(predicate::str::contains("Packaging conflict left unresolved"))
        .stderr(predicate::str::contains("\x1b[").not());
}
