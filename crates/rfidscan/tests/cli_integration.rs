//! Integration tests for the `rfidscan-tool` binary.
//!
//! These run the binary via `assert_cmd`. Nothing here needs a scanner:
//! device commands are only checked for argument errors, which are
//! reported before any USB access.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

fn cli() -> assert_cmd::Command {
    cargo_bin_cmd!("rfidscan-tool")
}

#[test]
fn cli_help_succeeds() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("rfidscan-tool"));
}

#[test]
fn cli_version_prints_version() {
    cli()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn cli_config_json_produces_valid_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let output = cli()
        .args(["--json", "config", "--config"])
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value =
        serde_json::from_slice(&output).expect("config --json should produce valid JSON");
    assert!(
        json["settings"].is_object(),
        "JSON output should contain 'settings' object"
    );
    assert!(
        json["config_file"].is_string() || json["config_file"].is_null(),
        "config_file should be string or null"
    );
    assert_eq!(json["config_file_exists"], false);
    assert_eq!(json["settings"]["beep_ms"], 30);
}

#[test]
fn cli_config_reads_custom_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "beep_ms = 120\ndevice_serial = \"1A2B3C4D\"\n").unwrap();

    cli()
        .arg("config")
        .arg("--config")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("(loaded)"))
        .stdout(predicate::str::contains("120"))
        .stdout(predicate::str::contains("1A2B3C4D"));
}

#[test]
fn cli_config_reports_problems() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "password = \"xyz\"\n").unwrap();

    cli()
        .arg("config")
        .arg("--config")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Problems:"))
        .stdout(predicate::str::contains("Invalid password"));
}

// ── --verbose flag ──

#[test]
fn cli_verbose_flag_accepted() {
    cli().args(["-v", "config"]).assert().success();
}

#[test]
fn cli_verbose_long_flag_accepted() {
    cli().args(["--verbose", "config"]).assert().success();
}

#[test]
fn cli_trace_and_quiet_accepted() {
    cli().args(["-vv", "-q", "config"]).assert().success();
}

// ── Argument errors (no scanner needed) ──

#[test]
fn cli_read_rejects_reserved_addresses() {
    for addr in ["00", "FF", "1", "XYZ"] {
        cli()
            .args(["read", addr])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid register addr"));
    }
}

#[test]
fn cli_write_rejects_bad_value() {
    cli()
        .args(["write", "10=0G"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid hex byte"));
}

#[test]
fn cli_write_rejects_value_longer_than_a_frame() {
    let value = format!("10=@{}", "x".repeat(61));
    cli()
        .args(["write", value.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exceeds 60"));
}

#[test]
fn cli_layout_rejects_unknown_name() {
    cli()
        .args(["layout", "dvorak"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid keyboard layout"));
}

#[test]
fn cli_write_conf_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    cli()
        .arg("write-conf")
        .arg(dir.path().join("missing.multiconf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Failed to open the configuration file",
        ));
}

#[test]
fn cli_write_conf_bad_address() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.multiconf");
    std::fs::write(&path, "[raw]\nFF=01\n").unwrap();
    cli()
        .arg("write-conf")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn cli_rejects_malformed_password() {
    cli()
        .args(["--password", "12G4", "dump"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("password must be 4 hex digits"));
}

#[test]
fn cli_rejects_malformed_id() {
    cli()
        .args(["--id", "first", "dump"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid scanner id"));
}

// ── Subcommand help ──
// Device commands are only exercised through --help here.

#[test]
fn cli_subcommand_help_succeeds() {
    for sub in [
        "list",
        "version",
        "leds",
        "leds-default",
        "beep",
        "layout",
        "read",
        "write",
        "dump",
        "write-conf",
        "test",
        "config",
    ] {
        cli()
            .args([sub, "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Usage"));
    }
}

#[test]
fn cli_leds_help_lists_modes() {
    cli()
        .args(["leds", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("heartinv"));
}
