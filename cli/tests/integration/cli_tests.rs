//! Integration tests for the CLI skeleton: help, version and global flags.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn platform_deploy() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("platform-deploy"));
    cmd.env("NO_COLOR", "1");
    cmd
}

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    // clap with arg_required_else_help shows help on stderr and exits 2
    platform_deploy().assert().code(2).stderr(predicate::str::contains(
        "Configure, deploy, destroy and inspect ephemeral platform deployments",
    ));
}

#[test]
fn test_cli_help_flag_lists_commands() {
    platform_deploy()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("destroy"))
        .stdout(predicate::str::contains("list"));
}

#[test]
fn test_cli_version_flag_shows_version() {
    platform_deploy()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("platform-deploy"));
}

#[test]
fn test_deploy_help_lists_kinds() {
    platform_deploy()
        .args(["deploy", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("local"))
        .stdout(predicate::str::contains("cloud"));
}

#[test]
fn test_deploy_local_help_shows_options() {
    platform_deploy()
        .args(["deploy", "local", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--unattended"))
        .stdout(predicate::str::contains("--downloads"));
}

#[test]
fn test_deploy_cloud_has_no_downloads_option() {
    platform_deploy()
        .args(["deploy", "cloud", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--downloads").not());
}

// --- Argument errors ---

#[test]
fn test_unknown_command_exits_with_error() {
    platform_deploy()
        .arg("frobnicate")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_deploy_without_kind_fails() {
    platform_deploy().arg("deploy").assert().code(2);
}

#[test]
fn test_destroy_requires_target() {
    platform_deploy()
        .arg("destroy")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("<TARGET>"));
}

#[test]
fn test_global_flags_accepted_after_subcommand() {
    platform_deploy()
        .args(["deploy", "local", "--help", "--quiet", "--no-color", "--json"])
        .assert()
        .success();
}

// --- NO_COLOR environment convention ---

#[test]
fn test_no_color_accepts_conventional_values() {
    for value in ["1", "yes", "true", "0", ""] {
        Command::new(assert_cmd::cargo::cargo_bin!("platform-deploy"))
            .env("NO_COLOR", value)
            .args(["list", "/tmp/ops"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("must start with 'gs://'"))
            .stderr(predicate::str::contains("invalid value").not());
    }
}

#[test]
fn test_no_color_flag_still_works_without_env() {
    Command::new(assert_cmd::cargo::cargo_bin!("platform-deploy"))
        .env_remove("NO_COLOR")
        .args(["--no-color", "list", "/tmp/ops"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("must start with 'gs://'"));
}
