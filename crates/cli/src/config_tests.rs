// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serial_test::serial;

use super::{Config, DEBUG_LOG_FILE};
use crate::dispatch::Mode;

fn parse(args: &[&str]) -> Config {
    Config::parse_from(args)
}

#[test]
fn defaults_are_correct() -> anyhow::Result<()> {
    let config = parse(&["dcode"]);
    config.validate()?;
    assert_eq!(config.program, "claude");
    assert_eq!(config.dialog_timeout, 60);
    assert_eq!(config.timeout, 60);
    assert_eq!(config.log_format, "text");
    assert_eq!(config.log_level, "info");
    assert_eq!(config.mode(), Mode::Interactive);
    assert_eq!(config.command(), vec!["claude"]);
    assert_eq!(config.log_path(), None);
    Ok(())
}

#[test]
fn unknown_flags_pass_through_to_program() {
    let config = parse(&["dcode", "--strip-colors", "--model", "opus", "-p", "hi"]);
    assert!(config.strip_colors);
    assert_eq!(config.command(), vec!["claude", "--model", "opus", "-p", "hi"]);
}

#[test]
fn double_dash_separates_program_args() {
    let config = parse(&["dcode", "--program", "/usr/local/bin/claude", "--", "--auto-approve"]);
    assert!(!config.auto_approve);
    assert_eq!(config.command(), vec!["/usr/local/bin/claude", "--auto-approve"]);
}

#[yare::parameterized(
    interactive = { &["dcode"], Mode::Interactive },
    approve = { &["dcode", "--auto-approve"], Mode::AutoApprove },
    reject = { &["dcode", "--auto-reject"], Mode::AutoReject },
    wait = { &["dcode", "--auto-reject-wait", "30"], Mode::AutoRejectWait(Duration::from_secs(30)) },
    wait_equals = { &["dcode", "--auto-reject-wait=5"], Mode::AutoRejectWait(Duration::from_secs(5)) },
    approve_beats_reject = { &["dcode", "--auto-reject", "--auto-approve"], Mode::AutoApprove },
    reject_beats_wait = { &["dcode", "--auto-reject-wait", "5", "--auto-reject"], Mode::AutoReject },
    zero_wait = { &["dcode", "--auto-reject-wait", "0"], Mode::Interactive },
)]
fn mode_from_flags(args: &[&str], expected: Mode) {
    assert_eq!(parse(args).mode(), expected);
}

#[yare::parameterized(
    empty_program = { &["dcode", "--program", " "], "--program must not be empty" },
    zero_dialog_timeout = { &["dcode", "--dialog-timeout", "0"], "--dialog-timeout" },
    bad_log_format = { &["dcode", "--log-format", "yaml"], "invalid log format" },
    hook_timeout_low = { &["dcode", "--hook", "--timeout", "4"], "between 5 and 3600" },
    hook_timeout_high = { &["dcode", "--hook", "--timeout", "3601"], "between 5 and 3600" },
)]
fn invalid_config(args: &[&str], expected_substr: &str) {
    let config = parse(args);
    crate::assert_err_contains!(config.validate(), expected_substr);
}

#[test]
fn hook_timeout_bounds_are_inclusive() -> anyhow::Result<()> {
    parse(&["dcode", "--hook", "--timeout", "5"]).validate()?;
    parse(&["dcode", "--hook", "--timeout", "3600"]).validate()?;
    Ok(())
}

#[test]
fn debug_writes_default_log_file_at_debug_level() {
    let config = parse(&["dcode", "--debug"]);
    assert_eq!(config.log_path(), Some(PathBuf::from(DEBUG_LOG_FILE)));
    assert_eq!(config.effective_log_level(), "debug");

    let config = parse(&["dcode", "--debug", "--log-file", "/tmp/d.log", "--log-level", "warn"]);
    assert_eq!(config.log_path(), Some(PathBuf::from("/tmp/d.log")));
    assert_eq!(config.effective_log_level(), "warn");
}

#[test]
#[serial]
fn env_duration_defaults() {
    // These read env vars, so with no env set we get production defaults.
    let config = parse(&["dcode"]);
    assert_eq!(config.approve_delay(), Duration::from_millis(100));
    assert_eq!(config.reject_delay(), Duration::from_millis(500));
    assert_eq!(config.reject_message_delay(), Duration::from_millis(500));
    assert_eq!(config.reject_submit_delay(), Duration::from_millis(400));
    assert_eq!(config.settle_delay(), Duration::from_millis(300));
    assert_eq!(config.cooldown(), Duration::from_secs(3));
    assert_eq!(config.duplicate_window(), Duration::from_secs(5));
    assert_eq!(config.cleanup_interval(), Duration::from_secs(300));
    assert_eq!(config.char_delay(), Duration::from_millis(10));
    assert_eq!(config.line_delay(), Duration::from_millis(100));
    assert_eq!(config.line_submit_delay(), Duration::from_millis(500));
}

#[test]
#[serial]
fn env_var_overrides_default_and_field_overrides_env() {
    std::env::set_var("DCODE_COOLDOWN_MS", "1234");
    let mut config = parse(&["dcode"]);
    assert_eq!(config.cooldown(), Duration::from_millis(1234));

    config.cooldown_ms = Some(7);
    assert_eq!(config.cooldown(), Duration::from_millis(7));
    std::env::remove_var("DCODE_COOLDOWN_MS");
}

#[test]
#[serial]
fn unparsable_env_var_falls_back_to_default() {
    std::env::set_var("DCODE_SETTLE_DELAY_MS", "soon");
    let config = parse(&["dcode"]);
    assert_eq!(config.settle_delay(), Duration::from_millis(300));
    std::env::remove_var("DCODE_SETTLE_DELAY_MS");
}

#[test]
fn timing_collects_knobs_and_dialog_timeout() {
    let mut config = Config::test();
    config.dialog_timeout = 9;
    let timing = config.timing();
    assert_eq!(timing.approve_delay, Duration::from_millis(10));
    assert_eq!(timing.cooldown, Duration::from_millis(100));
    assert_eq!(timing.dialog_timeout, Duration::from_secs(9));
}
