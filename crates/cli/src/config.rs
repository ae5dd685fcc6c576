// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::dispatch::{Mode, Timing};
use crate::run::Typing;

/// Default log file written by `--debug`.
pub const DEBUG_LOG_FILE: &str = "debug_output.log";

pub const HOOK_TIMEOUT_RANGE: std::ops::RangeInclusive<u64> = 5..=3600;

/// Wraps Claude in a pseudo-terminal and answers its permission prompts
/// with a native dialog, or automatically.
#[derive(Debug, Parser)]
#[command(name = "dcode", version, about)]
pub struct Config {
    /// Answer every prompt with its most permissive choice.
    #[arg(long, env = "DCODE_AUTO_APPROVE")]
    pub auto_approve: bool,

    /// Reject every prompt and tell Claude why.
    #[arg(long, env = "DCODE_AUTO_REJECT")]
    pub auto_reject: bool,

    /// Show the dialog, but reject after N seconds without an answer (0 = disabled).
    #[arg(long, env = "DCODE_AUTO_REJECT_WAIT", value_name = "SECS", default_value = "0")]
    pub auto_reject_wait: u64,

    /// Remove ANSI color codes from the forwarded output.
    #[arg(long, env = "DCODE_STRIP_COLORS")]
    pub strip_colors: bool,

    /// Program to wrap.
    #[arg(long, env = "DCODE_PROGRAM", default_value = "claude")]
    pub program: String,

    /// Seconds before an unanswered dialog gives up.
    #[arg(long, env = "DCODE_DIALOG_TIMEOUT", value_name = "SECS", default_value = "60")]
    pub dialog_timeout: u64,

    /// Write debug logs to debug_output.log.
    #[arg(long)]
    pub debug: bool,

    /// Write logs to this file.
    #[arg(long, env = "DCODE_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Log format (json or text).
    #[arg(long, env = "DCODE_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "DCODE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Answer one PermissionRequest hook event read from stdin, then exit.
    #[arg(long)]
    pub hook: bool,

    /// Hook mode: seconds to wait for an answer.
    #[arg(long, value_name = "SECS", default_value = "60")]
    pub timeout: u64,

    /// Arguments passed to the wrapped program.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,

    // -- Duration overrides (skip from CLI; set in Config::test()) --------
    #[clap(skip)]
    pub approve_delay_ms: Option<u64>,
    #[clap(skip)]
    pub reject_delay_ms: Option<u64>,
    #[clap(skip)]
    pub reject_message_delay_ms: Option<u64>,
    #[clap(skip)]
    pub reject_submit_delay_ms: Option<u64>,
    #[clap(skip)]
    pub settle_delay_ms: Option<u64>,
    #[clap(skip)]
    pub cooldown_ms: Option<u64>,
    #[clap(skip)]
    pub duplicate_window_ms: Option<u64>,
    #[clap(skip)]
    pub cleanup_interval_ms: Option<u64>,
    #[clap(skip)]
    pub char_delay_ms: Option<u64>,
    #[clap(skip)]
    pub line_delay_ms: Option<u64>,
    #[clap(skip)]
    pub line_submit_delay_ms: Option<u64>,
}

fn env_duration_ms(var: &str, default: u64) -> Duration {
    let ms = std::env::var(var).ok().and_then(|v| v.parse().ok()).unwrap_or(default);
    Duration::from_millis(ms)
}

macro_rules! duration_field {
    ($method:ident, $field:ident, $env:literal, $default:expr) => {
        pub fn $method(&self) -> Duration {
            match self.$field {
                Some(ms) => Duration::from_millis(ms),
                None => env_duration_ms($env, $default),
            }
        }
    };
}

impl Config {
    /// Validate the configuration after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.program.trim().is_empty() {
            anyhow::bail!("--program must not be empty");
        }
        if self.dialog_timeout == 0 {
            anyhow::bail!("--dialog-timeout must be at least 1 second");
        }
        match self.log_format.as_str() {
            "json" | "text" => {}
            other => anyhow::bail!("invalid log format: {other} (expected json or text)"),
        }
        if self.hook && !HOOK_TIMEOUT_RANGE.contains(&self.timeout) {
            anyhow::bail!(
                "--timeout must be between {} and {} seconds",
                HOOK_TIMEOUT_RANGE.start(),
                HOOK_TIMEOUT_RANGE.end()
            );
        }
        Ok(())
    }

    /// Answering mode, by flag precedence.
    pub fn mode(&self) -> Mode {
        Mode::resolve(
            self.auto_approve,
            self.auto_reject,
            Duration::from_secs(self.auto_reject_wait),
        )
    }

    /// Program followed by its arguments.
    pub fn command(&self) -> Vec<String> {
        std::iter::once(self.program.clone()).chain(self.args.iter().cloned()).collect()
    }

    /// Where logs go, if anywhere.
    pub fn log_path(&self) -> Option<PathBuf> {
        match (&self.log_file, self.debug) {
            (Some(path), _) => Some(path.clone()),
            (None, true) => Some(PathBuf::from(DEBUG_LOG_FILE)),
            (None, false) => None,
        }
    }

    /// Effective log level: `--debug` raises it to debug.
    pub fn effective_log_level(&self) -> &str {
        if self.debug && self.log_level == "info" {
            "debug"
        } else {
            &self.log_level
        }
    }

    pub fn dialog_timeout(&self) -> Duration {
        Duration::from_secs(self.dialog_timeout)
    }

    pub fn hook_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn timing(&self) -> Timing {
        Timing {
            approve_delay: self.approve_delay(),
            reject_delay: self.reject_delay(),
            reject_message_delay: self.reject_message_delay(),
            reject_submit_delay: self.reject_submit_delay(),
            settle_delay: self.settle_delay(),
            cooldown: self.cooldown(),
            dialog_timeout: self.dialog_timeout(),
        }
    }

    pub fn typing(&self) -> Typing {
        Typing {
            char_delay: self.char_delay(),
            line_delay: self.line_delay(),
            submit_delay: self.line_submit_delay(),
        }
    }

    // -- Tuning knobs (field override → env var → compiled default) --------

    duration_field!(approve_delay, approve_delay_ms, "DCODE_APPROVE_DELAY_MS", 100);
    duration_field!(reject_delay, reject_delay_ms, "DCODE_REJECT_DELAY_MS", 500);
    duration_field!(
        reject_message_delay,
        reject_message_delay_ms,
        "DCODE_REJECT_MESSAGE_DELAY_MS",
        500
    );
    duration_field!(
        reject_submit_delay,
        reject_submit_delay_ms,
        "DCODE_REJECT_SUBMIT_DELAY_MS",
        400
    );
    duration_field!(settle_delay, settle_delay_ms, "DCODE_SETTLE_DELAY_MS", 300);
    duration_field!(cooldown, cooldown_ms, "DCODE_COOLDOWN_MS", 3_000);
    duration_field!(duplicate_window, duplicate_window_ms, "DCODE_DUPLICATE_WINDOW_MS", 5_000);
    duration_field!(cleanup_interval, cleanup_interval_ms, "DCODE_CLEANUP_INTERVAL_MS", 300_000);
    duration_field!(char_delay, char_delay_ms, "DCODE_CHAR_DELAY_MS", 10);
    duration_field!(line_delay, line_delay_ms, "DCODE_LINE_DELAY_MS", 100);
    duration_field!(line_submit_delay, line_submit_delay_ms, "DCODE_LINE_SUBMIT_DELAY_MS", 500);

    /// Build a minimal `Config` for tests (`cat` as the program, tiny delays).
    #[doc(hidden)]
    pub fn test() -> Self {
        Self {
            auto_approve: false,
            auto_reject: false,
            auto_reject_wait: 0,
            strip_colors: false,
            program: "cat".into(),
            dialog_timeout: 5,
            debug: false,
            log_file: None,
            log_format: "text".into(),
            log_level: "debug".into(),
            hook: false,
            timeout: 60,
            args: Vec::new(),
            approve_delay_ms: Some(10),
            reject_delay_ms: Some(10),
            reject_message_delay_ms: Some(10),
            reject_submit_delay_ms: Some(10),
            settle_delay_ms: Some(10),
            cooldown_ms: Some(100),
            duplicate_window_ms: Some(500),
            cleanup_interval_ms: Some(1_000),
            char_delay_ms: Some(0),
            line_delay_ms: Some(0),
            line_submit_delay_ms: Some(0),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
