// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! macOS dialog via `osascript`.

use std::time::Duration;

use anyhow::{bail, Context};
use tokio::process::Command;
use tracing::debug;

use super::{ConfirmDialog, DialogFuture, DialogRequest};

/// `display dialog` supports at most this many buttons.
const MAX_DIALOG_BUTTONS: usize = 3;

const MAX_LABEL_CHARS: usize = 50;

pub struct OsaScriptDialog {
    title: String,
    timeout: Duration,
}

impl OsaScriptDialog {
    pub fn new(title: impl Into<String>, timeout: Duration) -> Self {
        Self { title: title.into(), timeout }
    }
}

impl ConfirmDialog for OsaScriptDialog {
    fn show(&self, request: DialogRequest) -> DialogFuture<'_> {
        Box::pin(async move {
            if request.buttons.is_empty() {
                return Ok(None);
            }
            let labels: Vec<String> =
                request.buttons.iter().map(|b| truncate_label(b)).collect();
            let script = build_script(&self.title, &request, &labels, self.timeout);

            let mut cmd = Command::new("osascript");
            cmd.arg("-e").arg(&script).kill_on_drop(true);
            // `choose from list` cannot give up on its own.
            let Ok(output) = tokio::time::timeout(self.timeout, cmd.output()).await else {
                debug!("dialog timed out");
                return Ok(None);
            };
            let output = output.context("failed to run osascript")?;
            if !output.status.success() {
                bail!(
                    "osascript exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }
            parse_response(&String::from_utf8_lossy(&output.stdout), &labels)
        })
    }
}

/// Labels longer than the dialog can show are cut to 47 chars plus `...`.
pub fn truncate_label(label: &str) -> String {
    if label.chars().count() <= MAX_LABEL_CHARS {
        return label.to_owned();
    }
    let mut out: String = label.chars().take(MAX_LABEL_CHARS - 3).collect();
    out.push_str("...");
    out
}

pub fn build_script(
    title: &str,
    request: &DialogRequest,
    labels: &[String],
    timeout: Duration,
) -> String {
    let list = labels.iter().map(|l| quote(l)).collect::<Vec<_>>().join(", ");
    let default = truncate_label(&request.default_button);

    if labels.len() <= MAX_DIALOG_BUTTONS {
        format!(
            "display dialog {} with title {} buttons {{{list}}} \
             default button {} giving up after {}",
            quote(&request.message),
            quote(title),
            quote(&default),
            timeout.as_secs().max(1)
        )
    } else {
        format!(
            "choose from list {{{list}}} with title {} with prompt {} default items {{{}}}",
            quote(title),
            quote(&request.message),
            quote(&default)
        )
    }
}

/// Map osascript output to a 1-based button index.
pub fn parse_response(stdout: &str, labels: &[String]) -> anyhow::Result<Option<usize>> {
    let stdout = stdout.trim();
    if stdout.contains("gave up:true") {
        return Ok(None);
    }
    if stdout == "false" {
        bail!("dialog cancelled");
    }
    let chosen = match stdout.strip_prefix("button returned:") {
        Some(rest) => rest.split(", gave up:").next().unwrap_or(rest),
        None => stdout,
    };
    match labels.iter().position(|l| l == chosen) {
        Some(i) => Ok(Some(i + 1)),
        None => bail!("unrecognized dialog result: {stdout}"),
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
#[path = "osascript_tests.rs"]
mod tests;
