// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `PermissionRequest` hook mode: answer one request read from stdin with
//! the confirmation dialog and print the decision as JSON.

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

use crate::dialog::{ConfirmDialog, DialogRequest};

pub const HOOK_EVENT: &str = "PermissionRequest";

const ALLOW: &str = "Allow";
const DENY: &str = "Deny";

/// The fields of a hook event that the dialog needs.
#[derive(Debug, Clone, Deserialize)]
pub struct PermissionRequest {
    pub tool_name: String,
    pub tool_input: serde_json::Map<String, serde_json::Value>,
}

impl PermissionRequest {
    /// Dialog text: the tool, plus its command or target file when present.
    pub fn message(&self) -> String {
        let mut message = format!("Tool: {}", self.tool_name);
        if let Some(command) = self.tool_input.get("command").and_then(|v| v.as_str()) {
            message.push_str("\nCommand: ");
            message.push_str(command);
        }
        if let Some(path) = self.tool_input.get("file_path").and_then(|v| v.as_str()) {
            message.push_str("\nFile: ");
            message.push_str(path);
        }
        message
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Behavior {
    Allow,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub behavior: Behavior,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interrupt: Option<bool>,
}

impl Decision {
    pub fn allow() -> Self {
        Self { behavior: Behavior::Allow, message: None, interrupt: None }
    }

    /// Deny without interrupting Claude, optionally telling it why.
    pub fn deny(message: Option<String>) -> Self {
        Self { behavior: Behavior::Deny, message, interrupt: Some(false) }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookResponse {
    pub hook_specific_output: HookOutput,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookOutput {
    pub hook_event_name: &'static str,
    pub decision: Decision,
}

impl From<Decision> for HookResponse {
    fn from(decision: Decision) -> Self {
        Self { hook_specific_output: HookOutput { hook_event_name: HOOK_EVENT, decision } }
    }
}

/// Ask the user about `request`. Anything but a click on "Allow" denies.
pub async fn decide(
    request: &PermissionRequest,
    dialog: &dyn ConfirmDialog,
    timeout: Duration,
) -> Decision {
    let shown = DialogRequest {
        message: request.message(),
        buttons: vec![ALLOW.to_owned(), DENY.to_owned()],
        default_button: DENY.to_owned(),
    };
    let no_answer = || {
        let secs = timeout.as_secs();
        Decision::deny(Some(format!("User did not respond within {secs} seconds")))
    };

    match tokio::time::timeout(timeout, dialog.show(shown)).await {
        Ok(Ok(Some(1))) => Decision::allow(),
        Ok(Ok(Some(_))) => Decision::deny(None),
        Ok(Ok(None)) | Err(_) => no_answer(),
        Ok(Err(e)) => {
            warn!("dialog failed: {e:#}");
            no_answer()
        }
    }
}

/// Read one request from `input`, decide, and write the response line.
pub async fn run<R, W>(
    mut input: R,
    mut output: W,
    dialog: &dyn ConfirmDialog,
    timeout: Duration,
) -> anyhow::Result<Decision>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut raw = Vec::new();
    input.read_to_end(&mut raw).await.context("reading hook input")?;
    let request: PermissionRequest =
        serde_json::from_slice(&raw).context("invalid PermissionRequest input")?;

    let decision = decide(&request, dialog, timeout).await;
    info!(tool = %request.tool_name, behavior = ?decision.behavior, "hook decision");

    let mut line = serde_json::to_vec(&HookResponse::from(decision.clone()))?;
    line.push(b'\n');
    output.write_all(&line).await.context("writing hook output")?;
    output.flush().await?;
    Ok(decision)
}

#[cfg(test)]
#[path = "hook_tests.rs"]
mod tests;
