// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use bytes::Bytes;

/// One write into the child, followed by an optional pause so the TUI can
/// re-render before the next step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteStep {
    pub bytes: Bytes,
    pub delay_after: Option<Duration>,
}

impl WriteStep {
    pub fn new(bytes: impl Into<Bytes>, delay_after: Option<Duration>) -> Self {
        Self { bytes: bytes.into(), delay_after }
    }
}

/// Select `choice`. Claude reacts to the bare digit; no Enter is sent.
pub fn choice_steps(choice: u32) -> Vec<WriteStep> {
    vec![WriteStep::new(choice.to_string(), None)]
}

/// Select the rejecting `choice`, type the explanation, then submit it.
pub fn reject_steps(
    choice: u32,
    message: &str,
    message_delay: Duration,
    submit_delay: Duration,
) -> Vec<WriteStep> {
    vec![
        WriteStep::new(choice.to_string(), Some(message_delay)),
        WriteStep::new(message.to_owned(), Some(submit_delay)),
        WriteStep::new(Bytes::from_static(b"\r"), None),
    ]
}

#[cfg(test)]
#[path = "encoding_tests.rs"]
mod tests;
