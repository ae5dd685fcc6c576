// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Native confirmation dialog capability.

pub mod osascript;

use std::future::Future;
use std::pin::Pin;

/// What to show the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogRequest {
    pub message: String,
    pub buttons: Vec<String>,
    pub default_button: String,
}

/// `Ok(Some(n))` is the 1-based index of the clicked button; `Ok(None)`
/// means the dialog gave up without an answer.
pub type DialogFuture<'a> =
    Pin<Box<dyn Future<Output = anyhow::Result<Option<usize>>> + Send + 'a>>;

/// Shows a blocking question with a fixed set of buttons.
///
/// Implementations must resolve within their own timeout. Dropping the
/// returned future dismisses the dialog.
pub trait ConfirmDialog: Send + Sync + 'static {
    fn show(&self, request: DialogRequest) -> DialogFuture<'_>;
}
