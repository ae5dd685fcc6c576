// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The user's terminal: raw mode, size, and resize propagation.

use std::io::IsTerminal;
use std::os::fd::AsFd;
use std::sync::Arc;

use nix::sys::termios::{self, SetArg, Termios};
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::pty::spawn::NativePty;

pub const FALLBACK_SIZE: (u16, u16) = (80, 24);

/// RAII guard that restores the original stdin attributes on drop.
pub struct RawModeGuard {
    original: Termios,
}

impl RawModeGuard {
    pub fn enter() -> anyhow::Result<Self> {
        let stdin = std::io::stdin();
        let original = termios::tcgetattr(stdin.as_fd())?;
        let mut raw = original.clone();
        termios::cfmakeraw(&mut raw);
        termios::tcsetattr(stdin.as_fd(), SetArg::TCSAFLUSH, &raw)?;
        Ok(Self { original })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let stdin = std::io::stdin();
        let _ = termios::tcsetattr(stdin.as_fd(), SetArg::TCSAFLUSH, &self.original);
    }
}

pub fn stdin_is_terminal() -> bool {
    std::io::stdin().is_terminal()
}

/// Current (cols, rows) of the controlling terminal, if there is one.
pub fn size() -> Option<(u16, u16)> {
    let stdout = std::io::stdout();
    let ws = rustix::termios::tcgetwinsize(&stdout).ok()?;
    (ws.ws_col > 0 && ws.ws_row > 0).then_some((ws.ws_col, ws.ws_row))
}

/// Copy every SIGWINCH size change onto the child's pty until `cancel`.
pub fn spawn_resize_forwarder(
    pty: Arc<NativePty>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut sigwinch = match signal(SignalKind::window_change()) {
            Ok(s) => s,
            Err(e) => {
                warn!("cannot watch terminal resizes: {e}");
                return;
            }
        };
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                received = sigwinch.recv() => {
                    if received.is_none() {
                        break;
                    }
                    let Some((cols, rows)) = size() else { continue };
                    debug!(cols, rows, "terminal resized");
                    if let Err(e) = pty.resize(cols, rows) {
                        warn!("resize failed: {e:#}");
                    }
                }
            }
        }
    })
}
