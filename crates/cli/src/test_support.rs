// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: fixtures, fakes, and assertion helpers.

use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::io::AsyncWrite;
use tokio::time::Instant;

use crate::dialog::{ConfirmDialog, DialogFuture, DialogRequest};

/// A Bash permission box as Claude renders it, preceded by the tool call.
pub fn bash_box() -> [&'static str; 11] {
    [
        "⏺ Bash(rm test-file)",
        "╭───────────────────────────────────────────╮",
        "│ Bash command                              │",
        "│                                           │",
        "│   rm test-file                            │",
        "│   Remove test file                        │",
        "│                                           │",
        "│ Do you want to proceed?                   │",
        "│ ❯ 1. Yes                                  │",
        "│   2. No                                   │",
        "╰───────────────────────────────────────────╯",
    ]
}

/// A second, textually distinct permission box.
pub fn edit_box() -> [&'static str; 9] {
    [
        "⏺ Update(notes.txt)",
        "╭───────────────────────────────────────────╮",
        "│ Edit file                                 │",
        "│   notes.txt                               │",
        "│ Do you want to make this edit to notes.txt? │",
        "│ ❯ 1. Yes                                  │",
        "│   2. Yes, and don't ask again this session │",
        "│   3. No, and tell Claude what to do        │",
        "╰───────────────────────────────────────────╯",
    ]
}

/// A rejection notice that quotes the question it answered.
pub fn rejection_notice_box() -> [&'static str; 6] {
    [
        "⏺ Update(gradle.properties)",
        "╭───────────────────────────────────────────────────────╮",
        "│ > Rejected command:                                   │",
        "│ Do you want to make this edit to gradle.properties?   │",
        "│ The command was automatically rejected. If using Task │",
        "╰───────────────────────────────────────────────────────╯",
    ]
}

/// Join lines into the byte stream a PTY would produce.
pub fn pty_bytes<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<u8> {
    let mut out = Vec::new();
    for line in lines {
        out.extend_from_slice(line.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    out
}

pub fn owned(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|l| l.to_string()).collect()
}

/// Records every chunk written into the child, with the time it arrived.
#[derive(Debug, Clone, Default)]
pub struct CaptureWriter {
    writes: Arc<Mutex<Vec<(Instant, Bytes)>>>,
}

impl CaptureWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunks(&self) -> Vec<Bytes> {
        self.writes.lock().iter().map(|(_, b)| b.clone()).collect()
    }

    pub fn timed_chunks(&self) -> Vec<(Instant, Bytes)> {
        self.writes.lock().clone()
    }

    /// Everything written so far, lossily decoded.
    pub fn text(&self) -> String {
        let bytes: Vec<u8> = self.writes.lock().iter().flat_map(|(_, b)| b.to_vec()).collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl AsyncWrite for CaptureWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.writes.lock().push((Instant::now(), Bytes::copy_from_slice(buf)));
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Accepts `ok_writes` writes, then fails every write with `BrokenPipe`.
#[derive(Debug, Clone)]
pub struct FailingWriter {
    inner: CaptureWriter,
    ok_writes: usize,
    attempts: Arc<AtomicUsize>,
}

impl FailingWriter {
    pub fn after(ok_writes: usize) -> Self {
        Self { inner: CaptureWriter::new(), ok_writes, attempts: Arc::new(AtomicUsize::new(0)) }
    }

    pub fn captured(&self) -> &CaptureWriter {
        &self.inner
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl AsyncWrite for FailingWriter {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt >= self.ok_writes {
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "pty gone")));
        }
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[derive(Debug, Clone)]
enum Script {
    Answer(Option<usize>),
    Fail(String),
}

/// Fake confirmation dialog with a scripted answer and optional delay.
#[derive(Clone)]
pub struct ScriptedDialog {
    script: Script,
    delay: Duration,
    requests: Arc<Mutex<Vec<DialogRequest>>>,
    answered: Arc<AtomicUsize>,
}

impl ScriptedDialog {
    /// Clicks button `n` (1-based).
    pub fn clicking(button: usize) -> Self {
        Self::with_script(Script::Answer(Some(button)))
    }

    /// Gives up without an answer.
    pub fn giving_up() -> Self {
        Self::with_script(Script::Answer(None))
    }

    pub fn failing(message: &str) -> Self {
        Self::with_script(Script::Fail(message.to_owned()))
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            delay: Duration::ZERO,
            requests: Arc::new(Mutex::new(Vec::new())),
            answered: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Answer only after `delay`.
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<DialogRequest> {
        self.requests.lock().clone()
    }

    /// Dialogs that ran to completion (not dropped while waiting).
    pub fn answered(&self) -> usize {
        self.answered.load(Ordering::SeqCst)
    }
}

impl ConfirmDialog for ScriptedDialog {
    fn show(&self, request: DialogRequest) -> DialogFuture<'_> {
        self.requests.lock().push(request);
        Box::pin(async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.answered.fetch_add(1, Ordering::SeqCst);
            match &self.script {
                Script::Answer(answer) => Ok(*answer),
                Script::Fail(message) => Err(anyhow::anyhow!("{message}")),
            }
        })
    }
}

/// Assert that `$expr` is an `Err` whose message contains `$substr`.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = err.to_string();
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}
