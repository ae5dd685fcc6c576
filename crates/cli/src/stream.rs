// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stream driver: the one sequential loop over the child's output.
//!
//! Every chunk is forwarded to the display (through the display filter) and
//! split into lines for the prompt collector. Frozen prompts are dispatched
//! on background tasks so the loop never waits on a dialog or a delay.

use std::sync::Arc;

use anyhow::Context;
use nix::libc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, warn};

use crate::ansi::DisplayFilter;
use crate::dispatch::{Dispatcher, Outcome};
use crate::prompt::collect::{Feed, PromptCollector};

/// Longest line kept before it is force-split.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

const READ_CHUNK: usize = 8192;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamStats {
    pub lines: u64,
    pub prompts_opened: u64,
    pub suppressed: u64,
    pub dispatched: u64,
}

pub struct StreamDriver {
    collector: PromptCollector,
    dispatcher: Arc<Dispatcher>,
    filter: DisplayFilter,
    dispatches: JoinSet<Outcome>,
    line: Vec<u8>,
    stats: StreamStats,
}

impl StreamDriver {
    pub fn new(
        collector: PromptCollector,
        dispatcher: Arc<Dispatcher>,
        filter: DisplayFilter,
    ) -> Self {
        Self {
            collector,
            dispatcher,
            filter,
            dispatches: JoinSet::new(),
            line: Vec::new(),
            stats: StreamStats::default(),
        }
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Dispatches still running.
    pub fn pending(&self) -> usize {
        self.dispatches.len()
    }

    /// Pump `reader` into `display` until end of stream. A pty master reports
    /// the child's exit as `EIO`, which also ends the loop cleanly.
    pub async fn run<R, W>(&mut self, mut reader: R, mut display: W) -> anyhow::Result<StreamStats>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let n = match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.raw_os_error() == Some(libc::EIO) => break,
                Err(e) => return Err(e).context("reading child output"),
            };

            let shown = self.filter.filter(&buf[..n]);
            if !shown.is_empty() {
                display.write_all(&shown).await.context("writing display")?;
                display.flush().await.context("flushing display")?;
            }
            self.feed(&buf[..n]);
            self.reap();
        }

        let rest = self.filter.finish();
        if !rest.is_empty() {
            display.write_all(&rest).await.context("writing display")?;
            display.flush().await.context("flushing display")?;
        }
        if !self.line.is_empty() {
            debug!(bytes = self.line.len(), "dropping unterminated line at end of stream");
            self.line.clear();
        }
        Ok(self.stats)
    }

    /// Split a chunk into lines and feed each complete one to the collector.
    pub fn feed(&mut self, chunk: &[u8]) {
        let mut rest = chunk;
        while let Some(pos) = rest.iter().position(|b| *b == b'\n') {
            self.line.extend_from_slice(&rest[..pos]);
            self.take_line();
            rest = &rest[pos + 1..];
        }
        self.line.extend_from_slice(rest);
        if self.line.len() >= MAX_LINE_BYTES {
            self.take_line();
        }
    }

    fn take_line(&mut self) {
        let mut bytes = std::mem::take(&mut self.line);
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        let line = String::from_utf8_lossy(&bytes);
        self.feed_line(&line);
    }

    fn feed_line(&mut self, line: &str) {
        self.stats.lines += 1;
        match self.collector.feed(line) {
            None => {}
            Some(Feed::Opened) => {
                self.stats.prompts_opened += 1;
                debug!("prompt opened");
            }
            Some(Feed::Suppressed(reason)) => {
                self.stats.suppressed += 1;
                debug!(?reason, "prompt suppressed");
            }
            Some(Feed::Choice(index)) => debug!(index, "choice collected"),
            Some(Feed::Empty) => debug!("box closed without choices"),
            Some(Feed::Frozen(prompt)) => {
                self.stats.dispatched += 1;
                debug!(reason = prompt.reason, "dispatching prompt");
                let dispatcher = Arc::clone(&self.dispatcher);
                self.dispatches.spawn(async move { dispatcher.dispatch(prompt).await });
            }
        }
    }

    fn reap(&mut self) {
        while let Some(result) = self.dispatches.try_join_next() {
            log_join(result);
        }
    }

    /// Wait for every outstanding dispatch and return their outcomes.
    pub async fn drain(&mut self) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        while let Some(result) = self.dispatches.join_next().await {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => log_join(Err(e)),
            }
        }
        outcomes
    }

    /// Cancel outstanding dispatches (an open dialog is dismissed on drop).
    pub async fn shutdown(&mut self) {
        self.dispatches.shutdown().await;
    }
}

fn log_join(result: Result<Outcome, JoinError>) {
    match result {
        Ok(outcome) => debug!("dispatch finished: {outcome:?}"),
        Err(e) if e.is_cancelled() => {}
        Err(e) => warn!("dispatch task failed: {e}"),
    }
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
