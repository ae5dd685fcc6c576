// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level session runner, shared by `main` and integration tests.

use std::fs::OpenOptions;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, BufReader};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::ansi::DisplayFilter;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::dialog::osascript::OsaScriptDialog;
use crate::dialog::ConfirmDialog;
use crate::dispatch::Dispatcher;
use crate::hook;
use crate::input::InputWriter;
use crate::ledger::{DedupLedger, MAIN_DIALOG};
use crate::prompt::choice::ChoiceParser;
use crate::prompt::classify::Classifier;
use crate::prompt::collect::PromptCollector;
use crate::pty::spawn::NativePty;
use crate::pty::ExitStatus;
use crate::stream::StreamDriver;
use crate::terminal::{self, RawModeGuard, FALLBACK_SIZE};

/// Title of every confirmation dialog.
pub const DIALOG_TITLE: &str = "Claude Permission";

/// How long the child gets to exit after a hangup before it is killed.
const EXIT_GRACE: Duration = Duration::from_secs(2);

/// Initialize tracing from config. Without a log file nothing is recorded:
/// the terminal belongs to the child.
///
/// Uses `try_init` so it's safe to call multiple times (e.g. from tests).
pub fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;

    let Some(path) = config.log_path() else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;

    let filter = EnvFilter::try_new(config.effective_log_level())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false);

    // A subscriber may already be installed.
    let _ = match config.log_format.as_str() {
        "json" => builder.json().try_init(),
        _ => builder.try_init(),
    };
    Ok(())
}

/// Pacing for piped stdin, which is typed into the child line by line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Typing {
    pub char_delay: Duration,
    pub line_delay: Duration,
    pub submit_delay: Duration,
}

/// Type each line of `reader` into `input` one character at a time, then
/// submit it. Returns the number of lines typed.
pub async fn type_lines<R>(
    reader: R,
    input: &InputWriter,
    clock: &dyn Clock,
    typing: Typing,
) -> anyhow::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut typed = 0;
    while let Some(line) = lines.next_line().await.context("reading piped input")? {
        let mut utf8 = [0u8; 4];
        for ch in line.chars() {
            input.write(ch.encode_utf8(&mut utf8).as_bytes()).await?;
            clock.sleep(typing.char_delay).await;
        }
        clock.sleep(typing.line_delay).await;
        input.write(b"\n").await?;
        clock.sleep(typing.submit_delay).await;
        typed += 1;
    }
    Ok(typed)
}

/// A spawned child with its prompt pipeline wired up, ready to run.
///
/// Returned by [`prepare`] so callers (e.g. integration tests) can reach the
/// child's input and the ledger before the output loop starts.
pub struct PreparedSession {
    pty: Arc<NativePty>,
    input: Arc<InputWriter>,
    ledger: Arc<DedupLedger>,
    clock: Arc<dyn Clock>,
    driver: StreamDriver,
    cancel: CancellationToken,
    cleanup: JoinHandle<()>,
}

/// Spawn the configured program and build the pipeline around it.
pub fn prepare(
    config: &Config,
    dialog: Arc<dyn ConfirmDialog>,
) -> anyhow::Result<PreparedSession> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let window = config.duplicate_window();

    let (cols, rows) = terminal::size().unwrap_or(FALLBACK_SIZE);
    let pty = Arc::new(NativePty::spawn(&config.command(), cols, rows)?);
    info!(
        pid = pty.child_pid(),
        cols,
        rows,
        mode = %config.mode(),
        "started {}",
        config.program
    );

    let ledger = Arc::new(DedupLedger::new(Arc::clone(&clock), window));
    let input = Arc::new(InputWriter::new(pty.writer()));
    let dispatcher = Dispatcher::new(
        config.mode(),
        config.timing(),
        MAIN_DIALOG,
        Arc::clone(&input),
        dialog,
        Arc::clone(&ledger),
        Arc::clone(&clock),
        ChoiceParser::new()?,
    );
    let collector = PromptCollector::new(
        Classifier::new()?,
        Arc::clone(&ledger),
        Arc::clone(&clock),
        MAIN_DIALOG,
        window,
    );
    let driver = StreamDriver::new(
        collector,
        Arc::new(dispatcher),
        DisplayFilter::new(config.strip_colors),
    );

    let cancel = CancellationToken::new();
    let cleanup = ledger.spawn_cleanup(config.cleanup_interval(), cancel.clone());

    Ok(PreparedSession { pty, input, ledger, clock, driver, cancel, cleanup })
}

impl PreparedSession {
    pub fn pty(&self) -> &Arc<NativePty> {
        &self.pty
    }

    pub fn input(&self) -> &Arc<InputWriter> {
        &self.input
    }

    pub fn ledger(&self) -> &Arc<DedupLedger> {
        &self.ledger
    }

    /// Fires when the session ends. Helper tasks should stop on it.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Forward raw stdin bytes into the child until the session ends.
    pub fn forward_stdin(&self) -> JoinHandle<()> {
        let (tx, mut rx) = mpsc::channel::<Vec<u8>>(64);
        std::thread::spawn(move || {
            use std::io::Read;
            let stdin = std::io::stdin();
            let mut handle = stdin.lock();
            let mut buf = [0u8; 4096];
            loop {
                match handle.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if tx.blocking_send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        let input = Arc::clone(&self.input);
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    data = rx.recv() => {
                        let Some(data) = data else { break };
                        if let Err(e) = input.write(&data).await {
                            debug!("stdin forwarding stopped: {e}");
                            break;
                        }
                    }
                }
            }
        })
    }

    /// Type piped stdin into the child line by line until it runs out.
    pub fn type_stdin(&self, typing: Typing) -> JoinHandle<()> {
        let input = Arc::clone(&self.input);
        let clock = Arc::clone(&self.clock);
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let stdin = BufReader::new(tokio::io::stdin());
            tokio::select! {
                _ = cancel.cancelled() => {}
                result = type_lines(stdin, &input, clock.as_ref(), typing) => match result {
                    Ok(lines) => debug!(lines, "piped input finished"),
                    Err(e) => warn!("piped input stopped: {e:#}"),
                },
            }
        })
    }

    /// Pump the child's output to `display` until it exits or SIGTERM
    /// arrives, then tear everything down.
    pub async fn run<W>(mut self, display: W) -> anyhow::Result<ExitStatus>
    where
        W: AsyncWrite + Unpin,
    {
        let mut sigterm = signal(SignalKind::terminate())?;
        let reader = self.pty.reader();

        let stats = tokio::select! {
            result = self.driver.run(reader, display) => Some(result?),
            _ = sigterm.recv() => {
                info!("received SIGTERM");
                None
            }
        };
        if let Some(stats) = stats {
            info!(
                lines = stats.lines,
                prompts = stats.prompts_opened,
                suppressed = stats.suppressed,
                dispatched = stats.dispatched,
                "child output ended"
            );
        }

        self.cancel.cancel();
        self.input.close().await;
        self.driver.shutdown().await;
        let _ = self.cleanup.await;

        if stats.is_none() {
            if let Err(e) = self.pty.hangup() {
                debug!("{e:#}");
            }
        }
        let status = tokio::time::timeout(EXIT_GRACE, self.pty.wait())
            .await
            .context("child did not exit")??;
        let ledger = self.ledger.stats();
        info!(
            code = ?status.code,
            signal = ?status.signal,
            ledger_entries = ledger.entries,
            processed = ledger.total_processed,
            "child exited"
        );
        Ok(status)
    }
}

/// Run a wrapped session to completion on the real terminal.
///
/// This is the full production codepath: spawn the child, put the terminal in
/// raw mode, forward input and resizes, and answer prompts with the native
/// dialog.
pub async fn run(config: Config) -> anyhow::Result<ExitStatus> {
    let dialog = Arc::new(OsaScriptDialog::new(DIALOG_TITLE, config.dialog_timeout()));
    let session = prepare(&config, dialog)?;

    let interactive = terminal::stdin_is_terminal();
    let _raw = if interactive {
        match RawModeGuard::enter() {
            Ok(guard) => Some(guard),
            Err(e) => {
                warn!("cannot enter raw mode: {e:#}");
                None
            }
        }
    } else {
        None
    };

    if interactive {
        terminal::spawn_resize_forwarder(Arc::clone(session.pty()), session.cancel_token());
        session.forward_stdin();
    } else {
        session.type_stdin(config.typing());
    }

    session.run(tokio::io::stdout()).await
}

/// Hook mode: answer one `PermissionRequest` from stdin on stdout.
pub async fn run_hook(config: &Config) -> anyhow::Result<()> {
    let timeout = config.hook_timeout();
    let dialog = OsaScriptDialog::new(DIALOG_TITLE, timeout);
    hook::run(tokio::io::stdin(), tokio::io::stdout(), &dialog, timeout).await?;
    Ok(())
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
