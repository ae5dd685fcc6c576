// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::ffi::CString;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use nix::pty::{forkpty, ForkptyResult, Winsize};
use nix::sys::signal::{kill, SigHandler, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{execvp, Pid};
use tokio::io::unix::AsyncFd;
use tracing::debug;

use super::nbio::{set_nonblocking, PtyFd, PtyReader, PtyWriter};
use super::ExitStatus;

/// The wrapped program running on its own pseudo-terminal.
pub struct NativePty {
    master: Arc<AsyncFd<PtyFd>>,
    child_pid: Pid,
    reaped: Arc<AtomicBool>,
    reap_interval: Duration,
}

impl NativePty {
    /// Spawn `command` (program followed by its arguments) on a new PTY of
    /// the given size. The child inherits the environment.
    // forkpty requires unsafe: post-fork child is partially initialized
    #[allow(unsafe_code)]
    pub fn spawn(command: &[String], cols: u16, rows: u16) -> anyhow::Result<Self> {
        let c_args: Vec<CString> = command
            .iter()
            .map(|s| CString::new(s.as_bytes()))
            .collect::<Result<_, _>>()
            .context("invalid command argument")?;
        let Some(program) = c_args.first() else {
            bail!("no program to run");
        };

        let winsize = Winsize { ws_col: cols, ws_row: rows, ws_xpixel: 0, ws_ypixel: 0 };

        // SAFETY: forkpty is unsafe because the child is in a
        // partially-initialized state after fork. We immediately exec.
        let result = unsafe { forkpty(&winsize, None) }.context("forkpty failed")?;

        match result {
            ForkptyResult::Child => {
                // Tokio sets SIGPIPE to SIG_IGN which the child inherits;
                // restore it so piped programs behave normally.
                // SAFETY: in the post-fork child before exec this is the
                // expected place to change signal disposition.
                unsafe {
                    let _ = nix::sys::signal::signal(Signal::SIGPIPE, SigHandler::SigDfl);
                }
                if std::env::var_os("TERM").is_none() {
                    std::env::set_var("TERM", "xterm-256color");
                }
                let err = match execvp(program, &c_args) {
                    Ok(never) => match never {},
                    Err(e) => e,
                };
                eprintln!("dcode: cannot run {}: {err}", program.to_string_lossy());
                std::process::exit(127);
            }
            ForkptyResult::Parent { child, master } => {
                set_nonblocking(&master)?;
                let afd = AsyncFd::new(PtyFd(master)).context("AsyncFd::new failed")?;
                debug!(pid = child.as_raw(), cols, rows, "spawned child on pty");
                Ok(Self {
                    master: Arc::new(afd),
                    child_pid: child,
                    reaped: Arc::new(AtomicBool::new(false)),
                    reap_interval: Duration::from_millis(50),
                })
            }
        }
    }

    pub fn with_reap_interval(mut self, interval: Duration) -> Self {
        self.reap_interval = interval;
        self
    }

    /// The child's output.
    pub fn reader(&self) -> PtyReader {
        PtyReader::new(Arc::clone(&self.master))
    }

    /// The child's input.
    pub fn writer(&self) -> PtyWriter {
        PtyWriter::new(Arc::clone(&self.master))
    }

    pub fn resize(&self, cols: u16, rows: u16) -> anyhow::Result<()> {
        let ws =
            rustix::termios::Winsize { ws_col: cols, ws_row: rows, ws_xpixel: 0, ws_ypixel: 0 };
        rustix::termios::tcsetwinsize(self.master.get_ref(), ws)
            .context("TIOCSWINSZ ioctl failed")?;
        Ok(())
    }

    pub fn child_pid(&self) -> u32 {
        self.child_pid.as_raw() as u32
    }

    /// Send SIGHUP to the child's process group, as a closing terminal would.
    pub fn hangup(&self) -> anyhow::Result<()> {
        kill(Pid::from_raw(-self.child_pid.as_raw()), Signal::SIGHUP).context("SIGHUP failed")?;
        Ok(())
    }

    /// Wait for the child to exit.
    pub async fn wait(&self) -> anyhow::Result<ExitStatus> {
        let pid = self.child_pid;
        // Reap on a blocking thread to avoid blocking the runtime.
        let status = tokio::task::spawn_blocking(move || wait_for_exit(pid))
            .await
            .context("join wait thread")??;
        self.reaped.store(true, Ordering::Release);
        Ok(status)
    }
}

impl Drop for NativePty {
    fn drop(&mut self) {
        if self.reaped.load(Ordering::Acquire) {
            return;
        }
        // forkpty places the child in a new session (setsid), so the child PID
        // equals the process group ID. Signal the entire group to clean up
        // grandchildren as well.
        let pgid = Pid::from_raw(-self.child_pid.as_raw());
        let _ = kill(pgid, Signal::SIGHUP);

        // Poll for exit up to 500ms before escalating to SIGKILL.
        let iterations = (500 / self.reap_interval.as_millis().max(1)) as usize;
        for _ in 0..iterations.max(1) {
            match waitpid(self.child_pid, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::Exited(..)) | Ok(WaitStatus::Signaled(..)) => return,
                Err(_) => return,
                _ => std::thread::sleep(self.reap_interval),
            }
        }

        let _ = kill(pgid, Signal::SIGKILL);
        let _ = waitpid(self.child_pid, Some(WaitPidFlag::WNOHANG));
    }
}

/// Block until the child exits.
fn wait_for_exit(pid: Pid) -> anyhow::Result<ExitStatus> {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => {
                return Ok(ExitStatus { code: Some(code), signal: None });
            }
            Ok(WaitStatus::Signaled(_, sig, _)) => {
                return Ok(ExitStatus { code: None, signal: Some(sig as i32) });
            }
            Ok(_) => continue,
            Err(nix::errno::Errno::EINTR) => continue,
            Err(e) => bail!("waitpid failed: {e}"),
        }
    }
}
