// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Decision dispatcher: turns a frozen prompt into exactly one write
//! sequence on the child's input.

pub mod encoding;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use self::encoding::{choice_steps, reject_steps, WriteStep};
use crate::clock::Clock;
use crate::dialog::{ConfirmDialog, DialogRequest};
use crate::error::DispatchError;
use crate::input::InputWriter;
use crate::ledger::DedupLedger;
use crate::prompt::choice::{select_best, select_most_restrictive, ChoiceParser};
use crate::prompt::message::{countdown_message, dialog_message, reject_message};
use crate::prompt::FrozenPrompt;

/// How prompts are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Interactive,
    AutoApprove,
    AutoReject,
    /// Show the dialog, but reject once the wait elapses without an answer.
    AutoRejectWait(Duration),
}

impl Mode {
    /// Resolve CLI flags with precedence approve > reject > wait > interactive.
    /// A zero wait disables wait mode.
    pub fn resolve(auto_approve: bool, auto_reject: bool, wait: Duration) -> Self {
        if auto_approve {
            Self::AutoApprove
        } else if auto_reject {
            Self::AutoReject
        } else if !wait.is_zero() {
            Self::AutoRejectWait(wait)
        } else {
            Self::Interactive
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interactive => f.write_str("interactive"),
            Self::AutoApprove => f.write_str("auto-approve"),
            Self::AutoReject => f.write_str("auto-reject"),
            Self::AutoRejectWait(wait) => write!(f, "auto-reject-wait={}", wait.as_secs()),
        }
    }
}

/// Delays used by the write sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Pause before an auto-approve write.
    pub approve_delay: Duration,
    /// Pause before an immediate auto-reject.
    pub reject_delay: Duration,
    /// Between the rejecting choice and the explanation.
    pub reject_message_delay: Duration,
    /// Between the explanation and Enter.
    pub reject_submit_delay: Duration,
    /// Absorbs trailing redraws after the box closes.
    pub settle_delay: Duration,
    /// Suppression window after a dialog-backed decision.
    pub cooldown: Duration,
    /// The dialog's own give-up timeout.
    pub dialog_timeout: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            approve_delay: Duration::from_millis(100),
            reject_delay: Duration::from_millis(500),
            reject_message_delay: Duration::from_millis(500),
            reject_submit_delay: Duration::from_millis(400),
            settle_delay: Duration::from_millis(300),
            cooldown: Duration::from_secs(3),
            dialog_timeout: Duration::from_secs(60),
        }
    }
}

/// What a dispatch did.
#[derive(Debug)]
pub enum Outcome {
    Approved { choice: u32 },
    /// The rejecting choice plus the typed explanation.
    Rejected { choice: u32, after_wait: bool },
    /// A choice picked through the dialog (or forced by a dialog failure).
    Chosen { choice: u32 },
    /// The dialog closed without an answer; nothing was written.
    Dismissed,
    Abandoned(DispatchError),
}

pub struct Dispatcher {
    mode: Mode,
    timing: Timing,
    channel: String,
    input: Arc<InputWriter>,
    dialog: Arc<dyn ConfirmDialog>,
    ledger: Arc<DedupLedger>,
    clock: Arc<dyn Clock>,
    parser: ChoiceParser,
}

impl Dispatcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        mode: Mode,
        timing: Timing,
        channel: impl Into<String>,
        input: Arc<InputWriter>,
        dialog: Arc<dyn ConfirmDialog>,
        ledger: Arc<DedupLedger>,
        clock: Arc<dyn Clock>,
        parser: ChoiceParser,
    ) -> Self {
        Self { mode, timing, channel: channel.into(), input, dialog, ledger, clock, parser }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Settle, decide, and write. Runs on its own task so the stream driver
    /// never waits on a dialog or a delay.
    pub async fn dispatch(&self, prompt: FrozenPrompt) -> Outcome {
        self.clock.sleep(self.timing.settle_delay).await;
        if self.input.is_closed().await {
            return Outcome::Abandoned(DispatchError::InputClosed);
        }

        let outcome = match self.mode {
            Mode::AutoApprove => self.auto_approve(&prompt).await,
            Mode::AutoReject => self.auto_reject(&prompt).await,
            Mode::AutoRejectWait(wait) => self.reject_after_wait(&prompt, wait).await,
            Mode::Interactive => self.interactive(&prompt).await,
        };
        match &outcome {
            Outcome::Abandoned(e) => warn!(code = e.as_str(), "dispatch abandoned: {e}"),
            other => info!(mode = %self.mode, "dispatch complete: {other:?}"),
        }
        outcome
    }

    async fn auto_approve(&self, prompt: &FrozenPrompt) -> Outcome {
        let choice = select_best(&prompt.choices);
        self.clock.sleep(self.timing.approve_delay).await;
        match self.play(&choice_steps(choice)).await {
            Ok(()) => Outcome::Approved { choice },
            Err(e) => Outcome::Abandoned(e),
        }
    }

    async fn auto_reject(&self, prompt: &FrozenPrompt) -> Outcome {
        self.clock.sleep(self.timing.reject_delay).await;
        self.reject(prompt, false).await
    }

    /// Race the countdown dialog against the wait timer. Whichever finishes
    /// first decides; the loser is dropped before anything is written.
    async fn reject_after_wait(&self, prompt: &FrozenPrompt, wait: Duration) -> Outcome {
        let showing = self.ledger.arm_cooldown(&self.channel, wait + self.timing.cooldown);
        let mut request = self.request(prompt);
        request.message = countdown_message(prompt, wait, &self.parser);

        let mut timer = self.clock.sleep(wait);
        let answer = tokio::select! {
            biased;
            _ = &mut timer => None,
            answer = self.dialog.show(request) => Some(answer),
        };

        let outcome = match answer {
            None => {
                debug!("wait elapsed without an answer");
                self.reject(prompt, true).await
            }
            Some(Ok(Some(button))) => self.choose(prompt, button).await,
            Some(Ok(None)) => {
                timer.await;
                self.reject(prompt, true).await
            }
            Some(Err(e)) => {
                warn!("dialog failed: {e:#}");
                self.reject(prompt, false).await
            }
        };
        self.finish_cooldown(showing, &outcome);
        outcome
    }

    async fn interactive(&self, prompt: &FrozenPrompt) -> Outcome {
        let request = self.request(prompt);
        if request.buttons.is_empty() {
            return Outcome::Dismissed;
        }
        let showing = self
            .ledger
            .arm_cooldown(&self.channel, self.timing.dialog_timeout + self.timing.cooldown);

        let outcome = match self.dialog.show(request).await {
            Ok(Some(button)) => self.choose(prompt, button).await,
            Ok(None) => Outcome::Dismissed,
            Err(e) => {
                warn!("dialog failed: {e:#}");
                let choice = select_most_restrictive(&prompt.choices);
                self.write_choice(choice).await
            }
        };
        self.finish_cooldown(showing, &outcome);
        outcome
    }

    async fn choose(&self, prompt: &FrozenPrompt, button: usize) -> Outcome {
        let choice = match prompt.choice_for_button(button) {
            Some(choice) => choice,
            None => {
                warn!(button, "dialog returned an unknown button");
                select_most_restrictive(&prompt.choices)
            }
        };
        self.write_choice(choice).await
    }

    async fn write_choice(&self, choice: u32) -> Outcome {
        match self.play(&choice_steps(choice)).await {
            Ok(()) => Outcome::Chosen { choice },
            Err(e) => Outcome::Abandoned(e),
        }
    }

    async fn reject(&self, prompt: &FrozenPrompt, after_wait: bool) -> Outcome {
        let choice = select_most_restrictive(&prompt.choices);
        let message = reject_message(&prompt.context, after_wait, &self.parser);
        let steps = reject_steps(
            choice,
            &message,
            self.timing.reject_message_delay,
            self.timing.reject_submit_delay,
        );
        match self.play(&steps).await {
            Ok(()) => Outcome::Rejected { choice, after_wait },
            Err(e) => Outcome::Abandoned(e),
        }
    }

    /// Replace the cooldown that covered the open dialog: a decision starts
    /// the regular cooldown, no decision lifts it.
    fn finish_cooldown(&self, showing: tokio::time::Instant, outcome: &Outcome) {
        match outcome {
            Outcome::Dismissed | Outcome::Abandoned(_) => {
                self.ledger.release_cooldown(&self.channel, showing);
            }
            _ => {
                self.ledger.arm_cooldown(&self.channel, self.timing.cooldown);
            }
        }
    }

    fn request(&self, prompt: &FrozenPrompt) -> DialogRequest {
        let buttons = prompt.buttons();
        DialogRequest {
            message: dialog_message(prompt, &self.parser),
            default_button: buttons.first().cloned().unwrap_or_default(),
            buttons,
        }
    }

    /// Write each step in order. The first failed write abandons the rest.
    async fn play(&self, steps: &[WriteStep]) -> Result<(), DispatchError> {
        for (i, step) in steps.iter().enumerate() {
            if let Err(source) = self.input.write(&step.bytes).await {
                return Err(DispatchError::Write { step: i, source });
            }
            debug!(step = i, bytes = ?step.bytes, "wrote to child");
            if let Some(delay) = step.delay_after {
                self.clock.sleep(delay).await;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
