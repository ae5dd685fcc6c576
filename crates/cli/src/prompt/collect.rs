// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::ledger::{DedupLedger, Verdict};

use super::classify::{is_box_bottom, Classifier, LineKind};
use super::message::trigger_reason;
use super::{ChoiceSet, FrozenPrompt};

/// Default number of recent lines kept for dialog messages.
pub const DEFAULT_CONTEXT_LINES: usize = 20;

/// Context lines that make up a prompt's identity.
const IDENTITY_LINES: usize = 3;

/// Phrases of a rejection notice that quotes the original question.
const REJECTION_MARKERS: [&str; 2] = ["Rejected command", "automatically rejected"];

/// Collector state. Exactly one prompt is live at a time.
#[derive(Debug, Default)]
pub enum PromptState {
    #[default]
    Idle,
    Collecting(Box<FrozenPrompt>),
}

impl PromptState {
    pub fn is_collecting(&self) -> bool {
        matches!(self, Self::Collecting(_))
    }
}

/// Why a question line did not open a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppression {
    /// Same identity as the previous prompt, within the duplication window.
    Redraw,
    /// The question is quoted inside a rejection notice.
    Echo,
    Duplicate,
    CoolingDown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feed {
    Opened,
    Suppressed(Suppression),
    Choice(u32),
    Frozen(FrozenPrompt),
    /// The box closed without offering any choice.
    Empty,
}

/// Accumulates lines into prompts. Owned by the stream driver.
pub struct PromptCollector {
    classifier: Classifier,
    ledger: Arc<DedupLedger>,
    clock: Arc<dyn Clock>,
    channel: String,
    window: Duration,
    context: VecDeque<String>,
    context_limit: usize,
    last: Option<(String, Instant)>,
    state: PromptState,
}

impl PromptCollector {
    pub fn new(
        classifier: Classifier,
        ledger: Arc<DedupLedger>,
        clock: Arc<dyn Clock>,
        channel: impl Into<String>,
        window: Duration,
    ) -> Self {
        Self {
            classifier,
            ledger,
            clock,
            channel: channel.into(),
            window,
            context: VecDeque::with_capacity(DEFAULT_CONTEXT_LINES),
            context_limit: DEFAULT_CONTEXT_LINES,
            last: None,
            state: PromptState::Idle,
        }
    }

    pub fn with_context_limit(mut self, limit: usize) -> Self {
        self.context_limit = limit.max(IDENTITY_LINES);
        self
    }

    pub fn state(&self) -> &PromptState {
        &self.state
    }

    pub fn context(&self) -> impl Iterator<Item = &str> {
        self.context.iter().map(String::as_str)
    }

    /// Feed one line (without its trailing newline).
    pub fn feed(&mut self, raw: &str) -> Option<Feed> {
        let line = self.classifier.classify(raw, self.state.is_collecting());
        self.remember(&line.text);

        match line.kind {
            LineKind::Skip | LineKind::Ordinary => None,
            LineKind::PromptStart => {
                let feed = self.open(line.text);
                // Only a redraw continues the live prompt.
                if matches!(feed, Feed::Suppressed(s) if s != Suppression::Redraw) {
                    self.abandon();
                }
                Some(feed)
            }
            LineKind::ChoiceCandidate => self.collect(&line.text),
        }
    }

    fn remember(&mut self, text: &str) {
        if text.trim().is_empty() || text.starts_with("[DEBUG]") {
            return;
        }
        if self.context.len() == self.context_limit {
            self.context.pop_front();
        }
        self.context.push_back(text.to_owned());
    }

    fn abandon(&mut self) {
        if let PromptState::Collecting(prompt) = std::mem::take(&mut self.state) {
            debug!(trigger = %prompt.trigger, "unfinished prompt dropped");
        }
    }

    fn open(&mut self, trigger: String) -> Feed {
        // The trigger is already the newest context line.
        let echoed = self
            .context
            .iter()
            .rev()
            .skip(1)
            .take(IDENTITY_LINES)
            .any(|l| REJECTION_MARKERS.iter().any(|m| l.contains(m)));
        if echoed {
            debug!(trigger = %trigger, "question echoed in rejection notice");
            return Feed::Suppressed(Suppression::Echo);
        }

        let identity = self.identity(&trigger);
        let now = self.clock.now();
        if let Some((last, at)) = &self.last {
            if *last == identity && now.saturating_duration_since(*at) < self.window {
                debug!(trigger = %trigger, "prompt redraw ignored");
                return Feed::Suppressed(Suppression::Redraw);
            }
        }

        match self.ledger.try_claim(&identity, &self.channel) {
            Verdict::Accepted => {}
            Verdict::Duplicate => {
                debug!(trigger = %trigger, "prompt already handled");
                return Feed::Suppressed(Suppression::Duplicate);
            }
            Verdict::CoolingDown => {
                debug!(trigger = %trigger, channel = %self.channel, "prompt during cooldown");
                return Feed::Suppressed(Suppression::CoolingDown);
            }
        }

        let context: Vec<String> = self.context.iter().cloned().collect();
        let reason = trigger_reason(&trigger, &context);
        info!(trigger = %trigger, reason, "permission prompt opened");

        self.last = Some((identity, now));
        self.state = PromptState::Collecting(Box::new(FrozenPrompt {
            trigger,
            reason,
            context,
            choices: ChoiceSet::new(),
            opened_at_nanos: self.clock.unix_nanos(),
        }));
        Feed::Opened
    }

    fn collect(&mut self, text: &str) -> Option<Feed> {
        let PromptState::Collecting(prompt) = &mut self.state else {
            return None;
        };

        let mut feed = None;
        if let Some((index, label)) = self.classifier.choices().parse(text) {
            prompt.choices.insert(index, label);
            feed = Some(Feed::Choice(index));
        }

        if is_box_bottom(text) {
            let PromptState::Collecting(prompt) = std::mem::take(&mut self.state) else {
                return feed;
            };
            if prompt.choices.is_empty() {
                debug!(trigger = %prompt.trigger, "box closed without choices");
                return Some(Feed::Empty);
            }
            info!(choices = prompt.choices.len(), "permission prompt collected");
            return Some(Feed::Frozen(*prompt));
        }
        feed
    }

    /// The few context lines before the trigger, then the trigger.
    fn identity(&self, trigger: &str) -> String {
        // The trigger was remembered before the prompt opened.
        let own = usize::from(self.context.back().is_some_and(|l| l == trigger));
        let mut lines: Vec<&str> = self
            .context
            .iter()
            .rev()
            .skip(own)
            .take(IDENTITY_LINES)
            .map(String::as_str)
            .collect();
        lines.reverse();
        lines.push(trigger);
        lines.join("|")
    }
}

#[cfg(test)]
#[path = "collect_tests.rs"]
mod tests;
