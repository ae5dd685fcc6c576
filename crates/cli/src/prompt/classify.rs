// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::ansi::AnsiStripper;

use super::choice::ChoiceParser;
use super::{BOX_BORDER, BOX_BOTTOM, COMMAND_MARKER, QUESTION};

/// Lines whose trimmed length is at or below this are noise.
const MIN_MEANINGFUL_CHARS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    PromptStart,
    Skip,
    ChoiceCandidate,
    Ordinary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub kind: LineKind,
    /// ANSI-stripped line without its trailing CR/LF.
    pub text: String,
}

/// Classifies one line of child output.
#[derive(Debug, Clone)]
pub struct Classifier {
    ansi: AnsiStripper,
    choices: ChoiceParser,
}

impl Classifier {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self { ansi: AnsiStripper::new()?, choices: ChoiceParser::new()? })
    }

    pub fn choices(&self) -> &ChoiceParser {
        &self.choices
    }

    /// Classify `raw`. While `collecting`, the box-closing line and numbered
    /// choice lines are always offered to the collector, however short.
    pub fn classify(&self, raw: &str, collecting: bool) -> Classified {
        let text = self.ansi.strip(raw).trim_end_matches(['\r', '\n']).to_owned();

        let kind = if collecting && (is_box_bottom(&text) || self.choices.parse(&text).is_some())
        {
            LineKind::ChoiceCandidate
        } else if is_skippable(&text) {
            LineKind::Skip
        } else if is_question(&text) {
            LineKind::PromptStart
        } else if collecting {
            LineKind::ChoiceCandidate
        } else {
            LineKind::Ordinary
        };

        Classified { kind, text }
    }
}

/// Diff markers, completed-step and checked-box glyphs, quoted context, and
/// lines too short to carry meaning.
pub fn is_skippable(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.starts_with('+')
        || trimmed.starts_with('-')
        || text.contains('⎿')
        || text.contains('☒')
        || text.contains("Context:")
        || trimmed.chars().count() <= MIN_MEANINGFUL_CHARS
}

/// A question line that is not an echo of an earlier one.
pub fn is_question(text: &str) -> bool {
    text.contains(QUESTION) && !is_echoed_question(text)
}

/// Question text that only repeats a past prompt: a line carrying the
/// executed-command marker, or typed into the input box (`│ > ...`).
pub fn is_echoed_question(text: &str) -> bool {
    if text.contains(COMMAND_MARKER) {
        return true;
    }
    let body = text.trim_start();
    let body = body.strip_prefix(BOX_BORDER).unwrap_or(body);
    body.trim_start().starts_with('>')
}

pub fn is_box_bottom(text: &str) -> bool {
    text.contains(BOX_BOTTOM)
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
