// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Permission prompt recognition: line classification, box collection,
//! choice selection, and the human-readable renderings of a prompt.

pub mod choice;
pub mod classify;
pub mod collect;
pub mod message;

use std::collections::BTreeMap;

/// Choice index to label (without the `N. ` prefix).
pub type ChoiceSet = BTreeMap<u32, String>;

/// Question phrase that opens a permission prompt.
pub const QUESTION: &str = "Do you want to";

/// Marker glyph Claude prints in front of an executed tool call.
pub const COMMAND_MARKER: char = '⏺';

pub const BOX_TOP: char = '╭';
pub const BOX_BOTTOM: char = '╰';
pub const BOX_BORDER: char = '│';

/// A fully collected prompt, handed off to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrozenPrompt {
    /// ANSI-stripped line that opened the prompt.
    pub trigger: String,
    pub reason: &'static str,
    /// Lines seen up to and including the trigger, oldest first.
    pub context: Vec<String>,
    pub choices: ChoiceSet,
    /// Wall-clock nanoseconds at which the prompt opened.
    pub opened_at_nanos: u128,
}

impl FrozenPrompt {
    /// Button labels in ascending choice order.
    pub fn buttons(&self) -> Vec<String> {
        self.choices.values().cloned().collect()
    }

    /// Map a 1-based button position back to its choice index.
    pub fn choice_for_button(&self, button: usize) -> Option<u32> {
        button.checked_sub(1).and_then(|i| self.choices.keys().nth(i).copied())
    }
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;
