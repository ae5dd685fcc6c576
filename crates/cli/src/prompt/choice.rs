// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use regex::Regex;

use super::ChoiceSet;

/// Substrings that mark a choice as affirmative.
const AFFIRMATIVE: [&str; 3] = ["Allow", "Yes", "Approve"];

const ADD_RULE: &str = "Add a new rule";

/// Glyphs trimmed from the end of a choice label, on top of whitespace.
const TRAILING_DECORATION: &[char] = &[
    '│', '\u{200b}', '◯', '○', '◉', '●', '>', '?', '─', '━', '┌', '┐', '└', '┘', '├', '┤',
    '┬', '┴', '┼', '╭', '╮', '╯', '╰', '╠', '╣', '╦', '╩', '╬', '⧉',
];

/// Parses numbered choice lines such as `│ ❯ 1. Yes   │`.
#[derive(Debug, Clone)]
pub struct ChoiceParser {
    line: Regex,
}

impl ChoiceParser {
    pub fn new() -> anyhow::Result<Self> {
        let line = Regex::new(r"^[│\s]*[❯›\s]*([0-9]{1,2})\.\s+(.+)$")?;
        Ok(Self { line })
    }

    /// Extract `(index, label)` from an ANSI-stripped line.
    pub fn parse(&self, text: &str) -> Option<(u32, String)> {
        let caps = self.line.captures(text)?;
        let index: u32 = caps.get(1)?.as_str().parse().ok()?;
        let label = clean_label(caps.get(2)?.as_str());
        if label.is_empty() {
            return None;
        }
        Some((index, label))
    }
}

fn clean_label(raw: &str) -> String {
    raw.trim_matches(|c: char| c == '│' || c.is_whitespace())
        .trim_end_matches(|c: char| c.is_whitespace() || TRAILING_DECORATION.contains(&c))
        .trim()
        .to_owned()
}

/// Pick the choice to send when approving.
///
/// Affirmative label first, then an "Add a new rule" option, then the lowest
/// index in `1..=10`, then `1`.
pub fn select_best(choices: &ChoiceSet) -> u32 {
    if let Some((&index, _)) =
        choices.iter().find(|(_, label)| AFFIRMATIVE.iter().any(|a| label.contains(a)))
    {
        return index;
    }
    if let Some((&index, _)) = choices.iter().find(|(_, label)| label.contains(ADD_RULE)) {
        return index;
    }
    (1..=10).find(|i| choices.contains_key(i)).unwrap_or(1)
}

/// Pick the choice to send when rejecting: `3` if offered, otherwise `2`.
pub fn select_most_restrictive(choices: &ChoiceSet) -> u32 {
    if choices.contains_key(&3) {
        3
    } else {
        2
    }
}

#[cfg(test)]
#[path = "choice_tests.rs"]
mod tests;
