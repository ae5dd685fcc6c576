// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Text rendered from a prompt: the dialog message, the countdown variant,
//! and the explanation typed back after an automatic rejection.

use std::time::Duration;

use super::choice::ChoiceParser;
use super::{FrozenPrompt, BOX_BORDER, BOX_TOP, COMMAND_MARKER, QUESTION};

const RULE: &str = "───────────────────────────────────";

const DEFAULT_QUESTION: &str = "Do you want to proceed?";

pub const REJECTED_NOTICE: &str = "The command was automatically rejected. If using Task tools, \
     please restart them. Otherwise, try a different command.";

pub const REJECTED_AFTER_WAIT_NOTICE: &str = "The command was automatically rejected after wait \
     period. If using Task tools, please restart them. Otherwise, try a different command.";

/// Classify why a prompt appeared. Tool patterns may appear anywhere in the
/// trigger or its context; the proceed question only counts on the trigger.
pub fn trigger_reason(trigger: &str, context: &[String]) -> &'static str {
    let mut full = trigger.to_owned();
    for line in context {
        full.push(' ');
        full.push_str(line);
    }
    let seen = |needle: &str| full.contains(needle);
    let marked = full.contains(COMMAND_MARKER);

    if seen("Write(") {
        "Write() function call"
    } else if seen("Bash(") || (marked && seen("Bash")) {
        let executed =
            context.iter().any(|l| l.contains(COMMAND_MARKER) && l.contains("Bash("));
        if executed {
            "Bash command execution"
        } else {
            "Bash() function call"
        }
    } else if marked && seen("Write") {
        "Write operation permission"
    } else if seen("requires permission") {
        "General permission requirement"
    } else if seen("needs your approval") {
        "Approval request"
    } else if seen("Permissions:") {
        "Permission list dialog"
    } else if trigger.contains("Do you want to proceed") {
        "Proceed confirmation"
    } else {
        "Unknown trigger"
    }
}

/// Contents of the dialog box recovered from context lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogBoxInfo {
    pub command_type: String,
    pub command_details: Vec<String>,
    pub question_line: String,
}

impl DialogBoxInfo {
    /// Scan `context` from the most recent box top. Returns `None` when no
    /// bordered line is found.
    pub fn from_context(context: &[String], choices: &ChoiceParser) -> Option<Self> {
        let start = context.iter().rposition(|l| l.contains(BOX_TOP)).map_or(0, |i| i + 1);
        let interior: Vec<&str> =
            context[start..].iter().filter_map(|l| box_interior(l)).collect();
        if interior.is_empty() {
            return None;
        }

        let mut question_line = None;
        let mut command_type = String::new();
        let mut command_details = Vec::new();
        for line in interior {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.contains(QUESTION) {
                question_line = Some(trimmed.to_owned());
                continue;
            }
            if choices.parse(line).is_some() {
                continue;
            }
            if command_type.is_empty() {
                command_type = trimmed.to_owned();
            } else {
                command_details.push(line.trim_end().to_owned());
            }
        }

        Some(Self {
            command_type,
            command_details,
            question_line: question_line.unwrap_or_else(|| DEFAULT_QUESTION.to_owned()),
        })
    }
}

/// Text between a leading `│` and the optional trailing `│`, with the single
/// padding space after the left border removed. `None` for unbordered lines.
pub fn box_interior(line: &str) -> Option<&str> {
    let body = line.trim_start().strip_prefix(BOX_BORDER)?;
    let body = body.trim_end();
    let body = body.strip_suffix(BOX_BORDER).unwrap_or(body);
    let body = body.strip_prefix([' ', '\u{a0}']).unwrap_or(body);
    Some(body.trim_end())
}

/// Trim borders and whitespace from both ends.
pub fn strip_borders(line: &str) -> &str {
    line.trim_matches(|c: char| c == BOX_BORDER || c.is_whitespace())
}

/// Full dialog message for interactive mode.
pub fn dialog_message(prompt: &FrozenPrompt, choices: &ChoiceParser) -> String {
    let trigger_text = prompt
        .context
        .iter()
        .rev()
        .find(|l| l.contains(COMMAND_MARKER))
        .map(|l| strip_borders(l))
        .unwrap_or_else(|| strip_borders(&prompt.trigger));

    let mut out = format!(
        "Trigger text: {trigger_text}\nTrigger timestamp: {}\nReason: {}\n{RULE}\n",
        prompt.opened_at_nanos, prompt.reason
    );

    match DialogBoxInfo::from_context(&prompt.context, choices) {
        Some(info) => {
            if !info.command_type.is_empty() {
                out.push_str(&info.command_type);
                out.push_str("\n\n");
            }
            if !info.command_details.is_empty() {
                out.push_str(&info.command_details.join("\n"));
                out.push_str("\n\n");
            }
            out.push_str(&info.question_line);
        }
        None => {
            out.push_str("Context:\n");
            for line in &prompt.context {
                let line = strip_borders(line);
                if !line.is_empty() && !line.contains(QUESTION) {
                    out.push_str("• ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
            out.push('\n');
            out.push_str(strip_borders(&prompt.trigger));
        }
    }
    out
}

/// Dialog message for wait mode, led by the countdown notice.
pub fn countdown_message(
    prompt: &FrozenPrompt,
    wait: Duration,
    choices: &ChoiceParser,
) -> String {
    format!(
        "This will auto-reject in {} seconds...\n\n{}",
        wait.as_secs(),
        dialog_message(prompt, choices)
    )
}

/// Explanation typed after an automatic rejection, quoting the command
/// lines found in `context` when there are any.
pub fn reject_message(context: &[String], after_wait: bool, choices: &ChoiceParser) -> String {
    let notice = if after_wait { REJECTED_AFTER_WAIT_NOTICE } else { REJECTED_NOTICE };

    let start = context.iter().rposition(|l| l.contains(BOX_TOP)).map_or(0, |i| i + 1);
    let lines: Vec<&str> = context[start..]
        .iter()
        .filter_map(|l| box_interior(l))
        .map(str::trim)
        .filter(|l| is_command_line(l, choices))
        .collect();

    if lines.is_empty() {
        notice.to_owned()
    } else {
        format!("Rejected command:\n{}\n\n{notice}", lines.join("\n"))
    }
}

fn is_command_line(line: &str, choices: &ChoiceParser) -> bool {
    !line.is_empty()
        && !line.contains(QUESTION)
        && !line.starts_with('❯')
        && !line.starts_with('>')
        && !line.starts_with('.')
        && !is_command_label(line)
        && !line.chars().all(|c| ('\u{2500}'..='\u{257f}').contains(&c) || c.is_whitespace())
        && choices.parse(line).is_none()
}

/// Box headings such as "Bash command".
fn is_command_label(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.starts_with("command") || lower.ends_with("command")
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
