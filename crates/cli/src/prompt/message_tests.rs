// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::{
    box_interior, countdown_message, dialog_message, reject_message, strip_borders,
    trigger_reason, DialogBoxInfo, REJECTED_AFTER_WAIT_NOTICE, REJECTED_NOTICE,
};
use crate::clock::MANUAL_EPOCH_NANOS;
use crate::prompt::choice::ChoiceParser;
use crate::prompt::FrozenPrompt;
use crate::test_support::{bash_box, owned};

/// Context as captured when the question line of [`bash_box`] arrives.
fn bash_context() -> Vec<String> {
    owned(&bash_box()[..8])
}

fn bash_prompt() -> FrozenPrompt {
    FrozenPrompt {
        trigger: "│ Do you want to proceed?                   │".into(),
        reason: trigger_reason("│ Do you want to proceed? │", &bash_context()),
        context: bash_context(),
        choices: [(1, "Yes".to_owned()), (2, "No".to_owned())].into_iter().collect(),
        opened_at_nanos: MANUAL_EPOCH_NANOS,
    }
}

const PROCEED: &str = "│ Do you want to proceed?                   │";

#[yare::parameterized(
    write_call      = { PROCEED, &["⏺ Write(notes.txt)"], "Write() function call" },
    bash_executed   = { PROCEED, &["⏺ Bash(rm test-file)"], "Bash command execution" },
    bash_unmarked   = { PROCEED, &["│ Bash(ls -la)  │"], "Bash() function call" },
    marker_bash     = { PROCEED, &["⏺ Running Bash in the sandbox"], "Bash() function call" },
    marker_write    = { PROCEED, &["⏺ Write to disk"], "Write operation permission" },
    requires        = {
        PROCEED, &["│ This action requires permission │"], "General permission requirement"
    },
    approval        = { PROCEED, &["│ This tool needs your approval │"], "Approval request" },
    permission_list = { PROCEED, &["Permissions: allow Bash"], "Permission list dialog" },
    update_proceed  = { PROCEED, &["⏺ Update(notes.txt)"], "Proceed confirmation" },
    edit_question   = {
        "│ Do you want to make this edit to notes.txt? │",
        &["⏺ Update(notes.txt)", "│ Edit file │"],
        "Unknown trigger"
    },
    proceed_in_context_only = {
        "│ Do you want to make this edit? │",
        &["│ Do you want to proceed? │"],
        "Unknown trigger"
    },
)]
fn classifies_trigger_reason(trigger: &str, context: &[&str], expected: &str) {
    assert_eq!(trigger_reason(trigger, &owned(context)), expected);
}

#[test]
fn bash_box_context_reads_as_command_execution() {
    assert_eq!(trigger_reason(PROCEED, &bash_context()), "Bash command execution");
}

#[yare::parameterized(
    padded     = { "│   rm test-file        │", Some("  rm test-file") },
    heading    = { "│ Bash command │", Some("Bash command") },
    blank      = { "│                  │", Some("") },
    open_right = { "  │ no right border", Some("no right border") },
    unbordered = { "⏺ Bash(rm test-file)", None },
    top        = { "╭────────╮", None },
)]
fn extracts_box_interior(line: &str, expected: Option<&str>) {
    assert_eq!(box_interior(line), expected);
}

#[test]
fn strip_borders_trims_both_sides() {
    assert_eq!(strip_borders("│ Do you want to proceed? │"), "Do you want to proceed?");
}

#[test]
fn dialog_box_info_from_bash_box() -> anyhow::Result<()> {
    let parser = ChoiceParser::new()?;
    let info = DialogBoxInfo::from_context(&bash_context(), &parser);
    assert_eq!(
        info,
        Some(DialogBoxInfo {
            command_type: "Bash command".into(),
            command_details: vec!["  rm test-file".into(), "  Remove test file".into()],
            question_line: "Do you want to proceed?".into(),
        })
    );
    Ok(())
}

#[test]
fn dialog_box_info_defaults_question() -> anyhow::Result<()> {
    let parser = ChoiceParser::new()?;
    let context = owned(&["╭──────╮", "│ Edit file │", "│   src/main.rs │"]);
    let info = DialogBoxInfo::from_context(&context, &parser);
    assert_eq!(info.map(|i| i.question_line), Some("Do you want to proceed?".to_owned()));
    Ok(())
}

#[test]
fn dialog_box_info_absent_without_borders() -> anyhow::Result<()> {
    let parser = ChoiceParser::new()?;
    let context = owned(&["Claude: Do you want me to explain this code?"]);
    assert_eq!(DialogBoxInfo::from_context(&context, &parser), None);
    Ok(())
}

#[test]
fn dialog_message_layout() -> anyhow::Result<()> {
    let parser = ChoiceParser::new()?;
    let message = dialog_message(&bash_prompt(), &parser);
    let expected = "Trigger text: ⏺ Bash(rm test-file)\n\
                    Trigger timestamp: 1672574400000000000\n\
                    Reason: Bash command execution\n\
                    ───────────────────────────────────\n\
                    Bash command\n\
                    \n  rm test-file\n  Remove test file\n\
                    \n\
                    Do you want to proceed?";
    assert_eq!(message, expected);
    assert!(!message.contains('│'));
    Ok(())
}

#[test]
fn dialog_message_falls_back_to_bordered_trigger_text() -> anyhow::Result<()> {
    let parser = ChoiceParser::new()?;
    let mut prompt = bash_prompt();
    prompt.context.remove(0);
    let message = dialog_message(&prompt, &parser);
    assert!(message.starts_with("Trigger text: Do you want to proceed?\n"));
    assert!(!message.contains('│'));
    Ok(())
}

#[test]
fn dialog_message_legacy_context_layout() -> anyhow::Result<()> {
    let parser = ChoiceParser::new()?;
    let prompt = FrozenPrompt {
        trigger: "Do you want to continue with the migration?".into(),
        reason: "Unknown trigger",
        context: owned(&[
            "Running database migration",
            "Do you want to continue with the migration?",
        ]),
        choices: [(1, "Yes".to_owned())].into_iter().collect(),
        opened_at_nanos: 7,
    };
    let message = dialog_message(&prompt, &parser);
    assert!(message.ends_with(
        "Context:\n• Running database migration\n\nDo you want to continue with the migration?"
    ));
    Ok(())
}

#[test]
fn countdown_message_leads_with_notice() -> anyhow::Result<()> {
    let parser = ChoiceParser::new()?;
    let message = countdown_message(&bash_prompt(), Duration::from_secs(30), &parser);
    assert!(message.starts_with("This will auto-reject in 30 seconds...\n\nTrigger text:"));
    Ok(())
}

#[test]
fn reject_message_quotes_command_lines() -> anyhow::Result<()> {
    let parser = ChoiceParser::new()?;
    let message = reject_message(&owned(&bash_box()), false, &parser);
    assert_eq!(
        message,
        format!("Rejected command:\nrm test-file\nRemove test file\n\n{REJECTED_NOTICE}")
    );
    for absent in ["│", "1. Yes", "2. No", "Do you want to", "Bash command", "⏺"] {
        assert!(!message.contains(absent), "unexpected {absent:?} in {message:?}");
    }
    Ok(())
}

#[test]
fn reject_message_after_wait_variant() -> anyhow::Result<()> {
    let parser = ChoiceParser::new()?;
    let message = reject_message(&bash_context(), true, &parser);
    assert!(message.ends_with(REJECTED_AFTER_WAIT_NOTICE));
    assert!(message.starts_with("Rejected command:\nrm test-file\n"));
    Ok(())
}

#[test]
fn reject_message_without_command_lines_is_bare() -> anyhow::Result<()> {
    let parser = ChoiceParser::new()?;
    let context = owned(&["╭────╮", "│ > quoted input │", "│ .hidden │", "│ ❯ 1. Yes │"]);
    assert_eq!(reject_message(&context, false, &parser), REJECTED_NOTICE);
    assert_eq!(reject_message(&[], true, &parser), REJECTED_AFTER_WAIT_NOTICE);
    Ok(())
}
