// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use proptest::prelude::*;

use super::{select_best, select_most_restrictive, ChoiceParser};
use crate::prompt::ChoiceSet;

fn set(entries: &[(u32, &str)]) -> ChoiceSet {
    entries.iter().map(|(k, v)| (*k, v.to_string())).collect()
}

#[yare::parameterized(
    cursor_in_box   = { "│ ❯ 1. Yes                                   │", 1, "Yes" },
    indented        = { "│   2. Yes, and don't ask again for X       │", 2, "Yes, and don't ask again for X" },
    no_border       = { "  3. No, and tell Claude...", 3, "No, and tell Claude..." },
    nbsp_padding    = { "│\u{a0}❯\u{a0}1.\u{a0}Yes\u{a0}\u{a0}│", 1, "Yes" },
    radio_glyph     = { "│ 2. Allow once ◯ │", 2, "Allow once" },
    trailing_hint   = { "❯ 1. Yes, allow all edits during this session (shift+tab)", 1,
                        "Yes, allow all edits during this session (shift+tab)" },
)]
fn parses_choice_lines(line: &str, index: u32, label: &str) -> anyhow::Result<()> {
    let parser = ChoiceParser::new()?;
    assert_eq!(parser.parse(line), Some((index, label.to_owned())));
    Ok(())
}

#[yare::parameterized(
    prose          = { "│ Remove 3 files from the build │" },
    version        = { "│ bumped to 1.2.3 │" },
    empty_label    = { "│ 1.    │" },
    question       = { "│ Do you want to proceed? │" },
    mid_line_digit = { "│ step 2. then more │" },
)]
fn ignores_non_choice_lines(line: &str) -> anyhow::Result<()> {
    let parser = ChoiceParser::new()?;
    assert_eq!(parser.parse(line), None);
    Ok(())
}

#[yare::parameterized(
    allow_first      = { &[(1, "Allow"), (2, "Deny")], 1 },
    no_affirmative   = { &[(1, "Deny"), (2, "Cancel")], 1 },
    empty            = { &[], 1 },
    yes_later        = { &[(1, "Cancel"), (2, "Yes, proceed")], 2 },
    approve          = { &[(2, "Skip"), (4, "Approve")], 4 },
    add_rule         = { &[(1, "Keep"), (2, "Add a new rule"), (3, "Cancel")], 2 },
    affirmative_wins = { &[(1, "Add a new rule"), (2, "Yes")], 2 },
    case_sensitive   = { &[(1, "no"), (2, "yes")], 1 },
    lowest_present   = { &[(3, "Maybe"), (5, "Later")], 3 },
    out_of_scan      = { &[(11, "Eleven")], 1 },
)]
fn best_choice(entries: &[(u32, &str)], expected: u32) {
    assert_eq!(select_best(&set(entries)), expected);
}

#[yare::parameterized(
    three   = { &[(1, "Yes"), (2, "Yes, always"), (3, "No")], 3 },
    two     = { &[(1, "Yes"), (2, "No")], 2 },
    one     = { &[(1, "Yes")], 2 },
    empty   = { &[], 2 },
)]
fn most_restrictive_choice(entries: &[(u32, &str)], expected: u32) {
    assert_eq!(select_most_restrictive(&set(entries)), expected);
}

proptest! {
    #[test]
    fn best_choice_ignores_insertion_order(
        mut entries in proptest::collection::vec(
            (1u32..12, "(Yes|No|Allow|Deny|Add a new rule|x{1,5})"),
            0..8,
        )
    ) {
        let forward: ChoiceSet = entries.iter().cloned().collect();
        entries.reverse();
        let reversed: ChoiceSet = entries.into_iter().collect();
        // Same key set; last-write-wins may differ, so compare on matching maps only.
        if forward == reversed {
            prop_assert_eq!(select_best(&forward), select_best(&reversed));
        }
        let best = select_best(&forward);
        prop_assert!(best == 1 || forward.contains_key(&best));
    }
}
