// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::*;

#[yare::parameterized(
    first = { 1, "1" },
    deny = { 2, "2" },
    two_digits = { 10, "10" },
)]
fn choice_is_a_bare_digit(choice: u32, expected: &str) {
    let steps = choice_steps(choice);
    assert_eq!(steps, vec![WriteStep::new(expected.to_owned(), None)]);
}

#[test]
fn reject_types_choice_then_message_then_enter() {
    let steps =
        reject_steps(3, "nope", Duration::from_millis(500), Duration::from_millis(400));

    let bytes: Vec<&[u8]> = steps.iter().map(|s| s.bytes.as_ref()).collect();
    assert_eq!(bytes, vec![&b"3"[..], &b"nope"[..], &b"\r"[..]]);

    let delays: Vec<Option<Duration>> = steps.iter().map(|s| s.delay_after).collect();
    assert_eq!(
        delays,
        vec![Some(Duration::from_millis(500)), Some(Duration::from_millis(400)), None]
    );
}

#[test]
fn reject_message_is_never_newline_terminated() {
    let steps = reject_steps(2, "Rejected command:\nrm -rf /", Duration::ZERO, Duration::ZERO);
    assert!(!steps[1].bytes.ends_with(b"\r"));
    assert_eq!(steps.len(), 3);
}
