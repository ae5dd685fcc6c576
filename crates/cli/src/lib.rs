// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod ansi;
pub mod clock;
pub mod config;
pub mod dialog;
pub mod dispatch;
pub mod error;
pub mod hook;
pub mod input;
pub mod ledger;
pub mod prompt;
pub mod pty;
pub mod run;
pub mod stream;
pub mod terminal;
pub mod test_support;
