// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Escape-sequence handling: stripping for line classification, and the
//! streaming filter applied to output forwarded to the user's terminal.

use std::borrow::Cow;

use regex::Regex;

const ESC: u8 = 0x1b;

/// Longest unterminated escape sequence held back between reads.
const MAX_HELD: usize = 64;

/// Removes terminal control sequences from a decoded line.
#[derive(Debug, Clone)]
pub struct AnsiStripper {
    pattern: Regex,
}

impl AnsiStripper {
    pub fn new() -> anyhow::Result<Self> {
        // CSI (any final byte), OSC terminated by BEL or ST, and two-byte escapes.
        let pattern = Regex::new(concat!(
            r"\x1b\[[0-?]*[ -/]*[@-~]",
            r"|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)",
            r"|\x1b[()][0-9A-Za-z]",
            r"|\x1b[=>78]",
        ))?;
        Ok(Self { pattern })
    }

    pub fn strip<'a>(&self, line: &'a str) -> Cow<'a, str> {
        if !line.contains('\x1b') {
            return Cow::Borrowed(line);
        }
        self.pattern.replace_all(line, "")
    }
}

/// Streaming filter for bytes forwarded to the display.
///
/// Always drops the scrollback-clear sequence (`ESC[3J`); with
/// `strip_colors` also drops SGR sequences. A CSI sequence split across two
/// chunks is held until its final byte arrives.
#[derive(Debug, Default)]
pub struct DisplayFilter {
    strip_colors: bool,
    pending: Vec<u8>,
}

enum Csi {
    Complete(usize),
    Incomplete,
    NotCsi,
}

impl DisplayFilter {
    pub fn new(strip_colors: bool) -> Self {
        Self { strip_colors, pending: Vec::new() }
    }

    pub fn filter(&mut self, chunk: &[u8]) -> Vec<u8> {
        let mut data = std::mem::take(&mut self.pending);
        data.extend_from_slice(chunk);

        let mut out = Vec::with_capacity(data.len());
        let mut i = 0;
        while i < data.len() {
            if data[i] != ESC {
                out.push(data[i]);
                i += 1;
                continue;
            }
            match scan_csi(&data[i..]) {
                Csi::Complete(len) => {
                    let seq = &data[i..i + len];
                    if !self.drops(seq) {
                        out.extend_from_slice(seq);
                    }
                    i += len;
                }
                Csi::Incomplete if data.len() - i <= MAX_HELD => {
                    self.pending = data[i..].to_vec();
                    return out;
                }
                Csi::Incomplete | Csi::NotCsi => {
                    out.push(ESC);
                    i += 1;
                }
            }
        }
        out
    }

    /// Release any held partial sequence (end of stream).
    pub fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.pending)
    }

    fn drops(&self, seq: &[u8]) -> bool {
        seq == b"\x1b[3J" || (self.strip_colors && seq.last() == Some(&b'm'))
    }
}

fn scan_csi(buf: &[u8]) -> Csi {
    match buf.get(1) {
        None => return Csi::Incomplete,
        Some(b'[') => {}
        Some(_) => return Csi::NotCsi,
    }
    for (j, &b) in buf.iter().enumerate().skip(2) {
        match b {
            0x40..=0x7e => return Csi::Complete(j + 1),
            0x20..=0x3f => {}
            _ => return Csi::NotCsi,
        }
    }
    Csi::Incomplete
}

#[cfg(test)]
#[path = "ansi_tests.rs"]
mod tests;
