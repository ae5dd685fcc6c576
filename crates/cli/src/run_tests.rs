// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use tokio::time::Instant;

use super::*;
use crate::test_support::{CaptureWriter, FailingWriter};

fn typing() -> Typing {
    Typing {
        char_delay: Duration::from_millis(10),
        line_delay: Duration::from_millis(100),
        submit_delay: Duration::from_millis(500),
    }
}

fn offsets_ms(start: Instant, chunks: &[(Instant, bytes::Bytes)]) -> Vec<u128> {
    chunks.iter().map(|(at, _)| (*at - start).as_millis()).collect()
}

#[tokio::test(start_paused = true)]
async fn piped_lines_are_typed_per_character_then_submitted() -> anyhow::Result<()> {
    let sink = CaptureWriter::new();
    let input = InputWriter::new(sink.clone());
    let start = Instant::now();

    let typed = type_lines(&b"ab\nc\n"[..], &input, &SystemClock, typing()).await?;

    assert_eq!(typed, 2);
    let chunks = sink.timed_chunks();
    let bytes: Vec<&[u8]> = chunks.iter().map(|(_, b)| b.as_ref()).collect();
    assert_eq!(bytes, vec![&b"a"[..], b"b", b"\n", b"c", b"\n"]);
    assert_eq!(offsets_ms(start, &chunks), vec![0, 10, 120, 620, 730]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn multibyte_characters_are_typed_whole() -> anyhow::Result<()> {
    let sink = CaptureWriter::new();
    let input = InputWriter::new(sink.clone());

    type_lines(&"né\n".as_bytes()[..], &input, &SystemClock, typing()).await?;

    let chunks = sink.chunks();
    assert_eq!(chunks.len(), 3);
    assert_eq!(&chunks[1][..], "é".as_bytes());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn final_line_without_newline_is_still_submitted() -> anyhow::Result<()> {
    let sink = CaptureWriter::new();
    let input = InputWriter::new(sink.clone());

    let typed = type_lines(&b"hi"[..], &input, &SystemClock, typing()).await?;

    assert_eq!(typed, 1);
    assert_eq!(sink.text(), "hi\n");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn typing_stops_when_the_child_input_fails() {
    let sink = FailingWriter::after(1);
    let input = InputWriter::new(sink.clone());

    let result = type_lines(&b"abc\n"[..], &input, &SystemClock, typing()).await;

    crate::assert_err_contains!(result, "pty gone");
    assert_eq!(sink.captured().text(), "a");
    assert_eq!(sink.attempts(), 2);
}

#[test]
fn tracing_is_off_without_a_log_file() -> anyhow::Result<()> {
    let config = Config::test();
    assert_eq!(config.log_path(), None);
    init_tracing(&config)?;
    Ok(())
}

#[test]
fn tracing_opens_the_log_file_for_append() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("dcode.log");
    std::fs::write(&path, "earlier run\n")?;

    let mut config = Config::test();
    config.log_file = Some(path.clone());
    init_tracing(&config)?;

    let contents = std::fs::read_to_string(&path)?;
    assert!(contents.starts_with("earlier run\n"));
    Ok(())
}

#[test]
fn unwritable_log_file_is_an_error() {
    let mut config = Config::test();
    config.log_file = Some("/nonexistent-dir/dcode.log".into());
    crate::assert_err_contains!(init_tracing(&config), "cannot open log file");
}

#[test]
fn tracing_tolerates_an_installed_subscriber() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut config = Config::test();
    config.log_file = Some(dir.path().join("dcode.log"));
    init_tracing(&config)?;

    config.log_format = "json".to_owned();
    config.log_file = Some(dir.path().join("second.log"));
    init_tracing(&config)?;
    assert!(dir.path().join("second.log").exists());
    Ok(())
}
