// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io;
use std::sync::Arc;

use super::*;
use crate::test_support::{CaptureWriter, FailingWriter};

#[tokio::test]
async fn writes_reach_the_sink_in_order() -> anyhow::Result<()> {
    let capture = CaptureWriter::new();
    let input = InputWriter::new(capture.clone());

    input.write(b"2").await?;
    input.write(b"\r").await?;

    assert_eq!(capture.text(), "2\r");
    assert_eq!(capture.chunks().len(), 2);
    Ok(())
}

#[tokio::test]
async fn closed_writer_rejects_writes() {
    let capture = CaptureWriter::new();
    let input = InputWriter::new(capture.clone());

    input.close().await;
    assert!(input.is_closed().await);

    let err = input.write(b"1").await.err();
    assert_eq!(err.map(|e| e.kind()), Some(io::ErrorKind::BrokenPipe));
    assert!(capture.chunks().is_empty());
}

#[tokio::test]
async fn sink_errors_propagate() {
    let input = InputWriter::new(FailingWriter::after(0));
    let err = input.write(b"1").await.err();
    assert_eq!(err.map(|e| e.kind()), Some(io::ErrorKind::BrokenPipe));
}

#[tokio::test]
async fn concurrent_writers_never_interleave_a_chunk() -> anyhow::Result<()> {
    let capture = CaptureWriter::new();
    let input = Arc::new(InputWriter::new(capture.clone()));

    let mut tasks = Vec::new();
    for i in 0..8u8 {
        let input = Arc::clone(&input);
        tasks.push(tokio::spawn(async move {
            let chunk = vec![b'a' + i; 64];
            input.write(&chunk).await
        }));
    }
    for task in tasks {
        task.await??;
    }

    let text = capture.text();
    assert_eq!(text.len(), 8 * 64);
    for block in text.as_bytes().chunks(64) {
        assert!(block.iter().all(|b| *b == block[0]), "interleaved block: {block:?}");
    }
    Ok(())
}
