// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The child's input stream, shared by stdin forwarding and every
//! dispatch task.

use std::io;
use std::pin::Pin;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

type Sink = Pin<Box<dyn AsyncWrite + Send>>;

/// Serializes writes into the child so concurrent writers never interleave
/// within one chunk.
pub struct InputWriter {
    sink: Mutex<Option<Sink>>,
}

impl InputWriter {
    pub fn new(sink: impl AsyncWrite + Send + 'static) -> Self {
        Self { sink: Mutex::new(Some(Box::pin(sink))) }
    }

    /// Write `data` and flush it.
    pub async fn write(&self, data: &[u8]) -> io::Result<()> {
        let mut guard = self.sink.lock().await;
        let Some(sink) = guard.as_mut() else {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "child input closed"));
        };
        sink.write_all(data).await?;
        sink.flush().await
    }

    /// Stop accepting writes. Later writes fail with `BrokenPipe`.
    pub async fn close(&self) {
        if let Some(mut sink) = self.sink.lock().await.take() {
            let _ = sink.shutdown().await;
        }
    }

    pub async fn is_closed(&self) -> bool {
        self.sink.lock().await.is_none()
    }
}

#[cfg(test)]
#[path = "input_tests.rs"]
mod tests;
