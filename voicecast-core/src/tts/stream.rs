//! Lazy audio chunk sequence returned by streaming synthesis

use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::error::{Result, VoiceError};

type ChunkStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Active,
    Ended,
    Spent,
}

/// Ordered audio chunks as the service emits them. The sequence can be
/// consumed once; polling after it has ended yields a single
/// `InvalidInput` error and then nothing.
pub struct AudioStream {
    inner: ChunkStream,
    state: State,
}

impl AudioStream {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
            state: State::Active,
        }
    }

    pub fn from_chunks(chunks: Vec<Bytes>) -> Self {
        Self::new(futures_util::stream::iter(chunks.into_iter().map(Ok)))
    }

    /// Drain the stream into one buffer, preserving chunk order
    pub async fn collect_bytes(mut self) -> Result<Bytes> {
        let mut buffer = BytesMut::new();
        while let Some(chunk) = self.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        Ok(buffer.freeze())
    }

    /// Write chunks to `path` as they arrive and return the assembled audio.
    /// Parent directories are created as needed. A partial file is removed
    /// if the stream fails midway.
    pub async fn save_to(mut self, path: &Path) -> Result<Bytes> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(path).await?;
        let mut buffer = BytesMut::new();
        let written: Result<()> = async {
            while let Some(chunk) = self.next().await {
                let chunk = chunk?;
                file.write_all(&chunk).await?;
                buffer.extend_from_slice(&chunk);
            }
            file.flush().await?;
            Ok::<(), VoiceError>(())
        }
        .await;

        if let Err(e) = written {
            drop(file);
            if let Err(remove_err) = tokio::fs::remove_file(path).await {
                warn!("Failed to remove partial audio {}: {remove_err}", path.display());
            }
            return Err(e);
        }

        info!(path = %path.display(), bytes = buffer.len(), "Streamed audio saved");
        Ok(buffer.freeze())
    }
}

impl Stream for AudioStream {
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.state {
            State::Spent => Poll::Ready(None),
            State::Ended => {
                this.state = State::Spent;
                Poll::Ready(Some(Err(VoiceError::InvalidInput(
                    "audio stream already consumed".to_string(),
                ))))
            }
            State::Active => match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(None) => {
                    this.state = State::Ended;
                    Poll::Ready(None)
                }
                other => other,
            },
        }
    }
}
