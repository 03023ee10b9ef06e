//! Stream-and-discard delivery.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use futures::Stream;
use pin_project::{pin_project, pinned_drop};
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::extraction::ExtractedMedia;
use crate::workspace::Workspace;

/// Size of each streamed chunk.
pub const STREAM_CHUNK_SIZE: usize = 8 * 1024;

/// Streams the produced file to the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamAndDiscard;

impl StreamAndDiscard {
    /// Open `media` for streaming and hand `workspace` to the stream.
    ///
    /// The workspace is released when the stream is drained or dropped. If the
    /// file cannot be opened the workspace is released before returning.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the produced file cannot be opened.
    pub async fn deliver(
        &self,
        media: &ExtractedMedia,
        mut workspace: Workspace,
    ) -> Result<MediaStreamResponse, io::Error> {
        let opened = match File::open(media.path()).await {
            Ok(file) => file.metadata().await.map(|meta| (file, meta.len())),
            Err(e) => Err(e),
        };

        let (file, len) = match opened {
            Ok(opened) => opened,
            Err(e) => {
                if let Err(cleanup) = workspace.release().await {
                    warn!(error = %cleanup, "Workspace cleanup failed");
                }
                return Err(e);
            }
        };

        let filename = if media.extension.is_empty() {
            "audio".to_string()
        } else {
            format!("audio.{}", media.extension)
        };

        Ok(MediaStreamResponse {
            stream: MediaStream::new(file, workspace),
            filename,
            content_type: media.mime_type.clone(),
            content_length: Some(len),
        })
    }
}

/// A ready-to-send streamed body with its response metadata.
#[derive(Debug)]
pub struct MediaStreamResponse {
    /// Body chunks.
    pub stream: MediaStream,
    /// Suggested download filename, e.g. `audio.mp3`.
    pub filename: String,
    /// MIME type of the body.
    pub content_type: String,
    /// Body length in bytes, when known.
    pub content_length: Option<u64>,
}

/// File chunks that own the request workspace.
///
/// Yields chunks of at most [`STREAM_CHUNK_SIZE`] bytes. Once the file is
/// exhausted (or a read fails) the file is closed and the workspace handed to
/// the blocking pool for removal; dropping the stream early does the same.
/// The stream cannot be restarted.
#[pin_project(PinnedDrop)]
#[derive(Debug)]
pub struct MediaStream {
    #[pin]
    reader: Option<ReaderStream<File>>,
    workspace: Option<Workspace>,
}

impl MediaStream {
    /// Stream `file`, releasing `workspace` when done.
    #[must_use]
    pub fn new(file: File, workspace: Workspace) -> Self {
        Self {
            reader: Some(ReaderStream::with_capacity(file, STREAM_CHUNK_SIZE)),
            workspace: Some(workspace),
        }
    }

    /// Whether the stream has finished and handed off its workspace.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.reader.is_none() && self.workspace.is_none()
    }
}

/// Close the file, then release the workspace off the async worker.
fn finish(mut reader: Pin<&mut Option<ReaderStream<File>>>, workspace: &mut Option<Workspace>) {
    reader.set(None);
    if let Some(workspace) = workspace.take() {
        debug!(workspace = %workspace.path().display(), "Stream finished");
        workspace.release_in_background();
    }
}

impl Stream for MediaStream {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        let Some(reader) = this.reader.as_mut().as_pin_mut() else {
            return Poll::Ready(None);
        };

        match ready!(reader.poll_next(cx)) {
            Some(Ok(chunk)) => Poll::Ready(Some(Ok(chunk))),
            Some(Err(e)) => {
                finish(this.reader, this.workspace);
                Poll::Ready(Some(Err(e)))
            }
            None => {
                finish(this.reader, this.workspace);
                Poll::Ready(None)
            }
        }
    }
}

#[pinned_drop]
impl PinnedDrop for MediaStream {
    fn drop(self: Pin<&mut Self>) {
        let this = self.project();
        finish(this.reader, this.workspace);
    }
}
