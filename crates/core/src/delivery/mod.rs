//! Delivery strategies: how a produced file reaches the caller.
//!
//! - [`StoreAndLink`] uploads to object storage and returns a signed link.
//! - [`StreamAndDiscard`] streams the file and removes the workspace once
//!   the stream ends or is dropped.

mod link;
mod stream;

pub use link::StoreAndLink;
pub use stream::{MediaStream, MediaStreamResponse, STREAM_CHUNK_SIZE, StreamAndDiscard};

/// The strategy selected at startup.
#[derive(Clone)]
pub enum Delivery {
    /// Upload and return a signed link.
    Link(StoreAndLink),
    /// Stream bytes in the response body.
    Stream(StreamAndDiscard),
}

impl Delivery {
    /// Name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Link(_) => "link",
            Self::Stream(_) => "stream",
        }
    }
}
