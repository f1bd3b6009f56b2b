//! Channel layer: the duplex byte stream to a device and cue matching.
//!
//! A [`Channel`] is whatever carries the device's command line: normally the
//! stdin/stdout of a spawned login helper ([`ProcessChannel`]). The dialogue
//! engine only needs three things from it: send text, read the next chunk
//! before a deadline, and close.

mod buffer;
#[cfg(test)]
pub(crate) mod mock;
mod patterns;
mod process;

pub use buffer::PatternBuffer;
pub use patterns::{Literal, Match, TextMatcher, exact_prompt};
pub use process::ProcessChannel;

use std::future::Future;

use tokio::time::Instant;

use crate::error::Result;

/// Outcome of a single timed read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    /// Bytes arrived.
    Data(Vec<u8>),

    /// The peer closed the stream.
    Eof,

    /// The deadline passed with nothing to read.
    Timeout,
}

/// A duplex, line-oriented connection to a device command line.
pub trait Channel: Send {
    /// Send raw text (no line terminator is added).
    fn send(&mut self, text: &str) -> impl Future<Output = Result<()>> + Send;

    /// Send text followed by a carriage return.
    fn send_line(&mut self, text: &str) -> impl Future<Output = Result<()>> + Send {
        async move {
            let line = format!("{}\r", text);
            self.send(&line).await
        }
    }

    /// Wait for the next chunk of output, giving up at `deadline`.
    fn read_chunk(&mut self, deadline: Instant) -> impl Future<Output = Result<ReadEvent>> + Send;

    /// Close the channel.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}
