//! Pattern buffer holding the not-yet-consumed part of a device conversation.
//!
//! Incoming bytes are appended with ANSI escapes stripped. When a rule
//! matches, everything up to the end of the match is consumed; the remainder
//! carries over to the next scan so a cue split across two reads still
//! matches once the rest of it arrives.

use bytes::{Buf, BytesMut};

use super::patterns::{Match, TextMatcher};

/// Buffer for accumulating output and matching cues against it.
#[derive(Debug)]
pub struct PatternBuffer {
    /// Unconsumed output.
    buffer: BytesMut,

    /// How many bytes from the end `search_tail` looks at.
    search_depth: usize,
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified tail search depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            search_depth,
        }
    }

    /// Extend the buffer with new data, stripping ANSI escape codes.
    pub fn extend(&mut self, data: &[u8]) {
        let cleaned = strip_ansi_escapes::strip(data);
        self.buffer.extend_from_slice(&cleaned);
    }

    /// Match against the whole unconsumed buffer.
    pub fn find(&self, matcher: &dyn TextMatcher) -> Option<Match> {
        matcher.find_match(&self.buffer)
    }

    /// Match against the last `search_depth` bytes only.
    ///
    /// Used for prompt detection after long banners. Offsets in the returned
    /// match are relative to the full buffer.
    pub fn search_tail(&self, matcher: &dyn TextMatcher) -> Option<Match> {
        let start = self.buffer.len().saturating_sub(self.search_depth);
        matcher
            .find_match(&self.buffer[start..])
            .map(|m| m.shifted(start))
    }

    /// Drop everything up to `end`. `BytesMut::advance` is an O(1) pointer bump.
    pub fn consume(&mut self, end: usize) {
        let end = end.min(self.buffer.len());
        self.buffer.advance(end);
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}
