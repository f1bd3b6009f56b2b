//! Text matchers used to recognise device cues.
//!
//! Every cue a dialogue reacts to goes through [`TextMatcher`]. Regexes are
//! the default implementation; [`Literal`] covers fixed strings without a
//! regex engine.

use memchr::memmem;
use regex::bytes::Regex;

/// A successful match: byte range plus any named captures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Offset where the match starts.
    pub start: usize,

    /// Offset where the match ends; the buffer is consumed up to here.
    pub end: usize,

    /// Named capture groups that participated in the match.
    pub captures: Vec<(String, String)>,
}

impl Match {
    /// Shift offsets by `offset` (for matches made against a sub-slice).
    pub fn shifted(mut self, offset: usize) -> Self {
        self.start += offset;
        self.end += offset;
        self
    }

    /// Look up a named capture.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.captures
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Trait for cue matching - regex by default, extensible for custom parsers.
pub trait TextMatcher: Send + Sync {
    /// Find the first match in `data`.
    fn find_match(&self, data: &[u8]) -> Option<Match>;

    /// Check if the data matches.
    fn is_match(&self, data: &[u8]) -> bool {
        self.find_match(data).is_some()
    }
}

impl TextMatcher for Regex {
    fn find_match(&self, data: &[u8]) -> Option<Match> {
        let caps = self.captures(data)?;
        let whole = caps.get(0)?;

        let captures = self
            .capture_names()
            .flatten()
            .filter_map(|name| {
                caps.name(name).map(|m| {
                    (
                        name.to_string(),
                        String::from_utf8_lossy(m.as_bytes()).trim().to_string(),
                    )
                })
            })
            .collect();

        Some(Match {
            start: whole.start(),
            end: whole.end(),
            captures,
        })
    }
}

/// Fixed-string matcher backed by `memchr::memmem`.
#[derive(Debug, Clone)]
pub struct Literal {
    needle: Vec<u8>,
}

impl Literal {
    /// Create a literal matcher.
    pub fn new(needle: impl AsRef<[u8]>) -> Self {
        Self {
            needle: needle.as_ref().to_vec(),
        }
    }
}

impl TextMatcher for Literal {
    fn find_match(&self, data: &[u8]) -> Option<Match> {
        memmem::find(data, &self.needle).map(|start| Match {
            start,
            end: start + self.needle.len(),
            captures: Vec::new(),
        })
    }
}

/// Build a matcher for one specific prompt string.
///
/// The prompt must sit at the start of a line with nothing but whitespace
/// after it, so a command echo such as `Switch#dir flash:` does not match.
pub fn exact_prompt(prompt: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"(?m)^{}[ \t]*\r?$", regex::escape(prompt)))
}
