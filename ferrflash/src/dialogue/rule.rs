//! Dialogue rules: an ordered (pattern, action) pair.

use std::fmt;
use std::sync::Arc;

use crate::channel::TextMatcher;

/// Text sent back to the device when a rule matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Sent as-is. Single-keystroke answers such as `y` at `[confirm]`.
    Raw(String),

    /// Sent followed by a carriage return.
    Line(String),
}

/// What happens when a rule matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Consume the match, optionally reply, and keep scanning.
    Continue {
        reply: Option<Reply>,
        /// Push the deadline out by the full budget.
        resets_clock: bool,
    },

    /// Stop successfully.
    Resolve,

    /// Stop with a failure. `None` uses the matched text as the reason.
    Fail(Option<String>),
}

/// An ordered (pattern, action) pair evaluated against session text.
///
/// Named captures in the pattern are stored into the dialogue's fields
/// (later matches overwrite earlier ones), or appended as one record per
/// match when the rule is built with [`Rule::record`].
///
/// # Example
///
/// ```rust
/// use ferrflash::dialogue::Rule;
/// use regex::bytes::Regex;
///
/// let confirm = Rule::new("confirm", Regex::new(r"\[confirm\]").unwrap()).reply("y");
/// let prompt = Rule::new("prompt", Regex::new(r"(?m)^Switch#\s*$").unwrap()).resolve();
/// ```
#[derive(Clone)]
pub struct Rule {
    pub(crate) name: &'static str,
    pub(crate) matcher: Arc<dyn TextMatcher>,
    pub(crate) action: Action,
    pub(crate) record: bool,
    pub(crate) requires: Vec<&'static str>,
}

impl Rule {
    /// Create a rule that consumes its match and continues.
    pub fn new(name: &'static str, matcher: impl TextMatcher + 'static) -> Self {
        Self {
            name,
            matcher: Arc::new(matcher),
            action: Action::Continue {
                reply: None,
                resets_clock: false,
            },
            record: false,
            requires: Vec::new(),
        }
    }

    /// Reply with raw text and continue.
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.with_reply(Reply::Raw(text.into()))
    }

    /// Reply with a line and continue.
    pub fn reply_line(self, text: impl Into<String>) -> Self {
        self.with_reply(Reply::Line(text.into()))
    }

    fn with_reply(mut self, reply: Reply) -> Self {
        let resets_clock = matches!(
            self.action,
            Action::Continue {
                resets_clock: true,
                ..
            }
        );
        self.action = Action::Continue {
            reply: Some(reply),
            resets_clock,
        };
        self
    }

    /// Continue and reset the dialogue's deadline on every match.
    pub fn keep_alive(mut self) -> Self {
        let reply = match self.action {
            Action::Continue { reply, .. } => reply,
            _ => None,
        };
        self.action = Action::Continue {
            reply,
            resets_clock: true,
        };
        self
    }

    /// Resolve the dialogue.
    pub fn resolve(mut self) -> Self {
        self.action = Action::Resolve;
        self
    }

    /// Resolve only once every named field has been captured; otherwise
    /// consume the match and keep scanning.
    pub fn resolve_when(mut self, fields: &[&'static str]) -> Self {
        self.action = Action::Resolve;
        self.requires = fields.to_vec();
        self
    }

    /// Fail with the matched text as the reason.
    pub fn fail(mut self) -> Self {
        self.action = Action::Fail(None);
        self
    }

    /// Fail with a fixed reason.
    pub fn fail_with(mut self, reason: impl Into<String>) -> Self {
        self.action = Action::Fail(Some(reason.into()));
        self
    }

    /// Append this rule's captures as a new record instead of merging them
    /// into the fields.
    pub fn record(mut self) -> Self {
        self.record = true;
        self
    }

    /// The rule's action.
    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Continues without replying. Such rules only collect captures.
    pub(crate) fn is_passive(&self) -> bool {
        matches!(self.action, Action::Continue { reply: None, .. })
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("action", &self.action)
            .field("record", &self.record)
            .field("requires", &self.requires)
            .finish()
    }
}
