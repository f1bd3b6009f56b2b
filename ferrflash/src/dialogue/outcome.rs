//! Result of running a dialogue.

use std::time::Duration;

use indexmap::IndexMap;

use crate::error::DialogueError;

/// How a dialogue ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueStatus {
    /// A resolve rule matched.
    Resolved,

    /// The deadline passed with no resolving match.
    Timeout,

    /// The channel closed first.
    EndOfStream,

    /// A failure rule matched.
    Failed(String),
}

/// Fields accumulated by a dialogue plus its terminal status.
#[derive(Debug, Clone)]
pub struct DialogueResult {
    /// Dialogue name, for error messages.
    pub dialogue: &'static str,

    /// Named captures; later matches overwrite earlier ones.
    pub fields: IndexMap<String, String>,

    /// One entry per match of a recording rule, in arrival order.
    pub records: Vec<IndexMap<String, String>>,

    /// Terminal status.
    pub status: DialogueStatus,

    /// Budget the dialogue ran with.
    pub budget: Duration,

    /// Wall time spent.
    pub elapsed: Duration,
}

impl DialogueResult {
    pub(crate) fn new(dialogue: &'static str, budget: Duration) -> Self {
        Self {
            dialogue,
            fields: IndexMap::new(),
            records: Vec::new(),
            status: DialogueStatus::Timeout,
            budget,
            elapsed: Duration::ZERO,
        }
    }

    /// Check if the dialogue resolved.
    pub fn is_resolved(&self) -> bool {
        self.status == DialogueStatus::Resolved
    }

    /// Get a captured field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Convert any non-resolved status into the matching error.
    pub fn resolved(self) -> Result<Self, DialogueError> {
        match self.status {
            DialogueStatus::Resolved => Ok(self),
            DialogueStatus::Timeout => Err(DialogueError::Timeout {
                dialogue: self.dialogue,
                budget: self.budget,
            }),
            DialogueStatus::EndOfStream => Err(DialogueError::EndOfStream {
                dialogue: self.dialogue,
            }),
            DialogueStatus::Failed(reason) => Err(DialogueError::Failed {
                dialogue: self.dialogue,
                reason,
            }),
        }
    }
}
