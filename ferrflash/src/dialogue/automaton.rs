//! The generic dialogue loop.

use std::time::Duration;

use log::{debug, trace};
use tokio::time::Instant;

use super::outcome::{DialogueResult, DialogueStatus};
use super::rule::{Action, Reply, Rule};
use crate::channel::{Channel, Match, PatternBuffer, ReadEvent};
use crate::error::Result;

/// An ordered rule set with a timeout budget.
///
/// Running a dialogue reads from the channel and, after every arrival,
/// repeatedly takes the first rule (in priority order) that matches the
/// unconsumed buffer. The buffer is consumed up to the end of that match and
/// the rule's action runs. Unmatched text stays in the buffer for the next
/// read.
///
/// Passive rules (continue without a reply) also scan the text skipped over
/// by a higher-priority match before it is consumed, so a capture is never
/// lost to a pager or banner cue that happened to outrank it.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
///
/// use ferrflash::channel::{Channel, Literal};
/// use ferrflash::dialogue::{Dialogue, Rule};
/// use regex::bytes::Regex;
///
/// # async fn example(channel: &mut impl Channel) -> Result<(), ferrflash::Error> {
/// channel.send_line("squeeze flash:").await?;
/// let result = Dialogue::new("squeeze", Duration::from_secs(300))
///     .rule(Rule::new("confirm", Literal::new("[confirm]")).reply("y"))
///     .rule(Rule::new("prompt", Regex::new(r"(?m)^Switch#\s*$").unwrap()).resolve())
///     .run(channel)
///     .await?
///     .resolved()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Dialogue {
    name: &'static str,
    rules: Vec<Rule>,
    budget: Duration,
}

impl Dialogue {
    /// Create an empty dialogue.
    pub fn new(name: &'static str, budget: Duration) -> Self {
        Self {
            name,
            rules: Vec::new(),
            budget,
        }
    }

    /// Append a rule at the lowest priority so far.
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Run the dialogue until a rule resolves or fails it, the deadline
    /// passes, or the channel closes.
    ///
    /// Only channel I/O errors are returned as `Err`; every other ending is
    /// reported through [`DialogueResult::status`].
    pub async fn run<C: Channel>(&self, channel: &mut C) -> Result<DialogueResult> {
        let start = Instant::now();
        let mut deadline = start + self.budget;
        let mut buffer = PatternBuffer::default();
        let mut result = DialogueResult::new(self.name, self.budget);

        trace!("{}: started with budget {:?}", self.name, self.budget);

        let status = 'dialogue: loop {
            while let Some((rule, m)) = self.first_match(&buffer) {
                self.harvest(&buffer.as_slice()[..m.start], &mut result);
                let matched = String::from_utf8_lossy(&buffer.as_slice()[m.start..m.end])
                    .trim()
                    .to_string();
                buffer.consume(m.end);
                trace!("{}: rule '{}' matched {:?}", self.name, rule.name, matched);
                store(rule, m.captures, &mut result);

                match &rule.action {
                    Action::Continue {
                        reply,
                        resets_clock,
                    } => {
                        match reply {
                            Some(Reply::Raw(text)) => channel.send(text).await?,
                            Some(Reply::Line(text)) => channel.send_line(text).await?,
                            None => {}
                        }
                        if *resets_clock {
                            deadline = Instant::now() + self.budget;
                        }
                    }
                    Action::Resolve => {
                        let missing: Vec<_> = rule
                            .requires
                            .iter()
                            .filter(|f| !result.fields.contains_key(**f))
                            .collect();
                        if missing.is_empty() {
                            break 'dialogue DialogueStatus::Resolved;
                        }
                        debug!(
                            "{}: '{}' matched but {:?} still unset, continuing",
                            self.name, rule.name, missing
                        );
                    }
                    Action::Fail(reason) => {
                        break 'dialogue DialogueStatus::Failed(
                            reason.clone().unwrap_or(matched),
                        );
                    }
                }
            }

            match channel.read_chunk(deadline).await? {
                ReadEvent::Data(data) => buffer.extend(&data),
                ReadEvent::Eof => break DialogueStatus::EndOfStream,
                ReadEvent::Timeout => break DialogueStatus::Timeout,
            }
        };

        result.elapsed = start.elapsed();
        debug!(
            "{}: {:?} after {:?}",
            self.name, status, result.elapsed
        );
        result.status = status;
        Ok(result)
    }

    /// First rule in priority order with a non-empty match.
    fn first_match(&self, buffer: &PatternBuffer) -> Option<(&Rule, Match)> {
        self.rules.iter().find_map(|rule| {
            buffer
                .find(rule.matcher.as_ref())
                .filter(|m| m.end > m.start)
                .map(|m| (rule, m))
        })
    }

    /// Run every passive rule over `skipped` and store what it captures,
    /// in the order the matches appear.
    fn harvest(&self, skipped: &[u8], result: &mut DialogueResult) {
        let mut found = Vec::new();
        for rule in self.rules.iter().filter(|r| r.is_passive()) {
            let mut pos = 0;
            while let Some(m) = rule.matcher.find_match(&skipped[pos..]) {
                if m.end == m.start {
                    break;
                }
                let m = m.shifted(pos);
                pos = m.end;
                found.push((rule, m));
            }
        }

        found.sort_by_key(|(_, m)| m.start);
        for (rule, m) in found {
            trace!("{}: rule '{}' matched skipped text", self.name, rule.name);
            store(rule, m.captures, result);
        }
    }
}

fn store(rule: &Rule, captures: Vec<(String, String)>, result: &mut DialogueResult) {
    if rule.record {
        result.records.push(captures.into_iter().collect());
    } else {
        result.fields.extend(captures);
    }
}
