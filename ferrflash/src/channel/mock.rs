//! Scripted in-memory channel for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use super::{Channel, ReadEvent};
use crate::error::{ChannelError, Result};

/// One step of scripted device output.
#[derive(Debug, Clone)]
pub(crate) enum Event {
    Data(Vec<u8>),
    Delay(Duration),
    Eof,
}

impl Event {
    pub(crate) fn text(s: &str) -> Self {
        Event::Data(s.as_bytes().to_vec())
    }
}

/// What the code under test did to the channel.
#[derive(Debug, Default)]
pub(crate) struct Transcript {
    pub(crate) sent: Vec<String>,
    pub(crate) closed: bool,
}

/// Shared view of a [`Transcript`] that outlives the channel.
#[derive(Debug, Clone, Default)]
pub(crate) struct TranscriptHandle(Arc<Mutex<Transcript>>);

impl TranscriptHandle {
    /// Every line sent, with trailing line terminators removed.
    pub(crate) fn sent(&self) -> Vec<String> {
        self.0.lock().unwrap().sent.clone()
    }

    /// Sent lines starting with `prefix`.
    pub(crate) fn sent_starting_with(&self, prefix: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|s| s.starts_with(prefix))
            .collect()
    }

    pub(crate) fn closed(&self) -> bool {
        self.0.lock().unwrap().closed
    }
}

/// Channel that answers sent commands from a script.
///
/// Replies registered for the same input are handed out in registration
/// order, one reply per send. Input with no reply left produces silence.
#[derive(Debug, Default)]
pub(crate) struct ScriptedChannel {
    replies: Vec<(String, VecDeque<Vec<Event>>)>,
    pending: VecDeque<Event>,
    ready_at: Option<Instant>,
    transcript: TranscriptHandle,
}

impl ScriptedChannel {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Output available before anything is sent.
    pub(crate) fn banner(mut self, text: &str) -> Self {
        self.pending.push_back(Event::text(text));
        self
    }

    /// Queue a textual reply to `input`.
    pub(crate) fn on(self, input: &str, reply: &str) -> Self {
        self.on_events(input, vec![Event::text(reply)])
    }

    /// Queue a reply made of arbitrary events to `input`.
    pub(crate) fn on_events(mut self, input: &str, events: Vec<Event>) -> Self {
        let key = input.trim_end_matches(['\r', '\n']).to_string();
        match self.replies.iter_mut().find(|(k, _)| *k == key) {
            Some((_, queue)) => queue.push_back(events),
            None => self.replies.push((key, VecDeque::from([events]))),
        }
        self
    }

    pub(crate) fn transcript(&self) -> TranscriptHandle {
        self.transcript.clone()
    }
}

impl Channel for ScriptedChannel {
    async fn send(&mut self, text: &str) -> Result<()> {
        let key = text.trim_end_matches(['\r', '\n']).to_string();
        {
            let mut transcript = self.transcript.0.lock().unwrap();
            if transcript.closed {
                return Err(ChannelError::Closed.into());
            }
            transcript.sent.push(key.clone());
        }

        if let Some((_, queue)) = self.replies.iter_mut().find(|(k, _)| *k == key) {
            if let Some(events) = queue.pop_front() {
                self.pending.extend(events);
            }
        }
        Ok(())
    }

    async fn read_chunk(&mut self, deadline: Instant) -> Result<ReadEvent> {
        loop {
            if let Some(at) = self.ready_at {
                if at > deadline {
                    tokio::time::sleep_until(deadline).await;
                    return Ok(ReadEvent::Timeout);
                }
                tokio::time::sleep_until(at).await;
                self.ready_at = None;
            }

            match self.pending.pop_front() {
                None => {
                    tokio::time::sleep_until(deadline).await;
                    return Ok(ReadEvent::Timeout);
                }
                Some(Event::Delay(d)) => self.ready_at = Some(Instant::now() + d),
                Some(Event::Data(data)) => return Ok(ReadEvent::Data(data)),
                Some(Event::Eof) => {
                    self.pending.push_front(Event::Eof);
                    return Ok(ReadEvent::Eof);
                }
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.transcript.0.lock().unwrap().closed = true;
        Ok(())
    }
}

/// A device that has already printed `prompt` and accepts `terminal length 0`.
pub(crate) fn logged_in(prompt: &str) -> ScriptedChannel {
    ScriptedChannel::new()
        .banner(&format!("\r\nUser Access Verification\r\n\r\n{}", prompt))
        .on("terminal length 0", &format!("terminal length 0\r\n{}", prompt))
}
