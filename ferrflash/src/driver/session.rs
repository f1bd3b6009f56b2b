//! An established CLI session with one device.

use std::time::Duration;

use log::{debug, info, warn};
use regex::bytes::Regex;
use tokio::time::Instant;

use super::Timeouts;
use crate::channel::{Channel, PatternBuffer, ReadEvent, exact_prompt};
use crate::dialogue::{Dialogue, DialogueResult, Rule};
use crate::error::{Result, SessionError};
use crate::platform::cisco_ios;

/// A channel on which the privileged prompt has been established.
///
/// The prompt text seen at login is captured once; every later dialogue
/// resolves on exactly that prompt, so output lines that merely look like a
/// prompt do not end a dialogue early.
#[derive(Debug)]
pub struct Session<C: Channel> {
    channel: C,
    host: String,
    prompt: String,
    prompt_pattern: Regex,
    pub(crate) timeouts: Timeouts,
}

impl<C: Channel> Session<C> {
    /// Wait for the privileged prompt on `channel` and disable paging.
    ///
    /// The channel is closed again if no prompt appears.
    pub async fn open(mut channel: C, host: impl Into<String>, timeouts: Timeouts) -> Result<Self> {
        let host = host.into();

        let prompt = match Self::await_prompt(&mut channel, &host, timeouts.connect).await {
            Ok(prompt) => prompt,
            Err(e) => {
                if let Err(close_err) = channel.close().await {
                    debug!("{}: close after failed login: {}", host, close_err);
                }
                return Err(e);
            }
        };

        let prompt_pattern = exact_prompt(&prompt).map_err(|e| SessionError::ConnectionFailed {
            host: host.clone(),
            reason: e.to_string(),
        })?;
        info!("{}: logged in, prompt {:?}", host, prompt);

        let mut session = Self {
            channel,
            host,
            prompt,
            prompt_pattern,
            timeouts,
        };

        if let Err(e) = session.send_command(cisco_ios::TERMINAL_LENGTH).await {
            warn!("{}: could not disable paging: {}", session.host, e);
            session.channel.close().await?;
            return Err(e);
        }

        Ok(session)
    }

    /// Read until the tail of the output looks like a privileged prompt.
    async fn await_prompt(channel: &mut C, host: &str, budget: Duration) -> Result<String> {
        let deadline = Instant::now() + budget;
        let mut buffer = PatternBuffer::default();
        let failed = |reason: String| SessionError::ConnectionFailed {
            host: host.to_string(),
            reason,
        };

        loop {
            if let Some(m) = buffer.find(&*cisco_ios::LOGIN_ERROR) {
                let reason = m.get("reason").unwrap_or("login helper error").to_string();
                return Err(failed(reason).into());
            }
            if let Some(m) = buffer.search_tail(&*cisco_ios::PROMPT) {
                if let Some(prompt) = m.get("prompt") {
                    return Ok(prompt.to_string());
                }
            }

            match channel.read_chunk(deadline).await? {
                ReadEvent::Data(data) => buffer.extend(&data),
                ReadEvent::Eof => {
                    return Err(failed("login helper exited before a prompt appeared".into()).into());
                }
                ReadEvent::Timeout => {
                    return Err(failed(format!("no privileged prompt within {:?}", budget)).into());
                }
            }
        }
    }

    /// Host name this session belongs to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The prompt captured at login, e.g. `Switch#`.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Rule resolving on the captured prompt.
    pub fn prompt_rule(&self) -> Rule {
        Rule::new("prompt", self.prompt_pattern.clone()).resolve()
    }

    /// A dialogue that fails on device error lines and pages through
    /// `--More--`. Callers add their own rules and finish with
    /// [`Session::prompt_rule`] or a variant of it.
    pub fn dialogue(&self, name: &'static str, budget: Duration) -> Dialogue {
        Dialogue::new(name, budget)
            .rule(Rule::new("error", cisco_ios::ERROR.clone()).fail())
            .rule(Rule::new("more", cisco_ios::more()).reply(" "))
    }

    /// Send `command` and run `dialogue` against the reply.
    ///
    /// The raw [`DialogueResult`] is returned whatever its status; callers
    /// decide which endings are fatal.
    pub async fn converse(&mut self, command: &str, dialogue: &Dialogue) -> Result<DialogueResult> {
        debug!("{}: > {}", self.host, command);
        self.channel.send_line(command).await?;
        dialogue.run(&mut self.channel).await
    }

    /// Send a command that needs no answers and wait for the prompt.
    pub async fn send_command(&mut self, command: &str) -> Result<DialogueResult> {
        let dialogue = self
            .dialogue("command", self.timeouts.command)
            .rule(self.prompt_rule());
        Ok(self.converse(command, &dialogue).await?.resolved()?)
    }

    /// Close the channel.
    pub async fn close(mut self) -> Result<()> {
        debug!("{}: closing session", self.host);
        self.channel.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::channel::mock::{ScriptedChannel, logged_in};
    use crate::error::DialogueError;

    #[tokio::test(start_paused = true)]
    async fn test_open_captures_prompt_and_disables_paging() {
        let channel = logged_in("sw-access-3#");
        let transcript = channel.transcript();

        let session = Session::open(channel, "sw-access-3", Timeouts::default())
            .await
            .unwrap();

        assert_eq!(session.prompt(), "sw-access-3#");
        assert_eq!(session.host(), "sw-access-3");
        assert_eq!(transcript.sent(), vec!["terminal length 0"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_times_out_without_prompt() {
        let channel = ScriptedChannel::new().banner("Password: ");
        let transcript = channel.transcript();

        let start = Instant::now();
        let err = Session::open(channel, "sw1", Timeouts::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Session(SessionError::ConnectionFailed { .. })
        ));
        assert_eq!(start.elapsed(), Duration::from_secs(60));
        assert!(transcript.closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_reports_login_helper_error() {
        let channel =
            ScriptedChannel::new().banner("sw1\r\nError: TIMEOUT reached\r\n");
        let err = Session::open(channel, "sw1", Timeouts::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("TIMEOUT reached"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_user_mode_prompt_is_not_enough() {
        let channel = ScriptedChannel::new().banner("\r\nSwitch>");
        let result = Session::open(channel, "sw1", Timeouts::uniform(Duration::from_secs(5))).await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_command_error_line_fails() {
        let channel = logged_in("Switch#").on(
            "show flash-mystery",
            "show flash-mystery\r\n% Invalid input detected at '^' marker.\r\n\r\nSwitch#",
        );
        let mut session = Session::open(channel, "sw1", Timeouts::default())
            .await
            .unwrap();

        let err = session.send_command("show flash-mystery").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Dialogue(DialogueError::Failed { dialogue: "command", .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_closes_channel() {
        let channel = logged_in("Switch#");
        let transcript = channel.transcript();
        let session = Session::open(channel, "sw1", Timeouts::default())
            .await
            .unwrap();

        tokio_test::assert_ok!(session.close().await);
        assert!(transcript.closed());
    }
}
