//! Channel backed by a spawned login helper process.

use std::process::Stdio;
use std::time::Duration;

use log::{debug, trace, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::Instant;

use super::{Channel, ReadEvent};
use crate::error::{ChannelError, Result};

/// Size of a single read from the helper's stdout.
const READ_CHUNK: usize = 4096;

/// How long the helper gets to log out after stdin closes.
const LOGOUT_GRACE: Duration = Duration::from_secs(5);

/// Interactive session over a login helper's stdin/stdout.
///
/// The helper (e.g. `clogin`) takes care of connecting and authenticating;
/// once it hands over, its stdout carries the device output and its stdin
/// reaches the device command line.
pub struct ProcessChannel {
    /// Human readable command line, for logs and errors.
    command: String,

    child: Child,

    /// `None` once closed.
    stdin: Option<ChildStdin>,

    stdout: ChildStdout,
}

impl ProcessChannel {
    /// Spawn `program` with `args`.
    pub fn spawn(program: &str, args: &[String]) -> Result<Self> {
        let command = std::iter::once(program)
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ChannelError::Spawn {
                command: command.clone(),
                source,
            })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take().ok_or(ChannelError::Closed)?;

        debug!("spawned login helper: {}", command);

        Ok(Self {
            command,
            child,
            stdin,
            stdout,
        })
    }
}

impl Channel for ProcessChannel {
    async fn send(&mut self, text: &str) -> Result<()> {
        let stdin = self.stdin.as_mut().ok_or(ChannelError::Closed)?;
        trace!("send: {:?}", text);
        stdin
            .write_all(text.as_bytes())
            .await
            .map_err(ChannelError::Io)?;
        stdin.flush().await.map_err(ChannelError::Io)?;
        Ok(())
    }

    async fn read_chunk(&mut self, deadline: Instant) -> Result<ReadEvent> {
        let mut buf = vec![0u8; READ_CHUNK];
        match tokio::time::timeout_at(deadline, self.stdout.read(&mut buf)).await {
            Err(_) => Ok(ReadEvent::Timeout),
            Ok(Ok(0)) => Ok(ReadEvent::Eof),
            Ok(Ok(n)) => {
                buf.truncate(n);
                trace!("recv: {} bytes", n);
                Ok(ReadEvent::Data(buf))
            }
            Ok(Err(e)) => Err(ChannelError::Io(e).into()),
        }
    }

    async fn close(&mut self) -> Result<()> {
        // Dropping stdin delivers EOF to the helper, which then logs out.
        self.stdin.take();
        match tokio::time::timeout(LOGOUT_GRACE, self.child.wait()).await {
            Ok(status) => {
                let status = status.map_err(ChannelError::Io)?;
                debug!("login helper {} exited: {}", self.command, status);
            }
            Err(_) => {
                warn!("login helper {} still running, killing it", self.command);
                self.child.kill().await.map_err(ChannelError::Io)?;
            }
        }
        Ok(())
    }
}
