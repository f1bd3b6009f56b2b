//! Login helper connector.

use log::info;

use super::Connector;
use crate::channel::ProcessChannel;
use crate::error::Result;

/// Default login helper program.
pub const DEFAULT_PROGRAM: &str = "clogin";

/// Spawns `<program> <args...> <host>` for each connection.
///
/// # Example
///
/// ```rust
/// use ferrflash::transport::LoginHelper;
///
/// let helper = LoginHelper::new("clogin").arg("-f").arg("/etc/cloginrc");
/// assert_eq!(helper.command_for("sw1"), vec!["clogin", "-f", "/etc/cloginrc", "sw1"]);
/// ```
#[derive(Debug, Clone)]
pub struct LoginHelper {
    program: String,
    args: Vec<String>,
}

impl LoginHelper {
    /// Create a connector for `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument placed before the host name.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Full command line used for `host`.
    pub fn command_for(&self, host: &str) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .chain(std::iter::once(host.to_string()))
            .collect()
    }
}

impl Default for LoginHelper {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl Connector for LoginHelper {
    type Channel = ProcessChannel;

    async fn connect(&self, host: &str) -> Result<ProcessChannel> {
        info!("{}: connecting via {}", host, self.program);
        let mut args = self.args.clone();
        args.push(host.to_string());
        ProcessChannel::spawn(&self.program, &args)
    }
}
