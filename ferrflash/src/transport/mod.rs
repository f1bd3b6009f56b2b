//! Transport: how a per-host channel comes into existence.
//!
//! Connecting and authenticating is delegated to an external login helper
//! (`clogin` and friends). ferrflash only spawns it with the host name and
//! talks to whatever command line it hands over.

mod login;

pub use login::LoginHelper;

use std::future::Future;

use crate::channel::Channel;
use crate::error::Result;

/// Opens a fresh channel to one host.
pub trait Connector: Send + Sync {
    /// The channel type produced.
    type Channel: Channel;

    /// Open a channel to `host`.
    fn connect(&self, host: &str) -> impl Future<Output = Result<Self::Channel>> + Send;
}
