//! Device driver: an established session and the operations run over it.
//!
//! A [`Session`] wraps a [`Channel`](crate::channel::Channel) once the
//! device's privileged prompt has been seen. Every operation is a
//! [`Dialogue`](crate::dialogue::Dialogue) assembled from the cues in
//! [`cisco_ios`](crate::platform::cisco_ios) and run with its own budget
//! from [`Timeouts`].

mod mutators;
mod session;
mod upload;
mod version;
mod walker;

pub use session::Session;
pub use version::{UNKNOWN, VersionInfo};
pub use walker::{FileEntry, Listing};

use std::time::Duration;

/// Per-dialogue timeout budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Login helper until the first prompt.
    pub connect: Duration,
    /// Generic commands such as `terminal length 0`.
    pub command: Duration,
    /// `show version`.
    pub version: Duration,
    /// One `dir` listing.
    pub listing: Duration,
    /// One `delete`.
    pub delete: Duration,
    pub format: Duration,
    pub squeeze: Duration,
    /// Image transfer; restarted on every progress marker.
    pub download: Duration,
    /// `verify /md5`.
    pub verify: Duration,
    /// `reload` until the device drops the session.
    pub reload: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(60),
            command: Duration::from_secs(30),
            version: Duration::from_secs(100),
            listing: Duration::from_secs(30),
            delete: Duration::from_secs(30),
            format: Duration::from_secs(300),
            squeeze: Duration::from_secs(300),
            download: Duration::from_secs(600),
            verify: Duration::from_secs(30),
            reload: Duration::from_secs(30),
        }
    }
}

impl Timeouts {
    /// Every budget set to `budget`.
    pub fn uniform(budget: Duration) -> Self {
        Self {
            connect: budget,
            command: budget,
            version: budget,
            listing: budget,
            delete: budget,
            format: budget,
            squeeze: budget,
            download: budget,
            verify: budget,
            reload: budget,
        }
    }
}
