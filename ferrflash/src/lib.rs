//! # ferrflash
//!
//! Async firmware lifecycle automation for Cisco IOS devices reached through
//! an interactive command line.
//!
//! ferrflash logs in through an external login helper, reads `show version`,
//! picks a device profile, and then converses with the device to list,
//! clean, format, squeeze, copy, verify and reload. Every one of those
//! conversations is a [`Dialogue`](dialogue::Dialogue): an ordered rule set
//! over the device output with its own timeout budget.
//!
//! ## Features
//!
//! - Dialogue automaton with priority-ordered rules, field capture, record
//!   collection and keep-alive timeouts for long transfers
//! - Layered JSON configuration: built-in, defaults, device profile, overrides
//! - TFTP/FTP/SCP/HTTP copy or `archive download-sw` installs
//! - Per-host isolation; one failing switch never stops the batch
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ferrflash::config::{ConfigLoader, Settings};
//! use ferrflash::transport::LoginHelper;
//! use ferrflash::upgrade::{UpgradeOptions, Upgrader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ferrflash::Error> {
//!     let overrides = Settings {
//!         target_image: Some("c2960-lanbasek9-mz.150-2.SE11.bin".into()),
//!         verify: Some(true),
//!         ..Default::default()
//!     };
//!     let options = UpgradeOptions::load(&ConfigLoader::standard(), overrides)?;
//!
//!     Upgrader::new(LoginHelper::default(), options)
//!         .run(&["sw-access-1", "sw-access-2"])
//!         .await
//! }
//! ```

pub mod channel;
pub mod config;
pub mod dialogue;
pub mod driver;
pub mod error;
pub mod platform;
pub mod transport;
pub mod upgrade;

// Re-export main types for convenience
pub use config::{EffectiveConfig, Settings};
pub use dialogue::{Dialogue, DialogueResult, Rule};
pub use driver::{FileEntry, Listing, Session, Timeouts, VersionInfo};
pub use error::Error;
pub use transport::{Connector, LoginHelper};
pub use upgrade::{UpgradeOptions, Upgrader};
