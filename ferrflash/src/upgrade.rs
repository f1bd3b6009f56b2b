//! Upgrade orchestration: one host after another, one phase after another.
//!
//! For every host the [`Upgrader`] opens a session, inspects the version
//! report, picks a device profile, merges the configuration and then brings
//! the main and boot filesystems up to date before an optional reload. The
//! session is closed before the next host whatever happened.
//!
//! Hosts are isolated from each other: a connection failure, timeout or
//! device error ends that host only and the run continues. Two conditions
//! are handled differently. A host whose family resolves no target image is
//! skipped without counting as a failure, and a device with less flash than
//! the configured minimum stops the whole run.

use log::{debug, error, info, warn};

use crate::channel::Channel;
use crate::config::{ConfigLoader, EffectiveConfig, Settings, parse_flash_kb};
use crate::driver::{Listing, Session, Timeouts, UNKNOWN, VersionInfo};
use crate::error::{ConfigError, DialogueError, Error, Result, UpgradeError};
use crate::platform::ProfileTable;
use crate::transport::Connector;

/// Caller-side inputs of a run.
#[derive(Debug, Clone, Default)]
pub struct UpgradeOptions {
    /// The `defaults` document layer.
    pub defaults: Settings,
    /// Device profiles, highest priority first.
    pub profiles: ProfileTable,
    /// Explicit overrides, applied last.
    pub overrides: Settings,
    /// Dialogue budgets.
    pub timeouts: Timeouts,
}

impl UpgradeOptions {
    /// Read the defaults and profiles documents through `loader`.
    pub fn load(loader: &ConfigLoader, overrides: Settings) -> Result<Self> {
        Ok(Self {
            defaults: loader.load_defaults()?,
            profiles: loader.load_profiles()?,
            overrides,
            timeouts: Timeouts::default(),
        })
    }

    /// Replace the dialogue budgets.
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Merge the configuration for a device.
    pub fn effective_config(&self, version: &VersionInfo) -> Result<EffectiveConfig> {
        let profile = self.profiles.lookup(&version.family, &version.processor);
        match profile {
            Some(p) => debug!(
                "profile /{}/ selected for {} ({})",
                p.pattern, version.family, version.processor
            ),
            None => debug!(
                "no profile for {} ({})",
                version.family, version.processor
            ),
        }
        Ok(EffectiveConfig::merge(
            &self.defaults,
            profile.map(|p| &p.settings),
            &self.overrides,
        )?)
    }
}

/// What happened to one filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The image was already there.
    Current,
    /// The image was uploaded.
    Uploaded,
    /// The filesystem could not be listed; nothing was changed.
    NotEnumerated,
    /// No image configured for this filesystem.
    NotConfigured,
}

/// What happened to one host that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOutcome {
    /// No target image resolved for the device family.
    NoTargetImage { family: String },

    /// Every configured phase ran.
    Completed {
        main: Phase,
        boot: Phase,
        reloaded: bool,
    },
}

/// Runs upgrades over a [`Connector`].
///
/// # Example
///
/// ```rust,no_run
/// use ferrflash::config::{ConfigLoader, Settings};
/// use ferrflash::transport::LoginHelper;
/// use ferrflash::upgrade::{UpgradeOptions, Upgrader};
///
/// # async fn example() -> Result<(), ferrflash::Error> {
/// let overrides = Settings {
///     reload: Some(true),
///     ..Default::default()
/// };
/// let options = UpgradeOptions::load(&ConfigLoader::standard(), overrides)?;
/// Upgrader::new(LoginHelper::default(), options)
///     .run(&["sw-core-1", "sw-core-2"])
///     .await
/// # }
/// ```
#[derive(Debug)]
pub struct Upgrader<K: Connector> {
    connector: K,
    options: UpgradeOptions,
}

impl<K: Connector> Upgrader<K> {
    pub fn new(connector: K, options: UpgradeOptions) -> Self {
        Self { connector, options }
    }

    /// Upgrade every host in order.
    ///
    /// Returns [`UpgradeError::HostsFailed`] once all hosts have been tried if
    /// any of them failed. Insufficient flash on any host returns
    /// [`ConfigError::InsufficientFlash`] immediately.
    pub async fn run<S: AsRef<str>>(&self, hosts: &[S]) -> Result<()> {
        let mut failed = Vec::new();

        for host in hosts {
            let host = host.as_ref();
            match self.upgrade_host(host).await {
                Ok(HostOutcome::NoTargetImage { family }) => {
                    warn!("{}: no target image for {}, skipped", host, family);
                }
                Ok(HostOutcome::Completed {
                    main,
                    boot,
                    reloaded,
                }) => {
                    info!(
                        "{}: done (main {:?}, boot {:?}, reloaded {})",
                        host, main, boot, reloaded
                    );
                }
                Err(e @ Error::Config(ConfigError::InsufficientFlash { .. })) => {
                    error!("{}, aborting run", e);
                    return Err(e);
                }
                Err(e) => {
                    error!("{}: {}", host, e);
                    failed.push(host.to_string());
                }
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(UpgradeError::HostsFailed { hosts: failed }.into())
        }
    }

    /// Upgrade one host. The session is closed before returning.
    pub async fn upgrade_host(&self, host: &str) -> Result<HostOutcome> {
        let channel = self.connector.connect(host).await?;
        let mut session = Session::open(channel, host, self.options.timeouts).await?;

        let outcome = self.drive(&mut session).await;

        if let Err(e) = session.close().await {
            debug!("{}: close failed: {}", host, e);
        }
        outcome
    }

    async fn drive(&self, session: &mut Session<K::Channel>) -> Result<HostOutcome> {
        let host = session.host().to_string();
        let version = session.inspect_version().await?;
        let config = self.options.effective_config(&version)?;

        let Some(target) = config.target_image.clone() else {
            return Ok(HostOutcome::NoTargetImage {
                family: version.family,
            });
        };

        check_flash(&host, &config, &version)?;

        let running = normalize_image(&version.image);
        let main = if running == target {
            info!("{}: already running {}, skipping upload", host, target);
            Phase::Current
        } else {
            sync_filesystem(session, &config, &config.device, &target, config.format).await?
        };

        let boot = match config.boot_target() {
            Some((device, image)) => {
                sync_filesystem(session, &config, device, image, false).await?
            }
            None => Phase::NotConfigured,
        };

        let reloaded = if config.reload {
            session.reload().await?;
            true
        } else {
            false
        };

        Ok(HostOutcome::Completed {
            main,
            boot,
            reloaded,
        })
    }
}

/// Walk `filesystem` and upload `image` unless it is already there.
async fn sync_filesystem<C: Channel>(
    session: &mut Session<C>,
    config: &EffectiveConfig,
    filesystem: &str,
    image: &str,
    do_format: bool,
) -> Result<Phase> {
    let listing = session
        .list_files(filesystem, image, config.force, config.non_recursive)
        .await;

    match listing {
        Ok(Listing::AlreadyCurrent) => {
            info!("{}: {} already current, skipping upload", session.host(), image);
            Ok(Phase::Current)
        }
        Ok(Listing::Entries(files)) => {
            info!("{}: uploading {} to {}:", session.host(), image, filesystem);
            session
                .upload(config, image, filesystem, &files, do_format)
                .await?;
            Ok(Phase::Uploaded)
        }
        Err(Error::Dialogue(
            e @ (DialogueError::Timeout { .. } | DialogueError::Failed { .. }),
        )) => {
            warn!(
                "{}: could not list {}: ({}), nothing to do",
                session.host(),
                filesystem,
                e
            );
            Ok(Phase::NotEnumerated)
        }
        Err(e) => Err(e),
    }
}

/// Compare the reported flash size with the configured minimum.
fn check_flash(host: &str, config: &EffectiveConfig, version: &VersionInfo) -> Result<()> {
    let (Some(required), Some(min)) = (config.min_flash.as_deref(), config.min_flash_kb()) else {
        return Ok(());
    };

    match parse_flash_kb(&version.flash_size) {
        Ok(available) if available < min => Err(ConfigError::InsufficientFlash {
            host: host.to_string(),
            required: required.to_string(),
            available: version.flash_size.clone(),
        }
        .into()),
        Ok(_) => Ok(()),
        Err(_) => {
            warn!(
                "{}: flash size {:?} not reported, skipping minimum check",
                host, version.flash_size
            );
            Ok(())
        }
    }
}

/// Strip the filesystem prefix and any directories from a running image.
///
/// ```rust
/// use ferrflash::upgrade::normalize_image;
///
/// assert_eq!(normalize_image("flash:/subdir/c2960-lanbase.bin"), "c2960-lanbase.bin");
/// assert_eq!(normalize_image("unknown"), "unknown");
/// ```
pub fn normalize_image(image: &str) -> &str {
    if image == UNKNOWN {
        return image;
    }
    let path = image.split_once(':').map_or(image, |(_, rest)| rest);
    path.rsplit('/').next().unwrap_or(path)
}
