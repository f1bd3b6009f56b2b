//! Configuration: settings layers, their merge, and document loading.
//!
//! Settings come from four layers, lowest first:
//!
//! 1. the built-in fallback ([`Settings::builtin`])
//! 2. the user's `defaults` document
//! 3. the [`DeviceProfile`](crate::platform::DeviceProfile) matching the device
//! 4. explicit caller overrides
//!
//! A field set in a higher layer replaces the lower value; a field left unset
//! defers to the layer below. The merged product is an [`EffectiveConfig`],
//! built once per host.

mod effective;
mod loader;

pub use effective::EffectiveConfig;
pub use loader::{CONFIG_DIR_ENV, ConfigLoader, DEFAULTS_DOCUMENT, PROFILES_DOCUMENT};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One configuration layer. `None` means "not set here".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Transfer protocol: `tftp`, `ftp`, `scp`, `http` or `archive`.
    pub protocol: Option<String>,

    /// File server host (may carry `user@` for scp/ftp).
    pub server: Option<String>,

    /// Directory on the file server holding the images.
    pub path: Option<String>,

    /// Main device filesystem, e.g. `flash`.
    pub device: Option<String>,

    /// Image that should end up on `device`.
    pub target_image: Option<String>,

    /// Boot filesystem, e.g. `bootflash`.
    pub boot_device: Option<String>,

    /// Image that should end up on `boot_device`.
    pub boot_image: Option<String>,

    /// Minimum flash size, e.g. `32768K` or `64M`.
    pub min_flash: Option<String>,

    /// Expected MD5 of the target image.
    pub md5: Option<String>,

    /// Upload even if the target image is already present.
    pub force: Option<bool>,

    /// Format the filesystem before copying.
    pub format: Option<bool>,

    /// Delete existing files before copying.
    pub delete: Option<bool>,

    /// Squeeze the filesystem before copying.
    pub squeeze: Option<bool>,

    /// Verify the checksum after copying.
    pub verify: Option<bool>,

    /// Reload the device at the end.
    pub reload: Option<bool>,

    /// List only the top directory and delete directories recursively.
    pub non_recursive: Option<bool>,
}

/// Replace every field of `$lower` that `$upper` sets.
macro_rules! overlay_fields {
    ($lower:ident, $upper:ident; $($field:ident),* $(,)?) => {
        $(
            if $upper.$field.is_some() {
                $lower.$field = $upper.$field.clone();
            }
        )*
    };
}

impl Settings {
    /// The built-in fallback layer.
    pub fn builtin() -> Self {
        Self {
            protocol: Some(Protocol::Tftp.to_string()),
            device: Some("flash".to_string()),
            force: Some(false),
            format: Some(false),
            delete: Some(false),
            squeeze: Some(false),
            verify: Some(false),
            reload: Some(false),
            non_recursive: Some(false),
            ..Self::default()
        }
    }

    /// Apply `upper` on top of `self`.
    pub fn overlay(&mut self, upper: &Settings) {
        overlay_fields!(self, upper;
            protocol, server, path, device, target_image, boot_device, boot_image,
            min_flash, md5, force, format, delete, squeeze, verify, reload, non_recursive,
        );
    }

    /// Return `self` with `upper` applied.
    pub fn overlaid(mut self, upper: &Settings) -> Self {
        self.overlay(upper);
        self
    }
}

/// How images reach the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tftp,
    Ftp,
    Scp,
    Http,
    /// `archive download-sw` over TFTP: one command installs the image.
    Archive,
}

impl Protocol {
    /// URL scheme used in copy/install commands.
    pub fn scheme(&self) -> &'static str {
        match self {
            Protocol::Tftp | Protocol::Archive => "tftp",
            Protocol::Ftp => "ftp",
            Protocol::Scp => "scp",
            Protocol::Http => "http",
        }
    }

    /// Whether uploads use archive mode.
    pub fn is_archive(&self) -> bool {
        matches!(self, Protocol::Archive)
    }
}

impl FromStr for Protocol {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tftp" => Ok(Protocol::Tftp),
            "ftp" => Ok(Protocol::Ftp),
            "scp" => Ok(Protocol::Scp),
            "http" => Ok(Protocol::Http),
            "archive" => Ok(Protocol::Archive),
            _ => Err(ConfigError::InvalidProtocol(s.to_string())),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Protocol::Archive => "archive",
            other => other.scheme(),
        };
        f.write_str(name)
    }
}

/// Parse a flash size into kilobytes. Accepts `65536K`, `64M` or `65536`.
pub fn parse_flash_kb(size: &str) -> Result<u64, ConfigError> {
    let trimmed = size.trim();
    let invalid = || ConfigError::InvalidFlashSize(size.to_string());

    let (digits, multiplier) = match trimmed.chars().last() {
        Some('K' | 'k') => (&trimmed[..trimmed.len() - 1], 1),
        Some('M' | 'm') => (&trimmed[..trimmed.len() - 1], 1024),
        Some(c) if c.is_ascii_digit() => (trimmed, 1),
        _ => return Err(invalid()),
    };

    let n = digits.parse::<u64>().map_err(|_| invalid())?;
    n.checked_mul(multiplier).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_only_set_fields() {
        let mut lower = Settings {
            protocol: Some("tftp".into()),
            device: Some("flash".into()),
            ..Default::default()
        };
        let upper = Settings {
            device: None,
            target_image: Some("y".into()),
            ..Default::default()
        };
        lower.overlay(&upper);

        assert_eq!(lower.protocol.as_deref(), Some("tftp"));
        assert_eq!(lower.device.as_deref(), Some("flash"));
        assert_eq!(lower.target_image.as_deref(), Some("y"));
    }

    #[test]
    fn test_settings_from_json() {
        let settings: Settings =
            serde_json::from_str(r#"{"protocol": "ftp", "server": "10.0.0.5", "verify": true}"#)
                .unwrap();
        assert_eq!(settings.protocol.as_deref(), Some("ftp"));
        assert_eq!(settings.server.as_deref(), Some("10.0.0.5"));
        assert_eq!(settings.verify, Some(true));
        assert_eq!(settings.device, None);
    }

    #[test]
    fn test_protocol_parse() {
        assert_eq!("TFTP".parse::<Protocol>().unwrap(), Protocol::Tftp);
        assert_eq!("archive".parse::<Protocol>().unwrap(), Protocol::Archive);
        assert_eq!(Protocol::Archive.scheme(), "tftp");
        assert_eq!(Protocol::Archive.to_string(), "archive");
        assert!("gopher".parse::<Protocol>().is_err());
    }

    #[test]
    fn test_parse_flash_kb() {
        assert_eq!(parse_flash_kb("65536K").unwrap(), 65536);
        assert_eq!(parse_flash_kb("64M").unwrap(), 65536);
        assert_eq!(parse_flash_kb(" 32768 ").unwrap(), 32768);
        assert!(parse_flash_kb("unknown").is_err());
        assert!(parse_flash_kb("K").is_err());
        assert!(parse_flash_kb("").is_err());
    }

    #[test]
    fn test_parse_flash_kb_rejects_overflow() {
        assert!(matches!(
            parse_flash_kb("99999999999999999M"),
            Err(ConfigError::InvalidFlashSize(_))
        ));
        assert_eq!(parse_flash_kb("18014398509481983M").unwrap(), 18014398509481983 * 1024);
    }
}
