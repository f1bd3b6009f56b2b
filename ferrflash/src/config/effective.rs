//! The merged, typed configuration for one host.

use super::{Protocol, Settings, parse_flash_kb};
use crate::error::ConfigError;

/// Concrete configuration after the four-layer merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub protocol: Protocol,
    pub server: Option<String>,
    pub path: Option<String>,
    pub device: String,
    pub target_image: Option<String>,
    pub boot_device: Option<String>,
    pub boot_image: Option<String>,
    pub min_flash: Option<String>,
    pub md5: Option<String>,
    pub force: bool,
    pub format: bool,
    pub delete: bool,
    pub squeeze: bool,
    pub verify: bool,
    pub reload: bool,
    pub non_recursive: bool,
}

impl EffectiveConfig {
    /// Merge built-in < defaults < profile < overrides.
    pub fn merge(
        defaults: &Settings,
        profile: Option<&Settings>,
        overrides: &Settings,
    ) -> Result<Self, ConfigError> {
        let mut merged = Settings::builtin().overlaid(defaults);
        if let Some(profile) = profile {
            merged.overlay(profile);
        }
        merged.overlay(overrides);
        Self::from_settings(merged)
    }

    fn from_settings(s: Settings) -> Result<Self, ConfigError> {
        let protocol = s.protocol.as_deref().unwrap_or("tftp").parse()?;

        if let Some(ref min) = s.min_flash {
            parse_flash_kb(min)?;
        }

        Ok(Self {
            protocol,
            server: s.server,
            path: s.path,
            device: s.device.unwrap_or_else(|| "flash".to_string()),
            target_image: s.target_image,
            boot_device: s.boot_device,
            boot_image: s.boot_image,
            min_flash: s.min_flash,
            md5: s.md5,
            force: s.force.unwrap_or(false),
            format: s.format.unwrap_or(false),
            delete: s.delete.unwrap_or(false),
            squeeze: s.squeeze.unwrap_or(false),
            verify: s.verify.unwrap_or(false),
            reload: s.reload.unwrap_or(false),
            non_recursive: s.non_recursive.unwrap_or(false),
        })
    }

    /// Source URL for `image` on the configured file server.
    pub fn image_url(&self, image: &str) -> Result<String, ConfigError> {
        let server = self
            .server
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingServer)?;

        let dir = self.path.as_deref().unwrap_or("").trim_matches('/');
        Ok(if dir.is_empty() {
            format!("{}://{}/{}", self.protocol.scheme(), server, image)
        } else {
            format!("{}://{}/{}/{}", self.protocol.scheme(), server, dir, image)
        })
    }

    /// Boot filesystem and image, when both are configured.
    pub fn boot_target(&self) -> Option<(&str, &str)> {
        match (self.boot_device.as_deref(), self.boot_image.as_deref()) {
            (Some(device), Some(image)) if !device.is_empty() && !image.is_empty() => {
                Some((device, image))
            }
            _ => None,
        }
    }

    /// Configured minimum flash size in kilobytes.
    pub fn min_flash_kb(&self) -> Option<u64> {
        // Validated in `from_settings`.
        self.min_flash
            .as_deref()
            .and_then(|m| parse_flash_kb(m).ok())
    }
}
