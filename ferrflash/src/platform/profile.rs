//! Device profiles: configuration overrides selected by device family.

use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;

use crate::config::Settings;
use crate::error::ConfigError;

/// A profile as written in the profiles document.
///
/// The document maps family patterns to entries; the optional `processor`
/// key narrows a pattern to one processor id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileEntry {
    /// Exact processor id the device must report.
    #[serde(default)]
    pub processor: Option<String>,

    /// Overrides applied when this profile is selected.
    #[serde(flatten)]
    pub settings: Settings,
}

/// A compiled profile.
#[derive(Debug, Clone)]
pub struct DeviceProfile {
    /// Unanchored pattern over the device family string.
    pub pattern: Regex,

    /// Optional equality filter on the processor id.
    pub processor: Option<String>,

    /// Overrides applied when this profile is selected.
    pub settings: Settings,
}

impl DeviceProfile {
    /// Create a profile for a family pattern.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            processor: None,
            settings: Settings::default(),
        })
    }

    /// Restrict to one processor id.
    pub fn with_processor(mut self, processor: impl Into<String>) -> Self {
        self.processor = Some(processor.into());
        self
    }

    /// Set the overrides.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Check if this profile applies to a device.
    pub fn matches(&self, family: &str, processor: &str) -> bool {
        if let Some(ref wanted) = self.processor {
            if wanted != processor {
                return false;
            }
        }
        self.pattern.is_match(family)
    }
}

/// Ordered profile table; the first matching profile wins.
#[derive(Debug, Clone, Default)]
pub struct ProfileTable {
    profiles: Vec<DeviceProfile>,
}

impl ProfileTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile document entries, keeping their order.
    pub fn from_entries(entries: IndexMap<String, ProfileEntry>) -> Result<Self, ConfigError> {
        let profiles = entries
            .into_iter()
            .map(|(pattern, entry)| -> Result<DeviceProfile, ConfigError> {
                Ok(DeviceProfile {
                    pattern: Regex::new(&pattern)?,
                    processor: entry.processor,
                    settings: entry.settings,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self { profiles })
    }

    /// Append a profile at the lowest priority.
    pub fn with_profile(mut self, profile: DeviceProfile) -> Self {
        self.profiles.push(profile);
        self
    }

    /// First profile matching `family` and `processor`.
    pub fn lookup(&self, family: &str, processor: &str) -> Option<&DeviceProfile> {
        self.profiles.iter().find(|p| p.matches(family, processor))
    }

    /// Number of profiles.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
