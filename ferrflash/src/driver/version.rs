//! `show version` inspection.

use log::{debug, info};

use super::Session;
use crate::channel::Channel;
use crate::dialogue::Rule;
use crate::error::Result;
use crate::platform::cisco_ios;

/// Placeholder for anything the version report did not reveal.
pub const UNKNOWN: &str = "unknown";

/// What the device says about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    /// Running image as reported, e.g. `flash:/c2960-lanbasek9-mz.150-2.SE11.bin`.
    pub image: String,
    /// Platform family, e.g. `WS-C2960-24TT-L`.
    pub family: String,
    /// Processor id used for profile selection.
    pub processor: String,
    /// Flash size with its unit, e.g. `65536K`.
    pub flash_size: String,
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self {
            image: UNKNOWN.to_string(),
            family: UNKNOWN.to_string(),
            processor: UNKNOWN.to_string(),
            flash_size: UNKNOWN.to_string(),
        }
    }
}

impl<C: Channel> Session<C> {
    /// Run `show version` and extract image, family, processor and flash size.
    ///
    /// The prompt only ends the dialogue once both image and family have been
    /// seen. For families listed in
    /// [`CPU_LINE_FAMILIES`](cisco_ios::CPU_LINE_FAMILIES) the `CPU at` line
    /// overrides the processor from the family line.
    pub async fn inspect_version(&mut self) -> Result<VersionInfo> {
        let dialogue = self
            .dialogue("version", self.timeouts.version)
            .rule(Rule::new("image", cisco_ios::VERSION_IMAGE.clone()))
            .rule(Rule::new("family", cisco_ios::VERSION_FAMILY.clone()))
            .rule(Rule::new("cpu", cisco_ios::VERSION_CPU.clone()))
            .rule(Rule::new("flash", cisco_ios::VERSION_FLASH.clone()))
            .rule(self.prompt_rule().resolve_when(&["image", "family"]));

        let result = self
            .converse(cisco_ios::SHOW_VERSION, &dialogue)
            .await?
            .resolved()?;

        let field = |name: &str| result.field(name).map(str::to_string);
        let family = field("family").unwrap_or_else(|| UNKNOWN.to_string());
        let processor = match field("cpu") {
            Some(cpu) if cisco_ios::processor_from_cpu_line(&family) => {
                debug!("{}: processor {} taken from CPU line", self.host(), cpu);
                cpu
            }
            _ => field("processor").unwrap_or_else(|| UNKNOWN.to_string()),
        };

        let info = VersionInfo {
            image: field("image").unwrap_or_else(|| UNKNOWN.to_string()),
            family,
            processor,
            flash_size: field("flash").unwrap_or_else(|| UNKNOWN.to_string()),
        };
        info!(
            "{}: {} ({}) running {} with {} flash",
            self.host(),
            info.family,
            info.processor,
            info.image,
            info.flash_size
        );
        Ok(info)
    }
}
