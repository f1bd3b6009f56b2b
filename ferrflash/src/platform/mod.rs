//! Platform knowledge: Cisco IOS cues and per-family device profiles.
//!
//! [`cisco_ios`] holds the command text and output patterns; [`ProfileTable`]
//! selects configuration overrides by the family and processor a device
//! reports in `show version`.

pub mod cisco_ios;
mod profile;

pub use profile::{DeviceProfile, ProfileEntry, ProfileTable};
