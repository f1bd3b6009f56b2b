//! Locating and reading the two configuration documents.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::debug;
use serde::de::DeserializeOwned;

use super::Settings;
use crate::error::{ConfigError, Result};
use crate::platform::{ProfileEntry, ProfileTable};

/// Name of the flat defaults document.
pub const DEFAULTS_DOCUMENT: &str = "defaults";

/// Name of the device profile table document.
pub const PROFILES_DOCUMENT: &str = "profiles";

/// Environment variable naming one extra configuration directory.
pub const CONFIG_DIR_ENV: &str = "FERRFLASH_CONFIG_DIR";

/// Extension tried after the bare document name.
const EXTENSION: &str = "json";

/// Finds configuration documents along an ordered search path.
///
/// For each directory the bare name is tried first, then the name with a
/// `.json` extension. The first file that can be opened wins; a document that
/// is found nowhere is treated as an empty layer.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    search_path: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Create a loader with an explicit search path.
    pub fn new(search_path: Vec<PathBuf>) -> Self {
        Self { search_path }
    }

    /// User config directory, then `/etc/ferrflash`, then `$FERRFLASH_CONFIG_DIR`.
    pub fn standard() -> Self {
        let mut search_path = Vec::new();
        if let Some(dir) = dirs::config_dir() {
            search_path.push(dir.join("ferrflash"));
        }
        search_path.push(PathBuf::from("/etc/ferrflash"));
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            search_path.push(PathBuf::from(dir));
        }
        Self::new(search_path)
    }

    /// The directories searched, in order.
    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    /// Find the first readable candidate for `name`.
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        self.search_path
            .iter()
            .flat_map(|dir| [dir.join(name), dir.join(format!("{}.{}", name, EXTENSION))])
            .find(|candidate| candidate.is_file() && File::open(candidate).is_ok())
    }

    /// Load the defaults document.
    pub fn load_defaults(&self) -> Result<Settings> {
        Ok(self.read_document(DEFAULTS_DOCUMENT)?.unwrap_or_default())
    }

    /// Load the device profile table.
    pub fn load_profiles(&self) -> Result<ProfileTable> {
        let entries: Option<IndexMap<String, ProfileEntry>> =
            self.read_document(PROFILES_DOCUMENT)?;
        match entries {
            Some(entries) => Ok(ProfileTable::from_entries(entries)?),
            None => Ok(ProfileTable::new()),
        }
    }

    fn read_document<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let Some(path) = self.locate(name) else {
            debug!("no '{}' document on {:?}", name, self.search_path);
            return Ok(None);
        };
        debug!("reading '{}' from {}", name, path.display());
        read_json(&path).map(Some)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value = serde_json::from_reader(BufReader::new(file)).map_err(|source| {
        ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        }
    })?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_missing_documents_are_empty_layers() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ConfigLoader::new(vec![dir.path().to_path_buf()]);

        assert_eq!(loader.load_defaults().unwrap(), Settings::default());
        assert!(loader.load_profiles().unwrap().is_empty());
    }

    #[test]
    fn test_bare_name_before_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("defaults"), r#"{"server": "bare"}"#).unwrap();
        fs::write(dir.path().join("defaults.json"), r#"{"server": "json"}"#).unwrap();

        let loader = ConfigLoader::new(vec![dir.path().to_path_buf()]);
        assert_eq!(loader.load_defaults().unwrap().server.as_deref(), Some("bare"));
    }

    #[test]
    fn test_earlier_directory_wins() {
        let user = tempfile::tempdir().unwrap();
        let system = tempfile::tempdir().unwrap();
        fs::write(user.path().join("defaults.json"), r#"{"device": "bootflash"}"#).unwrap();
        fs::write(system.path().join("defaults"), r#"{"device": "flash"}"#).unwrap();

        let loader =
            ConfigLoader::new(vec![user.path().to_path_buf(), system.path().to_path_buf()]);
        assert_eq!(
            loader.locate(DEFAULTS_DOCUMENT).unwrap(),
            user.path().join("defaults.json")
        );
        assert_eq!(
            loader.load_defaults().unwrap().device.as_deref(),
            Some("bootflash")
        );
    }

    #[test]
    fn test_profiles_keep_document_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("profiles.json"),
            r#"{
                "WS-C2960X": {"target_image": "c2960x.bin"},
                "WS-C2960": {"target_image": "c2960.bin", "processor": "PowerPC405"},
                "WS-C29": {"target_image": "generic.bin"}
            }"#,
        )
        .unwrap();

        let table = ConfigLoader::new(vec![dir.path().to_path_buf()])
            .load_profiles()
            .unwrap();
        assert_eq!(table.len(), 3);

        let hit = table.lookup("WS-C2960-24TT-L", "PowerPC405").unwrap();
        assert_eq!(hit.settings.target_image.as_deref(), Some("c2960.bin"));

        let hit = table.lookup("WS-C2960-24TT-L", "PowerPC440").unwrap();
        assert_eq!(hit.settings.target_image.as_deref(), Some("generic.bin"));
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("defaults"), "{not json").unwrap();

        let err = ConfigLoader::new(vec![dir.path().to_path_buf()])
            .load_defaults()
            .unwrap_err();
        assert!(err.to_string().contains("defaults"));
    }

    #[test]
    fn test_invalid_profile_pattern() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("profiles"), r#"{"WS-C(29": {}}"#).unwrap();

        let err = ConfigLoader::new(vec![dir.path().to_path_buf()])
            .load_profiles()
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Config(ConfigError::InvalidPattern(_))
        ));
    }
}
