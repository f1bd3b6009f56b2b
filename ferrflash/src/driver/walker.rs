//! Filesystem enumeration over `dir`.

use std::collections::VecDeque;

use log::{debug, info};

use super::Session;
use crate::channel::Channel;
use crate::dialogue::Rule;
use crate::error::Result;
use crate::platform::cisco_ios;

/// One listed file or directory, relative to the filesystem root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path relative to the filesystem root, e.g. `html/index.htm`.
    pub path: String,
    /// Permission flags as listed, e.g. `-rwx` or `drwx`.
    pub flags: String,
}

impl FileEntry {
    /// Check if the entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.flags.starts_with('d')
    }

    /// Final path component.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Result of walking a filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    /// Files found, parents before children. Directories are only listed
    /// as entries in non-recursive mode.
    Entries(Vec<FileEntry>),
    /// The target image is already present and `force` is off.
    AlreadyCurrent,
}

impl<C: Channel> Session<C> {
    /// List `filesystem`, looking for `target_image`.
    ///
    /// Directories are listed one at a time; a subdirectory's `dir` is only
    /// sent after its parent's listing has returned to the prompt. With
    /// `non_recursive` only the root is listed and directories come back as
    /// entries; otherwise only files are returned. When a row names
    /// `target_image` and `force` is off the walk stops with
    /// [`Listing::AlreadyCurrent`] before any further command.
    ///
    /// A listing that times out or reports an error surfaces as `Err`.
    pub async fn list_files(
        &mut self,
        filesystem: &str,
        target_image: &str,
        force: bool,
        non_recursive: bool,
    ) -> Result<Listing> {
        let dialogue = self
            .dialogue("listing", self.timeouts.listing)
            .rule(Rule::new("row", cisco_ios::DIR_ROW.clone()).record())
            .rule(self.prompt_rule());

        let mut pending = VecDeque::from([String::new()]);
        let mut entries = Vec::new();

        while let Some(dir) = pending.pop_front() {
            let result = self
                .converse(&cisco_ios::dir(filesystem, &dir), &dialogue)
                .await?
                .resolved()?;
            debug!(
                "{}: {}:/{} has {} entries",
                self.host(),
                filesystem,
                dir,
                result.records.len()
            );

            let mut subdirs = Vec::new();
            for row in &result.records {
                let (Some(name), Some(flags)) = (row.get("name"), row.get("flags")) else {
                    continue;
                };

                if name == target_image && !force {
                    info!(
                        "{}: {} already present on {}:",
                        self.host(),
                        target_image,
                        filesystem
                    );
                    return Ok(Listing::AlreadyCurrent);
                }

                let entry = FileEntry {
                    path: format!("{}{}", dir, name),
                    flags: flags.clone(),
                };
                if entry.is_dir() && !non_recursive {
                    subdirs.push(format!("{}/", entry.path));
                } else {
                    entries.push(entry);
                }
            }
            pending.extend(subdirs);
        }

        Ok(Listing::Entries(entries))
    }
}
