//! Filesystem mutations, checksum verification and reload.

use log::{debug, info, warn};

use super::{FileEntry, Session};
use crate::channel::Channel;
use crate::dialogue::{DialogueStatus, Rule};
use crate::error::{DialogueError, Result};
use crate::platform::cisco_ios;

impl<C: Channel> Session<C> {
    /// Format `filesystem`, answering both confirmations.
    pub async fn format(&mut self, filesystem: &str) -> Result<()> {
        info!("{}: formatting {}:", self.host(), filesystem);
        let dialogue = self
            .dialogue("format", self.timeouts.format)
            .rule(Rule::new("may-take", cisco_ios::FORMAT_MAY_TAKE.clone()).reply("y"))
            .rule(Rule::new("destroy", cisco_ios::FORMAT_DESTROY.clone()).reply("y"))
            .rule(Rule::new("volume-id", cisco_ios::FORMAT_VOLUME_ID.clone()).reply_line(""))
            .rule(Rule::new("done", cisco_ios::FORMAT_DONE.clone()))
            .rule(self.prompt_rule());

        self.converse(&cisco_ios::format(filesystem), &dialogue)
            .await?
            .resolved()?;
        Ok(())
    }

    /// Squeeze `filesystem`, answering both confirmations.
    pub async fn squeeze(&mut self, filesystem: &str) -> Result<()> {
        info!("{}: squeezing {}:", self.host(), filesystem);
        let dialogue = self
            .dialogue("squeeze", self.timeouts.squeeze)
            .rule(Rule::new("may-take", cisco_ios::SQUEEZE_MAY_TAKE.clone()).reply("y"))
            .rule(Rule::new("remove", cisco_ios::SQUEEZE_REMOVE.clone()).reply("y"))
            .rule(Rule::new("done", cisco_ios::SQUEEZE_DONE.clone()))
            .rule(self.prompt_rule());

        self.converse(&cisco_ios::squeeze(filesystem), &dialogue)
            .await?
            .resolved()?;
        Ok(())
    }

    /// Delete every entry except [`PROTECTED_FILES`](cisco_ios::PROTECTED_FILES).
    pub async fn delete_files(
        &mut self,
        filesystem: &str,
        files: &[FileEntry],
        non_recursive: bool,
    ) -> Result<usize> {
        self.delete_files_except(filesystem, files, non_recursive, cisco_ios::PROTECTED_FILES)
            .await
    }

    /// Delete every entry whose name is not in `protected`, one command per
    /// entry. Returns how many deletes the device accepted.
    ///
    /// With `non_recursive` each entry is removed with `/recursive` so listed
    /// directories go too; otherwise directory entries are skipped. A device error on one entry is logged and the batch
    /// continues; a timeout or a closed channel aborts it.
    pub async fn delete_files_except(
        &mut self,
        filesystem: &str,
        files: &[FileEntry],
        non_recursive: bool,
        protected: &[&str],
    ) -> Result<usize> {
        let dialogue = self
            .dialogue("delete", self.timeouts.delete)
            .rule(Rule::new("filename", cisco_ios::DELETE_FILENAME.clone()).reply_line(""))
            .rule(Rule::new("confirm", cisco_ios::confirm()).reply("y"))
            .rule(self.prompt_rule());

        let mut deleted = 0;
        for entry in files {
            if protected.contains(&entry.name()) {
                debug!("{}: keeping protected {}", self.host(), entry.path);
                continue;
            }
            if entry.is_dir() && !non_recursive {
                continue;
            }

            let command = cisco_ios::delete(filesystem, &entry.path, non_recursive);
            let result = self.converse(&command, &dialogue).await?;
            if let DialogueStatus::Failed(reason) = &result.status {
                warn!(
                    "{}: could not delete {}:/{}: {}",
                    self.host(),
                    filesystem,
                    entry.path,
                    reason
                );
                continue;
            }
            result.resolved()?;
            deleted += 1;
        }

        info!("{}: deleted {} entries from {}:", self.host(), deleted, filesystem);
        Ok(deleted)
    }

    /// Compute the MD5 of `image` on the device.
    ///
    /// When `expected` is given the digests must match (case-insensitively).
    /// Returns the digest the device reported.
    pub async fn verify(
        &mut self,
        filesystem: &str,
        image: &str,
        expected: Option<&str>,
    ) -> Result<String> {
        let dialogue = self
            .dialogue("verify", self.timeouts.verify)
            .rule(Rule::new("md5", cisco_ios::VERIFY_MD5.clone()))
            .rule(Rule::new("progress", cisco_ios::VERIFY_PROGRESS.clone()))
            .rule(self.prompt_rule());

        let result = self
            .converse(&cisco_ios::verify_md5(filesystem, image), &dialogue)
            .await?
            .resolved()?;

        let actual = result
            .field("md5")
            .ok_or_else(|| DialogueError::Failed {
                dialogue: "verify",
                reason: format!("no checksum reported for {}", image),
            })?
            .to_ascii_lowercase();

        if let Some(expected) = expected {
            if !expected.eq_ignore_ascii_case(&actual) {
                return Err(DialogueError::ChecksumMismatch {
                    image: image.to_string(),
                    expected: expected.to_string(),
                    actual,
                }
                .into());
            }
            info!("{}: {} checksum verified", self.host(), image);
        } else {
            info!("{}: {} md5 is {}", self.host(), image, actual);
        }
        Ok(actual)
    }

    /// Reload the device without saving the running configuration.
    ///
    /// The device dropping the session after the reload confirmation is the
    /// expected ending. Returning to the prompt instead is a failure.
    pub async fn reload(&mut self) -> Result<()> {
        info!("{}: reloading", self.host());
        let dialogue = self
            .dialogue("reload", self.timeouts.reload)
            .rule(Rule::new("save", cisco_ios::RELOAD_SAVE.clone()).reply_line("no"))
            .rule(Rule::new("confirm", cisco_ios::RELOAD_CONFIRM.clone()).reply("y"))
            .rule(self.prompt_rule().fail_with("device returned to the prompt without reloading"));

        let result = self.converse(cisco_ios::RELOAD, &dialogue).await?;
        match result.status {
            DialogueStatus::EndOfStream => Ok(()),
            DialogueStatus::Timeout if result.field("confirmed").is_some() => {
                warn!(
                    "{}: reload confirmed but the session stayed open for {:?}",
                    self.host(),
                    result.budget
                );
                Ok(())
            }
            _ => {
                result.resolved()?;
                Ok(())
            }
        }
    }
}
