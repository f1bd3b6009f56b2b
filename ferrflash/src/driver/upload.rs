//! Getting an image onto a device filesystem.

use log::{info, warn};

use super::{FileEntry, Session};
use crate::channel::Channel;
use crate::config::EffectiveConfig;
use crate::dialogue::Rule;
use crate::error::{DialogueError, Result};
use crate::platform::cisco_ios;

impl<C: Channel> Session<C> {
    /// Upload `image` to `filesystem` as `config` describes.
    ///
    /// Archive mode hands everything to `archive download-sw /overwrite`.
    /// Otherwise the filesystem is prepared first (format when `do_format`,
    /// else deletion of `files` when `config.delete`), optionally squeezed,
    /// then the image is copied and, with `config.verify`, checksummed. The
    /// configured md5 only applies to the main target image.
    pub async fn upload(
        &mut self,
        config: &EffectiveConfig,
        image: &str,
        filesystem: &str,
        files: &[FileEntry],
        do_format: bool,
    ) -> Result<()> {
        let url = config.image_url(image)?;

        if config.protocol.is_archive() {
            info!("{}: installing {} via archive download", self.host(), url);
            return self.download(&cisco_ios::archive_download(&url), image).await;
        }

        if do_format {
            self.format(filesystem).await?;
        } else if config.delete {
            self.delete_files(filesystem, files, config.non_recursive)
                .await?;
        }

        if config.squeeze {
            self.squeeze(filesystem).await?;
        }

        info!("{}: copying {} to {}:", self.host(), url, filesystem);
        self.download(&cisco_ios::copy(&url, filesystem, image), image)
            .await?;

        if config.verify {
            let expected = match config.target_image.as_deref() {
                Some(target) if target == image => config.md5.as_deref(),
                _ => None,
            };
            self.verify(filesystem, image, expected).await?;
        }
        Ok(())
    }

    /// Run a transfer command until the prompt returns.
    ///
    /// Every progress marker restarts the download budget, so a slow but
    /// moving transfer never times out. Returning to the prompt without a
    /// completion banner is an [`IncompleteTransfer`](DialogueError::IncompleteTransfer).
    async fn download(&mut self, command: &str, image: &str) -> Result<()> {
        let dialogue = self
            .dialogue("download", self.timeouts.download)
            .rule(Rule::new("erase", cisco_ios::COPY_ERASE.clone()).reply("n"))
            .rule(Rule::new("destination", cisco_ios::COPY_DESTINATION.clone()).reply_line(""))
            .rule(Rule::new("overwrite", cisco_ios::COPY_OVERWRITE.clone()).reply("y"))
            .rule(Rule::new("done", cisco_ios::COPY_DONE.clone()).keep_alive())
            .rule(Rule::new("archive-progress", cisco_ios::ARCHIVE_PROGRESS.clone()).keep_alive())
            .rule(Rule::new("progress", cisco_ios::COPY_PROGRESS.clone()).keep_alive())
            .rule(self.prompt_rule());

        let result = self.converse(command, &dialogue).await?.resolved()?;

        match result.field("complete") {
            Some(banner) => {
                info!("{}: {} transferred ({})", self.host(), image, banner);
                Ok(())
            }
            None => {
                warn!("{}: prompt returned before {} finished", self.host(), image);
                Err(DialogueError::IncompleteTransfer {
                    image: image.to_string(),
                }
                .into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::Error;
    use crate::channel::mock::{Event, ScriptedChannel, logged_in};
    use crate::config::Settings;
    use crate::driver::Timeouts;
    use crate::error::ConfigError;

    const COPY: &str = "copy tftp://10.0.0.5/c2960.bin flash:c2960.bin";

    async fn session(channel: ScriptedChannel) -> Session<ScriptedChannel> {
        Session::open(channel, "sw1", Timeouts::default()).await.unwrap()
    }

    fn config(overrides: Settings) -> EffectiveConfig {
        let defaults = Settings {
            server: Some("10.0.0.5".into()),
            target_image: Some("c2960.bin".into()),
            ..Default::default()
        };
        EffectiveConfig::merge(&defaults, None, &overrides).unwrap()
    }

    fn copy_events() -> Vec<Event> {
        vec![
            Event::text("copy tftp://10.0.0.5/c2960.bin flash:c2960.bin\r\nDestination filename [c2960.bin]? "),
        ]
    }

    fn transfer_events() -> Vec<Event> {
        vec![
            Event::text("\r\nAccessing tftp://10.0.0.5/c2960.bin...\r\nLoading c2960.bin from 10.0.0.5 (via Vlan1): "),
            Event::text("!!!!!!!!!!"),
            Event::text("\r\n[OK - 11832064 bytes]\r\n\r\n11832064 bytes copied in 94.213 secs (125589 bytes/sec)\r\nSwitch#"),
        ]
    }

    #[tokio::test(start_paused = true)]
    async fn test_plain_copy() {
        let channel = logged_in("Switch#")
            .on_events(COPY, copy_events())
            .on_events("", transfer_events());
        let transcript = channel.transcript();
        let mut session = session(channel).await;

        session
            .upload(&config(Settings::default()), "c2960.bin", "flash", &[], false)
            .await
            .unwrap();

        assert_eq!(transcript.sent(), vec!["terminal length 0", COPY, ""]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_keeps_long_transfer_alive() {
        let mut transfer = vec![Event::text("\r\nLoading c2960.bin from 10.0.0.5 (via Vlan1): ")];
        for _ in 0..20 {
            transfer.push(Event::Delay(Duration::from_secs(300)));
            transfer.push(Event::text("!!!!"));
        }
        transfer.push(Event::text(
            "\r\n11832064 bytes copied in 6000.1 secs (1972 bytes/sec)\r\nSwitch#",
        ));

        let channel = logged_in("Switch#")
            .on_events(COPY, copy_events())
            .on_events("", transfer);
        let mut session = session(channel).await;

        session
            .upload(&config(Settings::default()), "c2960.bin", "flash", &[], false)
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_transfer_times_out() {
        let channel = logged_in("Switch#")
            .on_events(COPY, copy_events())
            .on("", "\r\nLoading c2960.bin from 10.0.0.5 (via Vlan1): !!!!");
        let mut session = session(channel).await;

        let err = session
            .upload(&config(Settings::default()), "c2960.bin", "flash", &[], false)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Dialogue(DialogueError::Timeout { dialogue: "download", .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_prompt_without_banner_is_incomplete() {
        let channel = logged_in("Switch#")
            .on_events(COPY, copy_events())
            .on("", "\r\nLoading c2960.bin from 10.0.0.5 (via Vlan1): !!\r\nSwitch#");
        let mut session = session(channel).await;

        let err = session
            .upload(&config(Settings::default()), "c2960.bin", "flash", &[], false)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Dialogue(DialogueError::IncompleteTransfer { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_fails() {
        let channel = logged_in("Switch#")
            .on_events(COPY, copy_events())
            .on(
                "",
                "\r\nAccessing tftp://10.0.0.5/c2960.bin...\r\n%Error opening tftp://10.0.0.5/c2960.bin (Timed out)\r\nSwitch#",
            );
        let mut session = session(channel).await;

        let err = session
            .upload(&config(Settings::default()), "c2960.bin", "flash", &[], false)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Dialogue(DialogueError::Failed { dialogue: "download", .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_archive_mode_sends_one_command() {
        let command = "archive download-sw /overwrite tftp://10.0.0.5/c2960.tar";
        let channel = logged_in("Switch#").on(
            command,
            "archive download-sw /overwrite tftp://10.0.0.5/c2960.tar\r\n\
Loading c2960.tar from 10.0.0.5 (via Vlan1): !!!!!!!!\r\n\
examining image...\r\n\
extracting info (110 bytes)\r\n\
Installing (renaming): `flash:update/c2960-lanbasek9-mz.150-2.SE11' ->\r\n\
New software image installed in flash:/c2960-lanbasek9-mz.150-2.SE11\r\n\
All software images installed.\r\n\
Switch#",
        );
        let transcript = channel.transcript();
        let mut session = session(channel).await;

        let config = config(Settings {
            protocol: Some("archive".into()),
            target_image: Some("c2960.tar".into()),
            delete: Some(true),
            ..Default::default()
        });
        session
            .upload(&config, "c2960.tar", "flash", &[], false)
            .await
            .unwrap();

        assert_eq!(transcript.sent(), vec!["terminal length 0", command]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_squeeze_copy_verify_sequence() {
        let channel = logged_in("Switch#")
            .on("delete /force flash:/old.bin", "delete /force flash:/old.bin\r\nSwitch#")
            .on(
                "squeeze flash:",
                "squeeze flash:\r\nAll deleted files will be removed. Continue? [confirm]",
            )
            .on("y", "\r\nSqueeze of flash: complete\r\nSwitch#")
            .on_events(COPY, copy_events())
            .on_events("", transfer_events())
            .on(
                "verify /md5 flash:c2960.bin",
                "verify /md5 flash:c2960.bin\r\n........Done!\r\nverify /md5 (flash:c2960.bin) = 0123456789abcdef0123456789abcdef\r\nSwitch#",
            );
        let transcript = channel.transcript();
        let mut session = session(channel).await;

        let config = config(Settings {
            delete: Some(true),
            squeeze: Some(true),
            verify: Some(true),
            md5: Some("0123456789ABCDEF0123456789ABCDEF".into()),
            ..Default::default()
        });
        let files = [
            FileEntry {
                path: "old.bin".into(),
                flags: "-rwx".into(),
            },
            FileEntry {
                path: "vlan.dat".into(),
                flags: "-rwx".into(),
            },
        ];
        session
            .upload(&config, "c2960.bin", "flash", &files, false)
            .await
            .unwrap();

        assert_eq!(
            transcript.sent(),
            vec![
                "terminal length 0",
                "delete /force flash:/old.bin",
                "squeeze flash:",
                "y",
                COPY,
                "",
                "verify /md5 flash:c2960.bin"
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_format_replaces_delete() {
        let channel = logged_in("Switch#")
            .on(
                "format flash:",
                "format flash:\r\nFormat operation may take a while. Continue? [confirm]",
            )
            .on("y", "\r\nFormat of flash: complete\r\nSwitch#")
            .on_events(COPY, copy_events())
            .on_events("", transfer_events());
        let transcript = channel.transcript();
        let mut session = session(channel).await;

        let config = config(Settings {
            delete: Some(true),
            ..Default::default()
        });
        let files = [FileEntry {
            path: "old.bin".into(),
            flags: "-rwx".into(),
        }];
        session
            .upload(&config, "c2960.bin", "flash", &files, true)
            .await
            .unwrap();

        assert!(transcript.sent_starting_with("delete").is_empty());
        assert_eq!(transcript.sent_starting_with("format").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_server() {
        let mut session = session(logged_in("Switch#")).await;
        let config = EffectiveConfig::merge(&Settings::default(), None, &Settings::default()).unwrap();

        let err = session
            .upload(&config, "c2960.bin", "flash", &[], false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::MissingServer)));
    }
}
