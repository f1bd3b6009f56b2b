//! Cisco IOS command text and output cues.
//!
//! Every command this crate sends and every piece of device output it reacts
//! to is defined here. Dialogues in [`crate::driver`] only assemble these
//! into rules, so teaching the crate a new banner quirk or prompt variant
//! means editing this file and nothing else.
//!
//! # Output Examples
//!
//! ```text
//! Switch#show version
//! System image file is "flash:/c2960-lanbasek9-mz.150-2.SE11.bin"
//! cisco WS-C2960-24TT-L (PowerPC405) processor (revision B0) with 65536K bytes of memory.
//! 65536K bytes of processor board System flash (Read/Write)
//!
//! Switch#dir flash:/
//! Directory of flash:/
//!
//!     2  -rwx        5825   Mar 1 1993 00:03:17 +00:00  config.text
//!     3  drwx         192   Mar 1 1993 00:12:11 +00:00  c2960-lanbasek9-mz.150-2.SE11
//!     7  -rwx        1048   <no date>  multiple-fs
//!
//! Switch#copy tftp://10.0.0.5/c2960.bin flash:c2960.bin
//! Destination filename [c2960.bin]?
//! Accessing tftp://10.0.0.5/c2960.bin...
//! Loading c2960.bin from 10.0.0.5 (via Vlan1): !!!!!!!!!!!!!!!!!!!!
//! [OK - 11832064 bytes]
//!
//! 11832064 bytes copied in 94.213 secs (125589 bytes/sec)
//! ```

use std::sync::LazyLock;

use regex::Regex as TextRegex;
use regex::bytes::Regex;

use crate::channel::Literal;

/// Files that are never deleted.
pub const PROTECTED_FILES: &[&str] = &[
    "config.text",
    "private-config.text",
    "vlan.dat",
    "env_vars",
    "system_env_vars",
    "multiple-fs",
    "info",
    "info.ver",
    "nvram_config",
    "startup-config",
];

/// Check if a path's final component is protected.
pub fn is_protected(path: &str) -> bool {
    let name = path.trim_end_matches('/').rsplit('/').next().unwrap_or(path);
    PROTECTED_FILES.contains(&name)
}

// =============================================================================
// Commands
// =============================================================================

/// Disable paging.
pub const TERMINAL_LENGTH: &str = "terminal length 0";

/// Version report.
pub const SHOW_VERSION: &str = "show version";

/// Reload.
pub const RELOAD: &str = "reload";

/// List one directory. `dir` is relative to the filesystem root and either
/// empty or ends with `/`.
pub fn dir(filesystem: &str, dir: &str) -> String {
    format!("dir {}:/{}", filesystem, dir)
}

/// Forced delete, optionally recursive.
pub fn delete(filesystem: &str, path: &str, recursive: bool) -> String {
    if recursive {
        format!("delete /force /recursive {}:/{}", filesystem, path)
    } else {
        format!("delete /force {}:/{}", filesystem, path)
    }
}

/// Format a filesystem.
pub fn format(filesystem: &str) -> String {
    format!("format {}:", filesystem)
}

/// Reclaim space from deleted files.
pub fn squeeze(filesystem: &str) -> String {
    format!("squeeze {}:", filesystem)
}

/// Classic copy from a server URL.
pub fn copy(url: &str, filesystem: &str, image: &str) -> String {
    format!("copy {} {}:{}", url, filesystem, image)
}

/// Archive-mode install.
pub fn archive_download(url: &str) -> String {
    format!("archive download-sw /overwrite {}", url)
}

/// Checksum an image.
pub fn verify_md5(filesystem: &str, image: &str) -> String {
    format!("verify /md5 {}:{}", filesystem, image)
}

// =============================================================================
// Session cues
// =============================================================================

/// Privileged prompt, captured as `prompt`.
pub static PROMPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?P<prompt>[\w.\-@/:()]{1,63}#)[ \t]*\r?$").unwrap());

/// Device-reported error line.
pub static ERROR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:%[ \t]?(?:Error|Invalid input|Incomplete command|Ambiguous command|Unknown command)|ERROR:)[^\r\n]*\r?\n",
    )
    .unwrap()
});

/// Login helper failure (`Error: TIMEOUT reached`, bad password, ...),
/// captured as `reason`.
pub static LOGIN_ERROR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Error: (?P<reason>[^\r\n]+)\r?\n").unwrap());

/// Pager marker.
pub fn more() -> Literal {
    Literal::new("--More--")
}

/// Generic `[confirm]` question.
pub fn confirm() -> Literal {
    Literal::new("[confirm]")
}

// =============================================================================
// Version report
// =============================================================================

/// `System image file is "..."`, captured as `image`.
pub static VERSION_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"System image file is "(?P<image>[^"\r\n]+)""#).unwrap());

/// `cisco <family> (<processor>) processor ...`, captured as `family` and `processor`.
pub static VERSION_FAMILY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^cisco (?P<family>\S+) \((?P<processor>[^)\r\n]+)\) (?:processor|with)")
        .unwrap()
});

/// `<cpu> CPU at <n>MHz`, captured as `cpu`.
pub static VERSION_CPU: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^(?P<cpu>[\w\-]+) CPU at \d+(?:\.\d+)?[mg]hz").unwrap()
});

/// `<n>K bytes of ... flash`, captured as `flash`. NVRAM lines
/// (`flash-simulated non-volatile configuration memory`) do not match.
pub static VERSION_FLASH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?P<flash>\d+K) bytes of [\w ]*?flash[^\-\w]").unwrap()
});

/// Families whose banner line reports something other than the processor
/// (ISR G2 prints the board revision there). For these the `CPU at` line is
/// authoritative.
pub static CPU_LINE_FAMILIES: LazyLock<Vec<TextRegex>> = LazyLock::new(|| {
    vec![TextRegex::new(r"^CISCO(?:19|29|39)\d\d").unwrap()]
});

/// Check if `family` takes its processor id from the `CPU at` line.
pub fn processor_from_cpu_line(family: &str) -> bool {
    CPU_LINE_FAMILIES.iter().any(|re| re.is_match(family))
}

// =============================================================================
// Directory listing
// =============================================================================

/// One `dir` row, captured as `flags` and `name`.
///
/// Grammar: index, permission flags, optional size, a date or `<no date>`
/// with an optional UTC offset, then the name.
pub static DIR_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*\d+[ \t]+(?P<flags>[-dlrwx]{4,10})[ \t]+(?:\d+[ \t]+)?(?:<no date>|[A-Z][a-z]{2}[ \t]+\d{1,2}[ \t]+\d{4}[ \t]+\d{1,2}:\d{2}:\d{2}(?:\.\d+)?(?:[ \t]+[+-]\d{2}:?\d{2})?)[ \t]+(?P<name>\S+)[ \t]*\r?\n",
    )
    .unwrap()
});

// =============================================================================
// Mutators
// =============================================================================

/// `Delete filename [x]?`
pub static DELETE_FILENAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Delete filename \[[^\]\r\n]*\]\?").unwrap());

/// First format confirmation.
pub static FORMAT_MAY_TAKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Format operation may take a while\. Continue\? \[confirm\]").unwrap()
});

/// Second format confirmation.
pub static FORMAT_DESTROY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"Format operation will destroy all data in "[^"]*"\.\s+Continue\? \[confirm\]"#)
        .unwrap()
});

/// Volume label question some platforms ask after formatting.
pub static FORMAT_VOLUME_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Enter volume ID[^:\r\n]*:").unwrap());

/// Format completion, captured as `formatted`.
pub static FORMAT_DONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Format of (?P<formatted>\S+) complete").unwrap());

/// First squeeze confirmation.
pub static SQUEEZE_MAY_TAKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Squeeze operation may take a while\. Continue\? \[confirm\]").unwrap()
});

/// Second squeeze confirmation.
pub static SQUEEZE_REMOVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"All deleted files will be removed\. Continue\? \[confirm\]").unwrap()
});

/// Squeeze completion, captured as `squeezed`.
pub static SQUEEZE_DONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Squeeze of (?P<squeezed>\S+) complete").unwrap());

// =============================================================================
// Download
// =============================================================================

/// `Erase flash: before copying? [confirm]` (answered no).
pub static COPY_ERASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Erase \S+ before copying\? \[confirm\]").unwrap());

/// `Destination filename [x]?` (default accepted).
pub static COPY_DESTINATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Destination filename \[[^\]\r\n]*\]\?").unwrap());

/// Overwrite question for an existing destination.
pub static COPY_OVERWRITE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Do you want to over ?write\? \[confirm\]").unwrap());

/// Transfer progress markers.
pub static COPY_PROGRESS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!+").unwrap());

/// Archive installer progress lines.
pub static ARCHIVE_PROGRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^(?:Loading|Accessing|examining image|extracting|Installing|Deleting|Writing|Updating)[^\r\n]*\r?\n",
    )
    .unwrap()
});

/// Transfer completion, captured as `complete`.
pub static COPY_DONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<complete>\d+ bytes copied in [\d.]+ secs|All software images installed)")
        .unwrap()
});

// =============================================================================
// Verify / reload
// =============================================================================

/// `verify /md5 (flash:x) = <hash>`, captured as `md5`.
pub static VERIFY_MD5: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"verify /md5 \([^)\r\n]*\) = (?P<md5>[0-9a-fA-F]{32})").unwrap()
});

/// Checksum progress dots.
pub static VERIFY_PROGRESS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{8,}").unwrap());

/// Save-configuration question before a reload.
pub static RELOAD_SAVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Save\? \[yes/no\]:").unwrap());

/// Reload confirmation, captured as `confirmed`.
pub static RELOAD_CONFIRM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<confirmed>Proceed with reload)\? \[confirm\]").unwrap());
