//! Upgrade example: bring a list of Cisco IOS devices to their target image
//!
//! Reads the `defaults` and `profiles` documents from the standard search
//! path (or `--config-dir`), logs in to each host through a login helper and
//! runs the full upgrade sequence.
//!
//! # Prerequisites
//!
//! - A working login helper (`clogin` from RANCID by default) that drops you
//!   at the privileged prompt
//! - A TFTP/FTP/SCP/HTTP server holding the images
//!
//! # Usage
//!
//! ```bash
//! cargo run --example upgrade -- --server 10.0.0.5 --path images sw-core-1 sw-core-2
//! ```
//!
//! Dry reconnaissance of a single switch with verbose dialogue logs:
//! ```bash
//! RUST_LOG=ferrflash=debug cargo run --example upgrade -- --image c2960-lanbasec.bin sw1
//! ```

use std::path::PathBuf;
use std::{env, process};

use ferrflash::config::{ConfigLoader, Settings};
use ferrflash::transport::LoginHelper;
use ferrflash::upgrade::{UpgradeOptions, Upgrader};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.hosts.is_empty() {
        eprintln!("Error: no hosts given");
        Args::print_help();
        process::exit(1);
    }

    let loader = match &args.config_dir {
        Some(dir) => ConfigLoader::new(vec![dir.clone()]),
        None => ConfigLoader::standard(),
    };
    println!("Configuration search path: {:?}", loader.search_path());

    let options = UpgradeOptions::load(&loader, args.overrides.clone())?;
    println!(
        "{} device profile(s), {} host(s)",
        options.profiles.len(),
        args.hosts.len()
    );

    let helper = LoginHelper::new(&args.helper).args(args.helper_args.iter().cloned());
    let upgrader = Upgrader::new(helper, options);

    if let Err(e) = upgrader.run(args.hosts.as_slice()).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    println!("All hosts done.");
    Ok(())
}

/// Simple argument parser (avoiding clap dependency for example)
struct Args {
    hosts: Vec<String>,
    helper: String,
    helper_args: Vec<String>,
    config_dir: Option<PathBuf>,
    overrides: Settings,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut hosts = Vec::new();
        let mut helper = "clogin".to_string();
        let mut helper_args = Vec::new();
        let mut config_dir = None;
        let mut overrides = Settings::default();

        let mut i = 1;
        while i < args.len() {
            // Options taking a value read the next argument.
            let value = |i: &mut usize| -> Option<String> {
                *i += 1;
                args.get(*i).cloned()
            };

            match args[i].as_str() {
                "--helper" => {
                    if let Some(v) = value(&mut i) {
                        helper = v;
                    }
                }
                "--helper-arg" => helper_args.extend(value(&mut i)),
                "--config-dir" | "-c" => config_dir = value(&mut i).map(PathBuf::from),
                "--protocol" => overrides.protocol = value(&mut i),
                "--server" | "-s" => overrides.server = value(&mut i),
                "--path" => overrides.path = value(&mut i),
                "--device" | "-d" => overrides.device = value(&mut i),
                "--image" | "-i" => overrides.target_image = value(&mut i),
                "--boot-device" => overrides.boot_device = value(&mut i),
                "--boot-image" => overrides.boot_image = value(&mut i),
                "--min-flash" => overrides.min_flash = value(&mut i),
                "--md5" => overrides.md5 = value(&mut i),
                "--force" => overrides.force = Some(true),
                "--format" => overrides.format = Some(true),
                "--delete" => overrides.delete = Some(true),
                "--squeeze" => overrides.squeeze = Some(true),
                "--verify" => overrides.verify = Some(true),
                "--reload" => overrides.reload = Some(true),
                "--non-recursive" => overrides.non_recursive = Some(true),
                "--help" | "-h" => {
                    Self::print_help();
                    process::exit(0);
                }
                other if other.starts_with('-') => {
                    eprintln!("Unknown option: {}", other);
                    Self::print_help();
                    process::exit(1);
                }
                host => hosts.push(host.to_string()),
            }
            i += 1;
        }

        Self {
            hosts,
            helper,
            helper_args,
            config_dir,
            overrides,
        }
    }

    fn print_help() {
        println!(
            r#"ferrflash upgrade example

Upgrades Cisco IOS devices to the image their profile names.

USAGE:
    cargo run --example upgrade -- [OPTIONS] <HOST>...

OPTIONS:
    --helper <PROGRAM>       Login helper [default: clogin]
    --helper-arg <ARG>       Extra helper argument (repeatable)
    -c, --config-dir <DIR>   Read defaults/profiles from DIR only
    --protocol <PROTO>       tftp, ftp, scp, http or archive
    -s, --server <HOST>      File server
    --path <DIR>             Image directory on the server
    -d, --device <FS>        Main filesystem [default: flash]
    -i, --image <IMAGE>      Target image
    --boot-device <FS>       Boot filesystem
    --boot-image <IMAGE>     Boot image
    --min-flash <SIZE>       Minimum flash, e.g. 64M
    --md5 <HASH>             Expected md5 of the target image
    --force                  Upload even if the image is present
    --format                 Format before copying
    --delete                 Delete old files before copying
    --squeeze                Squeeze before copying
    --verify                 Verify the md5 after copying
    --reload                 Reload when done
    --non-recursive          List only the top directory
    -h, --help               Print this help message
"#
        );
    }
}
