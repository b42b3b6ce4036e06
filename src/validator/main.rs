//! Offline setup checker.
//!
//! Validates the credential file and, optionally, a groups file without
//! opening a connection to Telegram.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use admin_connect::config::{DEFAULT_ENV_FILE, TelegramConfig, load_groups};

/// Setup checker for admin_connect.
#[derive(Parser, Debug)]
#[command(name = "check_setup")]
#[command(about = "Checks credentials and groups files for admin_connect")]
#[command(version)]
struct Args {
    /// Path to the .env file to check.
    #[arg(short, long, default_value = DEFAULT_ENV_FILE)]
    env_file: PathBuf,

    /// Groups file to check as well.
    #[arg(short, long)]
    groups: Option<PathBuf>,

    /// List every group found in the groups file.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut ok = check_credentials(&args.env_file);

    if let Some(path) = &args.groups {
        ok &= check_groups(path, args.verbose);
    }

    println!();
    if ok {
        println!("✓ Setup looks good");
        ExitCode::SUCCESS
    } else {
        println!("✗ Setup has problems");
        ExitCode::FAILURE
    }
}

fn check_credentials(path: &Path) -> bool {
    println!("Checking credentials: {}", path.display());

    match TelegramConfig::from_env_file(path) {
        Ok(config) => {
            println!("  ✓ API_ID: {}", config.api_id);
            println!("  ✓ API_HASH: {}", mask(&config.api_hash));
            println!("  Session file: {}", config.session_path.display());
            true
        }
        Err(e) => {
            println!("  ✗ {e}");
            println!("  Get your API credentials from: https://my.telegram.org/apps");
            false
        }
    }
}

fn check_groups(path: &Path, verbose: bool) -> bool {
    println!("Checking groups file: {}", path.display());

    match load_groups(path) {
        Ok(groups) if groups.is_empty() => {
            println!("  ✗ No groups found");
            false
        }
        Ok(groups) => {
            println!("  ✓ {} groups", groups.len());
            if verbose {
                for group in &groups {
                    println!("    - {group}");
                }
            }

            let mut seen = std::collections::HashSet::new();
            let duplicates: Vec<&String> = groups.iter().filter(|g| !seen.insert(*g)).collect();
            if !duplicates.is_empty() {
                println!(
                    "  ⚠ Listed more than once (each will be fetched again): {}",
                    duplicates
                        .iter()
                        .map(|g| g.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            true
        }
        Err(e) => {
            println!("  ✗ {e}");
            false
        }
    }
}

/// Shows only the first and last two characters of a secret.
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_owned();
    }
    format!(
        "{}{}…{}",
        chars[0],
        chars[1],
        chars[chars.len() - 2..].iter().collect::<String>()
    )
}
