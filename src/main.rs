//! Admin Connect - Main Entry Point
//!
//! Interactive console tool that fetches the administrators of Telegram
//! groups, messages them and exports the list.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};
use dialoguer::{Confirm, Input, Password, Select};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use admin_connect::broadcast::ExportFormat;
use admin_connect::commands::{CommandHandler, CommandResult, MenuCommand, MenuOption};
use admin_connect::config::{AppSettings, ConfigError, DEFAULT_ENV_FILE, TelegramConfig};
use admin_connect::roster::{GroupSession, format_count};
use admin_connect::telegram::{TelegramClient, TelegramError};

/// Fetch, message and export Telegram group admins.
#[derive(Parser, Debug)]
#[command(name = "admin_connect")]
#[command(about = "Fetch, message and export the admins of Telegram groups")]
#[command(version)]
struct Args {
    /// Path to the .env file holding API_ID and API_HASH.
    #[arg(long, default_value = DEFAULT_ENV_FILE)]
    env_file: PathBuf,

    /// Path to the session file (overrides SESSION_PATH).
    #[arg(short, long)]
    session: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Defaults to LOG_LEVEL.
    #[arg(short, long)]
    log_level: Option<String>,

    /// Keep the terminal contents instead of clearing the screen on start.
    #[arg(long)]
    no_clear: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Loading the env file exports its variables, so settings come after it.
    let mut tg_config = match TelegramConfig::from_env_file(&args.env_file) {
        Ok(config) => config,
        Err(e) => {
            print_config_help(&e);
            return Err(e).context("Invalid Telegram configuration");
        }
    };
    if let Some(session) = args.session {
        tg_config = tg_config.with_session_path(session);
    }

    let settings = AppSettings::from_env_with_defaults();
    init_logging(args.log_level.as_deref().unwrap_or(&settings.log_level));
    debug!("Settings: {:?}", settings);

    if !args.no_clear
        && let Err(e) = clear_screen()
    {
        debug!("Could not clear screen: {}", e);
    }

    let client = Arc::new(
        TelegramClient::connect(&tg_config)
            .await
            .context("Failed to connect to Telegram")?,
    );

    if !client
        .is_authorized()
        .await
        .context("Failed to check authorization")?
    {
        authenticate(&client, &tg_config).await?;
    }

    let mut handler = CommandHandler::new(Arc::clone(&client), settings.send_delay());

    let mut interrupted = false;
    let result = tokio::select! {
        result = run_menu(&mut handler, &settings) => result,
        _ = tokio::signal::ctrl_c() => {
            interrupted = true;
            println!("\n{}", "Process interrupted by user".yellow());
            Ok(())
        }
    };

    info!("Shutting down...");
    client.disconnect();

    if interrupted {
        // A prompt thread may still be blocked on stdin and the runtime
        // would wait for it on drop.
        std::process::exit(0);
    }

    result
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn clear_screen() -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    execute!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;
    stdout.flush()
}

/// Runs a blocking prompt off the async runtime.
async fn prompt<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> dialoguer::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .context("Prompt task failed")?
        .context("Failed to read input")
}

/// Main menu loop. Returns when the user chooses to exit.
async fn run_menu(
    handler: &mut CommandHandler<TelegramClient>,
    settings: &AppSettings,
) -> Result<()> {
    loop {
        let has_group = handler.has_group();
        if let Some(session) = handler.session() {
            print_status(session);
        }
        print_menu(has_group);

        let choice: String = prompt(move || {
            Input::<String>::new()
                .with_prompt("Select option")
                .validate_with(move |input: &String| -> Result<(), String> {
                    MenuOption::parse(input, has_group)
                        .map(|_| ())
                        .ok_or_else(|| "Unknown option".to_owned())
                })
                .interact_text()
        })
        .await?;

        let Some(option) = MenuOption::parse(&choice, has_group) else {
            continue;
        };

        let command = match option {
            MenuOption::Exit => break,
            MenuOption::FetchGroup => {
                let group: String = prompt(|| {
                    Input::<String>::new()
                        .with_prompt("Enter Telegram group link or username")
                        .interact_text()
                })
                .await?;
                MenuCommand::FetchGroup(group)
            }
            MenuOption::LoadGroups => {
                let path: String = prompt(|| {
                    Input::<String>::new()
                        .with_prompt("Enter path to groups file (one group per line)")
                        .interact_text()
                })
                .await?;
                MenuCommand::LoadGroups(PathBuf::from(path.trim()))
            }
            MenuOption::SendMessage => {
                // Without a group the handler rejects the command outright.
                let message = if has_group {
                    prompt(|| {
                        Input::<String>::new()
                            .with_prompt("Enter message to send to admins")
                            .allow_empty(true)
                            .interact_text()
                    })
                    .await?
                } else {
                    String::new()
                };
                MenuCommand::SendMessage(message)
            }
            MenuOption::Export => {
                let labels: Vec<&'static str> =
                    ExportFormat::ALL.iter().map(|f| f.extension()).collect();
                let index = prompt(move || {
                    Select::new()
                        .with_prompt("Export format")
                        .items(&labels)
                        .default(0)
                        .interact()
                })
                .await?;
                MenuCommand::Export(ExportFormat::ALL[index])
            }
            MenuOption::Save => {
                let default = settings.default_save_path.display().to_string();
                let path: String = prompt(move || {
                    Input::<String>::new()
                        .with_prompt("Enter filename to save")
                        .default(default)
                        .interact_text()
                })
                .await?;
                MenuCommand::Save(PathBuf::from(path.trim()))
            }
            MenuOption::LeaveGroup => MenuCommand::LeaveGroup,
        };

        if matches!(command, MenuCommand::FetchGroup(_) | MenuCommand::LoadGroups(_)) {
            println!("\n{}", "Fetching group info...".yellow());
        }

        let result = handler
            .execute(command, |line| println!("  {line}"))
            .await;
        print_result(&result);

        let keep_going = prompt(|| {
            Confirm::new()
                .with_prompt("Continue?")
                .default(true)
                .interact()
        })
        .await?;
        if !keep_going {
            break;
        }
    }

    Ok(())
}

fn print_panel(title: &str, lines: &[String]) {
    let width = lines
        .iter()
        .map(|line| line.chars().count())
        .chain(std::iter::once(title.chars().count() + 2))
        .max()
        .unwrap_or(0)
        + 2;

    let title_fill = width.saturating_sub(title.chars().count() + 2);
    println!(
        "{}",
        format!("╭─ {title} {}╮", "─".repeat(title_fill.saturating_sub(1))).blue()
    );
    for line in lines {
        let pad = width - line.chars().count();
        println!("{} {line}{}{}", "│".blue(), " ".repeat(pad - 1), "│".blue());
    }
    println!("{}", format!("╰{}╯", "─".repeat(width)).blue());
}

fn print_status(session: &GroupSession) {
    print_panel(
        "Group Status",
        &[
            format!("Current Group: {}", session.group),
            format!("Title: {}", session.title),
            format!("Total Members: {}", format_count(session.member_count)),
            format!("Total Admins: {}", session.admin_count()),
            format!(
                "Fetched: {}",
                session.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
        ],
    );
}

fn print_menu(has_group: bool) {
    let lines: Vec<String> = MenuOption::available(has_group)
        .iter()
        .map(|option| format!("  {option}"))
        .collect();
    print_panel("Telegram Admin Connect", &lines);
}

fn print_result(result: &CommandResult) {
    if result.success {
        println!("{}", result.message.as_str().green());
    } else {
        println!("{}", result.message.as_str().red());
    }
}

fn print_config_help(error: &ConfigError) {
    let title = match error {
        ConfigError::MissingEnvFile(_) => "Missing Configuration",
        _ => "Invalid Configuration",
    };
    print_panel(
        title,
        &[
            format!("ERROR: {error}"),
            String::new(),
            "Please create a .env file with the following content:".to_owned(),
            "API_ID=your_api_id".to_owned(),
            "API_HASH=your_api_hash".to_owned(),
            String::new(),
            "Get your API credentials from:".to_owned(),
            "https://my.telegram.org/apps".to_owned(),
        ],
    );
}

/// Handles Telegram authentication.
async fn authenticate(client: &TelegramClient, config: &TelegramConfig) -> Result<()> {
    info!("Authentication required");

    let phone: String = prompt(|| {
        Input::<String>::new()
            .with_prompt("Enter your phone number (with country code)")
            .interact_text()
    })
    .await?;

    let token = client
        .request_login_code(&phone, &config.api_hash)
        .await
        .context("Failed to request login code")?;

    println!("Login code sent to your Telegram app");

    let code: String = prompt(|| {
        Input::<String>::new()
            .with_prompt("Enter the login code")
            .interact_text()
    })
    .await?;

    match client.sign_in(&token, &code).await {
        Ok(()) => {
            println!("{}", "Successfully signed in!".green());
            Ok(())
        }
        Err(TelegramError::PasswordRequired(password_token)) => {
            let hint = password_token.hint().unwrap_or("no hint").to_owned();
            println!("Two-factor authentication is enabled (hint: {hint})");

            let password: String = prompt(|| {
                Password::new()
                    .with_prompt("Enter your 2FA password")
                    .interact()
            })
            .await?;

            client
                .check_password(password_token, &password)
                .await
                .context("2FA authentication failed")?;

            println!("{}", "Successfully signed in with 2FA!".green());
            Ok(())
        }
        Err(e) => Err(e).context("Authentication failed"),
    }
}
