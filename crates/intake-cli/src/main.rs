//! intake - conversational report-schedule client

mod commands;
mod config;
mod plain;
mod ui;
mod user_context;

use clap::Parser;
use intake_api::ChatClient;
use intake_session::SessionConfig;
use intake_tui::Theme;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str =
    "intake=debug,intake_api=debug,intake_session=debug,intake_tui=debug";

/// intake - collect report-schedule details by chatting with the service
#[derive(Parser, Debug)]
#[command(name = "intake")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Chat service base URL (default: http://localhost:8000)
    #[arg(short, long)]
    base_url: Option<String>,

    /// User id sent with every request
    #[arg(short, long)]
    user_id: Option<String>,

    /// Conversation language code
    #[arg(short, long)]
    language: Option<String>,

    /// JSON file holding the user context object
    #[arg(long)]
    context_file: Option<PathBuf>,

    /// Send a single message and print the reply
    #[arg(short = 'c', long)]
    message: Option<String>,

    /// With --message: confirm the conversation afterwards
    #[arg(long, requires = "message")]
    confirm: bool,

    /// With --message: print the final conversation state as JSON
    #[arg(long, requires = "message")]
    json: bool,

    /// Disable TUI mode (use simple stdin/stdout)
    #[arg(long)]
    no_tui: bool,

    /// Check the chat service and exit
    #[arg(long)]
    health: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

fn init_tracing(to_file: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if to_file {
        // The TUI owns the terminal, so logs go to a file
        let path = config::log_path();
        let file = path
            .parent()
            .map(std::fs::create_dir_all)
            .transpose()
            .and_then(|_| {
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
            });
        match file {
            Ok(file) => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init(),
            Err(e) => eprintln!("Could not open log file {}: {}", path.display(), e),
        }
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let cfg = config::Config::load();
    let settings = config::Settings::resolve(
        &cfg,
        config::Overrides {
            base_url: args.base_url,
            user_id: args.user_id,
            language: args.language,
            context_file: args.context_file,
        },
    );

    let one_shot = args.health || args.message.is_some();
    let use_tui = settings.tui && !args.no_tui && !one_shot;

    if args.verbose {
        init_tracing(use_tui);
    }

    tracing::debug!(base_url = %settings.base_url, user_id = %settings.user_id, "Starting");

    let client = ChatClient::new(&settings.base_url)?;

    if args.health {
        return plain::print_health(&client).await;
    }

    let session_config = SessionConfig {
        user_id: settings.user_id.clone(),
        language: settings.language.clone(),
        user_context: user_context::load(&settings.user_context_path),
    };

    // Non-interactive mode
    if let Some(message) = args.message {
        return plain::run_once(&client, session_config, &message, args.confirm, args.json).await;
    }

    // TUI mode
    if use_tui {
        return ui::run_tui(&client, session_config, Theme::named(&settings.theme)).await;
    }

    // Interactive mode (simple stdin/stdout)
    plain::run_interactive(&client, session_config).await
}
