use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use openchat::ui::{self, conversation::ConversationManager};
use openchat::{Config, ConversationStore, SharedStore};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "openchat")]
#[command(version)]
#[command(about = "Terminal chat client with in-memory conversation history", long_about = None)]
struct Cli {
    /// Path to the config file (defaults to ~/.openchat/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "openchat=trace"
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat line by line on stdin/stdout
    Repl,
    /// Print the effective configuration
    Config {
        /// Write the effective configuration to the config file if it does not exist yet
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_from(&config_path)?;
    let level = cli.log_level.as_deref().unwrap_or(&config.log.level);

    match cli.command {
        None => {
            init_file_logging(level, &config.log_file())?;
            let mut manager = build_manager(&config)?;
            ui::app::run(&mut manager)
        }
        Some(Commands::Repl) => {
            init_stderr_logging(level);
            let mut manager = build_manager(&config)?;
            ui::repl::run(&mut manager, io::stdin().lock(), io::stdout().lock())
        }
        Some(Commands::Config { init }) => {
            init_stderr_logging(level);
            if init {
                write_config(&config, &config_path)?;
            }
            print_config(&config, &config_path)
        }
    }
}

fn build_manager(config: &Config) -> Result<ConversationManager> {
    let store = ConversationStore::with_name_format(config.name_format.as_str())
        .context("Failed to create conversation store")?;
    info!(name_format = %config.name_format, "Conversation store ready");
    Ok(ConversationManager::new(SharedStore::new(store), config))
}

fn write_config(config: &Config, path: &Path) -> Result<()> {
    if path.exists() {
        info!(path = %path.display(), "Config file already exists, leaving it untouched");
        return Ok(());
    }
    config.save_to(path)?;
    info!(path = %path.display(), "Wrote config file");
    Ok(())
}

fn print_config(config: &Config, path: &Path) -> Result<()> {
    let source = if path.exists() { "" } else { " (not found, using defaults)" };
    println!("# {}{}", path.display(), source);
    println!(
        "{}",
        toml::to_string_pretty(config).context("Failed to serialize config")?
    );
    println!("# log file: {}", config.log_file().display());
    Ok(())
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

fn init_stderr_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(io::stderr)
        .init();
}

// The terminal UI owns stdout and stderr, so logs go to a file.
fn init_file_logging(level: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create log directory")?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
