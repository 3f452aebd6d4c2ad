// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::too_many_arguments)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::app_config::Config;
use crate::translation::PromptStyle;
use app_controller::Controller;

mod app_config;
mod app_controller;
mod book;
mod combine;
mod errors;
mod file_utils;
mod glossary;
mod progress_store;
mod providers;
mod rate_limiter;
mod sharding;
mod status;
mod text_utils;
mod translation;

/// CLI wrapper for PromptStyle to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliPromptStyle {
    Modern,
    ChinaFantasy,
    BookInfo,
}

impl From<CliPromptStyle> for PromptStyle {
    fn from(cli_style: CliPromptStyle) -> Self {
        match cli_style {
            CliPromptStyle::Modern => PromptStyle::Modern,
            CliPromptStyle::ChinaFantasy => PromptStyle::ChinaFantasy,
            CliPromptStyle::BookInfo => PromptStyle::BookInfo,
        }
    }
}

/// CLI wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a book directory (default command)
    Translate(TranslateArgs),

    /// Show per-chapter translation progress without touching anything
    Status {
        /// Book directory to inspect
        #[arg(value_name = "BOOK_DIR")]
        book_dir: PathBuf,

        /// First chapter to include
        #[arg(short = 's', long)]
        start_chapter: Option<u32>,

        /// Last chapter to include
        #[arg(short = 'e', long)]
        end_chapter: Option<u32>,

        /// Configuration file path
        #[arg(short, long, default_value = "conf.json")]
        config_path: String,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Book directory containing an input_chapters/ folder
    #[arg(value_name = "BOOK_DIR")]
    book_dir: PathBuf,

    /// Prompt style to translate with
    #[arg(short = 'p', long, value_enum, default_value = "modern")]
    style: CliPromptStyle,

    /// First chapter to translate
    #[arg(short = 's', long)]
    start_chapter: Option<u32>,

    /// Last chapter to translate
    #[arg(short = 'e', long)]
    end_chapter: Option<u32>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// yantwai - Yet Another Novel Translator with AI
///
/// Translates book chapters through tiered generative models with
/// resumable, crash-safe progress.
#[derive(Parser, Debug)]
#[command(name = "yantwai")]
#[command(version = "0.3.0")]
#[command(about = "AI-powered book translation tool")]
#[command(long_about = "yantwai splits book chapters into shards, translates them through \
tiered generative models with per-model rate limiting, and reassembles finished chapters.

EXAMPLES:
    yantwai ./my-book                          # Translate using default config
    yantwai -p china-fantasy ./my-book         # Use the xianxia prompt style
    yantwai --start-chapter 10 --end-chapter 20 ./my-book
    yantwai status ./my-book                   # Show per-chapter progress

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default
    one will be created automatically. The API key is read from the environment
    variable named in the config (GEMINI_API_KEY by default).

BOOK LAYOUT:
    BOOK_DIR/input_chapters/        one .txt file per chapter
    BOOK_DIR/prompt_files/          shard inputs (created)
    BOOK_DIR/translation_responses/ shard outputs (created)
    BOOK_DIR/translated_chapters/   finished chapters (created)
    BOOK_DIR/progress.json          resumable progress (created)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Book directory containing an input_chapters/ folder
    #[arg(value_name = "BOOK_DIR")]
    book_dir: Option<PathBuf>,

    /// Prompt style to translate with
    #[arg(short = 'p', long, value_enum, default_value = "modern")]
    style: CliPromptStyle,

    /// First chapter to translate
    #[arg(short = 's', long)]
    start_chapter: Option<u32>,

    /// Last chapter to translate
    #[arg(short = 'e', long)]
    end_chapter: Option<u32>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::color_for_level(record.level());
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {}\x1B[0m", color, now, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

/// Load the config file, creating a default one if it does not exist yet.
fn load_config(config_path: &str, cli_log_level: Option<&CliLogLevel>) -> Result<Config> {
    let mut config = if Path::new(config_path).exists() {
        Config::from_file(config_path)
            .with_context(|| format!("Failed to load config file: {}", config_path))?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        config
            .save_to_file(config_path)
            .with_context(|| format!("Failed to write default config to: {}", config_path))?;
        config
    };

    if let Some(level) = cli_log_level {
        config.log_level = level.clone().into();
    }
    log::set_max_level(level_filter(&config.log_level));
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default.
    // The level is updated after loading the config.
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Status {
            book_dir,
            start_chapter,
            end_chapter,
            config_path,
        }) => {
            let config = load_config(&config_path, None)?;
            let controller = Controller::with_config(config)?;
            controller.report_status(book_dir, start_chapter, end_chapter)
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => {
            // Default behavior: treat top-level args as the translate command
            let book_dir = cli.book_dir.ok_or_else(|| {
                anyhow::anyhow!("BOOK_DIR is required when no subcommand is specified")
            })?;
            run_translate(TranslateArgs {
                book_dir,
                style: cli.style,
                start_chapter: cli.start_chapter,
                end_chapter: cli.end_chapter,
                config_path: cli.config_path,
                log_level: cli.log_level,
            })
            .await
        }
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    let config = load_config(&options.config_path, options.log_level.as_ref())?;
    let controller = Controller::with_config(config)?;

    // Ctrl-C requests a clean stop: in-flight batches finish, progress is
    // flushed, and the next run resumes where this one left off.
    let cancel = controller.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Stop requested, finishing in-flight work...");
            cancel.cancel();
        }
    });

    controller
        .run(
            options.book_dir,
            options.style.into(),
            options.start_chapter,
            options.end_chapter,
        )
        .await?;
    Ok(())
}
