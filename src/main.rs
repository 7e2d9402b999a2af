// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use vttspeak::app_config::{self, Config};
use vttspeak::errors::{AppError, ProviderError};
use vttspeak::media::ffmpeg::FfmpegBackend;
use vttspeak::providers::VoiceGender;
use vttspeak::Controller;

/// CLI Wrapper for VoiceGender to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliVoiceGender {
    Male,
    Female,
    Neutral,
}

impl From<CliVoiceGender> for VoiceGender {
    fn from(cli_gender: CliVoiceGender) -> Self {
        match cli_gender {
            CliVoiceGender::Male => VoiceGender::Male,
            CliVoiceGender::Female => VoiceGender::Female,
            CliVoiceGender::Neutral => VoiceGender::Neutral,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
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
    /// Generate shell completions for vttspeak
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// vttspeak - WebVTT subtitles to narrated audio
///
/// Reads a WebVTT file, speaks every cue with Google Cloud Text-to-Speech and
/// places each clip at its cue's start time.
#[derive(Parser, Debug)]
#[command(name = "vttspeak")]
#[command(version)]
#[command(about = "Turn WebVTT subtitles into narrated audio or video")]
#[command(long_about = "vttspeak synthesizes every cue of a WebVTT file and mixes the clips into one track.

EXAMPLES:
    vttspeak                                   # input.vtt -> out.mp3, Japanese voice
    vttspeak -i talk.vtt -o talk.mp3 -l en-US  # English voice
    vttspeak -i talk.vtt -o talk.mp4           # Video with subtitles and a timecode
    vttspeak -g female --log-level debug       # Female voice, verbose logging
    vttspeak completions bash > vttspeak.bash  # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.

CREDENTIALS:
    Set GOOGLE_API_KEY (or GOOGLE_OAUTH_ACCESS_TOKEN), or fill in synthesis.api_key
    in the config file. ffmpeg must be installed and on the PATH.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// WebVTT file to narrate
    #[arg(short, long, default_value = "input.vtt")]
    input: PathBuf,

    /// Output file; a .mp4 extension produces a video
    #[arg(short, long, default_value = "out.mp3")]
    output: PathBuf,

    /// Voice language code (e.g., 'ja', 'en-US')
    #[arg(short, long)]
    language: Option<String>,

    /// Voice gender
    #[arg(short, long, value_enum)]
    gender: Option<CliVoiceGender>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config: String,

    /// Set logging level
    #[arg(long, value_enum)]
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

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
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

            // Problems go to stderr, progress to stdout
            let _ = match record.level() {
                Level::Error | Level::Warn => writeln!(
                    std::io::stderr(),
                    "\x1B[{}m{} {:<5} {}\x1B[0m",
                    color, now, record.level(), record.args()
                ),
                _ => writeln!(
                    std::io::stdout(),
                    "\x1B[{}m{} {:<5} {}\x1B[0m",
                    color, now, record.level(), record.args()
                ),
            };
        }
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
        let _ = std::io::stderr().flush();
    }
}

fn to_level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() {
    // Trace is the ceiling; the effective level is set through set_max_level
    if let Err(e) = CustomLogger::init(LevelFilter::Trace) {
        eprintln!("Error: failed to initialize logging: {}", e);
        std::process::exit(1);
    }
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "vttspeak", &mut std::io::stdout());
        return;
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        if let Some(AppError::Provider(ProviderError::AuthenticationError(_))) = e.downcast_ref::<AppError>() {
            eprintln!("Hint: export GOOGLE_API_KEY=<your key> or set synthesis.api_key in the config file");
        }
        std::process::exit(1);
    }
}

async fn run(options: CommandLineOptions) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(to_level_filter(&level));
    }

    let mut config = load_or_create_config(&options.config)?;

    // Override config with CLI options if provided
    if let Some(language) = &options.language {
        config.language_code = language.clone();
    }
    if let Some(gender) = &options.gender {
        config.voice_gender = gender.clone().into();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;

    if options.log_level.is_none() {
        log::set_max_level(to_level_filter(&config.log_level));
    }

    FfmpegBackend::from_config(&config.media)
        .ensure_available()
        .await
        .context("ffmpeg is required but could not be run")?;

    let controller = Controller::with_config(config)?;
    controller.run(&options.input, &options.output).await?;

    Ok(())
}

fn load_or_create_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;

        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?;
        return Ok(config);
    }

    warn!("Config file not found at '{}', creating default config.", config_path);

    let config = Config::default();
    let config_json = serde_json::to_string_pretty(&config)
        .context("Failed to serialize default config to JSON")?;

    std::fs::write(config_path, config_json)
        .context(format!("Failed to write default config to file: {}", config_path))?;

    Ok(config)
}
