pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use guidepost_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "guidepost",
    about = "Guidepost supply-disruption copilot demo",
    long_about = "Replay the scripted copilot demo: read the supplier email, run the analysis, \
                  configure the premium upgrade, chat with the copilot, or edit the sales order.",
    after_help = "Examples:\n  guidepost analyze --fast\n  guidepost upgrade --customer CUST-001 --customer CUST-002\n  guidepost order \"please switch shipment to courier\"\n  guidepost chat --click find-suppliers"
)]
pub struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Options every command accepts.
#[derive(Clone, Debug, Default, Args)]
pub struct GlobalArgs {
    #[arg(long, global = true, help = "Path to guidepost.toml")]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, help = "Skip every playback delay")]
    pub fast: bool,
    #[arg(long, global = true, help = "Override the configured log level")]
    pub log_level: Option<String>,
    #[arg(long, global = true, help = "Override the session slot key")]
    pub session_key: Option<String>,
}

impl GlobalArgs {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                log_level: self.log_level.clone(),
                session_key: self.session_key.clone(),
                instant_pacing: self.fast.then_some(true),
                ..ConfigOverrides::default()
            },
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "List the inbox with optional filters")]
    Inbox(commands::inbox::InboxArgs),
    #[command(about = "Run the supplier-delay analysis and show the suggestions")]
    Analyze,
    #[command(about = "Play the premium upgrade branch and write its artifacts")]
    Upgrade(commands::upgrade::UpgradeArgs),
    #[command(about = "Replay the scripted copilot chat")]
    Chat(commands::chat::ChatArgs),
    #[command(about = "Send commands to the sales order chat")]
    Order(commands::order::OrderArgs),
    #[command(about = "Resolve a demo stage name")]
    Stage {
        #[arg(help = "email | suggestions | chat | salesOrder")]
        stage: Option<String>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(subcommand, about = "Inspect or resume the saved session slot")]
    Session(commands::session::SessionCommand),
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    if let Ok(config) = AppConfig::load(cli.global.load_options()) {
        init_logging(&config);
    }

    let global = &cli.global;
    let result = match cli.command {
        Command::Inbox(args) => commands::inbox::run(global, &args),
        Command::Analyze => commands::analyze::run(global),
        Command::Upgrade(args) => commands::upgrade::run(global, &args),
        Command::Chat(args) => commands::chat::run(global, &args),
        Command::Order(args) => commands::order::run(global, &args),
        Command::Stage { stage } => commands::stage::run(stage.as_deref()),
        Command::Config => commands::config::run(global),
        Command::Session(command) => commands::session::run(global, &command),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so command output stays clean on stdout.
fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
