pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use covernote_core::config::{AppConfig, LoadOptions, LogFormat, LoggingConfig};
use covernote_core::domain::request::RequestKind;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "covernote",
    about = "Covernote back-office CLI",
    long_about = "Drive insurance request wizards, inspect master data, and run smoke checks.",
    after_help = "Examples:\n  covernote config\n  covernote list bank --status active\n  covernote submit cancellation --file request.json --integration\n  covernote smoke"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Load the master-data fixtures and report per-entity counts")]
    Seed,
    #[command(about = "List master-data rows matching a search term and facet filters")]
    List {
        #[arg(value_enum)]
        entity: EntityArg,
        #[arg(long, help = "Case-insensitive substring matched against searchable fields")]
        search: Option<String>,
        #[arg(long, help = "active, inactive or all")]
        status: Option<String>,
        #[arg(long, help = "Entity-specific type or category, or all")]
        kind: Option<String>,
    },
    #[command(about = "Drive a request through every wizard step and submit it")]
    Submit {
        #[arg(value_enum)]
        kind: KindArg,
        #[arg(long, help = "JSON file holding the request fields")]
        file: PathBuf,
        #[arg(long, help = "Submit through the integrated path regardless of config")]
        integration: bool,
    },
    #[command(about = "Run end-to-end wizard and master-data checks with zero gateway latency")]
    Smoke,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EntityArg {
    Bank,
    InsuranceCompany,
    VehicleType,
    PolicyProduct,
    Exam,
    TrainingMaterial,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    #[value(name = "64vb")]
    Verification64Vb,
    Cancellation,
    Approval,
    Settlement,
    Endorsement,
    Proposal,
}

impl From<KindArg> for RequestKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Verification64Vb => Self::Verification64Vb,
            KindArg::Cancellation => Self::Cancellation,
            KindArg::Approval => Self::InsuranceApproval,
            KindArg::Settlement => Self::Settlement,
            KindArg::Endorsement => Self::Endorsement,
            KindArg::Proposal => Self::Proposal,
        }
    }
}

/// Installs the global subscriber on stderr; stdout stays reserved for command JSON.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    // A subscriber may already be installed when commands run inside tests.
    let _ = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let logging = AppConfig::load(LoadOptions::default())
        .map(|config| config.logging)
        .unwrap_or_else(|_| AppConfig::default().logging);
    init_logging(&logging);

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Seed => commands::seed::run(),
        Command::List { entity, search, status, kind } => {
            commands::list::run(entity, commands::list::ListFilter { search, status, kind })
        }
        Command::Submit { kind, file, integration } => {
            commands::submit::run(kind.into(), &file, integration)
        }
        Command::Smoke => commands::smoke::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
