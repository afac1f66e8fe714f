// ABOUTME: CLI entry point for validator-migrator
// ABOUTME: Parses commands, loads settings, and routes to the command handlers

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use validator_migrator::commands;
use validator_migrator::config::{MigrationRequest, MigratorSettings, Network};

#[derive(Parser)]
#[command(name = "validator-migrator")]
#[command(about = "Export a Prysm validator wallet and slashing protection into a migration bundle", long_about = None)]
#[command(version)]
struct Cli {
    /// Set the log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log: String,
    /// Path to a TOML settings file (output volume, host output root, container name)
    #[arg(long, global = true, env = "VALIDATOR_MIGRATOR_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct SourceArgs {
    /// Network the legacy validator runs on
    #[arg(long, value_enum)]
    network: Network,
    /// Legacy Prysm validator image
    #[arg(long)]
    source_image: String,
    /// Docker volume holding the legacy validator data
    #[arg(long)]
    source_volume: String,
    /// Wallet directory, relative to the source volume root
    #[arg(long, default_value = ".eth2validators")]
    wallet_dir: String,
    /// Image used to copy the wallet password file
    #[arg(long, default_value = "alpine:3.15")]
    utility_image: String,
}

impl SourceArgs {
    fn into_request(self) -> MigrationRequest {
        MigrationRequest {
            network: self.network,
            source_image: self.source_image,
            source_volume: self.source_volume,
            wallet_dir: self.wallet_dir,
            utility_image: self.utility_image,
        }
    }
}

#[derive(Args, Clone, Default)]
struct OutputArgs {
    /// Docker volume receiving the bundle (overrides the config file)
    #[arg(long)]
    output_volume: Option<String>,
    /// Host path where the output volume is visible (overrides the config file)
    #[arg(long)]
    host_output_root: Option<PathBuf>,
    /// Name reserved for this run's worker containers (overrides the config file)
    #[arg(long)]
    container_name: Option<String>,
    /// Kill any single command after this many seconds
    #[arg(long)]
    command_timeout: Option<u64>,
}

impl OutputArgs {
    fn apply(self, settings: &mut MigratorSettings) {
        if let Some(volume) = self.output_volume {
            settings.output_volume = volume;
        }
        if let Some(root) = self.host_output_root {
            settings.host_output_root = root;
        }
        if let Some(name) = self.container_name {
            settings.container_name = name;
        }
        if let Some(secs) = self.command_timeout {
            settings.command_timeout_secs = Some(secs);
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Export keystores, wallet password, and slashing protection into the output volume
    Export {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        output: OutputArgs,
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
        /// Do not check host tools and volumes before exporting
        #[arg(long)]
        skip_preflight: bool,
        /// Re-run the whole export this many times after a failed container step
        #[arg(long, default_value_t = 0)]
        retries: u32,
        /// Delay before the first retry in seconds (doubles on each retry)
        #[arg(long, default_value_t = 5)]
        retry_delay_secs: u64,
    },
    /// Check host tools, Docker volumes, and the output directory
    Preflight {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Show the last completed export
    Status,
}

fn load_settings(config: Option<&PathBuf>, output: OutputArgs) -> anyhow::Result<MigratorSettings> {
    let mut settings = MigratorSettings::load(config.map(|p| p.as_path()))
        .context("Failed to load settings")?;
    output.apply(&mut settings);
    settings.validate()?;
    Ok(settings)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // 1. RUST_LOG environment variable has highest precedence
    // 2. --log flag is used if RUST_LOG is not set
    // 3. Default to "info" if neither are provided
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log.clone()));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Export {
            source,
            output,
            yes,
            skip_preflight,
            retries,
            retry_delay_secs,
        } => {
            let settings = load_settings(cli.config.as_ref(), output)?;
            commands::export(commands::ExportOptions {
                request: source.into_request(),
                settings,
                yes,
                skip_preflight,
                retries,
                retry_delay: Duration::from_secs(retry_delay_secs),
            })
            .await
        }
        Commands::Preflight { source, output } => {
            let settings = load_settings(cli.config.as_ref(), output)?;
            let runner = validator_migrator::ShellRunner::new()
                .with_timeout(settings.command_timeout());
            commands::preflight(&runner, &source.into_request(), &settings).await
        }
        Commands::Status => commands::status().await,
    }
}
