mod engine_cmds;
mod rule_cmds;

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

use oxum_config::{DEFAULT_CONFIG_PATH, OxumConfig};

#[derive(Debug, Parser)]
#[command(
    name = "oxum",
    version,
    about = "Fair-rotation boost engine and Oxum transaction rules"
)]
struct Cli {
    /// Path to the TOML config file.  Missing files fall back to defaults.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check one transaction against the Oxum rules and print the result.
    Validate {
        #[arg(long = "type", value_name = "TYPE")]
        transaction_type: String,
        #[arg(long, allow_negative_numbers = true)]
        amount: Decimal,
        #[arg(long)]
        platform_fee: Option<Decimal>,
        #[arg(long)]
        sender: Option<String>,
        #[arg(long)]
        recipient: Option<String>,
    },
    /// Print the display descriptor of a transaction type.
    Describe {
        #[arg(value_name = "TYPE")]
        transaction_type: String,
    },
    /// Drive an engine over synthetic profiles with a simulated clock.
    Simulate {
        #[arg(long, default_value_t = 8)]
        profiles: usize,
        #[arg(long, default_value_t = 10)]
        rotations: u32,
        /// Profiles from the head of the queue "viewed" after each rotation.
        #[arg(long, default_value_t = 1)]
        views: usize,
        #[arg(long)]
        region: Option<String>,
        #[arg(long)]
        language: Option<String>,
    },
    /// Run the rotation loop on the wall clock until Ctrl-C.
    Run {
        /// JSON array of profiles to activate at startup.
        #[arg(long, value_name = "PATH")]
        profiles_file: Option<PathBuf>,
    },
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration (file + environment).
    Show,
    /// Write the default configuration to the config path.
    Init {
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = OxumConfig::load_from(&cli.config)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.telemetry.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Validate {
            transaction_type,
            amount,
            platform_fee,
            sender,
            recipient,
        } => rule_cmds::validate(
            &config,
            rule_cmds::ValidateArgs {
                transaction_type,
                amount,
                platform_fee,
                sender,
                recipient,
            },
        ),
        Commands::Describe { transaction_type } => rule_cmds::describe(&transaction_type),
        Commands::Simulate {
            profiles,
            rotations,
            views,
            region,
            language,
        } => engine_cmds::simulate(
            &config,
            engine_cmds::SimulateArgs {
                profiles,
                rotations,
                views,
                region,
                language,
            },
        ),
        Commands::Run { profiles_file } => engine_cmds::run(&config, profiles_file.as_deref()).await,
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                print!("{}", config.to_toml_string()?);
                Ok(())
            }
            ConfigCommands::Init { force } => init_config(&cli.config, force),
        },
    }
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (pass --force to overwrite)", path.display());
    }
    OxumConfig::default().save_to(path)?;
    println!("wrote default config to {}", path.display());
    Ok(())
}
