//! `catalog` - look up, register and watch services from the command line

use anyhow::{Context, Result};
use catalog_client::{Client, ClientConfig, Consistency};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

mod commands;

#[derive(Parser)]
#[command(name = "catalog")]
#[command(about = "Service catalog client - lookup, register, deregister, watch")]
#[command(version)]
struct Cli {
    /// Client configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Agent address, overrides the configuration file
    #[arg(short, long, global = true)]
    address: Option<String>,

    /// ACL token, overrides the configuration file
    #[arg(long, global = true)]
    token: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up instances of a service
    Lookup {
        /// Service name
        service: String,

        /// Return every instance instead of the first
        #[arg(long)]
        all: bool,

        #[command(flatten)]
        read: ReadArgs,

        /// Block until the index moves past this value
        #[arg(long)]
        index: Option<u64>,

        /// Maximum hold for a blocking lookup (e.g. 30s, 5m)
        #[arg(long, value_parser = parse_duration)]
        wait: Option<Duration>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },

    /// Register a service definition with the local agent
    Register {
        /// Definition file (YAML or JSON)
        file: PathBuf,
    },

    /// Remove a service instance from the local agent
    Deregister {
        /// Service id
        id: String,
    },

    /// Print a service's instances every time they change
    Watch {
        /// Service name
        service: String,

        #[command(flatten)]
        read: ReadArgs,

        /// Hold time of each blocking lookup
        #[arg(long, value_parser = parse_duration, default_value = "30s")]
        wait: Duration,
    },
}

#[derive(clap::Args)]
struct ReadArgs {
    /// Datacenter to read from
    #[arg(long)]
    dc: Option<String>,

    /// Allow any server to answer
    #[arg(long, conflicts_with = "consistent")]
    stale: bool,

    /// Require the leader to confirm the answer
    #[arg(long)]
    consistent: bool,
}

impl ReadArgs {
    fn consistency(&self) -> Consistency {
        if self.stale {
            Consistency::Stale
        } else if self.consistent {
            Consistency::Consistent
        } else {
            Consistency::Default
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Json,
}

fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    humantime_serde::re::humantime::parse_duration(s).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let client = build_client(&cli).await?;

    match cli.command {
        Commands::Lookup {
            service,
            all,
            read,
            index,
            wait,
            format,
        } => {
            let consistency = read.consistency();
            let mut options = commands::read_options(read.dc, consistency);
            options.index = index;
            options.wait = wait;
            commands::lookup::run(&client, &service, all, &options, format).await
        }
        Commands::Register { file } => commands::register::run(&client, &file).await,
        Commands::Deregister { id } => commands::deregister::run(&client, &id).await,
        Commands::Watch {
            service,
            read,
            wait,
        } => {
            let consistency = read.consistency();
            let options = commands::read_options(read.dc, consistency).with_wait(wait);
            commands::watch::run(&client, &service, options).await
        }
    }
}

async fn build_client(cli: &Cli) -> Result<Client> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::from_file(path)
            .await
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(address) = &cli.address {
        config.address = address.clone();
    }
    if let Some(token) = &cli.token {
        config.token = Some(token.clone());
    }

    Client::connect(config)
        .await
        .context("Failed to create client")
}
