// src/main.rs
// Bindilla - a bridge between Stencila and Binder

use anyhow::Result;
use bindilla::{Bridge, BridgeConfig, Manifest, environ, server};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "bindilla")]
#[command(about = "Launch environments on Binder and proxy requests into them")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.bindilla/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,

        /// Binder deployment to launch on
        #[arg(long, env = "BINDILLA_BINDER_HOST")]
        binder_host: Option<String>,

        /// Hand out direct container URLs instead of proxying
        #[arg(long)]
        direct: bool,
    },

    /// Parse an environ identifier and print its spec
    Parse { identifier: String },

    /// Print the manifest, with optional extra environs first
    Manifest { extra: Vec<String> },

    /// Launch an environ, wait for the build stream to end and print the record
    Launch {
        identifier: String,

        #[arg(long, env = "BINDILLA_BINDER_HOST")]
        binder_host: Option<String>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<BridgeConfig> {
    let mut config = match path {
        Some(path) => BridgeConfig::load_from(path)?,
        None => BridgeConfig::load(),
    };
    config.apply_env()?;
    Ok(config)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = load_config(cli.config.as_ref())?;

    match cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
        binder_host: None,
        direct: false,
    }) {
        Commands::Serve {
            host,
            port,
            binder_host,
            direct,
        } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(binder_host) = binder_host {
                config.binder_host = binder_host;
            }
            if direct {
                config.proxy = false;
            }
            config.validate()?;

            info!(
                binder_host = %config.binder_host,
                proxy = config.proxy,
                retention_secs = ?config.retention_secs,
                "Starting Bindilla"
            );
            let bridge = Bridge::new(&config)?;
            server::serve(bridge, &config.bind_address()).await?;
        }
        Commands::Parse { identifier } => {
            print_json(&environ::parse(&identifier)?)?;
        }
        Commands::Manifest { extra } => {
            let defaults = config.default_environs()?;
            print_json(&Manifest::build(&defaults, &extra)?)?;
        }
        Commands::Launch {
            identifier,
            binder_host,
        } => {
            if let Some(binder_host) = binder_host {
                config.binder_host = binder_host;
            }
            config.validate()?;
            let bridge = Bridge::new(&config)?;
            let record = bridge.launch_environ(&identifier).await?;
            print_json(&record)?;
        }
    }

    Ok(())
}
