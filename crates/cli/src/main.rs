use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

#[derive(Parser)]
#[command(name = "module2")]
#[command(about = "Gowon module2: replies to trigger phrases on the gowon message bus", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and write a default config file.
    Init {
        /// Config file path (default: GOWON_MODULE2_CONFIG or ~/.gowon/module2.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Connect to the broker and answer messages until interrupted.
    Run {
        /// Config file path (default: GOWON_MODULE2_CONFIG or ~/.gowon/module2.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Broker host (overrides config and GOWON_BROKER_HOST)
        #[arg(long = "broker-host", short = 'H', value_name = "HOST")]
        broker_host: Option<String>,

        /// Broker port (overrides config and GOWON_BROKER_PORT)
        #[arg(long = "broker-port", short = 'P', value_name = "PORT")]
        broker_port: Option<u16>,
    },

    /// Read one message payload from stdin and print the reply, if any. No broker needed.
    Dispatch {
        /// Config file path (default: GOWON_MODULE2_CONFIG or ~/.gowon/module2.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("module2 {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Run {
            config,
            broker_host,
            broker_port,
        }) => {
            if let Err(e) = run(config, broker_host, broker_port).await {
                log::error!("module failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Dispatch { config }) => {
            if let Err(e) = run_dispatch(config).await {
                log::error!("dispatch failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(responder::config::default_config_path);
    if responder::init::init_config(&path)? {
        println!("wrote default configuration to {}", path.display());
    } else {
        println!("configuration already exists at {}", path.display());
    }
    Ok(())
}

/// File, then environment, then flags.
fn resolve_config(
    config_path: Option<PathBuf>,
    broker_host: Option<String>,
    broker_port: Option<u16>,
) -> anyhow::Result<responder::config::Config> {
    resolve_config_with(config_path, broker_host, broker_port, |key| std::env::var(key).ok())
}

fn resolve_config_with<F>(
    config_path: Option<PathBuf>,
    broker_host: Option<String>,
    broker_port: Option<u16>,
    env: F,
) -> anyhow::Result<responder::config::Config>
where
    F: Fn(&str) -> Option<String>,
{
    let (mut config, path) = responder::config::load_config(config_path)?;
    log::debug!("using config {}", path.display());
    config.apply_overrides_from(env)?;
    if let Some(host) = broker_host {
        config.broker.host = host;
    }
    if let Some(port) = broker_port {
        config.broker.port = port;
    }
    Ok(config)
}

async fn run(
    config_path: Option<PathBuf>,
    broker_host: Option<String>,
    broker_port: Option<u16>,
) -> anyhow::Result<()> {
    let config = resolve_config(config_path, broker_host, broker_port)?;
    responder::service::run_module(config).await
}

async fn run_dispatch(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = resolve_config(config_path, None, None)?;

    let mut raw = Vec::new();
    tokio::io::stdin().read_to_end(&mut raw).await?;

    match dispatch_payload(&config, &raw)? {
        Some(reply) => println!("{}", reply),
        None => log::info!("no trigger matched; nothing would be published"),
    }
    Ok(())
}

/// The reply JSON that `run` would publish for `raw`, if any.
fn dispatch_payload(config: &responder::config::Config, raw: &[u8]) -> anyhow::Result<Option<String>> {
    config.validate()?;
    let dispatcher = responder::service::build_dispatcher(config);
    match dispatcher.handle(raw)? {
        Some(reply) => Ok(Some(serde_json::to_string(&reply)?)),
        None => Ok(None),
    }
}
