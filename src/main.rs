mod api;
mod gateway;
mod inbound;

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use wagate_channels::BridgeClient;
use wagate_core::{
    config::{self, Config, GatewayConfig},
    formatter::Recipient,
};
use wagate_memory::KeywordStore;

#[derive(Parser)]
#[command(
    name = "wagate",
    version,
    about = "HTTP/WebSocket gateway for a WhatsApp Web session"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway.
    Start,
    /// Show the resolved configuration and probe the bridge and database.
    Status,
    /// Print the chat id a phone number resolves to.
    Format {
        number: String,
        /// Country code to apply instead of the configured one.
        #[arg(long)]
        country_code: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = load_config(&cli.config, startup_subscriber())?;

    match cli.command {
        Commands::Start => {
            let _guard = init_tracing(&cfg.gateway)?;
            let http = reqwest::Client::new();
            let client = Arc::new(BridgeClient::from_config(http.clone(), &cfg.client));

            let store = if cfg.database.enabled {
                Some(KeywordStore::connect(&cfg.database).await?)
            } else {
                None
            };

            tracing::info!("wagate starting, bridge at {}", client.base_url());
            gateway::Gateway::new(cfg, client, store, http).run().await?;
        }
        Commands::Status => {
            println!("wagate status\n");
            println!("Config: {}", cli.config);
            println!("Listen: {}:{}", cfg.gateway.host, cfg.gateway.port);
            println!("Default country code: {}", cfg.formatter.default_country_code);
            println!(
                "Webhook: {}",
                if cfg.webhook.enabled {
                    cfg.webhook.url.as_str()
                } else {
                    "disabled"
                }
            );
            println!(
                "Auto-reply: {}",
                if cfg.autoreply.enabled { "enabled" } else { "disabled" }
            );
            println!();

            let bridge = BridgeClient::from_config(reqwest::Client::new(), &cfg.client);
            match bridge.health().await {
                Ok(_) => println!("  bridge ({}): reachable", bridge.base_url()),
                Err(e) => println!("  bridge ({}): {e}", bridge.base_url()),
            }

            if cfg.database.enabled {
                let result = match KeywordStore::connect(&cfg.database).await {
                    Ok(store) => store.ping().await,
                    Err(e) => Err(e),
                };
                match result {
                    Ok(()) => println!("  database ({}): ok", cfg.database.redacted_url()),
                    Err(e) => println!("  database: {e}"),
                }
            } else {
                println!("  database: disabled");
            }
        }
        Commands::Format {
            number,
            country_code,
        } => {
            let code = country_code.unwrap_or(cfg.formatter.default_country_code);
            let recipient = Recipient::individual(&number, &code)?;
            println!("{}", recipient.id());
        }
    }

    Ok(())
}

/// Load the config file, then environment overrides, then validate.
///
/// Diagnostics go to `subscriber`, since the configured one cannot be built
/// before the config is read.
fn load_config<S>(path: &str, subscriber: S) -> anyhow::Result<Config>
where
    S: tracing::Subscriber + Send + Sync + 'static,
{
    tracing::subscriber::with_default(subscriber, || -> anyhow::Result<Config> {
        let mut cfg = config::load(path)?;
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    })
}

/// Console subscriber for startup, filtered by `RUST_LOG` or `info`.
fn startup_subscriber() -> impl tracing::Subscriber + Send + Sync + 'static {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish()
}

/// Install the global subscriber. `RUST_LOG` wins over `gateway.log_level`.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_tracing(cfg: &GatewayConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.log_level))?;

    let (file_layer, guard) = match cfg.log_dir {
        Some(ref dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, "wagate.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();
    Ok(guard)
}
