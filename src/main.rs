//! slircbot binary: load config, connect, run the console.

use std::sync::Arc;

use slircbot::config::{Config, LogFormat, LoggingConfig, validate};
use slircbot::{Bot, console, http, metrics};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    match logging.format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path)?;
    init_tracing(&config.logging);

    if let Err(errors) = validate(&config) {
        for e in &errors {
            error!(path = %config_path, error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "{} configuration error(s) in {config_path}",
            errors.len()
        ));
    }

    info!(
        nick = %config.bot.nick,
        servers = config.servers.len(),
        "Starting slircbot"
    );

    // Convention: metrics_port = 0 disables the HTTP endpoint.
    let metrics_port = config.metrics_port.unwrap_or(0);
    if metrics_port != 0 {
        metrics::init();
    }

    let autoconnect: Vec<_> = config
        .servers
        .iter()
        .filter(|s| s.autoconnect)
        .cloned()
        .collect();
    let bot = Bot::builder(config).build();
    if metrics_port != 0 {
        tokio::spawn(http::run_http_server(metrics_port, bot.clone()));
    }

    for block in autoconnect {
        let bot = bot.clone();
        tokio::spawn(async move {
            if let Err(e) = bot.connect(&block).await {
                warn!(label = %block.label, error = %e, "Autoconnect failed");
            }
        });
    }

    {
        let bot = bot.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, stopping");
                bot.stop();
            }
        });
    }

    console::run(bot, console::stdin_lines(), Arc::new(console::StdConsole)).await;
    Ok(())
}
