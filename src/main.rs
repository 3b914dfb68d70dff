use std::sync::Arc;

use config::{AppConfig, DispatchMode, LogFormat};
use datadog::DatadogClient;
use dispatch::EventDispatcher;
use dotenvy::dotenv;
use slack::SlackApp;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod datadog;
mod dispatch;
mod error;
mod points;
mod recognition;
mod router;
mod slack;

#[derive(Clone)]
pub struct ServerState {
    dispatcher: Arc<EventDispatcher>,
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    match format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv_loaded = dotenv().is_ok();

    // Missing credentials abort here, before anything listens.
    let config = AppConfig::from_env()?;
    init_logging(config.log_format);

    if dotenv_loaded {
        info!(event_name = "system.config.dotenv", "loaded .env file");
    } else {
        info!(event_name = "system.config.dotenv", ".env file not found, ignoring");
    }

    if config.mode == DispatchMode::Legacy {
        warn!(
            event_name = "system.config.legacy_mode",
            "legacy dispatch mode: +g mentions are only logged, \
             mention count is unchecked and no metrics are sent"
        );
    }

    let slack = SlackApp::new(
        &config.slack_bot_token,
        &config.slack_api_base,
        config.http_timeout,
    )?;
    let datadog =
        DatadogClient::new(&config.dd_api_key, config.metrics_url(), config.http_timeout)?;
    let dispatcher = EventDispatcher::new(&config, Arc::new(slack), Arc::new(datadog));

    let server = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&server).await?;
    info!(
        event_name = "system.server.started",
        bind_address = %server,
        max_plus_points = config.max_plus_points,
        dd_site = %config.dd_site,
        "{} v{} listening",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    axum::serve(
        listener,
        router::get_router().with_state(ServerState {
            dispatcher: Arc::new(dispatcher),
        }),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!(event_name = "system.server.stopped", "server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(
            event_name = "system.server.signal_error",
            error = %err,
            "failed to listen for ctrl-c"
        );
        std::future::pending::<()>().await;
    }
}
