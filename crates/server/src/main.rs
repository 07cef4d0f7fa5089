mod bootstrap;
mod bridge;
mod health;

use anyhow::Result;
use nomorejokes_core::config::{AppConfig, LoadOptions, LoggingConfig};
use tracing::{error, info};

fn init_logging(logging: &LoggingConfig) {
    use nomorejokes_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // A missing .env file is normal in deployed environments.
    let _ = dotenvy::dotenv();

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(config_error) => {
            init_logging(&LoggingConfig::default());
            error!(
                event_name = "system.config.invalid",
                correlation_id = "bootstrap",
                error = %config_error,
                "configuration is invalid; exiting"
            );
            return Err(config_error.into());
        }
    };
    init_logging(&config.logging);

    let app = bootstrap::bootstrap(config)?;

    if app.config.server.health_enabled {
        health::spawn(
            &app.config.server.bind_address,
            app.config.server.health_check_port,
            health::HealthState::new(
                app.config.publishing.template_path.clone(),
                app.config.publishing.output_dir.clone(),
            ),
        )
        .await?;
    }

    info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        output_dir = %app.config.publishing.output_dir.display(),
        "nomorejokes-server started; press Ctrl+C to stop"
    );

    tokio::select! {
        polled = app.runner.start() => {
            polled?;
            info!(
                event_name = "system.server.stream_closed",
                correlation_id = "shutdown",
                "telegram update stream closed"
            );
        }
        signal = wait_for_shutdown() => {
            signal?;
            info!(
                event_name = "system.server.stopping",
                correlation_id = "shutdown",
                sessions = app.controller.session_count(),
                "nomorejokes-server stopping"
            );
        }
    }

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
