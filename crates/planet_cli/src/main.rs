//! `planet-api` server entry point.
//!
//! # Responsibility
//! - Compose configuration, logging, store and HTTP server at startup.
//! - Exit non-zero with a readable message when startup fails.

use log::{error, info};
use planet_core::{core_version, default_log_level, init_logging};
use planet_http::{serve, ServerConfig};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = init_logging(default_log_level(), None) {
        eprintln!("planet-api: logging init failed: {err}");
        return ExitCode::FAILURE;
    }

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("event=config_load module=cli status=error error={err}");
            eprintln!("planet-api: {err}");
            return ExitCode::FAILURE;
        }
    };
    info!(
        "event=server_start module=cli status=start version={} addr={} db={}",
        core_version(),
        config.bind_addr,
        config.db
    );

    match serve(config, shutdown_signal()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=server_start module=cli status=error error={err}");
            eprintln!("planet-api: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("event=shutdown_signal module=cli status=error error={err}");
        std::future::pending::<()>().await;
    }
}
