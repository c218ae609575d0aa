//! Server bootstrap.
//!
//! # Responsibility
//! - Open the configured store and bind the listener.
//! - Serve the planet router until the shutdown signal resolves.

use axum::Router;
use log::{error, info};
use planet_core::db::DbError;
use planet_core::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::controller::planet_router;
use crate::store::SqlitePlanetStore;

#[derive(Debug)]
pub enum ServeError {
    Db(DbError),
    Repo(RepoError),
    Io(std::io::Error),
}

impl Display for ServeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "planet store open failed: {err}"),
            Self::Repo(err) => write!(f, "planet store check failed: {err}"),
            Self::Io(err) => write!(f, "http listener failed: {err}"),
        }
    }
}

impl Error for ServeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<DbError> for ServeError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for ServeError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<std::io::Error> for ServeError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Opens the store from `config`, binds `config.bind_addr` and serves until
/// `shutdown` resolves.
pub async fn serve(
    config: ServerConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServeError> {
    let store = SqlitePlanetStore::open(&config.db)?;
    let router = planet_router(Arc::new(store));

    let listener = match TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(
                "event=http_bind module=http status=error addr={} error={}",
                config.bind_addr, err
            );
            return Err(err.into());
        }
    };
    info!(
        "event=http_bind module=http status=ok addr={} db={}",
        config.bind_addr, config.db
    );

    serve_listener(listener, router, shutdown).await
}

/// Serves `router` on an already bound listener.
pub async fn serve_listener(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServeError> {
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("event=http_shutdown module=http status=ok");
    Ok(())
}
