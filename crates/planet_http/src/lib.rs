//! HTTP adapter for the planet API.
//!
//! # Responsibility
//! - Expose planet use-cases over a JSON HTTP surface.
//! - Compose store, router and listener at startup.

pub mod config;
pub mod controller;
pub mod server;
pub mod store;

pub use config::{ConfigError, DbLocation, ServerConfig};
pub use controller::{planet_router, status_for_repo_error, ControllerError};
pub use server::{serve, serve_listener, ServeError};
pub use store::{PlanetApi, SharedPlanetApi, SqlitePlanetStore};
