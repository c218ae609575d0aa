//! HTTP controller for `/planets`.
//!
//! # Responsibility
//! - Bind the planet routes and decode JSON bodies and path/query params.
//! - Validate create payloads before any store call.
//! - Map store outcomes onto HTTP status codes and JSON bodies.
//!
//! # Invariants
//! - This module is the only place repository errors become status codes.
//! - GET 404 responses carry no body; DELETE 404 carries a diagnostic body.
//! - 5xx bodies are opaque; details go to the log only.

use axum::extract::rejection::JsonRejection;
use axum::extract::{MatchedPath, Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use log::{error, info, warn};
use planet_core::logging::sanitize_message;
use planet_core::{Planet, PlanetId, RepoError, RepoResult};
use serde::Deserialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::store::{PlanetApi, SharedPlanetApi};

const MAX_LOGGED_ERROR_CHARS: usize = 200;

/// Create payload. Fields are optional so that missing values reach
/// validation and yield 422 instead of a decoder error. `id` is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct PlanetPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub climate: Option<String>,
    #[serde(default)]
    pub terrain: Option<String>,
}

impl PlanetPayload {
    /// Decodes a create body. Only a JSON object is accepted.
    fn from_body(body: Value) -> Result<Self, ControllerError> {
        if !body.is_object() {
            return Err(ControllerError::InvalidBody(
                "planet body must be a JSON object".to_string(),
            ));
        }
        serde_json::from_value(body).map_err(|err| ControllerError::InvalidBody(err.to_string()))
    }

    fn into_planet(self) -> Planet {
        Planet::new(
            self.name.unwrap_or_default(),
            self.climate.unwrap_or_default(),
            self.terrain.unwrap_or_default(),
        )
    }
}

/// Optional list filters.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub terrain: Option<String>,
    pub climate: Option<String>,
}

/// Failures a handler turns into a response.
#[derive(Debug)]
pub enum ControllerError {
    /// Body decoded but failed shape or field validation.
    InvalidBody(String),
    /// Body could not be decoded at all.
    Rejected(StatusCode, String),
    Repo(RepoError),
    /// Store task panicked or was cancelled.
    TaskFailed(String),
}

impl ControllerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidBody(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Rejected(status, _) => *status,
            Self::Repo(err) => status_for_repo_error(err),
            Self::TaskFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepoError> for ControllerError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<JsonRejection> for ControllerError {
    fn from(value: JsonRejection) -> Self {
        match value {
            JsonRejection::JsonDataError(err) => Self::InvalidBody(err.body_text()),
            other => Self::Rejected(other.status(), other.body_text()),
        }
    }
}

impl IntoResponse for ControllerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::InvalidBody(message) | Self::Rejected(_, message) => message.clone(),
            Self::Repo(err) if !status.is_server_error() => err.to_string(),
            Self::Repo(err) => {
                error!(
                    "event=store_call module=http status=error error={}",
                    sanitize_message(&err.to_string(), MAX_LOGGED_ERROR_CHARS)
                );
                "internal server error".to_string()
            }
            Self::TaskFailed(details) => {
                error!(
                    "event=store_task module=http status=error error={}",
                    sanitize_message(details, MAX_LOGGED_ERROR_CHARS)
                );
                "internal server error".to_string()
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Maps a repository error kind onto its HTTP status.
pub fn status_for_repo_error(err: &RepoError) -> StatusCode {
    match err {
        RepoError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        RepoError::Conflict(_) => StatusCode::CONFLICT,
        RepoError::NotFound(_) => StatusCode::NOT_FOUND,
        RepoError::Db(_)
        | RepoError::InvalidData(_)
        | RepoError::UninitializedConnection { .. }
        | RepoError::MissingRequiredTable(_)
        | RepoError::MissingRequiredColumn { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Builds the planet router over `api`.
///
/// Unknown paths fall through to 404 and wrong methods on known paths to 405.
pub fn planet_router(api: SharedPlanetApi) -> Router {
    Router::new()
        .route("/planets", get(list_planets).post(create_planet))
        .route("/planets/:id", get(get_planet).delete(remove_planet))
        .route("/planets/name/:name", get(get_planet_by_name))
        .layer(middleware::from_fn(log_request))
        .with_state(api)
}

async fn create_planet(
    State(api): State<SharedPlanetApi>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ControllerError> {
    let Json(body) = body?;
    let planet = PlanetPayload::from_body(body)?.into_planet();
    if let Err(err) = planet.validate() {
        return Err(ControllerError::InvalidBody(err.to_string()));
    }

    let created = call_store(&api, move |api| api.create(&planet)).await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

async fn get_planet(
    State(api): State<SharedPlanetApi>,
    Path(id): Path<PlanetId>,
) -> Result<Response, ControllerError> {
    let planet = call_store(&api, move |api| api.get(id)).await?;
    Ok(found_or_empty_404(planet))
}

async fn get_planet_by_name(
    State(api): State<SharedPlanetApi>,
    Path(name): Path<String>,
) -> Result<Response, ControllerError> {
    let planet = call_store(&api, move |api| api.get_by_name(&name)).await?;
    Ok(found_or_empty_404(planet))
}

async fn list_planets(
    State(api): State<SharedPlanetApi>,
    Query(params): Query<ListParams>,
) -> Result<Response, ControllerError> {
    let planets = call_store(&api, move |api| {
        api.list(params.terrain.as_deref(), params.climate.as_deref())
    })
    .await?;
    Ok(Json(planets).into_response())
}

async fn remove_planet(
    State(api): State<SharedPlanetApi>,
    Path(id): Path<PlanetId>,
) -> Result<Response, ControllerError> {
    call_store(&api, move |api| api.remove(id)).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

fn found_or_empty_404(planet: Option<Planet>) -> Response {
    match planet {
        Some(planet) => Json(planet).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Runs one store call on the blocking pool.
///
/// If the request future is dropped before the task starts, the call is
/// skipped. A call already running completes.
async fn call_store<T, F>(api: &SharedPlanetApi, f: F) -> Result<T, ControllerError>
where
    T: Send + 'static,
    F: FnOnce(&dyn PlanetApi) -> RepoResult<T> + Send + 'static,
{
    let api = Arc::clone(api);
    let cancel = CancelOnDrop::new();
    let cancelled = Arc::clone(&cancel.flag);

    let outcome = tokio::task::spawn_blocking(move || {
        if cancelled.load(Ordering::Acquire) {
            warn!("event=store_call module=http status=skipped reason=client_gone");
            return None;
        }
        Some(f(&*api))
    })
    .await;
    cancel.disarm();

    match outcome {
        Ok(Some(result)) => Ok(result?),
        Ok(None) => Err(ControllerError::TaskFailed("store call cancelled".to_string())),
        Err(err) => Err(ControllerError::TaskFailed(err.to_string())),
    }
}

struct CancelOnDrop {
    flag: Arc<AtomicBool>,
    armed: bool,
}

impl CancelOnDrop {
    fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if self.armed {
            self.flag.store(true, Ordering::Release);
        }
    }
}

async fn log_request(matched: Option<MatchedPath>, request: Request, next: Next) -> Response {
    let started_at = Instant::now();
    let method = request.method().clone();
    let route = matched
        .as_ref()
        .map_or("unmatched", |path| path.as_str())
        .to_string();

    let response = next.run(request).await;
    info!(
        "event=http_request module=http status={} method={} route={} duration_ms={}",
        response.status().as_u16(),
        method,
        route,
        started_at.elapsed().as_millis()
    );
    response
}
