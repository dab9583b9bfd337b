//! HTTP routes over [`HashService`].
//!
//! Responses are plain text except `/stats`, which is JSON. Shutdown and
//! not-found outcomes are ordinary responses with fixed messages.

use std::future::Future;

use anyhow::Result;
use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::{
    service::{Admission, HashService},
    store::RecordId,
};

pub const TERMINATING: &str = "Cannot accept new requests, the server is being terminated...";
pub const HASH_NOT_FOUND: &str = "Hash not found!";
pub const INVALID_HASH_ID: &str = "Invalid hash id!";
pub const ONLY_POST_HASH: &str = "Only POST methods are supported for `/hash` endpoint!";
pub const ONLY_GET_STATS: &str = "Only GET methods are supported for `/stats` endpoint!";
pub const UNSUPPORTED_ENDPOINT: &str =
    "This endpoint is not supported by the server. Try ['/hash'|'/hash/{id}'|'/stats'|'/shutdown']";

#[derive(Debug, Default, Deserialize)]
pub struct HashForm {
    #[serde(default)]
    pub password: String,
}

pub fn router(service: HashService) -> Router {
    Router::new()
        .route("/hash", post(submit_hash).fallback(only_post_hash))
        .route("/hash/:id", get(read_hash))
        .route("/stats", get(read_stats).fallback(only_get_stats))
        .route("/shutdown", get(shutdown).post(shutdown))
        .fallback(unsupported)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Serves `service` on `listener` until its shutdown drain has finished.
pub async fn serve(listener: TcpListener, service: HashService) -> Result<()> {
    let coordinator = service.coordinator().clone();
    axum::serve(listener, router(service))
        .with_graceful_shutdown(async move { coordinator.terminated().await })
        .await?;
    info!("server stopped");
    Ok(())
}

/// Serves until either the shutdown route finishes draining or `signal`
/// resolves, in which case the same drain is started first.
pub async fn serve_until<F>(listener: TcpListener, service: HashService, signal: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let trigger = service.clone();
    tokio::spawn(async move {
        signal.await;
        trigger.shutdown();
    });
    serve(listener, service).await
}

/// Takes the password from a url-encoded body. A request without a form body
/// falls back to the `password` query parameter, and a missing field hashes
/// as the empty password.
async fn submit_hash(
    State(service): State<HashService>,
    query: Result<Query<HashForm>, QueryRejection>,
    form: Result<Form<HashForm>, FormRejection>,
) -> Response {
    if service.coordinator().is_rejecting() {
        return terminating();
    }
    let HashForm { password } = match form {
        Ok(Form(form)) => form,
        Err(FormRejection::InvalidFormContentType(_)) => {
            query.map(|Query(form)| form).unwrap_or_default()
        }
        Err(rejection) => return (StatusCode::BAD_REQUEST, rejection.body_text()).into_response(),
    };

    match service.submit(password).await {
        Ok(Admission::Accepted(id)) => (StatusCode::OK, id.to_string()).into_response(),
        Ok(Admission::Terminating) => terminating(),
        Err(error) => internal_error(error),
    }
}

async fn read_hash(State(service): State<HashService>, Path(raw_id): Path<String>) -> Response {
    if service.coordinator().is_rejecting() {
        return terminating();
    }
    let Ok(id) = raw_id.parse::<RecordId>() else {
        warn!(%raw_id, "rejecting malformed hash id");
        return (StatusCode::BAD_REQUEST, INVALID_HASH_ID).into_response();
    };

    match service.read_value(id).await {
        Ok(Admission::Accepted(Some(value))) => (StatusCode::OK, value).into_response(),
        Ok(Admission::Accepted(None)) => (StatusCode::NOT_FOUND, HASH_NOT_FOUND).into_response(),
        Ok(Admission::Terminating) => terminating(),
        Err(error) => internal_error(error),
    }
}

async fn read_stats(State(service): State<HashService>) -> Response {
    match service.read_stats().await {
        Ok(Admission::Accepted(stats)) => Json(stats).into_response(),
        Ok(Admission::Terminating) => terminating(),
        Err(error) => internal_error(error),
    }
}

async fn shutdown(State(service): State<HashService>) -> String {
    let depth = service.shutdown();
    format!("Terminating the server...{depth}")
}

async fn only_post_hash(State(service): State<HashService>) -> Response {
    wrong_method(&service, ONLY_POST_HASH)
}

async fn only_get_stats(State(service): State<HashService>) -> Response {
    wrong_method(&service, ONLY_GET_STATS)
}

fn wrong_method(service: &HashService, message: &'static str) -> Response {
    if service.coordinator().is_rejecting() {
        return terminating();
    }
    info!(reply = message, "rejecting request with unsupported method");
    (StatusCode::METHOD_NOT_ALLOWED, message).into_response()
}

async fn unsupported() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, UNSUPPORTED_ENDPOINT)
}

fn terminating() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, TERMINATING).into_response()
}

fn internal_error(error: anyhow::Error) -> Response {
    warn!(?error, "record store request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "record store unavailable").into_response()
}
