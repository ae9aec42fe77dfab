pub mod admin;
pub mod user;

use std::any::Any;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::BytesRejection, DefaultBodyLimit},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{post, MethodRouter},
    Router,
};
use serde_json::{Map, Value};
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, warn, Level};

use crate::config::ServerConfig;
use crate::store::MessageStore;

/// Largest request body either endpoint will buffer
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Errors surfaced to HTTP callers of either endpoint
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("field `{0}` is missing, empty or not a string")]
    Validation(&'static str),
    #[error("request body is not a JSON object: {0}")]
    MalformedPayload(String),
    #[error("failed to read request body: {0}")]
    UnreadableBody(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = match &self {
            RelayError::Validation(_)
            | RelayError::MalformedPayload(_)
            | RelayError::UnreadableBody(_) => {
                warn!("Rejected request: {}", self);
                StatusCode::BAD_REQUEST
            }
            RelayError::Internal(_) => {
                error!("Request failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        status.into_response()
    }
}

impl From<BytesRejection> for RelayError {
    fn from(rejection: BytesRejection) -> Self {
        RelayError::UnreadableBody(rejection.body_text())
    }
}

/// A validated request body: the user id and the text carried for that user.
///
/// The text is the user's message on the user endpoint and the admin's reply
/// on the admin endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Inbound {
    pub user_id: String,
    pub text: String,
}

impl Inbound {
    /// Parse a JSON object body, requiring non-empty string `user_id` and `text_field`.
    /// The body is read as JSON whatever the request's content type says.
    pub fn parse(body: &[u8], text_field: &'static str) -> Result<Self, RelayError> {
        let object = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(object)) => object,
            Ok(other) => {
                return Err(RelayError::MalformedPayload(format!(
                    "expected an object, got {}",
                    json_kind(&other)
                )))
            }
            Err(e) => return Err(RelayError::MalformedPayload(e.to_string())),
        };

        Ok(Self {
            user_id: required_text(&object, "user_id")?,
            text: required_text(&object, text_field)?,
        })
    }
}

fn required_text(object: &Map<String, Value>, field: &'static str) -> Result<String, RelayError> {
    match object.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        _ => Err(RelayError::Validation(field)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Router for the user-facing listener
pub fn user_router(store: Arc<MessageStore>) -> Router {
    endpoint_router(post(user::handle_message), store)
}

/// Router for the admin-facing listener
pub fn admin_router(store: Arc<MessageStore>) -> Router {
    endpoint_router(post(admin::handle_response), store)
}

// Each listener serves a single write operation, so POST on any path reaches it.
fn endpoint_router(handler: MethodRouter<Arc<MessageStore>>, store: Arc<MessageStore>) -> Router {
    Router::new()
        .route("/", handler.clone())
        .route("/{*path}", handler)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(store)
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    RelayError::Internal(detail).into_response()
}

/// Bind both listeners and serve them until Ctrl-C
pub async fn run(config: &ServerConfig, store: Arc<MessageStore>) -> Result<()> {
    let user_listener = bind(&config.user_addr()).await?;
    let admin_listener = bind(&config.admin_addr()).await?;

    tokio::try_join!(
        serve("User", user_listener, user_router(store.clone())),
        serve("Admin", admin_listener, admin_router(store.clone())),
    )?;

    let unanswered = store.pending_count().await;
    if unanswered > 0 {
        warn!("Discarding {} unanswered message(s) on shutdown", unanswered);
    }

    Ok(())
}

async fn bind(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))
}

/// Serve one listener until Ctrl-C. Failed requests never end the loop.
pub async fn serve(name: &'static str, listener: TcpListener, router: Router) -> Result<()> {
    let addr = listener.local_addr()?;
    info!("{} server running on http://{}", name, addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .with_context(|| format!("{name} server error"))?;

    info!("{} server stopped", name);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
