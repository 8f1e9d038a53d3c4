use axum::{
    Json, Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};
use serde::Serialize;

use std::sync::Arc;

use crate::{ServerError, checks, user};
use engine::{Engine, EngineError};

/// HTTP surface settings.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    /// Path every route is mounted under, e.g. `/api/v1`.
    pub prefix: String,
    /// Scheme and host used to build links to rendered receipts.
    pub public_url: String,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            prefix: "/api/v1".to_string(),
            public_url: "http://127.0.0.1:3000".to_string(),
        }
    }
}

impl ServerOptions {
    /// Prefix with a leading slash and no trailing one. Empty means root.
    pub(crate) fn normalized_prefix(&self) -> String {
        let trimmed = self.prefix.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }

    /// Public link to the HTML rendering of a check.
    pub(crate) fn check_url(&self, check_id: i64) -> String {
        format!(
            "{}{}/checks/{check_id}",
            self.public_url.trim_end_matches('/'),
            self.normalized_prefix()
        )
    }
}

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub options: Arc<ServerOptions>,
}

impl ServerState {
    pub fn new(engine: Engine, options: ServerOptions) -> Self {
        Self {
            engine: Arc::new(engine),
            options: Arc::new(options),
        }
    }
}

/// Resolves the bearer access token into a [`engine::User`] stored in the
/// request extensions.
async fn auth(
    auth_header: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let TypedHeader(Authorization(bearer)) = auth_header.map_err(|rejection| {
        ServerError::from(EngineError::Unauthorized(rejection.to_string()))
    })?;

    let user = state.engine.authenticate(bearer.token()).await.map_err(|err| {
        tracing::debug!("rejected access token: {err}");
        err
    })?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .route("/users/me", get(user::me))
        .route("/users/update", patch(user::update))
        .route("/checks", get(checks::list))
        .route("/checks/", get(checks::list))
        .route("/checks/create", post(checks::create))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    let api = Router::new()
        .route("/health", get(health))
        .route("/users/signup", post(user::signup))
        .route("/users/signin", post(user::signin))
        .route("/users/refresh", get(user::refresh))
        .route("/checks/{id}", get(checks::detail))
        .route("/checks/{id}/text", get(checks::text))
        .merge(protected);

    let prefix = state.options.normalized_prefix();
    let api = api.with_state(state);
    if prefix.is_empty() {
        api
    } else {
        Router::new().nest(&prefix, api)
    }
}

pub async fn run_with_listener(
    engine: Engine,
    options: ServerOptions,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(
        "Server listening on {} under '{}'",
        addr,
        options.normalized_prefix()
    );

    axum::serve(listener, router(ServerState::new(engine, options))).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(prefix: &str, public_url: &str) -> ServerOptions {
        ServerOptions {
            prefix: prefix.to_string(),
            public_url: public_url.to_string(),
        }
    }

    #[test]
    fn prefix_is_normalized() {
        assert_eq!(options("/api/v1", "").normalized_prefix(), "/api/v1");
        assert_eq!(options("api/v1/", "").normalized_prefix(), "/api/v1");
        assert_eq!(options("/", "").normalized_prefix(), "");
        assert_eq!(options("", "").normalized_prefix(), "");
    }

    #[test]
    fn check_url_joins_public_url_and_prefix() {
        assert_eq!(
            options("/api/v1", "https://receipts.example/").check_url(42),
            "https://receipts.example/api/v1/checks/42"
        );
        assert_eq!(
            options("", "http://localhost:8000").check_url(7),
            "http://localhost:8000/checks/7"
        );
    }
}
