use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{ServerOptions, ServerState, router, run_with_listener};

mod checks;
mod server;
mod user;

pub mod types {
    pub mod user {
        pub use api_types::user::{SignIn, SignUp, TokenPair, UserUpdate, UserView};
    }

    pub mod check {
        pub use api_types::check::{
            CheckFilter, CheckListResponse, CheckNew, CheckView, OrderBy, PaymentNew, PaymentView,
            ProductNew, ProductView,
        };
    }
}

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        EngineError::InvalidInput(_) | EngineError::InvalidAmount(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EngineError::InvalidConfig(_) | EngineError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::InvalidConfig(reason) => {
            tracing::error!("invalid configuration: {reason}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
