//! Sign-up, sign-in, token refresh and profile endpoints.

use api_types::user::{SignIn, SignUp, TokenPair, UserUpdate, UserView};
use axum::{Extension, Json, extract::State, http::StatusCode};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use engine::User;

use crate::{ServerError, server::ServerState};

fn token_pair(pair: engine::TokenPair) -> TokenPair {
    TokenPair {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    }
}

fn user_view(user: User) -> UserView {
    UserView {
        id: user.id,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        phone_number: user.phone_number,
        email: user.email,
        check_symbols: user.check_symbols,
    }
}

pub async fn signup(
    State(state): State<ServerState>,
    Json(payload): Json<SignUp>,
) -> Result<(StatusCode, Json<TokenPair>), ServerError> {
    let pair = state
        .engine
        .create_user(engine::UserNew {
            username: payload.username,
            first_name: payload.first_name,
            last_name: payload.last_name,
            phone_number: payload.phone_number,
            email: payload.email,
            password1: payload.password1,
            password2: payload.password2,
        })
        .await?;
    tracing::info!("new user signed up");

    Ok((StatusCode::CREATED, Json(token_pair(pair))))
}

pub async fn signin(
    State(state): State<ServerState>,
    Json(payload): Json<SignIn>,
) -> Result<Json<TokenPair>, ServerError> {
    let pair = state
        .engine
        .sign_in(&payload.username, &payload.password)
        .await?;
    Ok(Json(token_pair(pair)))
}

/// Trades the refresh token carried as bearer for a new token pair.
pub async fn refresh(
    State(state): State<ServerState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<TokenPair>, ServerError> {
    let pair = state.engine.refresh(bearer.token()).await?;
    Ok(Json(token_pair(pair)))
}

pub async fn me(Extension(user): Extension<User>) -> Json<UserView> {
    Json(user_view(user))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<UserView>, ServerError> {
    let user = state
        .engine
        .update_user(
            user.id,
            engine::UserUpdate {
                first_name: payload.first_name,
                last_name: payload.last_name,
                phone_number: payload.phone_number,
                email: payload.email,
                check_symbols: payload.check_symbols,
            },
        )
        .await?;
    Ok(Json(user_view(user)))
}
