use axum::{extract::State, routing::post, Json, Router};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
        password::{hash_password, verify_password},
        repo_types::{NewUser, UserCredentials},
    },
    error::ApiError,
    extract::ApiJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register/", post(register))
        .route("/login_user/", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let password_hash = hash_password(&payload.password)?;

    let user = NewUser {
        user_id: Uuid::new_v4(),
        name: payload.name,
        email: payload.email,
        password_hash,
        created_at: OffsetDateTime::now_utc(),
    };
    user.insert(state.warehouse.as_ref(), &state.users_table()).await?;

    info!(user_id = %user.user_id, email = %user.email, "user registered");
    Ok(Json(RegisterResponse {
        message: "User registered successfully!",
        user_id: user.user_id,
        status: "success",
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = match UserCredentials::find_by_email(
        state.warehouse.as_ref(),
        &state.users_table(),
        &payload.email,
    )
    .await?
    {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "login unknown email");
            return Err(user_not_found());
        }
    };

    let ok = match user.password_hash.as_deref().map(|h| verify_password(&payload.password, h)) {
        Some(Ok(v)) => v,
        Some(Err(e)) => {
            warn!(error = %e, user_id = %user.user_id, "stored password is not a hash");
            false
        }
        None => {
            warn!(user_id = %user.user_id, "stored password is null");
            false
        }
    };

    if !ok {
        warn!(email = %payload.email, user_id = %user.user_id, "login invalid password");
        return Err(user_not_found());
    }

    info!(user_id = %user.user_id, email = %user.email, "user logged in");
    Ok(Json(LoginResponse {
        email: payload.email,
        name: user.name,
        status: "success",
        user_id: user.user_id,
    }))
}

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".into())
}
