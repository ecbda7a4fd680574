use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user_id: Uuid,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub email: String,
    pub name: Option<String>,
    pub status: &'static str,
    pub user_id: Uuid,
}
