use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// Row written on registration.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String, // Argon2 PHC string
    pub created_at: OffsetDateTime,
}

/// Columns read back during login. Rows written outside this service may carry NULLs.
#[derive(Debug, Clone, Deserialize)]
pub struct UserCredentials {
    pub user_id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[serde(default, rename = "password")]
    pub password_hash: Option<String>,
}
