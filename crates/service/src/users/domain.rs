use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registration input; `password` is plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub full_name: String,
}

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Stored user; `password` is the hex digest, never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uuid: Uuid,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub full_name: String,
}
