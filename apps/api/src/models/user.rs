use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::engine::GeneratedUser;

/// Marketplace member. Credentials live with the auth layer, not here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub username: Option<String>,
    pub avatar: Option<String>,
}

/// Insert payload for the users table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub avatar: String,
}

impl NewUser {
    pub fn from_profile(profile: &GeneratedUser) -> Self {
        Self {
            email: profile.email.clone(),
            username: profile.username.clone(),
            avatar: profile.avatar.clone(),
        }
    }
}
