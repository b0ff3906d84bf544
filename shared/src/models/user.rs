//! User Model

use serde::{Deserialize, Serialize};

use crate::util::millis_to_rfc3339;

/// Consumer account (手机号登录用户)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub phone: Option<String>,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
    pub phone_verified: bool,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Update profile payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
}

/// External representation of a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: i64,
    pub phone: Option<String>,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
    pub phone_verified: bool,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            phone: user.phone.clone(),
            nickname: user.nickname.clone(),
            avatar_url: user.avatar_url.clone(),
            phone_verified: user.phone_verified,
            is_active: user.is_active,
            created_at: millis_to_rfc3339(user.created_at),
            updated_at: millis_to_rfc3339(user.updated_at),
        }
    }
}
