//! Admin User Model

use serde::{Deserialize, Serialize};

use crate::util::millis_to_rfc3339;

/// Back-office administrator (后台管理员)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Admin login payload
#[derive(Debug, Clone, Deserialize)]
pub struct AdminLogin {
    pub username: String,
    pub password: String,
}

/// Change password payload
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePassword {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUserView {
    pub id: i64,
    pub username: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&AdminUser> for AdminUserView {
    fn from(admin: &AdminUser) -> Self {
        Self {
            id: admin.id,
            username: admin.username.clone(),
            created_at: millis_to_rfc3339(admin.created_at),
            updated_at: millis_to_rfc3339(admin.updated_at),
        }
    }
}
