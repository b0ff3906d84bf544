//! Address Model

use serde::{Deserialize, Serialize};

use crate::util::millis_to_rfc3339;

/// Shipping address (收货地址)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Address {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub phone: String,
    pub province: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub detail: String,
    pub is_default: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create address payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressCreate {
    pub name: String,
    pub phone: String,
    pub province: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub detail: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Update address payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddressUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub detail: Option<String>,
    pub is_default: Option<bool>,
}

/// Address fields copied onto an order at creation time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressSnapshot {
    pub name: String,
    pub phone: String,
    pub province: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub detail: String,
}

impl From<&Address> for AddressSnapshot {
    fn from(a: &Address) -> Self {
        Self {
            name: a.name.clone(),
            phone: a.phone.clone(),
            province: a.province.clone(),
            city: a.city.clone(),
            district: a.district.clone(),
            detail: a.detail.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressView {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub phone: String,
    pub province: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub detail: String,
    pub is_default: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Address> for AddressView {
    fn from(a: &Address) -> Self {
        Self {
            id: a.id,
            user_id: a.user_id,
            name: a.name.clone(),
            phone: a.phone.clone(),
            province: a.province.clone(),
            city: a.city.clone(),
            district: a.district.clone(),
            detail: a.detail.clone(),
            is_default: a.is_default,
            created_at: millis_to_rfc3339(a.created_at),
            updated_at: millis_to_rfc3339(a.updated_at),
        }
    }
}
