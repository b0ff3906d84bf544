//! Product Model

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::util::millis_to_rfc3339;

fn default_true() -> bool {
    true
}

/// Product entity (商品)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[cfg_attr(feature = "db", sqlx(rename = "price_cents"))]
    pub price: Money,
    pub image_url: Option<String>,
    pub stock: i64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub image_url: Option<String>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Update product payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub image_url: Option<String>,
    pub stock: Option<i64>,
    pub is_active: Option<bool>,
}

/// Set stock payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockUpdate {
    pub stock: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductView {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub image_url: Option<String>,
    pub stock: i64,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Product> for ProductView {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            description: p.description.clone(),
            price: p.price,
            image_url: p.image_url.clone(),
            stock: p.stock,
            is_active: p.is_active,
            created_at: millis_to_rfc3339(p.created_at),
            updated_at: millis_to_rfc3339(p.updated_at),
        }
    }
}
