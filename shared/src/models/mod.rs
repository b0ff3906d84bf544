//! Data models
//!
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY), timestamps are UTC
//! milliseconds. `*View` types are the stable external representation.

pub mod address;
pub mod admin_user;
pub mod order;
pub mod product;
pub mod user;

// Re-exports
pub use address::*;
pub use admin_user::*;
pub use order::*;
pub use product::*;
pub use user::*;
