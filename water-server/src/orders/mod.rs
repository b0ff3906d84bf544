//! Order lifecycle
//!
//! - **service**: OrderService (create / query / cancel / pay / fulfilment)
//! - **error**: OrderError, converted to `AppError` at the API boundary
//!
//! Stock is reserved with a conditional decrement inside the order
//! transaction and restored on cancellation.

mod error;
mod service;

#[cfg(test)]
mod tests;

pub use error::{OrderError, OrderResult};
pub use service::{ORDER_NO_ATTEMPTS, OrderService};
