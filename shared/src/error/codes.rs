//! Unified error codes for the water-ordering service
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: User / address errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Product and upload errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Represented as u16 on the wire; the response envelope renders it as a
/// decimal string (`"0"` for success).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (username/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled
    AccountDisabled = 1007,
    /// Verification code is wrong or expired
    VerificationCodeInvalid = 1010,
    /// Too many wrong verification attempts
    TooManyAttempts = 1011,
    /// Password too short
    PasswordTooShort = 1012,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Admin role required
    AdminRequired = 2003,
    /// Phone number must be verified first
    PhoneNotVerified = 2010,

    // ==================== 3xxx: User / Address ====================
    /// User not found
    UserNotFound = 3001,
    /// Address not found (or not owned by caller)
    AddressNotFound = 3101,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has no items
    OrderEmpty = 4007,
    /// Status change not allowed from the current status
    OrderInvalidTransition = 4010,
    /// Order number collided with an existing order
    OrderNumberConflict = 4011,
    /// Submitted unit price differs from the catalog
    OrderPriceMismatch = 4012,

    // ==================== 5xxx: Payment ====================
    /// Invalid payment method
    PaymentInvalidMethod = 5003,

    // ==================== 6xxx: Product ====================
    /// Product not found
    ProductNotFound = 6001,
    /// Product has invalid price
    ProductInvalidPrice = 6002,
    /// Requested quantity exceeds stock
    ProductOutOfStock = 6003,
    /// Product is not on sale
    ProductInactive = 6004,
    /// Product is referenced by orders
    ProductHasOrders = 6005,

    // ==================== 65xx: File Upload ====================
    /// File too large
    FileTooLarge = 6501,
    /// Unsupported file format
    UnsupportedFileFormat = 6502,
    /// Invalid/corrupted image file
    InvalidImageFile = 6503,
    /// No file provided in request
    NoFileProvided = 6504,
    /// Empty file provided
    EmptyFile = 6505,
    /// File storage failed
    FileStorageFailed = 6509,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid username or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::AccountDisabled => "Account is disabled",
            ErrorCode::VerificationCodeInvalid => "Verification code is wrong or expired",
            ErrorCode::TooManyAttempts => "Too many attempts, request a new code",
            ErrorCode::PasswordTooShort => "Password is too short",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::AdminRequired => "Administrator role is required",
            ErrorCode::PhoneNotVerified => "Phone number must be verified first",

            // User / Address
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::AddressNotFound => "Address not found",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderEmpty => "Order has no items",
            ErrorCode::OrderInvalidTransition => "Order status does not allow this operation",
            ErrorCode::OrderNumberConflict => "Order number conflict, please retry",
            ErrorCode::OrderPriceMismatch => "Product price has changed",

            // Payment
            ErrorCode::PaymentInvalidMethod => "Invalid payment method",

            // Product
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductInvalidPrice => "Product has invalid price",
            ErrorCode::ProductOutOfStock => "Insufficient stock",
            ErrorCode::ProductInactive => "Product is not on sale",
            ErrorCode::ProductHasOrders => "Product is referenced by orders",

            // Upload
            ErrorCode::FileTooLarge => "File is too large",
            ErrorCode::UnsupportedFileFormat => "Unsupported file format",
            ErrorCode::InvalidImageFile => "Invalid image file",
            ErrorCode::NoFileProvided => "No file provided",
            ErrorCode::EmptyFile => "Empty file provided",
            ErrorCode::FileStorageFailed => "Failed to store file",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting an unknown u16 into [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid error code: {0}")]
pub struct InvalidErrorCode(pub u16);

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => ErrorCode::Success,
            1 => ErrorCode::Unknown,
            2 => ErrorCode::ValidationFailed,
            3 => ErrorCode::NotFound,
            4 => ErrorCode::AlreadyExists,
            5 => ErrorCode::InvalidRequest,

            1001 => ErrorCode::NotAuthenticated,
            1002 => ErrorCode::InvalidCredentials,
            1003 => ErrorCode::TokenExpired,
            1004 => ErrorCode::TokenInvalid,
            1007 => ErrorCode::AccountDisabled,
            1010 => ErrorCode::VerificationCodeInvalid,
            1011 => ErrorCode::TooManyAttempts,
            1012 => ErrorCode::PasswordTooShort,

            2001 => ErrorCode::PermissionDenied,
            2003 => ErrorCode::AdminRequired,
            2010 => ErrorCode::PhoneNotVerified,

            3001 => ErrorCode::UserNotFound,
            3101 => ErrorCode::AddressNotFound,

            4001 => ErrorCode::OrderNotFound,
            4007 => ErrorCode::OrderEmpty,
            4010 => ErrorCode::OrderInvalidTransition,
            4011 => ErrorCode::OrderNumberConflict,
            4012 => ErrorCode::OrderPriceMismatch,

            5003 => ErrorCode::PaymentInvalidMethod,

            6001 => ErrorCode::ProductNotFound,
            6002 => ErrorCode::ProductInvalidPrice,
            6003 => ErrorCode::ProductOutOfStock,
            6004 => ErrorCode::ProductInactive,
            6005 => ErrorCode::ProductHasOrders,

            6501 => ErrorCode::FileTooLarge,
            6502 => ErrorCode::UnsupportedFileFormat,
            6503 => ErrorCode::InvalidImageFile,
            6504 => ErrorCode::NoFileProvided,
            6505 => ErrorCode::EmptyFile,
            6509 => ErrorCode::FileStorageFailed,

            9001 => ErrorCode::InternalError,
            9002 => ErrorCode::DatabaseError,
            9005 => ErrorCode::ConfigError,

            other => return Err(InvalidErrorCode(other)),
        };
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::OrderNotFound.code(), 4001);
        assert_eq!(ErrorCode::ProductOutOfStock.code(), 6003);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_try_from_known_and_unknown() {
        assert_eq!(ErrorCode::try_from(4010), Ok(ErrorCode::OrderInvalidTransition));
        assert_eq!(ErrorCode::try_from(6004), Ok(ErrorCode::ProductInactive));
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&ErrorCode::AddressNotFound).unwrap();
        assert_eq!(json, "3101");
        let code: ErrorCode = serde_json::from_str("6003").unwrap();
        assert_eq!(code, ErrorCode::ProductOutOfStock);
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorCode::OrderEmpty.to_string(), "4007");
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::NotFound.is_success());
    }
}
