//! HTTP status code mapping for error codes
//!
//! Business failures travel inside a 200 envelope. Only authentication and
//! authorization rejections keep a transport status, so clients can send the
//! user back to the login page.

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the HTTP status code used when this error is returned
    pub fn http_status(&self) -> StatusCode {
        match self {
            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::AccountDisabled => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied | Self::AdminRequired | Self::PhoneNotVerified => {
                StatusCode::FORBIDDEN
            }

            // Everything else is a logical failure carried in the envelope
            _ => StatusCode::OK,
        }
    }
}
