//! # Response Envelope
//!
//! The uniform result shape every exposed operation returns.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Success:  { "success": true,  "message": "...", "data": { ... } }     │
//! │  Success:  { "success": true,  "message": "...", "data": null }        │
//! │  Failure:  { "success": false, "message": "...", "data": null }        │
//! │                                                                         │
//! │  Callers branch on `success`; `message` is always human-readable.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Uniform result envelope for all exposed operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response<T> {
    /// Whether the operation succeeded.
    pub success: bool,

    /// Human-readable outcome message.
    pub message: String,

    /// Payload on success, when the operation produces one.
    pub data: Option<T>,
}

impl<T> Response<T> {
    /// Successful response without a payload.
    pub fn ok(message: impl Into<String>) -> Self {
        Response {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    /// Successful response carrying a payload.
    pub fn ok_with(message: impl Into<String>, data: T) -> Self {
        Response {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Failed response with a message.
    pub fn fail(message: impl Into<String>) -> Self {
        Response {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    /// Converts a service error into a failed envelope.
    ///
    /// Unexpected errors were already logged (with internal detail) where
    /// they were classified; only the public message travels outward.
    pub fn from_error(err: ServiceError) -> Self {
        Response::fail(err.message)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;

    #[test]
    fn test_ok_with_payload() {
        let resp = Response::ok_with("Cart retrieved successfully", 42);
        assert!(resp.success);
        assert_eq!(resp.data, Some(42));
    }

    #[test]
    fn test_from_error_is_failure() {
        let resp: Response<()> = Response::from_error(ServiceError::not_found("Cart", "c-1"));
        assert!(!resp.success);
        assert_eq!(resp.message, "Cart not found: c-1");
        assert!(resp.data.is_none());
    }

    #[test]
    fn test_envelope_serialization_shape() {
        let resp = Response::ok_with("ok", 1);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "ok");
        assert_eq!(json["data"], 1);
    }
}
