//! Wire models for the error payloads Google APIs answer probes with.
//!
//! Two shapes occur across the probed surfaces: the structured
//! `{"error": {"code": ..., "message": ...}}` object used by the
//! googleapis.com endpoints, and the bare `{"error": "..."}` string the
//! Realtime Database REST API returns. Checks parse these to distinguish an
//! explicit denial (a secure project) from a response they cannot classify.

use serde::Deserialize;

/// Structured error payload returned by googleapis.com endpoints.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetails,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetails {
    pub code: u16,
    pub message: String,
    pub status: Option<String>,
    pub errors: Option<Vec<ApiSubError>>,
}

#[derive(Debug, Deserialize)]
pub struct ApiSubError {
    pub message: String,
    pub domain: Option<String>,
    pub reason: Option<String>,
}

impl ApiErrorResponse {
    /// Parses a response body, returning `None` when the body is not the
    /// structured error shape.
    pub fn parse(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }

    pub fn display_message(&self) -> String {
        format!("{} (code: {})", self.error.message, self.error.code)
    }

    /// True when the payload states an authorization denial: HTTP 401/403
    /// semantics expressed either through the embedded code or the RPC
    /// status string.
    pub fn is_permission_denial(&self) -> bool {
        if matches!(self.error.code, 401 | 403) {
            return true;
        }
        matches!(
            self.error.status.as_deref(),
            Some("PERMISSION_DENIED") | Some("UNAUTHENTICATED")
        )
    }
}

/// Denial payload of the Realtime Database REST API, e.g.
/// `{"error": "Permission denied"}`.
#[derive(Debug, Deserialize)]
pub struct RtdbErrorResponse {
    pub error: String,
}

impl RtdbErrorResponse {
    pub fn parse(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }
}
