/**
 * Error to Status-Class Conversion
 *
 * The engines do not know about HTTP, but every error kind maps to an
 * HTTP-equivalent status class that the (excluded) controller layer is
 * expected to preserve end-to-end.
 */

use super::types::EngineError;

/// HTTP-equivalent status class for an engine error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 400 - validation or target errors, already-admin no-op signal
    BadRequest,
    /// 401 - identity mismatch or bad bearer token
    Unauthorized,
    /// 404 - referenced entity absent
    NotFound,
    /// 502 - the push provider refused a topic-state operation
    BadGateway,
    /// 500 - infrastructure failure
    Internal,
}

impl StatusClass {
    /// Numeric HTTP status code equivalent.
    pub fn as_u16(self) -> u16 {
        match self {
            StatusClass::BadRequest => 400,
            StatusClass::Unauthorized => 401,
            StatusClass::NotFound => 404,
            StatusClass::BadGateway => 502,
            StatusClass::Internal => 500,
        }
    }
}

impl EngineError {
    /// The status class a transport layer should report for this error.
    pub fn status_class(&self) -> StatusClass {
        match self {
            EngineError::Unauthorized | EngineError::Token(_) => StatusClass::Unauthorized,
            EngineError::NotFound { .. } => StatusClass::NotFound,
            EngineError::AlreadyAdmin { .. }
            | EngineError::InvalidTarget { .. }
            | EngineError::Validation { .. } => StatusClass::BadRequest,
            EngineError::ExternalService { .. } => StatusClass::BadGateway,
            EngineError::Database(_) => StatusClass::Internal,
        }
    }
}
