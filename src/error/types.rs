use thiserror::Error;

/// Errors produced by the subscription and admin-delegation engines.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The acting identity is not allowed to perform this operation
    #[error("Unauthorized")]
    Unauthorized,

    /// A referenced entity does not exist
    #[error("{entity} '{key}' not found")]
    NotFound {
        /// Entity kind, e.g. "user", "channel"
        entity: &'static str,
        /// The lookup key that missed (id or email)
        key: String,
    },

    /// The invited user already holds the admin role on the target group
    #[error("Already an admin of the {group}")]
    AlreadyAdmin {
        /// "channel" or "subchannel"
        group: &'static str,
    },

    /// Exactly one of channel / sub-channel must be targeted
    #[error("{message}")]
    InvalidTarget {
        /// Human-readable description of the target mismatch
        message: String,
    },

    /// Input validation failure, reported before any state is mutated
    #[error("Validation error in field '{field}': {message}")]
    Validation {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// The push Topic Bridge refused a topic-state operation
    #[error("External service failure during {operation}")]
    ExternalService {
        /// The bridge operation that failed, e.g. "topic subscribe"
        operation: &'static str,
    },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invite-token encoding or verification error
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl EngineError {
    /// Create a `NotFound` error for an entity looked up by any key type.
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Create an `InvalidTarget` error.
    pub fn invalid_target(message: impl Into<String>) -> Self {
        Self::InvalidTarget {
            message: message.into(),
        }
    }

    /// Create a `Validation` error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an `ExternalService` error for a failed bridge operation.
    pub fn external(operation: &'static str) -> Self {
        Self::ExternalService { operation }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_formats_key() {
        let err = EngineError::not_found("user", 42);
        assert_eq!(err.to_string(), "user '42' not found");

        let err = EngineError::not_found("user", "a@b.com");
        assert_eq!(err.to_string(), "user 'a@b.com' not found");
    }

    #[test]
    fn test_already_admin_display() {
        let err = EngineError::AlreadyAdmin { group: "subchannel" };
        assert_eq!(err.to_string(), "Already an admin of the subchannel");
    }

    #[test]
    fn test_external_display() {
        let err = EngineError::external("topic subscribe");
        assert!(err.to_string().contains("topic subscribe"));
    }
}
