/**
 * Acting Identity
 *
 * Every engine operation receives the authenticated caller as an explicit
 * `ActingIdentity` value instead of consulting ambient authentication state.
 * The transport layer resolves the bearer token to an identity once and
 * passes it down; the engines only compare it against the resources being
 * acted on.
 */

use crate::domain::UserId;
use crate::error::{EngineError, EngineResult};

/// The authenticated caller of an engine operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActingIdentity {
    pub user_id: UserId,
    pub email: String,
}

impl ActingIdentity {
    pub fn new(user_id: UserId, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
        }
    }

    /// Require that the caller is acting on their own behalf.
    ///
    /// Returns `Unauthorized` when the supplied `user_id` does not match the
    /// authenticated identity.
    pub fn ensure_self(&self, user_id: UserId) -> EngineResult<()> {
        if self.user_id != user_id {
            return Err(EngineError::Unauthorized);
        }
        Ok(())
    }
}
