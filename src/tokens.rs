/**
 * Pending-Admin Invite Tokens
 *
 * This module issues and verifies the short-lived bearer tokens returned by
 * an admin invitation. The token carries the invitation's single-use uuid,
 * the invitee email, and the target group, and expires after the configured
 * lifetime (72 hours by default).
 */

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::InviteConfig;
use crate::domain::PendingAdmin;
use crate::error::{EngineError, EngineResult};

/// Claims carried by a pending-admin invite token
#[derive(Debug, Serialize, Deserialize)]
pub struct InviteClaims {
    /// Single-use invitation uuid
    pub sub: String,
    /// Invitee email
    pub email: String,
    /// Target kind, "Channel" or "Subchannel"
    pub target: String,
    /// Target group id
    pub target_id: i64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Issue a bearer token for a pending-admin invitation.
///
/// # Arguments
/// * `pending` - The ledger entry the token authorizes
/// * `config` - Secret and lifetime settings
///
/// # Returns
/// Signed token string
pub fn issue(pending: &PendingAdmin, config: &InviteConfig) -> EngineResult<String> {
    let now = now_unix();
    let exp = now + (config.ttl_hours.max(0) as u64) * 60 * 60;

    let (target, target_id) = match (pending.sub_channel_id, pending.channel_id) {
        (Some(id), _) => ("Subchannel", id),
        (None, Some(id)) => ("Channel", id),
        (None, None) => {
            return Err(EngineError::invalid_target(
                "pending admin entry has no target",
            ))
        }
    };

    let claims = InviteClaims {
        sub: pending.uuid.to_string(),
        email: pending.email.clone(),
        target: target.to_string(),
        target_id,
        exp,
        iat: now,
    };

    let key = EncodingKey::from_secret(config.secret.as_ref());
    Ok(encode(&Header::default(), &claims, &key)?)
}

/// Verify and decode a pending-admin invite token.
///
/// # Arguments
/// * `token` - Bearer token string
/// * `config` - Secret settings the token was issued with
///
/// # Returns
/// Decoded claims or a `Token` error for a forged/expired token
pub fn verify(token: &str, config: &InviteConfig) -> EngineResult<InviteClaims> {
    let key = DecodingKey::from_secret(config.secret.as_ref());
    let validation = Validation::default();

    let token_data = decode::<InviteClaims>(token, &key, &validation)?;
    Ok(token_data.claims)
}
