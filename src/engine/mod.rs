/**
 * Engines
 *
 * The consistency core: every operation that has to keep membership rows,
 * subscriber counters, admin assignments, and external push-topic state in
 * agreement lives here.
 *
 * - `SubscriptionEngine` - toggling a user in and out of a group
 * - `AdminDelegationEngine` - consuming an admin invitation
 * - `InviteEngine` - issuing admin invitations (the pending-admin ledger)
 * - `SubAdminEngine` - a channel's sub-admin roster
 *
 * # Ordering discipline
 *
 * Topic-state changes at the push provider happen BEFORE the local writes
 * they mirror. Provider refusal aborts the operation with no local mutation,
 * so local membership and remote topic state cannot diverge. Notifications
 * to other parties are best-effort: sent after the local writes, failures
 * logged and swallowed.
 */

mod delegation;
mod invite;
mod sub_admins;
mod subscription;

pub use delegation::AdminDelegationEngine;
pub use invite::{AdminInvite, AdminInviteRequest, InviteEngine, InviteTarget};
pub use sub_admins::SubAdminEngine;
pub use subscription::SubscriptionEngine;

use serde::{Deserialize, Serialize};

use crate::domain::{Channel, SubChannel, User, UserId};
use crate::push::{PushTarget, TopicBridge};
use crate::store::UserStore;

/// The refreshed group entity returned by an engine operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GroupSnapshot {
    Channel(Channel),
    SubChannel(SubChannel),
}

impl GroupSnapshot {
    /// The group's display name.
    pub fn name(&self) -> &str {
        match self {
            GroupSnapshot::Channel(channel) => &channel.name,
            GroupSnapshot::SubChannel(sub_channel) => &sub_channel.name,
        }
    }

    /// The group's current subscriber count.
    pub fn subscribers(&self) -> i64 {
        match self {
            GroupSnapshot::Channel(channel) => channel.subscribers,
            GroupSnapshot::SubChannel(sub_channel) => sub_channel.subscribers,
        }
    }
}

/// Which way a subscription toggle went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToggleAction {
    Subscribed,
    Unsubscribed,
}

/// Result of a subscription toggle: the refreshed group plus a
/// human-readable status message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleOutcome {
    pub action: ToggleAction,
    pub message: String,
    pub group: GroupSnapshot,
}

/// Result of an admin promotion attempt.
///
/// `LinkExpired` is a normal outcome, not an error: the invitation was
/// already consumed or never existed, and the caller shows the invitee an
/// "expired link" screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PromotionOutcome {
    Accepted {
        user_id: UserId,
        group: GroupSnapshot,
    },
    LinkExpired,
}

impl PromotionOutcome {
    /// Human-readable status line for logs and legacy callers.
    pub fn message(&self) -> &'static str {
        match self {
            PromotionOutcome::Accepted { .. } => "Admin request successfully accepted",
            PromotionOutcome::LinkExpired => "Link expired",
        }
    }
}

/// Best-effort push to a single device. Refusals and missing tokens are
/// logged, never propagated.
pub(crate) async fn notify_device(
    bridge: &dyn TopicBridge,
    device_token: Option<&str>,
    title: &str,
    body: &str,
) {
    let Some(token) = device_token else {
        tracing::debug!("Skipping notification '{title}': recipient has no device token");
        return;
    };

    let target = PushTarget::Token(token.to_string());
    if !bridge.send(&target, title, body).await {
        tracing::warn!("Failed to deliver notification '{title}'");
    }
}

/// Best-effort push to a user looked up by id.
pub(crate) async fn notify_user(
    store: &dyn crate::store::Store,
    bridge: &dyn TopicBridge,
    user_id: Option<UserId>,
    title: &str,
    body: &str,
) {
    let Some(user_id) = user_id else {
        return;
    };

    match store.find_user(user_id).await {
        Ok(Some(User { device_token, .. })) => {
            notify_device(bridge, device_token.as_deref(), title, body).await;
        }
        Ok(None) => {
            tracing::debug!("Skipping notification '{title}': user {user_id} not found");
        }
        Err(e) => {
            tracing::warn!("Skipping notification '{title}': {e}");
        }
    }
}
