/**
 * Pending Admin Ledger
 *
 * Issues admin invitations: validates the target, authorizes the caller,
 * records (or refreshes) the at-most-one pending entry per target, and
 * returns the short-lived bearer token the invitee presents to accept.
 *
 * Email delivery is owned elsewhere; if the invited address already belongs
 * to a registered user, a best-effort push notification tells them about
 * the invitation.
 */

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::InviteConfig;
use crate::domain::{Channel, ChannelId, GroupRef, SubChannelId, UserId};
use crate::error::{EngineError, EngineResult};
use crate::identity::ActingIdentity;
use crate::push::TopicBridge;
use crate::store::{ChannelStore, PendingAdminStore, Store, SubChannelStore, UserStore};
use crate::tokens;

use super::notify_device;

/// Which kind of group an invitation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InviteTarget {
    Channel,
    Subchannel,
}

impl fmt::Display for InviteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InviteTarget::Channel => write!(f, "Channel"),
            InviteTarget::Subchannel => write!(f, "Subchannel"),
        }
    }
}

/// Input for `request_admin`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminInviteRequest {
    /// The user sending the invitation
    pub acting_user_id: UserId,
    /// The address being invited
    pub email: String,
    /// Target channel - exactly one of this and `sub_channel_id` must be set
    pub channel_id: Option<ChannelId>,
    /// Target sub-channel
    pub sub_channel_id: Option<SubChannelId>,
}

/// A recorded invitation: the bearer token for the acceptance step plus the
/// target kind it was issued for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminInvite {
    pub token: String,
    pub target: InviteTarget,
}

/// Issues and refreshes pending-admin invitations.
pub struct InviteEngine {
    store: Arc<dyn Store>,
    bridge: Arc<dyn TopicBridge>,
    config: InviteConfig,
}

impl InviteEngine {
    pub fn new(store: Arc<dyn Store>, bridge: Arc<dyn TopicBridge>, config: InviteConfig) -> Self {
        Self {
            store,
            bridge,
            config,
        }
    }

    /// Record an admin invitation for a channel or sub-channel.
    ///
    /// Validation failures and authorization failures are reported before
    /// any row is written. A pending entry already recorded for the target
    /// is refreshed in place; its uuid rotates only when the invited email
    /// changes, so re-sending the same invite keeps the original link alive.
    pub async fn request_admin(
        &self,
        identity: &ActingIdentity,
        request: AdminInviteRequest,
    ) -> EngineResult<AdminInvite> {
        if request.email.trim().is_empty() {
            return Err(EngineError::validation("email", "email is required"));
        }

        let target = match (request.channel_id, request.sub_channel_id) {
            (Some(_), Some(_)) => {
                return Err(EngineError::invalid_target(
                    "Channel id OR subchannel id (not both) required for an admin request",
                ))
            }
            (None, None) => {
                return Err(EngineError::invalid_target(
                    "Incomplete request, channel id or subchannel id required",
                ))
            }
            (Some(channel_id), None) => GroupRef::Channel(channel_id),
            (None, Some(sub_channel_id)) => GroupRef::SubChannel(sub_channel_id),
        };

        let (group_name, authorizing_channel) = self.resolve_target(target).await?;

        // The caller must run the (parent) channel or be inviting on their
        // own account.
        let is_super_admin = authorizing_channel.super_admin_id == Some(identity.user_id);
        if !is_super_admin && identity.user_id != request.acting_user_id {
            return Err(EngineError::Unauthorized);
        }

        let inviter = self
            .store
            .find_user(request.acting_user_id)
            .await?
            .ok_or_else(|| EngineError::not_found("user", request.acting_user_id))?;

        let pending = match self.store.find_pending_for_target(target).await? {
            Some(existing) => {
                let rotate = existing.email != request.email;
                self.store
                    .update_pending_email(existing.id, &request.email, rotate.then(Uuid::new_v4))
                    .await?
            }
            None => {
                self.store
                    .create_pending(&request.email, target, Uuid::new_v4())
                    .await?
            }
        };

        let token = tokens::issue(&pending, &self.config)?;

        // Registered invitees hear about it right away; unregistered ones
        // find out through the (externally delivered) email.
        if let Some(invitee) = self.store.find_user_by_email(&request.email).await? {
            let title = format!(
                "{} has invited you to manage {}",
                inviter.username, group_name
            );
            notify_device(
                self.bridge.as_ref(),
                invitee.device_token.as_deref(),
                &title,
                "Open the app to accept the invitation.",
            )
            .await;
        }

        let target_kind = match target {
            GroupRef::Channel(_) => InviteTarget::Channel,
            GroupRef::SubChannel(_) => InviteTarget::Subchannel,
        };

        Ok(AdminInvite {
            token,
            target: target_kind,
        })
    }

    /// The invited group's name plus the channel whose super-admin can
    /// authorize invites for it (the channel itself, or a sub-channel's
    /// parent).
    async fn resolve_target(&self, target: GroupRef) -> EngineResult<(String, Channel)> {
        match target {
            GroupRef::Channel(channel_id) => {
                let channel = self
                    .store
                    .find_channel(channel_id)
                    .await?
                    .ok_or_else(|| EngineError::not_found("channel", channel_id))?;
                Ok((channel.name.clone(), channel))
            }
            GroupRef::SubChannel(sub_channel_id) => {
                let sub_channel = self
                    .store
                    .find_sub_channel(sub_channel_id)
                    .await?
                    .ok_or_else(|| EngineError::not_found("subchannel", sub_channel_id))?;
                let parent = self
                    .store
                    .find_channel(sub_channel.channel_id)
                    .await?
                    .ok_or_else(|| EngineError::not_found("channel", sub_channel.channel_id))?;
                Ok((sub_channel.name.clone(), parent))
            }
        }
    }
}
