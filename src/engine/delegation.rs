/**
 * Admin Delegation Engine
 *
 * Consumes a pending-admin invitation and promotes the invited user to
 * sub-channel admin or channel super-admin. Promotion auto-subscribes the
 * new admin to the group they now run (and, for an institution's primary
 * channel, cascades into the institution's canonical Administration channel
 * and admin seat), then notifies the admin being replaced.
 *
 * The invitation identifier is accepted as either the single-use uuid from
 * the invite link or the invitee's email address. A lookup miss is reported
 * as `PromotionOutcome::LinkExpired`, not as an error - the link was simply
 * already used or never existed.
 */

use std::sync::Arc;

use uuid::Uuid;

use crate::config::InviteConfig;
use crate::domain::{PendingAdmin, User};
use crate::error::{EngineError, EngineResult};
use crate::push::TopicBridge;
use crate::store::{
    ChannelStore, InstitutionStore, PendingAdminStore, Store, SubChannelStore, UserStore,
};
use crate::tokens;

use super::{notify_user, GroupSnapshot, PromotionOutcome};

/// Promotes invited users and consumes pending-admin ledger entries.
pub struct AdminDelegationEngine {
    store: Arc<dyn Store>,
    bridge: Arc<dyn TopicBridge>,
    invite_config: InviteConfig,
}

impl AdminDelegationEngine {
    pub fn new(
        store: Arc<dyn Store>,
        bridge: Arc<dyn TopicBridge>,
        invite_config: InviteConfig,
    ) -> Self {
        Self {
            store,
            bridge,
            invite_config,
        }
    }

    /// Accept an invitation identified by its uuid or the invitee email.
    ///
    /// # Arguments
    /// * `identifier` - Invite uuid (link form) or invitee email
    /// * `device_token` - Device to bind the topic subscription to; falls
    ///   back to the invitee's stored token
    ///
    /// # Returns
    /// `Accepted` with the refreshed group, or `LinkExpired` when no
    /// outstanding invitation matches.
    pub async fn promote(
        &self,
        identifier: &str,
        device_token: Option<&str>,
    ) -> EngineResult<PromotionOutcome> {
        let Some(pending) = self.resolve_pending(identifier).await? else {
            return Ok(PromotionOutcome::LinkExpired);
        };

        // The invitee must have registered with the invited address.
        let user = self
            .store
            .find_user_by_email(&pending.email)
            .await?
            .ok_or_else(|| EngineError::not_found("user", pending.email.clone()))?;

        let group = if let Some(sub_channel_id) = pending.sub_channel_id {
            self.promote_sub_channel_admin(&user, sub_channel_id, device_token)
                .await?
        } else if let Some(channel_id) = pending.channel_id {
            self.promote_channel_admin(&user, channel_id, device_token)
                .await?
        } else {
            return Err(EngineError::invalid_target(
                "pending admin entry has no target",
            ));
        };

        // The invitation is single-use: consume it only after the promotion
        // fully succeeded, so a failed attempt leaves the link valid.
        self.store.delete_pending(pending.id).await?;

        Ok(PromotionOutcome::Accepted {
            user_id: user.id,
            group,
        })
    }

    /// Accept an invitation presented as a bearer token from the invite
    /// email (see `tokens`).
    pub async fn promote_with_token(
        &self,
        token: &str,
        device_token: Option<&str>,
    ) -> EngineResult<PromotionOutcome> {
        let claims = tokens::verify(token, &self.invite_config)?;
        self.promote(&claims.sub, device_token).await
    }

    async fn resolve_pending(&self, identifier: &str) -> EngineResult<Option<PendingAdmin>> {
        // An email never parses as a uuid, so the shape decides the lookup.
        if let Ok(uuid) = Uuid::parse_str(identifier) {
            self.store.find_pending_by_uuid(uuid).await
        } else {
            self.store.find_pending_by_email(identifier).await
        }
    }

    async fn promote_sub_channel_admin(
        &self,
        user: &User,
        sub_channel_id: i64,
        device_token: Option<&str>,
    ) -> EngineResult<GroupSnapshot> {
        let sub_channel = self
            .store
            .find_sub_channel(sub_channel_id)
            .await?
            .ok_or_else(|| EngineError::not_found("subchannel", sub_channel_id))?;

        if sub_channel.admin_id == Some(user.id) {
            return Err(EngineError::AlreadyAdmin {
                group: "subchannel",
            });
        }

        // Captured before the overwrite below.
        let previous_admin = sub_channel.admin_id;

        let already_subscribed = self
            .store
            .is_sub_channel_subscriber(user.id, sub_channel.id)
            .await?;

        if !already_subscribed {
            self.sync_subscribe(&sub_channel.topic_name, user, device_token)
                .await?;
        }

        self.store
            .set_sub_channel_admin(sub_channel.id, Some(user.id))
            .await?;

        if !already_subscribed {
            self.store
                .add_sub_channel_subscriber(user.id, sub_channel.id)
                .await?;
            // The new admin also joins the parent channel.
            self.store
                .add_channel_subscriber(user.id, sub_channel.channel_id)
                .await?;
            if sub_channel.primary_institution_id.is_some() {
                self.store
                    .set_primary_institution(user.id, sub_channel.primary_institution_id)
                    .await?;
            }
        }

        self.notify_replaced_admin(previous_admin, user, &sub_channel.name)
            .await;

        let refreshed = self
            .store
            .find_sub_channel(sub_channel.id)
            .await?
            .ok_or_else(|| EngineError::not_found("subchannel", sub_channel.id))?;

        Ok(GroupSnapshot::SubChannel(refreshed))
    }

    async fn promote_channel_admin(
        &self,
        user: &User,
        channel_id: i64,
        device_token: Option<&str>,
    ) -> EngineResult<GroupSnapshot> {
        let channel = self
            .store
            .find_channel(channel_id)
            .await?
            .ok_or_else(|| EngineError::not_found("channel", channel_id))?;

        if channel.super_admin_id == Some(user.id) {
            return Err(EngineError::AlreadyAdmin { group: "channel" });
        }

        let previous_admin = channel.super_admin_id;

        let already_subscribed = self
            .store
            .is_channel_subscriber(user.id, channel.id)
            .await?;

        if !already_subscribed {
            self.sync_subscribe(&channel.topic_name, user, device_token)
                .await?;
        }

        self.store.set_super_admin(channel.id, user.id).await?;

        if !already_subscribed {
            self.store
                .add_channel_subscriber(user.id, channel.id)
                .await?;
        }

        if let Some(institution_id) = channel.institution_id {
            if channel.is_primary {
                // Running an institution's primary channel makes this user
                // the institution admin and joins them to its canonical
                // Administration channel.
                if let Some(primary) = self
                    .store
                    .find_primary_admin_channel(institution_id)
                    .await?
                {
                    self.store
                        .add_channel_subscriber(user.id, primary.id)
                        .await?;
                }
                self.store
                    .set_institution_admin(institution_id, user.id)
                    .await?;
                self.store
                    .set_primary_institution(user.id, Some(institution_id))
                    .await?;
            }
        }

        if !channel.is_primary {
            // Re-ensure membership on the non-primary path. The add is
            // constraint-backed, so this cannot double-count.
            self.store
                .add_channel_subscriber(user.id, channel.id)
                .await?;
        }

        self.notify_replaced_admin(previous_admin, user, &channel.name)
            .await;

        let refreshed = self
            .store
            .find_channel(channel.id)
            .await?
            .ok_or_else(|| EngineError::not_found("channel", channel.id))?;

        Ok(GroupSnapshot::Channel(refreshed))
    }

    /// Bind the group topic to the accepting device before any local write.
    async fn sync_subscribe(
        &self,
        topic_name: &str,
        user: &User,
        device_token: Option<&str>,
    ) -> EngineResult<()> {
        let token = device_token.or(user.device_token.as_deref());
        let Some(token) = token else {
            tracing::debug!("User {} has no device token; skipping topic sync", user.id);
            return Ok(());
        };

        if !self.bridge.subscribe(topic_name, token).await {
            return Err(EngineError::external("topic subscribe"));
        }
        Ok(())
    }

    async fn notify_replaced_admin(
        &self,
        previous_admin: Option<i64>,
        new_admin: &User,
        group_name: &str,
    ) {
        let body = format!(
            "{} has accepted your request to be a super-admin of {}",
            new_admin.username, group_name
        );
        notify_user(
            self.store.as_ref(),
            self.bridge.as_ref(),
            previous_admin,
            "Admin Request Accepted!",
            &body,
        )
        .await;
    }
}
