/**
 * Subscription Engine
 *
 * Toggles a user's membership in a channel or sub-channel, reconciling the
 * membership row, the group's subscriber counter, and the push-topic
 * subscription as one unit. A toggle is never idempotent: calling twice
 * subscribes and then unsubscribes.
 *
 * The topic-state call at the provider happens first; only after the
 * provider confirms does the membership row (and with it the counter) move.
 * The group's current admin is notified about the event afterwards,
 * best-effort.
 */

use std::sync::Arc;

use crate::domain::{Channel, GroupRef, SubChannel, User, UserId};
use crate::error::{EngineError, EngineResult};
use crate::identity::ActingIdentity;
use crate::push::TopicBridge;
use crate::store::{ChannelStore, Store, SubChannelStore, UserStore};

use super::{notify_user, GroupSnapshot, ToggleAction, ToggleOutcome};

#[derive(Clone, Copy)]
enum TopicOp {
    Subscribe,
    Unsubscribe,
}

/// Toggles subscriptions and keeps device-token topic state current.
pub struct SubscriptionEngine {
    store: Arc<dyn Store>,
    bridge: Arc<dyn TopicBridge>,
}

impl SubscriptionEngine {
    pub fn new(store: Arc<dyn Store>, bridge: Arc<dyn TopicBridge>) -> Self {
        Self { store, bridge }
    }

    /// Toggle `user_id`'s membership in the referenced group.
    ///
    /// # Arguments
    /// * `identity` - The authenticated caller; must match `user_id`
    /// * `user_id` - The user whose membership is toggled
    /// * `target` - The channel or sub-channel to toggle
    ///
    /// # Returns
    /// The refreshed group and which way the toggle went.
    pub async fn toggle(
        &self,
        identity: &ActingIdentity,
        user_id: UserId,
        target: GroupRef,
    ) -> EngineResult<ToggleOutcome> {
        identity.ensure_self(user_id)?;

        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| EngineError::not_found("user", user_id))?;

        match target {
            GroupRef::Channel(channel_id) => self.toggle_channel(&user, channel_id).await,
            GroupRef::SubChannel(sub_channel_id) => {
                self.toggle_sub_channel(&user, sub_channel_id).await
            }
        }
    }

    /// Replace the user's device token, moving all topic state to the new
    /// token.
    ///
    /// The old token's topic relationships are dropped first (fatal if the
    /// provider refuses - stale topic state must not survive the rotation),
    /// then the new token is re-subscribed to every group the user belongs
    /// to, best-effort.
    pub async fn rotate_device_token(
        &self,
        identity: &ActingIdentity,
        user_id: UserId,
        new_token: Option<&str>,
    ) -> EngineResult<()> {
        identity.ensure_self(user_id)?;

        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| EngineError::not_found("user", user_id))?;

        if let Some(old_token) = user.device_token.as_deref() {
            if !self.bridge.unsubscribe_all(old_token).await {
                return Err(EngineError::external("unsubscribe all topics"));
            }
        }

        self.store.set_device_token(user_id, new_token).await?;

        let Some(new_token) = new_token else {
            return Ok(());
        };

        for channel_id in self.store.subscribed_channel_ids(user_id).await? {
            if let Some(channel) = self.store.find_channel(channel_id).await? {
                if !self.bridge.subscribe(&channel.topic_name, new_token).await {
                    tracing::warn!("Could not re-subscribe new token to {}", channel.topic_name);
                }
            }
        }
        for sub_channel_id in self.store.subscribed_sub_channel_ids(user_id).await? {
            if let Some(sub_channel) = self.store.find_sub_channel(sub_channel_id).await? {
                if !self
                    .bridge
                    .subscribe(&sub_channel.topic_name, new_token)
                    .await
                {
                    tracing::warn!(
                        "Could not re-subscribe new token to {}",
                        sub_channel.topic_name
                    );
                }
            }
        }

        Ok(())
    }

    async fn toggle_channel(&self, user: &User, channel_id: i64) -> EngineResult<ToggleOutcome> {
        let channel = self
            .store
            .find_channel(channel_id)
            .await?
            .ok_or_else(|| EngineError::not_found("channel", channel_id))?;

        let subscribed = self
            .store
            .is_channel_subscriber(user.id, channel.id)
            .await?;

        let (action, message) = if subscribed {
            self.sync_topic(TopicOp::Unsubscribe, &channel.topic_name, user)
                .await?;
            self.store
                .remove_channel_subscriber(user.id, channel.id)
                .await?;

            self.announce(&channel, user, ToggleAction::Unsubscribed)
                .await;
            (
                ToggleAction::Unsubscribed,
                "You have successfully unsubscribed from a Channel",
            )
        } else {
            self.sync_topic(TopicOp::Subscribe, &channel.topic_name, user)
                .await?;
            self.store
                .add_channel_subscriber(user.id, channel.id)
                .await?;

            self.announce(&channel, user, ToggleAction::Subscribed).await;
            (
                ToggleAction::Subscribed,
                "You have successfully subscribed to a Channel",
            )
        };

        let refreshed = self
            .store
            .find_channel(channel.id)
            .await?
            .ok_or_else(|| EngineError::not_found("channel", channel.id))?;

        Ok(ToggleOutcome {
            action,
            message: message.to_string(),
            group: GroupSnapshot::Channel(refreshed),
        })
    }

    async fn toggle_sub_channel(
        &self,
        user: &User,
        sub_channel_id: i64,
    ) -> EngineResult<ToggleOutcome> {
        let sub_channel = self
            .store
            .find_sub_channel(sub_channel_id)
            .await?
            .ok_or_else(|| EngineError::not_found("subchannel", sub_channel_id))?;

        let subscribed = self
            .store
            .is_sub_channel_subscriber(user.id, sub_channel.id)
            .await?;

        let (action, message) = if subscribed {
            self.sync_topic(TopicOp::Unsubscribe, &sub_channel.topic_name, user)
                .await?;
            self.store
                .remove_sub_channel_subscriber(user.id, sub_channel.id)
                .await?;

            self.announce_sub(&sub_channel, user, ToggleAction::Unsubscribed)
                .await;
            (
                ToggleAction::Unsubscribed,
                "You have successfully unsubscribed from a subchannel",
            )
        } else {
            self.sync_topic(TopicOp::Subscribe, &sub_channel.topic_name, user)
                .await?;
            self.store
                .add_sub_channel_subscriber(user.id, sub_channel.id)
                .await?;

            self.announce_sub(&sub_channel, user, ToggleAction::Subscribed)
                .await;
            (
                ToggleAction::Subscribed,
                "You have successfully subscribed to a subchannel",
            )
        };

        let refreshed = self
            .store
            .find_sub_channel(sub_channel.id)
            .await?
            .ok_or_else(|| EngineError::not_found("subchannel", sub_channel.id))?;

        Ok(ToggleOutcome {
            action,
            message: message.to_string(),
            group: GroupSnapshot::SubChannel(refreshed),
        })
    }

    /// Mirror the membership change at the push provider. A user without a
    /// device token has no topic state to keep in sync, so the call is
    /// skipped; a provider refusal aborts the toggle.
    async fn sync_topic(&self, op: TopicOp, topic_name: &str, user: &User) -> EngineResult<()> {
        let Some(device_token) = user.device_token.as_deref() else {
            tracing::debug!("User {} has no device token; skipping topic sync", user.id);
            return Ok(());
        };

        let ok = match op {
            TopicOp::Subscribe => self.bridge.subscribe(topic_name, device_token).await,
            TopicOp::Unsubscribe => self.bridge.unsubscribe(topic_name, device_token).await,
        };

        if !ok {
            return Err(match op {
                TopicOp::Subscribe => EngineError::external("topic subscribe"),
                TopicOp::Unsubscribe => EngineError::external("topic unsubscribe"),
            });
        }
        Ok(())
    }

    async fn announce(&self, channel: &Channel, user: &User, action: ToggleAction) {
        let (title, body) = subscription_notice(&user.username, &channel.name, action);
        notify_user(
            self.store.as_ref(),
            self.bridge.as_ref(),
            channel.super_admin_id,
            &title,
            &body,
        )
        .await;
    }

    async fn announce_sub(&self, sub_channel: &SubChannel, user: &User, action: ToggleAction) {
        let (title, body) = subscription_notice(&user.username, &sub_channel.name, action);
        notify_user(
            self.store.as_ref(),
            self.bridge.as_ref(),
            sub_channel.admin_id,
            &title,
            &body,
        )
        .await;
    }
}

fn subscription_notice(username: &str, group_name: &str, action: ToggleAction) -> (String, String) {
    match action {
        ToggleAction::Subscribed => (
            "Subscription Alert!".to_string(),
            format!("{username} has subscribed to {group_name}!"),
        ),
        ToggleAction::Unsubscribed => (
            "Unsubscription Alert!".to_string(),
            format!("{username} has unsubscribed from {group_name}!"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_notice_text() {
        let (title, body) =
            subscription_notice("ada", "Engineering", ToggleAction::Subscribed);
        assert_eq!(title, "Subscription Alert!");
        assert_eq!(body, "ada has subscribed to Engineering!");

        let (title, body) =
            subscription_notice("ada", "Engineering", ToggleAction::Unsubscribed);
        assert_eq!(title, "Unsubscription Alert!");
        assert_eq!(body, "ada has unsubscribed from Engineering!");
    }
}
