/**
 * Sub-Admin Roster
 *
 * A channel super-admin manages a roster of sub-admins who run the
 * channel's sub-channels. Roster states are active / suspended / removed;
 * suspension and removal also vacate the sub-admin's active sub-channel
 * seats so a suspended admin cannot keep publishing.
 */

use std::sync::Arc;

use crate::domain::{Channel, ChannelId, SubAdminState, User, UserId};
use crate::error::{EngineError, EngineResult};
use crate::identity::ActingIdentity;
use crate::store::{ChannelStore, Store, SubChannelStore, UserStore};

/// Manages channel sub-admin rosters.
pub struct SubAdminEngine {
    store: Arc<dyn Store>,
}

impl SubAdminEngine {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Put a user on the channel's roster as an active sub-admin.
    pub async fn add_sub_admin(
        &self,
        identity: &ActingIdentity,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> EngineResult<()> {
        self.require_super_admin(identity, channel_id).await?;

        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| EngineError::not_found("user", user_id))?;

        self.store
            .set_sub_admin_state(channel_id, user_id, SubAdminState::Active)
            .await?;
        Ok(())
    }

    /// Suspend an active sub-admin, vacating their sub-channel seats.
    ///
    /// Returns `false` when the user is not currently an active sub-admin
    /// (nothing changed).
    pub async fn suspend_sub_admin(
        &self,
        identity: &ActingIdentity,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> EngineResult<bool> {
        self.require_super_admin(identity, channel_id).await?;

        let state = self.store.sub_admin_state(channel_id, user_id).await?;
        if state != Some(SubAdminState::Active) {
            return Ok(false);
        }

        self.store
            .set_sub_admin_state(channel_id, user_id, SubAdminState::Suspended)
            .await?;
        let cleared = self.store.clear_admin_seats(user_id).await?;
        tracing::info!(
            "Suspended sub-admin {user_id} on channel {channel_id}, vacated {cleared} seat(s)"
        );
        Ok(true)
    }

    /// Reinstate a suspended sub-admin. Their sub-channel seats are not
    /// restored automatically.
    pub async fn reinstate_sub_admin(
        &self,
        identity: &ActingIdentity,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> EngineResult<bool> {
        self.require_super_admin(identity, channel_id).await?;

        let state = self.store.sub_admin_state(channel_id, user_id).await?;
        if state != Some(SubAdminState::Suspended) {
            return Ok(false);
        }

        self.store
            .set_sub_admin_state(channel_id, user_id, SubAdminState::Active)
            .await?;
        Ok(true)
    }

    /// Remove a sub-admin from the roster, vacating their seats. Removed
    /// entries stay queryable for the channel's history.
    pub async fn remove_sub_admin(
        &self,
        identity: &ActingIdentity,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> EngineResult<bool> {
        self.require_super_admin(identity, channel_id).await?;

        let state = self.store.sub_admin_state(channel_id, user_id).await?;
        if !matches!(
            state,
            Some(SubAdminState::Active) | Some(SubAdminState::Suspended)
        ) {
            return Ok(false);
        }

        self.store
            .set_sub_admin_state(channel_id, user_id, SubAdminState::Removed)
            .await?;
        let cleared = self.store.clear_admin_seats(user_id).await?;
        tracing::info!(
            "Removed sub-admin {user_id} from channel {channel_id}, vacated {cleared} seat(s)"
        );
        Ok(true)
    }

    /// The channel's roster members in a given state.
    pub async fn sub_admins(
        &self,
        channel_id: ChannelId,
        state: SubAdminState,
    ) -> EngineResult<Vec<User>> {
        // Confirm the channel exists so a bad id reads as 404, not an
        // empty roster.
        self.store
            .find_channel(channel_id)
            .await?
            .ok_or_else(|| EngineError::not_found("channel", channel_id))?;

        let mut users = Vec::new();
        for user_id in self.store.sub_admins_in_state(channel_id, state).await? {
            if let Some(user) = self.store.find_user(user_id).await? {
                users.push(user);
            }
        }
        Ok(users)
    }

    async fn require_super_admin(
        &self,
        identity: &ActingIdentity,
        channel_id: ChannelId,
    ) -> EngineResult<Channel> {
        let channel = self
            .store
            .find_channel(channel_id)
            .await?
            .ok_or_else(|| EngineError::not_found("channel", channel_id))?;

        if channel.super_admin_id != Some(identity.user_id) {
            return Err(EngineError::Unauthorized);
        }
        Ok(channel)
    }
}
