/**
 * In-Memory Store
 *
 * A complete `Store` implementation over `Mutex`-guarded maps, with the same
 * observable semantics as the PostgreSQL backend: set-backed membership with
 * counters that move only when an edge actually changes, a zero floor on
 * decrement, and an at-most-one pending-admin entry per target.
 *
 * Used by the engine test suites; also handy for embedding the engines
 * without a database.
 */

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::{
    Channel, ChannelId, GroupRef, Institution, InstitutionId, PendingAdmin, PostId, SubAdminState,
    SubChannel, SubChannelId, SubChannelStatus, User, UserId,
};
use crate::error::EngineResult;
use crate::store::{
    ChannelStore, InstitutionStore, PendingAdminStore, SubChannelStore, UserStore,
};

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<UserId, User>,
    channels: HashMap<ChannelId, Channel>,
    sub_channels: HashMap<SubChannelId, SubChannel>,
    institutions: HashMap<InstitutionId, Institution>,
    pending_admins: HashMap<i64, PendingAdmin>,
    channel_subscriptions: HashSet<(UserId, ChannelId)>,
    sub_channel_subscriptions: HashSet<(UserId, SubChannelId)>,
    saved_posts: HashSet<(UserId, PostId)>,
    sub_admins: HashMap<(ChannelId, UserId), SubAdminState>,
    next_pending_id: i64,
}

/// In-memory `Store` implementation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user row.
    pub fn insert_user(&self, user: User) {
        self.state.lock().unwrap().users.insert(user.id, user);
    }

    /// Seed a channel row.
    pub fn insert_channel(&self, channel: Channel) {
        self.state
            .lock()
            .unwrap()
            .channels
            .insert(channel.id, channel);
    }

    /// Seed a sub-channel row.
    pub fn insert_sub_channel(&self, sub_channel: SubChannel) {
        self.state
            .lock()
            .unwrap()
            .sub_channels
            .insert(sub_channel.id, sub_channel);
    }

    /// Seed an institution row.
    pub fn insert_institution(&self, institution: Institution) {
        self.state
            .lock()
            .unwrap()
            .institutions
            .insert(institution.id, institution);
    }

    /// Seed a subscription edge directly, bumping the counter like a real
    /// subscribe would.
    pub fn seed_channel_subscription(&self, user_id: UserId, channel_id: ChannelId) {
        let mut state = self.state.lock().unwrap();
        if state.channel_subscriptions.insert((user_id, channel_id)) {
            if let Some(channel) = state.channels.get_mut(&channel_id) {
                channel.subscribers += 1;
            }
        }
    }

    /// Seed a sub-channel subscription edge, bumping the counter.
    pub fn seed_sub_channel_subscription(&self, user_id: UserId, sub_channel_id: SubChannelId) {
        let mut state = self.state.lock().unwrap();
        if state
            .sub_channel_subscriptions
            .insert((user_id, sub_channel_id))
        {
            if let Some(sub_channel) = state.sub_channels.get_mut(&sub_channel_id) {
                sub_channel.subscribers += 1;
            }
        }
    }

    /// Number of pending-admin entries currently outstanding.
    pub fn pending_admin_count(&self) -> usize {
        self.state.lock().unwrap().pending_admins.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: UserId) -> EngineResult<Option<User>> {
        Ok(self.state.lock().unwrap().users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> EngineResult<Option<User>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn set_primary_institution(
        &self,
        user_id: UserId,
        institution_id: Option<InstitutionId>,
    ) -> EngineResult<()> {
        if let Some(user) = self.state.lock().unwrap().users.get_mut(&user_id) {
            user.primary_institution_id = institution_id;
        }
        Ok(())
    }

    async fn set_device_token(
        &self,
        user_id: UserId,
        device_token: Option<&str>,
    ) -> EngineResult<()> {
        if let Some(user) = self.state.lock().unwrap().users.get_mut(&user_id) {
            user.device_token = device_token.map(str::to_string);
        }
        Ok(())
    }

    async fn toggle_saved_post(&self, user_id: UserId, post_id: PostId) -> EngineResult<bool> {
        let mut state = self.state.lock().unwrap();
        if state.saved_posts.insert((user_id, post_id)) {
            Ok(true)
        } else {
            state.saved_posts.remove(&(user_id, post_id));
            Ok(false)
        }
    }

    async fn subscribed_channel_ids(&self, user_id: UserId) -> EngineResult<Vec<ChannelId>> {
        let state = self.state.lock().unwrap();
        let mut ids: Vec<_> = state
            .channel_subscriptions
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, c)| *c)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn subscribed_sub_channel_ids(
        &self,
        user_id: UserId,
    ) -> EngineResult<Vec<SubChannelId>> {
        let state = self.state.lock().unwrap();
        let mut ids: Vec<_> = state
            .sub_channel_subscriptions
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, s)| *s)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

#[async_trait]
impl ChannelStore for MemoryStore {
    async fn find_channel(&self, id: ChannelId) -> EngineResult<Option<Channel>> {
        Ok(self.state.lock().unwrap().channels.get(&id).cloned())
    }

    async fn is_channel_subscriber(
        &self,
        user_id: UserId,
        channel_id: ChannelId,
    ) -> EngineResult<bool> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .channel_subscriptions
            .contains(&(user_id, channel_id)))
    }

    async fn add_channel_subscriber(
        &self,
        user_id: UserId,
        channel_id: ChannelId,
    ) -> EngineResult<bool> {
        let mut state = self.state.lock().unwrap();
        if !state.channels.contains_key(&channel_id) {
            return Ok(false);
        }
        let inserted = state.channel_subscriptions.insert((user_id, channel_id));
        if inserted {
            if let Some(channel) = state.channels.get_mut(&channel_id) {
                channel.subscribers += 1;
            }
        }
        Ok(inserted)
    }

    async fn remove_channel_subscriber(
        &self,
        user_id: UserId,
        channel_id: ChannelId,
    ) -> EngineResult<bool> {
        let mut state = self.state.lock().unwrap();
        let removed = state.channel_subscriptions.remove(&(user_id, channel_id));
        if removed {
            if let Some(channel) = state.channels.get_mut(&channel_id) {
                channel.subscribers = (channel.subscribers - 1).max(0);
            }
        }
        Ok(removed)
    }

    async fn set_super_admin(&self, channel_id: ChannelId, user_id: UserId) -> EngineResult<()> {
        if let Some(channel) = self.state.lock().unwrap().channels.get_mut(&channel_id) {
            channel.super_admin_id = Some(user_id);
        }
        Ok(())
    }

    async fn find_primary_admin_channel(
        &self,
        institution_id: InstitutionId,
    ) -> EngineResult<Option<Channel>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .channels
            .values()
            .find(|c| {
                c.institution_id == Some(institution_id)
                    && c.channel_type == Channel::ADMINISTRATION_TYPE
                    && c.is_primary
            })
            .cloned())
    }

    async fn sub_admin_state(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> EngineResult<Option<SubAdminState>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .sub_admins
            .get(&(channel_id, user_id))
            .copied())
    }

    async fn set_sub_admin_state(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
        state: SubAdminState,
    ) -> EngineResult<()> {
        self.state
            .lock()
            .unwrap()
            .sub_admins
            .insert((channel_id, user_id), state);
        Ok(())
    }

    async fn sub_admins_in_state(
        &self,
        channel_id: ChannelId,
        state: SubAdminState,
    ) -> EngineResult<Vec<UserId>> {
        let inner = self.state.lock().unwrap();
        let mut ids: Vec<_> = inner
            .sub_admins
            .iter()
            .filter(|((c, _), s)| *c == channel_id && **s == state)
            .map(|((_, u), _)| *u)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

#[async_trait]
impl SubChannelStore for MemoryStore {
    async fn find_sub_channel(&self, id: SubChannelId) -> EngineResult<Option<SubChannel>> {
        Ok(self.state.lock().unwrap().sub_channels.get(&id).cloned())
    }

    async fn is_sub_channel_subscriber(
        &self,
        user_id: UserId,
        sub_channel_id: SubChannelId,
    ) -> EngineResult<bool> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .sub_channel_subscriptions
            .contains(&(user_id, sub_channel_id)))
    }

    async fn add_sub_channel_subscriber(
        &self,
        user_id: UserId,
        sub_channel_id: SubChannelId,
    ) -> EngineResult<bool> {
        let mut state = self.state.lock().unwrap();
        if !state.sub_channels.contains_key(&sub_channel_id) {
            return Ok(false);
        }
        let inserted = state
            .sub_channel_subscriptions
            .insert((user_id, sub_channel_id));
        if inserted {
            if let Some(sub_channel) = state.sub_channels.get_mut(&sub_channel_id) {
                sub_channel.subscribers += 1;
            }
        }
        Ok(inserted)
    }

    async fn remove_sub_channel_subscriber(
        &self,
        user_id: UserId,
        sub_channel_id: SubChannelId,
    ) -> EngineResult<bool> {
        let mut state = self.state.lock().unwrap();
        let removed = state
            .sub_channel_subscriptions
            .remove(&(user_id, sub_channel_id));
        if removed {
            if let Some(sub_channel) = state.sub_channels.get_mut(&sub_channel_id) {
                sub_channel.subscribers = (sub_channel.subscribers - 1).max(0);
            }
        }
        Ok(removed)
    }

    async fn set_sub_channel_admin(
        &self,
        sub_channel_id: SubChannelId,
        admin_id: Option<UserId>,
    ) -> EngineResult<()> {
        if let Some(sub_channel) = self
            .state
            .lock()
            .unwrap()
            .sub_channels
            .get_mut(&sub_channel_id)
        {
            sub_channel.admin_id = admin_id;
        }
        Ok(())
    }

    async fn clear_admin_seats(&self, user_id: UserId) -> EngineResult<u64> {
        let mut state = self.state.lock().unwrap();
        let mut cleared = 0;
        for sub_channel in state.sub_channels.values_mut() {
            if sub_channel.admin_id == Some(user_id)
                && sub_channel.status == SubChannelStatus::Active
            {
                sub_channel.admin_id = None;
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    async fn set_sub_channel_status(
        &self,
        sub_channel_id: SubChannelId,
        status: SubChannelStatus,
    ) -> EngineResult<()> {
        if let Some(sub_channel) = self
            .state
            .lock()
            .unwrap()
            .sub_channels
            .get_mut(&sub_channel_id)
        {
            sub_channel.status = status;
        }
        Ok(())
    }

    async fn mark_sub_channel_deleted(&self, sub_channel_id: SubChannelId) -> EngineResult<()> {
        if let Some(sub_channel) = self
            .state
            .lock()
            .unwrap()
            .sub_channels
            .get_mut(&sub_channel_id)
        {
            sub_channel.deleted = true;
        }
        Ok(())
    }
}

#[async_trait]
impl InstitutionStore for MemoryStore {
    async fn find_institution(&self, id: InstitutionId) -> EngineResult<Option<Institution>> {
        Ok(self.state.lock().unwrap().institutions.get(&id).cloned())
    }

    async fn set_institution_admin(
        &self,
        id: InstitutionId,
        admin_id: UserId,
    ) -> EngineResult<()> {
        if let Some(institution) = self.state.lock().unwrap().institutions.get_mut(&id) {
            institution.admin_id = Some(admin_id);
        }
        Ok(())
    }
}

#[async_trait]
impl PendingAdminStore for MemoryStore {
    async fn find_pending_by_uuid(&self, uuid: Uuid) -> EngineResult<Option<PendingAdmin>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .pending_admins
            .values()
            .find(|p| p.uuid == uuid)
            .cloned())
    }

    async fn find_pending_by_email(&self, email: &str) -> EngineResult<Option<PendingAdmin>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .pending_admins
            .values()
            .find(|p| p.email == email)
            .cloned())
    }

    async fn find_pending_for_target(
        &self,
        target: GroupRef,
    ) -> EngineResult<Option<PendingAdmin>> {
        let state = self.state.lock().unwrap();
        let found = state.pending_admins.values().find(|p| match target {
            GroupRef::Channel(id) => p.channel_id == Some(id) && p.sub_channel_id.is_none(),
            GroupRef::SubChannel(id) => p.sub_channel_id == Some(id),
        });
        Ok(found.cloned())
    }

    async fn create_pending(
        &self,
        email: &str,
        target: GroupRef,
        uuid: Uuid,
    ) -> EngineResult<PendingAdmin> {
        let mut state = self.state.lock().unwrap();
        state.next_pending_id += 1;
        let now = Utc::now();
        let pending = PendingAdmin {
            id: state.next_pending_id,
            email: email.to_string(),
            channel_id: match target {
                GroupRef::Channel(id) => Some(id),
                GroupRef::SubChannel(_) => None,
            },
            sub_channel_id: match target {
                GroupRef::SubChannel(id) => Some(id),
                GroupRef::Channel(_) => None,
            },
            uuid,
            created_at: now,
            updated_at: now,
        };
        state.pending_admins.insert(pending.id, pending.clone());
        Ok(pending)
    }

    async fn update_pending_email(
        &self,
        id: i64,
        email: &str,
        new_uuid: Option<Uuid>,
    ) -> EngineResult<PendingAdmin> {
        let mut state = self.state.lock().unwrap();
        let pending = state
            .pending_admins
            .get_mut(&id)
            .ok_or_else(|| crate::error::EngineError::not_found("pending admin", id))?;
        pending.email = email.to_string();
        if let Some(uuid) = new_uuid {
            pending.uuid = uuid;
        }
        pending.updated_at = Utc::now();
        Ok(pending.clone())
    }

    async fn delete_pending(&self, id: i64) -> EngineResult<bool> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .pending_admins
            .remove(&id)
            .is_some())
    }
}
