//! Shared test fixtures
//!
//! Builders for seeded entities and a harness bundling the in-memory store,
//! the recording bridge, and the engines under test.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;

use campushub::config::InviteConfig;
use campushub::domain::{
    Channel, ChannelId, Institution, InstitutionId, SubChannel, SubChannelId, SubChannelStatus,
    SubChannelVisibility, User, UserId,
};
use campushub::{
    AdminDelegationEngine, InviteEngine, MemoryStore, RecordingBridge, SubAdminEngine,
    SubscriptionEngine,
};

pub fn invite_config() -> InviteConfig {
    InviteConfig {
        secret: "integration-test-secret".to_string(),
        ttl_hours: 72,
    }
}

pub fn user(id: UserId, username: &str) -> User {
    User {
        id,
        username: username.to_string(),
        email: format!("{username}@example.com"),
        device_token: Some(format!("{username}-device")),
        primary_institution_id: None,
        created_at: Utc::now(),
    }
}

pub fn channel(id: ChannelId, name: &str, subscribers: i64) -> Channel {
    Channel {
        id,
        name: name.to_string(),
        channel_type: "Community".to_string(),
        subscribers,
        super_admin_id: None,
        institution_id: None,
        is_primary: false,
        topic_name: format!("channel_{id}"),
        created_at: Utc::now(),
    }
}

pub fn sub_channel(id: SubChannelId, channel_id: ChannelId, name: &str) -> SubChannel {
    SubChannel {
        id,
        channel_id,
        name: name.to_string(),
        admin_id: None,
        subscribers: 0,
        status: SubChannelStatus::Active,
        deleted: false,
        visibility: SubChannelVisibility::Public,
        primary_institution_id: None,
        topic_name: format!("sub_channel_{id}"),
    }
}

pub fn institution(id: InstitutionId, name: &str) -> Institution {
    Institution {
        id,
        name: name.to_string(),
        website: None,
        admin_id: None,
    }
}

/// Everything an engine test needs, wired over shared store/bridge handles.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub bridge: Arc<RecordingBridge>,
    pub subscriptions: SubscriptionEngine,
    pub delegation: AdminDelegationEngine,
    pub invites: InviteEngine,
    pub sub_admins: SubAdminEngine,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let bridge = Arc::new(RecordingBridge::new());

        let subscriptions =
            SubscriptionEngine::new(store.clone(), bridge.clone());
        let delegation =
            AdminDelegationEngine::new(store.clone(), bridge.clone(), invite_config());
        let invites = InviteEngine::new(store.clone(), bridge.clone(), invite_config());
        let sub_admins = SubAdminEngine::new(store.clone());

        Self {
            store,
            bridge,
            subscriptions,
            delegation,
            invites,
            sub_admins,
        }
    }
}
