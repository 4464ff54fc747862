/**
 * Domain Entities
 *
 * This module defines the entities the engines operate on: users with their
 * membership edges, channels and sub-channels with subscriber counters,
 * institutions, and pending admin invitations.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User row identifier
pub type UserId = i64;
/// Channel row identifier
pub type ChannelId = i64;
/// Sub-channel row identifier
pub type SubChannelId = i64;
/// Institution row identifier
pub type InstitutionId = i64;
/// Post row identifier (posts themselves live outside this core)
pub type PostId = i64;

/// A registered user.
///
/// Membership edges (subscribed channels, subscribed sub-channels, saved
/// posts) live in join tables keyed by `(user_id, target_id)` rather than on
/// the user row, so they are queried through the store, not carried here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: UserId,
    /// Display name used in notification bodies
    pub username: String,
    /// User email address (unique)
    pub email: String,
    /// Push-notification device token, if the user has registered a device
    pub device_token: Option<String>,
    /// Institution this user primarily belongs to
    pub primary_institution_id: Option<InstitutionId>,
    /// Created at timestamp
    pub created_at: DateTime<Utc>,
}

/// A top-level community group, optionally tied to one institution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Channel {
    /// Unique channel ID
    pub id: ChannelId,
    /// Channel name
    pub name: String,
    /// Channel category, e.g. "Administration" for institution governance
    pub channel_type: String,
    /// Denormalized subscriber counter, kept in lockstep with the
    /// `channel_subscriptions` join rows
    pub subscribers: i64,
    /// Current super-admin
    pub super_admin_id: Option<UserId>,
    /// Owning institution, if any
    pub institution_id: Option<InstitutionId>,
    /// Whether this is the institution's canonical governance channel
    pub is_primary: bool,
    /// Push topic this channel publishes to
    pub topic_name: String,
    /// Created at timestamp
    pub created_at: DateTime<Utc>,
}

impl Channel {
    /// The `channel_type` of an institution's canonical governance channel.
    pub const ADMINISTRATION_TYPE: &'static str = "Administration";
}

/// Lifecycle status of a sub-channel.
///
/// Sub-channels are created `Pending`, activated through an external review
/// workflow, and may be suspended and unsuspended afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
pub enum SubChannelStatus {
    Pending = 0,
    Active = 1,
    Suspended = 2,
}

/// Visibility of a sub-channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "sub_channel_visibility", rename_all = "lowercase")]
pub enum SubChannelVisibility {
    Public,
    Private,
}

/// A child group under a channel, with its own admin and subscriber count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubChannel {
    /// Unique sub-channel ID
    pub id: SubChannelId,
    /// Parent channel
    pub channel_id: ChannelId,
    /// Sub-channel name
    pub name: String,
    /// Current admin
    pub admin_id: Option<UserId>,
    /// Denormalized subscriber counter
    pub subscribers: i64,
    /// Lifecycle status
    pub status: SubChannelStatus,
    /// Logical-deletion flag; rows are never physically removed
    pub deleted: bool,
    /// Public or private
    pub visibility: SubChannelVisibility,
    /// Institution the sub-channel belongs to
    pub primary_institution_id: Option<InstitutionId>,
    /// Push topic this sub-channel publishes to
    pub topic_name: String,
}

/// An institution (campus) with its top-level admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Institution {
    /// Unique institution ID
    pub id: InstitutionId,
    /// Institution name
    pub name: String,
    /// Institution website
    pub website: Option<String>,
    /// Admin user, set when someone accepts the primary channel's admin invite
    pub admin_id: Option<UserId>,
}

/// State of a user on a channel's sub-admin roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "sub_admin_state", rename_all = "lowercase")]
pub enum SubAdminState {
    Active,
    Suspended,
    Removed,
}

/// An outstanding invitation to become admin of a channel or sub-channel.
///
/// Exactly one of `channel_id` / `sub_channel_id` is set, and at most one
/// entry exists per target - a re-invite overwrites the entry in place.
/// The `uuid` is the single-use identifier embedded in the invite link; the
/// row is deleted when the promotion it authorizes succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PendingAdmin {
    /// Unique row ID
    pub id: i64,
    /// Invitee email; the invitee must register with this address before
    /// the invitation can be accepted
    pub email: String,
    /// Target channel, if this invites a channel super-admin
    pub channel_id: Option<ChannelId>,
    /// Target sub-channel, if this invites a sub-channel admin
    pub sub_channel_id: Option<SubChannelId>,
    /// Single-use invite identifier
    pub uuid: Uuid,
    /// Created at timestamp
    pub created_at: DateTime<Utc>,
    /// Updated at timestamp (bumped when an invite is re-issued)
    pub updated_at: DateTime<Utc>,
}

impl PendingAdmin {
    /// The invitation's target as a `GroupRef`.
    pub fn target(&self) -> Option<GroupRef> {
        match (self.channel_id, self.sub_channel_id) {
            (_, Some(id)) => Some(GroupRef::SubChannel(id)),
            (Some(id), None) => Some(GroupRef::Channel(id)),
            (None, None) => None,
        }
    }
}

/// Reference to a subscribable group, used by operations that work across
/// both channels and sub-channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupRef {
    Channel(ChannelId),
    SubChannel(SubChannelId),
}

impl GroupRef {
    /// The referenced row id, without the kind.
    pub fn id(&self) -> i64 {
        match self {
            GroupRef::Channel(id) | GroupRef::SubChannel(id) => *id,
        }
    }
}
