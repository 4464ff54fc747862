/**
 * Persistence Seam
 *
 * The engines talk to storage through the traits in this module: find-by-id,
 * field updates, joint membership-row/counter mutations, and pending-admin
 * ledger operations. Two implementations are provided:
 *
 * - `PgStore` - sqlx/PostgreSQL, the production backend
 * - `MemoryStore` - in-memory, used by the engine test suites
 *
 * # Consistency contract
 *
 * `add_*_subscriber` / `remove_*_subscriber` are the only operations that
 * touch a subscriber counter, and they change the counter if and only if a
 * membership row was actually inserted or deleted. Uniqueness is enforced by
 * the backing set/constraint, so concurrent toggles cannot double-count and
 * a decrement with no matching row is a no-op. Counters never go below zero.
 */

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Channel, ChannelId, GroupRef, Institution, InstitutionId, PendingAdmin, PostId, SubAdminState,
    SubChannel, SubChannelId, SubChannelStatus, User, UserId,
};
use crate::error::EngineResult;

/// User rows and the membership edges hanging off them.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: UserId) -> EngineResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> EngineResult<Option<User>>;

    async fn set_primary_institution(
        &self,
        user_id: UserId,
        institution_id: Option<InstitutionId>,
    ) -> EngineResult<()>;

    async fn set_device_token(
        &self,
        user_id: UserId,
        device_token: Option<&str>,
    ) -> EngineResult<()>;

    /// Toggle a post in the user's saved set. Returns `true` when the post
    /// was saved, `false` when it was removed.
    async fn toggle_saved_post(&self, user_id: UserId, post_id: PostId) -> EngineResult<bool>;

    async fn subscribed_channel_ids(&self, user_id: UserId) -> EngineResult<Vec<ChannelId>>;

    async fn subscribed_sub_channel_ids(&self, user_id: UserId)
        -> EngineResult<Vec<SubChannelId>>;
}

/// Channel rows, their subscription edges, and the sub-admin roster.
#[async_trait]
pub trait ChannelStore: Send + Sync {
    async fn find_channel(&self, id: ChannelId) -> EngineResult<Option<Channel>>;

    async fn is_channel_subscriber(
        &self,
        user_id: UserId,
        channel_id: ChannelId,
    ) -> EngineResult<bool>;

    /// Insert the membership row and bump the counter iff the row is new.
    /// Returns whether a row was inserted.
    async fn add_channel_subscriber(
        &self,
        user_id: UserId,
        channel_id: ChannelId,
    ) -> EngineResult<bool>;

    /// Delete the membership row and drop the counter (floored at zero) iff
    /// a row was deleted. Returns whether a row was deleted.
    async fn remove_channel_subscriber(
        &self,
        user_id: UserId,
        channel_id: ChannelId,
    ) -> EngineResult<bool>;

    async fn set_super_admin(&self, channel_id: ChannelId, user_id: UserId) -> EngineResult<()>;

    /// The institution's canonical "Administration" primary channel, if one
    /// exists.
    async fn find_primary_admin_channel(
        &self,
        institution_id: InstitutionId,
    ) -> EngineResult<Option<Channel>>;

    async fn sub_admin_state(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> EngineResult<Option<SubAdminState>>;

    async fn set_sub_admin_state(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
        state: SubAdminState,
    ) -> EngineResult<()>;

    async fn sub_admins_in_state(
        &self,
        channel_id: ChannelId,
        state: SubAdminState,
    ) -> EngineResult<Vec<UserId>>;
}

/// Sub-channel rows and their subscription edges.
#[async_trait]
pub trait SubChannelStore: Send + Sync {
    async fn find_sub_channel(&self, id: SubChannelId) -> EngineResult<Option<SubChannel>>;

    async fn is_sub_channel_subscriber(
        &self,
        user_id: UserId,
        sub_channel_id: SubChannelId,
    ) -> EngineResult<bool>;

    async fn add_sub_channel_subscriber(
        &self,
        user_id: UserId,
        sub_channel_id: SubChannelId,
    ) -> EngineResult<bool>;

    async fn remove_sub_channel_subscriber(
        &self,
        user_id: UserId,
        sub_channel_id: SubChannelId,
    ) -> EngineResult<bool>;

    async fn set_sub_channel_admin(
        &self,
        sub_channel_id: SubChannelId,
        admin_id: Option<UserId>,
    ) -> EngineResult<()>;

    /// Clear `admin_id` on every active sub-channel administered by this
    /// user. Returns how many seats were cleared.
    async fn clear_admin_seats(&self, user_id: UserId) -> EngineResult<u64>;

    async fn set_sub_channel_status(
        &self,
        sub_channel_id: SubChannelId,
        status: SubChannelStatus,
    ) -> EngineResult<()>;

    /// Logical deletion; the row is never physically removed.
    async fn mark_sub_channel_deleted(&self, sub_channel_id: SubChannelId) -> EngineResult<()>;
}

/// Institution rows.
#[async_trait]
pub trait InstitutionStore: Send + Sync {
    async fn find_institution(&self, id: InstitutionId) -> EngineResult<Option<Institution>>;

    /// Set the institution admin. A missing institution is a no-op, matching
    /// the promotion cascade's tolerance for dangling institution ids.
    async fn set_institution_admin(
        &self,
        id: InstitutionId,
        admin_id: UserId,
    ) -> EngineResult<()>;
}

/// The pending-admin invitation ledger.
#[async_trait]
pub trait PendingAdminStore: Send + Sync {
    async fn find_pending_by_uuid(&self, uuid: Uuid) -> EngineResult<Option<PendingAdmin>>;

    async fn find_pending_by_email(&self, email: &str) -> EngineResult<Option<PendingAdmin>>;

    /// The at-most-one entry outstanding for this target.
    async fn find_pending_for_target(
        &self,
        target: GroupRef,
    ) -> EngineResult<Option<PendingAdmin>>;

    async fn create_pending(
        &self,
        email: &str,
        target: GroupRef,
        uuid: Uuid,
    ) -> EngineResult<PendingAdmin>;

    /// Update the invitee email in place, optionally rotating the uuid.
    async fn update_pending_email(
        &self,
        id: i64,
        email: &str,
        new_uuid: Option<Uuid>,
    ) -> EngineResult<PendingAdmin>;

    /// Returns whether a row was deleted.
    async fn delete_pending(&self, id: i64) -> EngineResult<bool>;
}

/// Everything the engines need from persistence, as one trait object.
pub trait Store:
    UserStore + ChannelStore + SubChannelStore + InstitutionStore + PendingAdminStore
{
}

impl<T> Store for T where
    T: UserStore + ChannelStore + SubChannelStore + InstitutionStore + PendingAdminStore
{
}
