/**
 * Channel Rows, Subscription Edges, and the Sub-Admin Roster
 *
 * Subscription mutations use data-modifying CTEs so the join row and the
 * denormalized counter move in one statement: the counter changes iff the
 * row did, and the decrement is floored at zero.
 */

use async_trait::async_trait;

use crate::domain::{Channel, ChannelId, InstitutionId, SubAdminState, UserId};
use crate::error::EngineResult;
use crate::store::ChannelStore;

use super::PgStore;

const CHANNEL_COLUMNS: &str = "id, name, channel_type, subscribers, super_admin_id, \
     institution_id, is_primary, topic_name, created_at";

#[async_trait]
impl ChannelStore for PgStore {
    async fn find_channel(&self, id: ChannelId) -> EngineResult<Option<Channel>> {
        let channel = sqlx::query_as::<_, Channel>(&format!(
            r#"
            SELECT {CHANNEL_COLUMNS}
            FROM channels
            WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(channel)
    }

    async fn is_channel_subscriber(
        &self,
        user_id: UserId,
        channel_id: ChannelId,
    ) -> EngineResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM channel_subscriptions
                WHERE user_id = $1 AND channel_id = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(channel_id)
        .fetch_one(self.pool())
        .await?;

        Ok(exists)
    }

    async fn add_channel_subscriber(
        &self,
        user_id: UserId,
        channel_id: ChannelId,
    ) -> EngineResult<bool> {
        let inserted = sqlx::query_scalar::<_, i64>(
            r#"
            WITH ins AS (
                INSERT INTO channel_subscriptions (user_id, channel_id)
                VALUES ($1, $2)
                ON CONFLICT (user_id, channel_id) DO NOTHING
                RETURNING channel_id
            ),
            bump AS (
                UPDATE channels
                SET subscribers = subscribers + 1
                WHERE id IN (SELECT channel_id FROM ins)
                RETURNING id
            )
            SELECT count(*) FROM ins
            "#,
        )
        .bind(user_id)
        .bind(channel_id)
        .fetch_one(self.pool())
        .await?;

        Ok(inserted > 0)
    }

    async fn remove_channel_subscriber(
        &self,
        user_id: UserId,
        channel_id: ChannelId,
    ) -> EngineResult<bool> {
        let deleted = sqlx::query_scalar::<_, i64>(
            r#"
            WITH del AS (
                DELETE FROM channel_subscriptions
                WHERE user_id = $1 AND channel_id = $2
                RETURNING channel_id
            ),
            dec AS (
                UPDATE channels
                SET subscribers = GREATEST(subscribers - 1, 0)
                WHERE id IN (SELECT channel_id FROM del)
                RETURNING id
            )
            SELECT count(*) FROM del
            "#,
        )
        .bind(user_id)
        .bind(channel_id)
        .fetch_one(self.pool())
        .await?;

        Ok(deleted > 0)
    }

    async fn set_super_admin(&self, channel_id: ChannelId, user_id: UserId) -> EngineResult<()> {
        sqlx::query(
            r#"
            UPDATE channels
            SET super_admin_id = $1
            WHERE id = $2
            "#,
        )
        .bind(user_id)
        .bind(channel_id)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn find_primary_admin_channel(
        &self,
        institution_id: InstitutionId,
    ) -> EngineResult<Option<Channel>> {
        let channel = sqlx::query_as::<_, Channel>(&format!(
            r#"
            SELECT {CHANNEL_COLUMNS}
            FROM channels
            WHERE institution_id = $1
              AND channel_type = $2
              AND is_primary = TRUE
            "#
        ))
        .bind(institution_id)
        .bind(Channel::ADMINISTRATION_TYPE)
        .fetch_optional(self.pool())
        .await?;

        Ok(channel)
    }

    async fn sub_admin_state(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> EngineResult<Option<SubAdminState>> {
        let state = sqlx::query_scalar::<_, SubAdminState>(
            r#"
            SELECT state
            FROM channel_sub_admins
            WHERE channel_id = $1 AND user_id = $2
            "#,
        )
        .bind(channel_id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(state)
    }

    async fn set_sub_admin_state(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
        state: SubAdminState,
    ) -> EngineResult<()> {
        sqlx::query(
            r#"
            INSERT INTO channel_sub_admins (channel_id, user_id, state)
            VALUES ($1, $2, $3)
            ON CONFLICT (channel_id, user_id) DO UPDATE SET state = EXCLUDED.state
            "#,
        )
        .bind(channel_id)
        .bind(user_id)
        .bind(state)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn sub_admins_in_state(
        &self,
        channel_id: ChannelId,
        state: SubAdminState,
    ) -> EngineResult<Vec<UserId>> {
        let ids = sqlx::query_scalar::<_, UserId>(
            r#"
            SELECT user_id
            FROM channel_sub_admins
            WHERE channel_id = $1 AND state = $2
            ORDER BY user_id
            "#,
        )
        .bind(channel_id)
        .bind(state)
        .fetch_all(self.pool())
        .await?;

        Ok(ids)
    }
}
