/**
 * Sub-Channel Rows and Subscription Edges
 */

use async_trait::async_trait;

use crate::domain::{SubChannel, SubChannelId, SubChannelStatus, UserId};
use crate::error::EngineResult;
use crate::store::SubChannelStore;

use super::PgStore;

const SUB_CHANNEL_COLUMNS: &str = "id, channel_id, name, admin_id, subscribers, status, \
     deleted, visibility, primary_institution_id, topic_name";

#[async_trait]
impl SubChannelStore for PgStore {
    async fn find_sub_channel(&self, id: SubChannelId) -> EngineResult<Option<SubChannel>> {
        let sub_channel = sqlx::query_as::<_, SubChannel>(&format!(
            r#"
            SELECT {SUB_CHANNEL_COLUMNS}
            FROM sub_channels
            WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(sub_channel)
    }

    async fn is_sub_channel_subscriber(
        &self,
        user_id: UserId,
        sub_channel_id: SubChannelId,
    ) -> EngineResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM sub_channel_subscriptions
                WHERE user_id = $1 AND sub_channel_id = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(sub_channel_id)
        .fetch_one(self.pool())
        .await?;

        Ok(exists)
    }

    async fn add_sub_channel_subscriber(
        &self,
        user_id: UserId,
        sub_channel_id: SubChannelId,
    ) -> EngineResult<bool> {
        let inserted = sqlx::query_scalar::<_, i64>(
            r#"
            WITH ins AS (
                INSERT INTO sub_channel_subscriptions (user_id, sub_channel_id)
                VALUES ($1, $2)
                ON CONFLICT (user_id, sub_channel_id) DO NOTHING
                RETURNING sub_channel_id
            ),
            bump AS (
                UPDATE sub_channels
                SET subscribers = subscribers + 1
                WHERE id IN (SELECT sub_channel_id FROM ins)
                RETURNING id
            )
            SELECT count(*) FROM ins
            "#,
        )
        .bind(user_id)
        .bind(sub_channel_id)
        .fetch_one(self.pool())
        .await?;

        Ok(inserted > 0)
    }

    async fn remove_sub_channel_subscriber(
        &self,
        user_id: UserId,
        sub_channel_id: SubChannelId,
    ) -> EngineResult<bool> {
        let deleted = sqlx::query_scalar::<_, i64>(
            r#"
            WITH del AS (
                DELETE FROM sub_channel_subscriptions
                WHERE user_id = $1 AND sub_channel_id = $2
                RETURNING sub_channel_id
            ),
            dec AS (
                UPDATE sub_channels
                SET subscribers = GREATEST(subscribers - 1, 0)
                WHERE id IN (SELECT sub_channel_id FROM del)
                RETURNING id
            )
            SELECT count(*) FROM del
            "#,
        )
        .bind(user_id)
        .bind(sub_channel_id)
        .fetch_one(self.pool())
        .await?;

        Ok(deleted > 0)
    }

    async fn set_sub_channel_admin(
        &self,
        sub_channel_id: SubChannelId,
        admin_id: Option<UserId>,
    ) -> EngineResult<()> {
        sqlx::query(
            r#"
            UPDATE sub_channels
            SET admin_id = $1
            WHERE id = $2
            "#,
        )
        .bind(admin_id)
        .bind(sub_channel_id)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn clear_admin_seats(&self, user_id: UserId) -> EngineResult<u64> {
        let cleared = sqlx::query(
            r#"
            UPDATE sub_channels
            SET admin_id = NULL
            WHERE admin_id = $1 AND status = $2
            "#,
        )
        .bind(user_id)
        .bind(SubChannelStatus::Active)
        .execute(self.pool())
        .await?
        .rows_affected();

        Ok(cleared)
    }

    async fn set_sub_channel_status(
        &self,
        sub_channel_id: SubChannelId,
        status: SubChannelStatus,
    ) -> EngineResult<()> {
        sqlx::query(
            r#"
            UPDATE sub_channels
            SET status = $1
            WHERE id = $2
            "#,
        )
        .bind(status)
        .bind(sub_channel_id)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn mark_sub_channel_deleted(&self, sub_channel_id: SubChannelId) -> EngineResult<()> {
        sqlx::query(
            r#"
            UPDATE sub_channels
            SET deleted = TRUE
            WHERE id = $1
            "#,
        )
        .bind(sub_channel_id)
        .execute(self.pool())
        .await?;

        Ok(())
    }
}
