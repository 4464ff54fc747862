/**
 * User Rows and Membership Edges
 */

use async_trait::async_trait;

use crate::domain::{ChannelId, InstitutionId, PostId, SubChannelId, User, UserId};
use crate::error::EngineResult;
use crate::store::UserStore;

use super::PgStore;

const USER_COLUMNS: &str =
    "id, username, email, device_token, primary_institution_id, created_at";

#[async_trait]
impl UserStore for PgStore {
    async fn find_user(&self, id: UserId) -> EngineResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> EngineResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE email = $1
            "#
        ))
        .bind(email)
        .fetch_optional(self.pool())
        .await?;

        Ok(user)
    }

    async fn set_primary_institution(
        &self,
        user_id: UserId,
        institution_id: Option<InstitutionId>,
    ) -> EngineResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET primary_institution_id = $1
            WHERE id = $2
            "#,
        )
        .bind(institution_id)
        .bind(user_id)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn set_device_token(
        &self,
        user_id: UserId,
        device_token: Option<&str>,
    ) -> EngineResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET device_token = $1
            WHERE id = $2
            "#,
        )
        .bind(device_token)
        .bind(user_id)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn toggle_saved_post(&self, user_id: UserId, post_id: PostId) -> EngineResult<bool> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO saved_posts (user_id, post_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, post_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .execute(self.pool())
        .await?
        .rows_affected();

        if inserted == 1 {
            return Ok(true);
        }

        sqlx::query(
            r#"
            DELETE FROM saved_posts
            WHERE user_id = $1 AND post_id = $2
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .execute(self.pool())
        .await?;

        Ok(false)
    }

    async fn subscribed_channel_ids(&self, user_id: UserId) -> EngineResult<Vec<ChannelId>> {
        let ids = sqlx::query_scalar::<_, ChannelId>(
            r#"
            SELECT channel_id
            FROM channel_subscriptions
            WHERE user_id = $1
            ORDER BY channel_id
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        Ok(ids)
    }

    async fn subscribed_sub_channel_ids(
        &self,
        user_id: UserId,
    ) -> EngineResult<Vec<SubChannelId>> {
        let ids = sqlx::query_scalar::<_, SubChannelId>(
            r#"
            SELECT sub_channel_id
            FROM sub_channel_subscriptions
            WHERE user_id = $1
            ORDER BY sub_channel_id
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        Ok(ids)
    }
}
