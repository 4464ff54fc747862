/**
 * Pending-Admin Ledger
 *
 * Partial unique indexes on `(channel_id)` / `(sub_channel_id)` guarantee at
 * most one outstanding entry per target, so the lookup-or-create flow in the
 * invite engine can never leave duplicates behind.
 */

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{GroupRef, PendingAdmin};
use crate::error::EngineResult;
use crate::store::PendingAdminStore;

use super::PgStore;

const PENDING_COLUMNS: &str = "id, email, channel_id, sub_channel_id, uuid, created_at, updated_at";

#[async_trait]
impl PendingAdminStore for PgStore {
    async fn find_pending_by_uuid(&self, uuid: Uuid) -> EngineResult<Option<PendingAdmin>> {
        let pending = sqlx::query_as::<_, PendingAdmin>(&format!(
            r#"
            SELECT {PENDING_COLUMNS}
            FROM pending_admins
            WHERE uuid = $1
            "#
        ))
        .bind(uuid)
        .fetch_optional(self.pool())
        .await?;

        Ok(pending)
    }

    async fn find_pending_by_email(&self, email: &str) -> EngineResult<Option<PendingAdmin>> {
        let pending = sqlx::query_as::<_, PendingAdmin>(&format!(
            r#"
            SELECT {PENDING_COLUMNS}
            FROM pending_admins
            WHERE email = $1
            ORDER BY updated_at DESC
            LIMIT 1
            "#
        ))
        .bind(email)
        .fetch_optional(self.pool())
        .await?;

        Ok(pending)
    }

    async fn find_pending_for_target(
        &self,
        target: GroupRef,
    ) -> EngineResult<Option<PendingAdmin>> {
        let query = match target {
            GroupRef::Channel(_) => format!(
                r#"
                SELECT {PENDING_COLUMNS}
                FROM pending_admins
                WHERE channel_id = $1 AND sub_channel_id IS NULL
                "#
            ),
            GroupRef::SubChannel(_) => format!(
                r#"
                SELECT {PENDING_COLUMNS}
                FROM pending_admins
                WHERE sub_channel_id = $1
                "#
            ),
        };

        let pending = sqlx::query_as::<_, PendingAdmin>(&query)
            .bind(target.id())
            .fetch_optional(self.pool())
            .await?;

        Ok(pending)
    }

    async fn create_pending(
        &self,
        email: &str,
        target: GroupRef,
        uuid: Uuid,
    ) -> EngineResult<PendingAdmin> {
        let (channel_id, sub_channel_id) = match target {
            GroupRef::Channel(id) => (Some(id), None),
            GroupRef::SubChannel(id) => (None, Some(id)),
        };

        let pending = sqlx::query_as::<_, PendingAdmin>(&format!(
            r#"
            INSERT INTO pending_admins (email, channel_id, sub_channel_id, uuid)
            VALUES ($1, $2, $3, $4)
            RETURNING {PENDING_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(channel_id)
        .bind(sub_channel_id)
        .bind(uuid)
        .fetch_one(self.pool())
        .await?;

        Ok(pending)
    }

    async fn update_pending_email(
        &self,
        id: i64,
        email: &str,
        new_uuid: Option<Uuid>,
    ) -> EngineResult<PendingAdmin> {
        let pending = sqlx::query_as::<_, PendingAdmin>(&format!(
            r#"
            UPDATE pending_admins
            SET email = $1,
                uuid = COALESCE($2, uuid),
                updated_at = NOW()
            WHERE id = $3
            RETURNING {PENDING_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(new_uuid)
        .bind(id)
        .fetch_one(self.pool())
        .await?;

        Ok(pending)
    }

    async fn delete_pending(&self, id: i64) -> EngineResult<bool> {
        let deleted = sqlx::query(
            r#"
            DELETE FROM pending_admins
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(self.pool())
        .await?
        .rows_affected();

        Ok(deleted > 0)
    }
}
