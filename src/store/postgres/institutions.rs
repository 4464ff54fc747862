use async_trait::async_trait;

use crate::domain::{Institution, InstitutionId, UserId};
use crate::error::EngineResult;
use crate::store::InstitutionStore;

use super::PgStore;

#[async_trait]
impl InstitutionStore for PgStore {
    async fn find_institution(&self, id: InstitutionId) -> EngineResult<Option<Institution>> {
        let institution = sqlx::query_as::<_, Institution>(
            r#"
            SELECT id, name, website, admin_id
            FROM institutions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(institution)
    }

    async fn set_institution_admin(
        &self,
        id: InstitutionId,
        admin_id: UserId,
    ) -> EngineResult<()> {
        // no-op when the institution row is missing
        sqlx::query(
            r#"
            UPDATE institutions
            SET admin_id = $1
            WHERE id = $2
            "#,
        )
        .bind(admin_id)
        .bind(id)
        .execute(self.pool())
        .await?;

        Ok(())
    }
}
