/**
 * PostgreSQL Store
 *
 * sqlx-backed `Store` implementation. One file per entity mirrors the table
 * layout; the membership mutations are single statements that move the
 * join row and the counter together, so a partially-applied toggle cannot
 * be observed and concurrent toggles serialize on the row constraints.
 */

mod channels;
mod institutions;
mod pending_admins;
mod sub_channels;
mod users;

use sqlx::PgPool;

/// PostgreSQL-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing connection pool (see `config::load_database`).
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}
