// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Waiter sector-assignment lookups, bounded so a slow query never stalls
//! the accept loop or a `refresh_sectors` round-trip.

use gateway_core::constants::DB_LOOKUP_TIMEOUT;
use sqlx::PgPool;
use tracing::warn;

pub struct SectorRepository {
    pool: PgPool,
}

impl SectorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Today's sector ids a waiter is assigned to within a tenant. Falls
    /// back to an empty list on a query error or once the lookup passes
    /// [`DB_LOOKUP_TIMEOUT`] — a stale assignment list is safer than
    /// blocking the connection on a slow query.
    pub async fn sectors_for_waiter(&self, waiter_id: i64, tenant_id: i64) -> Vec<i64> {
        let query = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT sector_id
            FROM waiter_sector_assignment
            WHERE waiter_id = $1 AND tenant_id = $2 AND assignment_date = CURRENT_DATE AND is_active
            "#,
        )
        .bind(waiter_id)
        .bind(tenant_id)
        .fetch_all(&self.pool);

        match tokio::time::timeout(DB_LOOKUP_TIMEOUT, query).await {
            Ok(Ok(sector_ids)) => sector_ids,
            Ok(Err(err)) => {
                warn!(err = %err, waiter_id, tenant_id, "sector assignment lookup failed");
                Vec::new()
            }
            Err(_) => {
                warn!(waiter_id, tenant_id, "sector assignment lookup timed out");
                Vec::new()
            }
        }
    }
}
