//! Sponsor rows and their per-module links (`module_sponsors`).

use crate::models::LinkedSponsor;
use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};

/// All sponsors linked to a module, ordered by link position.
pub async fn list_linked(
    pool: &PgPool,
    module_id: &str,
) -> Result<Vec<LinkedSponsor>, sqlx::Error> {
    sqlx::query_as::<_, LinkedSponsor>(
        r#"
        SELECT ms.module_id, ms.sponsor_id, ms.display_order, ms.priority,
               ms.times_used, ms.unit_cursor,
               s.name AS sponsor_name,
               s.is_active AS sponsor_is_active,
               s.times_used AS sponsor_times_used,
               s.last_used_date AS sponsor_last_used_date
        FROM module_sponsors ms
        JOIN sponsors s ON s.id = ms.sponsor_id
        WHERE ms.module_id = $1
        ORDER BY ms.display_order ASC
        "#,
    )
    .bind(module_id)
    .fetch_all(pool)
    .await
}

/// Bumps the sponsor's reporting counters.
pub async fn record_use(
    conn: &mut PgConnection,
    sponsor_id: &str,
    used_on: NaiveDate,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE sponsors
        SET times_used = times_used + 1,
            last_used_date = $1,
            updated_at = now()
        WHERE id = $2
        "#,
    )
    .bind(used_on)
    .bind(sponsor_id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Bumps the link's fairness counter and swaps its unit cursor from
/// `expected` to `next`. Returns `false` on a cursor mismatch.
pub async fn record_link_use(
    conn: &mut PgConnection,
    module_id: &str,
    sponsor_id: &str,
    expected_cursor: i32,
    next_cursor: i32,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE module_sponsors
        SET times_used = times_used + 1,
            unit_cursor = $1
        WHERE module_id = $2 AND sponsor_id = $3 AND unit_cursor = $4
        "#,
    )
    .bind(next_cursor)
    .bind(module_id)
    .bind(sponsor_id)
    .bind(expected_cursor)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
