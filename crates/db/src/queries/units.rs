use crate::models::{CreativeUnit, UnitStatus};
use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};

pub async fn get_by_id(pool: &PgPool, id: &str) -> Result<Option<CreativeUnit>, sqlx::Error> {
    sqlx::query_as::<_, CreativeUnit>(
        r#"
        SELECT id, sponsor_id, module_id, display_order, status, is_paid,
               weekly_cap, times_used, last_used_date, earliest_start_date,
               created_at, updated_at
        FROM creative_units
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn list_by_module(
    pool: &PgPool,
    module_id: &str,
) -> Result<Vec<CreativeUnit>, sqlx::Error> {
    sqlx::query_as::<_, CreativeUnit>(
        r#"
        SELECT id, sponsor_id, module_id, display_order, status, is_paid,
               weekly_cap, times_used, last_used_date, earliest_start_date,
               created_at, updated_at
        FROM creative_units
        WHERE module_id = $1
        ORDER BY sponsor_id ASC, display_order ASC
        "#,
    )
    .bind(module_id)
    .fetch_all(pool)
    .await
}

/// Records one confirmed use. `times_used` only moves from `expected_used`
/// and never past a paid unit's weekly cap; either guard failing returns
/// `false`.
pub async fn record_use(
    conn: &mut PgConnection,
    id: &str,
    expected_used: i32,
    next_used: i32,
    used_on: NaiveDate,
    status: UnitStatus,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE creative_units
        SET times_used = $1,
            last_used_date = $2,
            status = $3,
            updated_at = now()
        WHERE id = $4
          AND times_used = $5
          AND (NOT is_paid OR weekly_cap IS NULL OR times_used < weekly_cap)
        "#,
    )
    .bind(next_used)
    .bind(used_on)
    .bind(status)
    .bind(id)
    .bind(expected_used)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
