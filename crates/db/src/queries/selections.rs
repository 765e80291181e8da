//! Rotation outcomes, one row per `(issue_id, module_id)`.

use crate::models::{Selection, SelectionPolicy};
use sqlx::{PgConnection, PgPool};

pub async fn list_by_issue(pool: &PgPool, issue_id: &str) -> Result<Vec<Selection>, sqlx::Error> {
    sqlx::query_as::<_, Selection>(
        r#"
        SELECT s.id, s.issue_id, s.module_id, s.sponsor_id, s.unit_id, s.policy,
               s.reason, s.confirmed_at, s.created_at
        FROM selections s
        JOIN modules m ON m.id = s.module_id
        WHERE s.issue_id = $1
        ORDER BY m.display_order ASC, s.module_id ASC
        "#,
    )
    .bind(issue_id)
    .fetch_all(pool)
    .await
}

pub async fn list_unconfirmed_by_issue(
    pool: &PgPool,
    issue_id: &str,
) -> Result<Vec<Selection>, sqlx::Error> {
    sqlx::query_as::<_, Selection>(
        r#"
        SELECT s.id, s.issue_id, s.module_id, s.sponsor_id, s.unit_id, s.policy,
               s.reason, s.confirmed_at, s.created_at
        FROM selections s
        JOIN modules m ON m.id = s.module_id
        WHERE s.issue_id = $1 AND s.confirmed_at IS NULL
        ORDER BY m.display_order ASC, s.module_id ASC
        "#,
    )
    .bind(issue_id)
    .fetch_all(pool)
    .await
}

pub async fn get_by_issue_module(
    pool: &PgPool,
    issue_id: &str,
    module_id: &str,
) -> Result<Option<Selection>, sqlx::Error> {
    sqlx::query_as::<_, Selection>(
        r#"
        SELECT id, issue_id, module_id, sponsor_id, unit_id, policy,
               reason, confirmed_at, created_at
        FROM selections
        WHERE issue_id = $1 AND module_id = $2
        "#,
    )
    .bind(issue_id)
    .bind(module_id)
    .fetch_optional(pool)
    .await
}

/// Inserts a row unless one exists for the pair; returns `None` on conflict.
#[allow(clippy::too_many_arguments)]
pub async fn insert_if_absent(
    pool: &PgPool,
    id: &str,
    issue_id: &str,
    module_id: &str,
    sponsor_id: Option<&str>,
    unit_id: Option<&str>,
    policy: SelectionPolicy,
    reason: &str,
) -> Result<Option<Selection>, sqlx::Error> {
    sqlx::query_as::<_, Selection>(
        r#"
        INSERT INTO selections (id, issue_id, module_id, sponsor_id, unit_id, policy, reason)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (issue_id, module_id) DO NOTHING
        RETURNING id, issue_id, module_id, sponsor_id, unit_id, policy,
                  reason, confirmed_at, created_at
        "#,
    )
    .bind(id)
    .bind(issue_id)
    .bind(module_id)
    .bind(sponsor_id)
    .bind(unit_id)
    .bind(policy)
    .bind(reason)
    .fetch_optional(pool)
    .await
}

/// Inserts or overwrites the pair's row while it is unconfirmed. Returns
/// `None` when the existing row is already confirmed.
#[allow(clippy::too_many_arguments)]
pub async fn upsert_unconfirmed(
    pool: &PgPool,
    id: &str,
    issue_id: &str,
    module_id: &str,
    sponsor_id: Option<&str>,
    unit_id: Option<&str>,
    policy: SelectionPolicy,
    reason: &str,
) -> Result<Option<Selection>, sqlx::Error> {
    sqlx::query_as::<_, Selection>(
        r#"
        INSERT INTO selections (id, issue_id, module_id, sponsor_id, unit_id, policy, reason)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (issue_id, module_id) DO UPDATE
        SET sponsor_id = EXCLUDED.sponsor_id,
            unit_id = EXCLUDED.unit_id,
            policy = EXCLUDED.policy,
            reason = EXCLUDED.reason
        WHERE selections.confirmed_at IS NULL
        RETURNING id, issue_id, module_id, sponsor_id, unit_id, policy,
                  reason, confirmed_at, created_at
        "#,
    )
    .bind(id)
    .bind(issue_id)
    .bind(module_id)
    .bind(sponsor_id)
    .bind(unit_id)
    .bind(policy)
    .bind(reason)
    .fetch_optional(pool)
    .await
}

/// Sets `confirmed_at` if still unset. Returns `false` when another
/// confirmer got there first.
pub async fn claim(conn: &mut PgConnection, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE selections
        SET confirmed_at = now()
        WHERE id = $1 AND confirmed_at IS NULL
        "#,
    )
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
