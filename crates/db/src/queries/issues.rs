//! Issue lookups. Issues are written by the publishing side; the scheduler
//! only reads them.

use crate::models::Issue;
use chrono::NaiveDate;
use sqlx::PgPool;

pub async fn get_by_id(pool: &PgPool, id: &str) -> Result<Option<Issue>, sqlx::Error> {
    sqlx::query_as::<_, Issue>(
        r#"
        SELECT id, publication_id, issue_date, status, created_at
        FROM issues
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Scheduled issues dated within `[from, to]` that have no selections yet and
/// are next in line for their publication: no earlier issue still holds an
/// unconfirmed unit, and no earlier in-window issue is itself unrotated.
pub async fn list_awaiting_rotation(
    pool: &PgPool,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<Issue>, sqlx::Error> {
    sqlx::query_as::<_, Issue>(
        r#"
        SELECT i.id, i.publication_id, i.issue_date, i.status, i.created_at
        FROM issues i
        WHERE i.status = 'scheduled'
          AND i.issue_date BETWEEN $1 AND $2
          AND NOT EXISTS (SELECT 1 FROM selections s WHERE s.issue_id = i.id)
          AND NOT EXISTS (
              SELECT 1
              FROM issues e
              JOIN selections s ON s.issue_id = e.id
              WHERE e.publication_id = i.publication_id
                AND e.issue_date < i.issue_date
                AND s.confirmed_at IS NULL
                AND s.unit_id IS NOT NULL
          )
          AND NOT EXISTS (
              SELECT 1
              FROM issues e
              WHERE e.publication_id = i.publication_id
                AND e.status = 'scheduled'
                AND e.issue_date >= $1
                AND e.issue_date < i.issue_date
                AND NOT EXISTS (SELECT 1 FROM selections s WHERE s.issue_id = e.id)
          )
        ORDER BY i.issue_date ASC
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
}

/// Sent issues that still hold unconfirmed selections with a unit.
pub async fn list_sent_unconfirmed(pool: &PgPool) -> Result<Vec<Issue>, sqlx::Error> {
    sqlx::query_as::<_, Issue>(
        r#"
        SELECT i.id, i.publication_id, i.issue_date, i.status, i.created_at
        FROM issues i
        WHERE i.status = 'sent'
          AND EXISTS (
              SELECT 1 FROM selections s
              WHERE s.issue_id = i.id
                AND s.confirmed_at IS NULL
                AND s.unit_id IS NOT NULL
          )
        ORDER BY i.issue_date ASC
        "#,
    )
    .fetch_all(pool)
    .await
}
