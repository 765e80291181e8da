use crate::models::Module;
use sqlx::{PgConnection, PgPool};

pub async fn get_by_id(pool: &PgPool, id: &str) -> Result<Option<Module>, sqlx::Error> {
    sqlx::query_as::<_, Module>(
        r#"
        SELECT id, publication_id, name, selection_policy, rotation_cursor,
               is_active, display_order, created_at, updated_at
        FROM modules
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn list_active_by_publication(
    pool: &PgPool,
    publication_id: &str,
) -> Result<Vec<Module>, sqlx::Error> {
    sqlx::query_as::<_, Module>(
        r#"
        SELECT id, publication_id, name, selection_policy, rotation_cursor,
               is_active, display_order, created_at, updated_at
        FROM modules
        WHERE publication_id = $1 AND is_active = true
        ORDER BY display_order ASC, id ASC
        "#,
    )
    .bind(publication_id)
    .fetch_all(pool)
    .await
}

/// Returns `false` when no module has this id.
pub async fn set_cursor(pool: &PgPool, id: &str, position: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE modules
        SET rotation_cursor = $1, updated_at = now()
        WHERE id = $2
        "#,
    )
    .bind(position)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Compare-and-swap on the rotation cursor. Returns `false` when the stored
/// cursor no longer equals `expected`.
pub async fn advance_cursor(
    conn: &mut PgConnection,
    id: &str,
    expected: i32,
    next: i32,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE modules
        SET rotation_cursor = $1, updated_at = now()
        WHERE id = $2 AND rotation_cursor = $3
        "#,
    )
    .bind(next)
    .bind(id)
    .bind(expected)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
