//! `PgRotationStore` against a real database.
//!
//! Covers the guarantees that let several schedulers share one database:
//! - a selection insert is first-writer-wins per `(issue, module)`
//! - a manual upsert never overwrites a confirmed row
//! - usage is applied in one transaction; a stale cursor rolls it all back
//! - a row is claimed once; the second confirmer sees `AlreadyConfirmed`
//! - a paid unit is never used past its weekly cap

use adrotate_core::confirm::plan_usage;
use adrotate_core::error::StoreError;
use adrotate_core::store::{CursorMove, RotationStore, UsageOutcome, UsagePlan};
use adrotate_core::types::{NewSelection, Selection, SelectionPolicy};
use adrotate_db::PgRotationStore;
use chrono::NaiveDate;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn issue_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
}

/// One publication, one sequential module, sponsor `a` at position 1 with
/// unit `u_a`, and issue `iss_1`.
async fn seed(pool: &PgPool) {
    sqlx::query("INSERT INTO publications (id, name) VALUES ('pub_1', 'Weekly')")
        .execute(pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO modules (id, publication_id, name, selection_policy, display_order)
         VALUES ('mod_1', 'pub_1', 'Top', 'sequential', 1)",
    )
    .execute(pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO sponsors (id, name) VALUES ('a', 'Acme')")
        .execute(pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO module_sponsors (module_id, sponsor_id, display_order)
         VALUES ('mod_1', 'a', 1)",
    )
    .execute(pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO creative_units (id, sponsor_id, module_id, display_order)
         VALUES ('u_a', 'a', 'mod_1', 1), ('u_a2', 'a', 'mod_1', 2)",
    )
    .execute(pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO issues (id, publication_id, issue_date) VALUES ('iss_1', 'pub_1', $1)",
    )
    .bind(issue_date())
    .execute(pool)
    .await
    .unwrap();
}

fn pick(unit_id: &str) -> NewSelection {
    NewSelection::new("iss_1", "mod_1", SelectionPolicy::Sequential, "test pick".to_string())
        .with_pick("a", unit_id)
}

async fn fresh_plan(store: &PgRotationStore, selection: &Selection) -> UsagePlan {
    let module = store.get_module("mod_1").await.unwrap().unwrap();
    let unit_id = selection.unit_id.as_deref().unwrap();
    let unit = store.get_unit(unit_id).await.unwrap().unwrap();
    let linked = store.list_linked_sponsors("mod_1").await.unwrap();
    let units = store.list_units("mod_1").await.unwrap();
    plan_usage(&selection.id, &module, &unit, &linked, &units, issue_date())
}

async fn counters(pool: &PgPool) -> (i32, i32, i32, i32, i32) {
    sqlx::query_as::<_, (i32, i32, i32, i32, i32)>(
        "SELECT u.times_used, s.times_used, ms.times_used, ms.unit_cursor, m.rotation_cursor
         FROM creative_units u, sponsors s, module_sponsors ms, modules m
         WHERE u.id = 'u_a' AND s.id = 'a'
           AND ms.module_id = 'mod_1' AND ms.sponsor_id = 'a'
           AND m.id = 'mod_1'",
    )
    .fetch_one(pool)
    .await
    .unwrap()
}

// ---------------------------------------------------------------------------
// Selection writes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn second_insert_returns_first_row(pool: PgPool) {
    seed(&pool).await;
    let store = PgRotationStore::new(pool);

    let first = store.insert_selection(&pick("u_a")).await.unwrap();
    let second = store.insert_selection(&pick("u_a2")).await.unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.unit_id.as_deref(), Some("u_a"));
    assert_eq!(store.list_selections("iss_1").await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_inserts_agree_on_one_row(pool: PgPool) {
    seed(&pool).await;
    let store = PgRotationStore::new(pool);

    let pick_a = pick("u_a");
    let pick_a2 = pick("u_a2");
    let (left, right) = tokio::join!(
        store.insert_selection(&pick_a),
        store.insert_selection(&pick_a2),
    );
    assert_eq!(left.unwrap().id, right.unwrap().id);
    assert_eq!(store.list_selections("iss_1").await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn manual_upsert_replaces_unconfirmed_but_not_confirmed(pool: PgPool) {
    seed(&pool).await;
    let store = PgRotationStore::new(pool);

    store.insert_selection(&pick("u_a")).await.unwrap();
    let manual = NewSelection::new(
        "iss_1",
        "mod_1",
        SelectionPolicy::Manual,
        "manually assigned unit u_a2".to_string(),
    )
    .with_pick("a", "u_a2");
    let replaced = store.upsert_manual_selection(&manual).await.unwrap().unwrap();
    assert_eq!(replaced.unit_id.as_deref(), Some("u_a2"));
    assert_eq!(replaced.policy, SelectionPolicy::Manual);

    let plan = fresh_plan(&store, &replaced).await;
    assert_eq!(store.apply_usage(&plan).await.unwrap(), UsageOutcome::Recorded);

    let again = NewSelection::new(
        "iss_1",
        "mod_1",
        SelectionPolicy::Manual,
        "manually assigned unit u_a".to_string(),
    )
    .with_pick("a", "u_a");
    assert!(store.upsert_manual_selection(&again).await.unwrap().is_none());

    let rows = store.list_selections("iss_1").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].unit_id.as_deref(), Some("u_a2"));
    assert!(rows[0].confirmed_at.is_some());
}

// ---------------------------------------------------------------------------
// Usage application
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn usage_is_recorded_once(pool: PgPool) {
    seed(&pool).await;
    let store = PgRotationStore::new(pool.clone());

    let selection = store.insert_selection(&pick("u_a")).await.unwrap();
    let plan = fresh_plan(&store, &selection).await;

    assert_eq!(store.apply_usage(&plan).await.unwrap(), UsageOutcome::Recorded);
    assert_eq!(counters(&pool).await, (1, 1, 1, 2, 1));

    assert_eq!(
        store.apply_usage(&plan).await.unwrap(),
        UsageOutcome::AlreadyConfirmed
    );
    assert_eq!(counters(&pool).await, (1, 1, 1, 2, 1));
    assert!(store.list_unconfirmed_selections("iss_1").await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn stale_module_cursor_rolls_back_everything(pool: PgPool) {
    seed(&pool).await;
    let store = PgRotationStore::new(pool.clone());

    let selection = store.insert_selection(&pick("u_a")).await.unwrap();
    let mut plan = fresh_plan(&store, &selection).await;
    plan.module_cursor = Some(CursorMove { expected: 7, next: 2 });

    let err = store.apply_usage(&plan).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));

    assert_eq!(counters(&pool).await, (0, 0, 0, 1, 1));
    let unit = store.get_unit("u_a").await.unwrap().unwrap();
    assert!(unit.last_used_date.is_none());
    assert_eq!(store.list_unconfirmed_selections("iss_1").await.unwrap().len(), 1);

    // A fresh plan goes through once the stale one is gone.
    let plan = fresh_plan(&store, &selection).await;
    assert_eq!(store.apply_usage(&plan).await.unwrap(), UsageOutcome::Recorded);
}

#[sqlx::test(migrations = "./migrations")]
async fn stale_unit_counter_is_a_conflict(pool: PgPool) {
    seed(&pool).await;
    let store = PgRotationStore::new(pool.clone());

    let selection = store.insert_selection(&pick("u_a")).await.unwrap();
    let mut plan = fresh_plan(&store, &selection).await;
    plan.unit_times_used = CursorMove { expected: 3, next: 4 };

    let err = store.apply_usage(&plan).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
    assert_eq!(counters(&pool).await, (0, 0, 0, 1, 1));
}

#[sqlx::test(migrations = "./migrations")]
async fn unit_at_cap_is_refused(pool: PgPool) {
    seed(&pool).await;
    sqlx::query(
        "UPDATE creative_units SET is_paid = true, weekly_cap = 1, times_used = 1 WHERE id = 'u_a'",
    )
    .execute(&pool)
    .await
    .unwrap();
    let store = PgRotationStore::new(pool.clone());

    let selection = store.insert_selection(&pick("u_a")).await.unwrap();
    let plan = fresh_plan(&store, &selection).await;

    let err = store.apply_usage(&plan).await.unwrap_err();
    assert!(matches!(err, StoreError::CapReached(ref id) if id == "u_a"));
    assert_eq!(counters(&pool).await, (1, 0, 0, 1, 1));
    assert_eq!(store.list_unconfirmed_selections("iss_1").await.unwrap().len(), 1);
}
