//! Postgres implementation of the rotation persistence port.

use adrotate_core::error::StoreError;
use adrotate_core::store::{RotationStore, UsageOutcome, UsagePlan};
use adrotate_core::types::{CreativeUnit, Issue, LinkedSponsor, Module, NewSelection, Selection};
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::debug;

use crate::queries;

#[derive(Clone)]
pub struct PgRotationStore {
    pool: PgPool,
}

impl PgRotationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn persistence(err: sqlx::Error) -> StoreError {
    StoreError::from_persistence(err)
}

#[async_trait]
impl RotationStore for PgRotationStore {
    async fn get_issue(&self, issue_id: &str) -> Result<Option<Issue>, StoreError> {
        let issue = queries::issues::get_by_id(&self.pool, issue_id)
            .await
            .map_err(persistence)?;
        Ok(issue.map(Into::into))
    }

    async fn list_active_modules(&self, publication_id: &str) -> Result<Vec<Module>, StoreError> {
        let modules = queries::modules::list_active_by_publication(&self.pool, publication_id)
            .await
            .map_err(persistence)?;
        Ok(modules.into_iter().map(Into::into).collect())
    }

    async fn get_module(&self, module_id: &str) -> Result<Option<Module>, StoreError> {
        let module = queries::modules::get_by_id(&self.pool, module_id)
            .await
            .map_err(persistence)?;
        Ok(module.map(Into::into))
    }

    async fn list_linked_sponsors(
        &self,
        module_id: &str,
    ) -> Result<Vec<LinkedSponsor>, StoreError> {
        let linked = queries::sponsors::list_linked(&self.pool, module_id)
            .await
            .map_err(persistence)?;
        Ok(linked.into_iter().map(Into::into).collect())
    }

    async fn list_units(&self, module_id: &str) -> Result<Vec<CreativeUnit>, StoreError> {
        let units = queries::units::list_by_module(&self.pool, module_id)
            .await
            .map_err(persistence)?;
        Ok(units.into_iter().map(Into::into).collect())
    }

    async fn get_unit(&self, unit_id: &str) -> Result<Option<CreativeUnit>, StoreError> {
        let unit = queries::units::get_by_id(&self.pool, unit_id)
            .await
            .map_err(persistence)?;
        Ok(unit.map(Into::into))
    }

    async fn list_selections(&self, issue_id: &str) -> Result<Vec<Selection>, StoreError> {
        let rows = queries::selections::list_by_issue(&self.pool, issue_id)
            .await
            .map_err(persistence)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_unconfirmed_selections(
        &self,
        issue_id: &str,
    ) -> Result<Vec<Selection>, StoreError> {
        let rows = queries::selections::list_unconfirmed_by_issue(&self.pool, issue_id)
            .await
            .map_err(persistence)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert_selection(&self, selection: &NewSelection) -> Result<Selection, StoreError> {
        let inserted = queries::selections::insert_if_absent(
            &self.pool,
            &selection.id,
            &selection.issue_id,
            &selection.module_id,
            selection.sponsor_id.as_deref(),
            selection.unit_id.as_deref(),
            selection.policy.into(),
            &selection.reason,
        )
        .await
        .map_err(persistence)?;

        if let Some(row) = inserted {
            return Ok(row.into());
        }

        debug!(
            issue_id = %selection.issue_id,
            module_id = %selection.module_id,
            "selection already written by a concurrent pass"
        );
        let existing = queries::selections::get_by_issue_module(
            &self.pool,
            &selection.issue_id,
            &selection.module_id,
        )
        .await
        .map_err(persistence)?
        .ok_or(StoreError::NotFound("selection"))?;
        Ok(existing.into())
    }

    async fn upsert_manual_selection(
        &self,
        selection: &NewSelection,
    ) -> Result<Option<Selection>, StoreError> {
        let row = queries::selections::upsert_unconfirmed(
            &self.pool,
            &selection.id,
            &selection.issue_id,
            &selection.module_id,
            selection.sponsor_id.as_deref(),
            selection.unit_id.as_deref(),
            selection.policy.into(),
            &selection.reason,
        )
        .await
        .map_err(persistence)?;
        Ok(row.map(Into::into))
    }

    async fn set_module_cursor(&self, module_id: &str, position: i32) -> Result<bool, StoreError> {
        queries::modules::set_cursor(&self.pool, module_id, position)
            .await
            .map_err(persistence)
    }

    async fn apply_usage(&self, plan: &UsagePlan) -> Result<UsageOutcome, StoreError> {
        let mut tx = self.pool.begin().await.map_err(persistence)?;

        match self.apply_in(&mut tx, plan).await {
            Ok(UsageOutcome::Recorded) => {
                tx.commit().await.map_err(persistence)?;
                Ok(UsageOutcome::Recorded)
            }
            outcome => {
                tx.rollback().await.map_err(persistence)?;
                outcome
            }
        }
    }
}

impl PgRotationStore {
    /// Every write of one confirmation. Anything but `Recorded` leaves the
    /// transaction to be rolled back by the caller.
    async fn apply_in(
        &self,
        conn: &mut PgConnection,
        plan: &UsagePlan,
    ) -> Result<UsageOutcome, StoreError> {
        if !queries::selections::claim(&mut *conn, &plan.selection_id)
            .await
            .map_err(persistence)?
        {
            return Ok(UsageOutcome::AlreadyConfirmed);
        }

        if !queries::units::record_use(
            &mut *conn,
            &plan.unit_id,
            plan.unit_times_used.expected,
            plan.unit_times_used.next,
            plan.used_on,
            plan.unit_status.into(),
        )
        .await
        .map_err(persistence)?
        {
            let unit = queries::units::get_by_id(&self.pool, &plan.unit_id)
                .await
                .map_err(persistence)?
                .ok_or(StoreError::NotFound("unit"))?;
            if unit.times_used == plan.unit_times_used.expected {
                return Err(StoreError::CapReached(plan.unit_id.clone()));
            }
            return Err(StoreError::Conflict(format!("unit {} times_used", plan.unit_id)));
        }

        queries::sponsors::record_use(&mut *conn, &plan.sponsor_id, plan.used_on)
            .await
            .map_err(persistence)?;

        if let Some(cursor) = plan.unit_cursor {
            if !queries::sponsors::record_link_use(
                &mut *conn,
                &plan.module_id,
                &plan.sponsor_id,
                cursor.expected,
                cursor.next,
            )
            .await
            .map_err(persistence)?
            {
                return Err(StoreError::Conflict(format!(
                    "unit cursor for sponsor {}",
                    plan.sponsor_id
                )));
            }
        }

        if let Some(cursor) = plan.module_cursor {
            if !queries::modules::advance_cursor(&mut *conn, &plan.module_id, cursor.expected, cursor.next)
                .await
                .map_err(persistence)?
            {
                return Err(StoreError::Conflict(format!(
                    "rotation cursor for module {}",
                    plan.module_id
                )));
            }
        }

        Ok(UsageOutcome::Recorded)
    }
}
