//! Usage confirmation: advances rotation state once delivery is confirmed.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::cursor::next_position;
use crate::error::{RotationError, StoreError};
use crate::store::{CursorMove, RotationStore, UsageOutcome, UsagePlan};
use crate::types::{CreativeUnit, LinkedSponsor, Module, Selection, SelectionPolicy, UnitStatus};

#[derive(Debug, Clone, Serialize)]
pub struct RowFailure {
    pub selection_id: String,
    pub module_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    pub issue_id: String,
    pub recorded: usize,
    pub attempted: usize,
    /// Rows another confirmer claimed between our read and our write.
    pub already_confirmed: usize,
    pub failures: Vec<RowFailure>,
}

/// Builds the state changes for one used unit.
///
/// The unit flips to completed once a paid, capped unit reaches its cap. The
/// sponsor's unit cursor moves past the used unit, wrapping over the sponsor's
/// units that are still active afterwards. The module cursor only moves for
/// sequential modules, past the used sponsor's link position.
pub fn plan_usage(
    selection_id: &str,
    module: &Module,
    unit: &CreativeUnit,
    linked: &[LinkedSponsor],
    module_units: &[CreativeUnit],
    used_on: NaiveDate,
) -> UsagePlan {
    let times_used = unit.times_used + 1;
    let status = match unit.capped_limit() {
        Some(cap) if times_used >= cap => UnitStatus::Completed,
        _ => unit.status,
    };

    let max_unit_position = module_units
        .iter()
        .filter(|u| u.sponsor_id == unit.sponsor_id)
        .filter(|u| {
            if u.id == unit.id {
                status == UnitStatus::Active
            } else {
                u.status == UnitStatus::Active
            }
        })
        .map(|u| u.display_order)
        .max();

    let link = linked
        .iter()
        .map(|entry| &entry.link)
        .find(|l| l.sponsor_id == unit.sponsor_id);

    let unit_cursor = link.map(|l| CursorMove {
        expected: l.unit_cursor,
        next: next_position(unit.display_order, max_unit_position),
    });

    let module_cursor = match (module.selection_policy, link) {
        (SelectionPolicy::Sequential, Some(l)) => {
            let max_link_position = linked.iter().map(|entry| entry.link.display_order).max();
            Some(CursorMove {
                expected: module.rotation_cursor,
                next: next_position(l.display_order, max_link_position),
            })
        }
        _ => None,
    };

    UsagePlan {
        selection_id: selection_id.to_string(),
        module_id: module.id.clone(),
        sponsor_id: unit.sponsor_id.clone(),
        unit_id: unit.id.clone(),
        used_on,
        unit_times_used: CursorMove {
            expected: unit.times_used,
            next: times_used,
        },
        unit_status: status,
        unit_cursor,
        module_cursor,
    }
}

/// Confirms every unconfirmed, non-empty selection of `issue_id`.
///
/// Each row is planned from a fresh read and applied atomically. A failed row
/// is logged and reported; the remaining rows are still processed. Running
/// this again for the same issue finds nothing left to confirm.
pub async fn confirm_usage<S>(
    store: &S,
    issue_id: &str,
    issue_date: NaiveDate,
) -> Result<UsageReport, RotationError>
where
    S: RotationStore + ?Sized,
{
    let pending: Vec<Selection> = store
        .list_unconfirmed_selections(issue_id)
        .await?
        .into_iter()
        .filter(|s| s.unit_id.is_some())
        .collect();

    let mut report = UsageReport {
        issue_id: issue_id.to_string(),
        recorded: 0,
        attempted: pending.len(),
        already_confirmed: 0,
        failures: Vec::new(),
    };

    for selection in &pending {
        match confirm_row(store, selection, issue_date).await {
            Ok(UsageOutcome::Recorded) => report.recorded += 1,
            Ok(UsageOutcome::AlreadyConfirmed) => report.already_confirmed += 1,
            Err(err) => {
                warn!(
                    issue_id,
                    selection_id = %selection.id,
                    module_id = %selection.module_id,
                    error = %err,
                    "failed to record usage"
                );
                report.failures.push(RowFailure {
                    selection_id: selection.id.clone(),
                    module_id: selection.module_id.clone(),
                    error: err.to_string(),
                });
            }
        }
    }

    info!(
        issue_id,
        recorded = report.recorded,
        attempted = report.attempted,
        failed = report.failures.len(),
        "usage confirmation complete"
    );

    Ok(report)
}

async fn confirm_row<S>(
    store: &S,
    selection: &Selection,
    issue_date: NaiveDate,
) -> Result<UsageOutcome, StoreError>
where
    S: RotationStore + ?Sized,
{
    let unit_id = selection
        .unit_id
        .as_deref()
        .ok_or(StoreError::NotFound("unit"))?;
    let unit = store
        .get_unit(unit_id)
        .await?
        .ok_or(StoreError::NotFound("unit"))?;
    if unit
        .capped_limit()
        .is_some_and(|cap| unit.times_used >= cap)
    {
        return Err(StoreError::CapReached(unit.id));
    }
    let module = store
        .get_module(&selection.module_id)
        .await?
        .ok_or(StoreError::NotFound("module"))?;
    let linked = store.list_linked_sponsors(&module.id).await?;
    let module_units = store.list_units(&module.id).await?;

    let plan = plan_usage(&selection.id, &module, &unit, &linked, &module_units, issue_date);
    store.apply_usage(&plan).await
}
