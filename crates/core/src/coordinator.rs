//! One rotation pass: a two-tier pick for every active module of an issue.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::eligibility::eligible_sponsors;
use crate::error::{RotationError, StoreError};
use crate::policy::select_sponsor;
use crate::store::RotationStore;
use crate::types::{Module, NewSelection, Selection, SelectionPolicy, SkipReason};
use crate::unit::select_unit;

#[derive(Debug, Clone, Serialize)]
pub struct ModuleSelection {
    pub module_id: String,
    pub selection: Selection,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleFailure {
    pub module_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RotationPass {
    pub issue_id: String,
    /// Set when selections already existed and nothing was computed.
    pub skipped: bool,
    pub selections: Vec<ModuleSelection>,
    pub failures: Vec<ModuleFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Decision {
    Skip(SkipReason),
    Pick {
        sponsor_id: String,
        unit_id: String,
        unit_position: i32,
    },
}

/// Runs the rotation pass for `issue_id`.
///
/// Modules are visited in `display_order`; a sponsor picked by one module is
/// excluded from every later module of the same issue. A failure in one module
/// is recorded and the pass moves on. When the issue already has selections
/// the pass is skipped and the existing rows are returned.
pub async fn run_rotation_pass<S>(store: &S, issue_id: &str) -> Result<RotationPass, RotationError>
where
    S: RotationStore + ?Sized,
{
    let issue = store
        .get_issue(issue_id)
        .await?
        .ok_or(RotationError::NotFound("issue"))?;

    let existing = store.list_selections(issue_id).await?;
    if !existing.is_empty() {
        info!(issue_id, count = existing.len(), "selections exist, skipping rotation pass");
        return Ok(RotationPass {
            issue_id: issue_id.to_string(),
            skipped: true,
            selections: existing
                .into_iter()
                .map(|selection| ModuleSelection {
                    module_id: selection.module_id.clone(),
                    selection,
                })
                .collect(),
            failures: Vec::new(),
        });
    }

    let modules = store.list_active_modules(&issue.publication_id).await?;
    let mut excluded: HashSet<String> = HashSet::new();
    let mut selections = Vec::with_capacity(modules.len());
    let mut failures = Vec::new();

    for module in &modules {
        match assign_module(store, issue_id, issue.issue_date, module, &excluded).await {
            Ok(selection) => {
                if let Some(sponsor_id) = selection.sponsor_id.as_ref() {
                    excluded.insert(sponsor_id.clone());
                }
                selections.push(ModuleSelection {
                    module_id: module.id.clone(),
                    selection,
                });
            }
            Err(err) => {
                warn!(issue_id, module_id = %module.id, error = %err, "rotation failed for module");
                failures.push(ModuleFailure {
                    module_id: module.id.clone(),
                    error: err.to_string(),
                });
            }
        }
    }

    info!(
        issue_id,
        modules = modules.len(),
        assigned = selections.iter().filter(|s| s.selection.unit_id.is_some()).count(),
        failed = failures.len(),
        "rotation pass complete"
    );

    Ok(RotationPass {
        issue_id: issue_id.to_string(),
        skipped: false,
        selections,
        failures,
    })
}

async fn assign_module<S>(
    store: &S,
    issue_id: &str,
    issue_date: NaiveDate,
    module: &Module,
    excluded: &HashSet<String>,
) -> Result<Selection, StoreError>
where
    S: RotationStore + ?Sized,
{
    let decision = decide(store, issue_date, module, excluded).await?;
    let policy = module.selection_policy;

    let new = match decision {
        Decision::Skip(reason) => NewSelection::new(issue_id, &module.id, policy, reason.to_string()),
        Decision::Pick {
            sponsor_id,
            unit_id,
            unit_position,
        } => NewSelection::new(
            issue_id,
            &module.id,
            policy,
            format!(
                "{policy} rotation picked sponsor {sponsor_id}, unit {unit_id} at position {unit_position}"
            ),
        )
        .with_pick(&sponsor_id, &unit_id),
    };

    store.insert_selection(&new).await
}

async fn decide<S>(
    store: &S,
    issue_date: NaiveDate,
    module: &Module,
    excluded: &HashSet<String>,
) -> Result<Decision, StoreError>
where
    S: RotationStore + ?Sized,
{
    if module.selection_policy == SelectionPolicy::Manual {
        return Ok(Decision::Skip(SkipReason::ManualSelectionRequired));
    }

    let linked = store.list_linked_sponsors(&module.id).await?;
    let units = store.list_units(&module.id).await?;
    let candidates = eligible_sponsors(&linked, &units, issue_date, excluded);
    if candidates.is_empty() {
        return Ok(Decision::Skip(SkipReason::NoEligibleSponsors));
    }

    let Some(chosen) = select_sponsor(module, &candidates) else {
        return Ok(Decision::Skip(SkipReason::PolicyReturnedNothing));
    };

    let Some(unit) = select_unit(&chosen.units, chosen.link.unit_cursor) else {
        return Ok(Decision::Skip(SkipReason::NoEligibleUnit));
    };

    Ok(Decision::Pick {
        sponsor_id: chosen.link.sponsor_id.clone(),
        unit_id: unit.id.clone(),
        unit_position: unit.display_order,
    })
}
