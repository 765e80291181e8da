//! Administrative operations on rotation state.

use tracing::info;

use crate::error::RotationError;
use crate::store::RotationStore;
use crate::types::{NewSelection, Selection, SelectionPolicy};

pub async fn reset_module_cursor<S>(store: &S, module_id: &str) -> Result<(), RotationError>
where
    S: RotationStore + ?Sized,
{
    set_module_cursor(store, module_id, 1).await
}

pub async fn set_module_cursor<S>(
    store: &S,
    module_id: &str,
    position: i32,
) -> Result<(), RotationError>
where
    S: RotationStore + ?Sized,
{
    if position < 1 {
        return Err(RotationError::InvalidPosition(position));
    }
    if !store.set_module_cursor(module_id, position).await? {
        return Err(RotationError::NotFound("module"));
    }
    info!(module_id, position, "module cursor set");
    Ok(())
}

/// Pins `unit_id` as the module's selection for an issue, replacing any
/// unconfirmed selection already there.
pub async fn manually_assign_unit<S>(
    store: &S,
    issue_id: &str,
    module_id: &str,
    unit_id: &str,
) -> Result<Selection, RotationError>
where
    S: RotationStore + ?Sized,
{
    store
        .get_issue(issue_id)
        .await?
        .ok_or(RotationError::NotFound("issue"))?;
    store
        .get_module(module_id)
        .await?
        .ok_or(RotationError::NotFound("module"))?;
    let unit = store
        .get_unit(unit_id)
        .await?
        .ok_or(RotationError::NotFound("unit"))?;

    if unit.module_id != module_id {
        return Err(RotationError::UnitNotInModule {
            unit_id: unit_id.to_string(),
            module_id: module_id.to_string(),
        });
    }

    let new = NewSelection::new(
        issue_id,
        module_id,
        SelectionPolicy::Manual,
        format!("manually assigned unit {unit_id}"),
    )
    .with_pick(&unit.sponsor_id, &unit.id);

    let selection = store
        .upsert_manual_selection(&new)
        .await?
        .ok_or_else(|| RotationError::SelectionAlreadyConfirmed {
            module_id: module_id.to_string(),
        })?;

    info!(issue_id, module_id, unit_id, "unit manually assigned");
    Ok(selection)
}
