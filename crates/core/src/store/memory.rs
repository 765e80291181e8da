//! In-process [`RotationStore`] used by tests and dry runs.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;

use super::{RotationStore, UsageOutcome, UsagePlan};
use crate::error::StoreError;
use crate::types::{
    CreativeUnit, Issue, LinkedSponsor, Module, NewSelection, Selection, Sponsor, SponsorLink,
};

#[derive(Default)]
struct MemoryState {
    issues: HashMap<String, Issue>,
    modules: HashMap<String, Module>,
    sponsors: HashMap<String, Sponsor>,
    links: Vec<SponsorLink>,
    units: HashMap<String, CreativeUnit>,
    selections: Vec<Selection>,
    failing_modules: HashSet<String>,
    failing_units: HashSet<String>,
    failing_issues: HashSet<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_issue(&self, issue: Issue) {
        self.state.lock().await.issues.insert(issue.id.clone(), issue);
    }

    pub async fn insert_module(&self, module: Module) {
        self.state.lock().await.modules.insert(module.id.clone(), module);
    }

    pub async fn insert_sponsor(&self, sponsor: Sponsor) {
        self.state.lock().await.sponsors.insert(sponsor.id.clone(), sponsor);
    }

    pub async fn insert_link(&self, link: SponsorLink) {
        let mut state = self.state.lock().await;
        state
            .links
            .retain(|l| !(l.module_id == link.module_id && l.sponsor_id == link.sponsor_id));
        state.links.push(link);
    }

    pub async fn insert_unit(&self, unit: CreativeUnit) {
        self.state.lock().await.units.insert(unit.id.clone(), unit);
    }

    /// Makes every unit read for `module_id` fail with a persistence error.
    pub async fn fail_module(&self, module_id: &str) {
        self.state.lock().await.failing_modules.insert(module_id.to_string());
    }

    /// Makes usage writes touching `unit_id` fail with a persistence error.
    pub async fn fail_unit_writes(&self, unit_id: &str) {
        self.state.lock().await.failing_units.insert(unit_id.to_string());
    }

    /// Makes issue and selection reads for `issue_id` fail with a persistence
    /// error.
    pub async fn fail_issue_reads(&self, issue_id: &str) {
        self.state.lock().await.failing_issues.insert(issue_id.to_string());
    }

    pub async fn module(&self, module_id: &str) -> Option<Module> {
        self.state.lock().await.modules.get(module_id).cloned()
    }

    pub async fn sponsor(&self, sponsor_id: &str) -> Option<Sponsor> {
        self.state.lock().await.sponsors.get(sponsor_id).cloned()
    }

    pub async fn link(&self, module_id: &str, sponsor_id: &str) -> Option<SponsorLink> {
        self.state
            .lock()
            .await
            .links
            .iter()
            .find(|l| l.module_id == module_id && l.sponsor_id == sponsor_id)
            .cloned()
    }

    pub async fn unit(&self, unit_id: &str) -> Option<CreativeUnit> {
        self.state.lock().await.units.get(unit_id).cloned()
    }
}

fn to_selection(new: &NewSelection) -> Selection {
    Selection {
        id: new.id.clone(),
        issue_id: new.issue_id.clone(),
        module_id: new.module_id.clone(),
        sponsor_id: new.sponsor_id.clone(),
        unit_id: new.unit_id.clone(),
        policy: new.policy,
        reason: new.reason.clone(),
        confirmed_at: None,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl RotationStore for MemoryStore {
    async fn get_issue(&self, issue_id: &str) -> Result<Option<Issue>, StoreError> {
        let state = self.state.lock().await;
        if state.failing_issues.contains(issue_id) {
            return Err(StoreError::Persistence(format!("read failed for issue {issue_id}")));
        }
        Ok(state.issues.get(issue_id).cloned())
    }

    async fn list_active_modules(&self, publication_id: &str) -> Result<Vec<Module>, StoreError> {
        let state = self.state.lock().await;
        let mut modules: Vec<Module> = state
            .modules
            .values()
            .filter(|m| m.publication_id == publication_id && m.is_active)
            .cloned()
            .collect();
        modules.sort_by(|a, b| a.display_order.cmp(&b.display_order).then(a.id.cmp(&b.id)));
        Ok(modules)
    }

    async fn get_module(&self, module_id: &str) -> Result<Option<Module>, StoreError> {
        Ok(self.state.lock().await.modules.get(module_id).cloned())
    }

    async fn list_linked_sponsors(
        &self,
        module_id: &str,
    ) -> Result<Vec<LinkedSponsor>, StoreError> {
        let state = self.state.lock().await;
        let mut linked: Vec<LinkedSponsor> = state
            .links
            .iter()
            .filter(|l| l.module_id == module_id)
            .filter_map(|l| {
                state.sponsors.get(&l.sponsor_id).map(|s| LinkedSponsor {
                    link: l.clone(),
                    sponsor: s.clone(),
                })
            })
            .collect();
        linked.sort_by_key(|entry| entry.link.display_order);
        Ok(linked)
    }

    async fn list_units(&self, module_id: &str) -> Result<Vec<CreativeUnit>, StoreError> {
        let state = self.state.lock().await;
        if state.failing_modules.contains(module_id) {
            return Err(StoreError::Persistence(format!(
                "units unavailable for module {module_id}"
            )));
        }
        let mut units: Vec<CreativeUnit> = state
            .units
            .values()
            .filter(|u| u.module_id == module_id)
            .cloned()
            .collect();
        units.sort_by_key(|u| u.display_order);
        Ok(units)
    }

    async fn get_unit(&self, unit_id: &str) -> Result<Option<CreativeUnit>, StoreError> {
        Ok(self.state.lock().await.units.get(unit_id).cloned())
    }

    async fn list_selections(&self, issue_id: &str) -> Result<Vec<Selection>, StoreError> {
        let state = self.state.lock().await;
        if state.failing_issues.contains(issue_id) {
            return Err(StoreError::Persistence(format!("read failed for issue {issue_id}")));
        }
        Ok(state
            .selections
            .iter()
            .filter(|s| s.issue_id == issue_id)
            .cloned()
            .collect())
    }

    async fn list_unconfirmed_selections(
        &self,
        issue_id: &str,
    ) -> Result<Vec<Selection>, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .selections
            .iter()
            .filter(|s| s.issue_id == issue_id && s.confirmed_at.is_none())
            .cloned()
            .collect())
    }

    async fn insert_selection(&self, selection: &NewSelection) -> Result<Selection, StoreError> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state
            .selections
            .iter()
            .find(|s| s.issue_id == selection.issue_id && s.module_id == selection.module_id)
        {
            return Ok(existing.clone());
        }
        let row = to_selection(selection);
        state.selections.push(row.clone());
        Ok(row)
    }

    async fn upsert_manual_selection(
        &self,
        selection: &NewSelection,
    ) -> Result<Option<Selection>, StoreError> {
        let mut state = self.state.lock().await;
        let existing = state
            .selections
            .iter_mut()
            .find(|s| s.issue_id == selection.issue_id && s.module_id == selection.module_id);

        match existing {
            Some(row) if row.confirmed_at.is_some() => Ok(None),
            Some(row) => {
                row.sponsor_id = selection.sponsor_id.clone();
                row.unit_id = selection.unit_id.clone();
                row.policy = selection.policy;
                row.reason = selection.reason.clone();
                Ok(Some(row.clone()))
            }
            None => {
                let row = to_selection(selection);
                state.selections.push(row.clone());
                Ok(Some(row))
            }
        }
    }

    async fn set_module_cursor(&self, module_id: &str, position: i32) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        match state.modules.get_mut(module_id) {
            Some(module) => {
                module.rotation_cursor = position;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn apply_usage(&self, plan: &UsagePlan) -> Result<UsageOutcome, StoreError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let selection_idx = state
            .selections
            .iter()
            .position(|s| s.id == plan.selection_id)
            .ok_or(StoreError::NotFound("selection"))?;
        if state.selections[selection_idx].confirmed_at.is_some() {
            return Ok(UsageOutcome::AlreadyConfirmed);
        }
        if state.failing_units.contains(&plan.unit_id) {
            return Err(StoreError::Persistence(format!(
                "write failed for unit {}",
                plan.unit_id
            )));
        }

        // Validate every expectation before mutating anything.
        let unit = state.units.get(&plan.unit_id).ok_or(StoreError::NotFound("unit"))?;
        if unit.times_used != plan.unit_times_used.expected {
            return Err(StoreError::Conflict(format!("unit {} times_used", plan.unit_id)));
        }
        if unit.capped_limit().is_some_and(|cap| unit.times_used >= cap) {
            return Err(StoreError::CapReached(plan.unit_id.clone()));
        }
        let link_idx = state
            .links
            .iter()
            .position(|l| l.module_id == plan.module_id && l.sponsor_id == plan.sponsor_id);
        if let Some(cursor) = plan.unit_cursor {
            let idx = link_idx.ok_or(StoreError::NotFound("sponsor link"))?;
            if state.links[idx].unit_cursor != cursor.expected {
                return Err(StoreError::Conflict(format!(
                    "unit cursor for sponsor {}",
                    plan.sponsor_id
                )));
            }
        }
        if let Some(cursor) = plan.module_cursor {
            let module = state
                .modules
                .get(&plan.module_id)
                .ok_or(StoreError::NotFound("module"))?;
            if module.rotation_cursor != cursor.expected {
                return Err(StoreError::Conflict(format!(
                    "rotation cursor for module {}",
                    plan.module_id
                )));
            }
        }

        if let Some(unit) = state.units.get_mut(&plan.unit_id) {
            unit.times_used = plan.unit_times_used.next;
            unit.last_used_date = Some(plan.used_on);
            unit.status = plan.unit_status;
        }
        if let Some(sponsor) = state.sponsors.get_mut(&plan.sponsor_id) {
            sponsor.times_used += 1;
            sponsor.last_used_date = Some(plan.used_on);
        }
        if let Some(idx) = link_idx {
            let link = &mut state.links[idx];
            link.times_used += 1;
            if let Some(cursor) = plan.unit_cursor {
                link.unit_cursor = cursor.next;
            }
        }
        if let Some(cursor) = plan.module_cursor {
            if let Some(module) = state.modules.get_mut(&plan.module_id) {
                module.rotation_cursor = cursor.next;
            }
        }
        state.selections[selection_idx].confirmed_at = Some(Utc::now());

        Ok(UsageOutcome::Recorded)
    }
}
