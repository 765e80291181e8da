//! Persistence port for the rotation scheduler.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::StoreError;
use crate::types::{CreativeUnit, Issue, LinkedSponsor, Module, NewSelection, Selection, UnitStatus};

pub mod memory;

/// Compare-and-swap move of an integer column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorMove {
    pub expected: i32,
    pub next: i32,
}

/// Everything one confirmed selection changes, computed from a fresh read.
///
/// Stores apply a plan atomically: the selection is claimed only while
/// `confirmed_at` is unset, and every [`CursorMove`] must still match its
/// `expected` value or the whole plan is rejected with
/// [`StoreError::Conflict`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsagePlan {
    pub selection_id: String,
    pub module_id: String,
    pub sponsor_id: String,
    pub unit_id: String,
    pub used_on: NaiveDate,
    pub unit_times_used: CursorMove,
    pub unit_status: UnitStatus,
    /// `None` when the sponsor has no link in the module (manual picks).
    pub unit_cursor: Option<CursorMove>,
    /// Only set for sequential modules.
    pub module_cursor: Option<CursorMove>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageOutcome {
    Recorded,
    AlreadyConfirmed,
}

#[async_trait]
pub trait RotationStore: Send + Sync {
    async fn get_issue(&self, issue_id: &str) -> Result<Option<Issue>, StoreError>;

    /// Active modules of a publication ordered by `display_order`.
    async fn list_active_modules(&self, publication_id: &str) -> Result<Vec<Module>, StoreError>;

    async fn get_module(&self, module_id: &str) -> Result<Option<Module>, StoreError>;

    async fn list_linked_sponsors(&self, module_id: &str)
        -> Result<Vec<LinkedSponsor>, StoreError>;

    async fn list_units(&self, module_id: &str) -> Result<Vec<CreativeUnit>, StoreError>;

    async fn get_unit(&self, unit_id: &str) -> Result<Option<CreativeUnit>, StoreError>;

    async fn list_selections(&self, issue_id: &str) -> Result<Vec<Selection>, StoreError>;

    async fn list_unconfirmed_selections(&self, issue_id: &str)
        -> Result<Vec<Selection>, StoreError>;

    /// Inserts unless a row for `(issue_id, module_id)` exists, in which case
    /// the existing row is returned untouched.
    async fn insert_selection(&self, selection: &NewSelection) -> Result<Selection, StoreError>;

    /// Inserts or replaces the unconfirmed row for `(issue_id, module_id)`.
    /// Returns `None` when the existing row is already confirmed.
    async fn upsert_manual_selection(
        &self,
        selection: &NewSelection,
    ) -> Result<Option<Selection>, StoreError>;

    /// Returns `false` when the module does not exist.
    async fn set_module_cursor(&self, module_id: &str, position: i32) -> Result<bool, StoreError>;

    async fn apply_usage(&self, plan: &UsagePlan) -> Result<UsageOutcome, StoreError>;
}
