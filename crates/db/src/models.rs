use adrotate_core::types as core_types;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "selection_policy", rename_all = "lowercase")]
pub enum SelectionPolicy {
    Sequential,
    Random,
    Priority,
    Manual,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "unit_status", rename_all = "lowercase")]
pub enum UnitStatus {
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "issue_status", rename_all = "lowercase")]
pub enum IssueStatus {
    Scheduled,
    Sent,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Module {
    pub id: String,
    pub publication_id: String,
    pub name: String,
    pub selection_policy: SelectionPolicy,
    pub rotation_cursor: i32,
    pub is_active: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A `module_sponsors` row joined with its sponsor.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LinkedSponsor {
    pub module_id: String,
    pub sponsor_id: String,
    pub display_order: i32,
    pub priority: i32,
    pub times_used: i32,
    pub unit_cursor: i32,
    pub sponsor_name: String,
    pub sponsor_is_active: bool,
    pub sponsor_times_used: i32,
    pub sponsor_last_used_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CreativeUnit {
    pub id: String,
    pub sponsor_id: String,
    pub module_id: String,
    pub display_order: i32,
    pub status: UnitStatus,
    pub is_paid: bool,
    pub weekly_cap: Option<i32>,
    pub times_used: i32,
    pub last_used_date: Option<NaiveDate>,
    pub earliest_start_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Issue {
    pub id: String,
    pub publication_id: String,
    pub issue_date: NaiveDate,
    pub status: IssueStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Selection {
    pub id: String,
    pub issue_id: String,
    pub module_id: String,
    pub sponsor_id: Option<String>,
    pub unit_id: Option<String>,
    pub policy: SelectionPolicy,
    pub reason: String,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<SelectionPolicy> for core_types::SelectionPolicy {
    fn from(policy: SelectionPolicy) -> Self {
        match policy {
            SelectionPolicy::Sequential => core_types::SelectionPolicy::Sequential,
            SelectionPolicy::Random => core_types::SelectionPolicy::Random,
            SelectionPolicy::Priority => core_types::SelectionPolicy::Priority,
            SelectionPolicy::Manual => core_types::SelectionPolicy::Manual,
        }
    }
}

impl From<core_types::SelectionPolicy> for SelectionPolicy {
    fn from(policy: core_types::SelectionPolicy) -> Self {
        match policy {
            core_types::SelectionPolicy::Sequential => SelectionPolicy::Sequential,
            core_types::SelectionPolicy::Random => SelectionPolicy::Random,
            core_types::SelectionPolicy::Priority => SelectionPolicy::Priority,
            core_types::SelectionPolicy::Manual => SelectionPolicy::Manual,
        }
    }
}

impl From<UnitStatus> for core_types::UnitStatus {
    fn from(status: UnitStatus) -> Self {
        match status {
            UnitStatus::Active => core_types::UnitStatus::Active,
            UnitStatus::Completed => core_types::UnitStatus::Completed,
        }
    }
}

impl From<core_types::UnitStatus> for UnitStatus {
    fn from(status: core_types::UnitStatus) -> Self {
        match status {
            core_types::UnitStatus::Active => UnitStatus::Active,
            core_types::UnitStatus::Completed => UnitStatus::Completed,
        }
    }
}

impl From<IssueStatus> for core_types::IssueStatus {
    fn from(status: IssueStatus) -> Self {
        match status {
            IssueStatus::Scheduled => core_types::IssueStatus::Scheduled,
            IssueStatus::Sent => core_types::IssueStatus::Sent,
        }
    }
}

impl From<Module> for core_types::Module {
    fn from(row: Module) -> Self {
        Self {
            id: row.id,
            publication_id: row.publication_id,
            name: row.name,
            selection_policy: row.selection_policy.into(),
            rotation_cursor: row.rotation_cursor,
            is_active: row.is_active,
            display_order: row.display_order,
        }
    }
}

impl From<LinkedSponsor> for core_types::LinkedSponsor {
    fn from(row: LinkedSponsor) -> Self {
        Self {
            sponsor: core_types::Sponsor {
                id: row.sponsor_id.clone(),
                name: row.sponsor_name,
                is_active: row.sponsor_is_active,
                times_used: row.sponsor_times_used,
                last_used_date: row.sponsor_last_used_date,
            },
            link: core_types::SponsorLink {
                module_id: row.module_id,
                sponsor_id: row.sponsor_id,
                display_order: row.display_order,
                priority: row.priority,
                times_used: row.times_used,
                unit_cursor: row.unit_cursor,
            },
        }
    }
}

impl From<CreativeUnit> for core_types::CreativeUnit {
    fn from(row: CreativeUnit) -> Self {
        Self {
            id: row.id,
            sponsor_id: row.sponsor_id,
            module_id: row.module_id,
            display_order: row.display_order,
            status: row.status.into(),
            is_paid: row.is_paid,
            weekly_cap: row.weekly_cap,
            times_used: row.times_used,
            last_used_date: row.last_used_date,
            earliest_start_date: row.earliest_start_date,
        }
    }
}

impl From<Issue> for core_types::Issue {
    fn from(row: Issue) -> Self {
        Self {
            id: row.id,
            publication_id: row.publication_id,
            issue_date: row.issue_date,
            status: row.status.into(),
        }
    }
}

impl From<Selection> for core_types::Selection {
    fn from(row: Selection) -> Self {
        Self {
            id: row.id,
            issue_id: row.issue_id,
            module_id: row.module_id,
            sponsor_id: row.sponsor_id,
            unit_id: row.unit_id,
            policy: row.policy.into(),
            reason: row.reason,
            confirmed_at: row.confirmed_at,
            created_at: row.created_at,
        }
    }
}
