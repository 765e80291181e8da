use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    Sequential,
    Random,
    Priority,
    Manual,
}

impl SelectionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionPolicy::Sequential => "sequential",
            SelectionPolicy::Random => "random",
            SelectionPolicy::Priority => "priority",
            SelectionPolicy::Manual => "manual",
        }
    }
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    Scheduled,
    Sent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub publication_id: String,
    pub name: String,
    pub selection_policy: SelectionPolicy,
    pub rotation_cursor: i32,
    pub is_active: bool,
    pub display_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sponsor {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    pub times_used: i32,
    pub last_used_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SponsorLink {
    pub module_id: String,
    pub sponsor_id: String,
    pub display_order: i32,
    pub priority: i32,
    pub times_used: i32,
    pub unit_cursor: i32,
}

/// A module's link to a sponsor, read together with the sponsor row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedSponsor {
    pub link: SponsorLink,
    pub sponsor: Sponsor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
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
}

impl CreativeUnit {
    /// Paid units with a cap are the only ones subject to cap and cooldown rules.
    pub fn capped_limit(&self) -> Option<i32> {
        if self.is_paid {
            self.weekly_cap
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub publication_id: String,
    pub issue_date: NaiveDate,
    pub status: IssueStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
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

/// A selection about to be written by a rotation pass or a manual assignment.
#[derive(Debug, Clone)]
pub struct NewSelection {
    pub id: String,
    pub issue_id: String,
    pub module_id: String,
    pub sponsor_id: Option<String>,
    pub unit_id: Option<String>,
    pub policy: SelectionPolicy,
    pub reason: String,
}

impl NewSelection {
    pub fn new(issue_id: &str, module_id: &str, policy: SelectionPolicy, reason: String) -> Self {
        Self {
            id: format!("sel_{}", nanoid::nanoid!(12)),
            issue_id: issue_id.to_string(),
            module_id: module_id.to_string(),
            sponsor_id: None,
            unit_id: None,
            policy,
            reason,
        }
    }

    pub fn with_pick(mut self, sponsor_id: &str, unit_id: &str) -> Self {
        self.sponsor_id = Some(sponsor_id.to_string());
        self.unit_id = Some(unit_id.to_string());
        self
    }
}

/// Why a module produced no unit. Absence of an ad is a valid outcome, so these
/// are written as selection reasons rather than raised as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ManualSelectionRequired,
    NoEligibleSponsors,
    PolicyReturnedNothing,
    NoEligibleUnit,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::ManualSelectionRequired => "manual selection required",
            SkipReason::NoEligibleSponsors => "no eligible sponsors",
            SkipReason::PolicyReturnedNothing => "selection policy returned no sponsor",
            SkipReason::NoEligibleUnit => "sponsor has no eligible unit",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
