//! Fixture builders shared by unit and integration tests.

use chrono::NaiveDate;

use crate::types::{
    CreativeUnit, Issue, IssueStatus, LinkedSponsor, Module, SelectionPolicy, Sponsor,
    SponsorLink, UnitStatus,
};

pub fn module(id: &str, publication_id: &str, policy: SelectionPolicy, display_order: i32) -> Module {
    Module {
        id: id.to_string(),
        publication_id: publication_id.to_string(),
        name: id.to_string(),
        selection_policy: policy,
        rotation_cursor: 1,
        is_active: true,
        display_order,
    }
}

pub fn sponsor(id: &str) -> Sponsor {
    Sponsor {
        id: id.to_string(),
        name: id.to_string(),
        is_active: true,
        times_used: 0,
        last_used_date: None,
    }
}

pub fn link(module_id: &str, sponsor_id: &str, display_order: i32) -> SponsorLink {
    SponsorLink {
        module_id: module_id.to_string(),
        sponsor_id: sponsor_id.to_string(),
        display_order,
        priority: 0,
        times_used: 0,
        unit_cursor: 1,
    }
}

pub fn linked(module_id: &str, sponsor_id: &str, display_order: i32) -> LinkedSponsor {
    LinkedSponsor {
        link: link(module_id, sponsor_id, display_order),
        sponsor: sponsor(sponsor_id),
    }
}

/// An active, unpaid, uncapped unit in `mod_1`.
pub fn unit(id: &str, sponsor_id: &str, display_order: i32) -> CreativeUnit {
    unit_in("mod_1", id, sponsor_id, display_order)
}

pub fn unit_in(module_id: &str, id: &str, sponsor_id: &str, display_order: i32) -> CreativeUnit {
    CreativeUnit {
        id: id.to_string(),
        sponsor_id: sponsor_id.to_string(),
        module_id: module_id.to_string(),
        display_order,
        status: UnitStatus::Active,
        is_paid: false,
        weekly_cap: None,
        times_used: 0,
        last_used_date: None,
        earliest_start_date: None,
    }
}

pub fn issue(id: &str, publication_id: &str, issue_date: NaiveDate) -> Issue {
    Issue {
        id: id.to_string(),
        publication_id: publication_id.to_string(),
        issue_date,
        status: IssueStatus::Scheduled,
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("fixture date")
}
