//! Which sponsors, and which of their units, may run in a module on a date.

use chrono::NaiveDate;
use std::collections::HashSet;

use crate::calendar::{same_week, same_weekday};
use crate::types::{CreativeUnit, LinkedSponsor, Sponsor, SponsorLink, UnitStatus};

/// A sponsor that survived filtering, with at least one runnable unit.
#[derive(Debug, Clone)]
pub struct EligibleSponsor {
    pub link: SponsorLink,
    pub sponsor: Sponsor,
    pub units: Vec<CreativeUnit>,
}

impl EligibleSponsor {
    pub fn sponsor_id(&self) -> &str {
        &self.link.sponsor_id
    }
}

/// Whether `unit` may run in an issue dated `issue_date`.
///
/// Paid units with a weekly cap additionally need remaining uses, must not have
/// run earlier in the same Sunday-aligned week, and must not have last run on
/// the same weekday as the issue.
pub fn unit_is_eligible(unit: &CreativeUnit, issue_date: NaiveDate) -> bool {
    if unit.status != UnitStatus::Active {
        return false;
    }
    if matches!(unit.earliest_start_date, Some(start) if start > issue_date) {
        return false;
    }

    if let Some(cap) = unit.capped_limit() {
        if cap - unit.times_used <= 0 {
            return false;
        }
        if let Some(last_used) = unit.last_used_date {
            if same_week(issue_date, last_used) || same_weekday(issue_date, last_used) {
                return false;
            }
        }
    }

    true
}

/// Filters a module's linked sponsors down to those selectable for the issue.
///
/// Inactive sponsors and sponsors in `excluded` are dropped, as is any sponsor
/// left with no eligible unit. The result is ordered by link `display_order`.
pub fn eligible_sponsors(
    linked: &[LinkedSponsor],
    units: &[CreativeUnit],
    issue_date: NaiveDate,
    excluded: &HashSet<String>,
) -> Vec<EligibleSponsor> {
    let mut eligible: Vec<EligibleSponsor> = linked
        .iter()
        .filter(|entry| entry.sponsor.is_active)
        .filter(|entry| !excluded.contains(&entry.link.sponsor_id))
        .filter_map(|entry| {
            let sponsor_units: Vec<CreativeUnit> = units
                .iter()
                .filter(|unit| unit.sponsor_id == entry.link.sponsor_id)
                .filter(|unit| unit.module_id == entry.link.module_id)
                .filter(|unit| unit_is_eligible(unit, issue_date))
                .cloned()
                .collect();

            if sponsor_units.is_empty() {
                return None;
            }

            Some(EligibleSponsor {
                link: entry.link.clone(),
                sponsor: entry.sponsor.clone(),
                units: sponsor_units,
            })
        })
        .collect();

    eligible.sort_by_key(|entry| entry.link.display_order);
    eligible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{linked, unit};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_active_uncapped_unit_is_eligible() {
        let u = unit("u1", "sp_a", 1);
        assert!(unit_is_eligible(&u, d("2025-06-04")));
    }

    #[test]
    fn test_completed_unit_is_never_eligible() {
        let mut u = unit("u1", "sp_a", 1);
        u.status = UnitStatus::Completed;
        assert!(!unit_is_eligible(&u, d("2025-06-04")));
    }

    #[test]
    fn test_earliest_start_date_boundary() {
        let mut u = unit("u1", "sp_a", 1);
        u.earliest_start_date = Some(d("2025-06-01"));
        assert!(!unit_is_eligible(&u, d("2025-05-30")));
        assert!(unit_is_eligible(&u, d("2025-06-01")));
        assert!(unit_is_eligible(&u, d("2025-06-02")));
    }

    #[test]
    fn test_exhausted_cap_is_ineligible_regardless_of_last_use() {
        let mut u = unit("u1", "sp_a", 1);
        u.is_paid = true;
        u.weekly_cap = Some(2);
        u.times_used = 2;
        assert!(!unit_is_eligible(&u, d("2025-06-04")));
        u.last_used_date = Some(d("2024-01-02"));
        assert!(!unit_is_eligible(&u, d("2025-06-04")));
    }

    #[test]
    fn test_cap_ignored_for_unpaid_units() {
        let mut u = unit("u1", "sp_a", 1);
        u.weekly_cap = Some(1);
        u.times_used = 5;
        u.last_used_date = Some(d("2025-06-03"));
        assert!(unit_is_eligible(&u, d("2025-06-04")));
    }

    #[test]
    fn test_capped_unit_cooldown_same_week() {
        let mut u = unit("u1", "sp_a", 1);
        u.is_paid = true;
        u.weekly_cap = Some(3);
        u.times_used = 1;
        // Monday then Wednesday of the same week.
        u.last_used_date = Some(d("2025-06-02"));
        assert!(!unit_is_eligible(&u, d("2025-06-04")));
        // Following Tuesday: different week, different weekday.
        assert!(unit_is_eligible(&u, d("2025-06-10")));
    }

    #[test]
    fn test_capped_unit_rejected_on_same_weekday_next_week() {
        let mut u = unit("u1", "sp_a", 1);
        u.is_paid = true;
        u.weekly_cap = Some(3);
        u.times_used = 1;
        u.last_used_date = Some(d("2025-06-02"));
        assert!(!unit_is_eligible(&u, d("2025-06-09")));
    }

    #[test]
    fn test_inactive_and_excluded_sponsors_dropped() {
        let mut inactive = linked("mod_1", "sp_b", 2);
        inactive.sponsor.is_active = false;
        let links = vec![linked("mod_1", "sp_a", 1), inactive, linked("mod_1", "sp_c", 3)];
        let units = vec![unit("u1", "sp_a", 1), unit("u2", "sp_b", 1), unit("u3", "sp_c", 1)];
        let excluded: HashSet<String> = ["sp_c".to_string()].into_iter().collect();

        let eligible = eligible_sponsors(&links, &units, d("2025-06-04"), &excluded);
        let ids: Vec<&str> = eligible.iter().map(|e| e.sponsor_id()).collect();
        assert_eq!(ids, vec!["sp_a"]);
    }

    #[test]
    fn test_sponsor_without_eligible_units_dropped() {
        let links = vec![linked("mod_1", "sp_a", 1), linked("mod_1", "sp_b", 2)];
        let mut done = unit("u2", "sp_b", 1);
        done.status = UnitStatus::Completed;
        let units = vec![unit("u1", "sp_a", 1), done];

        let eligible = eligible_sponsors(&links, &units, d("2025-06-04"), &HashSet::new());
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].sponsor_id(), "sp_a");
        assert_eq!(eligible[0].units.len(), 1);
    }

    #[test]
    fn test_result_sorted_by_link_display_order() {
        let links = vec![linked("mod_1", "sp_c", 3), linked("mod_1", "sp_a", 1)];
        let units = vec![unit("u1", "sp_a", 1), unit("u3", "sp_c", 1)];
        let eligible = eligible_sponsors(&links, &units, d("2025-06-04"), &HashSet::new());
        let ids: Vec<&str> = eligible.iter().map(|e| e.sponsor_id()).collect();
        assert_eq!(ids, vec!["sp_a", "sp_c"]);
    }
}
