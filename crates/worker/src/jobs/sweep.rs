use adrotate_core::types::Issue;
use adrotate_core::RotationStore;
use chrono::{NaiveDate, TimeDelta};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::WorkerState;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub passes: usize,
    pub selections: usize,
    pub confirmed_issues: usize,
    pub recorded: usize,
    pub errors: usize,
}

/// Inclusive range of issue dates that get a rotation pass on `today`. The
/// end saturates at `NaiveDate::MAX`.
pub fn rotation_window(today: NaiveDate, lookahead_days: i64) -> (NaiveDate, NaiveDate) {
    let end = TimeDelta::try_days(lookahead_days.max(0))
        .and_then(|ahead| today.checked_add_signed(ahead))
        .unwrap_or(NaiveDate::MAX);
    (today, end)
}

pub async fn run_sweep(state: &WorkerState, today: NaiveDate) -> anyhow::Result<SweepSummary> {
    let (from, to) = rotation_window(today, state.lookahead_days);
    let mut summary = SweepSummary::default();

    // Confirmations land before the next issue in line reads the cursors.
    let sent: Vec<Issue> = adrotate_db::queries::issues::list_sent_unconfirmed(&state.db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    confirm_sent(state.store.as_ref(), &sent, &mut summary).await;

    let awaiting: Vec<Issue> = adrotate_db::queries::issues::list_awaiting_rotation(&state.db, from, to)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    rotate_awaiting(state.store.as_ref(), &awaiting, &mut summary).await;

    info!(
        %from,
        %to,
        passes = summary.passes,
        selections = summary.selections,
        confirmed_issues = summary.confirmed_issues,
        recorded = summary.recorded,
        errors = summary.errors,
        "sweep complete"
    );

    Ok(summary)
}

/// Confirms `sent`, then rotates `awaiting`. A failing issue is logged and
/// counted; the rest of the sweep carries on.
pub async fn process_issues<S>(store: &S, awaiting: &[Issue], sent: &[Issue]) -> SweepSummary
where
    S: RotationStore + ?Sized,
{
    let mut summary = SweepSummary::default();
    confirm_sent(store, sent, &mut summary).await;
    rotate_awaiting(store, awaiting, &mut summary).await;
    summary
}

async fn confirm_sent<S>(store: &S, sent: &[Issue], summary: &mut SweepSummary)
where
    S: RotationStore + ?Sized,
{
    for issue in sent {
        match adrotate_core::confirm_usage(store, &issue.id, issue.issue_date).await {
            Ok(report) => {
                summary.confirmed_issues += 1;
                summary.recorded += report.recorded;
                summary.errors += report.failures.len();
            }
            Err(err) => {
                warn!(issue_id = %issue.id, error = %err, "usage confirmation failed");
                summary.errors += 1;
            }
        }
    }
}

/// Rotation state only moves on confirmation, so a publication gets at most
/// one new pass per sweep: its earliest awaiting issue. Later issues wait
/// until that one is confirmed.
async fn rotate_awaiting<S>(store: &S, awaiting: &[Issue], summary: &mut SweepSummary)
where
    S: RotationStore + ?Sized,
{
    let mut ordered: Vec<&Issue> = awaiting.iter().collect();
    ordered.sort_by(|a, b| a.issue_date.cmp(&b.issue_date).then(a.id.cmp(&b.id)));

    let mut rotated: HashSet<&str> = HashSet::new();
    for issue in ordered {
        if rotated.contains(issue.publication_id.as_str()) {
            debug!(issue_id = %issue.id, "earlier issue rotated this sweep, deferring");
            continue;
        }
        match adrotate_core::run_rotation_pass(store, &issue.id).await {
            Ok(pass) => {
                if !pass.skipped {
                    rotated.insert(issue.publication_id.as_str());
                    summary.passes += 1;
                    summary.selections += pass.selections.len();
                }
                summary.errors += pass.failures.len();
            }
            Err(err) => {
                warn!(issue_id = %issue.id, error = %err, "rotation pass failed");
                summary.errors += 1;
            }
        }
    }
}
