//! Sponsor-tier selection policies.

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::cursor::pick_at_cursor;
use crate::eligibility::EligibleSponsor;
use crate::types::{Module, SelectionPolicy};

/// Picks one sponsor from `candidates` according to the module's policy.
///
/// Returns `None` for an empty candidate list and always for
/// [`SelectionPolicy::Manual`], which is never computed.
pub fn select_sponsor<'a>(
    module: &Module,
    candidates: &'a [EligibleSponsor],
) -> Option<&'a EligibleSponsor> {
    select_sponsor_with(module, candidates, &mut rand::rng())
}

pub fn select_sponsor_with<'a, R: Rng + ?Sized>(
    module: &Module,
    candidates: &'a [EligibleSponsor],
    rng: &mut R,
) -> Option<&'a EligibleSponsor> {
    match module.selection_policy {
        SelectionPolicy::Sequential => sequential(candidates, module.rotation_cursor),
        SelectionPolicy::Random => least_used_random(candidates, rng),
        SelectionPolicy::Priority => priority(candidates),
        SelectionPolicy::Manual => None,
    }
}

fn sequential(candidates: &[EligibleSponsor], cursor: i32) -> Option<&EligibleSponsor> {
    let mut sorted: Vec<&EligibleSponsor> = candidates.iter().collect();
    sorted.sort_by_key(|c| c.link.display_order);
    pick_at_cursor(&sorted, cursor, |c| c.link.display_order).copied()
}

// Least-used first; ties broken uniformly at random.
fn least_used_random<'a, R: Rng + ?Sized>(
    candidates: &'a [EligibleSponsor],
    rng: &mut R,
) -> Option<&'a EligibleSponsor> {
    let min_used = candidates.iter().map(|c| c.link.times_used).min()?;
    let tied: Vec<&EligibleSponsor> = candidates
        .iter()
        .filter(|c| c.link.times_used == min_used)
        .collect();
    tied.choose(rng).copied()
}

// times_used is the cycle counter; priority only orders within a cycle.
fn priority(candidates: &[EligibleSponsor]) -> Option<&EligibleSponsor> {
    candidates.iter().min_by(|a, b| {
        a.link
            .times_used
            .cmp(&b.link.times_used)
            .then_with(|| b.link.priority.cmp(&a.link.priority))
            .then_with(|| a.link.display_order.cmp(&b.link.display_order))
    })
}
