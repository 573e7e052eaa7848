//! Fallback Completer: top up a short accumulator from candidate order

use crate::accumulate::{Offer, SelectionAccumulator};
use crate::trace::ResolutionTrace;
use crate::{CandidateSet, SelectionSource};

/// Append unselected candidates, in set order, until the quota is met or the
/// set runs out. Returns how many were appended.
///
/// Afterwards the accumulator holds `min(quota, |candidates|)` records.
pub fn complete(
    acc: &mut SelectionAccumulator,
    candidates: &CandidateSet,
    rationale: &str,
    trace: &dyn ResolutionTrace,
) -> usize {
    let mut added = 0;
    for candidate in candidates {
        if acc.is_full() {
            break;
        }
        if acc.contains(candidate.id) {
            continue;
        }
        if let Offer::Accepted(_) = acc.offer(candidate, rationale, SelectionSource::Fallback) {
            added += 1;
            if let Some(record) = acc.last() {
                trace.fallback(record);
            }
        }
    }
    added
}
