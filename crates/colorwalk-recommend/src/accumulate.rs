//! Selection Accumulator: identity dedup, quota cap, first-accepted order

use crate::{Candidate, PlaceId, SelectionRecord, SelectionSource};
use std::collections::HashSet;

/// Outcome of offering a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// Appended with this priority
    Accepted(usize),
    /// Same id already present
    Duplicate,
    /// Quota already reached
    Full,
}

/// Private per-call state; never touches the candidate set
#[derive(Debug, Clone)]
pub struct SelectionAccumulator {
    quota: usize,
    records: Vec<SelectionRecord>,
    selected: HashSet<PlaceId>,
}

impl SelectionAccumulator {
    pub fn new(quota: usize) -> Self {
        Self {
            quota,
            records: Vec::with_capacity(quota),
            selected: HashSet::with_capacity(quota),
        }
    }

    pub fn quota(&self) -> usize {
        self.quota
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.records.len() >= self.quota
    }

    pub fn contains(&self, id: PlaceId) -> bool {
        self.selected.contains(&id)
    }

    /// Ids accepted so far, for the resolver's exclusion checks
    pub fn selected(&self) -> &HashSet<PlaceId> {
        &self.selected
    }

    pub fn records(&self) -> &[SelectionRecord] {
        &self.records
    }

    /// Append `candidate` with the next priority if it is new and there is room
    pub fn offer(
        &mut self,
        candidate: &Candidate,
        rationale: impl Into<String>,
        source: SelectionSource,
    ) -> Offer {
        if self.is_full() {
            return Offer::Full;
        }
        if !self.selected.insert(candidate.id) {
            return Offer::Duplicate;
        }
        let priority = self.records.len() + 1;
        self.records.push(SelectionRecord {
            candidate: candidate.clone(),
            rationale: rationale.into(),
            priority,
            distance_from_origin: None,
            source,
        });
        Offer::Accepted(priority)
    }

    pub fn last(&self) -> Option<&SelectionRecord> {
        self.records.last()
    }

    pub fn into_records(self) -> Vec<SelectionRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priorities_follow_acceptance_order() {
        let mut acc = SelectionAccumulator::new(5);
        let a = Candidate::new(3, "C", 0.0, 0.0);
        let b = Candidate::new(1, "A", 0.0, 0.0);

        assert_eq!(acc.offer(&a, "first", SelectionSource::Positional), Offer::Accepted(1));
        assert_eq!(acc.offer(&b, "second", SelectionSource::Name), Offer::Accepted(2));

        let records = acc.into_records();
        assert_eq!(records[0].candidate.id, 3);
        assert_eq!(records[0].rationale, "first");
        assert_eq!(records[1].priority, 2);
        assert_eq!(records[1].source, SelectionSource::Name);
    }

    #[test]
    fn test_duplicate_id_is_rejected_without_consuming_a_slot() {
        let mut acc = SelectionAccumulator::new(5);
        let a = Candidate::new(7, "A", 0.0, 0.0);
        let same_id = Candidate::new(7, "Other name", 1.0, 1.0);

        acc.offer(&a, "", SelectionSource::Positional);
        assert_eq!(acc.offer(&same_id, "", SelectionSource::Name), Offer::Duplicate);
        assert_eq!(acc.len(), 1);
        assert!(acc.contains(7));
    }

    #[test]
    fn test_quota_caps_acceptance() {
        let mut acc = SelectionAccumulator::new(2);
        assert_eq!(acc.quota(), 2);
        for id in 0..2 {
            acc.offer(&Candidate::new(id, "x", 0.0, 0.0), "", SelectionSource::Fallback);
        }
        assert!(acc.is_full());
        assert_eq!(
            acc.offer(&Candidate::new(9, "y", 0.0, 0.0), "", SelectionSource::Fallback),
            Offer::Full
        );
        assert!(!acc.contains(9));
    }

    #[test]
    fn test_zero_quota_is_always_full() {
        let mut acc = SelectionAccumulator::new(0);
        assert!(acc.is_full());
        assert_eq!(
            acc.offer(&Candidate::new(1, "x", 0.0, 0.0), "", SelectionSource::Positional),
            Offer::Full
        );
    }
}
