//! Reference Resolver: ranked line → concrete candidate
//!
//! Two strategies, first success wins:
//! 1. **Positional**: the bracketed `[n]` addresses `CandidateSet::get(n)`.
//! 2. **Name**: the text between the bracket and the first hyphen is matched
//!    against candidate names, scanning the set in order.
//!
//! Already-selected candidates are invisible to both strategies, so a line
//! that points at a taken slot can still recover through its name.

use crate::classify::RANKED_PREFIX;
use crate::{Candidate, CandidateSet, PlaceId, SelectionSource};
use regex::Regex;
use std::collections::HashSet;

/// What one ranked line claims
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedReference {
    /// The bracketed index, if it parses as a positive integer
    pub position_hint: Option<usize>,
    /// Name fragment between the prefix and the first hyphen, if non-empty
    pub name_hint: Option<String>,
    /// Text after the first hyphen, trimmed; empty when there is none
    pub rationale: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    Positional,
    Name,
}

impl From<MatchStrategy> for SelectionSource {
    fn from(strategy: MatchStrategy) -> Self {
        match strategy {
            MatchStrategy::Positional => SelectionSource::Positional,
            MatchStrategy::Name => SelectionSource::Name,
        }
    }
}

/// A candidate picked by one of the strategies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved<'c> {
    pub candidate: &'c Candidate,
    pub strategy: MatchStrategy,
}

pub struct ReferenceResolver {
    prefix: Regex,
}

impl ReferenceResolver {
    pub fn new() -> Self {
        Self {
            prefix: Regex::new(RANKED_PREFIX).expect("ranked-line pattern compiles"),
        }
    }

    /// Split a ranked line into position, name fragment and rationale
    pub fn parse(&self, line: &str) -> ParsedReference {
        let line = line.trim();
        let (position_hint, rest) = match self.prefix.captures(line) {
            Some(caps) => {
                let position = caps
                    .get(1)
                    .and_then(|m| m.as_str().parse::<usize>().ok())
                    .filter(|n| *n > 0);
                let end = caps.get(0).map_or(0, |m| m.end());
                (position, &line[end..])
            }
            None => (None, line),
        };

        let (name, rationale) = match rest.split_once('-') {
            Some((name, rationale)) => (name.trim(), rationale.trim()),
            None => (rest.trim(), ""),
        };

        ParsedReference {
            position_hint,
            name_hint: (!name.is_empty()).then(|| name.to_string()),
            rationale: rationale.to_string(),
        }
    }

    /// Resolve a parsed reference against the candidates not yet selected
    pub fn resolve<'c>(
        &self,
        reference: &ParsedReference,
        candidates: &'c CandidateSet,
        selected: &HashSet<PlaceId>,
    ) -> Option<Resolved<'c>> {
        let positional = reference
            .position_hint
            .and_then(|n| by_position(n, candidates, selected))
            .map(|candidate| Resolved {
                candidate,
                strategy: MatchStrategy::Positional,
            });
        if positional.is_some() {
            return positional;
        }

        reference
            .name_hint
            .as_deref()
            .and_then(|fragment| by_name(fragment, candidates, selected))
            .map(|candidate| Resolved {
                candidate,
                strategy: MatchStrategy::Name,
            })
    }
}

impl Default for ReferenceResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Candidate at 1-based `position`, unless out of range or already taken
pub fn by_position<'c>(
    position: usize,
    candidates: &'c CandidateSet,
    selected: &HashSet<PlaceId>,
) -> Option<&'c Candidate> {
    candidates
        .get(position)
        .filter(|c| !selected.contains(&c.id))
}

/// First untaken candidate, in set order, whose name equals the fragment,
/// contains it, or is contained by it.
///
/// The three checks form one predicate: the earliest candidate satisfying any
/// of them wins, even if a later candidate is an exact match.
pub fn by_name<'c>(
    fragment: &str,
    candidates: &'c CandidateSet,
    selected: &HashSet<PlaceId>,
) -> Option<&'c Candidate> {
    if fragment.is_empty() {
        return None;
    }
    candidates
        .iter()
        .filter(|c| !selected.contains(&c.id))
        .find(|c| name_matches(&c.name, fragment))
}

fn name_matches(name: &str, fragment: &str) -> bool {
    // an empty name would be "contained" by every fragment
    if name.is_empty() {
        return false;
    }
    name == fragment || name.contains(fragment) || fragment.contains(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set() -> CandidateSet {
        CandidateSet::new(vec![
            Candidate::new(11, "Seoul Forest", 37.5444, 127.0374),
            Candidate::new(12, "Naksan Park", 37.5806, 127.0075),
            Candidate::new(13, "Riverside Park", 37.5284, 126.9327),
            Candidate::new(14, "Dongdaemun Design Plaza", 37.5665, 127.0092),
            Candidate::new(15, "Cheonggyecheon", 37.5696, 126.9784),
        ])
        .unwrap()
    }

    #[test]
    fn test_parse_full_line() {
        let r = ReferenceResolver::new().parse("1. [3] Riverside Park - calm greenery");
        assert_eq!(r.position_hint, Some(3));
        assert_eq!(r.name_hint.as_deref(), Some("Riverside Park"));
        assert_eq!(r.rationale, "calm greenery");
    }

    #[test]
    fn test_parse_without_hyphen_has_empty_rationale() {
        let r = ReferenceResolver::new().parse("2. [4] Dongdaemun Design Plaza");
        assert_eq!(r.position_hint, Some(4));
        assert_eq!(r.name_hint.as_deref(), Some("Dongdaemun Design Plaza"));
        assert_eq!(r.rationale, "");
    }

    #[test]
    fn test_parse_splits_on_first_hyphen_only() {
        let r = ReferenceResolver::new().parse("1. [2] Naksan Park - night view - city wall");
        assert_eq!(r.name_hint.as_deref(), Some("Naksan Park"));
        assert_eq!(r.rationale, "night view - city wall");
    }

    #[test]
    fn test_parse_zero_and_overflowing_index_give_no_position() {
        let resolver = ReferenceResolver::new();
        assert_eq!(resolver.parse("1. [0] Foo - bar").position_hint, None);
        let huge = "1. [99999999999999999999999999] Foo - bar";
        let r = resolver.parse(huge);
        assert_eq!(r.position_hint, None);
        assert_eq!(r.name_hint.as_deref(), Some("Foo"));
    }

    #[test]
    fn test_positional_wins() {
        let resolver = ReferenceResolver::new();
        let set = set();
        let r = resolver.parse("1. [3] Riverside Park - calm greenery");
        let hit = resolver.resolve(&r, &set, &HashSet::new()).unwrap();
        assert_eq!(hit.candidate.id, 13);
        assert_eq!(hit.strategy, MatchStrategy::Positional);
    }

    #[test]
    fn test_positional_ignores_name_text() {
        let resolver = ReferenceResolver::new();
        let set = set();
        // bracket says 1, name says something else: bracket is trusted
        let r = resolver.parse("1. [1] Cheonggyecheon - stream");
        let hit = resolver.resolve(&r, &set, &HashSet::new()).unwrap();
        assert_eq!(hit.candidate.id, 11);
    }

    #[test]
    fn test_out_of_range_falls_through_to_name() {
        let resolver = ReferenceResolver::new();
        let set = set();
        let r = resolver.parse("1. [9] Naksan Park - bar");
        let hit = resolver.resolve(&r, &set, &HashSet::new()).unwrap();
        assert_eq!(hit.candidate.id, 12);
        assert_eq!(hit.strategy, MatchStrategy::Name);
    }

    #[test]
    fn test_out_of_range_without_name_match_is_none() {
        let resolver = ReferenceResolver::new();
        let r = resolver.parse("1. [9] Foo - bar");
        assert!(resolver.resolve(&r, &set(), &HashSet::new()).is_none());
    }

    #[test]
    fn test_taken_position_recovers_by_name() {
        let resolver = ReferenceResolver::new();
        let set = set();
        let selected: HashSet<PlaceId> = [11].into_iter().collect();
        let r = resolver.parse("2. [1] Cheonggyecheon - water");
        let hit = resolver.resolve(&r, &set, &selected).unwrap();
        assert_eq!(hit.candidate.id, 15);
        assert_eq!(hit.strategy, MatchStrategy::Name);
    }

    #[test]
    fn test_name_match_is_substring_both_ways() {
        let set = set();
        let none = HashSet::new();
        assert_eq!(by_name("Forest", &set, &none).map(|c| c.id), Some(11));
        assert_eq!(
            by_name("the Dongdaemun Design Plaza area", &set, &none).map(|c| c.id),
            Some(14)
        );
        assert!(by_name("seoul forest", &set, &none).is_none());
    }

    #[test]
    fn test_name_match_earliest_candidate_wins_over_exact() {
        let set = CandidateSet::new(vec![
            Candidate::new(1, "Grand Park Annex", 0.0, 0.0),
            Candidate::new(2, "Park", 0.0, 0.0),
        ])
        .unwrap();
        // "Park" equals candidate 2 but candidate 1 contains it and comes first
        assert_eq!(by_name("Park", &set, &HashSet::new()).map(|c| c.id), Some(1));
    }

    #[test]
    fn test_empty_fragment_and_empty_names_never_match() {
        let set = CandidateSet::new(vec![
            Candidate::new(1, "", 0.0, 0.0),
            Candidate::new(2, "Park", 0.0, 0.0),
        ])
        .unwrap();
        assert!(by_name("", &set, &HashSet::new()).is_none());
        assert_eq!(by_name("Big Park", &set, &HashSet::new()).map(|c| c.id), Some(2));

        let resolver = ReferenceResolver::new();
        let r = resolver.parse("1. [7] - reason only");
        assert_eq!(r.name_hint, None);
        assert!(resolver.resolve(&r, &set, &HashSet::new()).is_none());
    }
}
