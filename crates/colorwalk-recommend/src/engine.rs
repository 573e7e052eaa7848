//! Selection Engine: classify → resolve → accumulate → fallback → annotate
//!
//! Synchronous and stateless between calls. Each call owns its accumulator,
//! borrows the candidate set read-only and never fails: malformed lines are
//! dropped and any shortfall is topped up from candidate order.

use crate::accumulate::{Offer, SelectionAccumulator};
use crate::classify::LineClassifier;
use crate::distance::DistanceAnnotator;
use crate::fallback;
use crate::resolve::ReferenceResolver;
use crate::trace::{ResolutionTrace, TracingTrace};
use crate::{CandidateSet, ResolutionResult, DEFAULT_QUOTA, FALLBACK_RATIONALE};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Places per recommendation
    pub quota: usize,
    /// Rationale for places added by fallback completion
    pub fallback_rationale: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            quota: DEFAULT_QUOTA,
            fallback_rationale: FALLBACK_RATIONALE.to_string(),
        }
    }
}

pub struct SelectionEngine {
    classifier: LineClassifier,
    resolver: ReferenceResolver,
    config: EngineConfig,
}

impl SelectionEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            classifier: LineClassifier::new(),
            resolver: ReferenceResolver::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve oracle text against `candidates`, logging through `tracing`
    pub fn resolve(&self, oracle_text: &str, candidates: &CandidateSet) -> ResolutionResult {
        self.resolve_traced(oracle_text, candidates, &TracingTrace)
    }

    /// Resolve and attach distances from the annotator's origin
    pub fn resolve_annotated(
        &self,
        oracle_text: &str,
        candidates: &CandidateSet,
        annotator: &DistanceAnnotator,
    ) -> ResolutionResult {
        let mut result = self.resolve(oracle_text, candidates);
        annotator.annotate(&mut result.records);
        result
    }

    pub fn resolve_traced(
        &self,
        oracle_text: &str,
        candidates: &CandidateSet,
        trace: &dyn ResolutionTrace,
    ) -> ResolutionResult {
        let mut acc = SelectionAccumulator::new(self.config.quota);

        for line in self.classifier.classify(oracle_text) {
            if acc.is_full() {
                break;
            }
            trace.classified(&line);
            if !line.is_candidate() {
                continue;
            }

            let reference = self.resolver.parse(line.text);
            let Some(hit) = self.resolver.resolve(&reference, candidates, acc.selected()) else {
                trace.unresolved(&line, &reference);
                continue;
            };
            trace.resolved(&line, &reference, &hit);

            match acc.offer(hit.candidate, reference.rationale.as_str(), hit.strategy.into()) {
                Offer::Accepted(_) => {
                    if let Some(record) = acc.last() {
                        trace.accepted(record);
                    }
                }
                Offer::Duplicate => trace.duplicate(hit.candidate),
                Offer::Full => break,
            }
        }

        if !acc.is_full() {
            fallback::complete(&mut acc, candidates, &self.config.fallback_rationale, trace);
        }

        let result = ResolutionResult {
            records: acc.into_records(),
        };
        trace.finished(&result);
        result
    }
}

impl Default for SelectionEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::NoopTrace;
    use crate::{Candidate, SelectionSource};
    use std::cell::RefCell;

    fn five() -> CandidateSet {
        CandidateSet::new(vec![
            Candidate::new(1, "Seoul Forest", 37.5444, 127.0374),
            Candidate::new(2, "Naksan Park", 37.5806, 127.0075),
            Candidate::new(3, "Riverside Park", 37.5284, 126.9327),
            Candidate::new(4, "Dongdaemun Design Plaza", 37.5665, 127.0092),
            Candidate::new(5, "Cheonggyecheon", 37.5696, 126.9784),
        ])
        .unwrap()
    }

    #[test]
    fn test_clean_oracle_output_is_taken_verbatim() {
        let text = "1. [3] Riverside Park - calm greenery\n\
                    2. [1] Seoul Forest - deer and trees\n\
                    3. [5] Cheonggyecheon - stream walk\n\
                    4. [2] Naksan Park - city wall\n\
                    5. [4] Dongdaemun Design Plaza - night lights";
        let result = SelectionEngine::new().resolve_traced(text, &five(), &NoopTrace);

        assert_eq!(result.ids(), vec![3, 1, 5, 2, 4]);
        assert_eq!(result.records[0].rationale, "calm greenery");
        assert_eq!(result.oracle_matched(), 5);
        assert!(result.is_well_formed());
    }

    #[test]
    fn test_stops_consuming_once_quota_reached() {
        let engine = SelectionEngine::with_config(EngineConfig {
            quota: 2,
            ..EngineConfig::default()
        });
        let seen = RefCell::new(0usize);
        struct Count<'a>(&'a RefCell<usize>);
        impl ResolutionTrace for Count<'_> {
            fn classified(&self, _line: &crate::classify::OracleLine<'_>) {
                *self.0.borrow_mut() += 1;
            }
        }

        let text = "1. [1] A - a\n2. [2] B - b\n3. [3] C - c\n4. [4] D - d";
        let result = engine.resolve_traced(text, &five(), &Count(&seen));

        assert_eq!(result.ids(), vec![1, 2]);
        assert_eq!(*seen.borrow(), 2);
    }

    #[test]
    fn test_noise_between_ranked_lines_is_ignored() {
        let text = "Sure! Here are five places:\n\n\
                    1. [2] Naksan Park - sunset\n\
                    (I considered the weather too)\n\
                    2. [4] Dongdaemun Design Plaza - indoor option\n\
                    Enjoy your walk!";
        let result = SelectionEngine::new().resolve_traced(text, &five(), &NoopTrace);

        assert_eq!(result.ids(), vec![2, 4, 1, 3, 5]);
        assert_eq!(result.oracle_matched(), 2);
        assert_eq!(result.records[2].source, SelectionSource::Fallback);
        assert_eq!(result.records[2].rationale, FALLBACK_RATIONALE);
    }

    #[test]
    fn test_custom_fallback_rationale() {
        let engine = SelectionEngine::with_config(EngineConfig {
            quota: 5,
            fallback_rationale: "picked for you".to_string(),
        });
        let result = engine.resolve_traced("", &five(), &NoopTrace);
        assert!(result.records.iter().all(|r| r.rationale == "picked for you"));
    }

    #[test]
    fn test_resolve_annotated_sets_distances() {
        let annotator = DistanceAnnotator::new(
            Some(crate::Coordinates::new(37.5665, 126.9780)),
            crate::DistanceUnit::Kilometers,
        );
        let result = SelectionEngine::new().resolve_annotated("", &five(), &annotator);
        assert!(result
            .records
            .iter()
            .all(|r| r.distance_from_origin.map_or(false, |d| d >= 0.0)));
    }
}
