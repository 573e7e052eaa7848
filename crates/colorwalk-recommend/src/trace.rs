//! Optional observer for the resolution pipeline.
//!
//! Hooks fire at the pipeline boundaries (classify, resolve, accept,
//! fallback). They receive borrowed views and cannot alter the outcome.

use crate::classify::OracleLine;
use crate::resolve::{ParsedReference, Resolved};
use crate::{Candidate, ResolutionResult, SelectionRecord};

pub trait ResolutionTrace {
    fn classified(&self, _line: &OracleLine<'_>) {}

    fn resolved(&self, _line: &OracleLine<'_>, _reference: &ParsedReference, _hit: &Resolved<'_>) {}

    fn unresolved(&self, _line: &OracleLine<'_>, _reference: &ParsedReference) {}

    fn accepted(&self, _record: &SelectionRecord) {}

    /// A resolved candidate that was already in the result
    fn duplicate(&self, _candidate: &Candidate) {}

    fn fallback(&self, _record: &SelectionRecord) {}

    fn finished(&self, _result: &ResolutionResult) {}
}

/// Drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTrace;

impl ResolutionTrace for NoopTrace {}

/// Forwards events to `tracing` at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTrace;

impl ResolutionTrace for TracingTrace {
    fn classified(&self, line: &OracleLine<'_>) {
        tracing::trace!(line_no = line.line_no, kind = ?line.kind, text = line.text, "classified oracle line");
    }

    fn resolved(&self, line: &OracleLine<'_>, _reference: &ParsedReference, hit: &Resolved<'_>) {
        tracing::debug!(
            line_no = line.line_no,
            place_id = hit.candidate.id,
            name = %hit.candidate.name,
            strategy = ?hit.strategy,
            "resolved oracle line"
        );
    }

    fn unresolved(&self, line: &OracleLine<'_>, reference: &ParsedReference) {
        tracing::debug!(
            line_no = line.line_no,
            position = ?reference.position_hint,
            name = ?reference.name_hint,
            "could not resolve oracle line"
        );
    }

    fn accepted(&self, record: &SelectionRecord) {
        tracing::debug!(
            priority = record.priority,
            place_id = record.candidate.id,
            source = ?record.source,
            "accepted place"
        );
    }

    fn duplicate(&self, candidate: &Candidate) {
        tracing::debug!(place_id = candidate.id, "skipped duplicate place");
    }

    fn fallback(&self, record: &SelectionRecord) {
        tracing::debug!(
            priority = record.priority,
            place_id = record.candidate.id,
            "added fallback place"
        );
    }

    fn finished(&self, result: &ResolutionResult) {
        tracing::debug!(
            selected = result.len(),
            from_oracle = result.oracle_matched(),
            "resolution finished"
        );
    }
}
