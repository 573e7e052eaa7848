//! ColorWalk Recommend: oracle text → five ranked walking destinations
//!
//! A text-generation oracle is asked to rank candidate places against a
//! walker's preferences. Its answer is free text with no reliability
//! guarantee. This crate turns that text into an ordered, duplicate-free
//! selection drawn only from the candidates the caller supplied.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                      RECOMMENDATION SELECTION                            │
//! ├──────────────────────────────────────────────────────────────────────────┤
//! │                                                                          │
//! │   oracle text ──► ┌────────────┐   ┌──────────────┐   ┌──────────────┐   │
//! │                   │   Line     │──►│  Reference   │──►│  Selection   │   │
//! │                   │ Classifier │   │  Resolver    │   │ Accumulator  │   │
//! │                   └────────────┘   │ [n] → name   │   │ dedup, quota │   │
//! │                                    └──────▲───────┘   └──────┬───────┘   │
//! │   CandidateSet ───────────────────────────┘                  │           │
//! │        │                                                     ▼           │
//! │        │                                              ┌──────────────┐   │
//! │        └─────────────────────────────────────────────►│   Fallback   │   │
//! │                                                       │  Completer   │   │
//! │                                                       └──────┬───────┘   │
//! │                                                              ▼           │
//! │                          ┌──────────────┐            ┌──────────────┐    │
//! │   ranked places ◄────────│   Result     │◄───────────│   Distance   │    │
//! │                          │  Assembler   │            │  Annotator   │    │
//! │                          └──────────────┘            └──────────────┘    │
//! │                                                                          │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//! - The result never contains the same place twice.
//! - The result holds `min(quota, |candidates|)` records, whatever the text says.
//! - Priorities run `1..=len` in output order.
//! - Identical inputs give identical output: no clock, no randomness.
//!
//! The oracle call, prompt construction and candidate retrieval live at the
//! edges ([`oracle`], [`prompt`], [`service`]); the engine in [`engine`] only
//! consumes text and a [`CandidateSet`].

pub mod accumulate;
pub mod assemble;
pub mod classify;
pub mod distance;
pub mod engine;
pub mod fallback;
pub mod oracle;
pub mod prompt;
pub mod resolve;
pub mod service;
pub mod trace;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Core Types
// ============================================================================

/// Stable identity of a place
pub type PlaceId = u64;

/// Number of places a recommendation carries
pub const DEFAULT_QUOTA: usize = 5;

/// Rationale attached to places added by the fallback completer
pub const FALLBACK_RATIONALE: &str = "system-selected fallback";

/// Kind of place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaceCategory {
    Park,
    Museum,
    Restaurant,
    Cafe,
    Landmark,
    Nature,
    Cultural,
    Shopping,
    Other,
}

impl PlaceCategory {
    pub const ALL: [PlaceCategory; 9] = [
        PlaceCategory::Park,
        PlaceCategory::Museum,
        PlaceCategory::Restaurant,
        PlaceCategory::Cafe,
        PlaceCategory::Landmark,
        PlaceCategory::Nature,
        PlaceCategory::Cultural,
        PlaceCategory::Shopping,
        PlaceCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceCategory::Park => "PARK",
            PlaceCategory::Museum => "MUSEUM",
            PlaceCategory::Restaurant => "RESTAURANT",
            PlaceCategory::Cafe => "CAFE",
            PlaceCategory::Landmark => "LANDMARK",
            PlaceCategory::Nature => "NATURE",
            PlaceCategory::Cultural => "CULTURAL",
            PlaceCategory::Shopping => "SHOPPING",
            PlaceCategory::Other => "OTHER",
        }
    }
}

impl fmt::Display for PlaceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaceCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        PlaceCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("unknown place category `{s}`"))
    }
}

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// One addressable place eligible for recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: PlaceId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub category: Option<PlaceCategory>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Candidate {
    /// Minimal candidate with only identity, name and position
    pub fn new(id: PlaceId, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id,
            name: name.into(),
            latitude,
            longitude,
            category: None,
            description: None,
            address: None,
            image_url: None,
        }
    }

    pub fn with_category(mut self, category: PlaceCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CandidateSetError {
    #[error("candidate id {id} appears more than once (positions {first} and {second})")]
    DuplicateId {
        id: PlaceId,
        first: usize,
        second: usize,
    },
}

/// Ordered candidates for one resolution.
///
/// Positions are 1-based and follow the order the candidates were shown to
/// the oracle, so `[3]` in oracle text means `get(3)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSet {
    items: Vec<Candidate>,
}

impl CandidateSet {
    /// Build a set, rejecting duplicate ids
    pub fn new(items: Vec<Candidate>) -> Result<Self, CandidateSetError> {
        let mut seen = std::collections::HashMap::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            if let Some(first) = seen.insert(item.id, idx + 1) {
                return Err(CandidateSetError::DuplicateId {
                    id: item.id,
                    first,
                    second: idx + 1,
                });
            }
        }
        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Candidate at a 1-based position
    pub fn get(&self, position: usize) -> Option<&Candidate> {
        position
            .checked_sub(1)
            .and_then(|idx| self.items.get(idx))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Candidate] {
        &self.items
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// How a record entered the result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSource {
    /// Bracketed index in the oracle line
    Positional,
    /// Name fragment in the oracle line
    Name,
    /// Topped up from candidate order
    Fallback,
}

/// One selected place with its rank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRecord {
    pub candidate: Candidate,
    pub rationale: String,
    /// 1-based, contiguous in output order
    pub priority: usize,
    /// `None` when no origin was supplied; never defaulted to zero
    pub distance_from_origin: Option<f64>,
    pub source: SelectionSource,
}

/// Ordered output of one resolution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub records: Vec<SelectionRecord>,
}

impl ResolutionResult {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ids(&self) -> Vec<PlaceId> {
        self.records.iter().map(|r| r.candidate.id).collect()
    }

    /// Number of records that came from the oracle text rather than fallback
    pub fn oracle_matched(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.source != SelectionSource::Fallback)
            .count()
    }

    /// True when ids are unique and priorities run 1..=len
    pub fn is_well_formed(&self) -> bool {
        let mut ids = HashSet::new();
        self.records
            .iter()
            .enumerate()
            .all(|(idx, r)| r.priority == idx + 1 && ids.insert(r.candidate.id))
    }
}

/// Walker preferences used for the prompt and the overall rationale
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceProfile {
    #[serde(default)]
    pub preferred_color_theme: Option<String>,
    #[serde(default)]
    pub preferred_categories: Vec<PlaceCategory>,
    #[serde(default)]
    pub activity_level: Option<String>,
    #[serde(default)]
    pub weather_condition: Option<String>,
    #[serde(default)]
    pub time_of_day: Option<String>,
    #[serde(default)]
    pub additional_requirements: Option<String>,
}

// ============================================================================
// Re-exports
// ============================================================================

pub use assemble::{RecommendedPlace, Recommendation};
pub use distance::{DistanceAnnotator, DistanceUnit};
pub use engine::{EngineConfig, SelectionEngine};
pub use oracle::{Oracle, OracleError};
pub use service::{PlaceCatalog, RecommendError, RecommendationRequest, RecommendationService};
pub use trace::{NoopTrace, ResolutionTrace, TracingTrace};
