//! Recommendation Service: catalog → prompt → oracle → engine → assembly
//!
//! This is where the blocking and fallible work lives. By the time the
//! engine runs, the candidates are loaded and the oracle has answered (or
//! failed, in which case the engine gets an empty string).

use crate::assemble::{assemble, Recommendation};
use crate::distance::{within_km, DistanceAnnotator, DistanceUnit};
use crate::engine::SelectionEngine;
use crate::oracle::Oracle;
use crate::prompt::PromptBuilder;
use crate::{Candidate, CandidateSet, CandidateSetError, Coordinates, PlaceCategory, PreferenceProfile};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const MAX_PREFERRED_CATEGORIES: usize = 3;
pub const MAX_DISTANCE_KM: f64 = 50.0;
pub const MAX_REQUIREMENTS_CHARS: usize = 500;

// ============================================================================
// Request
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub member_id: u64,
    #[serde(default)]
    pub preferred_color_theme: Option<String>,
    #[serde(default)]
    pub preferred_categories: Vec<PlaceCategory>,
    #[serde(default)]
    pub current_latitude: Option<f64>,
    #[serde(default)]
    pub current_longitude: Option<f64>,
    /// Kilometers
    #[serde(default)]
    pub max_distance: Option<f64>,
    #[serde(default)]
    pub activity_level: Option<String>,
    #[serde(default)]
    pub additional_requirements: Option<String>,
    #[serde(default)]
    pub weather_condition: Option<String>,
    #[serde(default)]
    pub time_of_day: Option<String>,
}

impl RecommendationRequest {
    pub fn validate(&self) -> Result<(), RecommendError> {
        if self.preferred_categories.len() > MAX_PREFERRED_CATEGORIES {
            return Err(RecommendError::InvalidRequest(format!(
                "at most {MAX_PREFERRED_CATEGORIES} preferred categories are allowed"
            )));
        }
        if let Some(km) = self.max_distance {
            if !km.is_finite() || km < 0.0 || km > MAX_DISTANCE_KM {
                return Err(RecommendError::InvalidRequest(format!(
                    "maxDistance must be between 0 and {MAX_DISTANCE_KM} km"
                )));
            }
        }
        if let Some(text) = &self.additional_requirements {
            if text.chars().count() > MAX_REQUIREMENTS_CHARS {
                return Err(RecommendError::InvalidRequest(format!(
                    "additionalRequirements must be at most {MAX_REQUIREMENTS_CHARS} characters"
                )));
            }
        }
        if let Some(lat) = self.current_latitude {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(RecommendError::InvalidRequest(
                    "currentLatitude must be within [-90, 90]".to_string(),
                ));
            }
        }
        if let Some(lon) = self.current_longitude {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(RecommendError::InvalidRequest(
                    "currentLongitude must be within [-180, 180]".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Present only when both coordinates are
    pub fn origin(&self) -> Option<Coordinates> {
        match (self.current_latitude, self.current_longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        }
    }

    pub fn profile(&self) -> PreferenceProfile {
        PreferenceProfile {
            preferred_color_theme: self.preferred_color_theme.clone(),
            preferred_categories: self.preferred_categories.clone(),
            activity_level: self.activity_level.clone(),
            weather_condition: self.weather_condition.clone(),
            time_of_day: self.time_of_day.clone(),
            additional_requirements: self.additional_requirements.clone(),
        }
    }
}

// ============================================================================
// Errors and the catalog seam
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RecommendError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Member {0} does not exist")]
    UnknownMember(u64),
    #[error("Catalog error: {0}")]
    Catalog(String),
    #[error(transparent)]
    CandidateSet(#[from] CandidateSetError),
}

/// Source of candidate places and member identities
pub trait PlaceCatalog: Send + Sync {
    /// Every known place, in the order they should be offered
    fn list_candidates(&self) -> anyhow::Result<Vec<Candidate>>;

    fn member_exists(&self, member_id: u64) -> anyhow::Result<bool>;
}

// ============================================================================
// Service
// ============================================================================

pub struct RecommendationService {
    catalog: Arc<dyn PlaceCatalog>,
    oracle: Arc<dyn Oracle>,
    engine: SelectionEngine,
    prompts: PromptBuilder,
}

impl RecommendationService {
    pub fn new(catalog: Arc<dyn PlaceCatalog>, oracle: Arc<dyn Oracle>) -> Self {
        Self::with_engine(catalog, oracle, SelectionEngine::new())
    }

    pub fn with_engine(
        catalog: Arc<dyn PlaceCatalog>,
        oracle: Arc<dyn Oracle>,
        engine: SelectionEngine,
    ) -> Self {
        let prompts = PromptBuilder::new(engine.config().quota);
        Self {
            catalog,
            oracle,
            engine,
            prompts,
        }
    }

    pub fn engine(&self) -> &SelectionEngine {
        &self.engine
    }

    /// Candidates for this request, filtered by distance when both an origin
    /// and a maximum distance are given
    pub fn candidates_for(&self, request: &RecommendationRequest) -> Result<CandidateSet, RecommendError> {
        let mut candidates = self
            .catalog
            .list_candidates()
            .map_err(|e| RecommendError::Catalog(e.to_string()))?;

        if let (Some(origin), Some(max_km)) = (request.origin(), request.max_distance) {
            candidates.retain(|c| within_km(origin, c.coordinates(), max_km));
        }

        Ok(CandidateSet::new(candidates)?)
    }

    pub async fn recommend(&self, request: &RecommendationRequest) -> Result<Recommendation, RecommendError> {
        request.validate()?;

        let known = self
            .catalog
            .member_exists(request.member_id)
            .map_err(|e| RecommendError::Catalog(e.to_string()))?;
        if !known {
            return Err(RecommendError::UnknownMember(request.member_id));
        }

        let candidates = self.candidates_for(request)?;
        if candidates.is_empty() {
            tracing::info!(member_id = request.member_id, "no candidate places after filtering");
            return Ok(Recommendation::empty());
        }

        let profile = request.profile();
        let prompt = self.prompts.build(
            &profile,
            request.origin(),
            request.max_distance,
            candidates.as_slice(),
        );

        let oracle_text = match self.oracle.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    oracle = self.oracle.name(),
                    error = %e,
                    "oracle call failed, using fallback selection"
                );
                String::new()
            }
        };

        let annotator = DistanceAnnotator::new(request.origin(), DistanceUnit::Kilometers);
        let result = self.engine.resolve_annotated(&oracle_text, &candidates, &annotator);

        tracing::info!(
            member_id = request.member_id,
            candidates = candidates.len(),
            selected = result.len(),
            from_oracle = result.oracle_matched(),
            "recommendation assembled"
        );

        Ok(assemble(result, &profile))
    }
}
