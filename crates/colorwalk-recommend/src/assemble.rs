//! Result Assembler: selection records → wire-shaped recommendation

use crate::{PlaceCategory, PlaceId, PreferenceProfile, ResolutionResult, SelectionRecord};
use serde::{Deserialize, Serialize};

/// Shown when filtering left nothing to choose from
pub const NO_CANDIDATES_RATIONALE: &str =
    "No places are available to recommend. Try relaxing the search conditions.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedPlace {
    pub place_id: PlaceId,
    pub name: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<PlaceCategory>,
    pub distance_from_user: Option<f64>,
    #[serde(rename = "aiRecommendationReason")]
    pub rationale: String,
    pub priority: usize,
}

impl From<SelectionRecord> for RecommendedPlace {
    fn from(record: SelectionRecord) -> Self {
        let SelectionRecord {
            candidate,
            rationale,
            priority,
            distance_from_origin,
            ..
        } = record;
        Self {
            place_id: candidate.id,
            name: candidate.name,
            description: candidate.description,
            latitude: candidate.latitude,
            longitude: candidate.longitude,
            address: candidate.address,
            image_url: candidate.image_url,
            category: candidate.category,
            distance_from_user: distance_from_origin,
            rationale,
            priority,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "recommendationReason")]
    pub overall_rationale: String,
    #[serde(rename = "recommendedPlaces")]
    pub places: Vec<RecommendedPlace>,
}

impl Recommendation {
    pub fn empty() -> Self {
        Self {
            overall_rationale: NO_CANDIDATES_RATIONALE.to_string(),
            places: Vec::new(),
        }
    }
}

/// One sentence naming the profile fields that shaped the selection
pub fn overall_rationale(profile: &PreferenceProfile) -> String {
    let mut considered = Vec::new();
    if let Some(theme) = profile.preferred_color_theme.as_deref() {
        considered.push(format!("{theme} color theme"));
    }
    if let Some(level) = profile.activity_level.as_deref() {
        considered.push(format!("{level} activity level"));
    }
    if !profile.preferred_categories.is_empty() {
        let names: Vec<&str> = profile.preferred_categories.iter().map(|c| c.as_str()).collect();
        considered.push(format!("[{}] category preference", names.join(", ")));
    }

    if considered.is_empty() {
        "A walking route selected for you.".to_string()
    } else {
        format!(
            "A walking route selected for your {}.",
            considered.join(", ")
        )
    }
}

/// Order is preserved; priorities were fixed during accumulation
pub fn assemble(result: ResolutionResult, profile: &PreferenceProfile) -> Recommendation {
    Recommendation {
        overall_rationale: overall_rationale(profile),
        places: result.records.into_iter().map(RecommendedPlace::from).collect(),
    }
}
