//! Prompt Builder: preferences + candidates → oracle prompt
//!
//! The prompt pins down the line shape the [`classify`](crate::classify)
//! module expects: `"{rank}. [{index}] {exact name} - {reason}"`, where
//! `index` is the candidate's position in the listing below it.

use crate::{Candidate, Coordinates, PreferenceProfile};
use std::fmt::Write;

/// Candidates beyond this are not shown to the oracle
pub const MAX_PROMPT_CANDIDATES: usize = 20;

#[derive(Debug, Clone)]
pub struct PromptBuilder {
    max_candidates: usize,
    picks: usize,
}

impl PromptBuilder {
    pub fn new(picks: usize) -> Self {
        Self {
            max_candidates: MAX_PROMPT_CANDIDATES,
            picks,
        }
    }

    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    pub fn build(
        &self,
        profile: &PreferenceProfile,
        origin: Option<Coordinates>,
        max_distance_km: Option<f64>,
        candidates: &[Candidate],
    ) -> String {
        let mut prompt = String::new();
        // writing into a String cannot fail
        let _ = self.write_prompt(&mut prompt, profile, origin, max_distance_km, candidates);
        prompt
    }

    fn write_prompt(
        &self,
        out: &mut String,
        profile: &PreferenceProfile,
        origin: Option<Coordinates>,
        max_distance_km: Option<f64>,
        candidates: &[Candidate],
    ) -> std::fmt::Result {
        writeln!(
            out,
            "**IMPORTANT**: choose only from the candidate places listed below. \
             Never recommend a place that is not on the list.\n"
        )?;

        writeln!(out, "Walker preferences:")?;
        if let Some(theme) = &profile.preferred_color_theme {
            writeln!(out, "- Preferred color theme: {theme}")?;
        }
        if !profile.preferred_categories.is_empty() {
            let names: Vec<&str> = profile.preferred_categories.iter().map(|c| c.as_str()).collect();
            writeln!(out, "- Preferred categories: [{}]", names.join(", "))?;
        }
        if let Some(level) = &profile.activity_level {
            writeln!(out, "- Activity level: {level}")?;
        }
        if let Some(weather) = &profile.weather_condition {
            writeln!(out, "- Weather: {weather}")?;
        }
        if let Some(time) = &profile.time_of_day {
            writeln!(out, "- Time of day: {time}")?;
        }
        if let Some(extra) = &profile.additional_requirements {
            writeln!(out, "- Additional requirements: {extra}")?;
        }
        if let Some(origin) = origin {
            writeln!(
                out,
                "- Current location: latitude {}, longitude {}",
                origin.latitude, origin.longitude
            )?;
        }
        if let Some(km) = max_distance_km {
            writeln!(out, "- Maximum distance: {km}km")?;
        }

        writeln!(out, "\n**Candidate places** (choose only from this list):")?;
        for (idx, place) in candidates.iter().take(self.max_candidates).enumerate() {
            let category = place.category.map_or("UNKNOWN", |c| c.as_str());
            writeln!(out, "{}. {} ({})", idx + 1, place.name, category)?;
            writeln!(
                out,
                "   Address: {}",
                place.address.as_deref().unwrap_or("no address")
            )?;
            writeln!(
                out,
                "   Description: {}\n",
                place.description.as_deref().unwrap_or("no description")
            )?;
        }

        writeln!(out, "\n**Response format** (answer in exactly this format):")?;
        for rank in 1..=self.picks {
            writeln!(
                out,
                "{rank}. [candidate number] [exact place name from the list] - [reason]"
            )?;
        }

        writeln!(out, "\n**Rules**:")?;
        writeln!(out, "1. Choose only places from the candidate list")?;
        writeln!(out, "2. Copy the place name exactly as listed")?;
        writeln!(out, "3. Choose {} different places (no duplicates)", self.picks)?;
        writeln!(out, "4. Put the candidate number from the list in square brackets")?;
        writeln!(out, "5. Use only this format, with no other explanation or text")?;
        Ok(())
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(crate::DEFAULT_QUOTA)
    }
}
