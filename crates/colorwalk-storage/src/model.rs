//! Stored records, request bodies and response views

use chrono::{DateTime, Utc};
use colorwalk_recommend::{Candidate, PlaceCategory, PlaceId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type MemberId = u64;
pub type WalkId = u64;
pub type PointId = u64;

// ============================================================================
// Color theme
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColorTheme {
    Red,
    Blue,
    Yellow,
    Green,
    Purple,
    Orange,
    Pink,
    Black,
    White,
    Brown,
}

impl ColorTheme {
    pub const ALL: [ColorTheme; 10] = [
        ColorTheme::Red,
        ColorTheme::Blue,
        ColorTheme::Yellow,
        ColorTheme::Green,
        ColorTheme::Purple,
        ColorTheme::Orange,
        ColorTheme::Pink,
        ColorTheme::Black,
        ColorTheme::White,
        ColorTheme::Brown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorTheme::Red => "RED",
            ColorTheme::Blue => "BLUE",
            ColorTheme::Yellow => "YELLOW",
            ColorTheme::Green => "GREEN",
            ColorTheme::Purple => "PURPLE",
            ColorTheme::Orange => "ORANGE",
            ColorTheme::Pink => "PINK",
            ColorTheme::Black => "BLACK",
            ColorTheme::White => "WHITE",
            ColorTheme::Brown => "BROWN",
        }
    }
}

impl fmt::Display for ColorTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorTheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        ColorTheme::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("unknown color theme `{s}`"))
    }
}

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: MemberId,
    pub username: String,
    pub email: String,
    pub nickname: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: PlaceId,
    pub name: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub image_url: Option<String>,
    pub category: PlaceCategory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Place {
    pub fn to_candidate(&self) -> Candidate {
        Candidate {
            id: self.id,
            name: self.name.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            category: Some(self.category),
            description: self.description.clone(),
            address: self.address.clone(),
            image_url: self.image_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkingPoint {
    pub id: PointId,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    /// 1-based, in arrival order
    pub sequence: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Walk {
    pub id: WalkId,
    pub member_id: MemberId,
    pub title: String,
    pub content: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Meters
    pub total_distance: f64,
    pub color_theme: Option<ColorTheme>,
    #[serde(default)]
    pub points: Vec<WalkingPoint>,
    pub updated_at: DateTime<Utc>,
}

impl Walk {
    pub fn is_finished(&self) -> bool {
        self.end_time.is_some()
    }
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterMemberRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub nickname: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceCreateRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub category: PlaceCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartWalkRequest {
    pub member_id: MemberId,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    /// Case-insensitive color name, e.g. `"green"`
    #[serde(default)]
    pub color_theme: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkingPointRequest {
    pub walk_id: WalkId,
    pub latitude: f64,
    pub longitude: f64,
    /// Defaults to the time the point is recorded
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkingPointResponse {
    pub point_id: PointId,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    pub sequence: u32,
}

impl From<&WalkingPoint> for WalkingPointResponse {
    fn from(point: &WalkingPoint) -> Self {
        Self {
            point_id: point.id,
            latitude: point.latitude,
            longitude: point.longitude,
            timestamp: point.timestamp,
            sequence: point.sequence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkResponse {
    pub walk_id: WalkId,
    pub member_id: MemberId,
    pub title: String,
    pub content: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_distance: f64,
    pub color_theme: Option<ColorTheme>,
    pub walking_points: Vec<WalkingPointResponse>,
}

impl From<&Walk> for WalkResponse {
    fn from(walk: &Walk) -> Self {
        Self {
            walk_id: walk.id,
            member_id: walk.member_id,
            title: walk.title.clone(),
            content: walk.content.clone(),
            start_time: walk.start_time,
            end_time: walk.end_time,
            total_distance: walk.total_distance,
            color_theme: walk.color_theme,
            walking_points: walk.points.iter().map(WalkingPointResponse::from).collect(),
        }
    }
}
