use crate::model::{
    ColorTheme, MemberId, StartWalkRequest, Walk, WalkId, WalkResponse, WalkingPoint,
    WalkingPointRequest,
};
use crate::{require_coordinates, require_non_blank, ColorWalkStore, StoreError};
use chrono::Utc;
use colorwalk_recommend::distance::path_length_m;
use colorwalk_recommend::Coordinates;
use std::cmp::Reverse;

/// Sum of legs between consecutive points, ordered by sequence
fn total_distance_m(points: &[WalkingPoint]) -> f64 {
    let mut ordered: Vec<&WalkingPoint> = points.iter().collect();
    ordered.sort_by_key(|p| p.sequence);
    let path: Vec<Coordinates> = ordered
        .iter()
        .map(|p| Coordinates::new(p.latitude, p.longitude))
        .collect();
    path_length_m(&path)
}

impl ColorWalkStore {
    pub fn start_walk(&self, request: StartWalkRequest) -> Result<WalkResponse, StoreError> {
        require_non_blank("title", &request.title)?;
        let color_theme = request
            .color_theme
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<ColorTheme>)
            .transpose()
            .map_err(StoreError::InvalidRequest)?;

        let walk = self.mutate(|state| {
            if !state.members.contains_key(&request.member_id) {
                return Err(StoreError::MemberNotFound(request.member_id));
            }
            let now = Utc::now();
            let walk = Walk {
                id: state.allocate_id(),
                member_id: request.member_id,
                title: request.title,
                content: request.content,
                start_time: now,
                end_time: None,
                total_distance: 0.0,
                color_theme,
                points: Vec::new(),
                updated_at: now,
            };
            state.walks.insert(walk.id, walk.clone());
            Ok(walk)
        })?;

        tracing::info!(walk_id = walk.id, member_id = walk.member_id, "walk started");
        Ok(WalkResponse::from(&walk))
    }

    /// Append a GPS point and recompute the walk's total distance.
    ///
    /// Returns the stored point.
    pub fn record_point(&self, request: WalkingPointRequest) -> Result<WalkingPoint, StoreError> {
        require_coordinates(request.latitude, request.longitude)?;

        let point = self.mutate(|state| {
            match state.walks.get(&request.walk_id) {
                None => return Err(StoreError::WalkNotFound(request.walk_id)),
                Some(walk) if walk.is_finished() => {
                    return Err(StoreError::WalkFinished(request.walk_id))
                }
                Some(_) => {}
            }
            let id = state.allocate_id();
            let walk = state
                .walks
                .get_mut(&request.walk_id)
                .ok_or(StoreError::WalkNotFound(request.walk_id))?;

            let now = Utc::now();
            let point = WalkingPoint {
                id,
                latitude: request.latitude,
                longitude: request.longitude,
                timestamp: request.timestamp.unwrap_or(now),
                sequence: walk.points.len() as u32 + 1,
            };
            walk.points.push(point.clone());
            walk.total_distance = total_distance_m(&walk.points);
            walk.updated_at = now;
            Ok(point)
        })?;

        tracing::debug!(
            walk_id = request.walk_id,
            sequence = point.sequence,
            "walking point recorded"
        );
        Ok(point)
    }

    pub fn finish_walk(&self, id: WalkId) -> Result<WalkResponse, StoreError> {
        let walk = self.mutate(|state| {
            let walk = state.walks.get_mut(&id).ok_or(StoreError::WalkNotFound(id))?;
            if walk.is_finished() {
                return Err(StoreError::WalkFinished(id));
            }
            let now = Utc::now();
            walk.end_time = Some(now);
            walk.total_distance = total_distance_m(&walk.points);
            walk.updated_at = now;
            Ok(walk.clone())
        })?;

        tracing::info!(
            walk_id = id,
            points = walk.points.len(),
            total_distance_m = walk.total_distance,
            "walk finished"
        );
        Ok(WalkResponse::from(&walk))
    }

    pub fn walk(&self, id: WalkId) -> Result<WalkResponse, StoreError> {
        self.read(|state| state.walks.get(&id).map(WalkResponse::from))
            .ok_or(StoreError::WalkNotFound(id))
    }

    /// A member's walks, most recently started first
    pub fn member_walks(&self, member_id: MemberId) -> Result<Vec<WalkResponse>, StoreError> {
        self.read(|state| {
            if !state.members.contains_key(&member_id) {
                return Err(StoreError::MemberNotFound(member_id));
            }
            let mut walks: Vec<&Walk> = state
                .walks
                .values()
                .filter(|w| w.member_id == member_id)
                .collect();
            walks.sort_by_key(|w| Reverse((w.start_time, w.id)));
            Ok(walks.into_iter().map(WalkResponse::from).collect())
        })
    }

    /// Every walk, most recently updated first
    pub fn all_walks(&self) -> Vec<WalkResponse> {
        self.read(|state| {
            let mut walks: Vec<&Walk> = state.walks.values().collect();
            walks.sort_by_key(|w| Reverse((w.updated_at, w.id)));
            walks.into_iter().map(WalkResponse::from).collect()
        })
    }
}
