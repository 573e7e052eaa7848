//! Great-circle distance (Haversine) and the Distance Annotator.
//!
//! Also hosts the path-length sum used for walk totals, so the storage layer
//! and the recommender agree on one formula.

use crate::{Coordinates, SelectionRecord};
use serde::{Deserialize, Serialize};

/// Mean earth radius
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    Meters,
    #[default]
    Kilometers,
}

impl DistanceUnit {
    pub fn from_meters(self, meters: f64) -> f64 {
        match self {
            DistanceUnit::Meters => meters,
            DistanceUnit::Kilometers => meters / 1000.0,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            DistanceUnit::Meters => "m",
            DistanceUnit::Kilometers => "km",
        }
    }
}

/// Haversine distance in meters
pub fn haversine_m(a: Coordinates, b: Coordinates) -> f64 {
    let lat_distance = (b.latitude - a.latitude).to_radians();
    let lon_distance = (b.longitude - a.longitude).to_radians();

    let h = (lat_distance / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (lon_distance / 2.0).sin().powi(2);
    // rounding can push h just past 1 for near-antipodal points
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c * 1000.0
}

/// Sum of consecutive legs, in meters. Fewer than two points is zero.
pub fn path_length_m(points: &[Coordinates]) -> f64 {
    points
        .windows(2)
        .map(|leg| haversine_m(leg[0], leg[1]))
        .sum()
}

pub fn within_km(origin: Coordinates, point: Coordinates, max_km: f64) -> bool {
    haversine_m(origin, point) <= max_km * 1000.0
}

/// Attaches distance-from-origin to selected records.
///
/// Without an origin the distance stays `None`: "unknown" is not "zero".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DistanceAnnotator {
    origin: Option<Coordinates>,
    unit: DistanceUnit,
}

impl DistanceAnnotator {
    pub fn new(origin: Option<Coordinates>, unit: DistanceUnit) -> Self {
        Self { origin, unit }
    }

    pub fn origin(&self) -> Option<Coordinates> {
        self.origin
    }

    pub fn unit(&self) -> DistanceUnit {
        self.unit
    }

    pub fn distance_to(&self, point: Coordinates) -> Option<f64> {
        self.origin
            .map(|origin| self.unit.from_meters(haversine_m(origin, point)))
    }

    pub fn annotate(&self, records: &mut [SelectionRecord]) {
        for record in records {
            record.distance_from_origin = self.distance_to(record.candidate.coordinates());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Candidate, SelectionSource};
    use approx::assert_relative_eq;

    // Seoul City Hall to Gwanghwamun, about 1.07 km
    const CITY_HALL: Coordinates = Coordinates {
        latitude: 37.5663,
        longitude: 126.9779,
    };
    const GWANGHWAMUN: Coordinates = Coordinates {
        latitude: 37.5759,
        longitude: 126.9768,
    };

    #[test]
    fn test_haversine_zero_for_same_point() {
        assert_eq!(haversine_m(CITY_HALL, CITY_HALL), 0.0);
    }

    #[test]
    fn test_haversine_short_hop() {
        let d = haversine_m(CITY_HALL, GWANGHWAMUN);
        assert_relative_eq!(d, 1071.0, max_relative = 0.01);
        assert_relative_eq!(d, haversine_m(GWANGHWAMUN, CITY_HALL), epsilon = 1e-9);
    }

    #[test]
    fn test_haversine_one_degree_of_latitude() {
        let d = haversine_m(Coordinates::new(0.0, 0.0), Coordinates::new(1.0, 0.0));
        assert_relative_eq!(d, 111_194.9, max_relative = 1e-4);
    }

    #[test]
    fn test_haversine_antipodes_are_half_a_circumference() {
        let half = std::f64::consts::PI * EARTH_RADIUS_KM * 1000.0;
        assert_relative_eq!(
            haversine_m(Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 180.0)),
            half,
            max_relative = 1e-9
        );

        let mut lat = -90.0;
        while lat <= 90.0 {
            let mut lon = -180.0;
            while lon <= 0.0 {
                let d = haversine_m(Coordinates::new(lat, lon), Coordinates::new(-lat, lon + 180.0));
                assert!(d.is_finite() && d >= 0.0, "{d} at {lat},{lon}");
                assert!(d <= half + 1e-3, "{d} at {lat},{lon}");
                lon += 2.5;
            }
            lat += 2.5;
        }
        assert!(within_km(
            Coordinates::new(-87.5, -180.0),
            Coordinates::new(87.5, 0.0),
            20_100.0
        ));
    }

    #[test]
    fn test_path_length_sums_legs() {
        assert_eq!(path_length_m(&[]), 0.0);
        assert_eq!(path_length_m(&[CITY_HALL]), 0.0);

        let there_and_back = path_length_m(&[CITY_HALL, GWANGHWAMUN, CITY_HALL]);
        assert_relative_eq!(
            there_and_back,
            2.0 * haversine_m(CITY_HALL, GWANGHWAMUN),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_within_km() {
        assert!(within_km(CITY_HALL, GWANGHWAMUN, 2.0));
        assert!(!within_km(CITY_HALL, GWANGHWAMUN, 0.5));
    }

    fn record(lat: f64, lon: f64) -> SelectionRecord {
        SelectionRecord {
            candidate: Candidate::new(1, "x", lat, lon),
            rationale: String::new(),
            priority: 1,
            distance_from_origin: None,
            source: SelectionSource::Fallback,
        }
    }

    #[test]
    fn test_annotator_units() {
        let mut records = vec![record(GWANGHWAMUN.latitude, GWANGHWAMUN.longitude)];
        let km_annotator = DistanceAnnotator::new(Some(CITY_HALL), DistanceUnit::Kilometers);
        assert_eq!(km_annotator.unit().suffix(), "km");
        assert_eq!(DistanceUnit::Meters.suffix(), "m");

        DistanceAnnotator::new(Some(CITY_HALL), DistanceUnit::Kilometers).annotate(&mut records);
        let km = records[0].distance_from_origin.unwrap();

        DistanceAnnotator::new(Some(CITY_HALL), DistanceUnit::Meters).annotate(&mut records);
        let m = records[0].distance_from_origin.unwrap();

        assert_relative_eq!(m, km * 1000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_annotator_without_origin_leaves_distance_unset() {
        let mut records = vec![record(CITY_HALL.latitude, CITY_HALL.longitude)];
        records[0].distance_from_origin = Some(3.0);

        DistanceAnnotator::new(None, DistanceUnit::Kilometers).annotate(&mut records);
        assert_eq!(records[0].distance_from_origin, None);
    }

    #[test]
    fn test_annotator_at_origin_is_zero_not_unset() {
        let mut records = vec![record(CITY_HALL.latitude, CITY_HALL.longitude)];
        DistanceAnnotator::new(Some(CITY_HALL), DistanceUnit::Meters).annotate(&mut records);
        assert_eq!(records[0].distance_from_origin, Some(0.0));
    }
}
