use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn interpolate(self, other: Self, t: f64) -> Self {
        Self {
            lat: self.lat + (other.lat - self.lat) * t,
            lon: self.lon + (other.lon - self.lon) * t,
        }
    }
}

/// A route vertex: canonical coordinate, optional sampled elevation and
/// cumulative great-circle distance from the route start.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RoutePoint {
    pub coord: Coordinate,
    pub elevation_m: Option<f64>,
    pub distance_m: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    /// Provider-stated preference tag ("fastest", "recommended", ...).
    pub mode: String,
    pub points: Vec<RoutePoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<ElevationProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ClimbMetrics>,
}

impl Route {
    pub fn total_distance_m(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.distance_m)
    }

    pub fn bounds(&self) -> Option<RouteBounds> {
        let first = self.points.first()?;
        let mut bounds = RouteBounds {
            min_lat: first.coord.lat,
            max_lat: first.coord.lat,
            min_lon: first.coord.lon,
            max_lon: first.coord.lon,
        };
        for point in &self.points[1..] {
            bounds.min_lat = bounds.min_lat.min(point.coord.lat);
            bounds.max_lat = bounds.max_lat.max(point.coord.lat);
            bounds.min_lon = bounds.min_lon.min(point.coord.lon);
            bounds.max_lon = bounds.max_lon.max(point.coord.lon);
        }
        Some(bounds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileSample {
    pub distance_m: f64,
    pub elevation_m: f64,
}

/// Distance-indexed elevation samples for one route, sorted by distance
/// ascending with no duplicate distances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElevationProfile {
    pub samples: Vec<ProfileSample>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClimbMetrics {
    pub total_gain_m: f64,
    pub total_loss_m: f64,
    pub net_change_m: f64,
    pub min_elevation_m: Option<f64>,
    pub max_elevation_m: Option<f64>,
    /// Population standard deviation of per-segment absolute grade, in percent.
    /// Lower is smoother.
    pub grade_smoothness: f64,
    pub steep_segments: Vec<SteepSegment>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SteepSegment {
    pub start_m: f64,
    pub end_m: f64,
    pub peak_grade_pct: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RouteBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    #[serde(default = "default_weight")]
    pub distance: f64,
    #[serde(default = "default_weight")]
    pub elevation: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            distance: default_weight(),
            elevation: default_weight(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
    Flattest,
    Fastest,
    Balanced,
}

impl ScoringMode {
    pub fn preset_weights(self) -> ScoreWeights {
        match self {
            ScoringMode::Flattest => ScoreWeights {
                distance: 0.0,
                elevation: 1.0,
            },
            ScoringMode::Fastest => ScoreWeights {
                distance: 1.0,
                elevation: 0.0,
            },
            ScoringMode::Balanced => ScoreWeights::default(),
        }
    }
}

pub fn default_weight() -> f64 {
    0.5
}
