use serde::{Deserialize, Serialize};
use shared::{Coordinate, Route, RoutePoint};

use crate::error::{EngineError, InvalidGeometry};
use crate::providers::RawRoute;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Default resampling cadence, 10 ft in meters.
pub const DEFAULT_SAMPLE_SPACING_M: f64 = 3.048;

/// Axis order of a raw coordinate pair as stated by the upstream provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AxisOrder {
    LatLng,
    LngLat,
}

#[derive(Debug, Clone, Copy)]
pub struct NormalizeOptions {
    /// Consecutive points closer than this are a degenerate segment and
    /// rejected, never silently dropped.
    pub degenerate_tolerance_m: f64,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            degenerate_tolerance_m: 0.001,
        }
    }
}

/// Canonicalize a raw candidate geometry into a [`Route`].
///
/// This is the only place axis order is interpreted: routing and elevation
/// providers disagree on (lat,lng) vs (lng,lat), and a silent swap is the
/// single most likely bug in this domain, so every raw pair enters the
/// engine through here and leaves as a canonical `Coordinate { lat, lon }`.
///
/// Validates WGS84 bounds per pair, requires at least 2 points, rejects
/// degenerate segments, and stores cumulative haversine distance on each
/// point. Fails without producing a partial route.
pub fn normalize(raw: &RawRoute, opts: &NormalizeOptions) -> Result<Route, EngineError> {
    if raw.coords.len() < 2 {
        return Err(InvalidGeometry::TooFewPoints(raw.coords.len()).into());
    }

    let mut coords = Vec::with_capacity(raw.coords.len());
    for (index, pair) in raw.coords.iter().enumerate() {
        let (lat, lon) = match raw.axis_order {
            AxisOrder::LatLng => (pair[0], pair[1]),
            AxisOrder::LngLat => (pair[1], pair[0]),
        };
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(InvalidGeometry::OutOfRange { index, lat, lon }.into());
        }
        coords.push(Coordinate { lat, lon });
    }

    let mut points = Vec::with_capacity(coords.len());
    points.push(RoutePoint {
        coord: coords[0],
        elevation_m: None,
        distance_m: 0.0,
    });
    let mut cumulative = 0.0;
    for (first, pair) in coords.windows(2).enumerate() {
        let step = haversine_m(pair[0], pair[1]);
        if step < opts.degenerate_tolerance_m {
            return Err(InvalidGeometry::DegenerateSegment {
                first,
                second: first + 1,
            }
            .into());
        }
        cumulative += step;
        points.push(RoutePoint {
            coord: pair[1],
            elevation_m: None,
            distance_m: cumulative,
        });
    }

    Ok(Route {
        id: raw.id.clone(),
        mode: raw.mode.clone(),
        points,
        profile: None,
        metrics: None,
    })
}

/// Re-emit a route's coordinates as raw pairs in the requested axis order.
/// Inverse of [`normalize`] for the same order.
pub fn raw_pairs(route: &Route, order: AxisOrder) -> Vec<[f64; 2]> {
    route
        .points
        .iter()
        .map(|p| match order {
            AxisOrder::LatLng => [p.coord.lat, p.coord.lon],
            AxisOrder::LngLat => [p.coord.lon, p.coord.lat],
        })
        .collect()
}

pub fn haversine_m(a: Coordinate, b: Coordinate) -> f64 {
    let (lat1, lon1, lat2, lon2) = (
        a.lat.to_radians(),
        a.lon.to_radians(),
        b.lat.to_radians(),
        b.lon.to_radians(),
    );
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

/// Evenly spaced points along the route at `spacing_m` cadence, final point
/// always included. This is the line callers typically hand to an elevation
/// provider so samples arrive at uniform spacing. A non-positive spacing
/// returns the original vertices unchanged.
pub fn resample(route: &Route, spacing_m: f64) -> Vec<Coordinate> {
    let points = &route.points;
    if spacing_m <= 0.0 || points.len() < 2 {
        return points.iter().map(|p| p.coord).collect();
    }

    let total = route.total_distance_m();
    let mut out = Vec::with_capacity((total / spacing_m) as usize + 2);
    let mut segment = 0;
    let mut target = 0.0;
    while target < total {
        while points[segment + 1].distance_m < target {
            segment += 1;
        }
        let a = points[segment];
        let b = points[segment + 1];
        let span = b.distance_m - a.distance_m;
        let t = if span > 0.0 {
            (target - a.distance_m) / span
        } else {
            0.0
        };
        out.push(a.coord.interpolate(b.coord, t));
        target += spacing_m;
    }
    out.push(points[points.len() - 1].coord);
    out
}
