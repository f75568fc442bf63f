use serde::{Deserialize, Serialize};
use shared::{Coordinate, ElevationProfile, ProfileSample, Route, RoutePoint};

use crate::error::EngineError;
use crate::geometry::haversine_m;

/// Profile samples closer than this along the route are duplicates; the
/// later one wins because source order is authoritative.
pub const PROFILE_DEDUP_TOLERANCE_M: f64 = 0.001;

/// One raw elevation reading from an elevation provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ElevationSample {
    pub coord: Coordinate,
    pub elevation_m: f64,
}

/// Attach raw elevation samples to a normalized route, producing a new route
/// with populated per-point elevations and a distance-indexed
/// [`ElevationProfile`]. Climb metrics are cleared; the profile changed, so
/// they must be recomputed.
///
/// Alignment policy:
/// - sample count equals point count: positional 1:1 assignment;
/// - otherwise each sample lands on the route point nearest by cumulative
///   distance, later samples overwriting earlier ones, and unassigned points
///   are linearly interpolated between their nearest assigned neighbours
///   (end runs take the nearest anchor's value).
pub fn attach_elevation(route: &Route, samples: &[ElevationSample]) -> Result<Route, EngineError> {
    if samples.is_empty() {
        return Err(EngineError::ElevationDataMissing {
            route: route.id.clone(),
        });
    }

    let mut out = route.clone();
    out.metrics = None;

    let assigned: Vec<Option<f64>> = if samples.len() == out.points.len() {
        samples.iter().map(|s| Some(s.elevation_m)).collect()
    } else {
        nearest_assignment(&out, samples)
    };

    let anchors: Vec<(usize, f64)> = assigned
        .iter()
        .enumerate()
        .filter_map(|(index, elevation)| elevation.map(|e| (index, e)))
        .collect();
    if anchors.len() < 2 {
        return Err(EngineError::ElevationAlignment {
            route: route.id.clone(),
            resolved: anchors.len(),
        });
    }

    let filled = fill_gaps(&out.points, &anchors);
    let profile = build_profile(
        out.points
            .iter()
            .map(|p| p.distance_m)
            .zip(filled.iter().copied()),
    );
    for (point, elevation) in out.points.iter_mut().zip(&filled) {
        point.elevation_m = Some(*elevation);
    }
    out.profile = Some(profile);
    Ok(out)
}

/// Build a profile from (distance, elevation) pairs: sorted by distance
/// ascending, duplicates within tolerance collapsed keeping the later pair.
pub fn build_profile<I>(samples: I) -> ElevationProfile
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut entries: Vec<ProfileSample> = samples
        .into_iter()
        .map(|(distance_m, elevation_m)| ProfileSample {
            distance_m,
            elevation_m,
        })
        .collect();
    // stable sort keeps source order among equal distances
    entries.sort_by(|a, b| {
        a.distance_m
            .partial_cmp(&b.distance_m)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut deduped: Vec<ProfileSample> = Vec::with_capacity(entries.len());
    for entry in entries {
        match deduped.last_mut() {
            Some(last) if (entry.distance_m - last.distance_m).abs() <= PROFILE_DEDUP_TOLERANCE_M => {
                *last = entry;
            }
            _ => deduped.push(entry),
        }
    }
    ElevationProfile { samples: deduped }
}

/// Smooth a route's elevations with a 3-point median filter and
/// distance-aware clamping of vertical jumps, to tame DEM spikes. Opt-in:
/// the engine never smooths on its own. Returns a new route with a rebuilt
/// profile and cleared metrics.
pub fn smooth_elevations(route: &Route) -> Route {
    let mut out = route.clone();
    let raw: Vec<Option<f64>> = out.points.iter().map(|p| p.elevation_m).collect();
    let smoothed = median_clamp(&out.points, &raw);

    for (point, elevation) in out.points.iter_mut().zip(&smoothed) {
        point.elevation_m = *elevation;
    }
    let pairs: Vec<(f64, f64)> = out
        .points
        .iter()
        .filter_map(|p| p.elevation_m.map(|e| (p.distance_m, e)))
        .collect();
    out.profile = if pairs.len() >= 2 {
        Some(build_profile(pairs))
    } else {
        None
    };
    out.metrics = None;
    out
}

fn nearest_assignment(route: &Route, samples: &[ElevationSample]) -> Vec<Option<f64>> {
    let mut assigned = vec![None; route.points.len()];
    let mut sample_distance = 0.0;
    let mut previous: Option<Coordinate> = None;
    let mut matched = 0usize;

    for sample in samples {
        if let Some(prev) = previous {
            sample_distance += haversine_m(prev, sample.coord);
        }
        previous = Some(sample.coord);
        let index = nearest_point_index(&route.points, sample_distance);
        if assigned[index].is_none() {
            matched += 1;
        }
        assigned[index] = Some(sample.elevation_m);
    }

    let route_distance = route.total_distance_m();
    if sample_distance < route_distance * 0.5 {
        tracing::warn!(
            "sample polyline for route `{}` covers {:.0}m of a {:.0}m route",
            route.id,
            sample_distance,
            route_distance
        );
    }
    tracing::debug!(
        "route `{}`: {} of {} samples assigned onto {} points",
        route.id,
        matched,
        samples.len(),
        route.points.len()
    );
    assigned
}

fn nearest_point_index(points: &[RoutePoint], distance: f64) -> usize {
    let upper = points.partition_point(|p| p.distance_m < distance);
    if upper == 0 {
        return 0;
    }
    if upper >= points.len() {
        return points.len() - 1;
    }
    let before = points[upper - 1].distance_m;
    let after = points[upper].distance_m;
    if distance - before <= after - distance {
        upper - 1
    } else {
        upper
    }
}

/// Complete a partially assigned elevation vector: linear interpolation by
/// cumulative distance between anchors, constant extension before the first
/// and after the last. `anchors` must hold at least two entries.
fn fill_gaps(points: &[RoutePoint], anchors: &[(usize, f64)]) -> Vec<f64> {
    let mut filled = vec![0.0; points.len()];

    let (first_index, first_elevation) = anchors[0];
    for value in filled.iter_mut().take(first_index) {
        *value = first_elevation;
    }
    for pair in anchors.windows(2) {
        let (i0, e0) = pair[0];
        let (i1, e1) = pair[1];
        filled[i0] = e0;
        let d0 = points[i0].distance_m;
        let span = points[i1].distance_m - d0;
        for i in (i0 + 1)..i1 {
            let t = if span > 0.0 {
                (points[i].distance_m - d0) / span
            } else {
                0.0
            };
            filled[i] = e0 + (e1 - e0) * t;
        }
    }
    let (last_index, last_elevation) = anchors[anchors.len() - 1];
    for value in filled.iter_mut().skip(last_index) {
        *value = last_elevation;
    }
    filled
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Some(values[values.len() / 2])
}

/// Median over a 3-point window, then distance-aware clamping: small
/// vertical change allowed between close points, more when they are spaced
/// out.
fn median_clamp(points: &[RoutePoint], raw: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut smoothed: Vec<Option<f64>> = Vec::with_capacity(raw.len());

    for (index, value) in raw.iter().enumerate() {
        let mut window: Vec<f64> = [-1i32, 0, 1]
            .iter()
            .filter_map(|offset| {
                let position = index as isize + *offset as isize;
                if position >= 0 && (position as usize) < raw.len() {
                    raw[position as usize]
                } else {
                    None
                }
            })
            .collect();

        let mut candidate = median(&mut window).or(*value);

        if let (Some(prev), Some(current)) = (smoothed.last().copied().flatten(), candidate) {
            let step_m = if index > 0 {
                points[index].distance_m - points[index - 1].distance_m
            } else {
                0.0
            };
            let max_delta = (step_m * 0.2).clamp(8.0, 30.0);
            candidate = Some(current.clamp(prev - max_delta, prev + max_delta));
        }

        smoothed.push(candidate);
    }

    smoothed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{normalize, AxisOrder, NormalizeOptions};
    use crate::providers::RawRoute;

    fn line_route(id: &str, point_count: usize) -> Route {
        // straight line along the equator, 0.001 deg (~111m) per step
        let coords: Vec<[f64; 2]> = (0..point_count)
            .map(|i| [0.0, i as f64 * 0.001])
            .collect();
        normalize(
            &RawRoute {
                id: id.to_string(),
                mode: "fastest".to_string(),
                axis_order: AxisOrder::LatLng,
                coords,
            },
            &NormalizeOptions::default(),
        )
        .expect("valid line")
    }

    fn samples_along(route: &Route, count: usize, elevation: impl Fn(f64) -> f64) -> Vec<ElevationSample> {
        let total = route.total_distance_m();
        (0..count)
            .map(|i| {
                let t = i as f64 / (count - 1) as f64;
                ElevationSample {
                    coord: Coordinate {
                        lat: 0.0,
                        lon: route.points[route.points.len() - 1].coord.lon * t,
                    },
                    elevation_m: elevation(t * total),
                }
            })
            .collect()
    }

    #[test]
    fn positional_alignment_when_counts_match() {
        let route = line_route("r1", 4);
        let samples: Vec<ElevationSample> = route
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| ElevationSample {
                coord: p.coord,
                elevation_m: 100.0 + i as f64 * 5.0,
            })
            .collect();

        let profiled = attach_elevation(&route, &samples).expect("profiled");

        assert_eq!(profiled.points[0].elevation_m, Some(100.0));
        assert_eq!(profiled.points[3].elevation_m, Some(115.0));
        let profile = profiled.profile.expect("profile");
        assert_eq!(profile.samples.len(), 4);
    }

    #[test]
    fn count_mismatch_still_yields_complete_profile() {
        let route = line_route("r1", 50);
        let samples = samples_along(&route, 12, |d| 30.0 + d * 0.01);

        let profiled = attach_elevation(&route, &samples).expect("profiled");

        assert!(profiled.points.iter().all(|p| p.elevation_m.is_some()));
        let profile = profiled.profile.expect("profile");
        assert_eq!(profile.samples.len(), 50);
        // monotone source elevations stay monotone through interpolation
        for pair in profile.samples.windows(2) {
            assert!(pair[1].elevation_m >= pair[0].elevation_m);
        }
    }

    #[test]
    fn empty_samples_is_an_error() {
        let route = line_route("r1", 3);
        let err = attach_elevation(&route, &[]).expect_err("no samples");
        assert!(matches!(err, EngineError::ElevationDataMissing { .. }));
    }

    #[test]
    fn single_sample_cannot_anchor_interpolation() {
        let route = line_route("r1", 5);
        let samples = vec![ElevationSample {
            coord: route.points[0].coord,
            elevation_m: 200.0,
        }];
        let err = attach_elevation(&route, &samples).expect_err("one anchor");
        assert!(matches!(
            err,
            EngineError::ElevationAlignment { resolved: 1, .. }
        ));
    }

    #[test]
    fn attach_clears_stale_metrics() {
        let mut route = line_route("r1", 3);
        route.metrics = Some(shared::ClimbMetrics {
            total_gain_m: 99.0,
            total_loss_m: 0.0,
            net_change_m: 99.0,
            min_elevation_m: None,
            max_elevation_m: None,
            grade_smoothness: 0.0,
            steep_segments: Vec::new(),
        });
        let samples: Vec<ElevationSample> = route
            .points
            .iter()
            .map(|p| ElevationSample {
                coord: p.coord,
                elevation_m: 10.0,
            })
            .collect();

        let profiled = attach_elevation(&route, &samples).expect("profiled");
        assert!(profiled.metrics.is_none());
    }

    #[test]
    fn duplicate_distances_keep_the_later_sample() {
        let profile = build_profile(vec![(0.0, 10.0), (100.0, 20.0), (100.0, 25.0), (200.0, 30.0)]);
        assert_eq!(profile.samples.len(), 3);
        assert_eq!(profile.samples[1].elevation_m, 25.0);
    }

    #[test]
    fn build_profile_sorts_by_distance() {
        let profile = build_profile(vec![(200.0, 30.0), (0.0, 10.0), (100.0, 20.0)]);
        let distances: Vec<f64> = profile.samples.iter().map(|s| s.distance_m).collect();
        assert_eq!(distances, vec![0.0, 100.0, 200.0]);
    }

    #[test]
    fn nearest_point_index_picks_closer_side() {
        let route = line_route("r1", 3);
        let step = route.points[1].distance_m;
        assert_eq!(nearest_point_index(&route.points, 0.0), 0);
        assert_eq!(nearest_point_index(&route.points, step * 0.4), 0);
        assert_eq!(nearest_point_index(&route.points, step * 0.6), 1);
        assert_eq!(nearest_point_index(&route.points, step * 10.0), 2);
    }

    #[test]
    fn smoothing_clamps_spikes() {
        let route = line_route("r1", 4);
        let samples: Vec<ElevationSample> = route
            .points
            .iter()
            .zip([300.0, 305.0, 400.0, 307.0])
            .map(|(p, e)| ElevationSample {
                coord: p.coord,
                elevation_m: e,
            })
            .collect();
        let profiled = attach_elevation(&route, &samples).expect("profiled");

        let smoothed = smooth_elevations(&profiled);
        let spike = smoothed.points[2].elevation_m.expect("elevation");
        assert!(spike < 340.0, "spike should be clamped, got {spike}");
        assert!(smoothed.profile.is_some());
        assert!(smoothed.metrics.is_none());
    }

    #[test]
    fn smoothing_without_elevations_is_a_no_op_profile() {
        let route = line_route("r1", 3);
        let smoothed = smooth_elevations(&route);
        assert!(smoothed.profile.is_none());
    }
}
