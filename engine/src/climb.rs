use shared::{ClimbMetrics, ElevationProfile, Route, SteepSegment};

use crate::error::EngineError;

/// Default grade threshold for steep-segment detection, in percent.
pub const DEFAULT_STEEP_SLOPE_PCT: f64 = 8.0;

const MERGE_TOLERANCE_M: f64 = 1e-9;

/// Derive climb metrics from a profile.
///
/// Gain, loss and net change are independent on purpose: a route that climbs
/// 10m and descends 10m has gain=10, loss=10, net=0, which is exactly the
/// undulation signal flattest-route selection needs. All math is in meters;
/// grade is rise/run expressed in percent. A degenerate profile (single
/// distinct elevation, or fewer than 2 samples) yields zero metrics, not an
/// error.
pub fn aggregate(profile: &ElevationProfile, steep_slope_threshold_pct: f64) -> ClimbMetrics {
    let samples = &profile.samples;

    let mut min_elevation = f64::INFINITY;
    let mut max_elevation = f64::NEG_INFINITY;
    for sample in samples {
        min_elevation = min_elevation.min(sample.elevation_m);
        max_elevation = max_elevation.max(sample.elevation_m);
    }

    let mut total_gain = 0.0;
    let mut total_loss = 0.0;
    let mut grades: Vec<f64> = Vec::with_capacity(samples.len().saturating_sub(1));
    let mut steep_segments: Vec<SteepSegment> = Vec::new();

    for pair in samples.windows(2) {
        let rise = pair[1].elevation_m - pair[0].elevation_m;
        let run = pair[1].distance_m - pair[0].distance_m;

        if rise > 0.0 {
            total_gain += rise;
        } else {
            total_loss += -rise;
        }

        if run > 0.0 {
            let grade_pct = rise / run * 100.0;
            grades.push(grade_pct.abs());
            if grade_pct.abs() >= steep_slope_threshold_pct {
                push_steep(
                    &mut steep_segments,
                    pair[0].distance_m,
                    pair[1].distance_m,
                    grade_pct.abs(),
                );
            }
        }
    }

    let net_change = match (samples.first(), samples.last()) {
        (Some(first), Some(last)) => last.elevation_m - first.elevation_m,
        _ => 0.0,
    };

    ClimbMetrics {
        total_gain_m: total_gain,
        total_loss_m: total_loss,
        net_change_m: net_change,
        min_elevation_m: min_elevation.is_finite().then_some(min_elevation),
        max_elevation_m: max_elevation.is_finite().then_some(max_elevation),
        grade_smoothness: population_std_dev(&grades),
        steep_segments,
    }
}

/// Compute and store climb metrics on a profiled route. Fails if the route
/// was never profiled.
pub fn aggregate_route(route: Route, steep_slope_threshold_pct: f64) -> Result<Route, EngineError> {
    let metrics = route
        .profile
        .as_ref()
        .map(|profile| aggregate(profile, steep_slope_threshold_pct));
    match metrics {
        Some(metrics) => Ok(Route {
            metrics: Some(metrics),
            ..route
        }),
        None => Err(EngineError::IncompleteRoute { route: route.id }),
    }
}

/// Adjacent steep segments merge into one contiguous interval.
fn push_steep(segments: &mut Vec<SteepSegment>, start_m: f64, end_m: f64, grade_pct: f64) {
    if let Some(last) = segments.last_mut() {
        if (start_m - last.end_m).abs() <= MERGE_TOLERANCE_M {
            last.end_m = end_m;
            last.peak_grade_pct = last.peak_grade_pct.max(grade_pct);
            return;
        }
    }
    segments.push(SteepSegment {
        start_m,
        end_m,
        peak_grade_pct: grade_pct,
    });
}

fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
