//! Route elevation scoring engine: turns raw candidate geometries plus raw
//! elevation samples into distance-indexed profiles, climb metrics and a
//! ranked candidate list balancing distance against elevation gain.
//!
//! Every operation is a pure, synchronous transformation over immutable
//! inputs; fetching geometry or elevation belongs to callers behind the
//! [`providers`] traits, and candidates can be processed in parallel because
//! routes share no mutable state.

pub mod climb;
pub mod error;
pub mod geometry;
pub mod gpx_export;
pub mod profile;
pub mod providers;
pub mod score;

pub use climb::{aggregate, aggregate_route, DEFAULT_STEEP_SLOPE_PCT};
pub use error::{EngineError, InvalidGeometry};
pub use geometry::{
    haversine_m, normalize, raw_pairs, resample, AxisOrder, NormalizeOptions,
    DEFAULT_SAMPLE_SPACING_M,
};
pub use gpx_export::{encode_route_as_gpx, GpxExportError};
pub use profile::{attach_elevation, build_profile, smooth_elevations, ElevationSample};
pub use providers::{
    ElevationProvider, Geocoder, ProviderError, RawRoute, RawRouteSet, RouteProvider,
};
pub use score::{
    pick_options, rank_routes, RouteChoices, ScoredRoute, SelectionParams, SCORE_EPSILON,
};
pub use shared::{
    ClimbMetrics, Coordinate, ElevationProfile, ProfileSample, Route, RouteBounds, RoutePoint,
    ScoreWeights, ScoringMode, SteepSegment,
};

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub normalize: NormalizeOptions,
    pub steep_slope_threshold_pct: f64,
    /// Median + clamp smoothing of attached elevations. Off unless the
    /// caller asks: the engine never repairs data silently.
    pub smooth: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            normalize: NormalizeOptions::default(),
            steep_slope_threshold_pct: DEFAULT_STEEP_SLOPE_PCT,
            smooth: false,
        }
    }
}

/// Take one candidate from raw provider output to a scoreable route:
/// normalize, attach elevation, optionally smooth, aggregate climb metrics.
pub fn prepare_route(
    raw: &RawRoute,
    samples: &[ElevationSample],
    config: &EngineConfig,
) -> Result<Route, EngineError> {
    let route = geometry::normalize(raw, &config.normalize)?;
    let route = profile::attach_elevation(&route, samples)?;
    let route = if config.smooth {
        profile::smooth_elevations(&route)
    } else {
        route
    };
    let route = climb::aggregate_route(route, config.steep_slope_threshold_pct)?;
    tracing::debug!(
        "prepared route `{}`: {:.0}m, gain {:.1}m",
        route.id,
        route.total_distance_m(),
        route.metrics.as_ref().map_or(0.0, |m| m.total_gain_m)
    );
    Ok(route)
}
