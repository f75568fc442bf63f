use std::path::PathBuf;

use thiserror::Error;

/// Everything the engine can refuse to do. All variants are recoverable by
/// the caller: a failed candidate can be dropped or re-fetched without
/// affecting the rest of the set.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid route geometry: {0}")]
    InvalidGeometry(#[from] InvalidGeometry),
    #[error("no elevation samples supplied for route `{route}`")]
    ElevationDataMissing { route: String },
    #[error("route `{route}` resolved {resolved} elevation anchor(s), need at least 2")]
    ElevationAlignment { route: String, resolved: usize },
    #[error("route `{route}` has no computed elevation profile")]
    IncompleteRoute { route: String },
    #[error("candidate set is empty")]
    EmptyCandidateSet,
    #[error("failed to read candidate file {path:?}: {source}")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("invalid candidate definition: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error, PartialEq)]
pub enum InvalidGeometry {
    #[error("coordinate at index {index} outside WGS84 bounds: ({lat}, {lon})")]
    OutOfRange { index: usize, lat: f64, lon: f64 },
    #[error("route needs at least 2 points, got {0}")]
    TooFewPoints(usize),
    #[error("degenerate segment: points {first} and {second} coincide within tolerance")]
    DegenerateSegment { first: usize, second: usize },
}
