use std::{fs::File, io::Read, path::Path};

use serde::{Deserialize, Serialize};
use shared::Coordinate;

use crate::error::EngineError;
use crate::geometry::AxisOrder;
use crate::profile::ElevationSample;

/// Adapter-side failures are opaque to the engine; the caller decides
/// whether to retry, drop the candidate or surface a message.
pub type ProviderError = Box<dyn std::error::Error + Send + Sync>;

/// Resolve free-text place names to coordinates.
///
/// The engine never calls this itself; it only accepts already-resolved
/// coordinates as route endpoints. The trait exists so orchestration code
/// can be written (and tested) against an interface rather than a vendor
/// client.
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` means the place was not found; `Err` means the lookup
    /// itself failed.
    fn resolve(&self, place: &str) -> Result<Option<Coordinate>, ProviderError>;
}

/// Supply raw candidate geometries for a start/end/preference request.
///
/// Implementations must state the axis order their backend emits; the
/// engine interprets it exactly once, in the geometry normalizer.
pub trait RouteProvider: Send + Sync {
    fn candidates(
        &self,
        start: Coordinate,
        end: Coordinate,
        mode: &str,
    ) -> Result<Vec<RawRoute>, ProviderError>;
}

/// Supply raw elevation readings for a polyline, in line order.
pub trait ElevationProvider: Send + Sync {
    fn sample_line(&self, line: &[Coordinate]) -> Result<Vec<ElevationSample>, ProviderError>;
}

/// One candidate geometry as a route provider hands it over: unvalidated
/// pairs in the provider's stated axis order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRoute {
    pub id: String,
    #[serde(default)]
    pub mode: String,
    pub axis_order: AxisOrder,
    pub coords: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRouteSet {
    pub routes: Vec<RawRoute>,
}

impl RawRouteSet {
    pub fn from_reader(reader: impl Read) -> Result<Self, EngineError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| EngineError::Io {
            source,
            path: path.into(),
        })?;
        Self::from_reader(file)
    }
}
