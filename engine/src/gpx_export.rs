use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use geo_types::Point;
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};
use shared::{Route, RoutePoint};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GpxExportError {
    #[error("failed to build GPX document: {0}")]
    Gpx(#[from] gpx::errors::GpxError),
}

/// Encode a route as a base64 GPX 1.1 document, carrying per-point elevation
/// when the route has been profiled.
pub fn encode_route_as_gpx(route: &Route) -> Result<String, GpxExportError> {
    let mut gpx = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some("pente_douce".into()),
        ..Default::default()
    };
    let mut track = Track {
        name: Some(route.id.clone()),
        ..Default::default()
    };

    let mut segment = TrackSegment::new();
    for waypoint in route.points.iter().map(to_waypoint) {
        segment.points.push(waypoint);
    }
    track.segments.push(segment);
    gpx.tracks.push(track);

    let mut buffer = Vec::new();
    gpx::write(&gpx, &mut buffer)?;
    Ok(BASE64.encode(buffer))
}

fn to_waypoint(point: &RoutePoint) -> Waypoint {
    let mut waypoint = Waypoint::new(Point::new(point.coord.lon, point.coord.lat));
    waypoint.elevation = point.elevation_m;
    waypoint
}
