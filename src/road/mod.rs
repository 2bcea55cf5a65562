//! Client for the external road-routing service: health probe, full
//! routes with geometry, and distance/duration matrices.

mod client;
mod types;

pub use client::{HttpRoadClient, RoadClient, RoadServiceConfig};
pub use types::{RoadError, RoadErrorKind, RoadLeg, RoadRoute, RoadTable, Waypoint};
