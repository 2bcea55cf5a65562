use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoadErrorKind {
    /// Transport-level failure (connection reset, timeout) after retries
    /// were exhausted.
    Transient,
    /// The service responded with a non-"Ok" code or an HTTP error status.
    Service,
    /// The response body could not be parsed into the expected shape.
    Parse,
    /// The initial availability probe failed; the request should abort.
    Unavailable,
}

/// Structured error surfaced by every `RoadClient` operation.
#[derive(Debug, Clone)]
pub struct RoadError {
    pub kind: RoadErrorKind,
    pub message: String,
    pub url: String,
}

impl std::fmt::Display for RoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} calling {}: {}", self.kind, self.url, self.message)
    }
}

impl std::error::Error for RoadError {}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Waypoint {
    pub location: (f64, f64),
    /// Index of this coordinate in the service's chosen stop ordering.
    pub waypoint_index: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RoadLeg {
    pub distance_m: f64,
    pub duration_s: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadRoute {
    pub total_distance_m: f64,
    pub total_duration_s: f64,
    pub legs: Vec<RoadLeg>,
    pub geometry: Option<String>,
    pub waypoints: Vec<Waypoint>,
}

#[derive(Debug, Clone)]
pub struct RoadTable {
    pub distances: Vec<Vec<f64>>,
    pub durations: Vec<Vec<f64>>,
}
