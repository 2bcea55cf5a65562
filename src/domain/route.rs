use serde::{Deserialize, Serialize};

use super::employee::RouteEmployee;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripType {
    Pickup,
    Dropoff,
}

impl TripType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "P" | "PICKUP" => Some(TripType::Pickup),
            "D" | "DROPOFF" => Some(TripType::Dropoff),
            _ => None,
        }
    }

    pub fn as_letter(self) -> &'static str {
        match self {
            TripType::Pickup => "P",
            TripType::Dropoff => "D",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Leg {
    pub distance_m: f64,
    pub duration_s: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteDetails {
    pub total_distance_m: f64,
    pub total_duration_s: f64,
    pub legs: Vec<Leg>,
    pub encoded_polyline: String,
}

impl RouteDetails {
    pub fn empty() -> Self {
        Self {
            total_distance_m: 0.0,
            total_duration_s: 0.0,
            legs: Vec::new(),
            encoded_polyline: String::new(),
        }
    }
}

/// A committed vehicle route: an ordered stop sequence plus the metadata
/// the response shaping and statistics steps need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub route_number: u32,
    pub employees: Vec<RouteEmployee>,
    pub vehicle_type: String,
    pub vehicle_capacity: u32,
    pub trip_type: TripType,
    pub route_details: RouteDetails,
    pub swapped: bool,
    pub guard_needed: bool,
    pub duration_exceeded: bool,
    pub is_special_needs_route: bool,
    pub after_fleet_exhaustion: bool,
    pub farthest_employee_distance_m: f64,
    pub unique_key: String,
}

impl Route {
    /// Effective seat capacity after reserving a seat for the guard, if any.
    pub fn effective_capacity(&self) -> u32 {
        if self.guard_needed {
            self.vehicle_capacity.saturating_sub(1)
        } else {
            self.vehicle_capacity
        }
    }
}
