use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::facility::FacilityType;

/// One vehicle type available in the fleet, with its planned count.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetSpec {
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub capacity: u32,
    pub count: u32,
}

/// A deviation tier: routes whose farthest employee falls in
/// `[min_dist_km, max_dist_km]` must keep their total road distance under
/// `max_total_one_way_km`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleTier {
    pub min_dist_km: f64,
    pub max_dist_km: f64,
    pub max_total_one_way_km: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GuardTiming {
    pub start: String,
    pub end: String,
}

/// Planning configuration for a single request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub max_duration: u32,
    pub fleet: Vec<FleetSpec>,
    #[serde(default)]
    pub route_deviation_rules: HashMap<FacilityType, Vec<RuleTier>>,
    #[serde(default)]
    pub night_shift_guard_timings: HashMap<String, GuardTiming>,
    #[serde(default)]
    pub capacity_tier_zones: Option<serde_json::Value>,
    #[serde(default)]
    pub zone_pairing_matrix: Option<serde_json::Value>,
    pub facility_type: FacilityType,
    #[serde(default = "default_direction_penalty_weight")]
    pub direction_penalty_weight: f64,
    #[serde(default)]
    pub drop_penalty: f64,
    #[serde(default)]
    pub allow_dropping_visits_for_problematic_zones: bool,
}

fn default_direction_penalty_weight() -> f64 {
    1.0
}

impl Profile {
    pub fn rules_for(&self, facility_type: FacilityType) -> Option<&[RuleTier]> {
        self.route_deviation_rules
            .get(&facility_type)
            .map(Vec::as_slice)
    }
}
