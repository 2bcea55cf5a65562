//! Checks a route's total road distance against the tiered deviation
//! rules bound to the farthest facility-to-employee distance in the route.

use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::domain::{Employee, Facility, Profile, RouteDetails, RuleTier, TripType};
use crate::geo::haversine_distance_m;
use crate::road::RoadClient;

const MAX_IN_FLIGHT: usize = 16;
const RULE_EPSILON_KM: f64 = 0.001;

/// Finds the rule tier applicable to `value_km`: the tier whose
/// `[min_dist_km, max_dist_km]` contains it (within `RULE_EPSILON_KM`); if
/// none matches and the value exceeds every tier's `max_dist_km`, the last
/// tier; otherwise the tier nearest by gap distance.
pub fn find_applicable_rule(rules: &[RuleTier], value_km: f64) -> Option<&RuleTier> {
    if rules.is_empty() {
        return None;
    }
    if let Some(matching) = rules
        .iter()
        .find(|r| value_km >= r.min_dist_km - RULE_EPSILON_KM && value_km <= r.max_dist_km + RULE_EPSILON_KM)
    {
        return Some(matching);
    }
    let highest_max = rules.iter().map(|r| r.max_dist_km).fold(f64::NEG_INFINITY, f64::max);
    if value_km > highest_max {
        return rules.last();
    }
    rules.iter().min_by(|a, b| {
        let gap_a = gap_to_rule(a, value_km);
        let gap_b = gap_to_rule(b, value_km);
        gap_a.partial_cmp(&gap_b).unwrap_or(std::cmp::Ordering::Equal)
    })
}

fn gap_to_rule(rule: &RuleTier, value_km: f64) -> f64 {
    if value_km < rule.min_dist_km {
        rule.min_dist_km - value_km
    } else if value_km > rule.max_dist_km {
        value_km - rule.max_dist_km
    } else {
        0.0
    }
}

/// Road distance, in km, from the facility to the farthest employee in
/// `employees`; probes fan out with bounded concurrency and are then
/// aggregated in a fixed order derived from `employees`' indices.
pub async fn max_facility_to_employee_km(
    facility: &Facility,
    employees: &[Employee],
    road_client: &Arc<dyn RoadClient>,
) -> f64 {
    if employees.is_empty() {
        return 0.0;
    }
    let fetches = employees.iter().enumerate().map(|(idx, e)| {
        let coords = [(facility.lat, facility.lng), (e.lat, e.lng)];
        let road_client = road_client.clone();
        async move { (idx, road_client.route(&coords, false).await) }
    });
    let results: Vec<_> = stream::iter(fetches).buffer_unordered(MAX_IN_FLIGHT).collect().await;
    let mut by_index: Vec<Option<f64>> = vec![None; employees.len()];
    for (idx, res) in results {
        let km = match res {
            Ok(route) => route.total_distance_m / 1000.0,
            Err(_) => haversine_distance_m(
                (facility.lat, facility.lng),
                (employees[idx].lat, employees[idx].lng),
            ) / 1000.0,
        };
        by_index[idx] = Some(km);
    }
    by_index
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .fold(0.0, f64::max)
}

/// Full deviation check: lenient (`true`) when the profile has no rules
/// for the facility type; otherwise requires the route's total road
/// distance to fall under the applicable tier's bound.
pub async fn check_deviation(
    route_details: &RouteDetails,
    employees: &[Employee],
    facility: &Facility,
    profile: &Profile,
    road_client: &Arc<dyn RoadClient>,
) -> bool {
    let Some(rules) = profile.rules_for(facility.facility_type) else {
        return true;
    };
    if rules.is_empty() {
        return true;
    }
    let max_km = max_facility_to_employee_km(facility, employees, road_client).await;
    let Some(rule) = find_applicable_rule(rules, max_km) else {
        return true;
    };
    route_details.total_distance_m / 1000.0 <= rule.max_total_one_way_km
}

/// Pre-gate: trims the batch from the tail until a tentative road route
/// passes deviation, or the batch empties. Returns the surviving batch
/// (possibly empty) plus the employees trimmed away, in trim order.
pub async fn pre_gate_trim(
    mut batch: Vec<Employee>,
    facility: &Facility,
    trip_type: TripType,
    profile: &Profile,
    road_client: &Arc<dyn RoadClient>,
) -> (Vec<Employee>, Vec<Employee>) {
    let mut trimmed = Vec::new();
    loop {
        if batch.is_empty() {
            return (batch, trimmed);
        }
        let coords = tentative_route_coords(facility, trip_type, &batch);
        let Ok(route) = road_client.route(&coords, false).await else {
            if let Some(last) = batch.pop() {
                trimmed.push(last);
            }
            continue;
        };
        let details = RouteDetails {
            total_distance_m: route.total_distance_m,
            total_duration_s: route.total_duration_s,
            legs: vec![],
            encoded_polyline: String::new(),
        };
        if check_deviation(&details, &batch, facility, profile, road_client).await {
            return (batch, trimmed);
        }
        if let Some(last) = batch.pop() {
            trimmed.push(last);
        }
    }
}

fn tentative_route_coords(facility: &Facility, trip_type: TripType, batch: &[Employee]) -> Vec<(f64, f64)> {
    let mut stops: Vec<(f64, f64)> = batch.iter().map(|e| (e.lat, e.lng)).collect();
    match trip_type {
        TripType::Pickup => {
            stops.push((facility.lat, facility.lng));
            stops
        }
        TripType::Dropoff => {
            let mut coords = vec![(facility.lat, facility.lng)];
            coords.extend(stops);
            coords
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> Vec<RuleTier> {
        vec![
            RuleTier {
                min_dist_km: 0.0,
                max_dist_km: 10.0,
                max_total_one_way_km: 15.0,
            },
            RuleTier {
                min_dist_km: 10.0,
                max_dist_km: 20.0,
                max_total_one_way_km: 28.0,
            },
        ]
    }

    #[test]
    fn finds_matching_tier_within_epsilon() {
        let rules = rules();
        let rule = find_applicable_rule(&rules, 9.9995).unwrap();
        assert_eq!(rule.max_total_one_way_km, 15.0);
    }

    #[test]
    fn falls_back_to_last_tier_beyond_highest_max() {
        let rules = rules();
        let rule = find_applicable_rule(&rules, 50.0).unwrap();
        assert_eq!(rule.max_total_one_way_km, 28.0);
    }

    #[test]
    fn picks_nearest_tier_by_gap_for_values_between_matched_gaps() {
        // Construct a profile with a gap between tiers: [0,5] and [8,12].
        let rules = vec![
            RuleTier {
                min_dist_km: 0.0,
                max_dist_km: 5.0,
                max_total_one_way_km: 8.0,
            },
            RuleTier {
                min_dist_km: 8.0,
                max_dist_km: 12.0,
                max_total_one_way_km: 18.0,
            },
        ];
        // 6.0 is 1.0 away from the first tier's max and 2.0 away from the
        // second tier's min -> nearest is the first tier.
        let rule = find_applicable_rule(&rules, 6.0).unwrap();
        assert_eq!(rule.max_total_one_way_km, 8.0);
    }
}
