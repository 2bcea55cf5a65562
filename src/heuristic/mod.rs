//! Greedy selection of the next candidate batch for a vehicle: orders the
//! unassigned pool by facility distance, then grows a batch one stop at a
//! time by progress + proximity score, rejecting candidates whose tentative
//! road route would blow the duration budget.

use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use log::debug;

use crate::domain::{AttemptLedger, Employee, Facility, TripType};
use crate::geo::haversine_distance_m;
use crate::road::RoadClient;

/// Employees considered "tail-compatible" must be within this distance of
/// the batch's current last stop.
pub const MAX_NEXT_STOP_DISTANCE_KM: f64 = 2.25;
const PROGRESS_WEIGHT: f64 = 0.7;
const DISTANCE_WEIGHT: f64 = 0.3;
/// How many top-scored candidates are tentatively road-checked together
/// per round; bounds concurrent fan-out without affecting the deterministic
/// score-order pick.
const LOOKAHEAD: usize = 4;
const MAX_IN_FLIGHT: usize = 16;

#[derive(Debug, Clone, Copy)]
pub struct HeuristicConfig {
    pub max_next_stop_distance_km: f64,
    pub progress_weight: f64,
    pub distance_weight: f64,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            max_next_stop_distance_km: MAX_NEXT_STOP_DISTANCE_KM,
            progress_weight: PROGRESS_WEIGHT,
            distance_weight: DISTANCE_WEIGHT,
        }
    }
}

fn dist_to_facility_km(facility: &Facility, e: &Employee) -> f64 {
    haversine_distance_m((facility.lat, facility.lng), (e.lat, e.lng)) / 1000.0
}

/// Coordinates for a tentative road route over `batch` (already ordered)
/// plus a `candidate` appended at the growing end, honoring the trip-type
/// convention that the facility is the last stop for PICKUP and the first
/// for DROPOFF.
fn tentative_coords(
    facility: &Facility,
    trip_type: TripType,
    batch: &[Employee],
    candidate: Option<&Employee>,
) -> Vec<(f64, f64)> {
    let mut stops: Vec<(f64, f64)> = batch.iter().map(|e| (e.lat, e.lng)).collect();
    if let Some(c) = candidate {
        stops.push((c.lat, c.lng));
    }
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

fn normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if (max - min).abs() < f64::EPSILON {
        return values.iter().map(|_| 0.5).collect();
    }
    values.iter().map(|v| (v - min) / (max - min)).collect()
}

/// Sorts the pool by facility distance per the trip-type direction, ready
/// for greedy seeding (farthest-first for PICKUP, closest-first for DROPOFF).
fn order_pool_by_direction(pool: &[Employee], facility: &Facility, trip_type: TripType) -> Vec<Employee> {
    let mut ordered: Vec<Employee> = pool.to_vec();
    ordered.sort_by(|a, b| {
        let da = dist_to_facility_km(facility, a);
        let db = dist_to_facility_km(facility, b);
        match trip_type {
            TripType::Pickup => db.partial_cmp(&da).unwrap_or(std::cmp::Ordering::Equal),
            TripType::Dropoff => da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal),
        }
    });
    ordered
}

/// Selects the next candidate batch for a vehicle of the given capacity,
/// or `None` if not even a single-employee route is viable.
pub async fn select_batch(
    pool: &[Employee],
    vehicle_capacity: u32,
    trip_type: TripType,
    max_duration: u32,
    facility: &Facility,
    road_client: &Arc<dyn RoadClient>,
    config: &HeuristicConfig,
    attempt_ledger: &AttemptLedger,
    max_attempts: u32,
) -> Option<Vec<Employee>> {
    let eligible: Vec<Employee> = pool
        .iter()
        .filter(|e| e.has_valid_location() && !attempt_ledger.is_exhausted(&e.emp_code, max_attempts))
        .cloned()
        .collect();
    if eligible.is_empty() {
        return None;
    }

    let ordered = order_pool_by_direction(&eligible, facility, trip_type);
    let seed = ordered[0].clone();

    let seed_coords = tentative_coords(facility, trip_type, &[], Some(&seed));
    let seed_route = road_client.route(&seed_coords, false).await.ok()?;
    if seed_route.total_duration_s as u32 > max_duration {
        debug!("heuristic selector: seed {} fails singleton duration check", seed.emp_code);
        return None;
    }

    let is_special_needs_seed = seed.is_special_needs();
    let effective_cap = if is_special_needs_seed {
        vehicle_capacity.min(2)
    } else {
        vehicle_capacity
    };

    let mut batch = vec![seed.clone()];
    let mut excluded: HashSet<String> = HashSet::new();
    excluded.insert(seed.emp_code.clone());

    while (batch.len() as u32) < effective_cap {
        let tail = batch.last().expect("batch is never empty here");
        let mut candidates: Vec<Employee> = ordered
            .iter()
            .filter(|e| !excluded.contains(&e.emp_code))
            .filter(|e| {
                if is_special_needs_seed {
                    e.is_special_needs()
                } else {
                    !e.is_special_needs()
                }
            })
            .filter(|e| {
                haversine_distance_m((tail.lat, tail.lng), (e.lat, e.lng)) / 1000.0
                    <= config.max_next_stop_distance_km
            })
            .cloned()
            .collect();

        if candidates.is_empty() {
            break;
        }

        let tail_dist = dist_to_facility_km(facility, tail);
        let progresses: Vec<f64> = candidates
            .iter()
            .map(|c| {
                let c_dist = dist_to_facility_km(facility, c);
                match trip_type {
                    TripType::Pickup => tail_dist - c_dist,
                    TripType::Dropoff => c_dist - tail_dist,
                }
            })
            .collect();
        let proximities: Vec<f64> = candidates
            .iter()
            .map(|c| haversine_distance_m((tail.lat, tail.lng), (c.lat, c.lng)))
            .collect();
        let norm_progress = normalize(&progresses);
        let norm_proximity_inv: Vec<f64> = normalize(&proximities).iter().map(|v| 1.0 - v).collect();

        let mut scored: Vec<(f64, f64, Employee)> = candidates
            .drain(..)
            .enumerate()
            .map(|(i, c)| {
                let score = config.progress_weight * norm_progress[i] + config.distance_weight * norm_proximity_inv[i];
                (score, proximities[i], c)
            })
            .collect();
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        });

        let mut accepted = false;
        let mut round_start = 0;
        while round_start < scored.len() && (batch.len() as u32) < effective_cap {
            let round_end = (round_start + LOOKAHEAD).min(scored.len());
            let round: &[(f64, f64, Employee)] = &scored[round_start..round_end];

            // Fan out the tentative road-route checks for this round's
            // candidates; completion order is irrelevant, results are
            // re-paired with `idx` so acceptance still follows the
            // deterministic score order computed above.
            let fetches = round.iter().enumerate().map(|(idx, (_, _, candidate))| {
                let coords = tentative_coords(facility, trip_type, &batch, Some(candidate));
                let road_client = road_client.clone();
                async move { (idx, road_client.route(&coords, false).await) }
            });
            let results: Vec<_> = stream::iter(fetches)
                .buffer_unordered(MAX_IN_FLIGHT.min(LOOKAHEAD.max(1)))
                .collect()
                .await;
            let mut by_index: Vec<Option<_>> = (0..round.len()).map(|_| None).collect();
            for (idx, res) in results {
                by_index[idx] = Some(res);
            }

            for (i, (_, _, candidate)) in round.iter().enumerate() {
                match by_index[i].take().expect("every index was fetched") {
                    Ok(route) if route.total_duration_s as u32 <= max_duration => {
                        batch.push(candidate.clone());
                        excluded.insert(candidate.emp_code.clone());
                        accepted = true;
                        break;
                    }
                    _ => {
                        excluded.insert(candidate.emp_code.clone());
                    }
                }
            }
            if accepted {
                break;
            }
            round_start = round_end;
        }

        if !accepted {
            break;
        }
    }

    Some(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FacilityType, Gender};
    use crate::road::{RoadError, RoadErrorKind, RoadRoute, RoadTable};
    use async_trait::async_trait;

    struct FakeRoadClient {
        max_ok_duration_s: f64,
    }

    #[async_trait]
    impl RoadClient for FakeRoadClient {
        async fn is_available(&self) -> bool {
            true
        }
        async fn route(&self, coords: &[(f64, f64)], _with_geometry: bool) -> Result<RoadRoute, RoadError> {
            let legs_m = coords.len().saturating_sub(1) as f64 * 1000.0;
            let duration = legs_m / 10.0; // arbitrary but deterministic
            if duration > self.max_ok_duration_s {
                return Err(RoadError {
                    kind: RoadErrorKind::Service,
                    message: "duration exceeded".to_string(),
                    url: "fake".to_string(),
                });
            }
            Ok(RoadRoute {
                total_distance_m: legs_m,
                total_duration_s: duration,
                legs: vec![],
                geometry: None,
                waypoints: vec![],
            })
        }
        async fn table(
            &self,
            _coords: &[(f64, f64)],
            _sources: Option<&[usize]>,
            _destinations: Option<&[usize]>,
        ) -> Result<RoadTable, RoadError> {
            unimplemented!()
        }
    }

    fn facility() -> Facility {
        Facility {
            lat: 12.9,
            lng: 77.6,
            facility_type: FacilityType::CDC,
        }
    }

    fn employee(code: &str, lat: f64, lng: f64, gender: Gender) -> Employee {
        Employee {
            emp_code: code.to_string(),
            lat,
            lng,
            gender,
            is_medical: false,
            is_pwd: false,
            is_nmt: false,
            is_oob: false,
        }
    }

    #[tokio::test]
    async fn seed_singleton_over_duration_budget_returns_none() {
        let facility = facility();
        let pool = vec![employee("E1", 13.5, 78.2, Gender::M)];
        let client: Arc<dyn RoadClient> = Arc::new(FakeRoadClient { max_ok_duration_s: 1.0 });
        let result = select_batch(
            &pool,
            5,
            TripType::Pickup,
            600,
            &facility,
            &client,
            &HeuristicConfig::default(),
            &AttemptLedger::new(),
            5,
        )
        .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn special_needs_seed_caps_batch_and_excludes_regular_employees() {
        let facility = facility();
        let mut seed = employee("E1", 12.91, 77.61, Gender::M);
        seed.is_medical = true;
        let mut other_special = employee("E2", 12.92, 77.62, Gender::F);
        other_special.is_pwd = true;
        let regular = employee("E3", 12.93, 77.63, Gender::M);
        let pool = vec![seed, other_special, regular];
        let client: Arc<dyn RoadClient> = Arc::new(FakeRoadClient {
            max_ok_duration_s: 100_000.0,
        });
        let result = select_batch(
            &pool,
            5,
            TripType::Pickup,
            100_000,
            &facility,
            &client,
            &HeuristicConfig::default(),
            &AttemptLedger::new(),
            5,
        )
        .await
        .expect("seed alone should succeed");

        assert!(result.len() <= 2);
        assert!(result.iter().all(|e| e.emp_code != "E3"));
    }
}
