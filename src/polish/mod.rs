//! Single-vehicle re-optimization of an already-selected batch, with an
//! optional pinned seat for routes that went through a guard swap.

use std::sync::Arc;

use log::warn;

use crate::deviation::check_deviation;
use crate::domain::{Employee, Facility, Leg, PointRef, Profile, RouteDetails, TripType};
use crate::matrix::build_matrix;
use crate::road::RoadClient;
use crate::solver::{SolverClient, SolverProblem};

pub struct PolishResult {
    pub employees: Vec<Employee>,
    pub route_details: RouteDetails,
}

fn route_coords(facility: &Facility, trip_type: TripType, employees: &[Employee]) -> Vec<(f64, f64)> {
    let mut stops: Vec<(f64, f64)> = employees.iter().map(|e| (e.lat, e.lng)).collect();
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

/// Re-solves the stop order for `employees` with `num_vehicles=1`, pinning
/// `pinned_emp_code` to the critical seat if given. Returns `None` when the
/// solve, validation, or post-polish gates fail — callers should keep the
/// order and details they already had.
#[allow(clippy::too_many_arguments)]
pub async fn polish_route(
    employees: &[Employee],
    facility: &Facility,
    trip_type: TripType,
    profile: &Profile,
    solver_client: &Arc<dyn SolverClient>,
    road_client: &Arc<dyn RoadClient>,
    max_duration: u32,
    service_time_s: u32,
    pinned_emp_code: Option<&str>,
) -> Option<PolishResult> {
    if employees.len() <= 1 {
        return None;
    }

    let refs: Vec<&Employee> = employees.iter().collect();
    let matrix = build_matrix(road_client, facility, &refs).await.ok().flatten()?;

    let pinned_matrix_index = pinned_emp_code.and_then(|code| matrix.point_map.index_of(code));

    let mut problem = SolverProblem {
        distance_matrix: matrix.distances.clone(),
        duration_matrix: matrix.durations.clone(),
        num_vehicles: 1,
        vehicle_capacities: vec![employees.len() as u32],
        demands: std::iter::once(0).chain(employees.iter().map(|_| 1)).collect(),
        depot_index: 0,
        max_route_duration: max_duration,
        service_times: std::iter::once(0).chain(employees.iter().map(|_| service_time_s)).collect(),
        allow_dropping_visits: false,
        drop_visit_penalty: profile.drop_penalty,
        facility_coords: (facility.lat, facility.lng),
        trip_type: trip_type.as_letter().to_string(),
        direction_penalty_weight: profile.direction_penalty_weight,
        fixed_start_node_index_in_matrix: None,
        fixed_end_node_index_in_matrix: None,
        other_customer_node_indices_in_matrix: None,
    };

    match (trip_type, pinned_matrix_index) {
        (TripType::Pickup, Some(idx)) => {
            problem.fixed_start_node_index_in_matrix = Some(idx);
        }
        (TripType::Dropoff, Some(idx)) => {
            problem.fixed_end_node_index_in_matrix = Some(idx);
            let others: Vec<usize> = (1..matrix.point_map.len()).filter(|&i| i != idx).collect();
            problem.other_customer_node_indices_in_matrix = Some(others);
        }
        _ => {}
    }

    let solution = match solver_client.solve(&problem).await {
        Ok(s) => s,
        Err(e) => {
            warn!("route polisher: solve failed, reverting: {e}");
            return None;
        }
    };

    if !solution.dropped_node_indices.is_empty() {
        warn!("route polisher: solution dropped nodes, reverting");
        return None;
    }
    let assignment = solution.routes.first()?;

    let node_order: Vec<usize> = assignment.node_indices.iter().copied().filter(|&n| n != 0).collect();
    if node_order.len() != employees.len() {
        warn!("route polisher: solved order missing stops, reverting");
        return None;
    }

    if let Some(idx) = pinned_matrix_index {
        let expected_pos = match trip_type {
            TripType::Pickup => 0,
            TripType::Dropoff => node_order.len() - 1,
        };
        if node_order.get(expected_pos) != Some(&idx) {
            warn!("route polisher: pinned seat violated, reverting");
            return None;
        }
    }

    let mut new_order = Vec::with_capacity(employees.len());
    for node in &node_order {
        match matrix.point_map.get(*node) {
            Some(PointRef::Employee { emp_code }) => {
                let emp = employees.iter().find(|e| &e.emp_code == emp_code)?;
                new_order.push(emp.clone());
            }
            _ => return None,
        }
    }

    let coords = route_coords(facility, trip_type, &new_order);
    let route = road_client.route(&coords, true).await.ok()?;
    let details = RouteDetails {
        total_distance_m: route.total_distance_m,
        total_duration_s: route.total_duration_s,
        legs: route
            .legs
            .iter()
            .map(|l| Leg {
                distance_m: l.distance_m,
                duration_s: l.duration_s,
            })
            .collect(),
        encoded_polyline: route.geometry.clone().unwrap_or_default(),
    };

    if details.total_duration_s as u32 > max_duration {
        warn!("route polisher: polished route exceeds duration budget, reverting");
        return None;
    }
    if !check_deviation(&details, &new_order, facility, profile, road_client).await {
        warn!("route polisher: polished route fails deviation, reverting");
        return None;
    }

    Some(PolishResult {
        employees: new_order,
        route_details: details,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FacilityType, Gender};
    use crate::road::{RoadError, RoadRoute, RoadTable, Waypoint};
    use crate::solver::{SolverError, SolverRouteAssignment, SolverSolution};
    use async_trait::async_trait;

    struct FakeRoadClient;

    #[async_trait]
    impl RoadClient for FakeRoadClient {
        async fn is_available(&self) -> bool {
            true
        }
        async fn route(&self, coords: &[(f64, f64)], _with_geometry: bool) -> Result<RoadRoute, RoadError> {
            let legs_m = coords.len().saturating_sub(1) as f64 * 500.0;
            Ok(RoadRoute {
                total_distance_m: legs_m,
                total_duration_s: legs_m / 10.0,
                legs: vec![],
                geometry: Some("polyline".to_string()),
                waypoints: coords
                    .iter()
                    .enumerate()
                    .map(|(i, &loc)| Waypoint {
                        location: loc,
                        waypoint_index: i,
                    })
                    .collect(),
            })
        }
        async fn table(
            &self,
            coords: &[(f64, f64)],
            _sources: Option<&[usize]>,
            _destinations: Option<&[usize]>,
        ) -> Result<RoadTable, RoadError> {
            let n = coords.len();
            Ok(RoadTable {
                distances: vec![vec![500.0; n]; n],
                durations: vec![vec![50.0; n]; n],
            })
        }
    }

    struct FakeSolverClient {
        node_indices: Vec<usize>,
    }

    #[async_trait]
    impl SolverClient for FakeSolverClient {
        async fn solve(&self, _problem: &SolverProblem) -> Result<SolverSolution, SolverError> {
            Ok(SolverSolution {
                routes: vec![SolverRouteAssignment {
                    vehicle_index: 0,
                    node_indices: self.node_indices.clone(),
                }],
                dropped_node_indices: vec![],
                error: None,
            })
        }
    }

    fn facility() -> Facility {
        Facility {
            lat: 12.9,
            lng: 77.6,
            facility_type: FacilityType::CDC,
        }
    }

    fn employee(code: &str) -> Employee {
        Employee {
            emp_code: code.to_string(),
            lat: 12.91,
            lng: 77.61,
            gender: Gender::M,
            is_medical: false,
            is_pwd: false,
            is_nmt: false,
            is_oob: false,
        }
    }

    fn profile() -> Profile {
        Profile {
            max_duration: 3600,
            fleet: vec![],
            route_deviation_rules: Default::default(),
            night_shift_guard_timings: Default::default(),
            capacity_tier_zones: None,
            zone_pairing_matrix: None,
            facility_type: FacilityType::CDC,
            direction_penalty_weight: 1.0,
            drop_penalty: 0.0,
            allow_dropping_visits_for_problematic_zones: false,
        }
    }

    #[tokio::test]
    async fn single_employee_batch_is_never_polished() {
        let employees = vec![employee("E1")];
        let road: Arc<dyn RoadClient> = Arc::new(FakeRoadClient);
        let solver: Arc<dyn SolverClient> = Arc::new(FakeSolverClient { node_indices: vec![] });
        let result = polish_route(
            &employees,
            &facility(),
            TripType::Pickup,
            &profile(),
            &solver,
            &road,
            3600,
            120,
            None,
        )
        .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn pinned_seat_violation_reverts() {
        let employees = vec![employee("E1"), employee("E2")];
        let road: Arc<dyn RoadClient> = Arc::new(FakeRoadClient);
        // Solver reorders so node 2 (E2) leads, but E1 is pinned to the start.
        let solver: Arc<dyn SolverClient> = Arc::new(FakeSolverClient {
            node_indices: vec![0, 2, 1],
        });
        let result = polish_route(
            &employees,
            &facility(),
            TripType::Pickup,
            &profile(),
            &solver,
            &road,
            3600,
            120,
            Some("E1"),
        )
        .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn accepts_a_valid_reorder() {
        let employees = vec![employee("E1"), employee("E2")];
        let road: Arc<dyn RoadClient> = Arc::new(FakeRoadClient);
        let solver: Arc<dyn SolverClient> = Arc::new(FakeSolverClient {
            node_indices: vec![0, 2, 1],
        });
        let result = polish_route(
            &employees,
            &facility(),
            TripType::Pickup,
            &profile(),
            &solver,
            &road,
            3600,
            120,
            None,
        )
        .await
        .expect("valid polish should succeed");
        assert_eq!(result.employees[0].emp_code, "E2");
        assert_eq!(result.employees[1].emp_code, "E1");
    }
}
