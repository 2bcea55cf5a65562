//! Two-phase route generation loop: a profiled-fleet phase followed by a
//! default-fallback phase, each composing HeuristicSelector, DeviationChecker,
//! SolverClient, GuardSwapper, RoutePolisher, and TimingCalculator into
//! committed routes.

use std::sync::Arc;

use log::{info, warn};

use crate::deviation::{self, pre_gate_trim};
use crate::domain::fleet::{DEFAULT_VEHICLE_CAPACITY, DEFAULT_VEHICLE_TYPE};
use crate::domain::{
    AttemptLedger, Employee, Facility, FleetLedger, Leg, PointRef, Profile, Route, RouteDetails, RouteEmployee,
    TripType,
};
use crate::guard;
use crate::heuristic::{self, HeuristicConfig};
use crate::matrix::build_matrix;
use crate::polish;
use crate::road::RoadClient;
use crate::solver::{SolverClient, SolverProblem};
use crate::timing;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub max_attempts_primary: u32,
    pub max_attempts_fallback_bonus: u32,
    pub default_fallback_capacity: u32,
    pub heuristic: HeuristicConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_attempts_primary: crate::domain::attempts::MAX_ROUTING_ATTEMPTS_PER_EMPLOYEE,
            max_attempts_fallback_bonus: crate::domain::attempts::FALLBACK_BONUS_ATTEMPTS,
            default_fallback_capacity: DEFAULT_VEHICLE_CAPACITY,
            heuristic: HeuristicConfig::default(),
        }
    }
}

pub struct PlanResult {
    pub routes: Vec<Route>,
    pub unrouted: Vec<Employee>,
}

/// Parameters that come straight from the request, distinct from `Profile`
/// (which is reusable planning configuration).
pub struct PlanRequest<'a> {
    pub employees: Vec<Employee>,
    pub facility: &'a Facility,
    pub profile: &'a Profile,
    pub trip_type: TripType,
    pub guard: bool,
    pub pickup_time_per_employee_s: u32,
    pub reporting_time_s: u32,
    pub shift_time: &'a str,
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

fn to_route_details(road_route: &crate::road::RoadRoute) -> RouteDetails {
    RouteDetails {
        total_distance_m: road_route.total_distance_m,
        total_duration_s: road_route.total_duration_s,
        legs: road_route
            .legs
            .iter()
            .map(|l| Leg {
                distance_m: l.distance_m,
                duration_s: l.duration_s,
            })
            .collect(),
        encoded_polyline: road_route.geometry.clone().unwrap_or_default(),
    }
}

/// Runs the full plan: Phase 1 against the profiled fleet, then Phase 2
/// against a synthetic default vehicle for whatever remains unrouted.
pub async fn plan(
    request: PlanRequest<'_>,
    road_client: &Arc<dyn RoadClient>,
    solver_client: &Arc<dyn SolverClient>,
    config: &OrchestratorConfig,
) -> PlanResult {
    let PlanRequest {
        mut employees,
        facility,
        profile,
        trip_type,
        guard,
        pickup_time_per_employee_s,
        reporting_time_s,
        shift_time,
    } = request;

    let mut attempt_ledger = AttemptLedger::new();
    let mut fleet_ledger = FleetLedger::new(&profile.fleet);
    let mut output = Vec::new();
    let mut route_number = 1u32;

    info!(
        "orchestrator: phase 1 starting with {} employees, trip_type={:?}",
        employees.len(),
        trip_type
    );

    loop {
        let Some((_, entry)) = fleet_ledger.largest_available() else {
            break;
        };
        let Some(batch) = heuristic::select_batch(
            &employees,
            entry.capacity,
            trip_type,
            profile.max_duration,
            facility,
            road_client,
            &config.heuristic,
            &attempt_ledger,
            config.max_attempts_primary,
        )
        .await
        else {
            break;
        };

        let original_codes: Vec<String> = batch.iter().map(|e| e.emp_code.clone()).collect();
        let (surviving, trimmed) = pre_gate_trim(batch, facility, trip_type, profile, road_client).await;
        if !trimmed.is_empty() {
            warn!("orchestrator: pre-gate trimmed {} employee(s) from batch", trimmed.len());
        }
        if surviving.is_empty() {
            attempt_ledger.increment_all(original_codes.iter().map(String::as_str));
            continue;
        }

        let Some((vtype, ventry)) = fleet_ledger.smallest_fitting(surviving.len() as u32) else {
            break;
        };
        let mut slice = surviving;
        slice.truncate(ventry.capacity as usize);
        let slice_codes: Vec<String> = slice.iter().map(|e| e.emp_code.clone()).collect();

        match solve_and_validate(
            &slice,
            facility,
            trip_type,
            profile,
            guard,
            pickup_time_per_employee_s,
            reporting_time_s,
            shift_time,
            road_client,
            solver_client,
            route_number,
        )
        .await
        {
            Some(mut outcome) => {
                outcome.route.vehicle_type = vtype.clone();
                outcome.route.vehicle_capacity = ventry.capacity;
                outcome.route.after_fleet_exhaustion = false;
                let routed_codes: Vec<String> = outcome.route.employees.iter().map(|e| e.emp_code.clone()).collect();
                employees.retain(|e| !routed_codes.contains(&e.emp_code));
                if let Some(dropped) = &outcome.dropped_guard_employee {
                    attempt_ledger.increment(dropped);
                }
                let _ = fleet_ledger.decrement(&vtype);
                info!("orchestrator: committed route {route_number} with {} employee(s)", routed_codes.len());
                route_number += 1;
                output.push(outcome.route);
            }
            None => {
                attempt_ledger.increment_all(slice_codes.iter().map(String::as_str));
            }
        }
    }

    let max_attempts_fallback = config.max_attempts_primary + config.max_attempts_fallback_bonus;
    info!("orchestrator: phase 2 starting with {} unrouted employee(s)", employees.len());

    loop {
        let Some(batch) = heuristic::select_batch(
            &employees,
            config.default_fallback_capacity,
            trip_type,
            profile.max_duration,
            facility,
            road_client,
            &config.heuristic,
            &attempt_ledger,
            max_attempts_fallback,
        )
        .await
        else {
            break;
        };

        let original_codes: Vec<String> = batch.iter().map(|e| e.emp_code.clone()).collect();
        let (surviving, trimmed) = pre_gate_trim(batch, facility, trip_type, profile, road_client).await;
        if !trimmed.is_empty() {
            warn!("orchestrator: phase 2 pre-gate trimmed {} employee(s)", trimmed.len());
        }
        if surviving.is_empty() {
            attempt_ledger.increment_all(original_codes.iter().map(String::as_str));
            continue;
        }

        let mut slice = surviving;
        slice.truncate(config.default_fallback_capacity as usize);
        let slice_codes: Vec<String> = slice.iter().map(|e| e.emp_code.clone()).collect();

        match solve_and_validate(
            &slice,
            facility,
            trip_type,
            profile,
            guard,
            pickup_time_per_employee_s,
            reporting_time_s,
            shift_time,
            road_client,
            solver_client,
            route_number,
        )
        .await
        {
            Some(mut outcome) => {
                outcome.route.vehicle_type = DEFAULT_VEHICLE_TYPE.to_string();
                outcome.route.vehicle_capacity = config.default_fallback_capacity;
                outcome.route.after_fleet_exhaustion = true;
                let routed_codes: Vec<String> = outcome.route.employees.iter().map(|e| e.emp_code.clone()).collect();
                employees.retain(|e| !routed_codes.contains(&e.emp_code));
                if let Some(dropped) = &outcome.dropped_guard_employee {
                    attempt_ledger.increment(dropped);
                }
                info!("orchestrator: committed fallback route {route_number} with {} employee(s)", routed_codes.len());
                route_number += 1;
                output.push(outcome.route);
            }
            None => {
                attempt_ledger.increment_all(slice_codes.iter().map(String::as_str));
            }
        }
    }

    if !employees.is_empty() {
        warn!("orchestrator: {} employee(s) remain unrouted", employees.len());
    }

    PlanResult {
        routes: output,
        unrouted: employees,
    }
}

/// A committed route together with the code of any employee the guard
/// rule had to drop from the batch to reserve the critical seat.
struct SolveOutcome {
    route: Route,
    dropped_guard_employee: Option<String>,
}

/// Steps 5–9 of the per-batch pipeline: solve, validate, guard, polish, and
/// time a candidate batch into a committed `Route`. `vehicle_type`,
/// `vehicle_capacity`, and `after_fleet_exhaustion` are left for the caller
/// to fill in, since they depend on which phase/fleet entry is in play.
#[allow(clippy::too_many_arguments)]
async fn solve_and_validate(
    slice: &[Employee],
    facility: &Facility,
    trip_type: TripType,
    profile: &Profile,
    guard_enabled: bool,
    pickup_time_per_employee_s: u32,
    reporting_time_s: u32,
    shift_time: &str,
    road_client: &Arc<dyn RoadClient>,
    solver_client: &Arc<dyn SolverClient>,
    route_number: u32,
) -> Option<SolveOutcome> {
    if slice.is_empty() {
        return None;
    }

    let refs: Vec<&Employee> = slice.iter().collect();
    let matrix = build_matrix(road_client, facility, &refs).await.ok().flatten()?;

    let problem = SolverProblem {
        distance_matrix: matrix.distances.clone(),
        duration_matrix: matrix.durations.clone(),
        num_vehicles: 1,
        vehicle_capacities: vec![slice.len() as u32],
        demands: std::iter::once(0).chain(slice.iter().map(|_| 1)).collect(),
        depot_index: 0,
        max_route_duration: profile.max_duration,
        service_times: std::iter::once(0).chain(slice.iter().map(|_| pickup_time_per_employee_s)).collect(),
        allow_dropping_visits: profile.allow_dropping_visits_for_problematic_zones,
        drop_visit_penalty: profile.drop_penalty,
        facility_coords: (facility.lat, facility.lng),
        trip_type: trip_type.as_letter().to_string(),
        direction_penalty_weight: profile.direction_penalty_weight,
        fixed_start_node_index_in_matrix: None,
        fixed_end_node_index_in_matrix: None,
        other_customer_node_indices_in_matrix: None,
    };

    let solution = match solver_client.solve(&problem).await {
        Ok(s) => s,
        Err(e) => {
            warn!("orchestrator: solver failed for batch of {}: {e}", slice.len());
            return None;
        }
    };
    if !solution.dropped_node_indices.is_empty() {
        warn!("orchestrator: solver dropped nodes, discarding batch");
        return None;
    }
    let assignment = solution.routes.first()?;
    let node_order: Vec<usize> = assignment.node_indices.iter().copied().filter(|&n| n != 0).collect();
    if node_order.len() != slice.len() {
        warn!("orchestrator: solver order missing stops, discarding batch");
        return None;
    }

    let mut ordered = Vec::with_capacity(slice.len());
    for node in &node_order {
        match matrix.point_map.get(*node) {
            Some(PointRef::Employee { emp_code }) => {
                ordered.push(slice.iter().find(|e| &e.emp_code == emp_code)?.clone());
            }
            _ => return None,
        }
    }

    let coords = route_coords(facility, trip_type, &ordered);
    let road_route = road_client.route(&coords, true).await.ok()?;
    let mut details = to_route_details(&road_route);

    if details.total_duration_s as u32 > profile.max_duration {
        return None;
    }
    if !deviation::check_deviation(&details, &ordered, facility, profile, road_client).await {
        return None;
    }

    let mut swapped = false;
    let mut guard_needed = false;
    let mut critical_emp_code: Option<String> = None;
    let mut dropped_guard_employee: Option<String> = None;

    if guard_enabled {
        let outcome = guard::apply_guard(ordered.clone(), facility, trip_type, road_client).await;
        if outcome.guard_needed {
            guard_needed = true;
            if ordered.len() <= 1 {
                return None;
            }
            let mut reduced = outcome.employees;
            let dropped = reduced.pop()?;
            if reduced.is_empty() {
                return None;
            }
            dropped_guard_employee = Some(dropped.emp_code);
            let reduced_route = road_client.route(&route_coords(facility, trip_type, &reduced), true).await.ok()?;
            let reduced_details = to_route_details(&reduced_route);
            if reduced_details.total_duration_s as u32 > profile.max_duration {
                return None;
            }
            if !deviation::check_deviation(&reduced_details, &reduced, facility, profile, road_client).await {
                return None;
            }
            ordered = reduced;
            details = reduced_details;
        } else {
            swapped = outcome.swapped;
            ordered = outcome.employees;
            if let Some(r) = outcome.route {
                details = to_route_details(&r);
            }
            if swapped {
                let critical_idx = match trip_type {
                    TripType::Pickup => 0,
                    TripType::Dropoff => ordered.len() - 1,
                };
                critical_emp_code = Some(ordered[critical_idx].emp_code.clone());
            }
        }
    }

    if ordered.len() > 1 {
        if let Some(polished) = polish::polish_route(
            &ordered,
            facility,
            trip_type,
            profile,
            solver_client,
            road_client,
            profile.max_duration,
            pickup_time_per_employee_s,
            critical_emp_code.as_deref(),
        )
        .await
        {
            ordered = polished.employees;
            details = polished.route_details;
        }
    }

    let is_special = ordered.iter().any(|e| e.is_special_needs());
    let farthest_km = deviation::max_facility_to_employee_km(facility, &ordered, road_client).await;

    let timing = timing::calculate_timings(
        &ordered,
        trip_type,
        &details,
        shift_time,
        reporting_time_s,
        pickup_time_per_employee_s,
    );
    let route_employees: Vec<RouteEmployee> = timing.employees;

    Some(SolveOutcome {
        route: Route {
            route_number,
            employees: route_employees,
            vehicle_type: String::new(),
            vehicle_capacity: 0,
            trip_type,
            route_details: details,
            swapped,
            guard_needed,
            duration_exceeded: timing.timing_error,
            is_special_needs_route: is_special,
            after_fleet_exhaustion: false,
            farthest_employee_distance_m: farthest_km * 1000.0,
            unique_key: format!("{}-{}-{}", trip_type.as_letter(), route_number, ordered.len()),
        },
        dropped_guard_employee,
    })
}
