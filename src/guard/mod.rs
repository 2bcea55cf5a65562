//! Enforces the "female safety" rule: the critical seat (first stop for
//! pickup, last for dropoff) may not hold a lone female. Attempts a
//! proximity-bounded swap with the nearest male in the route before
//! falling back to reserving a guard seat.

use std::sync::Arc;

use log::warn;

use crate::domain::{Employee, Facility, Gender, TripType};
use crate::road::{RoadClient, RoadRoute};

/// Candidates farther than this from the critical seat are not eligible
/// to swap into it.
pub const MAX_SWAP_DISTANCE_KM: f64 = 1.5;

pub struct GuardOutcome {
    pub employees: Vec<Employee>,
    pub swapped: bool,
    pub guard_needed: bool,
    /// The recomputed full route, present only when a swap changed the
    /// stop sequence and a recompute succeeded.
    pub route: Option<RoadRoute>,
}

fn critical_index(trip_type: TripType, len: usize) -> usize {
    match trip_type {
        TripType::Pickup => 0,
        TripType::Dropoff => len.saturating_sub(1),
    }
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

/// The index of the critical seat coordinate inside a route's coordinate
/// array (the facility is appended/prepended, so the employee coordinates
/// shift by one position for dropoff routes).
fn critical_coord_index(trip_type: TripType, employee_count: usize) -> usize {
    match trip_type {
        TripType::Pickup => 0,
        TripType::Dropoff => employee_count, // facility occupies index 0
    }
}

/// Runs the guard/swap rule over an already-solved batch. Returns the
/// (possibly reordered) employee list, whether a swap occurred, whether a
/// guard seat must be reserved, and a recomputed route if the stops moved.
pub async fn apply_guard(
    mut employees: Vec<Employee>,
    facility: &Facility,
    trip_type: TripType,
    road_client: &Arc<dyn RoadClient>,
) -> GuardOutcome {
    if employees.is_empty() {
        return GuardOutcome {
            employees,
            swapped: false,
            guard_needed: false,
            route: None,
        };
    }

    let critical_idx = critical_index(trip_type, employees.len());
    if employees[critical_idx].gender != Gender::F {
        return GuardOutcome {
            employees,
            swapped: false,
            guard_needed: false,
            route: None,
        };
    }

    if employees.len() == 1 {
        return GuardOutcome {
            employees,
            swapped: false,
            guard_needed: true,
            route: None,
        };
    }

    let critical = employees[critical_idx].clone();
    let male_indices: Vec<usize> = employees
        .iter()
        .enumerate()
        .filter(|(i, e)| *i != critical_idx && e.gender == Gender::M)
        .map(|(i, _)| i)
        .collect();

    if male_indices.is_empty() {
        return GuardOutcome {
            employees,
            swapped: false,
            guard_needed: true,
            route: None,
        };
    }

    let mut coords = vec![(critical.lat, critical.lng)];
    coords.extend(male_indices.iter().map(|&i| (employees[i].lat, employees[i].lng)));
    let table = match road_client.table(&coords, None, None).await {
        Ok(t) => t,
        Err(e) => {
            warn!("guard swapper: table request failed, falling back to guard seat: {e}");
            return GuardOutcome {
                employees,
                swapped: false,
                guard_needed: true,
                route: None,
            };
        }
    };

    let mut best: Option<(usize, f64)> = None;
    for (col, &male_idx) in male_indices.iter().enumerate() {
        let distance_km = table.distances.get(0).and_then(|row| row.get(col + 1)).copied().unwrap_or(f64::MAX) / 1000.0;
        if distance_km <= MAX_SWAP_DISTANCE_KM && best.map(|(_, d)| distance_km < d).unwrap_or(true) {
            best = Some((male_idx, distance_km));
        }
    }

    let Some((chosen_idx, _)) = best else {
        return GuardOutcome {
            employees,
            swapped: false,
            guard_needed: true,
            route: None,
        };
    };

    employees.swap(critical_idx, chosen_idx);

    match recompute_with_forced_order(&mut employees, facility, trip_type, road_client, critical_idx).await {
        Some(route) => GuardOutcome {
            employees,
            swapped: true,
            guard_needed: false,
            route: Some(route),
        },
        None => {
            // Recomputation failed; revert the swap and fall back to a
            // reserved guard seat with the original ordering and details.
            employees.swap(critical_idx, chosen_idx);
            GuardOutcome {
                employees,
                swapped: false,
                guard_needed: true,
                route: None,
            }
        }
    }
}

/// Requests the full road route for `employees` and, if the service's
/// waypoint ordering no longer places the intended employee at the
/// critical seat, pins that employee back into the critical position and
/// recomputes once more.
async fn recompute_with_forced_order(
    employees: &mut Vec<Employee>,
    facility: &Facility,
    trip_type: TripType,
    road_client: &Arc<dyn RoadClient>,
    critical_idx: usize,
) -> Option<RoadRoute> {
    let coords = route_coords(facility, trip_type, employees);
    let route = road_client.route(&coords, true).await.ok()?;

    let expected_coord_idx = critical_coord_index(trip_type, employees.len());
    let reordered = route
        .waypoints
        .get(expected_coord_idx)
        .map(|w| w.waypoint_index != expected_coord_idx)
        .unwrap_or(false);

    if !reordered {
        return Some(route);
    }

    warn!("guard swapper: road service reordered waypoints, forcing critical seat order");
    let critical = employees.remove(critical_idx);
    employees.insert(critical_idx, critical);
    let forced_coords = route_coords(facility, trip_type, employees);
    road_client.route(&forced_coords, true).await.ok()
}
