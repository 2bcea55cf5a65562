//! Per-employee ETA and facility arrival/departure time computation.
//!
//! PICKUP back-computes from the facility arrival time (shift time minus the
//! reporting buffer); DROPOFF forward-computes from the facility departure
//! time (shift time). Each leg's duration is inflated by a traffic buffer
//! before being folded into the walk.

use chrono::{Duration, NaiveTime};

use crate::domain::{Employee, RouteDetails, RouteEmployee, TripType};

pub const TRAFFIC_BUFFER_PERCENTAGE: f64 = 0.4;
pub const ERROR_SENTINEL: &str = "Error";

pub struct TimingResult {
    pub employees: Vec<RouteEmployee>,
    /// Facility arrival time (PICKUP) or departure time (DROPOFF).
    pub facility_time: String,
    pub timing_error: bool,
}

#[derive(Debug)]
enum TimingError {
    LegCountMismatch,
    BadShiftTime,
}

fn parse_hhmm(shift_time: &str) -> Result<NaiveTime, TimingError> {
    if shift_time.len() != 4 || !shift_time.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimingError::BadShiftTime);
    }
    let hour: u32 = shift_time[0..2].parse().map_err(|_| TimingError::BadShiftTime)?;
    let minute: u32 = shift_time[2..4].parse().map_err(|_| TimingError::BadShiftTime)?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or(TimingError::BadShiftTime)
}

fn format_time(t: NaiveTime) -> String {
    t.format("%I:%M %p").to_string()
}

fn buffered_leg_duration(duration_s: f64) -> Duration {
    Duration::milliseconds((duration_s * (1.0 + TRAFFIC_BUFFER_PERCENTAGE) * 1000.0) as i64)
}

fn error_result(employees: &[Employee]) -> TimingResult {
    let route_employees = employees
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut re = RouteEmployee::from(e);
            re.order = (i + 1) as u32;
            re.eta = ERROR_SENTINEL.to_string();
            re
        })
        .collect();
    TimingResult {
        employees: route_employees,
        facility_time: ERROR_SENTINEL.to_string(),
        timing_error: true,
    }
}

/// Computes ETAs for `employees` (in their committed route order) given the
/// route's per-leg durations and the request's shift time. On any parse or
/// shape failure, every time is set to the `"Error"` sentinel and
/// `timing_error` is set, but a full (sentinel-valued) result is still
/// returned so the route can still be emitted.
pub fn calculate_timings(
    employees: &[Employee],
    trip_type: TripType,
    route_details: &RouteDetails,
    shift_time: &str,
    reporting_time_s: u32,
    service_time_s: u32,
) -> TimingResult {
    match try_calculate(employees, trip_type, route_details, shift_time, reporting_time_s, service_time_s) {
        Ok(result) => result,
        Err(_) => error_result(employees),
    }
}

fn try_calculate(
    employees: &[Employee],
    trip_type: TripType,
    route_details: &RouteDetails,
    shift_time: &str,
    reporting_time_s: u32,
    service_time_s: u32,
) -> Result<TimingResult, TimingError> {
    if employees.is_empty() {
        let shift = parse_hhmm(shift_time)?;
        return Ok(TimingResult {
            employees: vec![],
            facility_time: format_time(shift),
            timing_error: false,
        });
    }
    if route_details.legs.len() != employees.len() {
        return Err(TimingError::LegCountMismatch);
    }

    let shift = parse_hhmm(shift_time)?;
    let service_time = Duration::seconds(service_time_s as i64);
    let mut etas = vec![NaiveTime::from_hms_opt(0, 0, 0).unwrap(); employees.len()];

    let facility_time = match trip_type {
        TripType::Pickup => {
            let reporting = Duration::seconds(reporting_time_s as i64);
            let facility_arrival = shift - reporting;
            let mut current = facility_arrival;
            for i in (0..employees.len()).rev() {
                current = current - buffered_leg_duration(route_details.legs[i].duration_s) - service_time;
                etas[i] = current;
            }
            facility_arrival
        }
        TripType::Dropoff => {
            let facility_departure = shift;
            let mut current = facility_departure;
            for i in 0..employees.len() {
                current = current + buffered_leg_duration(route_details.legs[i].duration_s) + service_time;
                etas[i] = current;
            }
            facility_departure
        }
    };

    let route_employees = employees
        .iter()
        .zip(etas.iter())
        .enumerate()
        .map(|(i, (e, eta))| {
            let mut re = RouteEmployee::from(e);
            re.order = (i + 1) as u32;
            re.eta = format_time(*eta);
            re
        })
        .collect();

    Ok(TimingResult {
        employees: route_employees,
        facility_time: format_time(facility_time),
        timing_error: false,
    })
}
