use serde::Serialize;

use crate::domain::{Route, RouteEmployee, TripType};
use crate::orchestrator::PlanResult;

use super::request::RoutingRequest;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingResponse {
    pub uuid: String,
    pub date: String,
    pub shift: String,
    pub trip_type: String,
    pub total_employees: u32,
    pub total_routed_employees: u32,
    pub total_routes: u32,
    pub average_occupancy: f64,
    pub overall_route_details: OverallRouteDetails,
    pub total_swapped_routes: u32,
    pub total_guarded_routes: u32,
    pub routes: Vec<RouteOutput>,
    pub unrouted_employees: Vec<UnroutedEmployeeOutput>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallRouteDetails {
    pub total_distance_km: f64,
    pub total_duration_s: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOutput {
    pub route_number: u32,
    pub zone: Option<String>,
    pub vehicle_capacity: u32,
    pub vehicle_type: String,
    pub guard: bool,
    pub swapped: bool,
    pub duration_exceeded: bool,
    pub unique_key: String,
    pub is_special_needs_route: bool,
    pub after_fleet_exhaustion: bool,
    pub distance_km: f64,
    pub duration_s: f64,
    pub occupancy: u32,
    pub farthest_employee_distance_km: f64,
    #[serde(rename = "isMedicalRoute")]
    pub is_medical_route: bool,
    #[serde(rename = "isPWDRoute")]
    pub is_pwd_route: bool,
    #[serde(rename = "isNMTRoute")]
    pub is_nmt_route: bool,
    #[serde(rename = "isOOBRoute")]
    pub is_oob_route: bool,
    pub encoded_polyline: String,
    pub employees: Vec<RouteEmployee>,
}

impl From<&Route> for RouteOutput {
    fn from(route: &Route) -> Self {
        Self {
            route_number: route.route_number,
            zone: None,
            vehicle_capacity: route.vehicle_capacity,
            vehicle_type: route.vehicle_type.clone(),
            guard: route.guard_needed,
            swapped: route.swapped,
            duration_exceeded: route.duration_exceeded,
            unique_key: route.unique_key.clone(),
            is_special_needs_route: route.is_special_needs_route,
            after_fleet_exhaustion: route.after_fleet_exhaustion,
            distance_km: route.route_details.total_distance_m / 1000.0,
            duration_s: route.route_details.total_duration_s,
            occupancy: route.employees.len() as u32,
            farthest_employee_distance_km: route.farthest_employee_distance_m / 1000.0,
            is_medical_route: route.employees.iter().any(|e| e.is_medical),
            is_pwd_route: route.employees.iter().any(|e| e.is_pwd),
            is_nmt_route: route.employees.iter().any(|e| e.is_nmt),
            is_oob_route: route.employees.iter().any(|e| e.is_oob),
            encoded_polyline: route.route_details.encoded_polyline.clone(),
            employees: route.employees.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnroutedEmployeeOutput {
    pub emp_code: String,
    #[serde(rename = "geoX")]
    pub geo_x: f64,
    #[serde(rename = "geoY")]
    pub geo_y: f64,
    pub gender: crate::domain::Gender,
    pub is_medical: bool,
    #[serde(rename = "isPWD")]
    pub is_pwd: bool,
    pub location: String,
}

impl From<&crate::domain::Employee> for UnroutedEmployeeOutput {
    fn from(e: &crate::domain::Employee) -> Self {
        Self {
            emp_code: e.emp_code.clone(),
            geo_x: e.lng,
            geo_y: e.lat,
            gender: e.gender,
            is_medical: e.is_medical,
            is_pwd: e.is_pwd,
            location: format!("{},{}", e.lat, e.lng),
        }
    }
}

impl RoutingResponse {
    /// Shapes the orchestrator's raw plan plus the originating request into
    /// the external response: aggregate statistics, then per-route and
    /// per-unrouted-employee projections.
    pub fn build(uuid: String, request: &RoutingRequest, trip_type: TripType, plan: PlanResult) -> Self {
        let total_employees = request.employees.len() as u32;
        let total_routed: u32 = plan.routes.iter().map(|r| r.employees.len() as u32).sum();
        let total_routes = plan.routes.len() as u32;
        let average_occupancy = if total_routes > 0 {
            total_routed as f64 / total_routes as f64
        } else {
            0.0
        };
        let total_distance_km: f64 = plan.routes.iter().map(|r| r.route_details.total_distance_m / 1000.0).sum();
        let total_duration_s: f64 = plan.routes.iter().map(|r| r.route_details.total_duration_s).sum();
        let total_swapped = plan.routes.iter().filter(|r| r.swapped).count() as u32;
        let total_guarded = plan.routes.iter().filter(|r| r.guard_needed).count() as u32;

        Self {
            uuid,
            date: request.date.clone(),
            shift: request.shift_time.clone(),
            trip_type: trip_type.as_letter().to_string(),
            total_employees,
            total_routed_employees: total_routed,
            total_routes,
            average_occupancy,
            overall_route_details: OverallRouteDetails {
                total_distance_km,
                total_duration_s,
            },
            total_swapped_routes: total_swapped,
            total_guarded_routes: total_guarded,
            routes: plan.routes.iter().map(RouteOutput::from).collect(),
            unrouted_employees: plan.unrouted.iter().map(UnroutedEmployeeOutput::from).collect(),
        }
    }
}
