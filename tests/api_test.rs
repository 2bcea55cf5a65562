use std::sync::Arc;

use actix_web::{test, web, App};
use async_trait::async_trait;

use shuttle_router::api::{configure_routes, health_check, AppState};
use shuttle_router::domain::{FacilityType, Gender};
use shuttle_router::models::request::{EmployeeInput, FacilityInput};
use shuttle_router::models::RoutingRequest;
use shuttle_router::orchestrator::OrchestratorConfig;
use shuttle_router::road::{RoadClient, RoadError, RoadLeg, RoadRoute, RoadTable, Waypoint};
use shuttle_router::solver::{SolverClient, SolverError, SolverProblem, SolverRouteAssignment, SolverSolution};

struct FakeRoadClient;

#[async_trait]
impl RoadClient for FakeRoadClient {
    async fn is_available(&self) -> bool {
        true
    }

    async fn route(&self, coords: &[(f64, f64)], _with_geometry: bool) -> Result<RoadRoute, RoadError> {
        let leg_count = coords.len().saturating_sub(1);
        Ok(RoadRoute {
            total_distance_m: leg_count as f64 * 500.0,
            total_duration_s: leg_count as f64 * 60.0,
            legs: (0..leg_count)
                .map(|_| RoadLeg {
                    distance_m: 500.0,
                    duration_s: 60.0,
                })
                .collect(),
            geometry: Some("fakepolyline".to_string()),
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
            durations: vec![vec![60.0; n]; n],
        })
    }
}

struct DownRoadClient;

#[async_trait]
impl RoadClient for DownRoadClient {
    async fn is_available(&self) -> bool {
        false
    }

    async fn route(&self, _coords: &[(f64, f64)], _with_geometry: bool) -> Result<RoadRoute, RoadError> {
        unreachable!("route() must not be called once the availability probe fails")
    }

    async fn table(
        &self,
        _coords: &[(f64, f64)],
        _sources: Option<&[usize]>,
        _destinations: Option<&[usize]>,
    ) -> Result<RoadTable, RoadError> {
        unreachable!("table() must not be called once the availability probe fails")
    }
}

struct FakeSolverClient;

#[async_trait]
impl SolverClient for FakeSolverClient {
    async fn solve(&self, problem: &SolverProblem) -> Result<SolverSolution, SolverError> {
        let node_indices: Vec<usize> = (0..problem.distance_matrix.len()).collect();
        Ok(SolverSolution {
            routes: vec![SolverRouteAssignment {
                vehicle_index: 0,
                node_indices,
            }],
            dropped_node_indices: vec![],
            error: None,
        })
    }
}

fn test_state() -> web::Data<AppState> {
    web::Data::new(AppState {
        road_client: Arc::new(FakeRoadClient) as Arc<dyn RoadClient>,
        solver_client: Arc::new(FakeSolverClient) as Arc<dyn SolverClient>,
        orchestrator_config: OrchestratorConfig::default(),
    })
}

fn sample_request() -> RoutingRequest {
    RoutingRequest {
        employees: vec![
            EmployeeInput {
                emp_code: "E1".to_string(),
                geo_x: 77.50,
                geo_y: 12.90,
                gender: Gender::M,
                is_medical: false,
                is_pwd: false,
                is_nmt: false,
                is_oob: false,
            },
            EmployeeInput {
                emp_code: "E2".to_string(),
                geo_x: 77.51,
                geo_y: 12.91,
                gender: Gender::M,
                is_medical: false,
                is_pwd: false,
                is_nmt: false,
                is_oob: false,
            },
        ],
        facility: FacilityInput { geo_x: 77.55, geo_y: 12.95 },
        shift_time: "0930".to_string(),
        date: "2026-07-26".to_string(),
        profile: shuttle_router::domain::Profile {
            max_duration: 5400,
            fleet: vec![shuttle_router::domain::FleetSpec {
                vehicle_type: "Sedan".to_string(),
                capacity: 4,
                count: 1,
            }],
            route_deviation_rules: Default::default(),
            night_shift_guard_timings: Default::default(),
            capacity_tier_zones: None,
            zone_pairing_matrix: None,
            facility_type: FacilityType::CDC,
            direction_penalty_weight: 1.0,
            drop_penalty: 0.0,
            allow_dropping_visits_for_problematic_zones: false,
        },
        pickup_time_per_employee: 120,
        reporting_time: 600,
        trip_type: "P".to_string(),
        guard: true,
        zones: None,
        save_to_database: None,
    }
}

#[actix_web::test]
async fn health_check_reports_ok() {
    let app = test::init_service(App::new().route("/health", web::get().to(health_check))).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());

    let body = test::read_body(resp).await;
    let response: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(response["status"], "ok");
    assert!(response["version"].is_string());
}

#[actix_web::test]
async fn health_endpoint_is_configured_under_api_scope() {
    let app = test::init_service(App::new().app_data(test_state()).configure(configure_routes)).await;

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());
}

#[actix_web::test]
async fn route_endpoint_rejects_empty_employee_list() {
    let app = test::init_service(App::new().app_data(test_state()).configure(configure_routes)).await;

    let mut request = sample_request();
    request.employees.clear();

    let req = test::TestRequest::post().uri("/api/route").set_json(&request).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn route_endpoint_fails_fast_when_road_service_probe_is_down() {
    let state = web::Data::new(AppState {
        road_client: Arc::new(DownRoadClient) as Arc<dyn RoadClient>,
        solver_client: Arc::new(FakeSolverClient) as Arc<dyn SolverClient>,
        orchestrator_config: OrchestratorConfig::default(),
    });
    let app = test::init_service(App::new().app_data(state).configure(configure_routes)).await;

    let request = sample_request();
    let req = test::TestRequest::post().uri("/api/route").set_json(&request).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), actix_web::http::StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn route_endpoint_produces_a_committed_route_for_two_nearby_employees() {
    let app = test::init_service(App::new().app_data(test_state()).configure(configure_routes)).await;

    let request = sample_request();
    let req = test::TestRequest::post().uri("/api/route").set_json(&request).to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());

    let body = test::read_body(resp).await;
    let response: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(response["totalRoutes"], 1);
    assert_eq!(response["totalRoutedEmployees"], 2);
    assert!(response["unroutedEmployees"].as_array().unwrap().is_empty());
    assert_eq!(response["routes"][0]["employees"].as_array().unwrap().len(), 2);
    assert_eq!(response["routes"][0]["durationExceeded"], false);
    assert_eq!(response["routes"][0]["guard"], false);
    assert_eq!(response["routes"][0]["vehicleType"], "Sedan");
}
