use std::sync::Arc;

use actix_web::{web, HttpResponse, Responder};
use log::info;
use uuid::Uuid;

use crate::domain::TripType;
use crate::models::{RoutingRequest, RoutingResponse};
use crate::orchestrator::{self, OrchestratorConfig, PlanRequest};
use crate::road::RoadClient;
use crate::solver::SolverClient;
use crate::utils::AppError;

/// Collaborators handed to every request handler through `web::Data`.
pub struct AppState {
    pub road_client: Arc<dyn RoadClient>,
    pub solver_client: Arc<dyn SolverClient>,
    pub orchestrator_config: OrchestratorConfig,
}

/// Health check endpoint
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn validate_request(request: &RoutingRequest) -> Result<TripType, AppError> {
    if request.employees.is_empty() {
        return Err(AppError::Validation("employees must not be empty".to_string()));
    }
    let trip_type = TripType::parse(&request.trip_type)
        .ok_or_else(|| AppError::Validation(format!("invalid tripType: {}", request.trip_type)))?;

    let shift_time_valid = request.shift_time.len() == 4 && request.shift_time.bytes().all(|b| b.is_ascii_digit());
    if !shift_time_valid {
        return Err(AppError::Validation(format!(
            "shiftTime must be a 4-digit \"hhmm\" string, got {}",
            request.shift_time
        )));
    }

    for employee in &request.employees {
        let candidate = crate::domain::Employee::from(employee);
        if !candidate.has_valid_location() {
            return Err(AppError::Validation(format!(
                "employee {} has an out-of-bounds location",
                employee.emp_code
            )));
        }
    }

    Ok(trip_type)
}

/// Process a routing optimization request for a single trip direction.
pub async fn route(
    request: web::Json<RoutingRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    info!(
        "received routing request with {} employee(s), tripType={}",
        request.employees.len(),
        request.trip_type
    );

    let trip_type = validate_request(&request)?;

    if !state.road_client.is_available().await {
        return Err(AppError::RoadServiceUnavailable(
            "road routing service failed the initial availability probe".to_string(),
        ));
    }

    let facility = request.facility.into_domain(request.profile.facility_type);
    let employees: Vec<_> = request.employees.iter().map(crate::domain::Employee::from).collect();

    let plan_request = PlanRequest {
        employees,
        facility: &facility,
        profile: &request.profile,
        trip_type,
        guard: request.guard,
        pickup_time_per_employee_s: request.pickup_time_per_employee,
        reporting_time_s: request.reporting_time,
        shift_time: &request.shift_time,
    };

    let plan = orchestrator::plan(
        plan_request,
        &state.road_client,
        &state.solver_client,
        &state.orchestrator_config,
    )
    .await;

    info!(
        "routing request complete: {} route(s), {} unrouted",
        plan.routes.len(),
        plan.unrouted.len()
    );

    let response = RoutingResponse::build(Uuid::new_v4().to_string(), &request, trip_type, plan);
    Ok(HttpResponse::Ok().json(response))
}

/// Configure API routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health_check))
            .route("/route", web::post().to(route)),
    );
}
