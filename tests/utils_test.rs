use actix_web::{http::StatusCode, ResponseError};
use shuttle_router::utils::AppError;

#[test]
fn validation_error_maps_to_bad_request() {
    let error = AppError::Validation("Invalid input".to_string());
    let response = error.error_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn road_service_unavailable_maps_to_service_unavailable() {
    let error = AppError::RoadServiceUnavailable("road service down".to_string());
    let response = error.error_response();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[test]
fn road_service_transient_maps_to_bad_gateway() {
    let error = AppError::RoadServiceTransient("timeout".to_string());
    let response = error.error_response();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[test]
fn internal_error_maps_to_internal_server_error() {
    let error = AppError::Internal("something went wrong".to_string());
    let response = error.error_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
