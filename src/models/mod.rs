//! Wire types for the HTTP surface: external request/response shapes and
//! their conversion into and out of the domain model.

pub mod request;
pub mod response;

pub use request::{EmployeeInput, FacilityInput, RoutingRequest};
pub use response::{RouteOutput, RoutingResponse, UnroutedEmployeeOutput};
