mod routes;

pub use routes::{configure_routes, health_check, route, AppState};
