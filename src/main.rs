use std::io;
use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::{error, info};

use shuttle_router::api::{self, AppState};
use shuttle_router::config::AppConfig;
use shuttle_router::road::{self, HttpRoadClient};
use shuttle_router::solver::{self, ProcessSolverClient};

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return Err(io::Error::new(io::ErrorKind::Other, e));
        }
    };

    info!("Starting shuttle-router on {}:{}", config.server.host, config.server.port);

    let road_client: Arc<dyn road::RoadClient> = Arc::new(HttpRoadClient::new(config.road_service.clone()));
    let solver_client: Arc<dyn solver::SolverClient> = Arc::new(ProcessSolverClient::new(config.solver.clone()));

    let state = web::Data::new(AppState {
        road_client,
        solver_client,
        orchestrator_config: config.orchestrator.clone(),
    });

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(api::configure_routes)
    })
    .bind((config.server.host.clone(), config.server.port))?
    .workers(config.server.workers)
    .run()
    .await
}
