use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

use crate::orchestrator::OrchestratorConfig;
use crate::road::RoadServiceConfig;
use crate::solver::SolverConfig;

/// Top-level application configuration, assembled from layered sources at
/// startup and handed to the HTTP server and the collaborator clients.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub road_service: RoadServiceConfig,
    pub solver: SolverConfig,
    pub orchestrator: OrchestratorConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: num_cpus::get(),
        }
    }
}

/// Internal structure matching what the `config` crate can deserialize
/// directly; every field is optional so a missing config file or section
/// falls back to the collaborator's own `Default`.
#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    server: Option<ServerConfig>,
    road_service: Option<RoadServiceConfigFile>,
    solver: Option<SolverConfigFile>,
}

#[derive(Debug, Deserialize)]
struct RoadServiceConfigFile {
    base_url: Option<String>,
    profile: Option<String>,
    route_timeout_seconds: Option<u64>,
    table_timeout_base_ms: Option<u64>,
    table_timeout_per_point_ms: Option<u64>,
    max_retries: Option<u32>,
    retry_base_delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SolverConfigFile {
    binary_path: Option<String>,
    args: Option<Vec<String>>,
    spawn_timeout_seconds: Option<u64>,
}

impl AppConfig {
    /// Loads `config/default.{toml,yaml,json}` (optional), then
    /// `config/{RUN_MODE}` (optional, `RUN_MODE` env defaulting to
    /// `development`), then `APP__`-prefixed, `__`-separated environment
    /// variables, layering each on top of the collaborators' defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(Environment::with_prefix("APP").separator("__").ignore_empty(true));

        let parsed: ConfigFile = builder.build()?.try_deserialize().unwrap_or_default();

        let server = parsed.server.unwrap_or_default();

        let road_service = parsed
            .road_service
            .map(|f| RoadServiceConfig {
                base_url: f.base_url.unwrap_or_else(|| RoadServiceConfig::default().base_url),
                profile: f.profile.unwrap_or_else(|| RoadServiceConfig::default().profile),
                route_timeout_seconds: f.route_timeout_seconds.unwrap_or_else(|| RoadServiceConfig::default().route_timeout_seconds),
                table_timeout_base_ms: f.table_timeout_base_ms.unwrap_or_else(|| RoadServiceConfig::default().table_timeout_base_ms),
                table_timeout_per_point_ms: f
                    .table_timeout_per_point_ms
                    .unwrap_or_else(|| RoadServiceConfig::default().table_timeout_per_point_ms),
                max_retries: f.max_retries.unwrap_or_else(|| RoadServiceConfig::default().max_retries),
                retry_base_delay_ms: f.retry_base_delay_ms.unwrap_or_else(|| RoadServiceConfig::default().retry_base_delay_ms),
            })
            .unwrap_or_default();

        let solver = parsed
            .solver
            .map(|f| SolverConfig {
                binary_path: f.binary_path.unwrap_or_else(|| SolverConfig::default().binary_path),
                args: f.args.unwrap_or_default(),
                spawn_timeout_seconds: f.spawn_timeout_seconds.unwrap_or_else(|| SolverConfig::default().spawn_timeout_seconds),
            })
            .unwrap_or_default();

        Ok(AppConfig {
            server,
            road_service,
            solver,
            orchestrator: OrchestratorConfig::default(),
        })
    }
}
