use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;

use super::types::{RoadError, RoadErrorKind, RoadLeg, RoadRoute, RoadTable, Waypoint};

#[derive(Debug, Clone)]
pub struct RoadServiceConfig {
    pub base_url: String,
    pub profile: String,
    pub route_timeout_seconds: u64,
    pub table_timeout_base_ms: u64,
    pub table_timeout_per_point_ms: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for RoadServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "driving".to_string(),
            route_timeout_seconds: 8,
            table_timeout_base_ms: 2_000,
            table_timeout_per_point_ms: 150,
            max_retries: 3,
            retry_base_delay_ms: 200,
        }
    }
}

/// Collaborator contract for the road-routing service. Mocked in tests via
/// a fake implementation substituted through this trait.
#[async_trait]
pub trait RoadClient: Send + Sync {
    async fn is_available(&self) -> bool;
    async fn route(&self, coords: &[(f64, f64)], with_geometry: bool) -> Result<RoadRoute, RoadError>;
    async fn table(
        &self,
        coords: &[(f64, f64)],
        sources: Option<&[usize]>,
        destinations: Option<&[usize]>,
    ) -> Result<RoadTable, RoadError>;
}

pub struct HttpRoadClient {
    http: Client,
    config: RoadServiceConfig,
}

impl HttpRoadClient {
    pub fn new(config: RoadServiceConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.route_timeout_seconds.max(8)))
            .build()
            .expect("failed to build road service HTTP client");
        Self { http, config }
    }

    fn coords_param(coords: &[(f64, f64)]) -> String {
        coords
            .iter()
            .map(|(lat, lng)| format!("{lng},{lat}"))
            .collect::<Vec<_>>()
            .join(";")
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<T, RoadError> {
        let mut attempt = 0;
        loop {
            let result = self.http.get(url).timeout(timeout).send().await;
            match result {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(RoadError {
                            kind: RoadErrorKind::Service,
                            message: format!("HTTP {status}: {body}"),
                            url: url.to_string(),
                        });
                    }
                    return response.json::<T>().await.map_err(|e| RoadError {
                        kind: RoadErrorKind::Parse,
                        message: e.to_string(),
                        url: url.to_string(),
                    });
                }
                Err(e) if e.is_timeout() || e.is_connect() || e.is_request() => {
                    attempt += 1;
                    if attempt > self.config.max_retries {
                        return Err(RoadError {
                            kind: RoadErrorKind::Transient,
                            message: e.to_string(),
                            url: url.to_string(),
                        });
                    }
                    let delay = self.config.retry_base_delay_ms * 2u64.pow(attempt - 1);
                    warn!("road service call failed (attempt {attempt}), retrying in {delay}ms: {e}");
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Err(e) => {
                    return Err(RoadError {
                        kind: RoadErrorKind::Transient,
                        message: e.to_string(),
                        url: url.to_string(),
                    });
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    routes: Vec<OsrmRoute>,
    #[serde(default)]
    waypoints: Vec<OsrmWaypoint>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    #[serde(default)]
    geometry: Option<String>,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    distance: f64,
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct OsrmWaypoint {
    location: [f64; 2],
    #[serde(default)]
    waypoint_index: usize,
}

#[derive(Debug, Deserialize)]
struct OsrmTableResponse {
    code: String,
    durations: Vec<Vec<f64>>,
    #[serde(default)]
    distances: Option<Vec<Vec<f64>>>,
}

#[async_trait]
impl RoadClient for HttpRoadClient {
    async fn is_available(&self) -> bool {
        let probe = [(12.9716, 77.5946), (12.9352, 77.6146)];
        match self.route(&probe, false).await {
            Ok(route) => route.total_distance_m >= 0.0,
            Err(_) => false,
        }
    }

    async fn route(&self, coords: &[(f64, f64)], with_geometry: bool) -> Result<RoadRoute, RoadError> {
        let url = format!(
            "{}/route/v1/{}/{}?overview={}&geometries=polyline&steps=true&annotations=distance",
            self.config.base_url,
            self.config.profile,
            Self::coords_param(coords),
            if with_geometry { "full" } else { "false" },
        );
        debug!("road route request: {url}");
        let timeout = Duration::from_secs(self.config.route_timeout_seconds);
        let response: OsrmRouteResponse = self.get_json(&url, timeout).await?;
        if response.code != "Ok" || response.routes.is_empty() {
            return Err(RoadError {
                kind: RoadErrorKind::Service,
                message: format!("unexpected response code: {}", response.code),
                url,
            });
        }
        let route = &response.routes[0];
        Ok(RoadRoute {
            total_distance_m: route.distance,
            total_duration_s: route.duration,
            legs: route
                .legs
                .iter()
                .map(|l| RoadLeg {
                    distance_m: l.distance,
                    duration_s: l.duration,
                })
                .collect(),
            geometry: route.geometry.clone(),
            waypoints: response
                .waypoints
                .iter()
                .map(|w| Waypoint {
                    location: (w.location[1], w.location[0]),
                    waypoint_index: w.waypoint_index,
                })
                .collect(),
        })
    }

    async fn table(
        &self,
        coords: &[(f64, f64)],
        sources: Option<&[usize]>,
        destinations: Option<&[usize]>,
    ) -> Result<RoadTable, RoadError> {
        let mut url = format!(
            "{}/table/v1/{}/{}?annotations=distance,duration",
            self.config.base_url,
            self.config.profile,
            Self::coords_param(coords),
        );
        if let Some(sources) = sources {
            let s = sources.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(";");
            url.push_str(&format!("&sources={s}"));
        }
        if let Some(destinations) = destinations {
            let d = destinations
                .iter()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join(";");
            url.push_str(&format!("&destinations={d}"));
        }
        debug!("road table request for {} points: {url}", coords.len());
        let timeout_ms = self.config.table_timeout_base_ms
            + (coords.len() as u64) * self.config.table_timeout_per_point_ms;
        let response: OsrmTableResponse = self.get_json(&url, Duration::from_millis(timeout_ms)).await?;
        if response.code != "Ok" {
            return Err(RoadError {
                kind: RoadErrorKind::Service,
                message: format!("unexpected response code: {}", response.code),
                url,
            });
        }
        let distances = response.distances.unwrap_or_default();
        Ok(RoadTable {
            distances,
            durations: response.durations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn route_parses_a_successful_osrm_response() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({
            "code": "Ok",
            "routes": [{
                "distance": 1500.0,
                "duration": 180.0,
                "geometry": "abc123",
                "legs": [{"distance": 1000.0, "duration": 120.0}, {"distance": 500.0, "duration": 60.0}]
            }],
            "waypoints": [
                {"location": [77.5, 12.9], "waypoint_index": 0},
                {"location": [77.6, 12.95], "waypoint_index": 1}
            ]
        });
        let mock = server
            .mock("GET", mockito::Matcher::Regex(r"^/route/v1/driving/.*".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let config = RoadServiceConfig {
            base_url: server.url(),
            ..RoadServiceConfig::default()
        };
        let client = HttpRoadClient::new(config);
        let route = client.route(&[(12.9, 77.5), (12.95, 77.6)], true).await.unwrap();

        assert_eq!(route.total_distance_m, 1500.0);
        assert_eq!(route.legs.len(), 2);
        assert_eq!(route.geometry.as_deref(), Some("abc123"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn route_surfaces_a_service_error_on_non_ok_code() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({"code": "NoRoute", "routes": []});
        let _mock = server
            .mock("GET", mockito::Matcher::Regex(r"^/route/v1/driving/.*".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let config = RoadServiceConfig {
            base_url: server.url(),
            ..RoadServiceConfig::default()
        };
        let client = HttpRoadClient::new(config);
        let err = client.route(&[(12.9, 77.5), (12.95, 77.6)], false).await.unwrap_err();
        assert_eq!(err.kind, RoadErrorKind::Service);
    }

    #[tokio::test]
    async fn table_parses_a_successful_osrm_response() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({
            "code": "Ok",
            "durations": [[0.0, 60.0], [60.0, 0.0]],
            "distances": [[0.0, 500.0], [500.0, 0.0]]
        });
        let mock = server
            .mock("GET", mockito::Matcher::Regex(r"^/table/v1/driving/.*".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let config = RoadServiceConfig {
            base_url: server.url(),
            ..RoadServiceConfig::default()
        };
        let client = HttpRoadClient::new(config);
        let table = client.table(&[(12.9, 77.5), (12.95, 77.6)], None, None).await.unwrap();

        assert_eq!(table.durations, vec![vec![0.0, 60.0], vec![60.0, 0.0]]);
        assert_eq!(table.distances, vec![vec![0.0, 500.0], vec![500.0, 0.0]]);
        mock.assert_async().await;
    }
}
