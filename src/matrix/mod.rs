//! Assembles a `(facility + employees)` point list and requests a square
//! distance/duration matrix, maintaining the index-to-entity mapping.

use std::sync::Arc;

use crate::domain::{Employee, Facility, PointMap, PointRef};
use crate::road::{RoadClient, RoadError, RoadTable};

pub struct Matrix {
    pub distances: Vec<Vec<f64>>,
    pub durations: Vec<Vec<f64>>,
    pub point_map: PointMap,
}

/// Builds the `(facility + employees)` matrix for the given candidate pool.
/// Returns `Ok(None)` when the pool is empty ("no candidates" signal).
pub async fn build_matrix(
    road_client: &Arc<dyn RoadClient>,
    facility: &Facility,
    employees: &[&Employee],
) -> Result<Option<Matrix>, RoadError> {
    if employees.is_empty() {
        return Ok(None);
    }

    let mut coords = Vec::with_capacity(employees.len() + 1);
    coords.push((facility.lat, facility.lng));
    let mut points = vec![PointRef::Facility];
    for emp in employees {
        coords.push((emp.lat, emp.lng));
        points.push(PointRef::Employee {
            emp_code: emp.emp_code.clone(),
        });
    }

    let RoadTable { distances, durations } = road_client.table(&coords, None, None).await?;
    let point_map = PointMap::new(points);

    if point_map.len() != distances.len() || point_map.len() != durations.len() {
        return Err(RoadError {
            kind: crate::road::RoadErrorKind::Parse,
            message: format!(
                "matrix size {} does not match point map size {}",
                distances.len().max(durations.len()),
                point_map.len()
            ),
            url: "table".to_string(),
        });
    }

    Ok(Some(Matrix {
        distances,
        durations,
        point_map,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Gender;
    use crate::road::RoadErrorKind;
    use async_trait::async_trait;

    struct FakeRoadClient {
        table_result: RoadTable,
    }

    #[async_trait]
    impl RoadClient for FakeRoadClient {
        async fn is_available(&self) -> bool {
            true
        }
        async fn route(
            &self,
            _coords: &[(f64, f64)],
            _with_geometry: bool,
        ) -> Result<crate::road::RoadRoute, RoadError> {
            unimplemented!()
        }
        async fn table(
            &self,
            _coords: &[(f64, f64)],
            _sources: Option<&[usize]>,
            _destinations: Option<&[usize]>,
        ) -> Result<RoadTable, RoadError> {
            Ok(self.table_result.clone())
        }
    }

    fn employee(code: &str) -> Employee {
        Employee {
            emp_code: code.to_string(),
            lat: 12.9,
            lng: 77.5,
            gender: Gender::M,
            is_medical: false,
            is_pwd: false,
            is_nmt: false,
            is_oob: false,
        }
    }

    #[tokio::test]
    async fn empty_pool_signals_no_candidates() {
        let facility = Facility {
            lat: 12.9,
            lng: 77.6,
            facility_type: crate::domain::FacilityType::CDC,
        };
        let client: Arc<dyn RoadClient> = Arc::new(FakeRoadClient {
            table_result: RoadTable {
                distances: vec![],
                durations: vec![],
            },
        });
        let result = build_matrix(&client, &facility, &[]).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn mismatched_matrix_size_is_an_error() {
        let facility = Facility {
            lat: 12.9,
            lng: 77.6,
            facility_type: crate::domain::FacilityType::CDC,
        };
        let e1 = employee("E1");
        let client: Arc<dyn RoadClient> = Arc::new(FakeRoadClient {
            table_result: RoadTable {
                distances: vec![vec![0.0]],
                durations: vec![vec![0.0]],
            },
        });
        let err = build_matrix(&client, &facility, &[&e1]).await.unwrap_err();
        assert_eq!(err.kind, RoadErrorKind::Parse);
    }
}
