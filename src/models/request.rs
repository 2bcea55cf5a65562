use serde::Deserialize;

use crate::domain::{Employee, Facility, FacilityType, Gender, Profile};

/// The external routing request: employees plus facility, shift, and
/// planning profile for a single trip direction.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingRequest {
    pub employees: Vec<EmployeeInput>,
    pub facility: FacilityInput,
    pub shift_time: String,
    pub date: String,
    pub profile: Profile,
    pub pickup_time_per_employee: u32,
    pub reporting_time: u32,
    pub trip_type: String,
    pub guard: bool,
    #[serde(default)]
    pub zones: Option<serde_json::Value>,
    #[serde(default)]
    pub save_to_database: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeInput {
    pub emp_code: String,
    #[serde(rename = "geoX")]
    pub geo_x: f64,
    #[serde(rename = "geoY")]
    pub geo_y: f64,
    pub gender: Gender,
    #[serde(default)]
    pub is_medical: bool,
    #[serde(default, rename = "isPWD")]
    pub is_pwd: bool,
    #[serde(default, rename = "isNMT")]
    pub is_nmt: bool,
    #[serde(default, rename = "isOOB")]
    pub is_oob: bool,
}

impl From<&EmployeeInput> for Employee {
    fn from(e: &EmployeeInput) -> Self {
        Self {
            emp_code: e.emp_code.clone(),
            lat: e.geo_y,
            lng: e.geo_x,
            gender: e.gender,
            is_medical: e.is_medical,
            is_pwd: e.is_pwd,
            is_nmt: e.is_nmt,
            is_oob: e.is_oob,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FacilityInput {
    #[serde(rename = "geoX")]
    pub geo_x: f64,
    #[serde(rename = "geoY")]
    pub geo_y: f64,
}

impl FacilityInput {
    pub fn into_domain(&self, facility_type: FacilityType) -> Facility {
        Facility {
            lat: self.geo_y,
            lng: self.geo_x,
            facility_type,
        }
    }
}
