use serde::{Deserialize, Serialize};

/// Latitude bounds the system accepts for any geo-located point.
pub const MIN_LAT: f64 = 6.0;
pub const MAX_LAT: f64 = 38.0;
/// Longitude bounds the system accepts for any geo-located point.
pub const MIN_LNG: f64 = 68.0;
pub const MAX_LNG: f64 = 98.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    M,
    F,
}

impl Gender {
    pub fn is_female(self) -> bool {
        matches!(self, Gender::F)
    }
}

/// An employee to be routed, read-only through planning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub emp_code: String,
    pub lat: f64,
    pub lng: f64,
    pub gender: Gender,
    #[serde(default)]
    pub is_medical: bool,
    #[serde(default)]
    pub is_pwd: bool,
    #[serde(default)]
    pub is_nmt: bool,
    #[serde(default)]
    pub is_oob: bool,
}

impl Employee {
    pub fn is_special_needs(&self) -> bool {
        self.is_medical || self.is_pwd
    }

    pub fn has_valid_location(&self) -> bool {
        (MIN_LAT..=MAX_LAT).contains(&self.lat) && (MIN_LNG..=MAX_LNG).contains(&self.lng)
    }
}

/// An employee as it appears inside a committed route: position in the
/// sequence plus the ETA computed by the timing calculator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteEmployee {
    pub emp_code: String,
    #[serde(rename = "geoY")]
    pub lat: f64,
    #[serde(rename = "geoX")]
    pub lng: f64,
    pub gender: Gender,
    pub is_medical: bool,
    #[serde(rename = "isPWD")]
    pub is_pwd: bool,
    #[serde(rename = "isNMT")]
    pub is_nmt: bool,
    #[serde(rename = "isOOB")]
    pub is_oob: bool,
    pub order: u32,
    pub eta: String,
}

impl From<&Employee> for RouteEmployee {
    fn from(e: &Employee) -> Self {
        Self {
            emp_code: e.emp_code.clone(),
            lat: e.lat,
            lng: e.lng,
            gender: e.gender,
            is_medical: e.is_medical,
            is_pwd: e.is_pwd,
            is_nmt: e.is_nmt,
            is_oob: e.is_oob,
            order: 0,
            eta: String::new(),
        }
    }
}
