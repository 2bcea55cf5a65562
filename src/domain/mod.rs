pub mod attempts;
pub mod employee;
pub mod facility;
pub mod fleet;
pub mod point_map;
pub mod profile;
pub mod route;

pub use attempts::AttemptLedger;
pub use employee::{Employee, Gender, RouteEmployee};
pub use facility::{Facility, FacilityType};
pub use fleet::FleetLedger;
pub use point_map::{PointMap, PointRef};
pub use profile::{FleetSpec, GuardTiming, Profile, RuleTier};
pub use route::{Leg, Route, RouteDetails, TripType};
