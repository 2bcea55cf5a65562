use serde::{Deserialize, Serialize};

/// The JSON problem streamed on the solver subprocess's stdin.
#[derive(Debug, Clone, Serialize)]
pub struct SolverProblem {
    pub distance_matrix: Vec<Vec<f64>>,
    pub duration_matrix: Vec<Vec<f64>>,
    pub num_vehicles: u32,
    pub vehicle_capacities: Vec<u32>,
    pub demands: Vec<u32>,
    pub depot_index: usize,
    pub max_route_duration: u32,
    pub service_times: Vec<u32>,
    pub allow_dropping_visits: bool,
    pub drop_visit_penalty: f64,
    pub facility_coords: (f64, f64),
    pub trip_type: String,
    pub direction_penalty_weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_start_node_index_in_matrix: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_end_node_index_in_matrix: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_customer_node_indices_in_matrix: Option<Vec<usize>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolverRouteAssignment {
    pub vehicle_index: usize,
    pub node_indices: Vec<usize>,
}

/// The JSON solution read from the solver subprocess's stdout.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SolverSolution {
    #[serde(default)]
    pub routes: Vec<SolverRouteAssignment>,
    #[serde(default)]
    pub dropped_node_indices: Vec<usize>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SolverError {
    pub message: String,
}

impl std::fmt::Display for SolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "solver error: {}", self.message)
    }
}

impl std::error::Error for SolverError {}

impl SolverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
