//! Client for the external VRP solver, consumed as a subprocess speaking
//! JSON over stdio.

mod client;
mod types;

pub use client::{ProcessSolverClient, SolverClient, SolverConfig};
pub use types::{SolverError, SolverProblem, SolverRouteAssignment, SolverSolution};
