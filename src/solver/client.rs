use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::types::{SolverError, SolverProblem, SolverSolution};

#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub binary_path: String,
    pub args: Vec<String>,
    pub spawn_timeout_seconds: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            binary_path: "vrp-solver".to_string(),
            args: Vec::new(),
            spawn_timeout_seconds: 30,
        }
    }
}

/// Collaborator contract for the external VRP solver.
#[async_trait]
pub trait SolverClient: Send + Sync {
    async fn solve(&self, problem: &SolverProblem) -> Result<SolverSolution, SolverError>;
}

pub struct ProcessSolverClient {
    config: SolverConfig,
}

impl ProcessSolverClient {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }
}

/// Scans `text` for balanced `{ ... }` spans (respecting JSON string
/// escaping) and returns the last complete one. The solver may emit log
/// lines on stdout before its final JSON blob; this tolerates that.
fn extract_last_json_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut current_start: Option<usize> = None;
    let mut last_span: Option<(usize, usize)> = None;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => {
                if depth == 0 {
                    current_start = Some(i);
                }
                depth += 1;
            }
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    if let Some(start) = current_start {
                        last_span = Some((start, i + 1));
                    }
                }
            }
            _ => {}
        }
    }

    last_span.map(|(start, end)| &text[start..end])
}

#[async_trait]
impl SolverClient for ProcessSolverClient {
    async fn solve(&self, problem: &SolverProblem) -> Result<SolverSolution, SolverError> {
        let payload = serde_json::to_vec(problem)
            .map_err(|e| SolverError::new(format!("failed to serialize problem: {e}")))?;

        let mut child = Command::new(&self.config.binary_path)
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SolverError::new(format!("failed to spawn solver: {e}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| SolverError::new("solver stdin unavailable"))?;
        stdin
            .write_all(&payload)
            .await
            .map_err(|e| SolverError::new(format!("failed to write solver problem: {e}")))?;
        drop(stdin);

        let wait = tokio::time::timeout(
            Duration::from_secs(self.config.spawn_timeout_seconds),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| SolverError::new("solver timed out"))?;

        let output = wait.map_err(|e| SolverError::new(format!("failed to read solver output: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SolverError::new(format!(
                "solver exited with status {}: {}",
                output.status, stderr
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let json_span = extract_last_json_object(&stdout)
            .ok_or_else(|| SolverError::new("no JSON object found in solver output"))?;
        debug!("solver produced {} bytes of JSON", json_span.len());

        let solution: SolverSolution = serde_json::from_str(json_span)
            .map_err(|e| SolverError::new(format!("failed to parse solver output: {e}")))?;

        if let Some(error) = &solution.error {
            return Err(SolverError::new(error.clone()));
        }

        Ok(solution)
    }
}
