use std::collections::HashMap;

/// Default per-employee attempt budget in the primary (profiled fleet) phase.
pub const MAX_ROUTING_ATTEMPTS_PER_EMPLOYEE: u32 = 5;
/// Extra attempts granted to each employee once Phase 2 (default fallback) begins.
pub const FALLBACK_BONUS_ATTEMPTS: u32 = 2;

/// Per-employee counter of failed selection/validation attempts, used to
/// keep the orchestrator from endlessly reselecting an infeasible employee.
#[derive(Debug, Clone, Default)]
pub struct AttemptLedger {
    failed_attempts: HashMap<String, u32>,
}

impl AttemptLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, emp_code: &str) {
        *self.failed_attempts.entry(emp_code.to_string()).or_insert(0) += 1;
    }

    pub fn increment_all<'a>(&mut self, emp_codes: impl IntoIterator<Item = &'a str>) {
        for code in emp_codes {
            self.increment(code);
        }
    }

    pub fn attempts(&self, emp_code: &str) -> u32 {
        self.failed_attempts.get(emp_code).copied().unwrap_or(0)
    }

    pub fn is_exhausted(&self, emp_code: &str, max_attempts: u32) -> bool {
        self.attempts(emp_code) >= max_attempts
    }
}
