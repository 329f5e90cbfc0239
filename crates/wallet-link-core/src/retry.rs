/// Bounded retry schedule for transient connect failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub multiplier: u32,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 500,
            multiplier: 2,
            max_delay_ms: 8_000,
        }
    }
}

impl RetryPolicy {
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to wait after failed attempt `attempt` (1-based), or `None`
    /// once the attempt budget is spent.
    pub fn delay_after(&self, attempt: u32) -> Option<u64> {
        if attempt == 0 || attempt >= self.max_attempts.max(1) {
            return None;
        }
        let factor = u64::from(self.multiplier.max(1)).saturating_pow(attempt - 1);
        Some(
            self.initial_delay_ms
                .saturating_mul(factor)
                .min(self.max_delay_ms),
        )
    }

    pub fn schedule(&self) -> Vec<u64> {
        (1..self.max_attempts.max(1))
            .filter_map(|attempt| self.delay_after(attempt))
            .collect()
    }
}
