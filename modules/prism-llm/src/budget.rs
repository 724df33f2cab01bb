use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{LlmError, Result};

/// Tracks a running daily spend in cents and refuses further calls once the
/// configured ceiling is hit. Disabled (always permits) when the configured
/// limit is 0, matching `daily_budget_cents = 0` meaning "unlimited".
pub struct BudgetGuard {
    limit_cents: u64,
    spent_cents: AtomicU64,
}

impl BudgetGuard {
    pub fn new(limit_cents: u64) -> Self {
        Self {
            limit_cents,
            spent_cents: AtomicU64::new(0),
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.limit_cents == 0
    }

    /// Check remaining budget before issuing a call, then record its cost.
    pub fn charge(&self, cost_cents: u64) -> Result<()> {
        if self.is_unlimited() {
            return Ok(());
        }
        let spent = self.spent_cents.load(Ordering::SeqCst);
        if spent + cost_cents > self.limit_cents {
            return Err(LlmError::BudgetExhausted);
        }
        self.spent_cents.fetch_add(cost_cents, Ordering::SeqCst);
        Ok(())
    }

    pub fn spent_cents(&self) -> u64 {
        self.spent_cents.load(Ordering::SeqCst)
    }

    /// Reset the counter. Called by the scheduler at the start of each new
    /// day.
    pub fn reset(&self) {
        self.spent_cents.store(0, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_guard_never_blocks() {
        let guard = BudgetGuard::new(0);
        assert!(guard.charge(1_000_000).is_ok());
    }

    #[test]
    fn blocks_once_limit_exceeded() {
        let guard = BudgetGuard::new(10);
        assert!(guard.charge(6).is_ok());
        assert!(guard.charge(6).is_err());
        assert!(guard.charge(4).is_ok());
    }

    #[test]
    fn reset_clears_spend() {
        let guard = BudgetGuard::new(10);
        guard.charge(10).unwrap();
        assert!(guard.charge(1).is_err());
        guard.reset();
        assert!(guard.charge(1).is_ok());
    }
}
