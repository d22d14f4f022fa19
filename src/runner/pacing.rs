//! Minimum-interval pacing between roles and between accounts
//!
//! Each gate is a governor limiter holding a single cell that refills once
//! per interval, so two acquisitions of the same gate are always at least
//! one interval apart. A zero interval disables the gate.

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::time::Duration;

use crate::config::PacingConfig;

type Gate = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

fn gate(interval: Duration) -> Option<Gate> {
    Quota::with_period(interval).map(RateLimiter::direct)
}

/// Pacing policy for a run
pub struct Pacer {
    role_gate: Option<Gate>,
    account_gate: Option<Gate>,
}

impl Pacer {
    pub fn new(config: &PacingConfig) -> Self {
        Self {
            role_gate: gate(config.role_interval()),
            account_gate: gate(config.account_interval()),
        }
    }

    /// Pacer that never waits
    pub fn unpaced() -> Self {
        Self::new(&PacingConfig::none())
    }

    /// Wait until the next role may be processed
    pub async fn before_role(&self) {
        if let Some(gate) = &self.role_gate {
            gate.until_ready().await;
        }
    }

    /// Wait until the next account may be processed
    pub async fn before_account(&self) {
        if let Some(gate) = &self.account_gate {
            gate.until_ready().await;
        }
    }
}
