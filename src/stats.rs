// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Exponentially decayed moving average in Q16.16.
//!
//! The decay factor `1 - e^(-period / tau)` is the only real-valued
//! computation and happens once, at construction. Updates are integer only,
//! so every node computes identical averages from identical observations.

use crate::fxp::ops::{from_f64, from_int, fxp_add, fxp_mul, fxp_sub};
use crate::types::scalar::FxpScalar;
use core::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct DecayedStatistics {
    decay: FxpScalar,
    average: FxpScalar,
}

/// `1 - e^(-period / tau)` in fixed point. A zero time constant forgets history at once.
pub fn decay_factor(refresh_period: Duration, time_constant: Duration) -> FxpScalar {
    if time_constant.is_zero() {
        return FxpScalar::ONE;
    }
    let ratio = refresh_period.as_secs_f64() / time_constant.as_secs_f64();
    from_f64(1.0 - (-ratio).exp())
}

impl DecayedStatistics {
    pub fn new(refresh_period: Duration, time_constant: Duration) -> Self {
        Self::with_decay(decay_factor(refresh_period, time_constant))
    }

    pub fn with_decay(decay: FxpScalar) -> Self {
        Self { decay, average: FxpScalar::ZERO }
    }

    /// `avg <- avg + decay * (x - avg)`
    pub fn update(&mut self, observation: FxpScalar) {
        let delta = fxp_sub(observation, self.average);
        self.average = fxp_add(self.average, fxp_mul(self.decay, delta));
    }

    pub fn update_count(&mut self, observation: i64) {
        self.update(from_int(observation));
    }

    pub fn average(&self) -> FxpScalar {
        self.average
    }

    pub fn decay(&self) -> FxpScalar {
        self.decay
    }
}
