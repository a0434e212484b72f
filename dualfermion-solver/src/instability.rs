//! # Numerical instabilities
//!
//! Denominators in the Dyson mappings vanish close to a lattice instability. Rather than divide
//! blindly each kernel checks its denominators against a threshold, clamps offending values and
//! records an `InstabilityFlag` which the caller can inspect after the run.

use crate::Complex64;
use std::fmt;

/// The kernel a flag was raised in
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Lattice embedding of the input hybridisation failed to converge
    Embedding,
    /// `g^{-1} + Δ - ε(k)` in the bare dual propagator
    BareDual,
    /// A singular Bethe-Salpeter system in the ladder
    BetheSalpeter,
    /// `1 - Σ G0` in the dual Dyson equation
    DualDyson,
    /// Denominators of the lattice Green's function
    LatticeDyson,
    /// The local lattice Green's function inverted in the hybridisation update
    HybridisationUpdate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Embedding => "lattice embedding",
            Stage::BareDual => "bare dual propagator",
            Stage::BetheSalpeter => "Bethe-Salpeter equation",
            Stage::DualDyson => "dual Dyson equation",
            Stage::LatticeDyson => "lattice Dyson equation",
            Stage::HybridisationUpdate => "hybridisation update",
        };
        write!(f, "{}", name)
    }
}

/// A recorded near-singular event
#[derive(Clone, Debug, PartialEq)]
pub struct InstabilityFlag {
    /// Where the event happened
    pub stage: Stage,
    /// The self-consistency pass, counted from one, zero before the loop starts
    pub iteration: usize,
    /// Matsubara index of the offending frequency, when the event is frequency resolved
    pub frequency: Option<i64>,
    /// Flat momentum index, for lattice dependent quantities
    pub momentum: Option<usize>,
    /// Magnitude of the offending quantity
    pub magnitude: f64,
}

impl InstabilityFlag {
    pub(crate) fn new(
        stage: Stage,
        frequency: Option<i64>,
        momentum: Option<usize>,
        magnitude: f64,
    ) -> Self {
        Self {
            stage,
            iteration: 0,
            frequency,
            momentum,
            magnitude,
        }
    }

    pub(crate) fn at_iteration(mut self, iteration: usize) -> Self {
        self.iteration = iteration;
        self
    }
}

impl fmt::Display for InstabilityFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at iteration {}", self.stage, self.iteration)?;
        if let Some(frequency) = self.frequency {
            write!(f, ", frequency index {}", frequency)?;
        }
        if let Some(momentum) = self.momentum {
            write!(f, ", momentum index {}", momentum)?;
        }
        write!(f, ": magnitude {:e}", self.magnitude)
    }
}

/// Denominators smaller than `epsilon` in magnitude are replaced by `epsilon` along their phase
#[derive(Copy, Clone, Debug)]
pub(crate) struct Guard {
    pub(crate) epsilon: f64,
}

impl Default for Guard {
    fn default() -> Self {
        Self::new(1e-12)
    }
}

impl Guard {
    pub(crate) fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    /// Return a safe denominator, and a flag when `value` had to be clamped
    pub(crate) fn denominator(
        &self,
        value: Complex64,
        stage: Stage,
        frequency: i64,
        momentum: Option<usize>,
    ) -> (Complex64, Option<InstabilityFlag>) {
        let magnitude = value.norm();
        if magnitude.is_finite() && magnitude >= self.epsilon {
            return (value, None);
        }
        let clamped = if magnitude.is_finite() && magnitude > 0_f64 {
            value * (self.epsilon / magnitude)
        } else {
            Complex64::new(self.epsilon, 0_f64)
        };
        (
            clamped,
            Some(InstabilityFlag::new(stage, Some(frequency), momentum, magnitude)),
        )
    }
}
