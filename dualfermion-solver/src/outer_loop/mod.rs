//! # Outer loop
//!
//! The self-consistency state machine. Each iteration hands the current hybridisation to an
//! [`Inner`] pass, mixes the proposed candidate into it and records the change. The loop stops
//! once the change falls below the convergence threshold, once the iteration budget is used, or
//! early when the run is cancelled, diverges, or meets an instability in strict mode.

mod convergence;
mod methods;

pub(crate) use convergence::Convergence;
pub(crate) use methods::Outer;

use crate::{inner_loop::Inner, instability::InstabilityFlag, LocalGreensFunction};
use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

/// Where a run is in its lifecycle
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// Inputs validated, no pass carried out
    Initialized,
    /// Passes in progress
    Iterating,
    /// The residual fell below the convergence threshold
    Converged,
    /// Every requested pass was carried out
    MaxIterReached,
    /// Stopped between passes by a cancellation token
    Cancelled,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoopState::Initialized => "initialized",
            LoopState::Iterating => "iterating",
            LoopState::Converged => "converged",
            LoopState::MaxIterReached => "maximum iterations reached",
            LoopState::Cancelled => "cancelled",
        };
        write!(f, "{}", name)
    }
}

/// Cooperative cancellation, checked before every pass
///
/// Clones share the same flag, so a token handed to a running engine can be fired from another
/// thread.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// A token which has not fired
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the run stops before its next pass
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The state carried between passes
pub(crate) struct OuterLoop<'a, I> {
    inner: &'a mut I,
    convergence: &'a Convergence,
    cancellation: Option<&'a CancellationToken>,
    hybridisation: LocalGreensFunction,
    state: LoopState,
    iteration: usize,
    residuals: Vec<f64>,
    flags: Vec<InstabilityFlag>,
}

/// Everything the loop accumulated, released once it stops
#[derive(Clone, Debug)]
pub(crate) struct LoopRecord {
    pub(crate) hybridisation: LocalGreensFunction,
    pub(crate) state: LoopState,
    pub(crate) residuals: Vec<f64>,
    pub(crate) flags: Vec<InstabilityFlag>,
}

impl<'a, I: Inner> OuterLoop<'a, I> {
    pub(crate) fn new(
        inner: &'a mut I,
        convergence: &'a Convergence,
        hybridisation: LocalGreensFunction,
    ) -> Self {
        Self {
            inner,
            convergence,
            cancellation: None,
            hybridisation,
            state: LoopState::Initialized,
            iteration: 0,
            residuals: Vec::new(),
            flags: Vec::new(),
        }
    }

    pub(crate) fn with_cancellation(mut self, token: Option<&'a CancellationToken>) -> Self {
        self.cancellation = token;
        self
    }

    pub(crate) fn state(&self) -> LoopState {
        self.state
    }

    pub(crate) fn into_record(self) -> LoopRecord {
        LoopRecord {
            hybridisation: self.hybridisation,
            state: self.state,
            residuals: self.residuals,
            flags: self.flags,
        }
    }
}
