// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! A dual fermion solver for the single band Hubbard model written in Rust
//!
//! # Overview
//! The dual fermion approach ([Rubtsov 2008](https://doi.org/10.1103/PhysRevB.77.033101)) treats
//! non-local correlations in the Hubbard model perturbatively about an auxiliary impurity problem.
//! Given the impurity Green's function, a hybridisation function and the impurity two-particle
//! vertices in the density and magnetic channels, the solver builds the bare dual propagator,
//! dresses it with the ladder dual self-energy, maps the result back onto the lattice and updates
//! the hybridisation. Iterating the last step to self-consistency yields the lattice Green's
//! function beyond dynamical mean field theory.
//!
//! # Usage
//! The library is driven through a [`DualFermionBuilder`]. A command line front end runs the
//! half filled Hubbard atom on a hypercubic lattice, configured through a `.toml` file:
//!
//! ```toml
//! [model]
//! interaction = 16.0
//! beta = 1.0
//! wmax = 4
//!
//! [solver]
//! df_sc_mix = 1.0
//! df_sc_iter = 1
//! ```
//!
//! where any field which is omitted falls back to `.config/default.toml`.

#![warn(missing_docs)]

/// The command line application, configuration and tracing
pub mod app;

/// Inputs for the half filled Hubbard atom
mod atomic;

/// The engine and its builder
mod dual_fermion;

/// Error handling
mod error;

/// Single particle propagators and Dyson equations
mod greens_functions;

/// A single dual fermion pass
mod inner_loop;

/// Near-singular denominators
mod instability;

/// Lattice dispersions
pub mod lattice;

/// The self-consistency state machine
mod outer_loop;

/// The ladder dual self-energy
mod self_energy;

/// Two-particle vertices
mod vertex;

pub use atomic::AtomicLimit;
pub use dual_fermion::{
    DualFermion, DualFermionBuilder, EmbeddingSettings, EmbeddingSummary, RunParameters,
    RunReport,
};
pub use dualfermion_mesh::{
    BosonicGrid, Complex64, Fermionic, FermionicGrid, LatticeFunction, MatsubaraFunction,
    MomentumMesh,
};
pub use error::DualFermionError;
pub use instability::{InstabilityFlag, Stage};
pub use outer_loop::{CancellationToken, LoopState};
pub use vertex::{Channel, Vertex};

/// A function of a single fermionic frequency, such as `g(ν)`, `Δ(ν)` or `G_loc(ν)`
pub type LocalGreensFunction = MatsubaraFunction<Fermionic>;
