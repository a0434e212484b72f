// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Dual fermion mesh
//!
//! The discrete spaces a dual fermion calculation is tabulated on: Matsubara frequency grids,
//! uniform momentum meshes over the Brillouin zone, and the complex valued containers defined
//! on them.

#![warn(missing_docs)]

mod error;
mod function;
mod matsubara;
mod momentum;

pub use error::MeshError;
pub use function::{LatticeFunction, MatsubaraFunction};
pub use matsubara::{
    Bosonic, BosonicGrid, BosonicPoint, Fermionic, FermionicGrid, FermionicPoint, MatsubaraGrid,
    MatsubaraPoint, Statistics,
};
pub use momentum::MomentumMesh;

/// The complex scalar used throughout
pub type Complex64 = num_complex::Complex<f64>;
