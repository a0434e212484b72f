//! # Lattices
//!
//! The engine only needs the band dispersion `ε(k)` evaluated on the momentum mesh, so lattices
//! are described by the `Dispersion` trait and tabulated once per run.

mod cubic;

pub use cubic::CubicLattice;

use crate::error::DualFermionError;
use dualfermion_mesh::MomentumMesh;
use ndarray::Array1;

/// A single band dispersion relation
pub trait Dispersion: Send + Sync {
    /// Number of spatial dimensions the momentum argument must have
    fn dimension(&self) -> usize;

    /// The band energy at momentum `k`, one component per dimension
    fn evaluate(&self, k: &[f64]) -> f64;

    /// Tabulate the dispersion over every point of `mesh`, in flat index order
    fn tabulate(&self, mesh: &MomentumMesh) -> Result<Array1<f64>, DualFermionError> {
        if mesh.dimension() != self.dimension() {
            return Err(DualFermionError::InvalidInput(format!(
                "a {} dimensional lattice cannot be evaluated on a {} dimensional momentum mesh",
                self.dimension(),
                mesh.dimension()
            )));
        }
        let table = mesh.tabulate(|k| self.evaluate(k));
        if table.iter().any(|energy| !energy.is_finite()) {
            return Err(DualFermionError::InvalidInput(
                "the dispersion is not finite on the momentum mesh".to_string(),
            ));
        }
        Ok(table)
    }
}
