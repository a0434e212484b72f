//! # Atomic limit
//!
//! Inputs for the Hubbard model expanded about the half filled Hubbard atom, the reference
//! problem for the engine. With `μ = U/2` the impurity Green's function is
//!
//! `g(ν) = 1/2 / (iν - U/2) + 1/2 / (iν + U/2)`
//!
//! and the static vertices factorise through `Λ(ν) = 1 - U² / (4 (iν)²)`,
//!
//! `γ_m(0; ν, ν') = β U²/4 Λ(ν) Λ(ν') (2 + δ_νν')`,
//! `γ_d(0; ν, ν') = -3 β U²/4 Λ(ν) Λ(ν') δ_νν'`,
//!
//! vanishing at finite bosonic frequency.

use crate::{
    vertex::{Channel, Vertex},
    Complex64, LocalGreensFunction,
};
use dualfermion_mesh::{BosonicGrid, FermionicGrid, FermionicPoint};
use num_traits::Zero;

/// The half filled Hubbard atom
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AtomicLimit {
    interaction: f64,
    beta: f64,
}

impl AtomicLimit {
    /// An atom with on-site repulsion `interaction` at inverse temperature `beta`
    pub fn new(interaction: f64, beta: f64) -> Self {
        Self { interaction, beta }
    }

    /// The on-site repulsion `U`
    pub fn interaction(&self) -> f64 {
        self.interaction
    }

    /// The chemical potential at half filling
    pub fn chemical_potential(&self) -> f64 {
        self.interaction / 2_f64
    }

    /// The impurity Green's function `g(ν)` on `grid`
    pub fn greens_function(&self, grid: &FermionicGrid) -> LocalGreensFunction {
        let half = self.interaction / 2_f64;
        LocalGreensFunction::from_fn(grid, |point| {
            0.5_f64 / (point.value() - half) + 0.5_f64 / (point.value() + half)
        })
    }

    /// A starting hybridisation proportional to the impurity Green's function, `Δ = coupling g`
    pub fn hybridisation(
        &self,
        greens_function: &LocalGreensFunction,
        coupling: f64,
    ) -> LocalGreensFunction {
        greens_function * coupling
    }

    /// `Λ(ν) = 1 - U² / (4 (iν)²)`
    pub fn lambda(&self, point: &FermionicPoint) -> Complex64 {
        let w = point.value();
        1_f64 - self.interaction * self.interaction / 4_f64 / (w * w)
    }

    fn scale(&self) -> f64 {
        self.beta * self.interaction * self.interaction / 4_f64
    }

    /// The magnetic vertex
    pub fn magnetic_vertex(&self, bosonic: &BosonicGrid, fermionic: &FermionicGrid) -> Vertex {
        let scale = self.scale();
        Vertex::from_fn(Channel::Magnetic, bosonic, fermionic, |w, a, b| {
            if w.index() != 0 {
                return Complex64::zero();
            }
            let diagonal = if a.index() == b.index() { 1_f64 } else { 0_f64 };
            scale * self.lambda(a) * self.lambda(b) * (2_f64 + diagonal)
        })
    }

    /// The density vertex
    pub fn density_vertex(&self, bosonic: &BosonicGrid, fermionic: &FermionicGrid) -> Vertex {
        let scale = self.scale();
        Vertex::from_fn(Channel::Density, bosonic, fermionic, |w, a, b| {
            if w.index() != 0 || a.index() != b.index() {
                return Complex64::zero();
            }
            -3_f64 * scale * self.lambda(a) * self.lambda(b)
        })
    }
}

#[cfg(test)]
mod test {
    use super::AtomicLimit;
    use approx::assert_relative_eq;
    use dualfermion_mesh::{BosonicGrid, FermionicGrid};

    #[test]
    fn greens_function_is_particle_hole_symmetric() {
        let grid = FermionicGrid::new(-5, 5, 3.0).unwrap();
        let g = AtomicLimit::new(4.0, 3.0).greens_function(&grid);
        for (point, value) in g.iter() {
            assert_relative_eq!(value.re, 0.0, epsilon = 1e-15);
            // g(-ν) = g(ν)*
            let mirror = g.at_index(-point.index() - 1).unwrap();
            assert_relative_eq!(mirror.im, -value.im, epsilon = 1e-15);
        }
    }

    #[test]
    fn vertices_only_live_at_zero_transfer() {
        let fermionic = FermionicGrid::new(-2, 2, 1.0).unwrap();
        let bosonic = BosonicGrid::new(-1, 2, 1.0).unwrap();
        let atom = AtomicLimit::new(16.0, 1.0);
        let magnetic = atom.magnetic_vertex(&bosonic, &fermionic);
        let density = atom.density_vertex(&bosonic, &fermionic);

        let zero = bosonic.find(0).unwrap();
        let one = bosonic.find(1).unwrap();
        let (a, b) = (fermionic.find(-1).unwrap(), fermionic.find(1).unwrap());
        assert_eq!(magnetic.eval(one, a, a).unwrap().norm(), 0.0);
        assert_eq!(density.eval(zero, a, b).unwrap().norm(), 0.0);

        // On the diagonal the magnetic vertex is -density
        let m = magnetic.eval(zero, a, a).unwrap();
        let d = density.eval(zero, a, a).unwrap();
        assert_relative_eq!(m.re, -d.re, max_relative = 1e-14);
        let expected = 64.0 * atom.lambda(a).re * atom.lambda(a).re * 3.0;
        assert_relative_eq!(m.re, expected, max_relative = 1e-14);
    }
}
