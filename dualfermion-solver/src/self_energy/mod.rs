//! # Dual self-energy
//!
//! The dual self-energy in the ladder approximation. For every bosonic transfer frequency `W` in
//! the window and every transfer momentum `q` the particle-hole bubble of the dual propagator
//! is dressed with the impurity vertex through the Bethe-Salpeter equation in the density and
//! magnetic channels,
//!
//! `Γ_α(q, W) = [1 + T γ_α(W) χ0(q, W)]^{-1} γ_α(W)`,
//!
//! and closed with one more dual propagator,
//!
//! `Σ(ν, k) = T / (2N) Σ_{q,W} Σ_α A_α [Γ_α - γ_α](ν, ν; q, W) G(ν + W, k + q)`
//!
//! with multiplicities `A_d = 1` and `A_m = 3`. Subtracting the bare vertex removes the second
//! order diagram which both channels would otherwise count.
//!
//! The per momentum kernels and the final contraction are independent over their output points
//! and are evaluated in parallel with `rayon`.

mod bethe_salpeter;
mod bubble;
mod ladder;

pub(crate) use ladder::ladder_self_energy;

use crate::vertex::Vertex;
use dualfermion_mesh::FermionicGrid;

/// The two vertices entering the ladder
#[derive(Copy, Clone, Debug)]
pub(crate) struct Vertices<'a> {
    pub(crate) density: &'a Vertex,
    pub(crate) magnetic: &'a Vertex,
}

impl<'a> Vertices<'a> {
    pub(crate) fn iter(&self) -> impl Iterator<Item = &'a Vertex> {
        [self.density, self.magnetic].into_iter()
    }
}

/// Grid position of `ν + W` for every fermionic position, `None` where it leaves the grid
pub(crate) fn shifted_positions(grid: &FermionicGrid, transfer: i64) -> Vec<Option<usize>> {
    grid.iter()
        .map(|point| grid.position_of(point.index() + transfer))
        .collect()
}
