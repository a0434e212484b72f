//! # Two-particle vertices
//!
//! The reducible impurity vertex `γ(W, ν, ν')` in a single spin channel, tabulated over one
//! bosonic and two fermionic Matsubara grids. A vertex is filled once before a run and read
//! only during it.

use crate::Complex64;
use dualfermion_mesh::{BosonicGrid, BosonicPoint, FermionicGrid, FermionicPoint};
use nalgebra::DMatrix;
use ndarray::Array3;
use std::fmt;

/// The spin channel of a vertex
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Channel {
    /// Charge fluctuations, `γ↑↑ + γ↑↓`
    Density,
    /// Spin fluctuations, `γ↑↑ - γ↑↓`
    Magnetic,
}

impl Channel {
    /// Spin multiplicity of the channel in the ladder self-energy
    pub fn multiplicity(&self) -> f64 {
        match self {
            Channel::Density => 1_f64,
            Channel::Magnetic => 3_f64,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Density => write!(f, "density"),
            Channel::Magnetic => write!(f, "magnetic"),
        }
    }
}

/// A vertex function in one channel
#[derive(Clone, Debug, PartialEq)]
pub struct Vertex {
    channel: Channel,
    bosonic: BosonicGrid,
    fermionic: FermionicGrid,
    data: Array3<Complex64>,
}

impl Vertex {
    /// A vanishing vertex on `bosonic` x `fermionic` x `fermionic`
    pub fn zeros(channel: Channel, bosonic: &BosonicGrid, fermionic: &FermionicGrid) -> Self {
        Self {
            channel,
            bosonic: bosonic.clone(),
            fermionic: fermionic.clone(),
            data: Array3::zeros((bosonic.len(), fermionic.len(), fermionic.len())),
        }
    }

    /// Tabulate `function(W, ν, ν')`
    pub fn from_fn<F>(
        channel: Channel,
        bosonic: &BosonicGrid,
        fermionic: &FermionicGrid,
        function: F,
    ) -> Self
    where
        F: FnMut(&BosonicPoint, &FermionicPoint, &FermionicPoint) -> Complex64,
    {
        let mut vertex = Self::zeros(channel, bosonic, fermionic);
        vertex.fill(function);
        vertex
    }

    /// Overwrite every amplitude with `function(W, ν, ν')`
    pub fn fill<F>(&mut self, mut function: F)
    where
        F: FnMut(&BosonicPoint, &FermionicPoint, &FermionicPoint) -> Complex64,
    {
        let (bosonic, fermionic) = (&self.bosonic, &self.fermionic);
        for ((w, n1, n2), value) in self.data.indexed_iter_mut() {
            *value = function(
                &bosonic.points()[w],
                &fermionic.points()[n1],
                &fermionic.points()[n2],
            );
        }
    }

    /// The channel the vertex belongs to
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// The bosonic transfer frequencies
    pub fn bosonic_grid(&self) -> &BosonicGrid {
        &self.bosonic
    }

    /// The fermionic frequencies of both legs
    pub fn fermionic_grid(&self) -> &FermionicGrid {
        &self.fermionic
    }

    /// Amplitudes indexed by `[W, ν, ν']` grid positions
    pub fn data(&self) -> &Array3<Complex64> {
        &self.data
    }

    /// Evaluate at three Matsubara points, `None` off the grids
    pub fn eval(
        &self,
        bosonic: &BosonicPoint,
        first: &FermionicPoint,
        second: &FermionicPoint,
    ) -> Option<Complex64> {
        let w = self.bosonic.position_of(bosonic.index())?;
        let n1 = self.fermionic.position_of(first.index())?;
        let n2 = self.fermionic.position_of(second.index())?;
        Some(self.data[[w, n1, n2]])
    }

    /// The fermionic matrix `γ(ν, ν')` at the bosonic grid position `w`
    pub fn matrix_at(&self, w: usize) -> DMatrix<Complex64> {
        let n = self.fermionic.len();
        DMatrix::from_fn(n, n, |i, j| self.data[[w, i, j]])
    }

    /// Whether every amplitude is finite
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|value| value.is_finite())
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} vertex on {} x {}",
            self.channel, self.bosonic, self.fermionic
        )
    }
}

/// Bosonic grid positions summed in the ladder: indices `-(nbosonic - 1)..=nbosonic - 1` which
/// the vertex grid contains
pub(crate) fn bosonic_window(grid: &BosonicGrid, nbosonic: usize) -> Vec<BosonicPoint> {
    // The window never reaches past the grid, however large `nbosonic` is
    let half_width = nbosonic.saturating_sub(1) as u64;
    grid.iter()
        .filter(|point| point.index().unsigned_abs() <= half_width)
        .copied()
        .collect()
}
