//! # Momentum meshes
//!
//! A uniform mesh over the Brillouin zone of a hypercubic lattice with `points` samples
//! `k_i = 2πi / points` along each of `dimension` axes. Momentum tuples are addressed by a flat
//! row-major index, the first axis varying slowest.

use crate::MeshError;
use ndarray::Array1;
use std::f64::consts::PI;

#[derive(Clone, Debug, PartialEq)]
/// Uniform periodic momentum mesh of runtime dimension
pub struct MomentumMesh {
    points: usize,
    dimension: usize,
    axis: Vec<f64>,
    len: usize,
}

impl MomentumMesh {
    /// A mesh with `points` samples along each of `dimension` axes
    pub fn new(points: usize, dimension: usize) -> Result<Self, MeshError> {
        let len = u32::try_from(dimension)
            .ok()
            .and_then(|dimension| points.checked_pow(dimension))
            .filter(|&len| len > 0 && dimension > 0)
            .ok_or(MeshError::EmptyMomentumMesh { points, dimension })?;
        let axis = (0..points)
            .map(|i| 2_f64 * PI * i as f64 / points as f64)
            .collect();
        Ok(Self {
            points,
            dimension,
            axis,
            len,
        })
    }

    /// Samples along a single axis
    pub fn points_per_dimension(&self) -> usize {
        self.points
    }

    /// Number of spatial dimensions
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Total number of momentum tuples
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false for a successfully constructed mesh
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The one dimensional sample points
    pub fn axis(&self) -> &[f64] {
        &self.axis
    }

    /// Decompose a flat index into one index per axis
    pub fn coordinates(&self, flat: usize) -> Vec<usize> {
        let mut coordinates = vec![0; self.dimension];
        let mut remainder = flat;
        for coordinate in coordinates.iter_mut().rev() {
            *coordinate = remainder % self.points;
            remainder /= self.points;
        }
        coordinates
    }

    /// Recompose per-axis indices into a flat index, wrapping each periodically
    pub fn flat_index(&self, coordinates: &[usize]) -> usize {
        coordinates
            .iter()
            .fold(0, |flat, &coordinate| flat * self.points + coordinate % self.points)
    }

    /// The momentum tuple at a flat index
    pub fn momentum(&self, flat: usize) -> Vec<f64> {
        self.coordinates(flat)
            .into_iter()
            .map(|coordinate| self.axis[coordinate])
            .collect()
    }

    /// The flat index of `k + q`, folded back into the first Brillouin zone
    pub fn add(&self, k: usize, q: usize) -> usize {
        let mut flat = 0;
        let mut stride = 1;
        let (mut k, mut q) = (k, q);
        for _ in 0..self.dimension {
            let component = (k % self.points + q % self.points) % self.points;
            flat += component * stride;
            stride *= self.points;
            k /= self.points;
            q /= self.points;
        }
        flat
    }

    /// Evaluate `function` at every momentum tuple, in flat index order
    pub fn tabulate<F>(&self, function: F) -> Array1<f64>
    where
        F: Fn(&[f64]) -> f64,
    {
        (0..self.len)
            .map(|flat| function(&self.momentum(flat)))
            .collect()
    }
}
