//! # Matsubara grids
//!
//! Finite windows of Matsubara frequencies `iπ(2n + ζ)/β` where `ζ = 1` for fermions and
//! `ζ = 0` for bosons. A grid is described by a half-open window of Matsubara indices
//! `[min, max)`, so the fermionic grid `[-wmax, wmax)` is symmetric about zero frequency.

use crate::{Complex64, MeshError};
use std::{f64::consts::PI, fmt, marker::PhantomData};

/// The exchange statistics of a Matsubara grid
pub trait Statistics:
    Copy + Clone + fmt::Debug + PartialEq + Eq + Send + Sync + 'static
{
    /// Offset of the frequency numerator, `1` for fermions and `0` for bosons
    const ZETA: i64;
    /// A human readable label
    const NAME: &'static str;
}

/// Marker for antiperiodic, fermionic, frequencies
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Fermionic;

/// Marker for periodic, bosonic, frequencies
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Bosonic;

impl Statistics for Fermionic {
    const ZETA: i64 = 1;
    const NAME: &'static str = "fermionic";
}

impl Statistics for Bosonic {
    const ZETA: i64 = 0;
    const NAME: &'static str = "bosonic";
}

/// A single point of a `MatsubaraGrid`
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MatsubaraPoint<S> {
    position: usize,
    index: i64,
    value: Complex64,
    marker: PhantomData<S>,
}

impl<S: Statistics> MatsubaraPoint<S> {
    /// The location of the point in its parent grid
    pub fn position(&self) -> usize {
        self.position
    }

    /// The Matsubara index `n`
    pub fn index(&self) -> i64 {
        self.index
    }

    /// The frequency `iπ(2n + ζ)/β`
    pub fn value(&self) -> Complex64 {
        self.value
    }

    /// The imaginary part of the frequency
    pub fn imag(&self) -> f64 {
        self.value.im
    }
}

/// A fermionic Matsubara point
pub type FermionicPoint = MatsubaraPoint<Fermionic>;
/// A bosonic Matsubara point
pub type BosonicPoint = MatsubaraPoint<Bosonic>;

/// A contiguous window of Matsubara frequencies at fixed inverse temperature
#[derive(Clone, Debug, PartialEq)]
pub struct MatsubaraGrid<S> {
    beta: f64,
    min: i64,
    points: Vec<MatsubaraPoint<S>>,
}

/// Grid of fermionic frequencies
pub type FermionicGrid = MatsubaraGrid<Fermionic>;
/// Grid of bosonic frequencies
pub type BosonicGrid = MatsubaraGrid<Bosonic>;

impl<S: Statistics> MatsubaraGrid<S> {
    /// Build the grid over the indices `min..max` at inverse temperature `beta`
    pub fn new(min: i64, max: i64, beta: f64) -> Result<Self, MeshError> {
        if !(beta.is_finite() && beta > 0_f64) {
            return Err(MeshError::NonPositiveTemperature(beta));
        }
        if min >= max {
            return Err(MeshError::EmptyGrid { min, max });
        }
        let points = (min..max)
            .enumerate()
            .map(|(position, index)| MatsubaraPoint {
                position,
                index,
                value: Self::frequency(index, beta),
                marker: PhantomData,
            })
            .collect();
        Ok(Self { beta, min, points })
    }

    /// The complex frequency associated with Matsubara index `index`
    pub fn frequency(index: i64, beta: f64) -> Complex64 {
        Complex64::new(0_f64, PI * (2 * index + S::ZETA) as f64 / beta)
    }

    /// The inverse temperature
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// The lowest Matsubara index in the grid
    pub fn min_index(&self) -> i64 {
        self.min
    }

    /// One past the highest Matsubara index in the grid
    pub fn max_index(&self) -> i64 {
        self.min + self.points.len() as i64
    }

    /// Number of frequencies
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a successfully constructed grid
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All points in ascending index order
    pub fn points(&self) -> &[MatsubaraPoint<S>] {
        &self.points
    }

    /// Iterate over the points in ascending index order
    pub fn iter(&self) -> std::slice::Iter<'_, MatsubaraPoint<S>> {
        self.points.iter()
    }

    /// The point stored at `position`
    pub fn point(&self, position: usize) -> Option<&MatsubaraPoint<S>> {
        self.points.get(position)
    }

    /// The position of the Matsubara index `index`, if the grid contains it
    pub fn position_of(&self, index: i64) -> Option<usize> {
        let offset = index - self.min;
        (offset >= 0 && offset < self.points.len() as i64).then(|| offset as usize)
    }

    /// The point with Matsubara index `index`, if the grid contains it
    pub fn find(&self, index: i64) -> Option<&MatsubaraPoint<S>> {
        self.position_of(index).map(|position| &self.points[position])
    }

    /// Whether `other` covers the same window at the same temperature
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.min == other.min
            && self.points.len() == other.points.len()
            && (self.beta - other.beta).abs() <= f64::EPSILON * self.beta.max(1_f64)
    }

    /// Fail with a `GridMismatch` unless `other` is compatible with `self`
    pub fn ensure_compatible(&self, other: &Self) -> Result<(), MeshError> {
        if self.is_compatible(other) {
            Ok(())
        } else {
            Err(MeshError::GridMismatch(format!("{} is not {}", other, self)))
        }
    }
}

impl<'a, S: Statistics> IntoIterator for &'a MatsubaraGrid<S> {
    type Item = &'a MatsubaraPoint<S>;
    type IntoIter = std::slice::Iter<'a, MatsubaraPoint<S>>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl<S: Statistics> fmt::Display for MatsubaraGrid<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} grid [{}, {}) at beta = {}",
            S::NAME,
            self.min_index(),
            self.max_index(),
            self.beta
        )
    }
}

#[cfg(test)]
mod test {
    use super::{BosonicGrid, FermionicGrid};
    use crate::MeshError;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn fermionic_frequencies_are_odd_multiples() {
        let beta = 2.5;
        let grid = FermionicGrid::new(-4, 4, beta).unwrap();
        assert_eq!(grid.len(), 8);
        for point in grid.iter() {
            let multiple = point.imag() * beta / PI;
            assert_relative_eq!(multiple, (2 * point.index() + 1) as f64, epsilon = 1e-12);
            assert_eq!(point.value().re, 0_f64);
        }
        // The window is symmetric about zero frequency
        let first = grid.point(0).unwrap().imag();
        let last = grid.point(grid.len() - 1).unwrap().imag();
        assert_relative_eq!(first, -last);
    }

    #[test]
    fn bosonic_frequencies_are_even_multiples() {
        let grid = BosonicGrid::new(-1, 2, 1.0).unwrap();
        let indices: Vec<i64> = grid.iter().map(|p| p.index()).collect();
        assert_eq!(indices, vec![-1, 0, 1]);
        assert_eq!(grid.find(0).unwrap().imag(), 0_f64);
        assert_relative_eq!(grid.find(1).unwrap().imag(), 2_f64 * PI);
    }

    #[test]
    fn lookup_outside_window_is_none() {
        let grid = FermionicGrid::new(-3, 3, 1.0).unwrap();
        assert_eq!(grid.position_of(-3), Some(0));
        assert_eq!(grid.position_of(2), Some(5));
        assert!(grid.position_of(3).is_none());
        assert!(grid.find(-4).is_none());
        assert_eq!(grid.max_index(), 3);
    }

    #[test]
    fn empty_window_is_rejected() {
        let result = FermionicGrid::new(0, 0, 1.0);
        assert!(matches!(result, Err(MeshError::EmptyGrid { min: 0, max: 0 })));
    }

    #[test]
    fn non_positive_beta_is_rejected() {
        assert!(matches!(
            FermionicGrid::new(-2, 2, 0.0),
            Err(MeshError::NonPositiveTemperature(_))
        ));
        assert!(FermionicGrid::new(-2, 2, f64::NAN).is_err());
    }

    #[test]
    fn compatibility_checks_window_and_temperature() {
        let grid = FermionicGrid::new(-2, 2, 1.0).unwrap();
        assert!(grid.is_compatible(&FermionicGrid::new(-2, 2, 1.0).unwrap()));
        assert!(!grid.is_compatible(&FermionicGrid::new(-3, 3, 1.0).unwrap()));
        assert!(grid
            .ensure_compatible(&FermionicGrid::new(-2, 2, 2.0).unwrap())
            .is_err());
    }
}
