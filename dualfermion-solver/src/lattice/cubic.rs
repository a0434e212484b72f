use super::Dispersion;

/// Nearest neighbour tight binding on a hypercubic lattice, `ε(k) = -2t Σ_d cos(k_d)`
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CubicLattice {
    hopping: f64,
    dimension: usize,
}

impl CubicLattice {
    /// A `dimension` dimensional lattice with nearest neighbour hopping `hopping`
    pub fn new(hopping: f64, dimension: usize) -> Self {
        Self { hopping, dimension }
    }

    /// The hopping amplitude `t`
    pub fn hopping(&self) -> f64 {
        self.hopping
    }

    /// Half the bandwidth, `2dt`
    pub fn half_bandwidth(&self) -> f64 {
        2_f64 * self.dimension as f64 * self.hopping.abs()
    }
}

impl Dispersion for CubicLattice {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn evaluate(&self, k: &[f64]) -> f64 {
        -2_f64 * self.hopping * k.iter().map(|component| component.cos()).sum::<f64>()
    }
}
