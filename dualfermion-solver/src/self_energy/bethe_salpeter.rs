use crate::Complex64;
use nalgebra::{DMatrix, DVector};
use ndarray::Array1;

/// Diagonal of `Γ - γ` where `Γ = [1 + T γ χ0]^{-1} γ` and `χ0` is diagonal in frequency
///
/// Returns `None` when the Bethe-Salpeter system is singular or its solution is not finite.
pub(crate) fn ladder_correction(
    gamma: &DMatrix<Complex64>,
    chi: &Array1<Complex64>,
    temperature: f64,
) -> Option<DVector<Complex64>> {
    let n = gamma.nrows();
    let kernel = DMatrix::from_fn(n, n, |a, b| {
        let identity = if a == b { 1_f64 } else { 0_f64 };
        Complex64::new(identity, 0_f64) + gamma[(a, b)] * chi[b] * temperature
    });
    let full = kernel.lu().solve(gamma)?;
    if full.iter().any(|value| !value.is_finite()) {
        return None;
    }
    Some(DVector::from_fn(n, |a, _| full[(a, a)] - gamma[(a, a)]))
}

#[cfg(test)]
mod test {
    use super::ladder_correction;
    use crate::Complex64;
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;
    use ndarray::Array1;

    #[test]
    fn scalar_ladder_is_a_geometric_series() {
        let gamma = DMatrix::from_element(1, 1, Complex64::new(2.0, 0.0));
        let chi = Array1::from(vec![Complex64::new(0.1, 0.0)]);
        let correction = ladder_correction(&gamma, &chi, 0.5).unwrap();
        // γ / (1 + Tγχ) - γ = 2 / 1.1 - 2
        assert_relative_eq!(correction[0].re, 2.0 / 1.1 - 2.0, epsilon = 1e-14);
    }

    #[test]
    fn weak_vertex_reduces_to_second_order() {
        let gamma = DMatrix::from_fn(3, 3, |a, b| {
            Complex64::new(1e-4 * (1.0 + a as f64), 1e-4 * (b as f64 - 1.0))
        });
        let chi = Array1::from(vec![
            Complex64::new(0.2, 0.1),
            Complex64::new(-0.3, 0.0),
            Complex64::new(0.05, -0.4),
        ]);
        let correction = ladder_correction(&gamma, &chi, 1.0).unwrap();
        for a in 0..3 {
            let second_order: Complex64 = (0..3).map(|b| -gamma[(a, b)] * chi[b] * gamma[(b, a)]).sum();
            assert_relative_eq!(correction[a].re, second_order.re, epsilon = 1e-11);
            assert_relative_eq!(correction[a].im, second_order.im, epsilon = 1e-11);
        }
    }

    #[test]
    fn singular_systems_are_reported() {
        let gamma = DMatrix::from_element(1, 1, Complex64::new(-1.0, 0.0));
        let chi = Array1::from(vec![Complex64::new(1.0, 0.0)]);
        assert!(ladder_correction(&gamma, &chi, 1.0).is_none());
    }
}
