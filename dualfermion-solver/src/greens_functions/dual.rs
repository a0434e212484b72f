use super::{invert_guarded, inverse_impurity};
use crate::{
    error::DualFermionError,
    instability::{Guard, InstabilityFlag, Stage},
    LocalGreensFunction,
};
use dualfermion_mesh::{LatticeFunction, MomentumMesh};
use ndarray::Array1;

/// The bare dual propagator `G0(ν, k) = [g^{-1} + Δ - ε(k)]^{-1} - g`
pub(crate) fn bare_dual_propagator(
    impurity: &LocalGreensFunction,
    hybridisation: &LocalGreensFunction,
    dispersion: &Array1<f64>,
    mesh: &MomentumMesh,
    guard: Guard,
) -> Result<(LatticeFunction, Vec<InstabilityFlag>), DualFermionError> {
    let inverse_impurity = inverse_impurity(impurity)?;
    let (mut propagator, flags) =
        invert_guarded(impurity.grid(), mesh, guard, Stage::BareDual, |i, k| {
            inverse_impurity[i] + hybridisation.data()[i] - dispersion[k]
        });
    for (mut column, g) in propagator
        .data_mut()
        .outer_iter_mut()
        .zip(impurity.data().iter())
    {
        column.mapv_inplace(|value| value - *g);
    }
    Ok((propagator, flags))
}

#[cfg(test)]
mod test {
    use super::bare_dual_propagator;
    use crate::{
        error::DualFermionError,
        instability::Guard,
        lattice::{CubicLattice, Dispersion},
        AtomicLimit, Complex64, LocalGreensFunction,
    };
    use approx::assert_relative_eq;
    use dualfermion_mesh::{FermionicGrid, MomentumMesh};

    #[test]
    fn bare_propagator_matches_the_closed_form() {
        let grid = FermionicGrid::new(-4, 4, 1.0).unwrap();
        let mesh = MomentumMesh::new(6, 2).unwrap();
        let dispersion = CubicLattice::new(1.0, 2).tabulate(&mesh).unwrap();
        let atomic = AtomicLimit::new(16.0, 1.0);
        let g = atomic.greens_function(&grid);
        let delta = atomic.hybridisation(&g, 4.0);

        let (propagator, flags) =
            bare_dual_propagator(&g, &delta, &dispersion, &mesh, Guard::new(1e-12)).unwrap();
        assert!(flags.is_empty());
        for (i, point) in grid.iter().enumerate() {
            let g = g.eval(point).unwrap();
            let delta = delta.eval(point).unwrap();
            for k in 0..mesh.len() {
                let expected = 1_f64 / (1_f64 / g + delta - dispersion[k]) - g;
                let value = propagator.get(i, k).unwrap();
                assert_relative_eq!(value.re, expected.re, epsilon = 1e-14);
                assert_relative_eq!(value.im, expected.im, epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn vanishing_impurity_function_is_invalid() {
        let grid = FermionicGrid::new(-2, 2, 1.0).unwrap();
        let mesh = MomentumMesh::new(4, 1).unwrap();
        let dispersion = CubicLattice::new(1.0, 1).tabulate(&mesh).unwrap();
        let mut g = LocalGreensFunction::from_fn(&grid, |point| 1_f64 / point.value());
        g.data_mut()[1] = Complex64::new(0.0, 0.0);
        let delta = LocalGreensFunction::zeros(&grid);
        let result = bare_dual_propagator(&g, &delta, &dispersion, &mesh, Guard::new(1e-12));
        assert!(matches!(result, Err(DualFermionError::InvalidInput(_))));
    }
}
