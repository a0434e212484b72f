use crate::{
    instability::{Guard, InstabilityFlag, Stage},
    LocalGreensFunction,
};
use itertools::izip;

/// The dual fermion hybridisation update `Δ + g^{-1} G_d,loc G_loc^{-1}`
///
/// `dual_local` is the momentum average of the dressed dual propagator and `lattice_local` that
/// of the lattice Green's function. Both vanish in the local part exactly when the lattice is
/// self-consistent, in which case `Δ` is returned unchanged.
pub(crate) fn hybridisation_candidate(
    impurity: &LocalGreensFunction,
    hybridisation: &LocalGreensFunction,
    dual_local: &LocalGreensFunction,
    lattice_local: &LocalGreensFunction,
    guard: Guard,
) -> (LocalGreensFunction, Vec<InstabilityFlag>) {
    let mut candidate = hybridisation.clone();
    let mut flags = Vec::new();
    for (point, value, &g, &dual, &lattice) in izip!(
        impurity.grid().iter(),
        candidate.data_mut().iter_mut(),
        impurity.data().iter(),
        dual_local.data().iter(),
        lattice_local.data().iter()
    ) {
        let (denominator, flag) = guard.denominator(
            g * lattice,
            Stage::HybridisationUpdate,
            point.index(),
            None,
        );
        flags.extend(flag);
        *value += dual / denominator;
    }
    (candidate, flags)
}

#[cfg(test)]
mod test {
    use super::hybridisation_candidate;
    use crate::{instability::Guard, Complex64, LocalGreensFunction};
    use dualfermion_mesh::FermionicGrid;

    #[test]
    fn vanishing_dual_function_leaves_the_hybridisation_unchanged() {
        let grid = FermionicGrid::new(-3, 3, 1.0).unwrap();
        let g = LocalGreensFunction::from_fn(&grid, |point| 1_f64 / point.value());
        let delta = LocalGreensFunction::from_fn(&grid, |point| 0.5_f64 / point.value());
        let zero = LocalGreensFunction::zeros(&grid);
        let (candidate, flags) = hybridisation_candidate(&g, &delta, &zero, &g, Guard::new(1e-12));
        assert!(flags.is_empty());
        assert_eq!(candidate, delta);
    }

    #[test]
    fn update_is_pointwise() {
        let grid = FermionicGrid::new(-1, 1, 1.0).unwrap();
        let constant = |value: Complex64| LocalGreensFunction::from_fn(&grid, |_| value);
        let (candidate, _) = hybridisation_candidate(
            &constant(Complex64::new(0.0, -2.0)),
            &constant(Complex64::new(1.0, 0.0)),
            &constant(Complex64::new(0.5, 0.0)),
            &constant(Complex64::new(0.0, 0.25)),
            Guard::new(1e-12),
        );
        // 1 + 0.5 / (-2i * 0.25i) = 1 + 0.5 / 0.5
        assert_eq!(candidate.get(0).unwrap(), Complex64::new(2.0, 0.0));
    }
}
