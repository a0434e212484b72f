use super::InnerLoop;
use crate::{
    error::DualFermionError,
    greens_functions::{
        bare_dual_propagator, dual_dyson, hybridisation_candidate, lattice_greens_function,
    },
    instability::InstabilityFlag,
    self_energy::ladder_self_energy,
    LocalGreensFunction,
};

/// Result of a single pass
#[derive(Clone, Debug)]
pub(crate) struct PassOutcome {
    /// The unmixed hybridisation proposed by the pass
    pub(crate) candidate: LocalGreensFunction,
    /// Near-singular events raised by the kernels, iteration not yet assigned
    pub(crate) flags: Vec<InstabilityFlag>,
}

pub(crate) trait Inner {
    /// Carry out one pass at fixed `hybridisation`, proposing the hybridisation for the next
    fn single_iteration(
        &mut self,
        hybridisation: &LocalGreensFunction,
    ) -> Result<PassOutcome, DualFermionError>;
}

impl Inner for InnerLoop<'_> {
    #[tracing::instrument(name = "Dual fermion pass", level = "debug", skip_all)]
    fn single_iteration(
        &mut self,
        hybridisation: &LocalGreensFunction,
    ) -> Result<PassOutcome, DualFermionError> {
        let (bare, mut flags) = bare_dual_propagator(
            self.impurity,
            hybridisation,
            self.dispersion,
            self.mesh,
            self.guard,
        )?;

        tracing::debug!("Ladder self-energy");
        let (self_energy, ladder_flags) = ladder_self_energy(&bare, self.vertices, self.nbosonic);
        flags.extend(ladder_flags);

        tracing::debug!("Dyson equations");
        let (dressed, dual_flags) = dual_dyson(&bare, &self_energy, self.guard);
        flags.extend(dual_flags);
        let (lattice, lattice_flags) = lattice_greens_function(
            self.impurity,
            hybridisation,
            &self_energy,
            self.dispersion,
            self.mesh,
            self.guard,
        );
        flags.extend(lattice_flags);
        let glat_loc = lattice.momentum_average();

        let (candidate, update_flags) = hybridisation_candidate(
            self.impurity,
            hybridisation,
            &dressed.momentum_average(),
            &glat_loc,
            self.guard,
        );
        flags.extend(update_flags);

        self.self_energy = Some(self_energy);
        self.glat_loc = Some(glat_loc);
        Ok(PassOutcome { candidate, flags })
    }
}

#[cfg(test)]
mod test {
    use super::Inner;
    use crate::{
        greens_functions::embed_hybridisation,
        inner_loop::InnerLoopBuilder,
        instability::Guard,
        lattice::{CubicLattice, Dispersion},
        vertex::{Channel, Vertex},
        AtomicLimit,
    };
    use approx::assert_relative_eq;
    use dualfermion_mesh::{BosonicGrid, FermionicGrid, MomentumMesh};

    #[test]
    fn without_vertices_an_embedded_hybridisation_is_a_fixed_point() {
        let beta = 2.0;
        let fermionic = FermionicGrid::new(-6, 6, beta).unwrap();
        let bosonic = BosonicGrid::new(-1, 2, beta).unwrap();
        let mesh = MomentumMesh::new(12, 2).unwrap();
        let atom = AtomicLimit::new(6.0, beta);
        let g = atom.greens_function(&fermionic);
        let dispersion = CubicLattice::new(1.0, 2).tabulate(&mesh).unwrap();
        let guard = Guard::new(1e-12);
        let embedded = embed_hybridisation(
            &g,
            &atom.hybridisation(&g, 4.0),
            &dispersion,
            &mesh,
            guard,
            1e-12,
            100,
        )
        .unwrap();
        assert!(embedded.flags.is_empty());

        let density = Vertex::zeros(Channel::Density, &bosonic, &fermionic);
        let magnetic = Vertex::zeros(Channel::Magnetic, &bosonic, &fermionic);
        let mut pass = InnerLoopBuilder::new()
            .with_impurity_greens_function(&g)
            .with_dispersion(&dispersion)
            .with_mesh(&mesh)
            .with_vertices(&density, &magnetic)
            .with_guard(guard)
            .build();
        let outcome = pass.single_iteration(&embedded.hybridisation).unwrap();
        let (self_energy, glat_loc) = pass.into_results();

        assert!(outcome.flags.is_empty());
        assert!(self_energy
            .unwrap()
            .data()
            .iter()
            .all(|value| value.norm() == 0.0));
        assert_relative_eq!(
            outcome.candidate.max_diff(&embedded.hybridisation).unwrap(),
            0.0,
            epsilon = 1e-8
        );
        assert_relative_eq!(glat_loc.unwrap().max_diff(&g).unwrap(), 0.0, epsilon = 1e-10);
    }
}
