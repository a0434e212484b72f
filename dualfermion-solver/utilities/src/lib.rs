//! Shared fixtures for the integration tests and benchmarks

use dualfermion_solver::{
    lattice::CubicLattice, AtomicLimit, BosonicGrid, Complex64, FermionicGrid, LocalGreensFunction,
    MomentumMesh, Vertex,
};
use rand::{thread_rng, Rng};

/// Every input of the half filled Hubbard atom on a hypercubic lattice
pub struct AtomicProblem {
    pub fermionic: FermionicGrid,
    pub bosonic: BosonicGrid,
    pub lattice: CubicLattice,
    pub mesh: MomentumMesh,
    pub impurity: LocalGreensFunction,
    pub hybridisation: LocalGreensFunction,
    pub density: Vertex,
    pub magnetic: Vertex,
}

/// The atom with repulsion `interaction` at inverse temperature `beta`, keeping fermionic
/// indices `[-wmax, wmax)` and `kpoints` momenta along each of two axes
pub fn construct_atomic_problem(
    interaction: f64,
    beta: f64,
    wmax: i64,
    kpoints: usize,
) -> AtomicProblem {
    let fermionic = FermionicGrid::new(-wmax, wmax, beta).unwrap();
    let bosonic = BosonicGrid::new(-1, 2, beta).unwrap();
    let lattice = CubicLattice::new(1.0, 2);
    let mesh = MomentumMesh::new(kpoints, 2).unwrap();
    let atom = AtomicLimit::new(interaction, beta);
    let impurity = atom.greens_function(&fermionic);
    let hybridisation = atom.hybridisation(&impurity, lattice.half_bandwidth());
    AtomicProblem {
        density: atom.density_vertex(&bosonic, &fermionic),
        magnetic: atom.magnetic_vertex(&bosonic, &fermionic),
        fermionic,
        bosonic,
        lattice,
        mesh,
        impurity,
        hybridisation,
    }
}

/// A function with independent uniformly distributed components in `[-scale, scale)`
pub fn construct_random_function(grid: &FermionicGrid, scale: f64) -> LocalGreensFunction {
    let mut rng = thread_rng();
    LocalGreensFunction::from_fn(grid, |_| {
        Complex64::new(rng.gen_range(-scale..scale), rng.gen_range(-scale..scale))
    })
}
