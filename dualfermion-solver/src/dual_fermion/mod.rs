//! # Dual fermion engine
//!
//! The entry point of the library. A [`DualFermionBuilder`] collects the impurity Green's
//! function, the starting hybridisation, the lattice, the momentum mesh and the two vertices.
//! `build` validates them against one another and tabulates the dispersion. Each call to
//! [`DualFermion::run`] then iterates the dual fermion self-consistency from the supplied
//! hybridisation, optionally embedding it in the lattice first, and leaves the final
//! propagators and a [`RunReport`] behind.
//!
//! ```no_run
//! use dualfermion_solver::{
//!     lattice::CubicLattice, AtomicLimit, BosonicGrid, DualFermionBuilder, FermionicGrid,
//!     MomentumMesh, RunParameters,
//! };
//!
//! # fn main() -> Result<(), dualfermion_solver::DualFermionError> {
//! let atom = AtomicLimit::new(16.0, 1.0);
//! let fermionic = FermionicGrid::new(-4, 4, 1.0)?;
//! let bosonic = BosonicGrid::new(-1, 2, 1.0)?;
//! let lattice = CubicLattice::new(1.0, 2);
//! let mesh = MomentumMesh::new(16, 2)?;
//!
//! let g = atom.greens_function(&fermionic);
//! let delta = atom.hybridisation(&g, lattice.half_bandwidth());
//! let density = atom.density_vertex(&bosonic, &fermionic);
//! let magnetic = atom.magnetic_vertex(&bosonic, &fermionic);
//!
//! let mut engine = DualFermionBuilder::new()
//!     .with_impurity_greens_function(&g)
//!     .with_hybridisation(&delta)
//!     .with_lattice(&lattice)
//!     .with_momentum_mesh(&mesh)
//!     .with_vertices(&density, &magnetic)
//!     .build()?;
//! let delta = engine.run(&RunParameters::default())?;
//! # Ok(())
//! # }
//! ```

mod parameters;
mod report;

pub use parameters::{EmbeddingSettings, RunParameters};
pub use report::{EmbeddingSummary, RunReport};

use crate::{
    error::DualFermionError,
    greens_functions::{embed_hybridisation, inverse_impurity},
    inner_loop::InnerLoopBuilder,
    instability::Guard,
    lattice::Dispersion,
    outer_loop::{CancellationToken, Convergence, Outer, OuterLoop},
    vertex::{Channel, Vertex},
    LocalGreensFunction,
};
use dualfermion_mesh::{LatticeFunction, MomentumMesh};
use ndarray::Array1;

/// Builder for the engine, populated field by field so `build` is only reachable once every
/// input is attached
pub struct DualFermionBuilder<RefImpurity, RefHybridisation, RefLattice, RefMesh, RefVertices> {
    impurity: RefImpurity,
    hybridisation: RefHybridisation,
    lattice: RefLattice,
    mesh: RefMesh,
    vertices: RefVertices,
}

impl DualFermionBuilder<(), (), (), (), ()> {
    /// Initialise an empty builder
    pub fn new() -> Self {
        Self {
            impurity: (),
            hybridisation: (),
            lattice: (),
            mesh: (),
            vertices: (),
        }
    }
}

impl Default for DualFermionBuilder<(), (), (), (), ()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<RefImpurity, RefHybridisation, RefLattice, RefMesh, RefVertices>
    DualFermionBuilder<RefImpurity, RefHybridisation, RefLattice, RefMesh, RefVertices>
{
    /// Attach the impurity Green's function `g(ν)`
    pub fn with_impurity_greens_function<Impurity>(
        self,
        impurity: &Impurity,
    ) -> DualFermionBuilder<&Impurity, RefHybridisation, RefLattice, RefMesh, RefVertices> {
        DualFermionBuilder {
            impurity,
            hybridisation: self.hybridisation,
            lattice: self.lattice,
            mesh: self.mesh,
            vertices: self.vertices,
        }
    }

    /// Attach the starting hybridisation `Δ(ν)`
    pub fn with_hybridisation<Hybridisation>(
        self,
        hybridisation: &Hybridisation,
    ) -> DualFermionBuilder<RefImpurity, &Hybridisation, RefLattice, RefMesh, RefVertices> {
        DualFermionBuilder {
            impurity: self.impurity,
            hybridisation,
            lattice: self.lattice,
            mesh: self.mesh,
            vertices: self.vertices,
        }
    }

    /// Attach the lattice providing the dispersion `ε(k)`
    pub fn with_lattice<Lattice>(
        self,
        lattice: &Lattice,
    ) -> DualFermionBuilder<RefImpurity, RefHybridisation, &Lattice, RefMesh, RefVertices> {
        DualFermionBuilder {
            impurity: self.impurity,
            hybridisation: self.hybridisation,
            lattice,
            mesh: self.mesh,
            vertices: self.vertices,
        }
    }

    /// Attach the Brillouin zone sampling
    pub fn with_momentum_mesh<Mesh>(
        self,
        mesh: &Mesh,
    ) -> DualFermionBuilder<RefImpurity, RefHybridisation, RefLattice, &Mesh, RefVertices> {
        DualFermionBuilder {
            impurity: self.impurity,
            hybridisation: self.hybridisation,
            lattice: self.lattice,
            mesh,
            vertices: self.vertices,
        }
    }

    /// Attach the density and magnetic vertices
    pub fn with_vertices<'v, Vertex>(
        self,
        density: &'v Vertex,
        magnetic: &'v Vertex,
    ) -> DualFermionBuilder<
        RefImpurity,
        RefHybridisation,
        RefLattice,
        RefMesh,
        (&'v Vertex, &'v Vertex),
    > {
        DualFermionBuilder {
            impurity: self.impurity,
            hybridisation: self.hybridisation,
            lattice: self.lattice,
            mesh: self.mesh,
            vertices: (density, magnetic),
        }
    }
}

impl<'a, Lattice>
    DualFermionBuilder<
        &'a LocalGreensFunction,
        &'a LocalGreensFunction,
        &'a Lattice,
        &'a MomentumMesh,
        (&'a Vertex, &'a Vertex),
    >
where
    Lattice: Dispersion,
{
    /// Validate the inputs against one another and build the engine
    pub fn build(self) -> Result<DualFermion<'a>, DualFermionError> {
        let (impurity, hybridisation) = (self.impurity, self.hybridisation);
        let (density, magnetic) = self.vertices;

        let grid = impurity.grid();
        grid.ensure_compatible(hybridisation.grid())?;
        inverse_impurity(impurity)?;
        if !hybridisation.is_finite() {
            return Err(DualFermionError::InvalidInput(
                "the hybridisation is not finite".to_string(),
            ));
        }

        for (vertex, channel) in [(density, Channel::Density), (magnetic, Channel::Magnetic)] {
            if vertex.channel() != channel {
                return Err(DualFermionError::InvalidInput(format!(
                    "expected a {} vertex, found a {} vertex",
                    channel,
                    vertex.channel()
                )));
            }
            grid.ensure_compatible(vertex.fermionic_grid())?;
            if !vertex.is_finite() {
                return Err(DualFermionError::InvalidInput(format!(
                    "the {} vertex is not finite",
                    channel
                )));
            }
        }
        density
            .bosonic_grid()
            .ensure_compatible(magnetic.bosonic_grid())?;

        let dispersion = self.lattice.tabulate(self.mesh)?;
        tracing::debug!(
            "Built a dual fermion engine on the {} and {} momenta",
            grid,
            self.mesh.len()
        );

        Ok(DualFermion {
            impurity,
            hybridisation,
            mesh: self.mesh,
            density,
            magnetic,
            dispersion,
            cancellation: None,
            result: None,
            glat_loc: None,
            self_energy: None,
            report: None,
        })
    }
}

/// The dual fermion self-consistency engine
#[derive(Debug)]
pub struct DualFermion<'a> {
    impurity: &'a LocalGreensFunction,
    /// The hybridisation every run starts from
    hybridisation: &'a LocalGreensFunction,
    mesh: &'a MomentumMesh,
    density: &'a Vertex,
    magnetic: &'a Vertex,
    dispersion: Array1<f64>,
    cancellation: Option<CancellationToken>,
    result: Option<LocalGreensFunction>,
    glat_loc: Option<LocalGreensFunction>,
    self_energy: Option<LatticeFunction>,
    report: Option<RunReport>,
}

impl<'a> DualFermion<'a> {
    /// Allow `token` to stop subsequent runs between passes
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Iterate the self-consistency from the starting hybridisation, returning the final
    /// hybridisation
    ///
    /// The hybridisation is embedded in the lattice first only when
    /// `parameters.embedding.maximum_iterations` is nonzero.
    ///
    /// Every call starts afresh from the inputs given to the builder. Results of the last call,
    /// successful or not, are available through the accessors afterwards.
    #[tracing::instrument(name = "Dual fermion", skip_all, fields(mix = parameters.df_sc_mix, passes = parameters.df_sc_iter))]
    pub fn run(
        &mut self,
        parameters: &RunParameters,
    ) -> Result<LocalGreensFunction, DualFermionError> {
        parameters.validate()?;
        self.result = None;
        self.glat_loc = None;
        self.self_energy = None;
        self.report = None;

        let guard = Guard::new(parameters.instability_epsilon);
        let embedding = embed_hybridisation(
            self.impurity,
            self.hybridisation,
            &self.dispersion,
            self.mesh,
            guard,
            parameters.embedding.tolerance,
            parameters.embedding.maximum_iterations,
        )?;
        tracing::info!(
            "Embedded the hybridisation in {} iterations, residual {:e}",
            embedding.iterations,
            embedding.residual
        );
        let mut report = RunReport::new(EmbeddingSummary {
            iterations: embedding.iterations,
            residual: embedding.residual,
            converged: embedding.residual < parameters.embedding.tolerance,
        });
        for flag in embedding.flags {
            tracing::warn!("Numerical instability in {}", flag);
            report.record_flag(flag.clone());
            if parameters.strict {
                self.report = Some(report);
                return Err(DualFermionError::NumericalInstability(flag));
            }
        }

        let mut inner = InnerLoopBuilder::new()
            .with_impurity_greens_function(self.impurity)
            .with_dispersion(&self.dispersion)
            .with_mesh(self.mesh)
            .with_vertices(self.density, self.magnetic)
            .with_bosonic_frequencies(parameters.nbosonic)
            .with_guard(guard)
            .build();
        let convergence = Convergence::from(parameters);
        let mut outer = OuterLoop::new(&mut inner, &convergence, embedding.hybridisation)
            .with_cancellation(self.cancellation.as_ref());
        let outcome = outer.run_loop();
        tracing::info!("Self-consistency stopped: {}", outer.state());
        let record = outer.into_record();
        let (self_energy, glat_loc) = inner.into_results();

        report.record_loop(record.state, record.residuals, record.flags);
        self.self_energy = self_energy;
        self.glat_loc = glat_loc;
        self.result = Some(record.hybridisation.clone());
        self.report = Some(report);

        outcome.map(|_| record.hybridisation)
    }

    /// The momentum averaged lattice Green's function of the last pass
    pub fn glat_loc(&self) -> Option<&LocalGreensFunction> {
        self.glat_loc.as_ref()
    }

    /// The hybridisation left by the last run
    pub fn hybridisation(&self) -> Option<&LocalGreensFunction> {
        self.result.as_ref()
    }

    /// The dual self-energy of the last pass
    pub fn self_energy(&self) -> Option<&LatticeFunction> {
        self.self_energy.as_ref()
    }

    /// Diagnostics of the last run
    pub fn report(&self) -> Option<&RunReport> {
        self.report.as_ref()
    }

    /// The impurity Green's function the engine was built with
    pub fn impurity_greens_function(&self) -> &LocalGreensFunction {
        self.impurity
    }

    /// The dispersion tabulated on the momentum mesh
    pub fn dispersion(&self) -> &Array1<f64> {
        &self.dispersion
    }
}
