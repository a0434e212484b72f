//! # Inner loop
//!
//! A single dual fermion pass at fixed hybridisation: the bare dual propagator, its ladder
//! self-energy, the dressed dual and lattice propagators and finally the candidate for the
//! next hybridisation. The pass owns nothing but its last results, all inputs are borrowed for
//! the lifetime of the run.

mod methods;

pub(crate) use methods::{Inner, PassOutcome};

use crate::{
    instability::Guard, self_energy::Vertices, vertex::Vertex, LocalGreensFunction,
};
use dualfermion_mesh::{LatticeFunction, MomentumMesh};
use ndarray::Array1;

/// Builder for the inner loop, populated field by field so `build` is only reachable once
/// every input is attached
pub(crate) struct InnerLoopBuilder<RefImpurity, RefDispersion, RefMesh, RefVertices> {
    impurity: RefImpurity,
    dispersion: RefDispersion,
    mesh: RefMesh,
    vertices: RefVertices,
    nbosonic: usize,
    guard: Option<Guard>,
}

impl InnerLoopBuilder<(), (), (), ()> {
    pub(crate) fn new() -> Self {
        Self {
            impurity: (),
            dispersion: (),
            mesh: (),
            vertices: (),
            nbosonic: 1,
            guard: None,
        }
    }
}

impl<RefImpurity, RefDispersion, RefMesh, RefVertices>
    InnerLoopBuilder<RefImpurity, RefDispersion, RefMesh, RefVertices>
{
    pub(crate) fn with_impurity_greens_function<Impurity>(
        self,
        impurity: &Impurity,
    ) -> InnerLoopBuilder<&Impurity, RefDispersion, RefMesh, RefVertices> {
        InnerLoopBuilder {
            impurity,
            dispersion: self.dispersion,
            mesh: self.mesh,
            vertices: self.vertices,
            nbosonic: self.nbosonic,
            guard: self.guard,
        }
    }

    pub(crate) fn with_dispersion<Dispersion>(
        self,
        dispersion: &Dispersion,
    ) -> InnerLoopBuilder<RefImpurity, &Dispersion, RefMesh, RefVertices> {
        InnerLoopBuilder {
            impurity: self.impurity,
            dispersion,
            mesh: self.mesh,
            vertices: self.vertices,
            nbosonic: self.nbosonic,
            guard: self.guard,
        }
    }

    pub(crate) fn with_mesh<Mesh>(
        self,
        mesh: &Mesh,
    ) -> InnerLoopBuilder<RefImpurity, RefDispersion, &Mesh, RefVertices> {
        InnerLoopBuilder {
            impurity: self.impurity,
            dispersion: self.dispersion,
            mesh,
            vertices: self.vertices,
            nbosonic: self.nbosonic,
            guard: self.guard,
        }
    }

    pub(crate) fn with_vertices<'v, Vertex>(
        self,
        density: &'v Vertex,
        magnetic: &'v Vertex,
    ) -> InnerLoopBuilder<RefImpurity, RefDispersion, RefMesh, (&'v Vertex, &'v Vertex)> {
        InnerLoopBuilder {
            impurity: self.impurity,
            dispersion: self.dispersion,
            mesh: self.mesh,
            vertices: (density, magnetic),
            nbosonic: self.nbosonic,
            guard: self.guard,
        }
    }

    /// Bosonic frequencies summed in the ladder
    pub(crate) fn with_bosonic_frequencies(mut self, nbosonic: usize) -> Self {
        self.nbosonic = nbosonic;
        self
    }

    pub(crate) fn with_guard(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }
}

impl<'a>
    InnerLoopBuilder<
        &'a LocalGreensFunction,
        &'a Array1<f64>,
        &'a MomentumMesh,
        (&'a Vertex, &'a Vertex),
    >
{
    pub(crate) fn build(self) -> InnerLoop<'a> {
        InnerLoop {
            impurity: self.impurity,
            dispersion: self.dispersion,
            mesh: self.mesh,
            vertices: Vertices {
                density: self.vertices.0,
                magnetic: self.vertices.1,
            },
            nbosonic: self.nbosonic,
            guard: self.guard.unwrap_or_default(),
            self_energy: None,
            glat_loc: None,
        }
    }
}

/// The dual fermion pass
pub(crate) struct InnerLoop<'a> {
    impurity: &'a LocalGreensFunction,
    /// `ε(k)` tabulated on `mesh`
    dispersion: &'a Array1<f64>,
    mesh: &'a MomentumMesh,
    vertices: Vertices<'a>,
    nbosonic: usize,
    guard: Guard,
    /// Dual self-energy of the most recent pass
    self_energy: Option<LatticeFunction>,
    /// Local lattice Green's function of the most recent pass
    glat_loc: Option<LocalGreensFunction>,
}

impl InnerLoop<'_> {
    /// Release the results of the last pass
    pub(crate) fn into_results(self) -> (Option<LatticeFunction>, Option<LocalGreensFunction>) {
        (self.self_energy, self.glat_loc)
    }
}
