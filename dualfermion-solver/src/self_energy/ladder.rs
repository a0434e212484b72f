use super::{bethe_salpeter::ladder_correction, bubble::bubble, shifted_positions, Vertices};
use crate::{
    instability::{InstabilityFlag, Stage},
    vertex::bosonic_window,
    Complex64,
};
use dualfermion_mesh::LatticeFunction;
use nalgebra::DMatrix;
use ndarray::{Array1, Axis};
use rayon::prelude::*;

/// Evaluate the ladder dual self-energy from the dual propagator `propagator`
///
/// Bosonic frequencies `|W| < nbosonic` present on the vertex grid are summed. Singular
/// Bethe-Salpeter systems drop out of the sum and are reported as flags.
#[tracing::instrument(name = "Ladder self-energy", level = "debug", skip_all)]
pub(crate) fn ladder_self_energy(
    propagator: &LatticeFunction,
    vertices: Vertices<'_>,
    nbosonic: usize,
) -> (LatticeFunction, Vec<InstabilityFlag>) {
    let grid = propagator.grid();
    let mesh = propagator.mesh();
    let temperature = 1_f64 / grid.beta();
    let prefactor = 0.5_f64 * temperature / mesh.len() as f64;

    let mut self_energy = LatticeFunction::zeros(grid, mesh);
    let mut flags = Vec::new();

    for transfer in bosonic_window(vertices.density.bosonic_grid(), nbosonic) {
        tracing::trace!("Bosonic transfer {}", transfer.index());
        let shifted = shifted_positions(grid, transfer.index());
        let channels: Vec<(f64, DMatrix<Complex64>)> = vertices
            .iter()
            .map(|vertex| {
                (
                    vertex.channel().multiplicity(),
                    vertex.matrix_at(transfer.position()),
                )
            })
            .collect();

        // Σ_α A_α (Γ_α - γ_α)(ν, ν) for every transfer momentum
        let kernels: Vec<(Array1<Complex64>, Vec<InstabilityFlag>)> = (0..mesh.len())
            .into_par_iter()
            .map(|q| {
                let chi = bubble(propagator, &shifted, q);
                let mut kernel = Array1::zeros(grid.len());
                let mut flags = Vec::new();
                for (multiplicity, gamma) in channels.iter() {
                    match ladder_correction(gamma, &chi, temperature) {
                        Some(correction) => {
                            for (entry, value) in kernel.iter_mut().zip(correction.iter()) {
                                *entry += *value * *multiplicity;
                            }
                        }
                        None => flags.push(InstabilityFlag::new(
                            Stage::BetheSalpeter,
                            Some(transfer.index()),
                            Some(q),
                            0_f64,
                        )),
                    }
                }
                (kernel, flags)
            })
            .collect();

        // Close the ladder with G(ν + W, k + q)
        let data = propagator.data();
        self_energy
            .data_mut()
            .axis_iter_mut(Axis(1))
            .into_par_iter()
            .enumerate()
            .for_each(|(k, mut column)| {
                for (i, value) in column.iter_mut().enumerate() {
                    if let Some(j) = shifted[i] {
                        let sum: Complex64 = kernels
                            .iter()
                            .enumerate()
                            .map(|(q, (kernel, _))| kernel[i] * data[[j, mesh.add(k, q)]])
                            .sum();
                        *value += sum * prefactor;
                    }
                }
            });

        flags.extend(kernels.into_iter().flat_map(|(_, flags)| flags));
    }

    (self_energy, flags)
}

#[cfg(test)]
mod test {
    use super::ladder_self_energy;
    use crate::{
        self_energy::Vertices,
        vertex::{Channel, Vertex},
        Complex64,
    };
    use approx::assert_relative_eq;
    use dualfermion_mesh::{BosonicGrid, FermionicGrid, LatticeFunction, MomentumMesh};
    use rand::Rng;

    fn random_propagator(grid: &FermionicGrid, mesh: &MomentumMesh) -> LatticeFunction {
        let mut rng = rand::thread_rng();
        LatticeFunction::from_fn(grid, mesh, |_, _| {
            Complex64::new(rng.gen_range(-0.2..0.2), rng.gen_range(-0.2..0.2))
        })
    }

    fn random_vertex(
        channel: Channel,
        bosonic: &BosonicGrid,
        fermionic: &FermionicGrid,
        scale: f64,
    ) -> Vertex {
        let mut rng = rand::thread_rng();
        Vertex::from_fn(channel, bosonic, fermionic, |_, _, _| {
            Complex64::new(scale * rng.gen_range(-1.0..1.0), scale * rng.gen_range(-1.0..1.0))
        })
    }

    /// Direct evaluation of the second order diagram,
    /// `-T² / (2N²) Σ_{q,W,α} A_α Σ_{ν',k'} γ(ν,ν') γ(ν',ν) G(ν',k') G(ν'+W,k'+q) G(ν+W,k+q)`
    fn second_order(
        propagator: &LatticeFunction,
        vertices: &[&Vertex],
        transfers: &[i64],
    ) -> LatticeFunction {
        let grid = propagator.grid();
        let mesh = propagator.mesh();
        let t = 1.0 / grid.beta();
        let n = mesh.len() as f64;
        let g = |position: Option<usize>, k: usize| {
            position
                .map(|p| propagator.get(p, k).unwrap())
                .unwrap_or_else(|| Complex64::new(0.0, 0.0))
        };
        LatticeFunction::from_fn(grid, mesh, |point, k| {
            let mut total = Complex64::new(0.0, 0.0);
            for &w in transfers {
                let outer = grid.position_of(point.index() + w);
                let bosonic = vertices[0].bosonic_grid().find(w).unwrap();
                for q in 0..mesh.len() {
                    for vertex in vertices {
                        for inner in grid.iter() {
                            let shifted = grid.position_of(inner.index() + w);
                            let chi: Complex64 = (0..mesh.len())
                                .map(|kp| g(Some(inner.position()), kp) * g(shifted, mesh.add(kp, q)))
                                .sum::<Complex64>()
                                / n;
                            let gamma = vertex.eval(bosonic, point, inner).unwrap()
                                * vertex.eval(bosonic, inner, point).unwrap();
                            total += -vertex.channel().multiplicity()
                                * t
                                * gamma
                                * chi
                                * g(outer, mesh.add(k, q));
                        }
                    }
                }
            }
            total * 0.5 * t / n
        })
    }

    #[test]
    fn vanishing_vertex_gives_vanishing_self_energy() {
        let fermionic = FermionicGrid::new(-2, 2, 1.0).unwrap();
        let bosonic = BosonicGrid::new(-1, 2, 1.0).unwrap();
        let mesh = MomentumMesh::new(3, 2).unwrap();
        let density = Vertex::zeros(Channel::Density, &bosonic, &fermionic);
        let magnetic = Vertex::zeros(Channel::Magnetic, &bosonic, &fermionic);
        let (sigma, flags) = ladder_self_energy(
            &random_propagator(&fermionic, &mesh),
            Vertices {
                density: &density,
                magnetic: &magnetic,
            },
            2,
        );
        assert!(flags.is_empty());
        assert!(sigma.data().iter().all(|value| value.norm() == 0.0));
    }

    #[test]
    fn weak_vertices_reproduce_the_second_order_diagram() {
        let fermionic = FermionicGrid::new(-2, 2, 2.0).unwrap();
        let bosonic = BosonicGrid::new(-1, 2, 2.0).unwrap();
        let mesh = MomentumMesh::new(3, 2).unwrap();
        let scale = 1e-3;
        let density = random_vertex(Channel::Density, &bosonic, &fermionic, scale);
        let magnetic = random_vertex(Channel::Magnetic, &bosonic, &fermionic, scale);
        let propagator = random_propagator(&fermionic, &mesh);

        let (sigma, flags) = ladder_self_energy(
            &propagator,
            Vertices {
                density: &density,
                magnetic: &magnetic,
            },
            2,
        );
        assert!(flags.is_empty());
        let expected = second_order(&propagator, &[&density, &magnetic], &[-1, 0, 1]);
        // Third order terms are suppressed by a further factor of the vertex scale
        let magnitude = expected
            .data()
            .iter()
            .map(|value| value.norm())
            .fold(0.0, f64::max);
        assert!(magnitude > 0.0);
        assert_relative_eq!(
            sigma.max_diff(&expected).unwrap(),
            0.0,
            epsilon = 1e-2 * magnitude
        );
    }

    #[test]
    fn a_single_bosonic_frequency_only_uses_the_static_vertex() {
        let fermionic = FermionicGrid::new(-2, 2, 1.0).unwrap();
        let bosonic = BosonicGrid::new(-1, 2, 1.0).unwrap();
        let mesh = MomentumMesh::new(2, 1).unwrap();
        let propagator = random_propagator(&fermionic, &mesh);
        // Vertices which vanish at W = 0
        let dynamic = |channel| {
            Vertex::from_fn(channel, &bosonic, &fermionic, |w, _, _| {
                Complex64::new(w.index().abs() as f64, 0.0)
            })
        };
        let (density, magnetic) = (dynamic(Channel::Density), dynamic(Channel::Magnetic));
        let vertices = Vertices {
            density: &density,
            magnetic: &magnetic,
        };
        let (sigma, _) = ladder_self_energy(&propagator, vertices, 1);
        assert!(sigma.data().iter().all(|value| value.norm() == 0.0));
        let (sigma, _) = ladder_self_energy(&propagator, vertices, 2);
        assert!(sigma.data().iter().any(|value| value.norm() > 0.0));
    }
}
