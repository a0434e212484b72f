use crate::Complex64;
use dualfermion_mesh::LatticeFunction;
use ndarray::Array1;

/// The particle-hole bubble `χ0(ν; q, W) = (1/N) Σ_k G(ν, k) G(ν + W, k + q)`
///
/// `shifted` maps each fermionic position to that of `ν + W`; frequencies shifted off the grid
/// contribute nothing.
pub(crate) fn bubble(
    propagator: &LatticeFunction,
    shifted: &[Option<usize>],
    q: usize,
) -> Array1<Complex64> {
    let mesh = propagator.mesh();
    let data = propagator.data();
    let normalisation = mesh.len() as f64;
    shifted
        .iter()
        .enumerate()
        .map(|(i, shifted)| match *shifted {
            Some(j) => {
                (0..mesh.len())
                    .map(|k| data[[i, k]] * data[[j, mesh.add(k, q)]])
                    .sum::<Complex64>()
                    / normalisation
            }
            None => Complex64::new(0_f64, 0_f64),
        })
        .collect()
}
