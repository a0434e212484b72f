//! # Tabulated functions
//!
//! Complex valued containers defined on every point of a Matsubara grid (`MatsubaraFunction`)
//! or on the product of a fermionic grid and a momentum mesh (`LatticeFunction`).
//!
//! Local functions persist to a plain text table, one row per frequency:
//!
//! ```text
//! # index  frequency  re  im
//! -4 -2.19911485751285527e1 1.12000000000000000e-1 -4.17000000000000000e-2
//! ```
//!
//! where `frequency` is the imaginary part of the Matsubara frequency. Values are written with
//! seventeen fractional digits so a write followed by a read reproduces every bit.

use crate::{
    Complex64, Fermionic, FermionicGrid, FermionicPoint, MatsubaraGrid, MatsubaraPoint, MeshError,
    MomentumMesh, Statistics,
};
use ndarray::{Array1, Array2, Axis};
use std::{
    fmt,
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    ops::{Add, Div, Mul, Sub},
    path::Path,
};

/// A complex function of a single Matsubara frequency
#[derive(Clone, Debug, PartialEq)]
pub struct MatsubaraFunction<S> {
    grid: MatsubaraGrid<S>,
    data: Array1<Complex64>,
}

impl<S: Statistics> MatsubaraFunction<S> {
    /// The function which vanishes on every point of `grid`
    pub fn zeros(grid: &MatsubaraGrid<S>) -> Self {
        Self {
            grid: grid.clone(),
            data: Array1::zeros(grid.len()),
        }
    }

    /// Tabulate `function` on `grid`
    pub fn from_fn<F>(grid: &MatsubaraGrid<S>, function: F) -> Self
    where
        F: FnMut(&MatsubaraPoint<S>) -> Complex64,
    {
        Self {
            grid: grid.clone(),
            data: grid.iter().map(function).collect(),
        }
    }

    /// Place raw values on `grid`, one per point in ascending index order
    pub fn from_values(grid: &MatsubaraGrid<S>, values: Vec<Complex64>) -> Result<Self, MeshError> {
        if values.len() != grid.len() {
            return Err(MeshError::LengthMismatch {
                expected: grid.len(),
                found: values.len(),
            });
        }
        Ok(Self {
            grid: grid.clone(),
            data: Array1::from(values),
        })
    }

    /// Overwrite every value with `function` evaluated at the corresponding point
    pub fn fill<F>(&mut self, mut function: F)
    where
        F: FnMut(&MatsubaraPoint<S>) -> Complex64,
    {
        for (value, point) in self.data.iter_mut().zip(self.grid.iter()) {
            *value = function(point);
        }
    }

    /// The grid the function is defined on
    pub fn grid(&self) -> &MatsubaraGrid<S> {
        &self.grid
    }

    /// The stored values, in grid order
    pub fn data(&self) -> &Array1<Complex64> {
        &self.data
    }

    /// Mutable access to the stored values
    pub fn data_mut(&mut self) -> &mut Array1<Complex64> {
        &mut self.data
    }

    /// The value at a grid position
    pub fn get(&self, position: usize) -> Option<Complex64> {
        self.data.get(position).copied()
    }

    /// Evaluate at a point, `None` when the point does not belong to this grid
    pub fn eval(&self, point: &MatsubaraPoint<S>) -> Option<Complex64> {
        self.at_index(point.index())
    }

    /// Evaluate at a Matsubara index, `None` outside the grid
    pub fn at_index(&self, index: i64) -> Option<Complex64> {
        self.grid
            .position_of(index)
            .map(|position| self.data[position])
    }

    /// Iterate over `(point, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&MatsubaraPoint<S>, &Complex64)> {
        self.grid.iter().zip(self.data.iter())
    }

    /// Apply `function` to every value
    pub fn map<F>(&self, function: F) -> Self
    where
        F: Fn(Complex64) -> Complex64,
    {
        Self {
            grid: self.grid.clone(),
            data: self.data.mapv(function),
        }
    }

    /// Root mean square distance between two functions on the same grid
    pub fn diff(&self, other: &Self) -> Result<f64, MeshError> {
        self.grid.ensure_compatible(&other.grid)?;
        let sum_of_squares: f64 = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| (a - b).norm_sqr())
            .sum();
        Ok((sum_of_squares / self.data.len() as f64).sqrt())
    }

    /// Largest pointwise distance between two functions on the same grid
    pub fn max_diff(&self, other: &Self) -> Result<f64, MeshError> {
        self.grid.ensure_compatible(&other.grid)?;
        Ok(self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| (a - b).norm())
            .fold(0_f64, f64::max))
    }

    /// Whether every value is finite
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|value| value.is_finite())
    }

    /// Write the function as a text table
    pub fn write_txt<W: Write>(&self, mut writer: W) -> Result<(), MeshError> {
        writeln!(writer, "# {} beta = {:.17e}", S::NAME, self.grid.beta())?;
        writeln!(writer, "# index  frequency  re  im")?;
        for (point, value) in self.iter() {
            writeln!(
                writer,
                "{} {:.17e} {:.17e} {:.17e}",
                point.index(),
                point.imag(),
                value.re,
                value.im
            )?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write the function as a text table at `path`
    pub fn save_txt<P: AsRef<Path>>(&self, path: P) -> Result<(), MeshError> {
        self.write_txt(BufWriter::new(File::create(path)?))
    }

    /// Read a text table written by `write_txt`, checking each row against `grid`
    pub fn read_txt<R: BufRead>(reader: R, grid: &MatsubaraGrid<S>) -> Result<Self, MeshError> {
        let mut values = Vec::with_capacity(grid.len());
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let row = parse_row(trimmed).map_err(|reason| MeshError::Parse {
                line: number + 1,
                reason,
            })?;
            let expected = grid.point(values.len()).ok_or(MeshError::LengthMismatch {
                expected: grid.len(),
                found: values.len() + 1,
            })?;
            if row.0 != expected.index() {
                return Err(MeshError::Parse {
                    line: number + 1,
                    reason: format!(
                        "expected Matsubara index {}, found {}",
                        expected.index(),
                        row.0
                    ),
                });
            }
            values.push(row.1);
        }
        Self::from_values(grid, values)
    }

    /// Read a text table at `path`
    pub fn load_txt<P: AsRef<Path>>(path: P, grid: &MatsubaraGrid<S>) -> Result<Self, MeshError> {
        Self::read_txt(BufReader::new(File::open(path)?), grid)
    }

    fn zip_with<F>(&self, rhs: &Self, op: F) -> Self
    where
        F: Fn(Complex64, Complex64) -> Complex64,
    {
        assert!(
            self.grid.is_compatible(&rhs.grid),
            "elementwise arithmetic needs a shared grid"
        );
        let data = self
            .data
            .iter()
            .zip(rhs.data.iter())
            .map(|(&a, &b)| op(a, b))
            .collect();
        Self {
            grid: self.grid.clone(),
            data,
        }
    }
}

fn parse_row(line: &str) -> Result<(i64, Complex64), String> {
    let columns: Vec<&str> = line.split_whitespace().collect();
    if columns.len() != 4 {
        return Err(format!("expected 4 columns, found {}", columns.len()));
    }
    let index = columns[0]
        .parse::<i64>()
        .map_err(|e| format!("bad index {:?}: {}", columns[0], e))?;
    let parse = |column: &str| {
        column
            .parse::<f64>()
            .map_err(|e| format!("bad number {:?}: {}", column, e))
    };
    Ok((index, Complex64::new(parse(columns[2])?, parse(columns[3])?)))
}

impl<S: Statistics> fmt::Display for MatsubaraFunction<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (point, value) in self.iter() {
            writeln!(
                f,
                "{:>5} {:>14.8} {:>16.8e} {:>16.8e}",
                point.index(),
                point.imag(),
                value.re,
                value.im
            )?;
        }
        Ok(())
    }
}

impl<S: Statistics> Add for &MatsubaraFunction<S> {
    type Output = MatsubaraFunction<S>;
    fn add(self, rhs: Self) -> Self::Output {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl<S: Statistics> Sub for &MatsubaraFunction<S> {
    type Output = MatsubaraFunction<S>;
    fn sub(self, rhs: Self) -> Self::Output {
        self.zip_with(rhs, |a, b| a - b)
    }
}

impl<S: Statistics> Mul for &MatsubaraFunction<S> {
    type Output = MatsubaraFunction<S>;
    fn mul(self, rhs: Self) -> Self::Output {
        self.zip_with(rhs, |a, b| a * b)
    }
}

impl<S: Statistics> Div for &MatsubaraFunction<S> {
    type Output = MatsubaraFunction<S>;
    fn div(self, rhs: Self) -> Self::Output {
        self.zip_with(rhs, |a, b| a / b)
    }
}

impl<S: Statistics> Mul<f64> for &MatsubaraFunction<S> {
    type Output = MatsubaraFunction<S>;
    fn mul(self, rhs: f64) -> Self::Output {
        self.map(|value| value * rhs)
    }
}

impl<S: Statistics> Mul<Complex64> for &MatsubaraFunction<S> {
    type Output = MatsubaraFunction<S>;
    fn mul(self, rhs: Complex64) -> Self::Output {
        self.map(|value| value * rhs)
    }
}

/// A complex function of fermionic frequency and lattice momentum
#[derive(Clone, Debug, PartialEq)]
pub struct LatticeFunction {
    grid: FermionicGrid,
    mesh: MomentumMesh,
    data: Array2<Complex64>,
}

impl LatticeFunction {
    /// The function which vanishes everywhere on `grid` x `mesh`
    pub fn zeros(grid: &FermionicGrid, mesh: &MomentumMesh) -> Self {
        Self {
            grid: grid.clone(),
            mesh: mesh.clone(),
            data: Array2::zeros((grid.len(), mesh.len())),
        }
    }

    /// Tabulate `function(point, flat momentum index)`
    pub fn from_fn<F>(grid: &FermionicGrid, mesh: &MomentumMesh, mut function: F) -> Self
    where
        F: FnMut(&FermionicPoint, usize) -> Complex64,
    {
        let data = Array2::from_shape_fn((grid.len(), mesh.len()), |(position, k)| {
            function(&grid.points()[position], k)
        });
        Self {
            grid: grid.clone(),
            mesh: mesh.clone(),
            data,
        }
    }

    /// Wrap raw values of shape `[grid.len(), mesh.len()]`
    pub fn from_array(
        grid: &FermionicGrid,
        mesh: &MomentumMesh,
        data: Array2<Complex64>,
    ) -> Result<Self, MeshError> {
        if data.dim() != (grid.len(), mesh.len()) {
            return Err(MeshError::LengthMismatch {
                expected: grid.len() * mesh.len(),
                found: data.len(),
            });
        }
        Ok(Self {
            grid: grid.clone(),
            mesh: mesh.clone(),
            data,
        })
    }

    /// The frequency grid
    pub fn grid(&self) -> &FermionicGrid {
        &self.grid
    }

    /// The momentum mesh
    pub fn mesh(&self) -> &MomentumMesh {
        &self.mesh
    }

    /// Values indexed by `[frequency position, flat momentum]`
    pub fn data(&self) -> &Array2<Complex64> {
        &self.data
    }

    /// Mutable access to the values
    pub fn data_mut(&mut self) -> &mut Array2<Complex64> {
        &mut self.data
    }

    /// The value at a frequency position and flat momentum index
    pub fn get(&self, position: usize, k: usize) -> Option<Complex64> {
        self.data.get((position, k)).copied()
    }

    /// Arithmetic mean over the momentum mesh at every frequency
    pub fn momentum_average(&self) -> MatsubaraFunction<Fermionic> {
        let normalisation = self.mesh.len() as f64;
        let data = self
            .data
            .sum_axis(Axis(1))
            .mapv(|sum| sum / normalisation);
        MatsubaraFunction {
            grid: self.grid.clone(),
            data,
        }
    }

    /// Whether every value is finite
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|value| value.is_finite())
    }

    /// Largest pointwise distance between two functions on the same grid and mesh
    pub fn max_diff(&self, other: &Self) -> Result<f64, MeshError> {
        self.grid.ensure_compatible(&other.grid)?;
        if self.mesh != other.mesh {
            return Err(MeshError::GridMismatch(
                "momentum meshes differ".to_string(),
            ));
        }
        Ok(self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| (a - b).norm())
            .fold(0_f64, f64::max))
    }
}

#[cfg(test)]
mod test {
    use super::{LatticeFunction, MatsubaraFunction};
    use crate::{BosonicGrid, Complex64, FermionicGrid, MeshError, MomentumMesh};
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use rand::Rng;

    fn random_function(grid: &FermionicGrid) -> MatsubaraFunction<crate::Fermionic> {
        let mut rng = rand::thread_rng();
        MatsubaraFunction::from_fn(grid, |_| Complex64::new(rng.gen(), rng.gen()))
    }

    #[test]
    fn fill_and_eval_agree_with_the_closure() {
        let grid = FermionicGrid::new(-4, 4, 1.0).unwrap();
        let mut function = MatsubaraFunction::zeros(&grid);
        function.fill(|point| 1_f64 / point.value());
        for point in grid.iter() {
            assert_eq!(function.eval(point), Some(1_f64 / point.value()));
        }
        assert!(function.at_index(4).is_none());
    }

    #[test]
    fn arithmetic_is_elementwise() {
        let grid = FermionicGrid::new(-3, 3, 2.0).unwrap();
        let a = random_function(&grid);
        let b = random_function(&grid);
        let sum = &a + &b;
        let product = &a * &b;
        let scaled = &a * 2_f64;
        for position in 0..grid.len() {
            let (x, y) = (a.get(position).unwrap(), b.get(position).unwrap());
            assert_eq!(sum.get(position).unwrap(), x + y);
            assert_eq!(product.get(position).unwrap(), x * y);
            assert_eq!(scaled.get(position).unwrap(), x * 2_f64);
        }
        let difference = &sum - &b;
        assert!(difference.max_diff(&a).unwrap() < 1e-15);
    }

    #[test]
    fn diff_is_the_root_mean_square_distance() {
        let grid = FermionicGrid::new(-1, 1, 1.0).unwrap();
        let a = MatsubaraFunction::from_values(&grid, vec![Complex64::new(3.0, 0.0); 2]).unwrap();
        let b = MatsubaraFunction::from_values(
            &grid,
            vec![Complex64::new(0.0, 4.0), Complex64::new(3.0, 0.0)],
        )
        .unwrap();
        assert_relative_eq!(a.diff(&b).unwrap(), (25_f64 / 2_f64).sqrt());
        let other = MatsubaraFunction::zeros(&FermionicGrid::new(-2, 2, 1.0).unwrap());
        assert!(matches!(a.diff(&other), Err(MeshError::GridMismatch(_))));
    }

    #[test]
    fn text_round_trip_is_bit_exact() {
        let grid = FermionicGrid::new(-8, 8, 3.7).unwrap();
        let function = random_function(&grid);
        let mut buffer = Vec::new();
        function.write_txt(&mut buffer).unwrap();
        let read = MatsubaraFunction::read_txt(buffer.as_slice(), &grid).unwrap();
        assert_eq!(read, function);
    }

    #[test]
    fn reading_onto_the_wrong_grid_fails() {
        let grid = FermionicGrid::new(-2, 2, 1.0).unwrap();
        let mut buffer = Vec::new();
        random_function(&grid).write_txt(&mut buffer).unwrap();

        let shifted = FermionicGrid::new(-1, 3, 1.0).unwrap();
        assert!(matches!(
            MatsubaraFunction::read_txt(buffer.as_slice(), &shifted),
            Err(MeshError::Parse { line: 3, .. })
        ));
        let larger = FermionicGrid::new(-2, 3, 1.0).unwrap();
        assert!(matches!(
            MatsubaraFunction::read_txt(buffer.as_slice(), &larger),
            Err(MeshError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn malformed_rows_report_their_line() {
        let grid = BosonicGrid::new(0, 2, 1.0).unwrap();
        let text = "# header\n0 0.0 1.0 2.0\n1 6.28 one 2.0\n";
        let result = MatsubaraFunction::read_txt(text.as_bytes(), &grid);
        assert!(matches!(result, Err(MeshError::Parse { line: 3, .. })));
    }

    #[test]
    fn momentum_average_is_the_mean_over_the_mesh() {
        let grid = FermionicGrid::new(-2, 2, 1.0).unwrap();
        let mesh = MomentumMesh::new(5, 2).unwrap();
        let mut rng = rand::thread_rng();
        let function =
            LatticeFunction::from_fn(&grid, &mesh, |_, _| Complex64::new(rng.gen(), rng.gen()));
        let average = function.momentum_average();
        for position in 0..grid.len() {
            let mut sum = Complex64::new(0.0, 0.0);
            for k in 0..mesh.len() {
                sum += function.get(position, k).unwrap();
            }
            let expected = sum / 25_f64;
            assert_relative_eq!(average.get(position).unwrap().re, expected.re, epsilon = 1e-14);
            assert_relative_eq!(average.get(position).unwrap().im, expected.im, epsilon = 1e-14);
        }
    }

    proptest! {
        #[test]
        fn arbitrary_values_survive_the_text_format(
            values in proptest::collection::vec((-1e300_f64..1e300, -1e300_f64..1e300), 6),
            beta in 1e-3_f64..1e3,
        ) {
            let grid = FermionicGrid::new(-3, 3, beta).unwrap();
            let values = values.into_iter().map(|(re, im)| Complex64::new(re, im)).collect();
            let function = MatsubaraFunction::from_values(&grid, values).unwrap();
            let mut buffer = Vec::new();
            function.write_txt(&mut buffer).unwrap();
            let read = MatsubaraFunction::read_txt(buffer.as_slice(), &grid).unwrap();
            prop_assert_eq!(read, function);
        }
    }
}
