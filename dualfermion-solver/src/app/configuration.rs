use super::AppError;
use crate::{lattice::CubicLattice, AtomicLimit, DualFermionError, RunParameters};
use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File};
use dualfermion_mesh::{BosonicGrid, FermionicGrid, MomentumMesh};
use serde::Deserialize;
use std::{
    env,
    path::{Path, PathBuf},
};

#[derive(Debug, Deserialize)]
pub(crate) struct Configuration {
    pub(crate) global: GlobalConfiguration,
    pub(crate) model: ModelConfiguration,
    #[serde(default)]
    pub(crate) solver: RunParameters,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GlobalConfiguration {
    /// Destination of the log file and the written functions
    pub(crate) output_directory: PathBuf,
}

/// The half filled Hubbard model on a hypercubic lattice
#[derive(Debug, Deserialize)]
pub(crate) struct ModelConfiguration {
    pub(crate) interaction: f64,
    pub(crate) beta: f64,
    /// Fermionic indices `[-wmax, wmax)` are retained
    pub(crate) wmax: i64,
    pub(crate) hopping: f64,
    pub(crate) dimension: usize,
    pub(crate) kpoints: usize,
    /// Bosonic indices `[bosonic_min, bosonic_max)` of the vertices
    pub(crate) bosonic_min: i64,
    pub(crate) bosonic_max: i64,
    /// Scale of the starting hybridisation `Δ = coupling g`, the half bandwidth when absent
    pub(crate) coupling: Option<f64>,
}

impl ModelConfiguration {
    pub(crate) fn fermionic_grid(&self) -> Result<FermionicGrid, DualFermionError> {
        if self.wmax <= 0 {
            return Err(DualFermionError::InvalidInput(format!(
                "the fermionic window needs wmax > 0, found {}",
                self.wmax
            )));
        }
        Ok(FermionicGrid::new(-self.wmax, self.wmax, self.beta)?)
    }

    pub(crate) fn bosonic_grid(&self) -> Result<BosonicGrid, DualFermionError> {
        Ok(BosonicGrid::new(
            self.bosonic_min,
            self.bosonic_max,
            self.beta,
        )?)
    }

    pub(crate) fn momentum_mesh(&self) -> Result<MomentumMesh, DualFermionError> {
        Ok(MomentumMesh::new(self.kpoints, self.dimension)?)
    }

    pub(crate) fn lattice(&self) -> CubicLattice {
        CubicLattice::new(self.hopping, self.dimension)
    }

    pub(crate) fn atom(&self) -> AtomicLimit {
        AtomicLimit::new(self.interaction, self.beta)
    }

    pub(crate) fn coupling(&self) -> f64 {
        self.coupling
            .unwrap_or_else(|| self.lattice().half_bandwidth())
    }
}

impl Configuration {
    /// Layer the defaults, the run mode overrides, an optional user file and the environment
    pub(crate) fn build(user_file: Option<&Path>) -> Result<Self, AppError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            // The default settings, used unless overridden below
            .add_source(File::with_name(".config/default"))
            .add_source(File::with_name(&format!(".config/{}", run_mode)).required(false));
        if let Some(path) = user_file {
            builder = builder.add_source(File::from(path));
        }
        Self::from_builder(builder)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, AppError> {
        let configuration = builder
            .add_source(Environment::with_prefix("DF").separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(configuration)
    }
}

#[cfg(test)]
mod test {
    use super::Configuration;
    use crate::DualFermionError;
    use config::{Config, File, FileFormat};

    const DEFAULT: &str = include_str!("../../../.config/default.toml");

    fn parse(overrides: &str) -> Configuration {
        let builder = Config::builder()
            .add_source(File::from_str(DEFAULT, FileFormat::Toml))
            .add_source(File::from_str(overrides, FileFormat::Toml));
        Configuration::from_builder(builder).unwrap()
    }

    #[test]
    fn defaults_describe_the_reference_model() {
        let configuration = parse("");
        let model = &configuration.model;
        assert_eq!(model.interaction, 16.0);
        assert_eq!(model.wmax, 4);
        assert_eq!(model.fermionic_grid().unwrap().len(), 8);
        assert_eq!(model.bosonic_grid().unwrap().len(), 3);
        assert_eq!(model.momentum_mesh().unwrap().len(), 256);
        assert_eq!(model.coupling(), 4.0);
        assert_eq!(configuration.solver.df_sc_iter, 1);
        assert_eq!(configuration.solver.df_sc_mix, 1.0);
    }

    #[test]
    fn user_files_override_single_fields() {
        let configuration = parse(
            "[solver]\ndf_sc_iter = 7\ndf_sc_cutoff = 1e-6\n[solver.embedding]\nmaximum_iterations = 25\n",
        );
        assert_eq!(configuration.solver.df_sc_iter, 7);
        assert_eq!(configuration.solver.df_sc_cutoff, Some(1e-6));
        assert_eq!(configuration.solver.embedding.maximum_iterations, 25);
        assert_eq!(configuration.solver.embedding.tolerance, 1e-12);
        assert_eq!(configuration.solver.nbosonic, 1);
    }

    #[test]
    fn an_empty_fermionic_window_is_invalid() {
        let configuration = parse("[model]\nwmax = 0\n");
        assert!(matches!(
            configuration.model.fermionic_grid(),
            Err(DualFermionError::InvalidInput(_))
        ));
    }
}
