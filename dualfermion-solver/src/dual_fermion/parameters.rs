use crate::{error::DualFermionError, outer_loop::Convergence};
use serde::Deserialize;

/// Settings of the lattice embedding carried out before the first pass
#[derive(Copy, Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Threshold on the RMS change of the hybridisation
    pub tolerance: f64,
    /// Iteration cap, zero disables the embedding
    pub maximum_iterations: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-12,
            maximum_iterations: 0,
        }
    }
}

/// Parameters of a single self-consistency run
#[derive(Copy, Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunParameters {
    /// Weight of the new hybridisation in the linear mixing, in `(0, 1]`
    pub df_sc_mix: f64,
    /// Number of self-consistency passes
    pub df_sc_iter: usize,
    /// Bosonic frequencies `|W| < nbosonic` summed in the ladder
    pub nbosonic: usize,
    /// Stop early once the RMS change of the hybridisation falls below this value
    pub df_sc_cutoff: Option<f64>,
    /// Abort when the RMS change of the hybridisation exceeds this value
    pub df_sc_abort: Option<f64>,
    /// Treat any numerical instability as fatal
    pub strict: bool,
    /// Denominators smaller than this are clamped and flagged
    pub instability_epsilon: f64,
    /// The lattice embedding of the input hybridisation
    pub embedding: EmbeddingSettings,
}

impl Default for RunParameters {
    fn default() -> Self {
        Self {
            df_sc_mix: 1_f64,
            df_sc_iter: 1,
            nbosonic: 1,
            df_sc_cutoff: None,
            df_sc_abort: None,
            strict: false,
            instability_epsilon: 1e-12,
            embedding: EmbeddingSettings::default(),
        }
    }
}

fn ensure_positive(name: &str, value: f64) -> Result<(), DualFermionError> {
    if value.is_finite() && value > 0_f64 {
        Ok(())
    } else {
        Err(DualFermionError::InvalidInput(format!(
            "{} must be positive and finite, found {}",
            name, value
        )))
    }
}

impl RunParameters {
    /// Reject parameters which cannot describe a run
    pub fn validate(&self) -> Result<(), DualFermionError> {
        if !(self.df_sc_mix > 0_f64 && self.df_sc_mix <= 1_f64) {
            return Err(DualFermionError::InvalidInput(format!(
                "df_sc_mix must lie in (0, 1], found {}",
                self.df_sc_mix
            )));
        }
        if self.df_sc_iter == 0 {
            return Err(DualFermionError::InvalidInput(
                "df_sc_iter must be at least one".to_string(),
            ));
        }
        if self.nbosonic == 0 {
            return Err(DualFermionError::InvalidInput(
                "nbosonic must be at least one".to_string(),
            ));
        }
        if let Some(cutoff) = self.df_sc_cutoff {
            ensure_positive("df_sc_cutoff", cutoff)?;
        }
        if let Some(abort) = self.df_sc_abort {
            ensure_positive("df_sc_abort", abort)?;
        }
        ensure_positive("instability_epsilon", self.instability_epsilon)?;
        ensure_positive("embedding.tolerance", self.embedding.tolerance)
    }
}

impl From<&RunParameters> for Convergence {
    fn from(parameters: &RunParameters) -> Self {
        Self {
            mixing: parameters.df_sc_mix,
            maximum_iterations: parameters.df_sc_iter,
            tolerance: parameters.df_sc_cutoff,
            abort_tolerance: parameters.df_sc_abort,
            strict: parameters.strict,
        }
    }
}
