//! This module governs the high-level implementation of the calculation
mod configuration;
mod error;
mod telemetry;

pub(crate) use configuration::Configuration;
pub(crate) use error::AppError;

use crate::DualFermionBuilder;
use clap::{Parser, ValueEnum};
use std::{fmt, path::Path, path::PathBuf};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct App {
    /// Configuration file layered over `.config/default.toml`
    file_path: Option<PathBuf>,
    #[clap(value_enum, short, long, default_value = "info")]
    log_level: LogLevel,
    /// Directory for the log file and the computed functions
    #[clap(short, long)]
    output: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        write!(f, "{}", level)
    }
}

/// Run the half filled Hubbard atom through the dual fermion self-consistency
pub fn run() -> color_eyre::Result<()> {
    let cli = App::parse();

    let config = Configuration::build(cli.file_path.as_deref())?;
    let output = cli
        .output
        .unwrap_or_else(|| config.global.output_directory.clone());
    std::fs::create_dir_all(&output).map_err(AppError::from)?;

    let (subscriber, _guard) = telemetry::get_subscriber(cli.log_level, &output);
    telemetry::init_subscriber(subscriber)?;

    tracing::info!("Writing results to {}", output.display());
    build_and_run(&config, &output)?;
    Ok(())
}

fn build_and_run(config: &Configuration, output: &Path) -> Result<(), AppError> {
    let model = &config.model;
    let fermionic = model.fermionic_grid()?;
    let bosonic = model.bosonic_grid()?;
    let mesh = model.momentum_mesh()?;
    let lattice = model.lattice();
    let atom = model.atom();
    tracing::info!(
        "U = {}, beta = {}, {} momenta in {} dimensions",
        atom.interaction(),
        model.beta,
        mesh.len(),
        mesh.dimension()
    );

    let impurity = atom.greens_function(&fermionic);
    let hybridisation = atom.hybridisation(&impurity, model.coupling());
    let density = atom.density_vertex(&bosonic, &fermionic);
    let magnetic = atom.magnetic_vertex(&bosonic, &fermionic);
    impurity.save_txt(output.join("gw.dat"))?;
    hybridisation.save_txt(output.join("delta.dat"))?;

    let mut engine = DualFermionBuilder::new()
        .with_impurity_greens_function(&impurity)
        .with_hybridisation(&hybridisation)
        .with_lattice(&lattice)
        .with_momentum_mesh(&mesh)
        .with_vertices(&density, &magnetic)
        .build()?;
    let outcome = engine.run(&config.solver);

    // Whatever the run produced is written, even when it stopped early
    if let Some(updated) = engine.hybridisation() {
        updated.save_txt(output.join("delta_updated.dat"))?;
    }
    if let Some(glat_loc) = engine.glat_loc() {
        for (point, value) in glat_loc.iter() {
            tracing::info!("glat_loc({}) = {}", point.index(), value);
        }
        glat_loc.save_txt(output.join("gloc.dat"))?;
    }
    if let Some(report) = engine.report() {
        tracing::info!(
            "Finished in state {} after {} iterations with {} instability flags",
            report.state(),
            report.iterations(),
            report.flags().len()
        );
    }

    outcome?;
    Ok(())
}
