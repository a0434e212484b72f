// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Error
//! The error type for the binary

use miette::Diagnostic;

#[derive(thiserror::Error, Debug, Diagnostic)]
pub(crate) enum AppError {
    #[error(transparent)]
    #[diagnostic(code(dualfermion::io_error))]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    #[diagnostic(code(dualfermion::config_error))]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    #[diagnostic(code(dualfermion::mesh_error))]
    Mesh(#[from] dualfermion_mesh::MeshError),
    #[error(transparent)]
    #[diagnostic(code(dualfermion::solver_error))]
    Solver(#[from] crate::DualFermionError),
}
