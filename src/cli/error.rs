// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all meqcal-related errors. This should be the *only* error
//! enum that is publicly visible from the command line.

use thiserror::Error;

use super::{common::ModelArgsError, parms_verify::ParmsVerifyError, solve::SolveArgsError};
use crate::{
    domain::DomainError,
    expr::EvalError,
    jones::JonesError,
    matrix::MatrixError,
    model::ModelError,
    parmdb::ParmDbError,
    polc::PolcError,
    solver::SolverError,
};

#[derive(Error, Debug)]
pub enum MeqError {
    /// An error related to the arguments of a subcommand.
    #[error("{0}")]
    Args(String),

    /// An error related to argument files.
    #[error("{0}\n\nArgument files are toml or json and use the long names of arguments, grouped by section (e.g. [model]).")]
    ArgFile(String),

    /// An error related to the time-frequency grid.
    #[error("{0}")]
    Grid(String),

    /// An error related to parameters and parameter files.
    #[error("{0}")]
    Parms(String),

    /// An error raised while evaluating a model.
    #[error("{0}\n\nTry turning up verbosity (-v or -vv) to see which nodes were evaluated.")]
    Model(String),

    /// An error raised while solving.
    #[error("{0}")]
    Solver(String),

    /// A generic error that can't be clarified further, e.g. IO errors.
    #[error("{0}")]
    Generic(String),
}

// Binary sub-command errors.

impl From<ModelArgsError> for MeqError {
    fn from(e: ModelArgsError) -> Self {
        let s = e.to_string();
        match e {
            ModelArgsError::NoFreqRange
            | ModelArgsError::NoTimeRange
            | ModelArgsError::BadRange(_)
            | ModelArgsError::NoBaselines => Self::Args(s),
        }
    }
}

impl From<SolveArgsError> for MeqError {
    fn from(e: SolveArgsError) -> Self {
        let s = e.to_string();
        match e {
            SolveArgsError::NoObserved | SolveArgsError::NoSolvables => Self::Args(s),
            SolveArgsError::NotConverged { .. } => Self::Solver(s),
        }
    }
}

impl From<ParmsVerifyError> for MeqError {
    fn from(e: ParmsVerifyError) -> Self {
        let s = e.to_string();
        match e {
            ParmsVerifyError::NoFiles => Self::Args(s),
            ParmsVerifyError::Unreadable(_) => Self::Parms(s),
        }
    }
}

// Library code errors.

impl From<DomainError> for MeqError {
    fn from(e: DomainError) -> Self {
        Self::Grid(e.to_string())
    }
}

impl From<MatrixError> for MeqError {
    fn from(e: MatrixError) -> Self {
        Self::Model(e.to_string())
    }
}

impl From<PolcError> for MeqError {
    fn from(e: PolcError) -> Self {
        Self::Parms(e.to_string())
    }
}

impl From<EvalError> for MeqError {
    fn from(e: EvalError) -> Self {
        let s = e.to_string();
        match e {
            EvalError::Domain(e) => Self::from(e),
            EvalError::NoPolcForCell { .. } | EvalError::NoPolcs { .. } | EvalError::Polc { .. } => {
                Self::Parms(s)
            }
            EvalError::MultipleFreqSegments { .. } => Self::Grid(s),
            EvalError::NonMonotonicRequest { .. }
            | EvalError::ChildEvaluation { .. }
            | EvalError::WrongVellSetCount { .. }
            | EvalError::Failed { .. }
            | EvalError::Matrix(_) => Self::Model(s),
        }
    }
}

impl From<JonesError> for MeqError {
    fn from(e: JonesError) -> Self {
        match e {
            JonesError::Eval(e) => Self::from(e),
            _ => Self::Model(e.to_string()),
        }
    }
}

impl From<SolverError> for MeqError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::Eval(e) => Self::from(e),
            _ => Self::Solver(e.to_string()),
        }
    }
}

impl From<ParmDbError> for MeqError {
    fn from(e: ParmDbError) -> Self {
        let s = e.to_string();
        match e {
            ParmDbError::IO(e) => Self::from(e),
            _ => Self::Parms(s),
        }
    }
}

impl From<ModelError> for MeqError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Eval(e) => Self::from(e),
            ModelError::Jones(e) => Self::from(e),
            ModelError::ParmDb(e) => Self::from(e),
            ModelError::NoBaselines
            | ModelError::SourceOffSphere { .. }
            | ModelError::AutoCorrelation { .. }
            | ModelError::UnmatchedSolvable(_) => Self::Args(e.to_string()),
            ModelError::UnknownBaseline { .. }
            | ModelError::RaggedVisibilities { .. }
            | ModelError::GridMismatch { .. }
            | ModelError::Matrix(_) => Self::Model(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for MeqError {
    fn from(e: serde_json::Error) -> Self {
        Self::Generic(e.to_string())
    }
}

impl From<toml::ser::Error> for MeqError {
    fn from(e: toml::ser::Error) -> Self {
        Self::ArgFile(e.to_string())
    }
}

impl From<std::io::Error> for MeqError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}

impl From<log::SetLoggerError> for MeqError {
    fn from(e: log::SetLoggerError) -> Self {
        Self::Generic(format!("Failed to initialise logging: {e}"))
    }
}
