// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with building and evaluating sky models.

use thiserror::Error;

use crate::{
    expr::EvalError, jones::JonesError, matrix::MatrixError, parmdb::ParmDbError,
};

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("No baselines were specified")]
    NoBaselines,

    #[error("Source '{source_name}' at (l, m) = ({l}, {m}) is not on the celestial sphere; l² + m² must be at most 1")]
    SourceOffSphere { source_name: String, l: f64, m: f64 },

    #[error("Baseline {station1}-{station2} has the same station at both ends")]
    AutoCorrelation { station1: String, station2: String },

    #[error("Observed visibilities include baseline {station1}-{station2}, which isn't in the model")]
    UnknownBaseline { station1: String, station2: String },

    #[error("The solvable parameter pattern '{0}' didn't match any parameter in the model")]
    UnmatchedSolvable(String),

    #[error("Baseline {baseline}: {element} visibilities have {actual} values in row {row}, but {expected} were expected")]
    RaggedVisibilities {
        baseline: String,
        element: &'static str,
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Expected {expected} {axis} in the visibility file, but found {actual}")]
    GridMismatch {
        axis: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Jones(#[from] JonesError),

    #[error(transparent)]
    Matrix(#[from] MatrixError),

    #[error(transparent)]
    ParmDb(#[from] ParmDbError),
}
