// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with solving for parameters.

use thiserror::Error;

use crate::{expr::EvalError, matrix::MatrixError};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("There are no solvable coefficients; make some parameters solvable first")]
    NothingToSolve,

    #[error("There are no equations to solve")]
    NoEquations,

    #[error("A derivative refers to solvable parameter index {spid}, but only {num_spids} are known")]
    SpidOutOfRange { spid: usize, num_spids: usize },

    #[error("Expected a solution update with {expected} values, but got {actual}")]
    UpdateLength { expected: usize, actual: usize },

    #[error("The normal matrix is singular (detected at column {column}); the equations don't constrain every solvable coefficient")]
    SingularNormalMatrix { column: usize },

    #[error("Equation '{equation}' couldn't be evaluated: {message}")]
    EquationFailed { equation: String, message: String },

    #[error("Equation '{equation}' produced {num} value planes; expected 1")]
    WrongVellSetCount { equation: String, num: usize },

    #[error("Equation '{equation}' has {observed:?} observed values, but its model has shape {model:?}")]
    ObservedShape {
        equation: String,
        model: (usize, usize),
        observed: (usize, usize),
    },

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Matrix(#[from] MatrixError),
}
