// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with polynomial parameters.

use thiserror::Error;

use crate::domain::DomainError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolcError {
    #[error("Tried to evaluate a polynomial without any coefficients")]
    NoCoefficients,

    #[error("Expected {what} to have {expected} elements, but it had {actual} instead")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("The polynomial already has {num_solvable} solvable coefficients; clear them before making it solvable again")]
    AlreadySolvable { num_solvable: usize },

    #[error("Solvable parameter index {spid} is out of range for a solver vector of length {len}")]
    SolverIndexOutOfRange { spid: usize, len: usize },

    #[error("Polynomial invariant violated: {0}")]
    InvariantViolated(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}
