// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with Jones matrix expressions.

use thiserror::Error;

use crate::{expr::EvalError, matrix::MatrixError, request::RequestId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum JonesError {
    #[error("Tried to combine Jones matrices from different requests ({left} and {right})")]
    StaleOperand { left: RequestId, right: RequestId },

    #[error("Jones matrix element {element} has failed: {message}")]
    ElementFailed {
        element: &'static str,
        message: String,
    },

    #[error("Node '{node}' needs at least one Jones matrix to multiply")]
    NoOperands { node: String },

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Matrix(#[from] MatrixError),
}
