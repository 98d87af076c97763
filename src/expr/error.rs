// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with evaluating expression graphs.

use thiserror::Error;

use crate::{domain::DomainError, matrix::MatrixError, polc::PolcError, request::RequestId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Node '{node}' was asked to evaluate request {requested} after already evaluating the later request {cached}; request IDs must increase")]
    NonMonotonicRequest {
        node: String,
        cached: RequestId,
        requested: RequestId,
    },

    #[error("Node '{node}' couldn't be evaluated because of its children:\n  {}", .messages.join("\n  "))]
    ChildEvaluation { node: String, messages: Vec<String> },

    #[error("Node '{node}' requires a single frequency segment in the request grid, but there are {num_segments}")]
    MultipleFreqSegments { node: String, num_segments: usize },

    #[error("Parameter '{parm}' has no polynomial covering the cell at {freq} Hz, {time} s")]
    NoPolcForCell { parm: String, freq: f64, time: f64 },

    #[error("Parameter '{parm}' has no polynomials")]
    NoPolcs { parm: String },

    #[error("Parameter '{parm}': {err}")]
    Polc {
        parm: String,
        #[source]
        err: PolcError,
    },

    #[error("Node '{node}' produced {num} value planes; expected {expected}")]
    WrongVellSetCount {
        node: String,
        num: usize,
        expected: usize,
    },

    #[error("Node '{node}' failed: {message}")]
    Failed { node: String, message: String },

    #[error(transparent)]
    Matrix(#[from] MatrixError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl EvalError {
    /// Errors in the protocol between the engine and its caller. These are
    /// never folded into a parent's failed value plane.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EvalError::NonMonotonicRequest { .. })
    }
}
