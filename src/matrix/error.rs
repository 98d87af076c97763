// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with value arithmetic.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    #[error("Cannot apply '{op}' to arrays of different shapes ({left:?} vs. {right:?})")]
    ShapeMismatch {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("'{op}' requires real arguments, but a complex value was supplied")]
    RealOperandRequired { op: &'static str },

    #[error("Cannot apply '{op}' to an empty array")]
    Empty { op: &'static str },

    #[error("Element ({ix}, {iy}) is out of bounds for an array of shape {shape:?}")]
    OutOfBounds {
        ix: usize,
        iy: usize,
        shape: (usize, usize),
    },
}
