// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
The value container produced by evaluating expressions.

A [`Matrix`] is one of four representations: a real or complex scalar, or a
real or complex array over (frequency, time) cells. Arithmetic between
representations follows two promotion rules: real ⊕ complex gives complex and
scalar ⊕ array gives array. Arrays are never broadcast against one another;
their shapes must match.

All arithmetic consumes the left operand by value. When the left operand is
already the representation of the result, its storage is updated in place and
returned, so chains like `a.try_mul(&b)?.try_add(&c)?` allocate at most once.
 */

mod error;
mod funcs;
mod ops;
#[cfg(test)]
mod tests;

pub use error::MatrixError;
pub use ops::BinaryOp;

use marlu::c64;
use ndarray::{prelude::*, Zip};
use strum_macros::Display;

/// The representation of a [`Matrix`].
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[strum(serialize_all = "title_case")]
pub enum MatrixKind {
    RealScalar,
    ComplexScalar,
    RealArray,
    ComplexArray,
}

impl MatrixKind {
    pub fn is_real(self) -> bool {
        matches!(self, MatrixKind::RealScalar | MatrixKind::RealArray)
    }

    pub fn is_scalar(self) -> bool {
        matches!(self, MatrixKind::RealScalar | MatrixKind::ComplexScalar)
    }

    /// The representation resulting from a binary operation between `self`
    /// and `other`.
    pub fn promote(self, other: MatrixKind) -> MatrixKind {
        match (
            self.is_real() && other.is_real(),
            self.is_scalar() && other.is_scalar(),
        ) {
            (true, true) => MatrixKind::RealScalar,
            (false, true) => MatrixKind::ComplexScalar,
            (true, false) => MatrixKind::RealArray,
            (false, false) => MatrixKind::ComplexArray,
        }
    }
}

/// A real or complex scalar or (frequency, time) array.
#[derive(Debug, Clone, PartialEq)]
pub enum Matrix {
    RealScalar(f64),
    ComplexScalar(c64),
    RealArray(Array2<f64>),
    ComplexArray(Array2<c64>),
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix::RealScalar(0.0)
    }
}

impl Matrix {
    pub fn zero() -> Matrix {
        Matrix::RealScalar(0.0)
    }

    pub fn one() -> Matrix {
        Matrix::RealScalar(1.0)
    }

    pub fn kind(&self) -> MatrixKind {
        match self {
            Matrix::RealScalar(_) => MatrixKind::RealScalar,
            Matrix::ComplexScalar(_) => MatrixKind::ComplexScalar,
            Matrix::RealArray(_) => MatrixKind::RealArray,
            Matrix::ComplexArray(_) => MatrixKind::ComplexArray,
        }
    }

    pub fn is_real(&self) -> bool {
        self.kind().is_real()
    }

    pub fn is_scalar(&self) -> bool {
        self.kind().is_scalar()
    }

    pub fn is_array(&self) -> bool {
        !self.is_scalar()
    }

    /// The `(nx, ny)` shape of the value. Scalars report `(1, 1)`.
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Matrix::RealScalar(_) | Matrix::ComplexScalar(_) => (1, 1),
            Matrix::RealArray(a) => a.dim(),
            Matrix::ComplexArray(a) => a.dim(),
        }
    }

    /// The number of values held.
    pub fn nelements(&self) -> usize {
        let (nx, ny) = self.shape();
        nx * ny
    }

    /// Get the value of a cell. Scalars have the same value in every cell.
    pub fn get(&self, ix: usize, iy: usize) -> Result<c64, MatrixError> {
        let out_of_bounds = || MatrixError::OutOfBounds {
            ix,
            iy,
            shape: self.shape(),
        };
        match self {
            Matrix::RealScalar(v) => Ok(c64::new(*v, 0.0)),
            Matrix::ComplexScalar(v) => Ok(*v),
            Matrix::RealArray(a) => a
                .get((ix, iy))
                .map(|v| c64::new(*v, 0.0))
                .ok_or_else(out_of_bounds),
            Matrix::ComplexArray(a) => a.get((ix, iy)).copied().ok_or_else(out_of_bounds),
        }
    }

    /// Get the value of a cell of a real matrix.
    pub fn get_real(&self, ix: usize, iy: usize) -> Result<f64, MatrixError> {
        if !self.is_real() {
            return Err(MatrixError::RealOperandRequired { op: "get_real" });
        }
        self.get(ix, iy).map(|v| v.re)
    }

    /// Broadcast a scalar into an `(nx, ny)` array of the same real/complex-
    /// ness. Arrays are returned as they are, provided their shape matches.
    pub fn expand(self, nx: usize, ny: usize) -> Result<Matrix, MatrixError> {
        match self {
            Matrix::RealScalar(v) => Ok(Matrix::RealArray(Array2::from_elem((nx, ny), v))),
            Matrix::ComplexScalar(v) => Ok(Matrix::ComplexArray(Array2::from_elem((nx, ny), v))),
            m => {
                if m.shape() != (nx, ny) {
                    return Err(MatrixError::ShapeMismatch {
                        op: "expand",
                        left: m.shape(),
                        right: (nx, ny),
                    });
                }
                Ok(m)
            }
        }
    }

    /// Promote a real matrix to a complex one with zero imaginary part.
    pub fn into_complex(self) -> Matrix {
        match self {
            Matrix::RealScalar(v) => Matrix::ComplexScalar(c64::new(v, 0.0)),
            Matrix::RealArray(a) => Matrix::ComplexArray(a.mapv(|v| c64::new(v, 0.0))),
            m => m,
        }
    }

    /// Combine two real matrices into a complex one. Array shapes must agree;
    /// a scalar is broadcast against an array.
    pub fn to_complex(real: &Matrix, imag: &Matrix) -> Result<Matrix, MatrixError> {
        use Matrix::*;

        const OP: &str = "to_complex";
        match (real, imag) {
            (RealScalar(re), RealScalar(im)) => Ok(ComplexScalar(c64::new(*re, *im))),
            (RealScalar(re), RealArray(im)) => {
                Ok(ComplexArray(im.mapv(|im| c64::new(*re, im))))
            }
            (RealArray(re), RealScalar(im)) => {
                Ok(ComplexArray(re.mapv(|re| c64::new(re, *im))))
            }
            (RealArray(re), RealArray(im)) => {
                if re.dim() != im.dim() {
                    return Err(MatrixError::ShapeMismatch {
                        op: OP,
                        left: re.dim(),
                        right: im.dim(),
                    });
                }
                Ok(ComplexArray(Zip::from(re).and(im).map_collect(
                    |&re, &im| c64::new(re, im),
                )))
            }
            _ => Err(MatrixError::RealOperandRequired { op: OP }),
        }
    }

    /// Iterate over the values as complex numbers.
    pub fn iter_complex(&self) -> Box<dyn Iterator<Item = c64> + '_> {
        match self {
            Matrix::RealScalar(v) => Box::new(std::iter::once(c64::new(*v, 0.0))),
            Matrix::ComplexScalar(v) => Box::new(std::iter::once(*v)),
            Matrix::RealArray(a) => Box::new(a.iter().map(|v| c64::new(*v, 0.0))),
            Matrix::ComplexArray(a) => Box::new(a.iter().copied()),
        }
    }
}

impl From<f64> for Matrix {
    fn from(v: f64) -> Self {
        Matrix::RealScalar(v)
    }
}

impl From<c64> for Matrix {
    fn from(v: c64) -> Self {
        Matrix::ComplexScalar(v)
    }
}

impl From<Array2<f64>> for Matrix {
    fn from(a: Array2<f64>) -> Self {
        Matrix::RealArray(a)
    }
}

impl From<Array2<c64>> for Matrix {
    fn from(a: Array2<c64>) -> Self {
        Matrix::ComplexArray(a)
    }
}

impl approx::AbsDiffEq for Matrix {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::EPSILON
    }

    /// Matrices are only considered equal if they share a representation and
    /// shape.
    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.kind() == other.kind()
            && self.shape() == other.shape()
            && self
                .iter_complex()
                .zip(other.iter_complex())
                .all(|(a, b)| (a - b).norm() <= epsilon)
    }
}
