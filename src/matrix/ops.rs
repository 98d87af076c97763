// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Elementwise binary arithmetic.
//!
//! Every pair of representations has its own arm below. The arms that keep
//! the left operand's representation update it in place.

use marlu::c64;
use ndarray::Zip;
use strum_macros::{Display, EnumIter, IntoStaticStr};

use super::{Matrix, MatrixError};

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, EnumIter, IntoStaticStr)]
pub enum BinaryOp {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
}

impl BinaryOp {
    #[inline(always)]
    pub fn real(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
        }
    }

    #[inline(always)]
    pub fn complex(self, a: c64, b: c64) -> c64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
        }
    }

    /// Real on the left, complex on the right.
    #[inline(always)]
    fn real_complex(self, a: f64, b: c64) -> c64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
        }
    }

    /// Complex on the left, real on the right.
    #[inline(always)]
    fn complex_real(self, a: c64, b: f64) -> c64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
        }
    }
}

impl Matrix {
    /// Apply `op` elementwise between `self` and `rhs`.
    pub fn binary(self, op: BinaryOp, rhs: &Matrix) -> Result<Matrix, MatrixError> {
        use Matrix::*;

        if self.is_array() && rhs.is_array() && self.shape() != rhs.shape() {
            return Err(MatrixError::ShapeMismatch {
                op: op.into(),
                left: self.shape(),
                right: rhs.shape(),
            });
        }

        let m = match (self, rhs) {
            // Real scalar on the left.
            (RealScalar(a), RealScalar(b)) => RealScalar(op.real(a, *b)),
            (RealScalar(a), ComplexScalar(b)) => ComplexScalar(op.real_complex(a, *b)),
            (RealScalar(a), RealArray(b)) => RealArray(b.mapv(|b| op.real(a, b))),
            (RealScalar(a), ComplexArray(b)) => ComplexArray(b.mapv(|b| op.real_complex(a, b))),

            // Complex scalar on the left.
            (ComplexScalar(a), RealScalar(b)) => ComplexScalar(op.complex_real(a, *b)),
            (ComplexScalar(a), ComplexScalar(b)) => ComplexScalar(op.complex(a, *b)),
            (ComplexScalar(a), RealArray(b)) => ComplexArray(b.mapv(|b| op.complex_real(a, b))),
            (ComplexScalar(a), ComplexArray(b)) => ComplexArray(b.mapv(|b| op.complex(a, b))),

            // Real array on the left.
            (RealArray(mut a), RealScalar(b)) => {
                a.mapv_inplace(|a| op.real(a, *b));
                RealArray(a)
            }
            (RealArray(a), ComplexScalar(b)) => ComplexArray(a.mapv(|a| op.real_complex(a, *b))),
            (RealArray(mut a), RealArray(b)) => {
                Zip::from(&mut a)
                    .and(b)
                    .for_each(|a, &b| *a = op.real(*a, b));
                RealArray(a)
            }
            (RealArray(a), ComplexArray(b)) => ComplexArray(
                Zip::from(&a)
                    .and(b)
                    .map_collect(|&a, &b| op.real_complex(a, b)),
            ),

            // Complex array on the left; the storage is always reused.
            (ComplexArray(mut a), RealScalar(b)) => {
                a.mapv_inplace(|a| op.complex_real(a, *b));
                ComplexArray(a)
            }
            (ComplexArray(mut a), ComplexScalar(b)) => {
                a.mapv_inplace(|a| op.complex(a, *b));
                ComplexArray(a)
            }
            (ComplexArray(mut a), RealArray(b)) => {
                Zip::from(&mut a)
                    .and(b)
                    .for_each(|a, &b| *a = op.complex_real(*a, b));
                ComplexArray(a)
            }
            (ComplexArray(mut a), ComplexArray(b)) => {
                Zip::from(&mut a)
                    .and(b)
                    .for_each(|a, &b| *a = op.complex(*a, b));
                ComplexArray(a)
            }
        };
        Ok(m)
    }

    pub fn try_add(self, rhs: &Matrix) -> Result<Matrix, MatrixError> {
        self.binary(BinaryOp::Add, rhs)
    }

    pub fn try_sub(self, rhs: &Matrix) -> Result<Matrix, MatrixError> {
        self.binary(BinaryOp::Sub, rhs)
    }

    pub fn try_mul(self, rhs: &Matrix) -> Result<Matrix, MatrixError> {
        self.binary(BinaryOp::Mul, rhs)
    }

    pub fn try_div(self, rhs: &Matrix) -> Result<Matrix, MatrixError> {
        self.binary(BinaryOp::Div, rhs)
    }

    /// Multiply every element by a real factor. Infallible.
    pub fn scale(self, factor: f64) -> Matrix {
        match self {
            Matrix::RealScalar(a) => Matrix::RealScalar(a * factor),
            Matrix::ComplexScalar(a) => Matrix::ComplexScalar(a * factor),
            Matrix::RealArray(mut a) => {
                a.mapv_inplace(|a| a * factor);
                Matrix::RealArray(a)
            }
            Matrix::ComplexArray(mut a) => {
                a.mapv_inplace(|a| a * factor);
                Matrix::ComplexArray(a)
            }
        }
    }

    /// Apply a real-only binary function elementwise. Scalars are broadcast.
    pub(super) fn real_binary<F>(
        self,
        rhs: &Matrix,
        op: &'static str,
        f: F,
    ) -> Result<Matrix, MatrixError>
    where
        F: Fn(f64, f64) -> f64,
    {
        use Matrix::*;

        match (self, rhs) {
            (RealScalar(a), RealScalar(b)) => Ok(RealScalar(f(a, *b))),
            (RealScalar(a), RealArray(b)) => Ok(RealArray(b.mapv(|b| f(a, b)))),
            (RealArray(mut a), RealScalar(b)) => {
                a.mapv_inplace(|a| f(a, *b));
                Ok(RealArray(a))
            }
            (RealArray(mut a), RealArray(b)) => {
                if a.dim() != b.dim() {
                    return Err(MatrixError::ShapeMismatch {
                        op,
                        left: a.dim(),
                        right: b.dim(),
                    });
                }
                Zip::from(&mut a).and(b).for_each(|a, &b| *a = f(*a, b));
                Ok(RealArray(a))
            }
            _ => Err(MatrixError::RealOperandRequired { op }),
        }
    }
}
