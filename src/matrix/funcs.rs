// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Elementwise functions and reductions.

use marlu::c64;

use super::{Matrix, MatrixError};
use crate::constants::{PI, TAU};

impl Matrix {
    /// Apply one function to real values and another to complex values,
    /// keeping the representation.
    fn map<FR, FC>(self, fr: FR, fc: FC) -> Matrix
    where
        FR: Fn(f64) -> f64,
        FC: Fn(c64) -> c64,
    {
        match self {
            Matrix::RealScalar(v) => Matrix::RealScalar(fr(v)),
            Matrix::ComplexScalar(v) => Matrix::ComplexScalar(fc(v)),
            Matrix::RealArray(mut a) => {
                a.mapv_inplace(fr);
                Matrix::RealArray(a)
            }
            Matrix::ComplexArray(mut a) => {
                a.mapv_inplace(fc);
                Matrix::ComplexArray(a)
            }
        }
    }

    /// Apply a function that maps complex values to reals.
    fn map_to_real<FR, FC>(self, fr: FR, fc: FC) -> Matrix
    where
        FR: Fn(f64) -> f64,
        FC: Fn(c64) -> f64,
    {
        match self {
            Matrix::RealScalar(v) => Matrix::RealScalar(fr(v)),
            Matrix::ComplexScalar(v) => Matrix::RealScalar(fc(v)),
            Matrix::RealArray(mut a) => {
                a.mapv_inplace(fr);
                Matrix::RealArray(a)
            }
            Matrix::ComplexArray(a) => Matrix::RealArray(a.mapv(fc)),
        }
    }

    fn require_real(&self, op: &'static str) -> Result<(), MatrixError> {
        if self.is_real() {
            Ok(())
        } else {
            Err(MatrixError::RealOperandRequired { op })
        }
    }

    pub fn negate(self) -> Matrix {
        self.map(|v| -v, |v| -v)
    }

    pub fn sin(self) -> Matrix {
        self.map(f64::sin, |v| v.sin())
    }

    pub fn cos(self) -> Matrix {
        self.map(f64::cos, |v| v.cos())
    }

    pub fn exp(self) -> Matrix {
        self.map(f64::exp, |v| v.exp())
    }

    /// Square root. Negative real values give NaN; use a complex value for
    /// the principal complex root.
    pub fn sqrt(self) -> Matrix {
        self.map(f64::sqrt, |v| v.sqrt())
    }

    /// Complex conjugate. Real values are unchanged.
    pub fn conj(self) -> Matrix {
        self.map(|v| v, |v| v.conj())
    }

    /// The magnitude of each value.
    pub fn abs(self) -> Matrix {
        self.map_to_real(f64::abs, |v| v.norm())
    }

    /// The squared magnitude of each value.
    pub fn norm_sqr(self) -> Matrix {
        self.map_to_real(|v| v * v, |v| v.norm_sqr())
    }

    pub fn real(self) -> Matrix {
        self.map_to_real(|v| v, |v| v.re)
    }

    pub fn imag(self) -> Matrix {
        self.map_to_real(|_| 0.0, |v| v.im)
    }

    pub fn asin(self) -> Result<Matrix, MatrixError> {
        self.require_real("asin")?;
        Ok(self.map(f64::asin, |v| v))
    }

    pub fn acos(self) -> Result<Matrix, MatrixError> {
        self.require_real("acos")?;
        Ok(self.map(f64::acos, |v| v))
    }

    /// `atan2(self, x)`, with `self` as the y argument.
    pub fn atan2(self, x: &Matrix) -> Result<Matrix, MatrixError> {
        self.real_binary(x, "atan2", f64::atan2)
    }

    /// The angular difference `self - other`, wrapped into [-π, π).
    pub fn posdiff(self, other: &Matrix) -> Result<Matrix, MatrixError> {
        self.real_binary(other, "posdiff", |x, y| {
            let d = (x - y + PI).rem_euclid(TAU) - PI;
            // rem_euclid can return TAU itself for tiny negative inputs.
            if d >= PI {
                d - TAU
            } else {
                d
            }
        })
    }

    /// Elementwise minimum.
    pub fn min(self, other: &Matrix) -> Result<Matrix, MatrixError> {
        self.real_binary(other, "min", f64::min)
    }

    /// Elementwise maximum.
    pub fn max(self, other: &Matrix) -> Result<Matrix, MatrixError> {
        self.real_binary(other, "max", f64::max)
    }

    /// The sum of all values as a scalar.
    pub fn sum(&self) -> Matrix {
        match self {
            Matrix::RealScalar(_) | Matrix::ComplexScalar(_) => self.clone(),
            Matrix::RealArray(a) => Matrix::RealScalar(a.sum()),
            Matrix::ComplexArray(a) => Matrix::ComplexScalar(a.sum()),
        }
    }

    /// The mean of all values as a scalar.
    pub fn mean(&self) -> Result<Matrix, MatrixError> {
        let n = self.nelements();
        if n == 0 {
            return Err(MatrixError::Empty { op: "mean" });
        }
        Ok(self.sum().scale(1.0 / n as f64))
    }

    /// The smallest value as a scalar.
    pub fn min_value(&self) -> Result<Matrix, MatrixError> {
        self.real_reduce("min", f64::min)
    }

    /// The largest value as a scalar.
    pub fn max_value(&self) -> Result<Matrix, MatrixError> {
        self.real_reduce("max", f64::max)
    }

    fn real_reduce<F>(&self, op: &'static str, f: F) -> Result<Matrix, MatrixError>
    where
        F: Fn(f64, f64) -> f64,
    {
        match self {
            Matrix::RealScalar(v) => Ok(Matrix::RealScalar(*v)),
            Matrix::RealArray(a) => a
                .iter()
                .copied()
                .reduce(f)
                .map(Matrix::RealScalar)
                .ok_or(MatrixError::Empty { op }),
            _ => Err(MatrixError::RealOperandRequired { op }),
        }
    }
}
