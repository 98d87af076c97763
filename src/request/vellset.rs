// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Value planes with derivatives.
//!
//! A [`VellSet`] carries a value, optional flags and the partial derivatives of
//! the value with respect to each solvable coefficient it depends on. The
//! arithmetic here applies the sum, product, quotient and chain rules so that
//! derivatives are carried analytically through any composition of
//! operations. A coefficient that only one operand depends on contributes only
//! through that operand's term.

use std::rc::Rc;

use indexmap::IndexMap;
use marlu::c64;
use ndarray::{Array2, Zip};

use crate::matrix::{Matrix, MatrixError};

/// Identifies one coefficient of one parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PerturbKey {
    pub parm: Rc<str>,
    /// The coefficient's index in storage order.
    pub coeff: usize,
}

/// The derivative of a value with respect to one solvable coefficient.
#[derive(Debug, Clone, PartialEq)]
pub struct Perturbed {
    /// The coefficient's solvable parameter index; i.e. its column in the
    /// solver's Jacobian.
    pub spid: usize,
    /// The perturbation the parameter asks solvers to use for this
    /// coefficient.
    pub step: f64,
    pub deriv: Matrix,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct VellSet {
    value: Matrix,
    flags: Option<Array2<bool>>,
    perturbed: IndexMap<PerturbKey, Perturbed>,
    fail: Option<String>,
}

/// How an operand's derivative contributes to the derivative of a result.
enum Partial {
    One,
    MinusOne,
    Factor(Matrix),
}

impl Partial {
    fn apply(&self, d: &Matrix) -> Result<Matrix, MatrixError> {
        match self {
            Partial::One => Ok(d.clone()),
            Partial::MinusOne => Ok(d.clone().negate()),
            Partial::Factor(p) => d.clone().try_mul(p),
        }
    }
}

impl VellSet {
    pub fn new(value: Matrix) -> VellSet {
        VellSet {
            value,
            ..Default::default()
        }
    }

    /// A value plane that couldn't be computed.
    pub fn failed<S: Into<String>>(message: S) -> VellSet {
        VellSet {
            fail: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn value(&self) -> &Matrix {
        &self.value
    }

    pub fn into_value(self) -> Matrix {
        self.value
    }

    pub fn flags(&self) -> Option<&Array2<bool>> {
        self.flags.as_ref()
    }

    pub fn set_flags(&mut self, flags: Option<Array2<bool>>) {
        self.flags = flags;
    }

    /// Flag every cell whose value satisfies `predicate`. Existing flags are
    /// kept. A scalar value is expanded over the `(nx, ny)` grid.
    pub fn set_flags_where<F>(&mut self, nx: usize, ny: usize, predicate: F) -> Result<(), MatrixError>
    where
        F: Fn(c64) -> bool,
    {
        let expanded = self.value.clone().expand(nx, ny)?;
        let mut new_flags = Array2::from_elem((nx, ny), false);
        for ((ix, iy), flag) in new_flags.indexed_iter_mut() {
            *flag = predicate(expanded.get(ix, iy)?);
        }
        self.flags = Some(match self.flags.take() {
            Some(old) => or_flags(&old, &new_flags)?,
            None => new_flags,
        });
        Ok(())
    }

    pub fn perturbed(&self) -> &IndexMap<PerturbKey, Perturbed> {
        &self.perturbed
    }

    pub fn insert_perturbed(&mut self, key: PerturbKey, perturbed: Perturbed) {
        self.perturbed.insert(key, perturbed);
    }

    pub fn has_perturbed(&self) -> bool {
        !self.perturbed.is_empty()
    }

    /// The value with the coefficient `key` perturbed by its step, to first
    /// order. For a value that is linear in the coefficient (e.g. a
    /// polynomial), this is exact.
    pub fn perturbed_value(&self, key: &PerturbKey) -> Option<Result<Matrix, MatrixError>> {
        self.perturbed.get(key).map(|p| {
            let delta = p.deriv.clone().scale(p.step);
            self.value.clone().try_add(&delta)
        })
    }

    pub fn is_failed(&self) -> bool {
        self.fail.is_some()
    }

    pub fn fail_message(&self) -> Option<&str> {
        self.fail.as_deref()
    }

    /// If either operand has failed, the failed result of combining them.
    fn propagate_fail(a: &VellSet, b: &VellSet) -> Option<VellSet> {
        match (&a.fail, &b.fail) {
            (None, None) => None,
            (Some(m), None) | (None, Some(m)) => Some(VellSet::failed(m.clone())),
            (Some(m1), Some(m2)) => Some(VellSet::failed(format!("{m1}; {m2}"))),
        }
    }

    fn combine_flags(a: &VellSet, b: &VellSet) -> Result<Option<Array2<bool>>, MatrixError> {
        match (&a.flags, &b.flags) {
            (None, None) => Ok(None),
            (Some(f), None) | (None, Some(f)) => Ok(Some(f.clone())),
            (Some(f1), Some(f2)) => or_flags(f1, f2).map(Some),
        }
    }

    /// Combine the derivatives of two operands given the partial derivatives
    /// of the result with respect to each operand.
    fn chain2(
        a: &VellSet,
        pa: Partial,
        b: &VellSet,
        pb: Partial,
    ) -> Result<IndexMap<PerturbKey, Perturbed>, MatrixError> {
        let mut out = IndexMap::with_capacity(a.perturbed.len().max(b.perturbed.len()));
        for (key, p) in &a.perturbed {
            let mut deriv = pa.apply(&p.deriv)?;
            if let Some(q) = b.perturbed.get(key) {
                deriv = deriv.try_add(&pb.apply(&q.deriv)?)?;
            }
            out.insert(
                key.clone(),
                Perturbed {
                    spid: p.spid,
                    step: p.step,
                    deriv,
                },
            );
        }
        for (key, q) in &b.perturbed {
            if a.perturbed.contains_key(key) {
                continue;
            }
            out.insert(
                key.clone(),
                Perturbed {
                    spid: q.spid,
                    step: q.step,
                    deriv: pb.apply(&q.deriv)?,
                },
            );
        }
        Ok(out)
    }

    /// Apply a unary function given its derivative at the operand's value.
    fn chain1(&self, value: Matrix, partial: Partial) -> Result<VellSet, MatrixError> {
        if self.is_failed() {
            return Ok(self.clone());
        }
        let mut perturbed = IndexMap::with_capacity(self.perturbed.len());
        for (key, p) in &self.perturbed {
            perturbed.insert(
                key.clone(),
                Perturbed {
                    spid: p.spid,
                    step: p.step,
                    deriv: partial.apply(&p.deriv)?,
                },
            );
        }
        Ok(VellSet {
            value,
            flags: self.flags.clone(),
            perturbed,
            fail: None,
        })
    }

    fn binary(
        a: &VellSet,
        b: &VellSet,
        value: impl FnOnce() -> Result<Matrix, MatrixError>,
        partials: impl FnOnce() -> Result<(Partial, Partial), MatrixError>,
    ) -> Result<VellSet, MatrixError> {
        if let Some(failed) = VellSet::propagate_fail(a, b) {
            return Ok(failed);
        }
        let value = value()?;
        let perturbed = if a.has_perturbed() || b.has_perturbed() {
            let (pa, pb) = partials()?;
            VellSet::chain2(a, pa, b, pb)?
        } else {
            IndexMap::new()
        };
        Ok(VellSet {
            value,
            flags: VellSet::combine_flags(a, b)?,
            perturbed,
            fail: None,
        })
    }

    pub fn add(a: &VellSet, b: &VellSet) -> Result<VellSet, MatrixError> {
        VellSet::binary(
            a,
            b,
            || a.value.clone().try_add(&b.value),
            || Ok((Partial::One, Partial::One)),
        )
    }

    pub fn sub(a: &VellSet, b: &VellSet) -> Result<VellSet, MatrixError> {
        VellSet::binary(
            a,
            b,
            || a.value.clone().try_sub(&b.value),
            || Ok((Partial::One, Partial::MinusOne)),
        )
    }

    pub fn mul(a: &VellSet, b: &VellSet) -> Result<VellSet, MatrixError> {
        VellSet::binary(
            a,
            b,
            || a.value.clone().try_mul(&b.value),
            || {
                Ok((
                    Partial::Factor(b.value.clone()),
                    Partial::Factor(a.value.clone()),
                ))
            },
        )
    }

    pub fn div(a: &VellSet, b: &VellSet) -> Result<VellSet, MatrixError> {
        VellSet::binary(
            a,
            b,
            || a.value.clone().try_div(&b.value),
            || {
                // d(a/b) = da/b - a/b² db
                let inv_b = Matrix::one().try_div(&b.value)?;
                let minus_a_b2 = a
                    .value
                    .clone()
                    .try_mul(&inv_b)?
                    .try_mul(&inv_b)?
                    .negate();
                Ok((Partial::Factor(inv_b), Partial::Factor(minus_a_b2)))
            },
        )
    }

    pub fn negate(&self) -> Result<VellSet, MatrixError> {
        self.chain1(self.value.clone().negate(), Partial::MinusOne)
    }

    pub fn conj(&self) -> Result<VellSet, MatrixError> {
        if self.is_failed() {
            return Ok(self.clone());
        }
        let mut out = self.clone();
        out.value = out.value.conj();
        for p in out.perturbed.values_mut() {
            p.deriv = std::mem::take(&mut p.deriv).conj();
        }
        Ok(out)
    }

    pub fn sin(&self) -> Result<VellSet, MatrixError> {
        let partial = Partial::Factor(self.value.clone().cos());
        self.chain1(self.value.clone().sin(), partial)
    }

    pub fn cos(&self) -> Result<VellSet, MatrixError> {
        let partial = Partial::Factor(self.value.clone().sin().negate());
        self.chain1(self.value.clone().cos(), partial)
    }

    pub fn exp(&self) -> Result<VellSet, MatrixError> {
        let value = self.value.clone().exp();
        self.chain1(value.clone(), Partial::Factor(value))
    }

    pub fn sqrt(&self) -> Result<VellSet, MatrixError> {
        let value = self.value.clone().sqrt();
        // d sqrt(x) = dx / (2 sqrt(x))
        let partial = Matrix::RealScalar(0.5).try_div(&value)?;
        self.chain1(value, Partial::Factor(partial))
    }

    /// e^{iφ} for a real phase φ (given as `self`), with derivative
    /// i e^{iφ} dφ.
    pub fn cexp_i(&self) -> Result<VellSet, MatrixError> {
        let phase = &self.value;
        let value = Matrix::to_complex(&phase.clone().cos(), &phase.clone().sin())?;
        let partial = value.clone().try_mul(&Matrix::ComplexScalar(c64::new(0.0, 1.0)))?;
        self.chain1(value, Partial::Factor(partial))
    }

    /// Multiply by a constant real factor.
    pub fn scale(&self, factor: f64) -> Result<VellSet, MatrixError> {
        self.chain1(
            self.value.clone().scale(factor),
            Partial::Factor(Matrix::RealScalar(factor)),
        )
    }
}

fn or_flags(a: &Array2<bool>, b: &Array2<bool>) -> Result<Array2<bool>, MatrixError> {
    if a.dim() != b.dim() {
        return Err(MatrixError::ShapeMismatch {
            op: "flags",
            left: a.dim(),
            right: b.dim(),
        });
    }
    Ok(Zip::from(a).and(b).map_collect(|&a, &b| a || b))
}
