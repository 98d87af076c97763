// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Two-dimensional polynomial parameters.

A [`Polc`] holds the coefficients of a polynomial in frequency and time over
its own validity [`Domain`]. Coordinates are scaled into [-1, 1] using that
domain before evaluation, so high-order terms stay bounded.

Coefficients are indexed `[time order][freq order]`. The flat "storage order"
used for masks, solvable parameter indices and the solver's vectors has time
varying fastest, i.e. coefficient `(t, f)` lives at `f * num_time_orders + t`.
Persisted parameters depend on this ordering.
 */

mod error;

pub use error::PolcError;

use log::{debug, trace};
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{DEFAULT_PERTURBATION, MIN_RELATIVE_PERTURBATION_COEFF},
    domain::Domain,
    matrix::Matrix,
    solver::SpidCounter,
};

/// How big a step to give each coefficient when a solver perturbs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Perturbation {
    /// The same value for every coefficient.
    Single(f64),
    /// One value per coefficient, in storage order.
    PerCoeff(Vec<f64>),
}

impl Default for Perturbation {
    fn default() -> Self {
        Perturbation::Single(DEFAULT_PERTURBATION)
    }
}

/// The derivative of a polynomial with respect to one of its solvable
/// coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct PolcPerturbed {
    /// The coefficient's index in storage order.
    pub coeff_index: usize,
    pub spid: usize,
    /// The perturbation a solver should use for this coefficient.
    pub step: f64,
    /// The analytic derivative; this is the polynomial's basis function for
    /// the coefficient.
    pub deriv: Matrix,
}

/// The result of evaluating a [`Polc`] over a grid.
#[derive(Debug, Clone, PartialEq)]
pub struct PolcEval {
    pub value: Matrix,
    pub perturbed: Vec<PolcPerturbed>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polc {
    coeff: Array2<f64>,
    mask: Vec<bool>,
    domain: Domain,
    perturbation: Perturbation,
    relative_perturbation: bool,
    spids: Vec<Option<usize>>,
    max_nr_spid: usize,
}

impl Polc {
    /// A polynomial without any coefficients.
    pub fn empty(domain: Domain) -> Polc {
        Polc {
            coeff: Array2::zeros((0, 0)),
            mask: vec![],
            domain,
            perturbation: Perturbation::default(),
            relative_perturbation: true,
            spids: vec![],
            max_nr_spid: 0,
        }
    }

    /// A polynomial with the given coefficients (shape: `(num_time_orders,
    /// num_freq_orders)`), all of which may be solved for.
    pub fn new(coeff: Array2<f64>, domain: Domain) -> Polc {
        let mut polc = Polc::empty(domain);
        polc.set_coeff(coeff);
        polc
    }

    /// A polynomial with a single (constant) coefficient.
    pub fn constant(value: f64, domain: Domain) -> Polc {
        Polc::new(Array2::from_elem((1, 1), value), domain)
    }

    pub fn coeff(&self) -> &Array2<f64> {
        &self.coeff
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn perturbation(&self) -> &Perturbation {
        &self.perturbation
    }

    pub fn is_relative_perturbation(&self) -> bool {
        self.relative_perturbation
    }

    /// The solvable parameter index of each coefficient in storage order.
    pub fn spids(&self) -> &[Option<usize>] {
        &self.spids
    }

    /// One more than the largest solvable parameter index assigned to this
    /// polynomial (0 if nothing is solvable).
    pub fn max_nr_spid(&self) -> usize {
        self.max_nr_spid
    }

    pub fn num_time_orders(&self) -> usize {
        self.coeff.dim().0
    }

    pub fn num_freq_orders(&self) -> usize {
        self.coeff.dim().1
    }

    pub fn nelements(&self) -> usize {
        self.coeff.len()
    }

    pub fn num_solvable(&self) -> usize {
        self.spids.iter().flatten().count()
    }

    pub fn is_solvable(&self) -> bool {
        self.spids.iter().any(Option::is_some)
    }

    /// The first solvable parameter index assigned to this polynomial.
    pub fn first_spid(&self) -> Option<usize> {
        self.spids.iter().flatten().copied().min()
    }

    /// The (time order, freq order) of a coefficient in storage order.
    fn orders(&self, index: usize) -> (usize, usize) {
        let nt = self.num_time_orders();
        (index % nt, index / nt)
    }

    /// The value of a coefficient in storage order.
    fn coeff_at(&self, index: usize) -> f64 {
        self.coeff[self.orders(index)]
    }

    /// Replace the coefficients. All coefficients become solvable candidates
    /// and any existing solvable parameter indices are discarded.
    pub fn set_coeff(&mut self, coeff: Array2<f64>) {
        let n = coeff.len();
        self.coeff = coeff;
        self.mask = vec![true; n];
        self.spids = vec![None; n];
        self.max_nr_spid = 0;
        self.reset_stale_perturbation();
    }

    /// Replace the coefficients and the solvability mask together. `mask` is in
    /// storage order.
    pub fn set_coeff_masked(&mut self, coeff: Array2<f64>, mask: Vec<bool>) -> Result<(), PolcError> {
        if mask.len() != coeff.len() {
            return Err(PolcError::ShapeMismatch {
                what: "the solvable mask",
                expected: coeff.len(),
                actual: mask.len(),
            });
        }
        let n = coeff.len();
        self.coeff = coeff;
        self.mask = mask;
        self.spids = vec![None; n];
        self.max_nr_spid = 0;
        self.reset_stale_perturbation();
        Ok(())
    }

    /// Per-coefficient perturbations only make sense for the coefficients they
    /// were given for. If the number of coefficients changed, go back to the
    /// default single perturbation.
    fn reset_stale_perturbation(&mut self) {
        if let Perturbation::PerCoeff(v) = &self.perturbation {
            if v.len() != self.nelements() {
                debug!(
                    "Discarding {} per-coefficient perturbations; the polynomial now has {} coefficients",
                    v.len(),
                    self.nelements()
                );
                self.perturbation = Perturbation::default();
            }
        }
    }

    pub fn set_perturbation(
        &mut self,
        perturbation: Perturbation,
        relative: bool,
    ) -> Result<(), PolcError> {
        if let Perturbation::PerCoeff(v) = &perturbation {
            if v.len() != self.nelements() {
                return Err(PolcError::ShapeMismatch {
                    what: "the perturbations",
                    expected: self.nelements(),
                    actual: v.len(),
                });
            }
        }
        self.perturbation = perturbation;
        self.relative_perturbation = relative;
        Ok(())
    }

    /// The perturbation step for a coefficient in storage order.
    ///
    /// Relative perturbations scale with the coefficient's magnitude, so a
    /// positive factor always gives a positive step. Relative perturbations of
    /// (nearly) zero-valued coefficients fall back to the perturbation factor
    /// itself as an absolute step.
    pub fn perturbation_step(&self, index: usize) -> f64 {
        let p = match &self.perturbation {
            Perturbation::Single(p) => *p,
            Perturbation::PerCoeff(v) => v.get(index).copied().unwrap_or(DEFAULT_PERTURBATION),
        };
        if !self.relative_perturbation {
            return p;
        }
        let c = self.coeff_at(index);
        if c.abs() < MIN_RELATIVE_PERTURBATION_COEFF {
            p
        } else {
            p * c.abs()
        }
    }

    /// Assign consecutive solvable parameter indices to each masked-in
    /// coefficient in storage order, returning how many were assigned.
    ///
    /// This fails if the polynomial is already solvable; registering the same
    /// coefficients twice with a solver is always a mistake.
    pub fn make_solvable(&mut self, counter: &mut SpidCounter) -> Result<usize, PolcError> {
        let num_solvable = self.num_solvable();
        if num_solvable > 0 {
            return Err(PolcError::AlreadySolvable { num_solvable });
        }

        let mut count = 0;
        for (spid, &solvable) in self.spids.iter_mut().zip(self.mask.iter()) {
            if solvable {
                let next = counter.next_spid();
                *spid = Some(next);
                self.max_nr_spid = next + 1;
                count += 1;
            }
        }
        trace!("Assigned {count} solvable parameter indices");
        Ok(count)
    }

    /// Make every coefficient unsolvable.
    pub fn clear_solvable(&mut self) {
        self.spids.iter_mut().for_each(|s| *s = None);
        self.max_nr_spid = 0;
    }

    /// Write the values of the solvable coefficients into `values` at their
    /// solvable parameter indices. This is the solver's starting point.
    pub fn get_initial(&self, values: &mut [f64]) -> Result<(), PolcError> {
        for (index, spid) in self.solvable() {
            let len = values.len();
            let v = values
                .get_mut(spid)
                .ok_or(PolcError::SolverIndexOutOfRange { spid, len })?;
            *v = self.coeff_at(index);
        }
        Ok(())
    }

    /// The current coefficients.
    pub fn get_current_value(&self) -> Array2<f64> {
        self.coeff.clone()
    }

    /// Add the solver's update to each solvable coefficient. `delta` starts at
    /// this polynomial's first solvable parameter index, i.e. coefficient `i`
    /// gets `delta[spid[i] - first_spid]`. Nothing is changed if any index is
    /// out of range.
    pub fn update(&mut self, delta: &[f64]) -> Result<(), PolcError> {
        let first = match self.first_spid() {
            Some(first) => first,
            None => return Ok(()),
        };
        let len = delta.len();
        if let Some(&spid) = self.spids.iter().flatten().find(|&&s| s - first >= len) {
            return Err(PolcError::SolverIndexOutOfRange { spid, len });
        }

        let updates: Vec<_> = self.solvable().collect();
        for (index, spid) in updates {
            let orders = self.orders(index);
            self.coeff[orders] += delta[spid - first];
        }
        Ok(())
    }

    /// The (storage index, spid) pairs of the solvable coefficients.
    fn solvable(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.spids
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|s| (i, s)))
    }

    /// Check the relationships between the coefficients, mask and solvable
    /// parameter indices.
    pub fn check_invariants(&self) -> Result<(), PolcError> {
        let n = self.nelements();
        if self.mask.len() != n || self.spids.len() != n {
            return Err(PolcError::InvariantViolated(format!(
                "{n} coefficients, but {} mask entries and {} spids",
                self.mask.len(),
                self.spids.len()
            )));
        }
        if let Some(i) = self
            .mask
            .iter()
            .zip(self.spids.iter())
            .position(|(m, s)| !m && s.is_some())
        {
            return Err(PolcError::InvariantViolated(format!(
                "coefficient {i} is masked out but has a solvable parameter index"
            )));
        }
        Ok(())
    }

    /// Evaluate the polynomial at the centres of a grid. `freqs` and `times`
    /// are the cell centres along each axis; the resulting arrays have shape
    /// `(freqs.len(), times.len())`. If `calc_derivatives` is set, the
    /// derivative with respect to each solvable coefficient is also returned.
    pub fn evaluate(
        &self,
        freqs: &[f64],
        times: &[f64],
        calc_derivatives: bool,
    ) -> Result<PolcEval, PolcError> {
        let (nt, nf) = self.coeff.dim();
        if nt == 0 || nf == 0 {
            return Err(PolcError::NoCoefficients);
        }
        self.domain.check_scalable()?;

        let perturbed = |deriv_for: &dyn Fn(usize, usize) -> Matrix| -> Vec<PolcPerturbed> {
            if !calc_derivatives {
                return vec![];
            }
            self.solvable()
                .map(|(coeff_index, spid)| {
                    let (t, f) = self.orders(coeff_index);
                    PolcPerturbed {
                        coeff_index,
                        spid,
                        step: self.perturbation_step(coeff_index),
                        deriv: deriv_for(t, f),
                    }
                })
                .collect()
        };

        // A constant polynomial doesn't need its coordinates scaled.
        if nt == 1 && nf == 1 {
            return Ok(PolcEval {
                value: Matrix::RealScalar(self.coeff[(0, 0)]),
                perturbed: perturbed(&|_, _| Matrix::one()),
            });
        }

        // Only scale the axes that the polynomial actually varies along.
        let xs = if nf > 1 {
            freqs
                .iter()
                .map(|&f| self.domain.scale_freq(f))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            vec![0.0; freqs.len()]
        };
        let ys = if nt > 1 {
            times
                .iter()
                .map(|&t| self.domain.scale_time(t))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            vec![0.0; times.len()]
        };

        let shape = (xs.len(), ys.len());
        let value = Array2::from_shape_fn(shape, |(ix, iy)| {
            let (x, y) = (xs[ix], ys[iy]);
            // Horner along frequency for each time order, then along time.
            self.coeff
                .outer_iter()
                .rev()
                .fold(0.0, |acc_t, row| {
                    let poly_f = row.iter().rev().fold(0.0, |acc_f, &c| acc_f * x + c);
                    acc_t * y + poly_f
                })
        });

        Ok(PolcEval {
            value: Matrix::RealArray(value),
            perturbed: perturbed(&|t, f| {
                if t == 0 && f == 0 {
                    Matrix::one()
                } else {
                    Matrix::RealArray(Array2::from_shape_fn(shape, |(ix, iy)| {
                        xs[ix].powi(f as i32) * ys[iy].powi(t as i32)
                    }))
                }
            }),
        })
    }
}
