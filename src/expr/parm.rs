// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parameter nodes: named values defined by one or more polynomials.

use std::{
    cell::{Ref, RefCell},
    rc::Rc,
};

use indexmap::IndexMap;
use log::debug;
use ndarray::prelude::*;
use ndarray::Zip;

use super::{EvalError, ExprNode, ResultCache};
use crate::{
    matrix::{Matrix, MatrixError},
    polc::{Polc, PolcError, PolcEval},
    request::{NodeResult, PerturbKey, Perturbed, Request, VellSet},
    solver::SpidCounter,
};

/// A named parameter. Each polynomial is valid over its own domain, and each
/// cell of a request is evaluated by the first polynomial whose domain
/// contains the cell's centre. With a single polynomial, every cell is
/// evaluated by it.
///
/// Perturbation keys number the coefficients of all polynomials together: the
/// coefficients of the second polynomial follow those of the first, and so
/// on.
#[derive(Debug)]
pub struct ParmNode {
    name: Rc<str>,
    polcs: RefCell<Vec<Polc>>,
    cache: ResultCache,
}

impl ParmNode {
    pub fn new<S: AsRef<str>>(name: S, polcs: Vec<Polc>) -> ParmNode {
        ParmNode {
            name: Rc::from(name.as_ref()),
            polcs: RefCell::new(polcs),
            cache: ResultCache::new(),
        }
    }

    pub fn polcs(&self) -> Ref<'_, Vec<Polc>> {
        self.polcs.borrow()
    }

    /// Replace the polynomials. Like [`ParmNode::update`], this is only seen
    /// by requests with new IDs.
    pub fn set_polcs(&self, polcs: Vec<Polc>) {
        *self.polcs.borrow_mut() = polcs;
    }

    pub fn num_solvable(&self) -> usize {
        self.polcs.borrow().iter().map(Polc::num_solvable).sum()
    }

    /// Make the masked-in coefficients of every polynomial solvable, in
    /// polynomial order. Returns how many solvable parameter indices were
    /// assigned.
    pub fn make_solvable(&self, counter: &mut SpidCounter) -> Result<usize, EvalError> {
        let mut polcs = self.polcs.borrow_mut();
        let mut count = 0;
        for polc in polcs.iter_mut() {
            count += polc.make_solvable(counter).map_err(|e| self.polc_err(e))?;
        }
        debug!("Parameter '{}' has {count} solvable coefficients", self.name);
        Ok(count)
    }

    pub fn clear_solvable(&self) {
        self.polcs
            .borrow_mut()
            .iter_mut()
            .for_each(Polc::clear_solvable);
    }

    /// Write the current values of the solvable coefficients into `values`.
    pub fn get_initial(&self, values: &mut [f64]) -> Result<(), EvalError> {
        for polc in self.polcs.borrow().iter() {
            polc.get_initial(values).map_err(|e| self.polc_err(e))?;
        }
        Ok(())
    }

    /// Apply a solver update to the solvable coefficients. Results cached by
    /// this node and its parents are untouched; the updated values are seen by
    /// the next request.
    pub fn update(&self, delta: &[f64]) -> Result<(), EvalError> {
        let mut polcs = self.polcs.borrow_mut();
        // Check every polynomial before changing any of them.
        for polc in polcs.iter() {
            if let Some(&spid) = polc.spids().iter().flatten().find(|&&s| s >= delta.len()) {
                return Err(self.polc_err(PolcError::SolverIndexOutOfRange {
                    spid,
                    len: delta.len(),
                }));
            }
        }
        // Each polynomial takes the part of the solution starting at its own
        // first solvable index.
        for polc in polcs.iter_mut() {
            if let Some(first) = polc.first_spid() {
                polc.update(&delta[first..]).map_err(|e| self.polc_err(e))?;
            }
        }
        Ok(())
    }

    fn polc_err(&self, err: PolcError) -> EvalError {
        EvalError::Polc {
            parm: self.name.to_string(),
            err,
        }
    }

    fn key(&self, coeff: usize) -> PerturbKey {
        PerturbKey {
            parm: Rc::clone(&self.name),
            coeff,
        }
    }

    fn vellset_from(&self, eval: PolcEval) -> VellSet {
        let mut vs = VellSet::new(eval.value);
        for p in eval.perturbed {
            vs.insert_perturbed(
                self.key(p.coeff_index),
                Perturbed {
                    spid: p.spid,
                    step: p.step,
                    deriv: p.deriv,
                },
            );
        }
        vs
    }

    /// Evaluate several polynomials, each over the cells its domain covers.
    fn evaluate_tiled(
        &self,
        polcs: &[Polc],
        freqs: &[f64],
        times: &[f64],
        calc_derivatives: bool,
    ) -> Result<VellSet, EvalError> {
        let shape = (freqs.len(), times.len());
        let mut owner = Array2::zeros(shape);
        for ((ix, iy), owner) in owner.indexed_iter_mut() {
            let (freq, time) = (freqs[ix], times[iy]);
            *owner = polcs
                .iter()
                .position(|p| p.domain().contains(freq, time))
                .ok_or_else(|| EvalError::NoPolcForCell {
                    parm: self.name.to_string(),
                    freq,
                    time,
                })?;
        }

        let mut value = Array2::zeros(shape);
        let mut perturbed = IndexMap::new();
        let mut offset = 0;
        for (i, polc) in polcs.iter().enumerate() {
            let polc_offset = offset;
            offset += polc.nelements();
            if !owner.iter().any(|&o| o == i) {
                continue;
            }

            let eval = polc
                .evaluate(freqs, times, calc_derivatives)
                .map_err(|e| self.polc_err(e))?;
            let v = real_array(eval.value, shape)?;
            Zip::from(&mut value)
                .and(&owner)
                .and(&v)
                .for_each(|out, &o, &v| {
                    if o == i {
                        *out = v
                    }
                });

            for p in eval.perturbed {
                // Outside its own cells, a coefficient has no effect.
                let d = real_array(p.deriv, shape)?;
                let deriv = Zip::from(&owner)
                    .and(&d)
                    .map_collect(|&o, &d| if o == i { d } else { 0.0 });
                perturbed.insert(
                    self.key(polc_offset + p.coeff_index),
                    Perturbed {
                        spid: p.spid,
                        step: p.step,
                        deriv: Matrix::RealArray(deriv),
                    },
                );
            }
        }

        let mut vs = VellSet::new(Matrix::RealArray(value));
        for (key, p) in perturbed {
            vs.insert_perturbed(key, p);
        }
        Ok(vs)
    }
}

fn real_array(m: Matrix, (nx, ny): (usize, usize)) -> Result<Array2<f64>, MatrixError> {
    match m.expand(nx, ny)? {
        Matrix::RealArray(a) => Ok(a),
        _ => Err(MatrixError::RealOperandRequired {
            op: "parameter evaluation",
        }),
    }
}

impl ExprNode for ParmNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn cache(&self) -> &ResultCache {
        &self.cache
    }

    fn calc_result(&self, request: &Request) -> Result<NodeResult, EvalError> {
        let cells = request.cells();
        let freqs = cells.freq_centres();
        let times = cells.time_centres();
        let polcs = self.polcs.borrow();
        let vellset = match polcs.as_slice() {
            [] => {
                return Err(EvalError::NoPolcs {
                    parm: self.name.to_string(),
                })
            }
            [polc] => {
                let eval = polc
                    .evaluate(&freqs, &times, request.calc_derivatives())
                    .map_err(|e| self.polc_err(e))?;
                self.vellset_from(eval)
            }
            polcs => self.evaluate_tiled(polcs, &freqs, &times, request.calc_derivatives())?,
        };
        Ok(NodeResult::single(request.id(), vellset))
    }
}
