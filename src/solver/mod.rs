// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Solving for parameters.

Solvable coefficients are numbered with solvable parameter indices ("spids")
handed out by a [`SpidCounter`]. A spid is a coefficient's column in the
Jacobian and its position in the solver's vectors. [`SolvableSet`] is the
solver's view of the parameters being solved for, and [`GaussNewton`] fits them
to observed values.
 */

mod error;
mod gauss_newton;
mod jacobian;

pub use error::SolverError;
pub use gauss_newton::{Equation, GaussNewton, SolveReport};
pub use jacobian::{jacobian, linearise};

use std::rc::Rc;

use log::debug;
use ndarray::Array2;

use crate::expr::{ExprNode, ParmNode};

/// Hands out consecutive solvable parameter indices. Every set of parameters
/// solved together shares one counter; independent solves use independent
/// counters.
#[derive(Debug, Default, Clone)]
pub struct SpidCounter {
    next: usize,
}

impl SpidCounter {
    pub fn new() -> SpidCounter {
        SpidCounter::default()
    }

    /// A counter whose first index is `first`.
    pub fn starting_at(first: usize) -> SpidCounter {
        SpidCounter { next: first }
    }

    pub fn next_spid(&mut self) -> usize {
        let spid = self.next;
        self.next += 1;
        spid
    }

    /// The number of indices spanned so far, i.e. the length of a solver
    /// vector that can hold every index handed out.
    pub fn num_spids(&self) -> usize {
        self.next
    }
}

/// The parameters being solved for.
#[derive(Debug, Default)]
pub struct SolvableSet {
    parms: Vec<Rc<ParmNode>>,
    num_spids: usize,
}

impl SolvableSet {
    pub fn new(parms: Vec<Rc<ParmNode>>) -> SolvableSet {
        SolvableSet {
            parms,
            num_spids: 0,
        }
    }

    pub fn parms(&self) -> &[Rc<ParmNode>] {
        &self.parms
    }

    /// Make every parameter solvable, in order. Returns how many solvable
    /// parameter indices were assigned.
    pub fn make_solvable(&mut self, counter: &mut SpidCounter) -> Result<usize, SolverError> {
        let mut count = 0;
        for parm in &self.parms {
            count += parm.make_solvable(counter)?;
        }
        self.num_spids = counter.num_spids();
        debug!(
            "{count} solvable coefficients over {} parameters",
            self.parms.len()
        );
        Ok(count)
    }

    pub fn clear_solvable(&mut self) {
        self.parms.iter().for_each(|p| p.clear_solvable());
        self.num_spids = 0;
    }

    /// The length of the solver's vectors.
    pub fn num_spids(&self) -> usize {
        self.num_spids
    }

    /// The current values of the solvable coefficients, indexed by spid.
    pub fn get_initial(&self) -> Result<Vec<f64>, SolverError> {
        let mut values = vec![0.0; self.num_spids];
        for parm in &self.parms {
            parm.get_initial(&mut values)?;
        }
        Ok(values)
    }

    /// The coefficients of every polynomial of every parameter.
    pub fn get_current_values(&self) -> Vec<(String, Vec<Array2<f64>>)> {
        self.parms
            .iter()
            .map(|p| {
                let coeffs = p.polcs().iter().map(|polc| polc.get_current_value()).collect();
                (p.name().to_string(), coeffs)
            })
            .collect()
    }

    /// Add `delta` (indexed by spid) to the solvable coefficients.
    pub fn update(&self, delta: &[f64]) -> Result<(), SolverError> {
        if delta.len() != self.num_spids {
            return Err(SolverError::UpdateLength {
                expected: self.num_spids,
                actual: delta.len(),
            });
        }
        for parm in &self.parms {
            parm.update(delta)?;
        }
        Ok(())
    }
}
