// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Gauss-Newton least squares.

use log::{debug, trace, warn};
use ndarray::prelude::*;

use super::{linearise, SolvableSet, SolverError};
use crate::{
    constants::{DEFAULT_MAX_ITERATIONS, DEFAULT_SOLVE_TOLERANCE},
    domain::Cells,
    expr::ExprRef,
    matrix::Matrix,
    request::{Request, RequestIdGen},
};

/// A model expression that should equal some observed values over the solve
/// grid.
pub struct Equation {
    pub model: ExprRef,
    pub observed: Matrix,
}

impl Equation {
    pub fn new<M: Into<Matrix>>(model: ExprRef, observed: M) -> Equation {
        Equation {
            model,
            observed: observed.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolveReport {
    pub iterations: usize,
    pub converged: bool,
    /// The sum of the squared residuals at the start of the last iteration.
    pub chi_sq: f64,
    /// The norm of the last update.
    pub update_norm: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussNewton {
    /// Stop when the norm of an update is smaller than this.
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for GaussNewton {
    fn default() -> Self {
        GaussNewton {
            tolerance: DEFAULT_SOLVE_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl GaussNewton {
    /// Fit the solvable coefficients of `set` to the equations over `cells`.
    /// The coefficients are updated in place. Every iteration evaluates the
    /// equations with a new request from `ids`.
    pub fn solve(
        &self,
        set: &SolvableSet,
        equations: &[Equation],
        cells: &Cells,
        ids: &mut RequestIdGen,
    ) -> Result<SolveReport, SolverError> {
        let num_spids = set.num_spids();
        if num_spids == 0 {
            return Err(SolverError::NothingToSolve);
        }
        if equations.is_empty() {
            return Err(SolverError::NoEquations);
        }

        let mut report = SolveReport {
            iterations: 0,
            converged: false,
            chi_sq: 0.0,
            update_norm: f64::INFINITY,
        };
        while report.iterations < self.max_iterations {
            report.iterations += 1;
            let request = Request::with_derivatives(ids.next_id(), cells.clone());

            let mut normal = Array2::zeros((num_spids, num_spids));
            let mut rhs = Array1::zeros(num_spids);
            let mut chi_sq = 0.0;
            for equation in equations {
                let (jac, res) = equation_terms(equation, &request, num_spids)?;
                normal += &jac.t().dot(&jac);
                rhs += &jac.t().dot(&res);
                chi_sq += res.dot(&res);
            }

            let delta = cholesky_solve(normal, rhs)?;
            set.update(&delta.to_vec())?;
            report.chi_sq = chi_sq;
            report.update_norm = delta.dot(&delta).sqrt();
            debug!(
                "Iteration {}: chi² = {chi_sq:e}, |update| = {:e}",
                report.iterations, report.update_norm
            );
            if report.update_norm < self.tolerance {
                report.converged = true;
                break;
            }
        }

        if !report.converged {
            warn!(
                "Didn't converge after {} iterations (|update| = {:e})",
                report.iterations, report.update_norm
            );
        }
        Ok(report)
    }
}

fn equation_terms(
    equation: &Equation,
    request: &Request,
    num_spids: usize,
) -> Result<(Array2<f64>, Array1<f64>), SolverError> {
    let name = equation.model.name();
    let result = equation.model.get_result(request)?;
    let vs = match result.vellsets() {
        [vs] => vs,
        vellsets => {
            return Err(SolverError::WrongVellSetCount {
                equation: name.to_string(),
                num: vellsets.len(),
            })
        }
    };
    if let Some(message) = vs.fail_message() {
        return Err(SolverError::EquationFailed {
            equation: name.to_string(),
            message: message.to_string(),
        });
    }
    let model_shape = vs.value().shape();
    let observed_shape = equation.observed.shape();
    if vs.value().is_array() && equation.observed.is_array() && model_shape != observed_shape {
        return Err(SolverError::ObservedShape {
            equation: name.to_string(),
            model: model_shape,
            observed: observed_shape,
        });
    }
    trace!("Linearising '{name}'");
    linearise(vs, &equation.observed, num_spids)
}

/// Solve `a x = b` for a symmetric positive-definite `a` by Cholesky
/// decomposition.
pub(super) fn cholesky_solve(mut a: Array2<f64>, b: Array1<f64>) -> Result<Array1<f64>, SolverError> {
    let n = b.len();
    // Factorise in place; the lower triangle becomes L.
    for j in 0..n {
        let diag = a[(j, j)];
        let mut d = diag;
        for k in 0..j {
            d -= a[(j, k)] * a[(j, k)];
        }
        if !d.is_finite() || d <= f64::EPSILON * diag.abs() {
            return Err(SolverError::SingularNormalMatrix { column: j });
        }
        let d = d.sqrt();
        a[(j, j)] = d;
        for i in j + 1..n {
            let mut s = a[(i, j)];
            for k in 0..j {
                s -= a[(i, k)] * a[(j, k)];
            }
            a[(i, j)] = s / d;
        }
    }

    // L y = b
    let mut x = b;
    for i in 0..n {
        let mut s = x[i];
        for k in 0..i {
            s -= a[(i, k)] * x[k];
        }
        x[i] = s / a[(i, i)];
    }
    // Lᵀ x = y
    for i in (0..n).rev() {
        let mut s = x[i];
        for k in i + 1..n {
            s -= a[(k, i)] * x[k];
        }
        x[i] = s / a[(i, i)];
    }
    Ok(x)
}
