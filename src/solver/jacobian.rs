// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Linearising value planes for least squares.
//!
//! Each cell of a value plane is one equation; complex values give two
//! equations per cell (real then imaginary). Cells are taken in row-major
//! `(nx, ny)` order.

use ndarray::prelude::*;

use super::SolverError;
use crate::{matrix::Matrix, request::VellSet};

/// The shape every matrix involved broadcasts to, and whether any of them is
/// complex.
#[derive(Debug, Clone, Copy)]
struct Layout {
    shape: (usize, usize),
    complex: bool,
}

impl Layout {
    fn new<'a>(matrices: impl Iterator<Item = &'a Matrix>) -> Layout {
        let mut layout = Layout {
            shape: (1, 1),
            complex: false,
        };
        for m in matrices {
            if m.is_array() {
                layout.shape = m.shape();
            }
            layout.complex |= !m.is_real();
        }
        layout
    }

    fn of(vs: &VellSet, observed: Option<&Matrix>) -> Layout {
        Layout::new(
            observed
                .into_iter()
                .chain(std::iter::once(vs.value()))
                .chain(vs.perturbed().values().map(|p| &p.deriv)),
        )
    }

    fn values_per_cell(self) -> usize {
        if self.complex {
            2
        } else {
            1
        }
    }

    fn num_rows(self) -> usize {
        self.shape.0 * self.shape.1 * self.values_per_cell()
    }

    fn flatten(self, m: &Matrix) -> Result<Vec<f64>, SolverError> {
        let (nx, ny) = self.shape;
        let expanded = m.clone().expand(nx, ny)?;
        let mut out = Vec::with_capacity(self.num_rows());
        for v in expanded.iter_complex() {
            out.push(v.re);
            if self.complex {
                out.push(v.im);
            }
        }
        Ok(out)
    }
}

fn jacobian_with_layout(
    vs: &VellSet,
    num_spids: usize,
    layout: Layout,
) -> Result<Array2<f64>, SolverError> {
    let mut jac = Array2::zeros((layout.num_rows(), num_spids));
    for p in vs.perturbed().values() {
        if p.spid >= num_spids {
            return Err(SolverError::SpidOutOfRange {
                spid: p.spid,
                num_spids,
            });
        }
        let column = layout.flatten(&p.deriv)?;
        jac.column_mut(p.spid)
            .iter_mut()
            .zip(column)
            .for_each(|(j, d)| *j += d);
    }
    Ok(jac)
}

/// The Jacobian of a value plane: one row per equation and one column per
/// solvable parameter index. Columns of coefficients the value doesn't depend
/// on are zero.
pub fn jacobian(vs: &VellSet, num_spids: usize) -> Result<Array2<f64>, SolverError> {
    jacobian_with_layout(vs, num_spids, Layout::of(vs, None))
}

/// The Jacobian of a value plane and its residuals `observed - value`, with
/// matching rows. Flagged cells contribute nothing to either.
pub fn linearise(
    vs: &VellSet,
    observed: &Matrix,
    num_spids: usize,
) -> Result<(Array2<f64>, Array1<f64>), SolverError> {
    let layout = Layout::of(vs, Some(observed));
    let mut jac = jacobian_with_layout(vs, num_spids, layout)?;
    let diff = observed.clone().try_sub(vs.value())?;
    let mut res = Array1::from(layout.flatten(&diff)?);

    if let Some(flags) = vs.flags() {
        if flags.dim() == layout.shape {
            let per_cell = layout.values_per_cell();
            for (cell, _) in flags.iter().enumerate().filter(|(_, &f)| f) {
                for row in cell * per_cell..(cell + 1) * per_cell {
                    jac.row_mut(row).fill(0.0);
                    res[row] = 0.0;
                }
            }
        }
    }
    Ok((jac, res))
}
