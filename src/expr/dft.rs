// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The phase term of a point source.

use indexmap::IndexMap;
use log::trace;
use marlu::c64;
use ndarray::prelude::*;

use super::{single_child_vellset, EvalError, ExprNode, ExprRef, ResultCache};
use crate::{
    constants::{TAU, VEL_C},
    domain::Cells,
    matrix::{Matrix, MatrixError},
    request::{NodeResult, Perturbed, Request, VellSet},
};

const CHILD_LABELS: [&str; 6] = ["l", "m", "n", "u", "v", "w"];

/// The DFT phase term of a point source at direction cosines `(l, m, n)` as
/// seen by a baseline `(u, v, w)` (metres).
///
/// The result has two value planes. The first is the phase term at the centre
/// of the request's frequency band,
///
/// exp(i 2π f_c / c (ul + vm + wn)),
///
/// and the second is the factor between adjacent channels,
///
/// exp(i 2π Δf / c (ul + vm + wn)),
///
/// where Δf is the channel width. [`expand_channels`] turns these into a value
/// per channel. Both planes carry derivatives with respect to any solvable
/// coefficients the children depend on.
///
/// Unlike the arithmetic nodes, this node raises an error if any child can't
/// be evaluated.
pub struct PointDftNode {
    name: String,
    children: [ExprRef; 6],
    cache: ResultCache,
}

impl PointDftNode {
    pub fn new<S: Into<String>>(
        name: S,
        l: ExprRef,
        m: ExprRef,
        n: ExprRef,
        u: ExprRef,
        v: ExprRef,
        w: ExprRef,
    ) -> PointDftNode {
        PointDftNode {
            name: name.into(),
            children: [l, m, n, u, v, w],
            cache: ResultCache::new(),
        }
    }
}

impl ExprNode for PointDftNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn cache(&self) -> &ResultCache {
        &self.cache
    }

    fn calc_result(&self, request: &Request) -> Result<NodeResult, EvalError> {
        let segments = request.cells().freq_axis().segments();
        let [segment] = segments else {
            return Err(EvalError::MultipleFreqSegments {
                node: self.name.clone(),
                num_segments: segments.len(),
            });
        };

        let mut values = Vec::with_capacity(self.children.len());
        let mut messages = vec![];
        for (label, child) in CHILD_LABELS.iter().zip(self.children.iter()) {
            match single_child_vellset(label, child, request)? {
                Ok(vs) => values.push(vs),
                Err(message) => messages.push(message),
            }
        }
        if !messages.is_empty() {
            return Err(EvalError::ChildEvaluation {
                node: self.name.clone(),
                messages,
            });
        }

        // Every child produced a value, in label order.
        let (l, m, n) = (&values[0], &values[1], &values[2]);
        let (u, v, w) = (&values[3], &values[4], &values[5]);
        let ul = VellSet::mul(u, l)?;
        let vm = VellSet::mul(v, m)?;
        let wn = VellSet::mul(w, n)?;
        let path = VellSet::add(&VellSet::add(&ul, &vm)?, &wn)?;

        let centre = segment.centre();
        let width = segment.width;
        trace!(
            "'{}': centre frequency {centre} Hz, channel width {width} Hz",
            self.name
        );
        let value = path.scale(TAU * centre / VEL_C)?.cexp_i()?;
        let delta = path.scale(TAU * width / VEL_C)?.cexp_i()?;
        Ok(NodeResult::new(request.id(), vec![value, delta]))
    }
}

/// Expand the two value planes of a [`PointDftNode`] into one complex value
/// per cell: channel `k` of `nx` gets `value * delta^(k - (nx - 1) / 2)`.
///
/// Half-integer powers of `delta` use the principal square root, so the phase
/// change between adjacent channels must be less than π in magnitude.
pub fn expand_channels(value: &VellSet, delta: &VellSet, cells: &Cells) -> Result<VellSet, EvalError> {
    if value.is_failed() || delta.is_failed() {
        return Ok(VellSet::mul(value, delta)?);
    }

    let shape = cells.shape();
    let (nx, ny) = shape;
    let half = delta.sqrt()?;
    let inv_half = VellSet::div(&VellSet::new(Matrix::one()), &half)?;

    // Step back from the band centre to the first channel.
    let mut current = value.clone();
    for _ in 1..nx {
        current = VellSet::mul(&current, &inv_half)?;
    }

    let mut out = Array2::zeros(shape);
    let mut derivs: IndexMap<_, (usize, f64, Array2<c64>)> = IndexMap::new();
    for k in 0..nx {
        if k > 0 {
            current = VellSet::mul(&current, delta)?;
        }
        out.row_mut(k).assign(&channel_row(current.value(), k, shape)?);
        for (key, p) in current.perturbed() {
            let (_, _, d) = derivs
                .entry(key.clone())
                .or_insert_with(|| (p.spid, p.step, Array2::zeros(shape)));
            d.row_mut(k).assign(&channel_row(&p.deriv, k, shape)?);
        }
    }

    let mut expanded = VellSet::new(Matrix::ComplexArray(out));
    for (key, (spid, step, deriv)) in derivs {
        expanded.insert_perturbed(
            key,
            Perturbed {
                spid,
                step,
                deriv: Matrix::ComplexArray(deriv),
            },
        );
    }
    if let Some(flags) = current.flags() {
        if flags.dim() == (nx, ny) {
            expanded.set_flags(Some(flags.clone()));
        }
    }
    Ok(expanded)
}

/// The values of channel `k`; a scalar has the same value for every time.
fn channel_row(m: &Matrix, k: usize, shape: (usize, usize)) -> Result<Array1<c64>, MatrixError> {
    let (_, ny) = shape;
    match m {
        Matrix::RealScalar(v) => Ok(Array1::from_elem(ny, c64::new(*v, 0.0))),
        Matrix::ComplexScalar(v) => Ok(Array1::from_elem(ny, *v)),
        _ if m.shape() != shape => Err(MatrixError::ShapeMismatch {
            op: "expand_channels",
            left: m.shape(),
            right: shape,
        }),
        Matrix::RealArray(a) => Ok(a.row(k).mapv(|v| c64::new(v, 0.0))),
        Matrix::ComplexArray(a) => Ok(a.row(k).to_owned()),
    }
}

/// The per-cell phase term of a [`PointDftNode`], as made by
/// [`expand_channels`].
pub struct DftChannelsNode {
    name: String,
    dft: ExprRef,
    cache: ResultCache,
}

impl DftChannelsNode {
    pub fn new<S: Into<String>>(name: S, dft: ExprRef) -> DftChannelsNode {
        DftChannelsNode {
            name: name.into(),
            dft,
            cache: ResultCache::new(),
        }
    }
}

impl ExprNode for DftChannelsNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn cache(&self) -> &ResultCache {
        &self.cache
    }

    fn calc_result(&self, request: &Request) -> Result<NodeResult, EvalError> {
        let result = self.dft.get_result(request)?;
        let [value, delta] = result.vellsets() else {
            return Err(EvalError::WrongVellSetCount {
                node: self.dft.name().to_string(),
                num: result.num_vellsets(),
                expected: 2,
            });
        };
        let expanded = expand_channels(value, delta, request.cells())?;
        Ok(NodeResult::single(request.id(), expanded))
    }
}
