// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
2x2 Jones matrix expressions.

A Jones expression evaluates to four value planes, one per matrix element, in
the order `[j11, j12, j21, j22]`. The algebra here is the usual 2x2 complex
matrix algebra, applied element-wise over the cells of a request, with
derivatives carried through the product rule.
 */

mod error;
mod nodes;

pub use error::JonesError;
pub use nodes::{JonesElement, JonesInvert, JonesMul, JonesMulHermitian, JonesNode, JonesVisibility};

use std::rc::Rc;

use marlu::{c64, Jones};

use crate::{
    expr::RequestCache,
    matrix::Matrix,
    request::{Request, RequestId, VellSet},
};

pub const ELEMENT_NAMES: [&str; 4] = ["j11", "j12", "j21", "j22"];

/// The four value planes of an evaluated Jones expression.
#[derive(Debug, Clone, PartialEq)]
pub struct JonesResult {
    pub request_id: RequestId,
    pub j11: VellSet,
    pub j12: VellSet,
    pub j21: VellSet,
    pub j22: VellSet,
}

impl JonesResult {
    pub fn new(request_id: RequestId, [j11, j12, j21, j22]: [VellSet; 4]) -> JonesResult {
        JonesResult {
            request_id,
            j11,
            j12,
            j21,
            j22,
        }
    }

    /// The identity matrix.
    pub fn identity(request_id: RequestId) -> JonesResult {
        let one = || VellSet::new(Matrix::one());
        let zero = || VellSet::new(Matrix::zero());
        JonesResult::new(request_id, [one(), zero(), zero(), one()])
    }

    pub fn elements(&self) -> [&VellSet; 4] {
        [&self.j11, &self.j12, &self.j21, &self.j22]
    }

    pub fn into_elements(self) -> [VellSet; 4] {
        [self.j11, self.j12, self.j21, self.j22]
    }

    pub fn has_fails(&self) -> bool {
        self.elements().iter().any(|vs| vs.is_failed())
    }

    /// The Jones matrix of one cell.
    pub fn to_marlu(&self, ix: usize, iy: usize) -> Result<Jones<f64>, JonesError> {
        let mut values = [c64::default(); 4];
        for ((value, vs), element) in values.iter_mut().zip(self.elements()).zip(ELEMENT_NAMES) {
            if let Some(message) = vs.fail_message() {
                return Err(JonesError::ElementFailed {
                    element,
                    message: message.to_string(),
                });
            }
            *value = vs.value().get(ix, iy)?;
        }
        Ok(Jones::from(values))
    }
}

/// The cache of a [`JonesExpr`].
pub type JonesCache = RequestCache<JonesResult>;

/// A node of a Jones expression graph.
pub trait JonesExpr {
    fn name(&self) -> &str;

    fn cache(&self) -> &JonesCache;

    /// Evaluate the node for a request, ignoring the cache.
    fn calc_result(&self, request: &Request) -> Result<JonesResult, JonesError>;

    /// Evaluate the node for a request, using the cached result if it was made
    /// for the same request.
    fn get_result(&self, request: &Request) -> Result<Rc<JonesResult>, JonesError> {
        self.cache()
            .get_or_calc(self.name(), request, || self.calc_result(request))
    }

    fn result_11(&self, request: &Request) -> Result<VellSet, JonesError> {
        Ok(self.get_result(request)?.j11.clone())
    }

    fn result_12(&self, request: &Request) -> Result<VellSet, JonesError> {
        Ok(self.get_result(request)?.j12.clone())
    }

    fn result_21(&self, request: &Request) -> Result<VellSet, JonesError> {
        Ok(self.get_result(request)?.j21.clone())
    }

    fn result_22(&self, request: &Request) -> Result<VellSet, JonesError> {
        Ok(self.get_result(request)?.j22.clone())
    }
}

/// A shared handle to a Jones node.
pub type JonesRef = Rc<dyn JonesExpr>;

fn check_same_request(a: &JonesResult, b: &JonesResult) -> Result<(), JonesError> {
    if a.request_id != b.request_id {
        return Err(JonesError::StaleOperand {
            left: a.request_id,
            right: b.request_id,
        });
    }
    Ok(())
}

/// `a * b + c * d`
fn sum_of_products(a: &VellSet, b: &VellSet, c: &VellSet, d: &VellSet) -> Result<VellSet, JonesError> {
    Ok(VellSet::add(&VellSet::mul(a, b)?, &VellSet::mul(c, d)?)?)
}

/// The matrix product `left * right`.
pub fn multiply(left: &JonesResult, right: &JonesResult) -> Result<JonesResult, JonesError> {
    check_same_request(left, right)?;
    let (l, r) = (left, right);
    Ok(JonesResult::new(
        l.request_id,
        [
            sum_of_products(&l.j11, &r.j11, &l.j12, &r.j21)?,
            sum_of_products(&l.j11, &r.j12, &l.j12, &r.j22)?,
            sum_of_products(&l.j21, &r.j11, &l.j22, &r.j21)?,
            sum_of_products(&l.j21, &r.j12, &l.j22, &r.j22)?,
        ],
    ))
}

/// `left * right^H`, where `^H` is the conjugate transpose.
pub fn multiply_hermitian(left: &JonesResult, right: &JonesResult) -> Result<JonesResult, JonesError> {
    check_same_request(left, right)?;
    let r = right;
    let right_h = JonesResult::new(
        r.request_id,
        [r.j11.conj()?, r.j21.conj()?, r.j12.conj()?, r.j22.conj()?],
    );
    multiply(left, &right_h)
}

/// The inverse, by the adjugate over the determinant. A singular matrix gives
/// non-finite values rather than an error.
pub fn invert(a: &JonesResult) -> Result<JonesResult, JonesError> {
    let det = VellSet::sub(
        &VellSet::mul(&a.j11, &a.j22)?,
        &VellSet::mul(&a.j12, &a.j21)?,
    )?;
    let inv_det = VellSet::div(&VellSet::new(Matrix::one()), &det)?;
    Ok(JonesResult::new(
        a.request_id,
        [
            VellSet::mul(&a.j22, &inv_det)?,
            VellSet::mul(&a.j12.negate()?, &inv_det)?,
            VellSet::mul(&a.j21.negate()?, &inv_det)?,
            VellSet::mul(&a.j11, &inv_det)?,
        ],
    ))
}
