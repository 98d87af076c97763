// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Expression graphs.

An expression graph is a DAG of [`ExprNode`]s shared through [`ExprRef`]s.
Evaluating a node for a [`Request`] evaluates its children for the same request
and combines their value planes. Every node caches the result of the last
request it evaluated, keyed by the request's ID, so that a node shared by many
parents is evaluated once per request. Request IDs must increase from one
evaluation pass to the next; asking a node for an older request than the one
it has cached is an error.
 */

mod arith;
mod cache;
mod dft;
mod error;
mod parm;

pub use arith::{ArithNode, ConstNode, UnaryFunc, UnaryNode};
pub use cache::{RequestCache, ResultCache};
pub use dft::{expand_channels, DftChannelsNode, PointDftNode};
pub use error::EvalError;
pub use parm::ParmNode;

use std::rc::Rc;

use crate::request::{NodeResult, Request, VellSet};

/// A node of an expression graph.
pub trait ExprNode {
    /// The name of the node; used in log and error messages.
    fn name(&self) -> &str;

    /// The cache of this node's last result.
    fn cache(&self) -> &ResultCache;

    /// Evaluate the node for a request, ignoring the cache. Implementors call
    /// [`ExprNode::get_result`] (not this) on their children.
    fn calc_result(&self, request: &Request) -> Result<NodeResult, EvalError>;

    /// Evaluate the node for a request, using the cached result if it was made
    /// for the same request.
    fn get_result(&self, request: &Request) -> Result<Rc<NodeResult>, EvalError> {
        self.cache()
            .get_or_calc(self.name(), request, || self.calc_result(request))
    }
}

/// A shared handle to a node.
pub type ExprRef = Rc<dyn ExprNode>;

/// Evaluate a child that is expected to produce exactly one value plane.
/// Anything else is described by the returned message, which is prefixed by
/// `label`. Fatal errors are returned as errors.
pub(crate) fn single_child_vellset(
    label: &str,
    child: &ExprRef,
    request: &Request,
) -> Result<Result<VellSet, String>, EvalError> {
    let result = match child.get_result(request) {
        Ok(r) => r,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => return Ok(Err(format!("{label} ('{}'): {e}", child.name()))),
    };
    Ok(match result.vellsets() {
        [vs] if vs.is_failed() => Err(format!(
            "{label} ('{}') failed: {}",
            child.name(),
            vs.fail_message().unwrap_or_default()
        )),
        [vs] => Ok(vs.clone()),
        vellsets => Err(format!(
            "{label} ('{}') produced {} value planes; expected 1",
            child.name(),
            vellsets.len()
        )),
    })
}
