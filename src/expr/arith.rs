// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Constants and arithmetic combinators.
//!
//! Arithmetic nodes never raise errors for bad children (other than fatal
//! ones). A child that errors or fails, or values that can't be combined,
//! produce a failed value plane carrying every message, and evaluation of the
//! rest of the graph carries on.

use log::debug;
use strum_macros::Display;

use super::{single_child_vellset, EvalError, ExprNode, ExprRef, ResultCache};
use crate::{
    matrix::{BinaryOp, Matrix, MatrixError},
    request::{NodeResult, Request, VellSet},
};

/// A value that doesn't depend on any parameter.
#[derive(Debug)]
pub struct ConstNode {
    name: String,
    value: Matrix,
    cache: ResultCache,
}

impl ConstNode {
    pub fn new<S: Into<String>, M: Into<Matrix>>(name: S, value: M) -> ConstNode {
        ConstNode {
            name: name.into(),
            value: value.into(),
            cache: ResultCache::new(),
        }
    }

    pub fn value(&self) -> &Matrix {
        &self.value
    }
}

impl ExprNode for ConstNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn cache(&self) -> &ResultCache {
        &self.cache
    }

    fn calc_result(&self, request: &Request) -> Result<NodeResult, EvalError> {
        Ok(NodeResult::single(
            request.id(),
            VellSet::new(self.value.clone()),
        ))
    }
}

/// Combines its children left to right with one binary operation, e.g.
/// `((c0 + c1) + c2)`.
pub struct ArithNode {
    name: String,
    op: BinaryOp,
    children: Vec<ExprRef>,
    cache: ResultCache,
}

impl ArithNode {
    pub fn new<S: Into<String>>(name: S, op: BinaryOp, children: Vec<ExprRef>) -> ArithNode {
        ArithNode {
            name: name.into(),
            op,
            children,
            cache: ResultCache::new(),
        }
    }

    pub fn add<S: Into<String>>(name: S, children: Vec<ExprRef>) -> ArithNode {
        ArithNode::new(name, BinaryOp::Add, children)
    }

    pub fn sub<S: Into<String>>(name: S, children: Vec<ExprRef>) -> ArithNode {
        ArithNode::new(name, BinaryOp::Sub, children)
    }

    pub fn mul<S: Into<String>>(name: S, children: Vec<ExprRef>) -> ArithNode {
        ArithNode::new(name, BinaryOp::Mul, children)
    }

    pub fn div<S: Into<String>>(name: S, children: Vec<ExprRef>) -> ArithNode {
        ArithNode::new(name, BinaryOp::Div, children)
    }

    pub fn op(&self) -> BinaryOp {
        self.op
    }

    pub fn children(&self) -> &[ExprRef] {
        &self.children
    }

    fn combine(&self, a: &VellSet, b: &VellSet) -> Result<VellSet, MatrixError> {
        match self.op {
            BinaryOp::Add => VellSet::add(a, b),
            BinaryOp::Sub => VellSet::sub(a, b),
            BinaryOp::Mul => VellSet::mul(a, b),
            BinaryOp::Div => VellSet::div(a, b),
        }
    }

    fn failed(&self, messages: &[String]) -> VellSet {
        debug!("'{}' failed: {}", self.name, messages.join("; "));
        VellSet::failed(format!("{}: {}", self.name, messages.join("; ")))
    }
}

impl ExprNode for ArithNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn cache(&self) -> &ResultCache {
        &self.cache
    }

    fn calc_result(&self, request: &Request) -> Result<NodeResult, EvalError> {
        // Evaluate every child even after one goes wrong, so that all of the
        // problems are reported together.
        let mut operands = Vec::with_capacity(self.children.len());
        let mut messages = vec![];
        for (i, child) in self.children.iter().enumerate() {
            match single_child_vellset(&format!("operand {i}"), child, request)? {
                Ok(vs) => operands.push(vs),
                Err(message) => messages.push(message),
            }
        }
        if !messages.is_empty() {
            return Ok(NodeResult::single(request.id(), self.failed(&messages)));
        }

        let mut operands = operands.into_iter();
        let Some(mut acc) = operands.next() else {
            let message = "no operands".to_string();
            return Ok(NodeResult::single(request.id(), self.failed(&[message])));
        };
        for (i, operand) in operands.enumerate() {
            acc = match self.combine(&acc, &operand) {
                Ok(vs) => vs,
                Err(e) => {
                    let message = format!("operand {} ({}): {e}", i + 1, self.op);
                    return Ok(NodeResult::single(request.id(), self.failed(&[message])));
                }
            };
        }
        Ok(NodeResult::single(request.id(), acc))
    }
}

/// A function of one value.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum UnaryFunc {
    Negate,
    Sin,
    Cos,
    Exp,
    Sqrt,
    Conj,
}

impl UnaryFunc {
    fn apply(self, vs: &VellSet) -> Result<VellSet, MatrixError> {
        match self {
            UnaryFunc::Negate => vs.negate(),
            UnaryFunc::Sin => vs.sin(),
            UnaryFunc::Cos => vs.cos(),
            UnaryFunc::Exp => vs.exp(),
            UnaryFunc::Sqrt => vs.sqrt(),
            UnaryFunc::Conj => vs.conj(),
        }
    }
}

pub struct UnaryNode {
    name: String,
    func: UnaryFunc,
    child: ExprRef,
    cache: ResultCache,
}

impl UnaryNode {
    pub fn new<S: Into<String>>(name: S, func: UnaryFunc, child: ExprRef) -> UnaryNode {
        UnaryNode {
            name: name.into(),
            func,
            child,
            cache: ResultCache::new(),
        }
    }

    pub fn func(&self) -> UnaryFunc {
        self.func
    }

    pub fn child(&self) -> &ExprRef {
        &self.child
    }
}

impl ExprNode for UnaryNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn cache(&self) -> &ResultCache {
        &self.cache
    }

    fn calc_result(&self, request: &Request) -> Result<NodeResult, EvalError> {
        let vs = match single_child_vellset(&self.func.to_string(), &self.child, request)? {
            Ok(vs) => match self.func.apply(&vs) {
                Ok(vs) => vs,
                Err(e) => VellSet::failed(format!("{}: {e}", self.name)),
            },
            Err(message) => VellSet::failed(format!("{}: {message}", self.name)),
        };
        Ok(NodeResult::single(request.id(), vs))
    }
}
