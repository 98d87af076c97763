// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Jones expression nodes.

use log::trace;

use super::{
    invert, multiply, multiply_hermitian, JonesCache, JonesError, JonesExpr, JonesRef,
    JonesResult, ELEMENT_NAMES,
};
use crate::{
    expr::{single_child_vellset, EvalError, ExprNode, ExprRef, ResultCache},
    matrix::Matrix,
    request::{NodeResult, Request, VellSet},
};

/// A Jones matrix made of four scalar expressions. Missing elements are zero.
/// A child that can't be evaluated makes its element fail.
pub struct JonesNode {
    name: String,
    elements: [Option<ExprRef>; 4],
    cache: JonesCache,
}

impl JonesNode {
    pub fn new<S: Into<String>>(name: S, elements: [Option<ExprRef>; 4]) -> JonesNode {
        JonesNode {
            name: name.into(),
            elements,
            cache: JonesCache::new(),
        }
    }

    pub fn full<S: Into<String>>(
        name: S,
        j11: ExprRef,
        j12: ExprRef,
        j21: ExprRef,
        j22: ExprRef,
    ) -> JonesNode {
        JonesNode::new(name, [Some(j11), Some(j12), Some(j21), Some(j22)])
    }

    /// A diagonal matrix, e.g. the gains of a station's two feeds.
    pub fn diagonal<S: Into<String>>(name: S, j11: ExprRef, j22: ExprRef) -> JonesNode {
        JonesNode::new(name, [Some(j11), None, None, Some(j22)])
    }
}

impl JonesExpr for JonesNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn cache(&self) -> &JonesCache {
        &self.cache
    }

    fn calc_result(&self, request: &Request) -> Result<JonesResult, JonesError> {
        let mut elements: [VellSet; 4] = Default::default();
        for ((out, child), label) in elements.iter_mut().zip(&self.elements).zip(ELEMENT_NAMES) {
            *out = match child {
                None => VellSet::new(Matrix::zero()),
                Some(child) => match single_child_vellset(label, child, request)? {
                    Ok(vs) => vs,
                    Err(message) => VellSet::failed(format!("{}: {message}", self.name)),
                },
            };
        }
        Ok(JonesResult::new(request.id(), elements))
    }
}

/// The product of its children, left to right.
pub struct JonesMul {
    name: String,
    children: Vec<JonesRef>,
    cache: JonesCache,
}

impl JonesMul {
    pub fn new<S: Into<String>>(name: S, children: Vec<JonesRef>) -> JonesMul {
        JonesMul {
            name: name.into(),
            children,
            cache: JonesCache::new(),
        }
    }
}

impl JonesExpr for JonesMul {
    fn name(&self) -> &str {
        &self.name
    }

    fn cache(&self) -> &JonesCache {
        &self.cache
    }

    fn calc_result(&self, request: &Request) -> Result<JonesResult, JonesError> {
        let mut children = self.children.iter();
        let first = children.next().ok_or_else(|| JonesError::NoOperands {
            node: self.name.clone(),
        })?;
        let first = first.get_result(request)?;
        let mut acc = JonesResult::clone(&first);
        for child in children {
            let next = child.get_result(request)?;
            acc = multiply(&acc, &next)?;
        }
        Ok(acc)
    }
}

/// `left * right^H`
pub struct JonesMulHermitian {
    name: String,
    left: JonesRef,
    right: JonesRef,
    cache: JonesCache,
}

impl JonesMulHermitian {
    pub fn new<S: Into<String>>(name: S, left: JonesRef, right: JonesRef) -> JonesMulHermitian {
        JonesMulHermitian {
            name: name.into(),
            left,
            right,
            cache: JonesCache::new(),
        }
    }
}

impl JonesExpr for JonesMulHermitian {
    fn name(&self) -> &str {
        &self.name
    }

    fn cache(&self) -> &JonesCache {
        &self.cache
    }

    fn calc_result(&self, request: &Request) -> Result<JonesResult, JonesError> {
        let left = self.left.get_result(request)?;
        let right = self.right.get_result(request)?;
        multiply_hermitian(&left, &right)
    }
}

pub struct JonesInvert {
    name: String,
    child: JonesRef,
    cache: JonesCache,
}

impl JonesInvert {
    pub fn new<S: Into<String>>(name: S, child: JonesRef) -> JonesInvert {
        JonesInvert {
            name: name.into(),
            child,
            cache: JonesCache::new(),
        }
    }
}

impl JonesExpr for JonesInvert {
    fn name(&self) -> &str {
        &self.name
    }

    fn cache(&self) -> &JonesCache {
        &self.cache
    }

    fn calc_result(&self, request: &Request) -> Result<JonesResult, JonesError> {
        let child = self.child.get_result(request)?;
        invert(&child)
    }
}

/// The visibility predicted for a baseline: `J1 * C * J2^H`, where `J1` and
/// `J2` are the Jones matrices of the baseline's stations and `C` is the
/// source coherency.
pub struct JonesVisibility {
    name: String,
    station1: JonesRef,
    coherency: JonesRef,
    station2: JonesRef,
    cache: JonesCache,
}

impl JonesVisibility {
    pub fn new<S: Into<String>>(
        name: S,
        station1: JonesRef,
        coherency: JonesRef,
        station2: JonesRef,
    ) -> JonesVisibility {
        JonesVisibility {
            name: name.into(),
            station1,
            coherency,
            station2,
            cache: JonesCache::new(),
        }
    }
}

impl JonesExpr for JonesVisibility {
    fn name(&self) -> &str {
        &self.name
    }

    fn cache(&self) -> &JonesCache {
        &self.cache
    }

    fn calc_result(&self, request: &Request) -> Result<JonesResult, JonesError> {
        let j1 = self.station1.get_result(request)?;
        let c = self.coherency.get_result(request)?;
        let j2 = self.station2.get_result(request)?;
        trace!(
            "'{}': combining '{}' and '{}'",
            self.name,
            self.station1.name(),
            self.station2.name()
        );
        multiply_hermitian(&multiply(&j1, &c)?, &j2)
    }
}

/// One element of a Jones expression as a scalar expression.
pub struct JonesElement {
    name: String,
    jones: JonesRef,
    element: usize,
    cache: ResultCache,
}

impl JonesElement {
    /// `element` is the index into `[j11, j12, j21, j22]`.
    pub fn new(jones: JonesRef, element: usize) -> Result<JonesElement, EvalError> {
        let element_name = ELEMENT_NAMES.get(element).ok_or_else(|| EvalError::Failed {
            node: jones.name().to_string(),
            message: format!("there is no Jones matrix element {element}"),
        })?;
        Ok(JonesElement {
            name: format!("{}.{element_name}", jones.name()),
            jones,
            element,
            cache: ResultCache::new(),
        })
    }
}

impl ExprNode for JonesElement {
    fn name(&self) -> &str {
        &self.name
    }

    fn cache(&self) -> &ResultCache {
        &self.cache
    }

    fn calc_result(&self, request: &Request) -> Result<NodeResult, EvalError> {
        let vs = match self.jones.get_result(request) {
            Ok(result) => result.elements()[self.element].clone(),
            Err(JonesError::Eval(e)) if e.is_fatal() => return Err(e),
            Err(e) => VellSet::failed(format!("{}: {e}", self.name)),
        };
        Ok(NodeResult::single(request.id(), vs))
    }
}
