// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The single-slot result cache each node owns.

use std::{
    cell::{Cell, RefCell},
    cmp::Ordering,
    rc::Rc,
};

use log::trace;

use super::EvalError;
use crate::request::{NodeResult, Request, RequestId};

/// Remembers the result of the last request a node evaluated.
///
/// There is exactly one slot per node, not per caller, so a node reachable
/// through several parents is evaluated once per request. An empty slot never
/// matches a request, so the first request always evaluates.
#[derive(Debug)]
pub struct RequestCache<T> {
    slot: RefCell<Option<(RequestId, Rc<T>)>>,
    num_evaluations: Cell<usize>,
}

/// The cache of an [`ExprNode`](super::ExprNode).
pub type ResultCache = RequestCache<NodeResult>;

impl<T> Default for RequestCache<T> {
    fn default() -> Self {
        RequestCache {
            slot: RefCell::new(None),
            num_evaluations: Cell::new(0),
        }
    }
}

impl<T> RequestCache<T> {
    pub fn new() -> RequestCache<T> {
        RequestCache::default()
    }

    /// Return the cached result if it was made for this request, otherwise
    /// run `calc` and cache its result. A request older than the cached one is
    /// an error.
    pub fn get_or_calc<E, F>(&self, node: &str, request: &Request, calc: F) -> Result<Rc<T>, E>
    where
        E: From<EvalError>,
        F: FnOnce() -> Result<T, E>,
    {
        if let Some((cached, result)) = self.slot.borrow().as_ref() {
            match request.id().cmp(cached) {
                Ordering::Equal => {
                    trace!("'{node}': using cached result for request {cached}");
                    return Ok(Rc::clone(result));
                }
                Ordering::Less => {
                    return Err(EvalError::NonMonotonicRequest {
                        node: node.to_string(),
                        cached: *cached,
                        requested: request.id(),
                    }
                    .into())
                }
                Ordering::Greater => (),
            }
        }

        trace!("'{node}': evaluating request {}", request.id());
        let result = Rc::new(calc()?);
        self.num_evaluations.set(self.num_evaluations.get() + 1);
        *self.slot.borrow_mut() = Some((request.id(), Rc::clone(&result)));
        Ok(result)
    }

    /// The ID of the request whose result is cached.
    pub fn cached_id(&self) -> Option<RequestId> {
        self.slot.borrow().as_ref().map(|(id, _)| *id)
    }

    /// How many times the node has actually been evaluated.
    pub fn num_evaluations(&self) -> usize {
        self.num_evaluations.get()
    }

    /// Forget the cached result.
    pub fn clear(&self) {
        *self.slot.borrow_mut() = None;
    }
}
