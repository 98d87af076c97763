// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Evaluation requests and the results they produce.
//!
//! A [`Request`] carries an evaluation grid and a [`RequestId`]. Every node of
//! an expression graph remembers the id of the last request it evaluated; ids
//! must increase strictly from one evaluation pass to the next, which is what
//! [`RequestIdGen`] guarantees.

mod vellset;

pub use vellset::{PerturbKey, Perturbed, VellSet};

use std::fmt;

use crate::domain::Cells;

/// The identifier of one evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out strictly increasing [`RequestId`]s. Independent generators (and
/// hence independent expression graphs) share no state.
#[derive(Debug, Default)]
pub struct RequestIdGen {
    next: u64,
}

impl RequestIdGen {
    pub fn new() -> RequestIdGen {
        RequestIdGen::default()
    }

    pub fn next_id(&mut self) -> RequestId {
        let id = RequestId(self.next);
        self.next += 1;
        id
    }
}

/// A grid to evaluate an expression graph over. Immutable for the duration of
/// an evaluation pass.
#[derive(Debug, Clone)]
pub struct Request {
    id: RequestId,
    cells: Cells,
    calc_derivatives: bool,
}

impl Request {
    /// A request for values only.
    pub fn new(id: RequestId, cells: Cells) -> Request {
        Request {
            id,
            cells,
            calc_derivatives: false,
        }
    }

    /// A request for values as well as derivatives with respect to all
    /// solvable coefficients.
    pub fn with_derivatives(id: RequestId, cells: Cells) -> Request {
        Request {
            id,
            cells,
            calc_derivatives: true,
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn cells(&self) -> &Cells {
        &self.cells
    }

    pub fn calc_derivatives(&self) -> bool {
        self.calc_derivatives
    }
}

/// The output of evaluating one node for one request: one or more value
/// planes.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeResult {
    request_id: RequestId,
    vellsets: Vec<VellSet>,
}

impl NodeResult {
    pub fn new(request_id: RequestId, vellsets: Vec<VellSet>) -> NodeResult {
        NodeResult {
            request_id,
            vellsets,
        }
    }

    /// A result with a single value plane.
    pub fn single(request_id: RequestId, vellset: VellSet) -> NodeResult {
        NodeResult::new(request_id, vec![vellset])
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn vellsets(&self) -> &[VellSet] {
        &self.vellsets
    }

    pub fn vellset(&self, i: usize) -> Option<&VellSet> {
        self.vellsets.get(i)
    }

    pub fn num_vellsets(&self) -> usize {
        self.vellsets.len()
    }

    /// The only value plane, if there is exactly one.
    pub fn single_vellset(&self) -> Option<&VellSet> {
        match self.vellsets.as_slice() {
            [vs] => Some(vs),
            _ => None,
        }
    }

    pub fn into_vellsets(self) -> Vec<VellSet> {
        self.vellsets
    }

    pub fn has_fails(&self) -> bool {
        self.vellsets.iter().any(VellSet::is_failed)
    }

    /// The failure messages of all failed value planes.
    pub fn fail_messages(&self) -> Vec<&str> {
        self.vellsets
            .iter()
            .filter_map(VellSet::fail_message)
            .collect()
    }
}
