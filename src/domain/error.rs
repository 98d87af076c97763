// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with domains and evaluation grids.

use thiserror::Error;

use super::AxisKind;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid {axis} range for a domain: start ({start}) must not be larger than end ({end}), and both must be finite")]
    InvalidDomain {
        axis: AxisKind,
        start: f64,
        end: f64,
    },

    #[error("The domain has a zero-width {axis} axis ({start} to {end}); its coordinates can't be scaled to [-1, 1]")]
    Degenerate {
        axis: AxisKind,
        start: f64,
        end: f64,
    },

    #[error("A {axis} axis segment must have a positive, finite cell width and at least one cell (got width {width}, {num_cells} cells)")]
    InvalidSegment {
        axis: AxisKind,
        width: f64,
        num_cells: usize,
    },

    #[error("The {axis} axis segments must be contiguous and increasing; segment {index} starts at {start} but the previous segment ends at {prev_end}")]
    NonContiguousSegments {
        axis: AxisKind,
        index: usize,
        start: f64,
        prev_end: f64,
    },
}
