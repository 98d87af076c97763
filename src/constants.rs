// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

All constants *must* be double precision. Model evaluation is done entirely in
double precision; nothing here should encourage otherwise.
 */

pub use std::f64::consts::{PI, TAU};

/// Speed of light \[metres/second\]
pub use marlu::constants::VEL_C;

/// When a relative perturbation is requested for a coefficient whose magnitude
/// is smaller than this, the perturbation factor is used as an absolute step
/// instead. Otherwise the step (and hence the finite difference a solver might
/// form from it) would be zero.
pub const MIN_RELATIVE_PERTURBATION_COEFF: f64 = 1e-10;

/// The perturbation given to polynomial coefficients when a parameter source
/// doesn't specify one.
pub const DEFAULT_PERTURBATION: f64 = 1e-6;

/// Gauss-Newton iterations stop when the norm of the solution update is below
/// this value.
pub const DEFAULT_SOLVE_TOLERANCE: f64 = 1e-10;

/// The maximum number of Gauss-Newton iterations.
pub const DEFAULT_MAX_ITERATIONS: usize = 50;
