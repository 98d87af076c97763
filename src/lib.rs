// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Expression-graph evaluation for radio-interferometer calibration models.

A model is a graph of nodes. Each node turns a [`Request`] (a grid of
time-frequency cells, plus an id and a flag asking for perturbed values) into
a result. Parameter nodes evaluate 2D polynomials ([`Polc`]s) stored in a
[`ParmStore`]; arithmetic, DFT and Jones-matrix nodes combine their children's
results. A Gauss-Newton solver fits the solvable polynomial coefficients to
observed data.
 */

mod cli;
pub mod constants;
pub mod domain;
pub mod expr;
pub mod jones;
pub mod matrix;
pub mod model;
pub mod parmdb;
pub mod polc;
pub mod request;
pub mod solver;

// Re-exports.
pub use cli::{Meqcal, MeqError};
pub use domain::{Cells, Domain};
pub use expr::{ExprNode, ExprRef};
pub use jones::{JonesExpr, JonesRef, JonesResult};
pub use matrix::Matrix;
pub use model::SkyModel;
pub use parmdb::{MemoryParmStore, ParmStore};
pub use polc::Polc;
pub use request::{Request, RequestId, RequestIdGen, VellSet};
