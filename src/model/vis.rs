// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Visibilities as they are read from and written to files.

use marlu::c64;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::ModelError;
use crate::{
    jones::{JonesError, JonesResult, ELEMENT_NAMES},
    matrix::Matrix,
    request::VellSet,
};

/// The visibilities of many baselines over a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisFile {
    /// The centre frequency of each channel [Hz].
    pub freqs: Vec<f64>,
    /// The centre of each timestep [s].
    pub times: Vec<f64>,
    pub baselines: Vec<BaselineVis>,
}

/// Values are indexed `[freq][time]`, each being `[re, im]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineVis {
    pub station1: String,
    pub station2: String,
    pub xx: Vec<Vec<[f64; 2]>>,
    pub xy: Vec<Vec<[f64; 2]>>,
    pub yx: Vec<Vec<[f64; 2]>>,
    pub yy: Vec<Vec<[f64; 2]>>,
}

impl BaselineVis {
    pub fn from_jones(
        station1: &str,
        station2: &str,
        result: &JonesResult,
        shape: (usize, usize),
    ) -> Result<BaselineVis, ModelError> {
        let [j11, j12, j21, j22] = result.elements();
        Ok(BaselineVis {
            station1: station1.to_string(),
            station2: station2.to_string(),
            xx: element_values(j11, ELEMENT_NAMES[0], shape)?,
            xy: element_values(j12, ELEMENT_NAMES[1], shape)?,
            yx: element_values(j21, ELEMENT_NAMES[2], shape)?,
            yy: element_values(j22, ELEMENT_NAMES[3], shape)?,
        })
    }

    pub fn name(&self) -> String {
        format!("{}-{}", self.station1, self.station2)
    }

    /// The four polarisations as arrays, in the order of
    /// [`ELEMENT_NAMES`].
    pub fn to_matrices(&self, shape: (usize, usize)) -> Result<[Matrix; 4], ModelError> {
        Ok([
            self.to_matrix(&self.xx, "xx", shape)?,
            self.to_matrix(&self.xy, "xy", shape)?,
            self.to_matrix(&self.yx, "yx", shape)?,
            self.to_matrix(&self.yy, "yy", shape)?,
        ])
    }

    fn to_matrix(
        &self,
        values: &[Vec<[f64; 2]>],
        element: &'static str,
        (nx, ny): (usize, usize),
    ) -> Result<Matrix, ModelError> {
        if values.len() != nx {
            return Err(ModelError::GridMismatch {
                axis: "channels",
                expected: nx,
                actual: values.len(),
            });
        }
        if let Some((row, r)) = values.iter().enumerate().find(|(_, r)| r.len() != ny) {
            return Err(ModelError::RaggedVisibilities {
                baseline: self.name(),
                element,
                row,
                expected: ny,
                actual: r.len(),
            });
        }
        Ok(Matrix::ComplexArray(Array2::from_shape_fn(
            (nx, ny),
            |(ix, iy)| {
                let [re, im] = values[ix][iy];
                c64::new(re, im)
            },
        )))
    }
}

fn element_values(
    vs: &VellSet,
    element: &'static str,
    (nx, ny): (usize, usize),
) -> Result<Vec<Vec<[f64; 2]>>, ModelError> {
    if let Some(message) = vs.fail_message() {
        return Err(JonesError::ElementFailed {
            element,
            message: message.to_string(),
        }
        .into());
    }
    let mut out = Vec::with_capacity(nx);
    for ix in 0..nx {
        let mut row = Vec::with_capacity(ny);
        for iy in 0..ny {
            let v = vs.value().get(ix, iy)?;
            row.push([v.re, v.im]);
        }
        out.push(row);
    }
    Ok(out)
}
