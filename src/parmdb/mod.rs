// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Parameter stores.

A parameter store maps parameter names to polynomials, each valid over its own
domain. [`MemoryParmStore`] keeps everything in memory and can be read from or
written to toml, json and yaml files. A file looks like this (toml):

```toml
[[gain_1]]
coeff = [[1.0, 0.1]]
perturbation = 1e-6
relative = true
domain = { freq = [100e6, 200e6], time = [0.0, 3600.0] }
```

`coeff` is indexed `[time order][freq order]`. `mask` (optional) marks which
coefficients may be solved for, in storage order (time varying fastest).
 */

mod error;
mod file;

pub use error::ParmDbError;
pub use file::{ParmFileType, PARM_FILE_TYPES_COMMA_SEPARATED};

use indexmap::IndexMap;
use log::debug;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::{
    domain::Domain,
    polc::{Perturbation, Polc},
};

/// Somewhere parameters are kept.
pub trait ParmStore {
    /// The polynomials of the parameter `name` whose domains overlap `domain`.
    fn query_coefficients(&self, name: &str, domain: &Domain) -> Result<Vec<Polc>, ParmDbError>;

    /// Save a polynomial of the parameter `name`. A polynomial already stored
    /// with the same domain is replaced.
    fn store_coefficients(&mut self, name: &str, polc: &Polc) -> Result<(), ParmDbError>;
}

fn default_true() -> bool {
    true
}

/// The stored form of one polynomial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParmRecord {
    /// Indexed `[time order][freq order]`.
    pub coeff: Vec<Vec<f64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<Vec<bool>>,

    #[serde(default)]
    pub perturbation: Perturbation,

    #[serde(default = "default_true")]
    pub relative: bool,

    pub domain: Domain,
}

impl ParmRecord {
    pub fn from_polc(polc: &Polc) -> ParmRecord {
        let mask = polc.mask();
        ParmRecord {
            coeff: polc.coeff().outer_iter().map(|row| row.to_vec()).collect(),
            mask: if mask.iter().all(|&m| m) {
                None
            } else {
                Some(mask.to_vec())
            },
            perturbation: polc.perturbation().clone(),
            relative: polc.is_relative_perturbation(),
            domain: *polc.domain(),
        }
    }

    pub fn to_polc(&self, parm: &str) -> Result<Polc, ParmDbError> {
        let nt = self.coeff.len();
        let nf = self.coeff.first().map(Vec::len).unwrap_or(0);
        if nt == 0 || nf == 0 {
            return Err(ParmDbError::EmptyCoefficients {
                parm: parm.to_string(),
            });
        }
        if let Some((row, r)) = self.coeff.iter().enumerate().find(|(_, r)| r.len() != nf) {
            return Err(ParmDbError::RaggedCoefficients {
                parm: parm.to_string(),
                row,
                expected: nf,
                actual: r.len(),
            });
        }
        let coeff = Array2::from_shape_fn((nt, nf), |(t, f)| self.coeff[t][f]);

        let polc_err = |err| ParmDbError::Polc {
            parm: parm.to_string(),
            err,
        };
        let mut polc = Polc::empty(self.domain);
        match &self.mask {
            Some(mask) => polc.set_coeff_masked(coeff, mask.clone()).map_err(polc_err)?,
            None => polc.set_coeff(coeff),
        }
        polc.set_perturbation(self.perturbation.clone(), self.relative)
            .map_err(polc_err)?;
        Ok(polc)
    }
}

/// Parameters kept in memory, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryParmStore {
    parms: IndexMap<String, Vec<ParmRecord>>,
}

impl MemoryParmStore {
    pub fn new() -> MemoryParmStore {
        MemoryParmStore::default()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parms.keys().map(|s| s.as_str())
    }

    pub fn records(&self, name: &str) -> Option<&[ParmRecord]> {
        self.parms.get(name).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.parms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parms.is_empty()
    }

    /// All of the polynomials of a parameter, regardless of domain.
    pub fn polcs(&self, name: &str) -> Result<Vec<Polc>, ParmDbError> {
        self.parms
            .get(name)
            .ok_or_else(|| ParmDbError::UnknownParm(name.to_string()))?
            .iter()
            .map(|r| r.to_polc(name))
            .collect()
    }

    /// Check that every record can be turned into a polynomial.
    pub fn validate(&self) -> Result<(), ParmDbError> {
        for (name, records) in &self.parms {
            for r in records {
                r.to_polc(name)?;
            }
        }
        Ok(())
    }
}

impl ParmStore for MemoryParmStore {
    fn query_coefficients(&self, name: &str, domain: &Domain) -> Result<Vec<Polc>, ParmDbError> {
        let records = self
            .parms
            .get(name)
            .ok_or_else(|| ParmDbError::UnknownParm(name.to_string()))?;
        let polcs = records
            .iter()
            .filter(|r| r.domain.overlaps(domain))
            .map(|r| r.to_polc(name))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "'{name}': {} of {} polynomials overlap the query domain",
            polcs.len(),
            records.len()
        );
        Ok(polcs)
    }

    fn store_coefficients(&mut self, name: &str, polc: &Polc) -> Result<(), ParmDbError> {
        let record = ParmRecord::from_polc(polc);
        let records = self.parms.entry(name.to_string()).or_default();
        match records.iter_mut().find(|r| r.domain == record.domain) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        Ok(())
    }
}
