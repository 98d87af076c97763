// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Expression graphs that predict the visibilities of a point source.

For each baseline, the predicted visibility is

V = G1 (I K) G2^H,

where `G1` and `G2` are diagonal station gain matrices, `I` is the source's
flux density and `K` is the DFT phase term of the source on the baseline.

Parameters are looked up in a [`ParmStore`] by name:

- `gain:11:<station>` and `gain:22:<station>` (default 1),
- `l:<source>` and `m:<source>` (default: the source's position),
- `flux:<source>` (default: the source's flux density).

A parameter that isn't in the store is a constant.
 */

mod error;
mod vis;
#[cfg(test)]
mod tests;

pub use error::ModelError;
pub use vis::{BaselineVis, VisFile};

use std::rc::Rc;

use indexmap::IndexMap;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{Cells, Domain},
    expr::{
        ArithNode, ConstNode, DftChannelsNode, ExprRef, ParmNode, PointDftNode, UnaryFunc,
        UnaryNode,
    },
    jones::{JonesElement, JonesNode, JonesRef, JonesResult, JonesVisibility},
    parmdb::{ParmDbError, ParmStore},
    request::Request,
    solver::{Equation, SolvableSet},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSource {
    pub name: String,
    /// Direction cosines relative to the phase centre.
    pub l: f64,
    pub m: f64,
    /// Stokes I flux density [Jy].
    pub flux: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub station1: String,
    pub station2: String,
    /// [metres]
    pub uvw: [f64; 3],
}

impl Baseline {
    pub fn name(&self) -> String {
        format!("{}-{}", self.station1, self.station2)
    }
}

/// Looks up parameters while a model is being built. A parameter used in many
/// places gets one node.
struct ParmLookup<'a, S: ParmStore + ?Sized> {
    store: &'a S,
    domain: Domain,
    parms: IndexMap<String, Rc<ParmNode>>,
}

impl<S: ParmStore + ?Sized> ParmLookup<'_, S> {
    fn get_or(&mut self, name: String, default: f64) -> Result<ExprRef, ModelError> {
        if let Some(parm) = self.parms.get(&name) {
            return Ok(parm.clone());
        }
        match self.store.query_coefficients(&name, &self.domain) {
            Ok(polcs) if !polcs.is_empty() => {
                let parm = Rc::new(ParmNode::new(&name, polcs));
                self.parms.insert(name, parm.clone());
                Ok(parm)
            }
            Ok(_) | Err(ParmDbError::UnknownParm(_)) => {
                trace!("'{name}' isn't in the parameter store; using {default}");
                Ok(Rc::new(ConstNode::new(name, default)))
            }
            Err(e) => Err(e.into()),
        }
    }
}

pub struct SkyModel {
    parms: IndexMap<String, Rc<ParmNode>>,
    stations: IndexMap<String, JonesRef>,
    visibilities: Vec<(Baseline, JonesRef)>,
}

impl SkyModel {
    /// Build the visibility expressions of `source` on `baselines`. Parameters
    /// are taken from the polynomials in `store` that overlap `domain`.
    pub fn build<S: ParmStore + ?Sized>(
        store: &S,
        domain: &Domain,
        source: &PointSource,
        baselines: &[Baseline],
    ) -> Result<SkyModel, ModelError> {
        if baselines.is_empty() {
            return Err(ModelError::NoBaselines);
        }
        let PointSource { name, l, m, flux } = source;
        if l * l + m * m > 1.0 {
            return Err(ModelError::SourceOffSphere {
                source_name: name.clone(),
                l: *l,
                m: *m,
            });
        }

        let mut lookup = ParmLookup {
            store,
            domain: *domain,
            parms: IndexMap::new(),
        };

        let l = lookup.get_or(format!("l:{name}"), *l)?;
        let m = lookup.get_or(format!("m:{name}"), *m)?;
        let one: ExprRef = Rc::new(ConstNode::new("one", 1.0));
        let l_sq: ExprRef = Rc::new(ArithNode::mul(
            format!("l²:{name}"),
            vec![l.clone(), l.clone()],
        ));
        let m_sq: ExprRef = Rc::new(ArithNode::mul(
            format!("m²:{name}"),
            vec![m.clone(), m.clone()],
        ));
        let n_sq: ExprRef = Rc::new(ArithNode::sub(format!("n²:{name}"), vec![one, l_sq, m_sq]));
        let n: ExprRef = Rc::new(UnaryNode::new(format!("n:{name}"), UnaryFunc::Sqrt, n_sq));
        let flux = lookup.get_or(format!("flux:{name}"), *flux)?;

        let mut stations: IndexMap<String, JonesRef> = IndexMap::new();
        let mut visibilities = Vec::with_capacity(baselines.len());
        for baseline in baselines {
            if baseline.station1 == baseline.station2 {
                return Err(ModelError::AutoCorrelation {
                    station1: baseline.station1.clone(),
                    station2: baseline.station2.clone(),
                });
            }
            let mut station_gain = |station: &str| -> Result<JonesRef, ModelError> {
                if let Some(gain) = stations.get(station) {
                    return Ok(gain.clone());
                }
                let g11 = lookup.get_or(format!("gain:11:{station}"), 1.0)?;
                let g22 = lookup.get_or(format!("gain:22:{station}"), 1.0)?;
                let gain: JonesRef = Rc::new(JonesNode::diagonal(format!("G:{station}"), g11, g22));
                stations.insert(station.to_string(), gain.clone());
                Ok(gain)
            };
            let gain1 = station_gain(&baseline.station1)?;
            let gain2 = station_gain(&baseline.station2)?;

            let bl = baseline.name();
            let [u, v, w] = baseline.uvw;
            let u: ExprRef = Rc::new(ConstNode::new(format!("u:{bl}"), u));
            let v: ExprRef = Rc::new(ConstNode::new(format!("v:{bl}"), v));
            let w: ExprRef = Rc::new(ConstNode::new(format!("w:{bl}"), w));
            let dft: ExprRef = Rc::new(PointDftNode::new(
                format!("dft:{name}:{bl}"),
                l.clone(),
                m.clone(),
                n.clone(),
                u,
                v,
                w,
            ));
            let phase: ExprRef = Rc::new(DftChannelsNode::new(format!("K:{name}:{bl}"), dft));
            let brightness: ExprRef = Rc::new(ArithNode::mul(
                format!("IK:{name}:{bl}"),
                vec![flux.clone(), phase],
            ));
            let coherency: JonesRef = Rc::new(JonesNode::diagonal(
                format!("C:{name}:{bl}"),
                brightness.clone(),
                brightness,
            ));
            let vis: JonesRef = Rc::new(JonesVisibility::new(
                format!("V:{bl}"),
                gain1,
                coherency,
                gain2,
            ));
            visibilities.push((baseline.clone(), vis));
        }

        debug!(
            "Built a model of '{name}' over {} baselines and {} stations, with {} parameters from the store",
            visibilities.len(),
            stations.len(),
            lookup.parms.len()
        );
        Ok(SkyModel {
            parms: lookup.parms,
            stations,
            visibilities,
        })
    }

    /// The parameters that came from the store, in the order they were first
    /// used.
    pub fn parms(&self) -> impl Iterator<Item = &Rc<ParmNode>> {
        self.parms.values()
    }

    pub fn station_names(&self) -> impl Iterator<Item = &str> {
        self.stations.keys().map(|s| s.as_str())
    }

    pub fn baselines(&self) -> impl Iterator<Item = &Baseline> {
        self.visibilities.iter().map(|(b, _)| b)
    }

    /// Evaluate the visibility of every baseline.
    pub fn predict(&self, request: &Request) -> Result<Vec<Rc<JonesResult>>, ModelError> {
        self.visibilities
            .iter()
            .map(|(_, vis)| vis.get_result(request).map_err(ModelError::from))
            .collect()
    }

    /// Evaluate the visibility of every baseline into their file form.
    pub fn predict_vis(&self, request: &Request) -> Result<VisFile, ModelError> {
        let cells = request.cells();
        let results = self.predict(request)?;
        let baselines = self
            .visibilities
            .iter()
            .zip(results)
            .map(|((b, _), result)| {
                BaselineVis::from_jones(&b.station1, &b.station2, &result, cells.shape())
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(VisFile {
            freqs: cells.freq_centres(),
            times: cells.time_centres(),
            baselines,
        })
    }

    /// The parameters matching `patterns`. A pattern ending in `*` matches
    /// every parameter with that prefix; anything else must match a whole
    /// name. Each pattern must match at least one parameter.
    pub fn solvable_set(&self, patterns: &[String]) -> Result<SolvableSet, ModelError> {
        let is_match = |pattern: &str, name: &str| match pattern.strip_suffix('*') {
            Some(prefix) => name.starts_with(prefix),
            None => name == pattern,
        };
        if let Some(unmatched) = patterns
            .iter()
            .find(|p| !self.parms.keys().any(|name| is_match(p.as_str(), name.as_str())))
        {
            return Err(ModelError::UnmatchedSolvable(unmatched.clone()));
        }
        let parms = self
            .parms
            .iter()
            .filter(|(name, _)| patterns.iter().any(|p| is_match(p.as_str(), name.as_str())))
            .map(|(_, parm)| parm.clone())
            .collect();
        Ok(SolvableSet::new(parms))
    }

    /// One equation per polarisation of each observed baseline.
    pub fn equations(&self, observed: &VisFile, cells: &Cells) -> Result<Vec<Equation>, ModelError> {
        let (nx, ny) = cells.shape();
        for (axis, expected, actual) in [
            ("channels", nx, observed.freqs.len()),
            ("timesteps", ny, observed.times.len()),
        ] {
            if expected != actual {
                return Err(ModelError::GridMismatch {
                    axis,
                    expected,
                    actual,
                });
            }
        }

        let mut equations = Vec::with_capacity(observed.baselines.len() * 4);
        for obs in &observed.baselines {
            let (_, vis) = self
                .visibilities
                .iter()
                .find(|(b, _)| b.station1 == obs.station1 && b.station2 == obs.station2)
                .ok_or_else(|| ModelError::UnknownBaseline {
                    station1: obs.station1.clone(),
                    station2: obs.station2.clone(),
                })?;
            for (element, matrix) in obs.to_matrices((nx, ny))?.into_iter().enumerate() {
                let model: ExprRef = Rc::new(JonesElement::new(vis.clone(), element)?);
                equations.push(Equation::new(model, matrix));
            }
        }
        Ok(equations)
    }

    /// Save the polynomials of every parameter into `store`.
    pub fn store_parms<S: ParmStore + ?Sized>(&self, store: &mut S) -> Result<(), ModelError> {
        for (name, parm) in &self.parms {
            for polc in parm.polcs().iter() {
                store.store_coefficients(name, polc)?;
            }
        }
        Ok(())
    }
}
