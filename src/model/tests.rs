// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use marlu::c64;

use super::*;
use crate::{
    constants::{TAU, VEL_C},
    expr::ExprNode,
    parmdb::MemoryParmStore,
    polc::Polc,
    request::RequestIdGen,
    solver::{GaussNewton, SpidCounter},
};

fn band() -> Domain {
    Domain::new(149e6, 151e6, 0.0, 20.0).unwrap()
}

fn cells() -> Cells {
    Cells::regular(&band(), 4, 2).unwrap()
}

fn source() -> PointSource {
    PointSource {
        name: "src".to_string(),
        l: 0.01,
        m: 0.02,
        flux: 2.5,
    }
}

fn baselines() -> Vec<Baseline> {
    let baseline = |s1: &str, s2: &str, uvw: [f64; 3]| Baseline {
        station1: s1.to_string(),
        station2: s2.to_string(),
        uvw,
    };
    vec![
        baseline("A", "B", [100.0, 50.0, 10.0]),
        baseline("A", "C", [-30.0, 80.0, 2.0]),
        baseline("B", "C", [-130.0, 30.0, -8.0]),
    ]
}

fn gain_store(gains: &[(&str, f64, f64)]) -> MemoryParmStore {
    let mut store = MemoryParmStore::new();
    for &(station, g11, g22) in gains {
        store
            .store_coefficients(&format!("gain:11:{station}"), &Polc::constant(g11, band()))
            .unwrap();
        store
            .store_coefficients(&format!("gain:22:{station}"), &Polc::constant(g22, band()))
            .unwrap();
    }
    store
}

/// The phase term of `source()` on a baseline at a frequency.
fn phase(uvw: [f64; 3], freq: f64) -> c64 {
    let PointSource { l, m, .. } = source();
    let n = (1.0 - l * l - m * m).sqrt();
    let angle = TAU * freq / VEL_C * (uvw[0] * l + uvw[1] * m + uvw[2] * n);
    c64::new(angle.cos(), angle.sin())
}

#[test]
fn test_predict_without_parms() {
    let store = MemoryParmStore::new();
    let model = SkyModel::build(&store, &band(), &source(), &baselines()).unwrap();
    assert_eq!(model.parms().count(), 0);
    assert_eq!(model.station_names().collect::<Vec<_>>(), ["A", "B", "C"]);

    let cells = cells();
    let request = Request::new(RequestIdGen::new().next_id(), cells.clone());
    let vis = model.predict_vis(&request).unwrap();
    assert_eq!(vis.freqs, cells.freq_centres());
    assert_eq!(vis.baselines.len(), 3);

    for (b, bl) in baselines().iter().zip(&vis.baselines) {
        assert_eq!(bl.name(), b.name());
        for (k, freq) in cells.freq_centres().into_iter().enumerate() {
            let expected = phase(b.uvw, freq) * 2.5;
            for t in 0..2 {
                let [re, im] = bl.xx[k][t];
                assert_abs_diff_eq!(re, expected.re, epsilon = 1e-9);
                assert_abs_diff_eq!(im, expected.im, epsilon = 1e-9);
                assert_abs_diff_eq!(bl.yy[k][t][0], re, epsilon = 1e-12);
                assert_abs_diff_eq!(bl.yy[k][t][1], im, epsilon = 1e-12);
                assert_abs_diff_eq!(bl.xy[k][t][0], 0.0);
                assert_abs_diff_eq!(bl.yx[k][t][1], 0.0);
            }
        }
    }
}

#[test]
fn test_predict_with_gains() {
    let store = gain_store(&[("A", 1.5, 0.5), ("B", 2.0, 1.0)]);
    let model = SkyModel::build(&store, &band(), &source(), &baselines()).unwrap();
    // Station C isn't in the store.
    let names: Vec<_> = model.parms().map(|p| p.name().to_string()).collect();
    assert_eq!(names, ["gain:11:A", "gain:22:A", "gain:11:B", "gain:22:B"]);

    let cells = cells();
    let request = Request::new(RequestIdGen::new().next_id(), cells.clone());
    let results = model.predict(&request).unwrap();
    let freq = cells.freq_centres()[2];
    let uvw = baselines()[0].uvw;
    let v = results[0].to_marlu(2, 1).unwrap();
    let k = phase(uvw, freq) * 2.5;
    assert_abs_diff_eq!(v[0].re, (k * 3.0).re, epsilon = 1e-9);
    assert_abs_diff_eq!(v[3].im, (k * 0.5).im, epsilon = 1e-9);

    // A-C only has A's gains.
    let v = results[1].to_marlu(0, 0).unwrap();
    let k = phase(baselines()[1].uvw, cells.freq_centres()[0]) * 2.5;
    assert_abs_diff_eq!(v[0].re, (k * 1.5).re, epsilon = 1e-9);
}

#[test]
fn test_build_errors() {
    let store = MemoryParmStore::new();
    assert!(matches!(
        SkyModel::build(&store, &band(), &source(), &[]),
        Err(ModelError::NoBaselines)
    ));

    let far = PointSource {
        l: 0.9,
        m: 0.9,
        ..source()
    };
    assert!(matches!(
        SkyModel::build(&store, &band(), &far, &baselines()),
        Err(ModelError::SourceOffSphere { .. })
    ));

    let mut autos = baselines();
    autos[1].station2 = "A".to_string();
    assert!(matches!(
        SkyModel::build(&store, &band(), &source(), &autos),
        Err(ModelError::AutoCorrelation { .. })
    ));
}

#[test]
fn test_solvable_patterns() {
    let store = gain_store(&[("A", 1.0, 1.0), ("B", 1.0, 1.0)]);
    let model = SkyModel::build(&store, &band(), &source(), &baselines()).unwrap();

    let set = model.solvable_set(&["gain:11:*".to_string()]).unwrap();
    assert_eq!(set.parms().len(), 2);
    let set = model
        .solvable_set(&["gain:22:B".to_string(), "gain:*".to_string()])
        .unwrap();
    assert_eq!(set.parms().len(), 4);

    assert!(matches!(
        model.solvable_set(&["flux:*".to_string()]),
        Err(ModelError::UnmatchedSolvable(p)) if p == "flux:*"
    ));
}

#[test]
fn test_equations_check_observed() {
    let store = MemoryParmStore::new();
    let model = SkyModel::build(&store, &band(), &source(), &baselines()).unwrap();
    let cells = cells();
    let request = Request::new(RequestIdGen::new().next_id(), cells.clone());
    let mut vis = model.predict_vis(&request).unwrap();
    assert_eq!(model.equations(&vis, &cells).unwrap().len(), 12);

    vis.baselines[0].station1 = "D".to_string();
    assert!(matches!(
        model.equations(&vis, &cells),
        Err(ModelError::UnknownBaseline { .. })
    ));

    vis.baselines[0].station1 = "A".to_string();
    vis.baselines[0].xy[1].pop();
    assert!(matches!(
        model.equations(&vis, &cells),
        Err(ModelError::RaggedVisibilities {
            element: "xy",
            row: 1,
            ..
        })
    ));

    vis.times.push(30.0);
    assert!(matches!(
        model.equations(&vis, &cells),
        Err(ModelError::GridMismatch {
            axis: "timesteps",
            ..
        })
    ));
}

#[test]
fn test_solve_gains() {
    let truth = [("A", 1.2, 0.8), ("B", 0.9, 1.1), ("C", 1.05, 0.95)];
    let cells = cells();
    let mut ids = RequestIdGen::new();

    let true_model =
        SkyModel::build(&gain_store(&truth), &band(), &source(), &baselines()).unwrap();
    let observed = true_model
        .predict_vis(&Request::new(ids.next_id(), cells.clone()))
        .unwrap();

    let start = [("A", 1.0, 1.0), ("B", 1.0, 1.0), ("C", 1.0, 1.0)];
    let model = SkyModel::build(&gain_store(&start), &band(), &source(), &baselines()).unwrap();
    let mut set = model.solvable_set(&["gain:*".to_string()]).unwrap();
    assert_eq!(set.make_solvable(&mut SpidCounter::new()).unwrap(), 6);
    let equations = model.equations(&observed, &cells).unwrap();
    let report = GaussNewton::default()
        .solve(&set, &equations, &cells, &mut ids)
        .unwrap();
    assert!(report.converged);

    let mut solved = MemoryParmStore::new();
    model.store_parms(&mut solved).unwrap();
    for (station, g11, g22) in truth {
        let p11 = solved.polcs(&format!("gain:11:{station}")).unwrap();
        let p22 = solved.polcs(&format!("gain:22:{station}")).unwrap();
        assert_abs_diff_eq!(p11[0].coeff()[(0, 0)], g11, epsilon = 1e-8);
        assert_abs_diff_eq!(p22[0].coeff()[(0, 0)], g22, epsilon = 1e-8);
    }
}
