// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{fs::File, io::BufReader};

use approx::assert_abs_diff_eq;
use tempfile::TempDir;

use crate::{gains_toml, get_cmd_output, meqcal, model_args_toml, write_file, TRUE_GAINS};
use meqcal::model::VisFile;

#[test]
fn test_predict_writes_visibilities() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let args = write_file(tmp_dir.path(), "args.toml", &model_args_toml(""));
    let output = tmp_dir.path().join("vis.json");

    #[rustfmt::skip]
    let cmd = meqcal()
        .args([
            "predict",
            &format!("{}", args.display()),
            "--output", &format!("{}", output.display()),
        ])
        .ok();
    assert!(cmd.is_ok(), "predict failed: {}", cmd.err().unwrap());

    let vis: VisFile = serde_json::from_reader(BufReader::new(File::open(&output).unwrap())).unwrap();
    assert_eq!(vis.freqs.len(), 4);
    assert_eq!(vis.times.len(), 2);
    assert_eq!(vis.baselines.len(), 3);
    assert_eq!(vis.baselines[1].name(), "A-C");
    // No gains; every XX amplitude is the flux density.
    for bl in &vis.baselines {
        for row in &bl.xx {
            for [re, im] in row {
                assert_abs_diff_eq!(re.hypot(*im), 2.5, epsilon = 1e-9);
            }
        }
    }
}

#[test]
fn test_predict_with_gains_and_cli_override() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let parms = write_file(tmp_dir.path(), "gains.toml", &gains_toml(&TRUE_GAINS));
    let args = write_file(
        tmp_dir.path(),
        "args.toml",
        &model_args_toml(&format!("parms = '{}'", parms.display())),
    );
    let output = tmp_dir.path().join("vis.json");

    // The flux density on the command line overrides the argument file.
    #[rustfmt::skip]
    let cmd = meqcal()
        .args([
            "predict",
            &format!("{}", args.display()),
            "--flux", "1.0",
            "-o", &format!("{}", output.display()),
        ])
        .ok();
    assert!(cmd.is_ok(), "predict failed: {}", cmd.err().unwrap());

    let vis: VisFile = serde_json::from_reader(BufReader::new(File::open(&output).unwrap())).unwrap();
    // A-B: |XX| = g11_A * g11_B, |YY| = g22_A * g22_B.
    let [re, im] = vis.baselines[0].xx[0][0];
    assert_abs_diff_eq!(re.hypot(im), 1.2 * 0.9, epsilon = 1e-9);
    let [re, im] = vis.baselines[0].yy[3][1];
    assert_abs_diff_eq!(re.hypot(im), 0.8 * 1.1, epsilon = 1e-9);
}

#[test]
fn test_predict_dry_run_saves_toml() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let args = write_file(tmp_dir.path(), "args.toml", &model_args_toml(""));
    let saved = tmp_dir.path().join("saved.toml");
    let output = tmp_dir.path().join("vis.json");

    #[rustfmt::skip]
    let cmd = meqcal()
        .args([
            "predict",
            &format!("{}", args.display()),
            "--num-channels", "8",
            "--dry-run",
            "--save-toml", &format!("{}", saved.display()),
            "--output", &format!("{}", output.display()),
        ])
        .ok();
    assert!(cmd.is_ok(), "predict failed: {}", cmd.err().unwrap());
    assert!(saved.exists());
    assert!(!output.exists());

    // The saved arguments reproduce the merged run.
    let cmd = meqcal()
        .args(["predict", &format!("{}", saved.display())])
        .ok();
    assert!(cmd.is_ok(), "predict failed: {}", cmd.err().unwrap());
    let vis: VisFile = serde_json::from_reader(BufReader::new(File::open(&output).unwrap())).unwrap();
    assert_eq!(vis.freqs.len(), 8);
}

#[test]
fn test_predict_without_freq_range_fails() {
    #[rustfmt::skip]
    let cmd = meqcal()
        .args([
            "predict",
            "--time-range", "0", "20",
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(
        stderr.contains("No frequency range was supplied"),
        "unexpected stderr: {stderr}"
    );
}

#[test]
fn test_predict_without_baselines_fails() {
    #[rustfmt::skip]
    let cmd = meqcal()
        .args([
            "predict",
            "--freq-range", "149e6", "151e6",
            "--time-range", "0", "20",
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("No baselines"), "unexpected stderr: {stderr}");
}
