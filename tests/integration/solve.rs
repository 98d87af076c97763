// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use approx::assert_abs_diff_eq;
use tempfile::TempDir;

use crate::{gains_toml, get_cmd_output, meqcal, model_args_toml, write_file, TRUE_GAINS};
use meqcal::MemoryParmStore;

/// Predict visibilities with [`TRUE_GAINS`], returning the path to them.
fn observe(dir: &Path) -> PathBuf {
    let parms = write_file(dir, "truth.toml", &gains_toml(&TRUE_GAINS));
    let args = write_file(
        dir,
        "truth_args.toml",
        &model_args_toml(&format!("parms = '{}'", parms.display())),
    );
    let observed = dir.join("observed.json");

    #[rustfmt::skip]
    let cmd = meqcal()
        .args([
            "predict",
            &format!("{}", args.display()),
            "--output", &format!("{}", observed.display()),
        ])
        .ok();
    assert!(cmd.is_ok(), "predict failed: {}", cmd.err().unwrap());
    observed
}

#[test]
fn test_solve_recovers_gains() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let observed = observe(tmp_dir.path());
    let start = [("A", 1.0, 1.0), ("B", 1.0, 1.0), ("C", 1.0, 1.0)];
    let parms = write_file(tmp_dir.path(), "start.toml", &gains_toml(&start));
    let args = write_file(
        tmp_dir.path(),
        "args.toml",
        &model_args_toml(&format!("parms = '{}'", parms.display())),
    );
    let solved = tmp_dir.path().join("solved.yaml");

    #[rustfmt::skip]
    let cmd = meqcal()
        .args([
            "solve",
            &format!("{}", args.display()),
            "--observed", &format!("{}", observed.display()),
            "--solvables", "gain:*",
            "--require-convergence",
            "--output-parms", &format!("{}", solved.display()),
        ])
        .ok();
    assert!(cmd.is_ok(), "solve failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Solving for 6 coefficients of 6 parameters"), "{stdout}");

    let store = MemoryParmStore::read_file(&solved).unwrap();
    assert_eq!(store.len(), 6);
    for (station, g11, g22) in TRUE_GAINS {
        let p11 = store.polcs(&format!("gain:11:{station}")).unwrap();
        let p22 = store.polcs(&format!("gain:22:{station}")).unwrap();
        assert_eq!(p11.len(), 1);
        assert_abs_diff_eq!(p11[0].coeff()[(0, 0)], g11, epsilon = 1e-8);
        assert_abs_diff_eq!(p22[0].coeff()[(0, 0)], g22, epsilon = 1e-8);
    }
}

#[test]
fn test_solve_only_some_parms() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let observed = observe(tmp_dir.path());
    // Only the XX gains are wrong.
    let start = [("A", 1.0, 0.8), ("B", 1.0, 1.1), ("C", 1.0, 0.95)];
    let parms = write_file(tmp_dir.path(), "start.toml", &gains_toml(&start));
    let args = write_file(
        tmp_dir.path(),
        "args.toml",
        &model_args_toml(&format!("parms = '{}'", parms.display())),
    );
    let solved = tmp_dir.path().join("solved.toml");

    #[rustfmt::skip]
    let cmd = meqcal()
        .args([
            "solve",
            &format!("{}", args.display()),
            "--observed", &format!("{}", observed.display()),
            "-s", "gain:11:*",
            "-o", &format!("{}", solved.display()),
        ])
        .ok();
    assert!(cmd.is_ok(), "solve failed: {}", cmd.err().unwrap());

    let store = MemoryParmStore::read_file(&solved).unwrap();
    for (station, g11, g22) in TRUE_GAINS {
        let p11 = store.polcs(&format!("gain:11:{station}")).unwrap();
        let p22 = store.polcs(&format!("gain:22:{station}")).unwrap();
        assert_abs_diff_eq!(p11[0].coeff()[(0, 0)], g11, epsilon = 1e-8);
        // Untouched.
        assert_eq!(p22[0].coeff()[(0, 0)], g22);
    }
}

#[test]
fn test_solve_unmatched_solvable_fails() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let observed = observe(tmp_dir.path());
    let args = write_file(tmp_dir.path(), "args.toml", &model_args_toml(""));

    #[rustfmt::skip]
    let cmd = meqcal()
        .args([
            "solve",
            &format!("{}", args.display()),
            "--observed", &format!("{}", observed.display()),
            "--solvables", "gain:*",
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("gain:*"), "unexpected stderr: {stderr}");
}

#[test]
fn test_solve_without_observed_fails() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let args = write_file(tmp_dir.path(), "args.toml", &model_args_toml(""));

    let cmd = meqcal()
        .args(["solve", &format!("{}", args.display()), "-s", "gain:*"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(
        stderr.contains("No observed visibilities were supplied"),
        "unexpected stderr: {stderr}"
    );
}
