// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests to ensure there is no stderr output for successful commands.

use tempfile::TempDir;

use crate::{gains_toml, get_cmd_output, meqcal, model_args_toml, write_file, TRUE_GAINS};

#[test]
fn test_predict_no_stderr() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let args = write_file(tmp_dir.path(), "args.toml", &model_args_toml(""));

    let cmd = meqcal()
        .args(["predict", &format!("{}", args.display())])
        .ok();
    assert!(cmd.is_ok(), "predict failed: {}", cmd.err().unwrap());
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
    // Without an output file, the first cell of each baseline is logged.
    assert!(stdout.contains("A-B: XX"), "{stdout}");
}

#[test]
fn test_solve_no_stderr() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let parms = write_file(tmp_dir.path(), "gains.toml", &gains_toml(&TRUE_GAINS));
    let args = write_file(
        tmp_dir.path(),
        "args.toml",
        &model_args_toml(&format!("parms = '{}'", parms.display())),
    );
    let observed = tmp_dir.path().join("observed.json");
    let solved = tmp_dir.path().join("solved.json");

    #[rustfmt::skip]
    let cmd = meqcal()
        .args([
            "predict",
            &format!("{}", args.display()),
            "--output", &format!("{}", observed.display()),
        ])
        .ok();
    assert!(cmd.is_ok(), "predict failed: {}", cmd.err().unwrap());

    // Already at the solution.
    #[rustfmt::skip]
    let cmd = meqcal()
        .args([
            "solve",
            &format!("{}", args.display()),
            "--observed", &format!("{}", observed.display()),
            "--solvables", "gain:11:A", "gain:22:B",
            "--output-parms", &format!("{}", solved.display()),
        ])
        .ok();
    assert!(cmd.is_ok(), "solve failed: {}", cmd.err().unwrap());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
    assert!(solved.exists());
}
