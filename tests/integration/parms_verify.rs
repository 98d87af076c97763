// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use indoc::indoc;
use tempfile::TempDir;

use crate::{gains_toml, get_cmd_output, meqcal, write_file, TRUE_GAINS};

#[test]
fn test_parms_verify() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let parms = write_file(tmp_dir.path(), "gains.toml", &gains_toml(&TRUE_GAINS));

    let cmd = meqcal()
        .args(["parms-verify", &format!("{}", parms.display())])
        .ok();
    assert!(cmd.is_ok(), "parms-verify failed: {}", cmd.err().unwrap());
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
    assert!(stdout.contains("6 parameters"), "{stdout}");
    assert!(stdout.contains("gain:22:C: 1 polcs"), "{stdout}");
}

#[test]
fn test_parms_verify_bad_file() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let good = write_file(tmp_dir.path(), "gains.toml", &gains_toml(&TRUE_GAINS));
    // The domain's frequencies are backwards.
    let bad = write_file(
        tmp_dir.path(),
        "bad.toml",
        indoc! {r#"
            [[phase]]
            coeff = [[1.0]]
            domain = { freq = [151e6, 149e6], time = [0.0, 20.0] }
        "#},
    );

    #[rustfmt::skip]
    let cmd = meqcal()
        .args([
            "parms-verify",
            &format!("{}", good.display()),
            &format!("{}", bad.display()),
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(
        stderr.contains("1 parameter file(s) couldn't be read"),
        "unexpected stderr: {stderr}"
    );
}

#[test]
fn test_parms_verify_unknown_extension() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let parms = write_file(tmp_dir.path(), "gains.txt", &gains_toml(&TRUE_GAINS));

    let cmd = meqcal()
        .args(["parms-verify", &format!("{}", parms.display())])
        .ok();
    assert!(cmd.is_err());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("toml, json, yaml"), "{stdout}");
}
