// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod no_stderr;
mod parms_verify;
mod predict;
mod solve;

use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
    process::Output,
    str::from_utf8,
};

use assert_cmd::{output::OutputError, Command};
use indoc::{formatdoc, indoc};

fn meqcal() -> Command {
    Command::cargo_bin("meqcal").unwrap()
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

/// Write `contents` to `name` inside `dir`, returning the path.
fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    let mut f = File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    path
}

/// Per-station gains over the whole test band, as a toml parameter file.
fn gains_toml(gains: &[(&str, f64, f64)]) -> String {
    let mut s = String::new();
    for (station, g11, g22) in gains {
        for (pol, g) in [("11", g11), ("22", g22)] {
            s.push_str(&formatdoc! {r#"
                [["gain:{pol}:{station}"]]
                coeff = [[{g:?}]]
                domain = {{ freq = [149e6, 151e6], time = [0.0, 20.0] }}

            "#});
        }
    }
    s
}

/// An argument file describing the test model. `extra` is put into the
/// `[model]` table.
fn model_args_toml(extra: &str) -> String {
    let baselines = indoc! {r#"
        [[model.baselines]]
        station1 = "A"
        station2 = "B"
        uvw = [100.0, 50.0, 10.0]

        [[model.baselines]]
        station1 = "A"
        station2 = "C"
        uvw = [-30.0, 80.0, 2.0]

        [[model.baselines]]
        station1 = "B"
        station2 = "C"
        uvw = [-130.0, 30.0, -8.0]
    "#};
    formatdoc! {r#"
        [model]
        freq_range = [149e6, 151e6]
        time_range = [0.0, 20.0]
        num_channels = 4
        num_timesteps = 2
        source_name = "src"
        l = 0.01
        m = 0.02
        flux = 2.5
        {extra}

        {baselines}
    "#}
}

const TRUE_GAINS: [(&str, f64, f64); 3] = [("A", 1.2, 0.8), ("B", 0.9, 1.1), ("C", 1.05, 0.95)];
