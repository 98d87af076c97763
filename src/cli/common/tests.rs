// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{fs::File, io::Write, path::PathBuf};

use indoc::indoc;
use tempfile::TempDir;

use super::*;
use crate::cli::predict::{PredictArgs, PredictCliArgs};

const ARGS_TOML: &str = indoc! {r#"
    [model]
    freq_range = [149e6, 151e6]
    time_range = [0.0, 20.0]
    num_channels = 4
    l = 0.01
    flux = 2.5

    [[model.baselines]]
    station1 = "A"
    station2 = "B"
    uvw = [100.0, 50.0, 10.0]

    [predict]
    output = "vis.json"
"#};

fn write_arg_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut f = File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn test_merge_prefers_cli() {
    let tmp_dir = TempDir::new().unwrap();
    let args_file = write_arg_file(&tmp_dir, "args.toml", ARGS_TOML);
    let cli = PredictArgs {
        args_file: Some(args_file),
        model_args: ModelArgs {
            flux: Some(3.0),
            num_timesteps: Some(5),
            ..Default::default()
        },
        predict_args: PredictCliArgs::default(),
    };

    let merged = cli.merge().unwrap();
    assert!(merged.args_file.is_none());
    let m = &merged.model_args;
    assert_eq!(m.flux, Some(3.0));
    assert_eq!(m.num_timesteps, Some(5));
    assert_eq!(m.num_channels, Some(4));
    assert_eq!(m.l, Some(0.01));
    assert_eq!(m.m, None);
    assert_eq!(m.baselines.as_ref().map(|b| b.len()), Some(1));
    assert_eq!(
        merged.predict_args.output,
        Some(PathBuf::from("vis.json"))
    );

    let params = merged.model_args.parse().unwrap();
    assert_eq!(params.cells.shape(), (4, 5));
    assert_eq!(params.source.name, "source");
    assert_eq!(params.source.m, 0.0);
    assert!(params.store.is_empty());
}

#[test]
fn test_json_arg_file() {
    let tmp_dir = TempDir::new().unwrap();
    let args_file = write_arg_file(
        &tmp_dir,
        "args.JSON",
        r#"{"model": {"freq_range": [1e8, 2e8], "source_name": "3C444"}}"#,
    );
    let merged = PredictArgs {
        args_file: Some(args_file),
        ..Default::default()
    }
    .merge()
    .unwrap();
    assert_eq!(merged.model_args.freq_range, Some(vec![1e8, 2e8]));
    assert_eq!(merged.model_args.source_name.as_deref(), Some("3C444"));
}

#[test]
fn test_bad_arg_files() {
    let tmp_dir = TempDir::new().unwrap();

    let args_file = write_arg_file(&tmp_dir, "args.yaml", "model: {}");
    let result = PredictArgs {
        args_file: Some(args_file),
        ..Default::default()
    }
    .merge();
    assert!(matches!(result, Err(MeqError::ArgFile(s)) if s.contains("toml, json")));

    let args_file = write_arg_file(&tmp_dir, "args.toml", "[model]\nflux = \"bright\"\n");
    let result = PredictArgs {
        args_file: Some(args_file),
        ..Default::default()
    }
    .merge();
    assert!(matches!(result, Err(MeqError::ArgFile(s)) if s.contains("toml")));
}

#[test]
fn test_parse_errors() {
    let args = ModelArgs::default();
    assert!(matches!(args.parse(), Err(MeqError::Args(s)) if s.contains("frequency range")));

    let args = ModelArgs {
        freq_range: Some(vec![1e8, 2e8]),
        ..Default::default()
    };
    assert!(matches!(args.parse(), Err(MeqError::Args(s)) if s.contains("time range")));

    let args = ModelArgs {
        freq_range: Some(vec![1e8, 2e8]),
        time_range: Some(vec![0.0]),
        ..Default::default()
    };
    assert!(matches!(args.parse(), Err(MeqError::Args(s)) if s.contains("exactly two")));

    let args = ModelArgs {
        freq_range: Some(vec![1e8, 2e8]),
        time_range: Some(vec![0.0, 10.0]),
        ..Default::default()
    };
    assert!(matches!(args.parse(), Err(MeqError::Args(s)) if s.contains("No baselines")));

    // Backwards frequencies.
    let args = ModelArgs {
        freq_range: Some(vec![2e8, 1e8]),
        time_range: Some(vec![0.0, 10.0]),
        ..Default::default()
    };
    assert!(matches!(args.parse(), Err(MeqError::Grid(_))));

    let args = ModelArgs {
        freq_range: Some(vec![1e8, 2e8]),
        time_range: Some(vec![0.0, 10.0]),
        num_channels: Some(0),
        ..Default::default()
    };
    assert!(matches!(args.parse(), Err(MeqError::Grid(_))));
}
