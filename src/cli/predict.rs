// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Predict the visibilities of a point source.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use clap::Parser;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::{
    common::{ModelArgs, ARG_FILE_HELP},
    MeqError,
};
use crate::request::{Request, RequestIdGen};

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct PredictCliArgs {
    /// Write the predicted visibilities to this json file. If this isn't
    /// given, the visibilities of the first cell of each baseline are logged.
    #[clap(short, long, help_heading = "OUTPUT FILES")]
    pub(super) output: Option<PathBuf>,
}

impl PredictCliArgs {
    fn merge(self, other: Self) -> Self {
        Self {
            output: self.output.or(other.output),
        }
    }
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct PredictArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(rename = "model")]
    #[serde(default)]
    pub(super) model_args: ModelArgs,

    #[clap(flatten)]
    #[serde(rename = "predict")]
    #[serde(default)]
    pub(super) predict_args: PredictCliArgs,
}

impl PredictArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified
    /// into a single struct. Where applicable, it will prefer CLI parameters
    /// over those in the file.
    pub(super) fn merge(self) -> Result<PredictArgs, MeqError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let PredictArgs {
                args_file: _,
                model_args,
                predict_args,
            } = unpack_arg_file!(arg_file);

            Ok(PredictArgs {
                args_file: None,
                model_args: cli_args.model_args.merge(model_args),
                predict_args: cli_args.predict_args.merge(predict_args),
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), MeqError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let PredictArgs {
            args_file: _,
            model_args,
            predict_args: PredictCliArgs { output },
        } = self;
        let params = model_args.parse()?;
        let model = params.build()?;

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let request = Request::new(RequestIdGen::new().next_id(), params.cells.clone());
        let vis = model.predict_vis(&request)?;

        match output {
            Some(output) => {
                let mut f = BufWriter::new(File::create(&output)?);
                serde_json::to_writer_pretty(&mut f, &vis)?;
                f.flush()?;
                info!(
                    "Wrote visibilities of {} baselines to {}",
                    vis.baselines.len(),
                    output.display()
                );
            }
            None => {
                for bl in &vis.baselines {
                    let first = |v: &[Vec<[f64; 2]>]| {
                        v.first()
                            .and_then(|row| row.first())
                            .copied()
                            .unwrap_or_default()
                    };
                    let [xx, xy, yx, yy] =
                        [&bl.xx, &bl.xy, &bl.yx, &bl.yy].map(|v| first(v.as_slice()));
                    info!(
                        "{}: XX {:+.6}{:+.6}i  XY {:+.6}{:+.6}i  YX {:+.6}{:+.6}i  YY {:+.6}{:+.6}i",
                        bl.name(),
                        xx[0],
                        xx[1],
                        xy[0],
                        xy[1],
                        yx[0],
                        yx[1],
                        yy[0],
                        yy[1]
                    );
                }
            }
        }
        Ok(())
    }
}
