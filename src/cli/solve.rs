// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Fit parameters of a point-source model to observed visibilities.

use std::{fs::File, io::BufReader, path::PathBuf};

use clap::Parser;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    common::{ModelArgs, ARG_FILE_HELP},
    MeqError,
};
use crate::{
    constants::{DEFAULT_MAX_ITERATIONS, DEFAULT_SOLVE_TOLERANCE},
    model::VisFile,
    request::RequestIdGen,
    solver::{GaussNewton, SpidCounter},
};

const DEFAULT_OUTPUT_PARMS: &str = "meqcal_solved.toml";

lazy_static::lazy_static! {
    static ref MAX_ITERATIONS_HELP: String =
        format!("The maximum number of solver iterations. Default: {DEFAULT_MAX_ITERATIONS}");

    static ref TOLERANCE_HELP: String =
        format!("Stop iterating when the norm of an update is smaller than this. Default: {DEFAULT_SOLVE_TOLERANCE:e}");

    static ref OUTPUT_PARMS_HELP: String =
        format!("Where to write the solved parameters, together with the unsolved ones from the input parameter file. The format is determined by the extension. Default: {DEFAULT_OUTPUT_PARMS}");
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct SolveCliArgs {
    /// Path to the observed visibilities. These are json, as written by
    /// "predict".
    #[clap(long, help_heading = "INPUT FILES")]
    pub(super) observed: Option<PathBuf>,

    /// The parameters to solve for. A name ending in '*' matches every
    /// parameter with that prefix, e.g. "gain:*".
    #[clap(short, long, multiple_values(true), help_heading = "SOLVING")]
    pub(super) solvables: Option<Vec<String>>,

    #[clap(long, help = MAX_ITERATIONS_HELP.as_str(), help_heading = "SOLVING")]
    pub(super) max_iterations: Option<usize>,

    #[clap(long, help = TOLERANCE_HELP.as_str(), help_heading = "SOLVING")]
    pub(super) tolerance: Option<f64>,

    /// Fail if the solver doesn't converge.
    #[clap(long, help_heading = "SOLVING")]
    #[serde(default)]
    pub(super) require_convergence: bool,

    #[clap(short, long, help = OUTPUT_PARMS_HELP.as_str(), help_heading = "OUTPUT FILES")]
    pub(super) output_parms: Option<PathBuf>,
}

impl SolveCliArgs {
    fn merge(self, other: Self) -> Self {
        Self {
            observed: self.observed.or(other.observed),
            solvables: self.solvables.or(other.solvables),
            max_iterations: self.max_iterations.or(other.max_iterations),
            tolerance: self.tolerance.or(other.tolerance),
            require_convergence: self.require_convergence || other.require_convergence,
            output_parms: self.output_parms.or(other.output_parms),
        }
    }
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct SolveArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(rename = "model")]
    #[serde(default)]
    pub(super) model_args: ModelArgs,

    #[clap(flatten)]
    #[serde(rename = "solve")]
    #[serde(default)]
    pub(super) solve_args: SolveCliArgs,
}

impl SolveArgs {
    /// Merge the command-line arguments with those in the argument file,
    /// preferring the command line.
    pub(super) fn merge(self) -> Result<SolveArgs, MeqError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let SolveArgs {
                args_file: _,
                model_args,
                solve_args,
            } = unpack_arg_file!(arg_file);

            Ok(SolveArgs {
                args_file: None,
                model_args: cli_args.model_args.merge(model_args),
                solve_args: cli_args.solve_args.merge(solve_args),
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), MeqError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let SolveArgs {
            args_file: _,
            model_args,
            solve_args:
                SolveCliArgs {
                    observed,
                    solvables,
                    max_iterations,
                    tolerance,
                    require_convergence,
                    output_parms,
                },
        } = self;

        let observed = observed.ok_or(SolveArgsError::NoObserved)?;
        let solvables = match solvables {
            Some(s) if !s.is_empty() => s,
            _ => return Err(SolveArgsError::NoSolvables.into()),
        };
        let solver = GaussNewton {
            tolerance: tolerance.unwrap_or(DEFAULT_SOLVE_TOLERANCE),
            max_iterations: max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS),
        };
        let output_parms = output_parms.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PARMS));

        let mut params = model_args.parse()?;
        let model = params.build()?;
        let mut set = model.solvable_set(&solvables)?;
        let num_spids = set.make_solvable(&mut SpidCounter::new())?;
        info!(
            "Solving for {num_spids} coefficients of {} parameters",
            set.parms().len()
        );

        let observed: VisFile = serde_json::from_reader(BufReader::new(File::open(&observed)?))?;
        let equations = model.equations(&observed, &params.cells)?;
        info!("{} equations", equations.len());

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let report = solver.solve(&set, &equations, &params.cells, &mut RequestIdGen::new())?;
        info!(
            "Finished after {} iterations: chi² = {:e}, |update| = {:e}",
            report.iterations, report.chi_sq, report.update_norm
        );
        if !report.converged && require_convergence {
            return Err(SolveArgsError::NotConverged {
                iterations: report.iterations,
            }
            .into());
        }
        for (name, coeffs) in set.get_current_values() {
            for c in coeffs {
                debug!("{name}: {c}");
            }
        }
        set.clear_solvable();

        model.store_parms(&mut params.store)?;
        params.store.write_file(&output_parms)?;
        info!("Wrote solved parameters to {}", output_parms.display());
        Ok(())
    }
}

#[derive(Error, Debug)]
pub(super) enum SolveArgsError {
    #[error("No observed visibilities were supplied")]
    NoObserved,

    #[error("No parameters to solve for were supplied")]
    NoSolvables,

    #[error("The solver didn't converge after {iterations} iterations")]
    NotConverged { iterations: usize },
}
