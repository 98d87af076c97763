// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The `meqcal` command line. Subcommand arguments can also come from an
//! argument file, so every field is optional or a `#[serde(default)]` bool.

#[macro_use]
mod common;
mod error;
mod parms_verify;
mod predict;
mod solve;

pub use error::MeqError;

use std::path::PathBuf;

use clap::{AppSettings, Args, Parser, Subcommand};
use log::{debug, info};

// Add build-time information from the "built" crate.
include!(concat!(env!("OUT_DIR"), "/built.rs"));

#[derive(Debug, Parser)]
#[clap(
    version,
    author,
    about = "Evaluate and solve expression-graph models of radio-interferometer visibilities"
)]
#[clap(global_setting(AppSettings::DeriveDisplayOrder))]
#[clap(disable_help_subcommand = true)]
#[clap(infer_subcommands = true)]
#[clap(propagate_version = true)]
#[clap(infer_long_args = true)]
pub struct Meqcal {
    #[clap(flatten)]
    global_opts: GlobalArgs,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// The verbosity of the program. Increase by specifying multiple times
    /// (e.g. -vv). The default is to print only high-level information.
    #[clap(short, long, parse(from_occurrences))]
    #[clap(global = true)]
    verbosity: u8,

    /// Only verify that arguments were correctly ingested and print out
    /// high-level information.
    #[clap(long)]
    #[clap(global = true)]
    dry_run: bool,

    /// Save the input arguments into a new TOML file that can be used to
    /// reproduce this run.
    #[clap(long)]
    #[clap(global = true)]
    save_toml: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
#[clap(arg_required_else_help = true)]
enum Command {
    #[clap(alias = "simulate")]
    #[clap(about = "Predict the visibilities of a point source through per-station gains.")]
    Predict(predict::PredictArgs),

    #[clap(alias = "calibrate")]
    #[clap(about = "Solve for model parameters against observed visibilities.")]
    Solve(solve::SolveArgs),

    #[clap(about = "Verify that parameter files can be read, and print their contents.")]
    ParmsVerify(parms_verify::ParmsVerifyArgs),
}

impl Meqcal {
    pub fn run(self) -> Result<(), MeqError> {
        let GlobalArgs {
            verbosity,
            dry_run,
            save_toml,
        } = self.global_opts;
        setup_logging(verbosity)?;

        let sub_command = match &self.command {
            Command::Predict(_) => "predict",
            Command::Solve(_) => "solve",
            Command::ParmsVerify(_) => "parms-verify",
        };
        info!("meqcal {} {}", sub_command, env!("CARGO_PKG_VERSION"));
        display_build_info();

        macro_rules! merge_save_run {
            ($args:expr) => {{
                let args = $args.merge()?;
                if let Some(toml) = save_toml {
                    use std::{
                        fs::File,
                        io::{BufWriter, Write},
                    };

                    let mut f = BufWriter::new(File::create(toml)?);
                    let toml_str = toml::to_string(&args)?;
                    f.write_all(toml_str.as_bytes())?;
                    f.flush()?;
                }
                args.run(dry_run)?;
            }};
        }

        match self.command {
            Command::Predict(args) => {
                merge_save_run!(args)
            }

            Command::Solve(args) => {
                merge_save_run!(args)
            }

            Command::ParmsVerify(args) => args.run()?,
        }

        info!("meqcal {} complete.", sub_command);
        Ok(())
    }
}

/// Log to stdout. `-v` adds debug messages and `-vv` adds trace messages
/// along with the source line that emitted them.
fn setup_logging(verbosity: u8) -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::from_default_env();
    builder
        .target(env_logger::Target::Stdout)
        .format_target(false)
        .filter_level(match verbosity {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        });
    if verbosity >= 2 {
        builder.format(|buf, record| {
            use std::io::Write;

            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                buf.timestamp(),
                record.level(),
                record.module_path().unwrap_or_default(),
                record.line().unwrap_or(0),
                record.args()
            )
        });
    }
    builder.try_init()
}

fn display_build_info() {
    let commit = GIT_COMMIT_HASH_SHORT.unwrap_or("unknown commit");
    let dirty = if GIT_DIRTY == Some(true) { "-dirty" } else { "" };
    debug!("Built from {commit}{dirty} at {BUILT_TIME_UTC} by {RUSTC_VERSION}");
}
