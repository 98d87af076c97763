// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Arguments and helpers shared by `meqcal` subcommands.

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use clap::Parser;
use itertools::Itertools;
use log::info;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

use super::MeqError;
use crate::{
    domain::{Cells, Domain},
    model::{Baseline, ModelError, PointSource, SkyModel},
    parmdb::{MemoryParmStore, PARM_FILE_TYPES_COMMA_SEPARATED},
};

const DEFAULT_NUM_CHANNELS: usize = 16;
const DEFAULT_NUM_TIMESTEPS: usize = 1;
const DEFAULT_SOURCE_NAME: &str = "source";
const DEFAULT_FLUX: f64 = 1.0;

lazy_static::lazy_static! {
    pub(super) static ref ARG_FILE_TYPES_COMMA_SEPARATED: String = ArgFileTypes::iter().join(", ");

    pub(super) static ref ARG_FILE_HELP: String =
        format!("All arguments may be specified in a file. Any CLI arguments override arguments set in the file. Supported formats: {}", *ARG_FILE_TYPES_COMMA_SEPARATED);

    static ref PARMS_HELP: String =
        format!("Path to the parameter file. Supported formats: {}. Parameters that aren't in the file are constants", *PARM_FILE_TYPES_COMMA_SEPARATED);

    static ref NUM_CHANNELS_HELP: String =
        format!("The number of frequency channels across the band. Default: {DEFAULT_NUM_CHANNELS}");

    static ref NUM_TIMESTEPS_HELP: String =
        format!("The number of timesteps across the time range. Default: {DEFAULT_NUM_TIMESTEPS}");

    static ref SOURCE_NAME_HELP: String =
        format!("The name of the point source, used to look up its parameters. Default: {DEFAULT_SOURCE_NAME}");

    static ref FLUX_HELP: String =
        format!("The Stokes I flux density of the source [Jy]. Default: {DEFAULT_FLUX}");
}

#[derive(Debug, Display, EnumIter, EnumString)]
pub(super) enum ArgFileTypes {
    #[strum(serialize = "toml")]
    Toml,
    #[strum(serialize = "json")]
    Json,
}

macro_rules! unpack_arg_file {
    ($arg_file:expr) => ({
        use std::{fs::File, io::Read, str::FromStr};

        use crate::cli::common::{ArgFileTypes, ARG_FILE_TYPES_COMMA_SEPARATED};

        debug!("Attempting to parse argument file {}", $arg_file.display());

        let mut contents = String::new();
        let arg_file_type = $arg_file
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| ArgFileTypes::from_str(&e).ok());

        match arg_file_type {
            Some(ArgFileTypes::Toml) => {
                debug!("Parsing toml file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match toml::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(MeqError::ArgFile(format!(
                            "Couldn't decode toml structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }
            Some(ArgFileTypes::Json) => {
                debug!("Parsing json file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match serde_json::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(MeqError::ArgFile(format!(
                            "Couldn't decode json structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }

            _ => {
                return Err(MeqError::ArgFile(format!(
                    "Argument file '{:?}' doesn't have a recognised file extension! Valid extensions are: {}", $arg_file, *ARG_FILE_TYPES_COMMA_SEPARATED)
                ))
            }
        }
    });
}

/// The grid, source and baselines of a point-source model.
#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct ModelArgs {
    #[clap(short, long, help = PARMS_HELP.as_str(), help_heading = "INPUT FILES")]
    pub(super) parms: Option<PathBuf>,

    /// The frequency band [Hz].
    #[clap(
        long, help_heading = "GRID",
        number_of_values = 2,
        value_names = &["START_HZ", "END_HZ"]
    )]
    pub(super) freq_range: Option<Vec<f64>>,

    /// The time range [s].
    #[clap(
        long, help_heading = "GRID",
        number_of_values = 2,
        allow_hyphen_values = true,
        value_names = &["START_S", "END_S"]
    )]
    pub(super) time_range: Option<Vec<f64>>,

    #[clap(short = 'c', long, help = NUM_CHANNELS_HELP.as_str(), help_heading = "GRID")]
    pub(super) num_channels: Option<usize>,

    #[clap(short = 't', long, help = NUM_TIMESTEPS_HELP.as_str(), help_heading = "GRID")]
    pub(super) num_timesteps: Option<usize>,

    #[clap(long, help = SOURCE_NAME_HELP.as_str(), help_heading = "SOURCE")]
    pub(super) source_name: Option<String>,

    /// The direction cosine l of the source. Default: 0
    #[clap(short, long, allow_hyphen_values = true, help_heading = "SOURCE")]
    pub(super) l: Option<f64>,

    /// The direction cosine m of the source. Default: 0
    #[clap(short, long, allow_hyphen_values = true, help_heading = "SOURCE")]
    pub(super) m: Option<f64>,

    #[clap(long, help = FLUX_HELP.as_str(), help_heading = "SOURCE")]
    pub(super) flux: Option<f64>,

    /// Baselines can only be given in an argument file.
    #[clap(skip)]
    pub(super) baselines: Option<Vec<Baseline>>,
}

impl ModelArgs {
    pub(super) fn merge(self, other: Self) -> Self {
        Self {
            parms: self.parms.or(other.parms),
            freq_range: self.freq_range.or(other.freq_range),
            time_range: self.time_range.or(other.time_range),
            num_channels: self.num_channels.or(other.num_channels),
            num_timesteps: self.num_timesteps.or(other.num_timesteps),
            source_name: self.source_name.or(other.source_name),
            l: self.l.or(other.l),
            m: self.m.or(other.m),
            flux: self.flux.or(other.flux),
            baselines: self.baselines.or(other.baselines),
        }
    }

    pub(super) fn parse(self) -> Result<ModelParams, MeqError> {
        let Self {
            parms,
            freq_range,
            time_range,
            num_channels,
            num_timesteps,
            source_name,
            l,
            m,
            flux,
            baselines,
        } = self;

        let (start_freq, end_freq) = match freq_range.as_deref() {
            Some(&[start, end]) => (start, end),
            Some(_) => return Err(ModelArgsError::BadRange("frequency").into()),
            None => return Err(ModelArgsError::NoFreqRange.into()),
        };
        let (start_time, end_time) = match time_range.as_deref() {
            Some(&[start, end]) => (start, end),
            Some(_) => return Err(ModelArgsError::BadRange("time").into()),
            None => return Err(ModelArgsError::NoTimeRange.into()),
        };
        let domain = Domain::new(start_freq, end_freq, start_time, end_time)?;
        let nx = num_channels.unwrap_or(DEFAULT_NUM_CHANNELS);
        let ny = num_timesteps.unwrap_or(DEFAULT_NUM_TIMESTEPS);
        let cells = Cells::regular(&domain, nx, ny)?;
        info!(
            "Grid: {nx} channels over {start_freq} - {end_freq} Hz, {ny} timesteps over {start_time} - {end_time} s"
        );

        let source = PointSource {
            name: source_name.unwrap_or_else(|| DEFAULT_SOURCE_NAME.to_string()),
            l: l.unwrap_or(0.0),
            m: m.unwrap_or(0.0),
            flux: flux.unwrap_or(DEFAULT_FLUX),
        };
        info!(
            "Source '{}' at (l, m) = ({}, {}), {} Jy",
            source.name, source.l, source.m, source.flux
        );

        let baselines = match baselines {
            Some(b) if !b.is_empty() => b,
            _ => return Err(ModelArgsError::NoBaselines.into()),
        };
        info!("{} baselines", baselines.len());

        let store = match &parms {
            Some(path) => {
                let store = MemoryParmStore::read_file(path)?;
                info!(
                    "Read {} parameters from {}",
                    store.len(),
                    path.display()
                );
                store
            }
            None => {
                info!("No parameter file given; every parameter is a constant");
                MemoryParmStore::new()
            }
        };

        Ok(ModelParams {
            store,
            cells,
            source,
            baselines,
        })
    }
}

/// Everything needed to build a [`SkyModel`].
pub(super) struct ModelParams {
    pub(super) store: MemoryParmStore,
    pub(super) cells: Cells,
    pub(super) source: PointSource,
    pub(super) baselines: Vec<Baseline>,
}

impl ModelParams {
    pub(super) fn build(&self) -> Result<SkyModel, ModelError> {
        SkyModel::build(
            &self.store,
            &self.cells.domain(),
            &self.source,
            &self.baselines,
        )
    }
}

#[derive(Error, Debug)]
pub(super) enum ModelArgsError {
    #[error("No frequency range was supplied")]
    NoFreqRange,

    #[error("No time range was supplied")]
    NoTimeRange,

    #[error("The {0} range needs exactly two values")]
    BadRange(&'static str),

    #[error("No baselines were supplied; they must be given in an argument file")]
    NoBaselines,
}
