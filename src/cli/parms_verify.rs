// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Verify that parameter files can be read, and print their contents.

use std::path::PathBuf;

use clap::Parser;
use log::{info, warn};
use thiserror::Error;

use super::MeqError;
use crate::parmdb::{MemoryParmStore, PARM_FILE_TYPES_COMMA_SEPARATED};

lazy_static::lazy_static! {
    static ref PARM_FILES_HELP: String =
        format!("Paths to the parameter files to be verified. Supported formats: {}", *PARM_FILE_TYPES_COMMA_SEPARATED);
}

#[derive(Parser, Debug, Default)]
pub(super) struct ParmsVerifyArgs {
    #[clap(name = "PARM_FILES", help = PARM_FILES_HELP.as_str(), parse(from_os_str))]
    pub(super) parm_files: Vec<PathBuf>,
}

impl ParmsVerifyArgs {
    pub(super) fn run(self) -> Result<(), MeqError> {
        if self.parm_files.is_empty() {
            return Err(ParmsVerifyError::NoFiles.into());
        }

        let mut num_bad = 0;
        for parm_file in &self.parm_files {
            info!("{}:", parm_file.display());
            let store = match MemoryParmStore::read_file(parm_file) {
                Ok(s) => s,
                Err(e) => {
                    warn!("{e}");
                    num_bad += 1;
                    continue;
                }
            };

            info!("    {} parameters", store.len());
            for name in store.names() {
                let polcs = store.polcs(name)?;
                info!("    {name}: {} polcs", polcs.len());
                for polc in &polcs {
                    let d = polc.domain();
                    info!(
                        "        {} freq x {} time coefficients ({} fixed) over {} - {} Hz, {} - {} s",
                        polc.num_freq_orders(),
                        polc.num_time_orders(),
                        polc.mask().iter().filter(|&&m| !m).count(),
                        d.start_freq(),
                        d.end_freq(),
                        d.start_time(),
                        d.end_time()
                    );
                }
            }
            info!("");
        }

        if num_bad > 0 {
            return Err(ParmsVerifyError::Unreadable(num_bad).into());
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub(super) enum ParmsVerifyError {
    #[error("No parameter files were supplied")]
    NoFiles,

    #[error("{0} parameter file(s) couldn't be read")]
    Unreadable(usize),
}
