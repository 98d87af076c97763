// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with parameter stores.

use std::path::PathBuf;

use thiserror::Error;

use crate::polc::PolcError;

#[derive(Error, Debug)]
pub enum ParmDbError {
    #[error("There is no parameter named '{0}'")]
    UnknownParm(String),

    #[error("Parameter '{parm}' has no coefficients")]
    EmptyCoefficients { parm: String },

    #[error("Parameter '{parm}': coefficient row {row} has {actual} values, but the first row has {expected}")]
    RaggedCoefficients {
        parm: String,
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Parameter file '{}' doesn't have a recognised file extension! Valid extensions are: {valid}", .path.display())]
    UnrecognisedExtension { path: PathBuf, valid: String },

    #[error("Parameter '{parm}': {err}")]
    Polc {
        parm: String,
        #[source]
        err: PolcError,
    },

    #[error("Couldn't decode toml structure: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Couldn't encode toml structure: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
