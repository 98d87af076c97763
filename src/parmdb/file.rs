// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reading and writing parameter files.

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
    str::FromStr,
};

use itertools::Itertools;
use log::debug;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use super::{MemoryParmStore, ParmDbError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
pub enum ParmFileType {
    #[strum(serialize = "toml")]
    Toml,

    #[strum(serialize = "json")]
    Json,

    #[strum(to_string = "yaml", serialize = "yml")]
    Yaml,
}

lazy_static::lazy_static! {
    pub static ref PARM_FILE_TYPES_COMMA_SEPARATED: String = ParmFileType::iter().join(", ");
}

impl ParmFileType {
    /// Work out the file type from the extension of `path`.
    pub fn from_path(path: &Path) -> Result<ParmFileType, ParmDbError> {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| ParmFileType::from_str(&e).ok())
            .ok_or_else(|| ParmDbError::UnrecognisedExtension {
                path: path.to_path_buf(),
                valid: PARM_FILE_TYPES_COMMA_SEPARATED.clone(),
            })
    }
}

pub(crate) fn parms_from_toml<T: BufRead>(buf: &mut T) -> Result<MemoryParmStore, ParmDbError> {
    let mut contents = String::new();
    buf.read_to_string(&mut contents)?;
    Ok(toml::from_str(&contents)?)
}

pub(crate) fn parms_from_json<T: BufRead>(buf: &mut T) -> Result<MemoryParmStore, ParmDbError> {
    Ok(serde_json::from_reader(buf)?)
}

pub(crate) fn parms_from_yaml<T: BufRead>(buf: &mut T) -> Result<MemoryParmStore, ParmDbError> {
    Ok(serde_yaml::from_reader(buf)?)
}

pub(crate) fn parms_to_toml<T: Write>(
    buf: &mut T,
    store: &MemoryParmStore,
) -> Result<(), ParmDbError> {
    let s = toml::to_string(store)?;
    buf.write_all(s.as_bytes())?;
    Ok(())
}

pub(crate) fn parms_to_json<T: Write>(
    buf: &mut T,
    store: &MemoryParmStore,
) -> Result<(), ParmDbError> {
    serde_json::to_writer_pretty(buf, store)?;
    Ok(())
}

pub(crate) fn parms_to_yaml<T: Write>(
    buf: &mut T,
    store: &MemoryParmStore,
) -> Result<(), ParmDbError> {
    serde_yaml::to_writer(buf, store)?;
    Ok(())
}

impl MemoryParmStore {
    /// Read a parameter file. The format is determined by the file extension.
    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<MemoryParmStore, ParmDbError> {
        let path = path.as_ref();
        let file_type = ParmFileType::from_path(path)?;
        debug!("Reading {file_type} parameter file {}", path.display());
        let mut buf = BufReader::new(File::open(path)?);
        let store = match file_type {
            ParmFileType::Toml => parms_from_toml(&mut buf)?,
            ParmFileType::Json => parms_from_json(&mut buf)?,
            ParmFileType::Yaml => parms_from_yaml(&mut buf)?,
        };
        store.validate()?;
        debug!("Read {} parameters", store.len());
        Ok(store)
    }

    /// Write a parameter file. The format is determined by the file extension.
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ParmDbError> {
        let path = path.as_ref();
        let file_type = ParmFileType::from_path(path)?;
        debug!("Writing {file_type} parameter file {}", path.display());
        let mut buf = BufWriter::new(File::create(path)?);
        match file_type {
            ParmFileType::Toml => parms_to_toml(&mut buf, self)?,
            ParmFileType::Json => parms_to_json(&mut buf, self)?,
            ParmFileType::Yaml => parms_to_yaml(&mut buf, self)?,
        }
        buf.flush()?;
        Ok(())
    }
}
