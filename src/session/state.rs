//! Session state files: `{"slab": {...}, "description": {...}}`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::error::LabelBridgeError;
use crate::label::DescriptionLedger;

/// Persisted registry and ledger.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Label name -> value; 0 marks a background alias.
    #[serde(default)]
    pub slab: BTreeMap<String, u8>,
    #[serde(default)]
    pub description: DescriptionLedger,
}

/// Reads a session state file.
pub fn read_session(path: &Path) -> Result<SessionState, LabelBridgeError> {
    let file = File::open(path).map_err(LabelBridgeError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| LabelBridgeError::SessionParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes a session state file.
pub fn write_session(path: &Path, state: &SessionState) -> Result<(), LabelBridgeError> {
    let file = File::create(path).map_err(LabelBridgeError::Io)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, state).map_err(|source| LabelBridgeError::SessionWrite {
        path: path.to_path_buf(),
        source,
    })
}
