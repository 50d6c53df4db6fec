//! Owned envelope written to and read from disk.

use serde::{Deserialize, Serialize};

use crate::model::{CircuitData, Settings};

use super::format::{FILE_VERSION, MAGIC};

/// A saved circuit together with the settings it was edited with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub magic: String,
    pub version: u32,
    pub circuit: CircuitData,
    #[serde(default)]
    pub settings: Settings,
}

impl Document {
    pub fn new(circuit: CircuitData, settings: Settings) -> Self {
        Self {
            magic: MAGIC.to_owned(),
            version: FILE_VERSION,
            circuit,
            settings,
        }
    }
}

/// Leading fields, read before the body so a foreign or newer file is
/// reported as such instead of as a field mismatch.
#[derive(Debug, Deserialize)]
pub(super) struct Header {
    pub magic: String,
    pub version: u32,
}
