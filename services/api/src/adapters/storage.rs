//! services/api/src/adapters/storage.rs
//!
//! This module contains the storage adapters, the concrete implementations
//! of the `SlotStorage` port from the `core` crate. The production adapter
//! keeps one flat JSON file per named slot; the in-memory adapter backs
//! tests and ephemeral runs.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use docqa_core::ports::{PortError, PortResult, SlotStorage};
use parking_lot::Mutex;

//=========================================================================================
// JsonFileStorage
//=========================================================================================

/// A storage adapter that writes each slot to `<data_dir>/<slot>.json`.
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    /// Creates the adapter, ensuring the data directory exists.
    pub fn new(dir: impl Into<PathBuf>) -> PortResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| PortError::Storage(e.to_string()))?;
        Ok(Self { dir })
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{}.json", slot))
    }
}

impl SlotStorage for JsonFileStorage {
    fn read(&self, slot: &str) -> PortResult<Option<String>> {
        match std::fs::read_to_string(self.slot_path(slot)) {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PortError::Storage(e.to_string())),
        }
    }

    fn write(&self, slot: &str, payload: &str) -> PortResult<()> {
        // Write to a sibling temp file and rename, so a crash mid-write
        // never leaves a half-written slot behind.
        let path = self.slot_path(slot);
        let tmp = self.dir.join(format!("{}.json.tmp", slot));
        std::fs::write(&tmp, payload).map_err(|e| PortError::Storage(e.to_string()))?;
        std::fs::rename(&tmp, &path).map_err(|e| PortError::Storage(e.to_string()))?;
        Ok(())
    }
}

//=========================================================================================
// MemoryStorage
//=========================================================================================

/// An ephemeral storage adapter. State dies with the process; used by
/// tests and by runs that do not want a data directory.
#[derive(Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotStorage for MemoryStorage {
    fn read(&self, slot: &str) -> PortResult<Option<String>> {
        Ok(self.slots.lock().get(slot).cloned())
    }

    fn write(&self, slot: &str, payload: &str) -> PortResult<()> {
        self.slots.lock().insert(slot.to_string(), payload.to_string());
        Ok(())
    }
}

//=========================================================================================
// Tests
//=========================================================================================
