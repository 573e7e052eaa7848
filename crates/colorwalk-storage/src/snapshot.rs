//! Whole-state JSON snapshot
//!
//! Written to a sibling temp file and renamed into place, so a crash mid-write
//! leaves the previous snapshot intact.

use crate::model::{Member, MemberId, Place, Walk, WalkId};
use crate::StoreError;
use colorwalk_recommend::PlaceId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything the store holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    pub version: u32,
    pub next_id: u64,
    pub members: BTreeMap<MemberId, Member>,
    pub places: BTreeMap<PlaceId, Place>,
    pub walks: BTreeMap<WalkId, Walk>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            next_id: 1,
            members: BTreeMap::new(),
            places: BTreeMap::new(),
            walks: BTreeMap::new(),
        }
    }
}

impl StoreState {
    /// One counter for every record kind; ids never repeat across kinds
    pub fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// `Ok(None)` when no snapshot exists yet
pub fn load(path: &Path) -> Result<Option<StoreState>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)?;
    match serde_json::from_str::<StoreState>(&contents) {
        Ok(state) if state.version == SNAPSHOT_VERSION => Ok(Some(state)),
        Ok(state) => Err(StoreError::Serialization(format!(
            "unsupported snapshot version {} in {}",
            state.version,
            path.display()
        ))),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "snapshot is not readable");
            Err(StoreError::Serialization(err.to_string()))
        }
    }
}

pub fn write_atomic(path: &Path, state: &StoreState) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(state)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

    let tmp = temp_path(path);
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    tracing::debug!(path = %path.display(), "snapshot written");
    Ok(())
}
