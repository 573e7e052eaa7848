//! ColorWalk Storage
//!
//! Members, places and walk sessions behind one lock, persisted as a single
//! JSON snapshot:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       COLORWALK STORE                               │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │                                                                     │
//! │  ┌─────────┐     ┌───────────────┐     ┌─────────────────┐          │
//! │  │  CLI /  │────►│  RwLock<      │────►│  state.json     │          │
//! │  │  HTTP   │     │   StoreState> │     │  (tmp + rename) │          │
//! │  └─────────┘     └───────┬───────┘     └─────────────────┘          │
//! │                          │                                          │
//! │                          ▼                                          │
//! │                  ┌───────────────┐                                  │
//! │                  │ PlaceCatalog  │──► recommendation service        │
//! │                  └───────────────┘                                  │
//! │                                                                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutation runs under the write lock and, with `autosave`, rewrites
//! the snapshot before the lock is released.

pub mod model;
pub mod snapshot;

mod places;
mod walks;


use chrono::Utc;
use colorwalk_recommend::{Candidate, PlaceCatalog};
use model::MemberId;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use snapshot::StoreState;
use std::path::PathBuf;

pub use model::{
    ColorTheme, Member, Place, PlaceCreateRequest, RegisterMemberRequest, StartWalkRequest, Walk,
    WalkResponse, WalkingPoint, WalkingPointRequest, WalkingPointResponse,
};

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the snapshot
    pub data_dir: PathBuf,
    /// Snapshot file name inside `data_dir`
    pub snapshot_file: String,
    /// Rewrite the snapshot after every mutation
    pub autosave: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./colorwalk-data"),
            snapshot_file: "state.json".to_string(),
            autosave: true,
        }
    }
}

impl StorageConfig {
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(&self.snapshot_file)
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Place {0} not found")]
    PlaceNotFound(u64),
    #[error("Walk {0} not found")]
    WalkNotFound(u64),
    #[error("Member {0} not found")]
    MemberNotFound(u64),
    #[error("Walk {0} has already finished")]
    WalkFinished(u64),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::PlaceNotFound(_) | StoreError::WalkNotFound(_) | StoreError::MemberNotFound(_)
        )
    }
}

pub(crate) fn require_non_blank(field: &str, value: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::InvalidRequest(format!("{field} must not be blank")));
    }
    Ok(())
}

pub(crate) fn require_coordinates(latitude: f64, longitude: f64) -> Result<(), StoreError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(StoreError::InvalidRequest(format!(
            "latitude {latitude} is outside [-90, 90]"
        )));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(StoreError::InvalidRequest(format!(
            "longitude {longitude} is outside [-180, 180]"
        )));
    }
    Ok(())
}

// ============================================================================
// Store
// ============================================================================

pub struct ColorWalkStore {
    state: RwLock<StoreState>,
    snapshot_path: Option<PathBuf>,
    autosave: bool,
}

impl ColorWalkStore {
    /// Load the snapshot named by `config`, or start empty if there is none
    pub fn open(config: &StorageConfig) -> Result<Self, StoreError> {
        let path = config.snapshot_path();
        let state = snapshot::load(&path)?.unwrap_or_default();
        tracing::info!(
            path = %path.display(),
            members = state.members.len(),
            places = state.places.len(),
            walks = state.walks.len(),
            "store opened"
        );
        Ok(Self {
            state: RwLock::new(state),
            snapshot_path: Some(path),
            autosave: config.autosave,
        })
    }

    /// A store that never touches disk
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            snapshot_path: None,
            autosave: false,
        }
    }

    /// Write the snapshot now, regardless of `autosave`
    pub fn save(&self) -> Result<(), StoreError> {
        match &self.snapshot_path {
            Some(path) => snapshot::write_atomic(path, &self.state.read()),
            None => Ok(()),
        }
    }

    pub(crate) fn read<T>(&self, f: impl FnOnce(&StoreState) -> T) -> T {
        f(&self.state.read())
    }

    /// Apply `f` to a working copy under the write lock.
    ///
    /// The copy replaces the live state only once `f` succeeded and, when
    /// autosaving, the snapshot was written. Any error leaves the store as it was.
    pub(crate) fn mutate<T>(
        &self,
        f: impl FnOnce(&mut StoreState) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut state = self.state.write();
        let mut draft = state.clone();
        let out = f(&mut draft)?;
        if self.autosave {
            if let Some(path) = &self.snapshot_path {
                snapshot::write_atomic(path, &draft)?;
            }
        }
        *state = draft;
        Ok(out)
    }

    // ========================================================================
    // Members
    // ========================================================================

    pub fn register_member(&self, request: RegisterMemberRequest) -> Result<Member, StoreError> {
        require_non_blank("username", &request.username)?;
        require_non_blank("email", &request.email)?;

        let member = self.mutate(|state| {
            if state.members.values().any(|m| m.username == request.username) {
                return Err(StoreError::InvalidRequest(format!(
                    "username `{}` is taken",
                    request.username
                )));
            }
            if state.members.values().any(|m| m.email == request.email) {
                return Err(StoreError::InvalidRequest(format!(
                    "email `{}` is already registered",
                    request.email
                )));
            }
            let member = Member {
                id: state.allocate_id(),
                username: request.username,
                email: request.email,
                nickname: request.nickname,
                created_at: Utc::now(),
            };
            state.members.insert(member.id, member.clone());
            Ok(member)
        })?;

        tracing::info!(member_id = member.id, username = %member.username, "member registered");
        Ok(member)
    }

    pub fn member(&self, id: MemberId) -> Result<Member, StoreError> {
        self.read(|state| state.members.get(&id).cloned())
            .ok_or(StoreError::MemberNotFound(id))
    }
}

impl PlaceCatalog for ColorWalkStore {
    fn list_candidates(&self) -> anyhow::Result<Vec<Candidate>> {
        Ok(self.read(|state| state.places.values().map(Place::to_candidate).collect()))
    }

    fn member_exists(&self, member_id: u64) -> anyhow::Result<bool> {
        Ok(self.read(|state| state.members.contains_key(&member_id)))
    }
}
