use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::atomic::{AtomicU64, Ordering};
#[cfg(test)]
use std::sync::Mutex;

use super::error::DutyStoreError;
use super::state::DutyState;

/// Synchronous, local storage for the duty record.
pub trait DutyStore: Send + Sync {
    /// Returns `None` when nothing has ever been written.
    fn get(&self) -> Result<Option<DutyState>, DutyStoreError>;
    fn put(&self, state: &DutyState) -> Result<(), DutyStoreError>;
}

pub struct FileDutyStore {
    path: PathBuf,
}

impl FileDutyStore {
    pub fn new(path: PathBuf) -> Self {
        FileDutyStore { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl DutyStore for FileDutyStore {
    fn get(&self) -> Result<Option<DutyState>, DutyStoreError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let state: DutyState = serde_yaml::from_str(&content)?;
        Ok(Some(state))
    }

    fn put(&self, state: &DutyState) -> Result<(), DutyStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // Write then rename so a crash mid-write never leaves a truncated record.
        let temp = self.temp_path();
        std::fs::write(&temp, serde_yaml::to_string(state)?)?;
        std::fs::rename(temp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct MemoryDutyStore {
    state: Mutex<Option<DutyState>>,
    writes: AtomicU64,
}

#[cfg(test)]
impl MemoryDutyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: DutyState) -> Self {
        MemoryDutyStore {
            state: Mutex::new(Some(state)),
            writes: AtomicU64::new(0),
        }
    }

    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
impl DutyStore for MemoryDutyStore {
    fn get(&self) -> Result<Option<DutyState>, DutyStoreError> {
        Ok(self.state.lock().unwrap().clone())
    }

    fn put(&self, state: &DutyState) -> Result<(), DutyStoreError> {
        *self.state.lock().unwrap() = Some(state.clone());
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
