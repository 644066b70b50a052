//! The only client state that survives a restart: the user id and the
//! device id. Conversation content is never stored locally.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::config::io::{project_dirs, read_toml, write_toml_atomic};
use crate::core::config::ConfigError;
use crate::core::device::generate_device_id;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub uid: Option<String>,
    pub device_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn open_default() -> Result<Self, ConfigError> {
        Ok(Self::new(project_dirs()?.data_dir().join("session.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<SessionState, ConfigError> {
        read_toml(&self.path)
    }

    pub fn save(&self, state: &SessionState) -> Result<(), ConfigError> {
        write_toml_atomic(state, &self.path)
    }

    pub fn save_uid(&self, uid: &str) -> Result<(), ConfigError> {
        let mut state = self.load()?;
        state.uid = Some(uid.to_string());
        self.save(&state)
    }

    /// Forget the user id. The device id is kept.
    pub fn clear_uid(&self) -> Result<(), ConfigError> {
        let mut state = self.load()?;
        state.uid = None;
        self.save(&state)
    }

    /// Return the persisted device id, generating and storing one on first use.
    pub fn ensure_device_id(&self) -> Result<String, ConfigError> {
        self.ensure_device_id_with(generate_device_id)
    }

    pub fn ensure_device_id_with<F>(&self, generate: F) -> Result<String, ConfigError>
    where
        F: FnOnce() -> String,
    {
        let mut state = self.load()?;
        if let Some(existing) = state.device_id.as_ref().filter(|id| !id.is_empty()) {
            return Ok(existing.clone());
        }
        let device_id = generate();
        state.device_id = Some(device_id.clone());
        self.save(&state)?;
        Ok(device_id)
    }
}
