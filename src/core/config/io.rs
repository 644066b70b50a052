use crate::core::config::data::{path_display, Config};
use directories::ProjectDirs;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Errors that can occur when loading or saving files under the project directories.
#[derive(Debug)]
pub enum ConfigError {
    /// No home directory could be determined for this user.
    NoProjectDirs,

    /// Failed to read the file from disk.
    Read {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the file as valid TOML.
    Parse {
        /// Path to the file with invalid TOML.
        path: PathBuf,
        /// The TOML deserialization error.
        source: toml::de::Error,
    },

    /// Failed to write the file.
    Write {
        path: PathBuf,
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoProjectDirs => {
                write!(f, "Failed to determine a home directory for whispi files")
            }
            ConfigError::Read { path, source } => {
                write!(f, "Failed to read {}: {}", path_display(path), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "Failed to parse {}: {}", path_display(path), source)
            }
            ConfigError::Write { path, source } => {
                write!(f, "Failed to write {}: {}", path_display(path), source)
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::NoProjectDirs => None,
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Write { source, .. } => Some(source.as_ref()),
        }
    }
}

pub(crate) fn project_dirs() -> Result<ProjectDirs, ConfigError> {
    ProjectDirs::from("net", "whispi", "whispi").ok_or(ConfigError::NoProjectDirs)
}

/// Read a TOML file, treating a missing file as the type's default.
pub(crate) fn read_toml<T>(path: &Path) -> Result<T, ConfigError>
where
    T: serde::de::DeserializeOwned + Default,
{
    if !path.exists() {
        return Ok(T::default());
    }
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize to TOML and replace `path` atomically via a sibling temp file.
pub(crate) fn write_toml_atomic<T: serde::Serialize>(
    value: &T,
    path: &Path,
) -> Result<(), ConfigError> {
    let wrap = |source: Box<dyn StdError + Send + Sync>| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = path.parent().filter(|dir| !dir.as_os_str().is_empty());
    if let Some(dir) = parent {
        fs::create_dir_all(dir).map_err(|e| wrap(Box::new(e)))?;
    }

    let contents = toml::to_string_pretty(value).map_err(|e| wrap(Box::new(e)))?;
    let mut temp_file = match parent {
        Some(dir) => NamedTempFile::new_in(dir),
        None => NamedTempFile::new(),
    }
    .map_err(|e| wrap(Box::new(e)))?;

    temp_file
        .write_all(contents.as_bytes())
        .map_err(|e| wrap(Box::new(e)))?;
    temp_file
        .as_file_mut()
        .sync_all()
        .map_err(|e| wrap(Box::new(e)))?;
    temp_file.persist(path).map_err(|e| wrap(Box::new(e)))?;
    Ok(())
}

impl Config {
    pub fn load() -> Result<Config, ConfigError> {
        Self::load_from_path(&Self::get_config_path()?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to_path(&Self::get_config_path()?)
    }

    pub fn load_from_path(config_path: &Path) -> Result<Config, ConfigError> {
        read_toml(config_path)
    }

    pub fn save_to_path(&self, config_path: &Path) -> Result<(), ConfigError> {
        write_toml_atomic(self, config_path)
    }

    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }
}
