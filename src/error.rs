use std::path::PathBuf;
use thiserror::Error;

/// Per-file processing errors
///
/// Every variant is attributed to a single template; none of them is fatal
/// for the batch.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("cannot stat {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No space left on device for {path}")]
    DiskFull { path: PathBuf },

    #[error("cannot set permissions on {path}: {source}")]
    Permissions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("removing the template marker from {path} leaves an empty file name")]
    EmptyOutputName { path: PathBuf },
}

impl ProcessError {
    /// Map a write failure, singling out ENOSPC
    pub fn write(path: PathBuf, source: std::io::Error) -> Self {
        // ENOSPC on Unix
        if source.raw_os_error() == Some(28) {
            return ProcessError::DiskFull { path };
        }
        ProcessError::Write { path, source }
    }
}

/// Startup errors raised while loading the settings file
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Unsupported config format: {path} (expected .json, .toml, .yaml or .yml)")]
    UnsupportedFormat { path: PathBuf },

    #[error("Invalid config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<figment::Error>,
    },
}
