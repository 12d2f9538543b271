//! Error taxonomy shared by every subsystem.
//!
//! Every failure carries an [`ErrorKind`] which doubles as the process exit
//! code, so the status returned by `main` identifies the deepest failing call.
//! Some kinds are informational: they report a benign no-op (for example
//! stopping a unit that is not running) rather than a failure.

use thiserror::Error;

use crate::config::loader::ConfigError;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, HostError>;

/// How a returned error should be treated by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Benign no-op; the requested state already holds.
    Info,
    /// Real failure.
    Error,
}

/// Failure kind. The discriminant is the process exit code.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Allocation = 10,
    InvalidArgument = 11,
    AlreadyInitialized = 12,
    NotInitialized = 13,
    AlreadyRunning = 14,
    NotRunning = 15,
    StillRunning = 16,
    AlreadyExists = 17,
    NotFound = 18,
    DoesNotExist = 19,
    Load = 20,
    Config = 21,
    Io = 22,
    Signal = 23,
}

impl ErrorKind {
    /// Exit code reported for this kind. Never zero.
    pub fn exit_code(self) -> u8 {
        self as u8
    }

    /// Inverse of [`ErrorKind::exit_code`], used when a status crosses the
    /// shared library boundary.
    pub fn from_code(code: i32) -> Option<Self> {
        let kind = match code {
            10 => ErrorKind::Allocation,
            11 => ErrorKind::InvalidArgument,
            12 => ErrorKind::AlreadyInitialized,
            13 => ErrorKind::NotInitialized,
            14 => ErrorKind::AlreadyRunning,
            15 => ErrorKind::NotRunning,
            16 => ErrorKind::StillRunning,
            17 => ErrorKind::AlreadyExists,
            18 => ErrorKind::NotFound,
            19 => ErrorKind::DoesNotExist,
            20 => ErrorKind::Load,
            21 => ErrorKind::Config,
            22 => ErrorKind::Io,
            23 => ErrorKind::Signal,
            _ => return None,
        };
        Some(kind)
    }
}

/// Errors produced by the runtime host.
#[derive(Debug, Error)]
pub enum HostError {
    /// An object could not be constructed.
    #[error("allocation failed: {0}")]
    Allocation(String),

    /// Caller supplied a value the operation cannot work with.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("already initialized")]
    AlreadyInitialized,

    /// Not initialized. Info-level when returned by `uninitialize`.
    #[error("not initialized")]
    NotInitialized(Severity),

    #[error("already running")]
    AlreadyRunning,

    #[error("not running")]
    NotRunning,

    /// Teardown requested while the unit is still running.
    #[error("still running")]
    StillRunning,

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The key is known but holds no value.
    #[error("value does not exist: {0}")]
    DoesNotExist(String),

    /// A shared library could not be loaded or lacks the entry point.
    #[error("failed to load library {library}: {reason}")]
    Load { library: String, reason: String },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Signal registration failed.
    #[error("signal setup failed: {0}")]
    Signal(String),
}

impl HostError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HostError::Allocation(_) => ErrorKind::Allocation,
            HostError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            HostError::AlreadyInitialized => ErrorKind::AlreadyInitialized,
            HostError::NotInitialized(_) => ErrorKind::NotInitialized,
            HostError::AlreadyRunning => ErrorKind::AlreadyRunning,
            HostError::NotRunning => ErrorKind::NotRunning,
            HostError::StillRunning => ErrorKind::StillRunning,
            HostError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            HostError::NotFound(_) => ErrorKind::NotFound,
            HostError::DoesNotExist(_) => ErrorKind::DoesNotExist,
            HostError::Load { .. } => ErrorKind::Load,
            HostError::Config(_) => ErrorKind::Config,
            HostError::Io(_) => ErrorKind::Io,
            HostError::Signal(_) => ErrorKind::Signal,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            HostError::AlreadyInitialized | HostError::AlreadyRunning | HostError::NotRunning => {
                Severity::Info
            }
            HostError::NotInitialized(severity) => *severity,
            _ => Severity::Error,
        }
    }

    /// True for benign no-op results.
    pub fn is_info(&self) -> bool {
        self.severity() == Severity::Info
    }

    pub fn exit_code(&self) -> u8 {
        self.kind().exit_code()
    }

    /// Rebuild an error from a status code received over the library ABI.
    pub fn from_status(code: i32, context: &str) -> Self {
        match ErrorKind::from_code(code) {
            Some(ErrorKind::NotFound) => HostError::NotFound(context.to_string()),
            Some(ErrorKind::InvalidArgument) => HostError::InvalidArgument(context.to_string()),
            Some(ErrorKind::AlreadyExists) => HostError::AlreadyExists(context.to_string()),
            Some(ErrorKind::DoesNotExist) => HostError::DoesNotExist(context.to_string()),
            _ => HostError::Allocation(format!("{context} (status {code})")),
        }
    }
}

/// Collapse a teardown result: info-level outcomes count as success.
pub fn ignore_info(result: Result<()>) -> Result<()> {
    match result {
        Err(e) if e.is_info() => Ok(()),
        other => other,
    }
}
