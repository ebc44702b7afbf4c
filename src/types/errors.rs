//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context. Collaborators (address managers, data
//! directory managers, session starters) return this same type so the
//! supervisor can hand their failures back to the caller untouched.

use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for the control-plane supervisor.
#[derive(Error, Debug)]
pub enum Error {
    /// A required collaborator has not produced a value yet (configuration error).
    #[error("not initialized: {0}")]
    NotInitialized(String),

    /// Address or data directory allocation failed.
    #[error("allocation error: {0}")]
    Allocation(String),

    /// The session starter could not launch the process.
    #[error("launch error: {0}")]
    Launch(String),

    /// Readiness marker was not observed within the start timeout.
    #[error("timeout waiting for {0} to start serving")]
    StartTimeout(String),

    /// Process exit was not observed within the stop timeout.
    #[error("timeout waiting for {0} to stop")]
    StopTimeout(String),

    /// Data directory removal failed after a clean exit.
    #[error("destroy error: {0}")]
    Destroy(String),

    /// Operation not valid in the current lifecycle state.
    #[error("state transition error: {0}")]
    StateTransition(String),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for the two timeout kinds produced by the start/stop races.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::StartTimeout(_) | Error::StopTimeout(_))
    }
}

// Convenience constructors
impl Error {
    pub fn not_initialized(msg: impl Into<String>) -> Self {
        Self::NotInitialized(msg.into())
    }

    pub fn allocation(msg: impl Into<String>) -> Self {
        Self::Allocation(msg.into())
    }

    pub fn launch(msg: impl Into<String>) -> Self {
        Self::Launch(msg.into())
    }

    pub fn start_timeout(name: impl Into<String>) -> Self {
        Self::StartTimeout(name.into())
    }

    pub fn stop_timeout(name: impl Into<String>) -> Self {
        Self::StopTimeout(name.into())
    }

    pub fn destroy(msg: impl Into<String>) -> Self {
        Self::Destroy(msg.into())
    }

    pub fn state_transition(msg: impl Into<String>) -> Self {
        Self::StateTransition(msg.into())
    }
}
