//! Error taxonomy for the player runtime.
//!
//! Three families: rejected operations (the call fails, other compositions
//! are unaffected), recoverable render conditions (surfaced as events plus a
//! ticker pause, never as a Result), and intentionally stubbed methods.

use thiserror::Error;

/// Errors returned by fallible player operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlayerError {
    /// The display host was used before `initialize` bound it to a host
    /// engine context.
    #[error("display host is not initialized")]
    NotInitialized,

    /// A scene load settled after the owning display host was disposed.
    /// The half-built composition is never registered.
    #[error("disposed player can not be used to create composition")]
    DisposedDuringLoad,

    /// The external scene loader reported a failure; propagated to the
    /// caller of the load, never swallowed.
    #[error("scene load failed: {reason}")]
    SceneLoad { reason: String },

    /// A texture reload requested by `resume` failed.
    #[error("texture reload failed: {reason}")]
    TextureReload { reason: String },

    /// Configuration rejected by validation.
    #[error("invalid value: {reason}")]
    InvalidValue { reason: String },

    /// Intentionally stubbed method. Reaching this in normal operation is a
    /// bug in the caller, not a runtime condition to handle.
    #[error("method not implemented: {method}")]
    NotImplemented { method: &'static str },
}
