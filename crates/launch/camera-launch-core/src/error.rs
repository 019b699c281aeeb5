//! Error types for camera launch commands.

use serde::{Deserialize, Serialize};

/// Every way a launch invocation can fail.
///
/// Numeric and kinematic degeneracies are absorbed by the solvers and never
/// show up here.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum LaunchError {
    /// No `-camera` flag and nothing camera-typed in the active selection.
    #[error("No camera specified and no camera in the active selection")]
    NoCamera,

    /// The camera name did not resolve to a scene node.
    #[error("Camera not found: {name}")]
    CameraNotFound { name: String },

    /// The name resolved, but not to a camera-typed node.
    #[error("Node '{name}' is not a camera")]
    NotACamera { name: String },

    #[error("Unknown flag: {flag}")]
    UnknownFlag { flag: String },

    #[error("Flag {flag} was given more than once")]
    DuplicateFlag { flag: String },

    #[error("Flag {flag} expects {expected} value(s)")]
    MissingFlagValue { flag: String, expected: usize },

    #[error("Invalid value for {flag}: {reason}")]
    InvalidFlagValue { flag: String, reason: String },

    #[error("Flags {first} and {second} cannot be combined")]
    ConflictingFlags { first: String, second: String },

    /// Baked mode would key more frames than the configured limit.
    #[error("Baking {frames} frames exceeds the limit of {limit}")]
    BakeTooLong { frames: i64, limit: i64 },

    /// The host has no channel with this id.
    #[error("Channel not found: {channel}")]
    ChannelNotFound { channel: String },

    #[error("Key {index} out of range for channel {channel} ({len} keys)")]
    KeyOutOfRange {
        channel: String,
        index: usize,
        len: usize,
    },

    /// Any other failure reported by the host collaborator.
    #[error("Host error: {reason}")]
    Host { reason: String },

    /// An operation was called from the wrong lifecycle state.
    #[error("Invalid command state: {current} -> {requested}")]
    InvalidState {
        current: String,
        requested: String,
    },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },
}

impl LaunchError {
    pub fn host(reason: impl Into<String>) -> Self {
        Self::Host {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_value(flag: &str, reason: impl Into<String>) -> Self {
        Self::InvalidFlagValue {
            flag: flag.to_string(),
            reason: reason.into(),
        }
    }

    /// Validation errors are raised before anything is mutated, so the caller
    /// can fix the input and try again.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        self.category() == "validation"
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::NoCamera
            | Self::CameraNotFound { .. }
            | Self::NotACamera { .. }
            | Self::UnknownFlag { .. }
            | Self::DuplicateFlag { .. }
            | Self::MissingFlagValue { .. }
            | Self::InvalidFlagValue { .. }
            | Self::ConflictingFlags { .. }
            | Self::BakeTooLong { .. } => "validation",
            Self::ChannelNotFound { .. } | Self::KeyOutOfRange { .. } | Self::Host { .. } => {
                "resource"
            }
            Self::InvalidState { .. } => "state",
            Self::Config { .. } => "config",
        }
    }
}

impl From<serde_json::Error> for LaunchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config {
            reason: err.to_string(),
        }
    }
}
