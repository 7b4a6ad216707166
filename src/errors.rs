//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`PoseError`] covers every failure mode of the
//! override layer, the pose library and the sequencer:
//! - Skeletons missing a joint the override motion binds to
//! - Pose file I/O failures (open, create, rename, delete)
//! - Malformed structured-data records
//! - Misuse of the sequencer or the override table
//!
//! Each variant belongs to one [`ErrorCategory`], which is what callers use
//! to decide whether a failure is fatal (initialization), recoverable and
//! logged (I/O, parse) or a caller bug (usage).
//!
//! # Usage
//!
//! ```rust,ignore
//! use poser::errors::{PoseError, Result};
//!
//! fn read_library() -> Result<()> {
//!     // Operations that may fail return Result
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Coarse classification of a [`PoseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The skeleton cannot host the override motion. Not retried.
    Initialization,
    /// A pose file could not be opened, created or removed.
    Io,
    /// A pose file or action list is not well-formed.
    Parse,
    /// The caller asked for something the current state does not allow.
    Usage,
}

/// The main error type for the pose engine.
#[derive(Error, Debug)]
pub enum PoseError {
    // ========================================================================
    // Initialization Errors
    // ========================================================================
    /// A joint required by the override motion is absent from the skeleton.
    #[error("Skeleton '{skeleton}' is missing required joint '{joint}'")]
    MissingJoint {
        /// Name of the missing joint
        joint: &'static str,
        /// Name of the skeleton that was being bound
        skeleton: String,
    },

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The named pose has no file in the pose directory.
    #[error("Pose not found: {0}")]
    PoseNotFound(String),

    // ========================================================================
    // Format & Parsing Errors
    // ========================================================================
    /// XML tokenizer error.
    #[error("XML error: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// Structurally valid XML that does not describe a pose.
    #[error("Pose parse error: {0}")]
    ParseError(String),

    /// JSON parsing error (settings, action lists).
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ========================================================================
    // Usage Errors
    // ========================================================================
    /// Pose names become file names and must not escape the pose directory.
    #[error("Invalid pose name: {0:?}")]
    InvalidPoseName(String),

    /// The action list cannot shrink while the sequencer is playing.
    #[error("Action list cannot be edited while playback is active")]
    PlaybackActive,

    /// Action index out of bounds.
    #[error("Action index out of bounds: {index} (len: {len})")]
    ActionIndexOutOfBounds {
        /// The invalid index
        index: usize,
        /// Length of the action list
        len: usize,
    },

    /// The joint name is not part of the override table.
    #[error("Unknown joint: {0}")]
    UnknownJoint(String),
}

impl PoseError {
    /// Returns the category this error belongs to.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingJoint { .. } => ErrorCategory::Initialization,
            Self::IoError(_) | Self::PoseNotFound(_) => ErrorCategory::Io,
            Self::XmlError(_) | Self::ParseError(_) | Self::JsonError(_) => ErrorCategory::Parse,
            Self::InvalidPoseName(_)
            | Self::PlaybackActive
            | Self::ActionIndexOutOfBounds { .. }
            | Self::UnknownJoint(_) => ErrorCategory::Usage,
        }
    }

    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }
}

/// Alias for `Result<T, PoseError>`.
pub type Result<T> = std::result::Result<T, PoseError>;
