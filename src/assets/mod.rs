//! Pose persistence
//!
//! - llsd: structured-data XML codec
//! - pose_file: pose document model and on-disk conventions
//! - pose_store: directory-backed pose library

pub mod llsd;
pub mod pose_file;
pub mod pose_store;

pub use llsd::{LlsdReader, LlsdValue};
pub use pose_file::{BoneRecord, PoseDocument, PoseHeader};
pub use pose_store::{LoadReport, PoseEntry, PoseStore, SaveMode};
