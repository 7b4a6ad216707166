//! Poser Settings
//!
//! Per-character configuration of the override layer and the pose library.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use poser::{PoserSettings, scene::JointSet};
//!
//! // Default: body joints, poses under ./poses
//! let settings = PoserSettings::default();
//!
//! // Finger joints too, with a longer release
//! let settings = PoserSettings {
//!     joint_set: JointSet::BodyAndFingers,
//!     ease_out_duration: 1.0,
//!     ..Default::default()
//! };
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::animation::{DEFAULT_EASE_OUT_DURATION, InterpolationType};
use crate::errors::Result;
use crate::scene::JointSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoserSettings {
    /// Directory holding one `<name>.xml` file per pose. Created on first save.
    pub pose_dir: PathBuf,

    /// Joints the override motion binds at initialization. Every joint of the
    /// set must exist in the skeleton.
    pub joint_set: JointSet,

    /// Seconds the override takes to fade out after the motion is stopped.
    pub ease_out_duration: f32,

    /// Blend curve written by [`Poser::save_current_pose`](crate::Poser::save_current_pose).
    pub default_interpolation: InterpolationType,

    /// Blend time written alongside
    /// [`default_interpolation`](Self::default_interpolation).
    pub default_interpolation_time: f32,
}

impl Default for PoserSettings {
    fn default() -> Self {
        Self {
            pose_dir: PathBuf::from("poses"),
            joint_set: JointSet::Body,
            ease_out_duration: DEFAULT_EASE_OUT_DURATION,
            default_interpolation: InterpolationType::Linear,
            default_interpolation_time: 0.5,
        }
    }
}

impl PoserSettings {
    /// Reads settings from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let settings: PoserSettings =
            serde_json::from_str(r#"{ "joint_set": "body_and_fingers" }"#).unwrap();
        assert_eq!(settings.joint_set, JointSet::BodyAndFingers);
        assert_eq!(settings.pose_dir, PathBuf::from("poses"));
        assert_eq!(settings.ease_out_duration, DEFAULT_EASE_OUT_DURATION);
    }

    #[test]
    fn json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poser.json");
        let settings = PoserSettings {
            pose_dir: dir.path().join("library"),
            default_interpolation: InterpolationType::Spherical,
            default_interpolation_time: 0.2,
            ..Default::default()
        };
        settings.to_json_file(&path).unwrap();
        assert_eq!(PoserSettings::from_json_file(&path).unwrap(), settings);
    }
}
