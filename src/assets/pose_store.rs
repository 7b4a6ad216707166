use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::animation::{InterpolationType, JointOverrideMotion};
use crate::assets::pose_file::{
    BoneRecord, POSE_FILE_EXTENSION, PoseDocument, PoseHeader, read_header, rewrite_header,
};
use crate::errors::{PoseError, Result};

/// Library listing entry, taken from a pose file's header.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseEntry {
    pub name: String,
    pub interpolation: InterpolationType,
    pub time: f32,
}

/// What a save writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Header plus every bound joint of the motion.
    Full,
    /// Only the header of an existing file; bone records are kept as they are.
    HeaderOnly,
}

/// Outcome of applying a pose to an override motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    /// Bone records matched to a bound joint.
    pub applied: usize,
    /// Bone records naming joints this motion does not drive.
    pub skipped: usize,
}

/// Directory-backed pose library, one `<name>.xml` file per pose.
///
/// There is no index file and no cache; every listing rescans the directory.
#[derive(Debug, Clone)]
pub struct PoseStore {
    root: PathBuf,
}

impl PoseStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path of a pose. Fails for names that are empty or would leave the
    /// pose directory.
    pub fn pose_path(&self, name: &str) -> Result<PathBuf> {
        let invalid = name.is_empty()
            || name.starts_with('.')
            || name.contains(['/', '\\'])
            || name.contains('\0');
        if invalid {
            return Err(PoseError::InvalidPoseName(name.to_string()));
        }
        Ok(self.root.join(format!("{name}.{POSE_FILE_EXTENSION}")))
    }

    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.pose_path(name).is_ok_and(|path| path.is_file())
    }

    // ========================================================================
    // Save
    // ========================================================================

    /// Writes a pose.
    ///
    /// [`SaveMode::Full`] snapshots every bound joint of `motion`;
    /// [`SaveMode::HeaderOnly`] rewrites the header of the existing file and
    /// ignores `motion`. Spherical times are clamped to `[0.001, 1.0]`.
    /// The file is replaced in one rename, so a failed save leaves the old
    /// contents in place.
    pub fn save(
        &self,
        name: &str,
        interpolation: InterpolationType,
        time: f32,
        mode: SaveMode,
        motion: &JointOverrideMotion,
    ) -> Result<()> {
        let path = self.pose_path(name)?;
        let header = PoseHeader::new(interpolation, time);

        let bytes = match mode {
            SaveMode::Full => Self::snapshot(header, motion).to_bytes()?,
            SaveMode::HeaderOnly => {
                let existing = fs::read(&path).map_err(|err| not_found_as(err, name))?;
                rewrite_header(&existing, header)?
            }
        };

        fs::create_dir_all(&self.root)?;
        write_replacing(&path, &bytes)?;

        log::info!(
            "Saved pose '{name}' ({}, {:?} {:.3}s)",
            match mode {
                SaveMode::Full => "full",
                SaveMode::HeaderOnly => "header only",
            },
            header.interpolation,
            header.time
        );
        Ok(())
    }

    /// Builds the document a full save would write.
    #[must_use]
    pub fn snapshot(header: PoseHeader, motion: &JointOverrideMotion) -> PoseDocument {
        let bones = motion
            .slots()
            .map(|slot| BoneRecord {
                bone: slot.joint.name().to_string(),
                rotation: Some(slot.target.rotation),
                position: slot.joint.supports_position().then_some(slot.target.position),
                scale: Some(slot.target.scale),
                enabled: Some(slot.enabled),
            })
            .collect();
        PoseDocument { header, bones }
    }

    // ========================================================================
    // Load
    // ========================================================================

    /// Reads and parses a pose without applying it.
    pub fn read(&self, name: &str) -> Result<PoseDocument> {
        let path = self.pose_path(name)?;
        let bytes = fs::read(&path).map_err(|err| not_found_as(err, name))?;
        PoseDocument::parse(&bytes)
    }

    /// Loads a pose into `motion`.
    ///
    /// The whole file is parsed before anything is applied, so a malformed
    /// file leaves the motion untouched. On success the targets are updated
    /// and the slew towards them has started.
    pub fn load(&self, name: &str, motion: &mut JointOverrideMotion) -> Result<LoadReport> {
        let document = self.read(name)?;
        let report = Self::apply(&document, motion);
        log::info!(
            "Loaded pose '{name}': {} bones applied, {} skipped",
            report.applied,
            report.skipped
        );
        Ok(report)
    }

    /// Pushes a parsed pose into `motion` and starts the slew.
    pub fn apply(document: &PoseDocument, motion: &mut JointOverrideMotion) -> LoadReport {
        let mut report = LoadReport::default();

        motion.set_interpolation_type(document.header.interpolation);
        motion.set_interpolation_time(document.header.time);

        for record in &document.bones {
            let Ok(joint) = motion.resolve(&record.bone) else {
                log::debug!("Skipping unknown bone '{}'", record.bone);
                report.skipped += 1;
                continue;
            };

            if let Some(rotation) = record.rotation {
                motion.slew_target_rotation(joint, rotation);
            }
            if let Some(position) = record.position
                && joint.supports_position()
            {
                motion.slew_target_position(joint, position);
            }
            if let Some(scale) = record.scale {
                motion.set_target_scale(joint, scale);
            }

            if record.is_enabled() {
                motion.add_joint_to_state(joint);
            } else {
                motion.remove_joint_state(joint);
            }
            report.applied += 1;
        }

        motion.start_interpolation_timer();
        report
    }

    // ========================================================================
    // Delete & Enumerate
    // ========================================================================

    /// Removes a pose file. Failures are logged, never returned.
    /// Returns `true` if a file was removed.
    pub fn delete(&self, name: &str) -> bool {
        let path = match self.pose_path(name) {
            Ok(path) => path,
            Err(err) => {
                log::warn!("Cannot delete pose: {err}");
                return false;
            }
        };
        match fs::remove_file(&path) {
            Ok(()) => {
                log::info!("Deleted pose '{name}'");
                true
            }
            Err(err) => {
                log::warn!("Failed to delete pose '{}': {err}", path.display());
                false
            }
        }
    }

    /// Lists every readable pose, sorted by name.
    ///
    /// Files that cannot be opened or whose header does not parse are logged
    /// and skipped.
    #[must_use]
    pub fn enumerate(&self) -> Vec<PoseEntry> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                log::warn!("Cannot list poses in '{}': {err}", self.root.display());
                return Vec::new();
            }
        };

        let mut poses = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(err) => {
                    log::warn!("Skipping unreadable directory entry: {err}");
                    continue;
                }
            };
            if !path.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(POSE_FILE_EXTENSION)
            {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            let header = fs::read(&path)
                .map_err(PoseError::from)
                .and_then(|bytes| read_header(&bytes));
            match header {
                Ok(header) => poses.push(PoseEntry {
                    name: name.to_string(),
                    interpolation: header.interpolation,
                    time: header.time,
                }),
                Err(err) => log::warn!("Skipping pose file '{}': {err}", path.display()),
            }
        }

        poses.sort_by(|a, b| a.name.cmp(&b.name));
        poses
    }
}

fn not_found_as(err: std::io::Error, name: &str) -> PoseError {
    if err.kind() == ErrorKind::NotFound {
        PoseError::PoseNotFound(name.to_string())
    } else {
        PoseError::IoError(err)
    }
}

/// Writes to a sibling temporary file, then renames it over `path`.
fn write_replacing(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension(format!("{POSE_FILE_EXTENSION}.tmp"));
    if let Err(err) = fs::write(&tmp, bytes).and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }
    Ok(())
}
