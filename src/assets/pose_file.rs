//! Pose file model
//!
//! A pose file is a stream of structured-data records. Record 0 is the header
//! (`type`, `time`); every following record describes one bone:
//!
//! | key        | value                                   | required |
//! |------------|-----------------------------------------|----------|
//! | `bone`     | joint name                              | yes      |
//! | `rotation` | Euler angles, radians, stored `[x, z, y]` | no     |
//! | `position` | `[x, y, z]`                             | no       |
//! | `scale`    | `[x, y, z]`                             | no       |
//! | `enabled`  | boolean, absent means enabled           | no       |
//!
//! The rotation triple keeps the Y and Z angles swapped relative to the
//! engine's XYZ Euler order. Existing pose libraries depend on it.

use glam::{EulerRot, Quat, Vec3};

use crate::animation::InterpolationType;
use crate::assets::llsd::{LlsdReader, LlsdValue, write_stream};
use crate::errors::{PoseError, Result};

pub const POSE_FILE_EXTENSION: &str = "xml";

const KEY_TYPE: &str = "type";
const KEY_TIME: &str = "time";
const KEY_BONE: &str = "bone";
const KEY_ROTATION: &str = "rotation";
const KEY_POSITION: &str = "position";
const KEY_SCALE: &str = "scale";
const KEY_ENABLED: &str = "enabled";

/// Blend metadata stored in record 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseHeader {
    pub interpolation: InterpolationType,
    pub time: f32,
}

impl PoseHeader {
    /// Builds a header, clamping `time` to the range `interpolation` accepts.
    #[must_use]
    pub fn new(interpolation: InterpolationType, time: f32) -> Self {
        Self {
            interpolation,
            time: interpolation.clamp_time(time),
        }
    }

    fn write_into(&self, record: &mut LlsdValue) {
        record.insert(KEY_TYPE, self.interpolation.code());
        record.insert(KEY_TIME, self.time);
    }

    fn from_record(record: &LlsdValue) -> Result<Self> {
        if record.as_map().is_none() {
            return Err(PoseError::parse("header record is not a map"));
        }

        let interpolation = match record.get(KEY_TYPE) {
            None => InterpolationType::None,
            Some(value) => {
                let code = value
                    .as_integer()
                    .ok_or_else(|| PoseError::parse("header 'type' is not a number"))?;
                InterpolationType::from_code(code)
                    .ok_or_else(|| PoseError::parse(format!("unknown interpolation type {code}")))?
            }
        };

        let time = match record.get(KEY_TIME) {
            None => 0.0,
            Some(value) => value
                .as_real()
                .ok_or_else(|| PoseError::parse("header 'time' is not a number"))?
                as f32,
        };

        Ok(Self {
            interpolation,
            time,
        })
    }
}

impl Default for PoseHeader {
    fn default() -> Self {
        Self::new(InterpolationType::None, 0.0)
    }
}

/// One bone record. Absent fields leave the joint untouched on load.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneRecord {
    pub bone: String,
    pub rotation: Option<Quat>,
    pub position: Option<Vec3>,
    pub scale: Option<Vec3>,
    pub enabled: Option<bool>,
}

impl BoneRecord {
    #[must_use]
    pub fn new(bone: impl Into<String>) -> Self {
        Self {
            bone: bone.into(),
            rotation: None,
            position: None,
            scale: None,
            enabled: None,
        }
    }

    /// Enabled state to apply; records written before the flag existed
    /// count as enabled.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    fn to_record(&self) -> LlsdValue {
        let mut record = LlsdValue::map();
        record.insert(KEY_BONE, self.bone.as_str());
        if let Some(rotation) = self.rotation {
            record.insert(KEY_ROTATION, triple(rotation_to_disk(rotation)));
        }
        if let Some(position) = self.position {
            record.insert(KEY_POSITION, triple(position.to_array()));
        }
        if let Some(scale) = self.scale {
            record.insert(KEY_SCALE, triple(scale.to_array()));
        }
        if let Some(enabled) = self.enabled {
            record.insert(KEY_ENABLED, enabled);
        }
        record
    }

    fn from_record(record: &LlsdValue) -> Result<Self> {
        let bone = record
            .get(KEY_BONE)
            .and_then(LlsdValue::as_str)
            .ok_or_else(|| PoseError::parse("bone record without a 'bone' name"))?;

        let field = |key: &str| -> Result<Option<[f32; 3]>> {
            record
                .get(key)
                .map(|value| {
                    read_triple(value)
                        .ok_or_else(|| PoseError::parse(format!("'{key}' of '{bone}' is not three numbers")))
                })
                .transpose()
        };

        let enabled = record
            .get(KEY_ENABLED)
            .map(|value| {
                value
                    .as_bool()
                    .ok_or_else(|| PoseError::parse(format!("'enabled' of '{bone}' is not a boolean")))
            })
            .transpose()?;

        Ok(Self {
            bone: bone.to_string(),
            rotation: field(KEY_ROTATION)?.map(rotation_from_disk),
            position: field(KEY_POSITION)?.map(Vec3::from_array),
            scale: field(KEY_SCALE)?.map(Vec3::from_array),
            enabled,
        })
    }
}

/// A fully parsed pose file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PoseDocument {
    pub header: PoseHeader,
    pub bones: Vec<BoneRecord>,
}

impl PoseDocument {
    /// Parses a whole pose file. Nothing is returned unless every record
    /// parses; a truncated trailing record simply ends the stream.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let records = LlsdReader::new(bytes).read_all()?;
        let (header, bones) = records
            .split_first()
            .ok_or_else(|| PoseError::parse("pose file has no header record"))?;

        Ok(Self {
            header: PoseHeader::from_record(header)?,
            bones: bones
                .iter()
                .map(BoneRecord::from_record)
                .collect::<Result<Vec<_>>>()?,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut header = LlsdValue::map();
        self.header.write_into(&mut header);

        let mut records = Vec::with_capacity(self.bones.len() + 1);
        records.push(header);
        records.extend(self.bones.iter().map(BoneRecord::to_record));
        write_stream(&records)
    }

    #[must_use]
    pub fn bone(&self, name: &str) -> Option<&BoneRecord> {
        self.bones.iter().find(|record| record.bone == name)
    }
}

/// Reads only the header record.
pub fn read_header(bytes: &[u8]) -> Result<PoseHeader> {
    let record = LlsdReader::new(bytes)
        .next_document()?
        .ok_or_else(|| PoseError::parse("pose file has no header record"))?;
    PoseHeader::from_record(&record)
}

/// Replaces the header fields of an encoded pose and re-encodes it.
///
/// Bone records are carried over as raw structured data, so keys this crate
/// does not know about survive the edit.
pub fn rewrite_header(bytes: &[u8], header: PoseHeader) -> Result<Vec<u8>> {
    let mut records = LlsdReader::new(bytes).read_all()?;
    let first = records
        .first_mut()
        .ok_or_else(|| PoseError::parse("pose file has no header record"))?;
    if first.as_map().is_none() {
        return Err(PoseError::parse("header record is not a map"));
    }
    header.write_into(first);
    write_stream(&records)
}

/// Engine rotation to the on-disk `[x, z, y]` Euler triple.
#[must_use]
pub fn rotation_to_disk(rotation: Quat) -> [f32; 3] {
    let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
    [x, z, y]
}

/// On-disk `[x, z, y]` Euler triple to an engine rotation.
#[must_use]
pub fn rotation_from_disk(disk: [f32; 3]) -> Quat {
    let [x, z, y] = disk;
    Quat::from_euler(EulerRot::XYZ, x, y, z)
}

fn triple(values: [f32; 3]) -> LlsdValue {
    LlsdValue::Array(values.iter().map(|v| LlsdValue::from(*v)).collect())
}

fn read_triple(value: &LlsdValue) -> Option<[f32; 3]> {
    match value.as_array()? {
        [x, y, z] => Some([x.as_real()? as f32, y.as_real()? as f32, z.as_real()? as f32]),
        _ => None,
    }
}
