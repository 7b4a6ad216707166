//! Pose Store Tests
//!
//! Tests for:
//! - Full save and load through an override motion
//! - Header-only edits leaving bone records untouched
//! - All-or-nothing loads
//! - Enumeration over a directory with broken files
//! - Delete and pose name validation

use std::fs;

use glam::{Quat, Vec3};
use tempfile::TempDir;

use poser::animation::{InterpolationType, JointOverrideMotion, Motion};
use poser::assets::{PoseDocument, PoseStore, SaveMode};
use poser::errors::{ErrorCategory, PoseError};
use poser::scene::{JointSet, OverridableJoint, Skeleton};

const EPSILON: f32 = 1e-4;

fn same_rotation(a: Quat, b: Quat) -> bool {
    a.abs_diff_eq(b, EPSILON) || a.abs_diff_eq(-b, EPSILON)
}

fn bound_motion() -> JointOverrideMotion {
    let skeleton = Skeleton::avatar("avatar", JointSet::Body);
    let mut motion = JointOverrideMotion::new(JointSet::Body);
    motion.on_initialize(&skeleton).unwrap();
    motion
}

fn posed_motion() -> JointOverrideMotion {
    let mut motion = bound_motion();
    motion.set_target_rotation(OverridableJoint::Head, Quat::from_rotation_y(0.6));
    motion.set_target_rotation(OverridableJoint::ElbowLeft, Quat::from_rotation_z(-0.9));
    motion.set_target_position(OverridableJoint::Pelvis, Vec3::new(0.0, 0.2, 0.1));
    motion.set_target_scale(OverridableJoint::ChestVolume, Vec3::new(1.1, 1.0, 1.1));
    motion.add_joint_to_state(OverridableJoint::Head);
    motion.add_joint_to_state(OverridableJoint::Pelvis);
    motion
}

fn store() -> (TempDir, PoseStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = PoseStore::new(dir.path().join("poses"));
    (dir, store)
}

// ============================================================================
// Save & Load
// ============================================================================

#[test]
fn full_save_then_load_restores_targets() {
    let (_dir, store) = store();
    let source = posed_motion();
    store
        .save("wave", InterpolationType::None, 0.0, SaveMode::Full, &source)
        .unwrap();
    assert!(store.exists("wave"));

    let mut target = bound_motion();
    let report = store.load("wave", &mut target).unwrap();
    assert_eq!(report.skipped, 0);
    assert_eq!(report.applied, source.slots().count());

    for joint in [OverridableJoint::Head, OverridableJoint::ElbowLeft] {
        assert!(same_rotation(
            target.target(joint).unwrap().rotation,
            source.target(joint).unwrap().rotation
        ));
    }
    let pelvis = target.target(OverridableJoint::Pelvis).unwrap();
    assert!((pelvis.position - Vec3::new(0.0, 0.2, 0.1)).length() < EPSILON);
    let chest = target.target(OverridableJoint::ChestVolume).unwrap();
    assert!((chest.scale - Vec3::new(1.1, 1.0, 1.1)).length() < EPSILON);

    assert!(target.is_enabled(OverridableJoint::Head));
    assert!(target.is_enabled(OverridableJoint::Pelvis));
    assert!(!target.is_enabled(OverridableJoint::ElbowLeft));

    // Interpolation None snaps the written values at once.
    let current = target.current_rotation(OverridableJoint::Head).unwrap();
    assert!(same_rotation(current, Quat::from_rotation_y(0.6)));
}

#[test]
fn load_applies_header_to_motion() {
    let (_dir, store) = store();
    store
        .save("slow", InterpolationType::Linear, 2.0, SaveMode::Full, &posed_motion())
        .unwrap();

    let mut motion = bound_motion();
    store.load("slow", &mut motion).unwrap();
    assert_eq!(motion.interpolation_type(), InterpolationType::Linear);
    assert!((motion.interpolation_time() - 2.0).abs() < EPSILON);
    assert!(motion.is_interpolating());
}

#[test]
fn spherical_time_is_clamped_on_save() {
    let (_dir, store) = store();
    store
        .save("soft", InterpolationType::Spherical, 3.0, SaveMode::Full, &bound_motion())
        .unwrap();
    let pose = store.read("soft").unwrap();
    assert_eq!(pose.header.interpolation, InterpolationType::Spherical);
    assert_eq!(pose.header.time, 1.0);
}

#[test]
fn position_only_written_for_position_joints() {
    let (_dir, store) = store();
    store
        .save("p", InterpolationType::None, 0.0, SaveMode::Full, &posed_motion())
        .unwrap();
    let pose = store.read("p").unwrap();
    assert!(pose.bone("mPelvis").unwrap().position.is_some());
    assert!(pose.bone("mHead").unwrap().position.is_none());
    assert!(pose.bone("mHandThumb1Left").is_none());
}

#[test]
fn malformed_file_leaves_motion_untouched() {
    let (_dir, store) = store();
    fs::create_dir_all(store.root()).unwrap();
    let broken = concat!(
        "<llsd><map><key>type</key><integer>0</integer></map></llsd>\n",
        "<llsd><map><key>bone</key><string>mHead</string>",
        "<key>rotation</key><array><real>1</real><real>1</real><real>1</real></array></map></llsd>\n",
        "<llsd><map><key>bone</key><string>mNeck</string>",
        "<key>enabled</key><string>sometimes</string></map></llsd>\n",
    );
    fs::write(store.root().join("broken.xml"), broken).unwrap();

    let mut motion = bound_motion();
    let err = store.load("broken", &mut motion).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Parse);
    assert_eq!(motion.target(OverridableJoint::Head).unwrap().rotation, Quat::IDENTITY);
    assert!(!motion.is_enabled(OverridableJoint::Head));
}

#[test]
fn unknown_bones_are_skipped() {
    let (_dir, store) = store();
    fs::create_dir_all(store.root()).unwrap();
    let pose = concat!(
        "<llsd><map><key>type</key><integer>0</integer></map></llsd>\n",
        "<llsd><map><key>bone</key><string>mTail1</string></map></llsd>\n",
        "<llsd><map><key>bone</key><string>mHead</string></map></llsd>\n",
    );
    fs::write(store.root().join("tail.xml"), pose).unwrap();

    let mut motion = bound_motion();
    let report = store.load("tail", &mut motion).unwrap();
    assert_eq!(report.applied, 1);
    assert_eq!(report.skipped, 1);
    assert!(motion.is_enabled(OverridableJoint::Head));
}

#[test]
fn load_leaves_unlisted_joints_alone() {
    let (_dir, store) = store();
    fs::create_dir_all(store.root()).unwrap();
    let neck_rotation = Quat::from_rotation_x(0.35);

    for (code, time) in [(0, 0.0), (1, 0.5), (2, 0.5)] {
        let pose = format!(
            concat!(
                "<llsd><map><key>type</key><integer>{}</integer>",
                "<key>time</key><real>{}</real></map></llsd>\n",
                "<llsd><map><key>bone</key><string>mHead</string>",
                "<key>rotation</key><array><real>0</real><real>0</real><real>0.4</real></array>",
                "<key>enabled</key><boolean>1</boolean></map></llsd>\n",
            ),
            code, time
        );
        fs::write(store.root().join("head_only.xml"), pose).unwrap();

        let mut skeleton = Skeleton::avatar("avatar", JointSet::Body);
        let mut motion = bound_motion();
        motion.set_target_rotation(OverridableJoint::Neck, neck_rotation);
        motion.add_joint_to_state(OverridableJoint::Neck);
        assert!(motion.on_activate());

        let report = store.load("head_only", &mut motion).unwrap();
        assert_eq!(report.applied, 1);
        for step in 1..=20 {
            motion.on_update(step as f32 * 0.1, &mut skeleton);
        }

        let neck = motion.target(OverridableJoint::Neck).unwrap();
        assert!(same_rotation(neck.rotation, neck_rotation), "type {code}");
        let current = motion.current_rotation(OverridableJoint::Neck).unwrap();
        assert!(same_rotation(current, neck_rotation), "type {code}");
        assert!(motion.is_enabled(OverridableJoint::Neck), "type {code}");

        assert!(motion.is_enabled(OverridableJoint::Head));
        let head = motion.current_rotation(OverridableJoint::Head).unwrap();
        assert!(!same_rotation(head, Quat::IDENTITY), "type {code}");
    }
}

#[test]
fn missing_pose_is_not_found() {
    let (_dir, store) = store();
    let mut motion = bound_motion();
    let err = store.load("ghost", &mut motion).unwrap_err();
    assert!(matches!(err, PoseError::PoseNotFound(name) if name == "ghost"));
}

// ============================================================================
// Header-only Edits
// ============================================================================

#[test]
fn header_only_save_keeps_bone_records() {
    let (_dir, store) = store();
    store
        .save("edit", InterpolationType::Linear, 0.5, SaveMode::Full, &posed_motion())
        .unwrap();
    let before = store.read("edit").unwrap();

    // A different motion must not leak into the file.
    store
        .save("edit", InterpolationType::Spherical, 0.2, SaveMode::HeaderOnly, &bound_motion())
        .unwrap();
    let after = store.read("edit").unwrap();

    assert_eq!(after.header.interpolation, InterpolationType::Spherical);
    assert!((after.header.time - 0.2).abs() < EPSILON);
    assert_eq!(after.bones, before.bones);
}

#[test]
fn header_only_save_needs_existing_pose() {
    let (_dir, store) = store();
    let err = store
        .save("nope", InterpolationType::Linear, 1.0, SaveMode::HeaderOnly, &bound_motion())
        .unwrap_err();
    assert!(matches!(err, PoseError::PoseNotFound(_)));
    assert!(!store.exists("nope"));
}

#[test]
fn header_only_save_is_byte_stable_for_same_header() -> anyhow::Result<()> {
    let (_dir, store) = store();
    let motion = posed_motion();
    store.save("same", InterpolationType::Linear, 0.5, SaveMode::Full, &motion)?;
    let path = store.pose_path("same")?;
    let before = fs::read(&path)?;

    store.save("same", InterpolationType::Linear, 0.5, SaveMode::HeaderOnly, &motion)?;
    assert_eq!(fs::read(&path)?, before);
    Ok(())
}

// ============================================================================
// Enumerate & Delete
// ============================================================================

#[test]
fn enumerate_skips_broken_files_and_sorts() {
    let (_dir, store) = store();
    let motion = bound_motion();
    store
        .save("b_pose", InterpolationType::Linear, 0.5, SaveMode::Full, &motion)
        .unwrap();
    store
        .save("a_pose", InterpolationType::Spherical, 0.1, SaveMode::Full, &motion)
        .unwrap();
    fs::write(store.root().join("junk.xml"), b"not a pose").unwrap();
    fs::write(store.root().join("notes.txt"), b"ignored").unwrap();
    fs::create_dir(store.root().join("nested.xml")).unwrap();

    let poses = store.enumerate();
    let names: Vec<_> = poses.iter().map(|entry| entry.name.as_str()).collect();
    assert_eq!(names, ["a_pose", "b_pose"]);
    assert_eq!(poses[0].interpolation, InterpolationType::Spherical);
    assert!((poses[0].time - 0.1).abs() < EPSILON);
}

#[test]
fn enumerate_missing_directory_is_empty() {
    let (_dir, store) = store();
    assert!(store.enumerate().is_empty());
}

#[test]
fn delete_removes_file() {
    let (_dir, store) = store();
    store
        .save("gone", InterpolationType::None, 0.0, SaveMode::Full, &bound_motion())
        .unwrap();
    assert!(store.delete("gone"));
    assert!(!store.exists("gone"));
    assert!(!store.delete("gone"));
    assert!(store.enumerate().is_empty());
}

#[test]
fn save_leaves_no_temporary_files() {
    let (_dir, store) = store();
    store
        .save("clean", InterpolationType::None, 0.0, SaveMode::Full, &bound_motion())
        .unwrap();
    let files: Vec<_> = fs::read_dir(store.root())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(files, ["clean.xml"]);
}

#[test]
fn invalid_names_are_rejected() {
    let (_dir, store) = store();
    let motion = bound_motion();
    for name in ["", ".hidden", "../escape", "a/b", "a\\b"] {
        let err = store
            .save(name, InterpolationType::None, 0.0, SaveMode::Full, &motion)
            .unwrap_err();
        assert!(matches!(err, PoseError::InvalidPoseName(_)), "{name:?}");
    }
}

#[test]
fn snapshot_matches_saved_document() {
    let (_dir, store) = store();
    let motion = posed_motion();
    store
        .save("snap", InterpolationType::Linear, 1.0, SaveMode::Full, &motion)
        .unwrap();

    let saved = store.read("snap").unwrap();
    let snapshot: PoseDocument = PoseStore::snapshot(saved.header, &motion);
    assert_eq!(saved.bones.len(), snapshot.bones.len());
    assert_eq!(saved.header, snapshot.header);
}
