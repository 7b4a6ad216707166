//! Poser Facade Tests
//!
//! Tests for:
//! - Construction against complete and incomplete skeletons
//! - Joint edits by name, as a UI would issue them
//! - Pose library round trips through the facade
//! - Sequencer playback driven by `update`

use std::f32::consts::FRAC_PI_4;

use glam::{EulerRot, Quat, Vec3};
use tempfile::TempDir;

use poser::animation::ActionExecuted;
use poser::scene::{JointSet, Skeleton};
use poser::{Action, InterpolationType, OverridableJoint, Poser, PoserSettings};

const EPSILON: f32 = 1e-4;

fn same_rotation(a: Quat, b: Quat) -> bool {
    a.abs_diff_eq(b, EPSILON) || a.abs_diff_eq(-b, EPSILON)
}

fn setup() -> (TempDir, Poser, Skeleton) {
    let _ = env_logger::builder().is_test(true).try_init();

    let dir = tempfile::tempdir().unwrap();
    let settings = PoserSettings {
        pose_dir: dir.path().join("poses"),
        ..Default::default()
    };
    let skeleton = Skeleton::avatar("avatar", JointSet::Body);
    let mut poser = Poser::new(settings, &skeleton).unwrap();
    assert!(poser.start_overrides());
    (dir, poser, skeleton)
}

#[test]
fn construction_fails_without_required_joints() {
    let mut skeleton = Skeleton::new("stick");
    skeleton.add_joint("mPelvis", true);
    assert!(Poser::new(PoserSettings::default(), &skeleton).is_err());
}

#[test]
fn finger_settings_need_finger_joints() {
    let settings = PoserSettings {
        joint_set: JointSet::BodyAndFingers,
        ..Default::default()
    };
    let body_only = Skeleton::avatar("avatar", JointSet::Body);
    assert!(Poser::new(settings.clone(), &body_only).is_err());

    let full = Skeleton::avatar("avatar", JointSet::BodyAndFingers);
    assert!(Poser::new(settings, &full).is_ok());
}

#[test]
fn joint_edits_by_name_reach_the_skeleton() {
    let (_dir, mut poser, mut skeleton) = setup();

    let euler = Vec3::new(0.2, FRAC_PI_4, -0.1);
    assert!(poser.set_joint_target_rotation("mHead", euler));
    assert!(poser.set_joint_override_enabled("mHead", true));
    assert!(poser.set_joint_target_position("mPelvis", Vec3::new(0.0, 0.3, 0.0)));
    assert!(poser.set_joint_override_enabled("mPelvis", true));

    poser.update(1.0 / 60.0, &mut skeleton);

    let expected = Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z);
    let head = skeleton.joint("mHead").unwrap();
    assert!(same_rotation(head.transform.rotation, expected));
    let pelvis = skeleton.joint("mPelvis").unwrap();
    assert!((pelvis.transform.position - Vec3::new(0.0, 0.3, 0.0)).length() < EPSILON);

    let readback = poser.joint_target_rotation("mHead").unwrap();
    assert!((readback - euler).length() < EPSILON);
}

#[test]
fn unknown_joint_names_fail_softly() {
    let (_dir, mut poser, _) = setup();
    assert!(!poser.set_joint_override_enabled("mTail1", true));
    assert!(!poser.set_joint_target_rotation("mHandThumb1Left", Vec3::ZERO));
    assert!(!poser.set_joint_target_position("mHead", Vec3::X));
    assert!(poser.joint_target_rotation("mTail1").is_none());
}

#[test]
fn save_enumerate_load_delete() {
    let (_dir, mut poser, _) = setup();
    poser.set_joint_target_rotation("mNeck", Vec3::new(0.0, 0.0, 0.4));
    poser.set_joint_override_enabled("mNeck", true);

    assert!(poser.save_pose("nod", InterpolationType::Linear, 0.25, false));
    assert!(poser.save_current_pose("idle"));

    let names: Vec<_> = poser
        .enumerate_poses()
        .into_iter()
        .map(|entry| entry.name)
        .collect();
    assert_eq!(names, ["idle", "nod"]);

    poser.motion_mut().reset_all();
    poser.set_joint_override_enabled("mNeck", false);
    assert!(poser.load_pose("nod"));
    assert!(poser.motion().is_enabled(OverridableJoint::Neck));
    let neck = poser.motion().target(OverridableJoint::Neck).unwrap().rotation;
    assert!(same_rotation(neck, Quat::from_rotation_z(0.4)));

    assert!(poser.delete_pose("nod"));
    assert!(!poser.load_pose("nod"));
    assert_eq!(poser.enumerate_poses().len(), 1);
}

#[test]
fn editing_save_only_changes_header() {
    let (_dir, mut poser, _) = setup();
    assert!(!poser.save_pose("fresh", InterpolationType::Linear, 1.0, true));

    assert!(poser.save_pose("fresh", InterpolationType::Linear, 1.0, false));
    assert!(poser.save_pose("fresh", InterpolationType::Spherical, 9.0, true));

    let entry = &poser.enumerate_poses()[0];
    assert_eq!(entry.interpolation, InterpolationType::Spherical);
    assert_eq!(entry.time, 1.0);
}

#[test]
fn update_drives_sequencer() {
    let (_dir, mut poser, mut skeleton) = setup();
    poser.set_joint_target_rotation("mChest", Vec3::new(0.3, 0.0, 0.0));
    poser.set_joint_override_enabled("mChest", true);
    assert!(poser.save_pose("lean", InterpolationType::None, 0.0, false));
    poser.motion_mut().reset_all();

    poser.insert_action(Action::pose("lean"), 0);
    poser.insert_action(Action::wait(1.0), 1);
    poser.start_playback();
    assert!(poser.is_playing());
    assert!(!poser.remove_action(0));
    assert!(!poser.clear_actions());

    let executed = poser.update(0.1, &mut skeleton);
    assert_eq!(
        executed,
        Some(ActionExecuted::PoseApplied {
            name: "lean".to_string(),
            loaded: true,
        })
    );
    let chest = skeleton.joint("mChest").unwrap().transform.rotation;
    assert!(same_rotation(chest, Quat::from_rotation_x(0.3)));

    poser.stop_playback();
    assert!(poser.remove_action(0));
    assert!(poser.clear_actions());
    assert!(poser.sequencer().actions().is_empty());
}

#[test]
fn stopped_overrides_release_the_skeleton() {
    let (_dir, mut poser, mut skeleton) = setup();
    poser.set_joint_target_rotation("mHead", Vec3::new(0.0, 0.5, 0.0));
    poser.set_joint_override_enabled("mHead", true);
    poser.update(0.1, &mut skeleton);
    assert!(poser.overrides_active());

    poser.stop_overrides();
    let ease_out = poser.settings().ease_out_duration;
    poser.update(ease_out + 0.1, &mut skeleton);
    assert!(!poser.overrides_active());

    // Restarting shows the kept values again.
    skeleton.reset_pose();
    assert!(poser.start_overrides());
    poser.update(0.1, &mut skeleton);
    let head = skeleton.joint("mHead").unwrap().transform.rotation;
    assert!(same_rotation(head, Quat::from_rotation_y(0.5)));
}
