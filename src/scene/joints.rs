//! Overridable Joint Table
//!
//! The override motion works on a fixed, compile-time set of joints. Each
//! [`OverridableJoint`] variant carries the skeleton name it binds to, the
//! category UI lists group it under, and whether the joint accepts a position
//! override. The discriminant doubles as the index into per-joint tables such
//! as [`OverrideStore`](crate::animation::OverrideStore).
//!
//! Only the pelvis and the collision volumes accept positions; every other
//! joint takes rotation and scale only.

use serde::{Deserialize, Serialize};

/// Grouping used when presenting joints to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointCategory {
    Spine,
    Head,
    Arm,
    Leg,
    Finger,
    CollisionVolume,
}

macro_rules! overridable_joints {
    ($($variant:ident => $name:literal, $category:ident, $position:literal;)+) => {
        /// A joint the override motion can drive.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum OverridableJoint {
            $($variant,)+
        }

        impl OverridableJoint {
            /// Every joint, in index order.
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            /// Size of per-joint tables.
            pub const COUNT: usize = Self::ALL.len();

            /// Skeleton name of the joint.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }

            #[must_use]
            pub const fn category(self) -> JointCategory {
                match self {
                    $(Self::$variant => JointCategory::$category,)+
                }
            }

            /// Whether the joint accepts a position override.
            #[must_use]
            pub const fn supports_position(self) -> bool {
                match self {
                    $(Self::$variant => $position,)+
                }
            }

            /// Looks a joint up by its skeleton name.
            #[must_use]
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

overridable_joints! {
    Pelvis => "mPelvis", Spine, true;
    Torso => "mTorso", Spine, false;
    Chest => "mChest", Spine, false;
    Neck => "mNeck", Head, false;
    Head => "mHead", Head, false;

    CollarLeft => "mCollarLeft", Arm, false;
    ShoulderLeft => "mShoulderLeft", Arm, false;
    ElbowLeft => "mElbowLeft", Arm, false;
    WristLeft => "mWristLeft", Arm, false;
    CollarRight => "mCollarRight", Arm, false;
    ShoulderRight => "mShoulderRight", Arm, false;
    ElbowRight => "mElbowRight", Arm, false;
    WristRight => "mWristRight", Arm, false;

    HipLeft => "mHipLeft", Leg, false;
    KneeLeft => "mKneeLeft", Leg, false;
    AnkleLeft => "mAnkleLeft", Leg, false;
    HipRight => "mHipRight", Leg, false;
    KneeRight => "mKneeRight", Leg, false;
    AnkleRight => "mAnkleRight", Leg, false;

    HandThumb1Left => "mHandThumb1Left", Finger, false;
    HandThumb2Left => "mHandThumb2Left", Finger, false;
    HandThumb3Left => "mHandThumb3Left", Finger, false;
    HandIndex1Left => "mHandIndex1Left", Finger, false;
    HandIndex2Left => "mHandIndex2Left", Finger, false;
    HandIndex3Left => "mHandIndex3Left", Finger, false;
    HandMiddle1Left => "mHandMiddle1Left", Finger, false;
    HandMiddle2Left => "mHandMiddle2Left", Finger, false;
    HandMiddle3Left => "mHandMiddle3Left", Finger, false;
    HandRing1Left => "mHandRing1Left", Finger, false;
    HandRing2Left => "mHandRing2Left", Finger, false;
    HandRing3Left => "mHandRing3Left", Finger, false;
    HandPinky1Left => "mHandPinky1Left", Finger, false;
    HandPinky2Left => "mHandPinky2Left", Finger, false;
    HandPinky3Left => "mHandPinky3Left", Finger, false;
    HandThumb1Right => "mHandThumb1Right", Finger, false;
    HandThumb2Right => "mHandThumb2Right", Finger, false;
    HandThumb3Right => "mHandThumb3Right", Finger, false;
    HandIndex1Right => "mHandIndex1Right", Finger, false;
    HandIndex2Right => "mHandIndex2Right", Finger, false;
    HandIndex3Right => "mHandIndex3Right", Finger, false;
    HandMiddle1Right => "mHandMiddle1Right", Finger, false;
    HandMiddle2Right => "mHandMiddle2Right", Finger, false;
    HandMiddle3Right => "mHandMiddle3Right", Finger, false;
    HandRing1Right => "mHandRing1Right", Finger, false;
    HandRing2Right => "mHandRing2Right", Finger, false;
    HandRing3Right => "mHandRing3Right", Finger, false;
    HandPinky1Right => "mHandPinky1Right", Finger, false;
    HandPinky2Right => "mHandPinky2Right", Finger, false;
    HandPinky3Right => "mHandPinky3Right", Finger, false;

    PelvisVolume => "PELVIS", CollisionVolume, true;
    BellyVolume => "BELLY", CollisionVolume, true;
    ChestVolume => "CHEST", CollisionVolume, true;
    LeftPecVolume => "LEFT_PEC", CollisionVolume, true;
    RightPecVolume => "RIGHT_PEC", CollisionVolume, true;
    ButtVolume => "BUTT", CollisionVolume, true;
    UpperBackVolume => "UPPER_BACK", CollisionVolume, true;
    LowerBackVolume => "LOWER_BACK", CollisionVolume, true;
    NeckVolume => "NECK", CollisionVolume, true;
    HeadVolume => "HEAD", CollisionVolume, true;
}

impl OverridableJoint {
    /// Index into per-joint tables.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// The fixed list of joints an override motion binds at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointSet {
    /// Spine, head, limbs and collision volumes.
    #[default]
    Body,
    /// [`Body`](Self::Body) plus the three finger segments of each hand.
    BodyAndFingers,
}

impl JointSet {
    #[must_use]
    pub fn contains(self, joint: OverridableJoint) -> bool {
        match self {
            Self::Body => joint.category() != JointCategory::Finger,
            Self::BodyAndFingers => true,
        }
    }

    /// Joints of this set, in index order.
    pub fn joints(self) -> impl Iterator<Item = OverridableJoint> {
        OverridableJoint::ALL
            .iter()
            .copied()
            .filter(move |&joint| self.contains(joint))
    }
}
