use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Curve used when slewing from the current override values to new targets.
///
/// The numeric codes are what pose file headers store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationType {
    /// Snap straight to the target.
    None,
    /// Blend over `time` seconds.
    #[default]
    Linear,
    /// Slerp towards the target by a fixed factor every tick.
    Spherical,
}

impl InterpolationType {
    pub const MIN_SPHERICAL_TIME: f32 = 0.001;
    pub const MAX_SPHERICAL_TIME: f32 = 1.0;

    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::None => 0,
            Self::Linear => 1,
            Self::Spherical => 2,
        }
    }

    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Linear),
            2 => Some(Self::Spherical),
            _ => None,
        }
    }

    /// Brings `time` into the range this curve accepts.
    ///
    /// Spherical time is a slerp factor and must stay within `[0.001, 1.0]`.
    /// The other curves only reject negative values.
    #[must_use]
    pub fn clamp_time(self, time: f32) -> f32 {
        match self {
            Self::Spherical => time.clamp(Self::MIN_SPHERICAL_TIME, Self::MAX_SPHERICAL_TIME),
            Self::None | Self::Linear => time.max(0.0),
        }
    }
}

pub trait Interpolatable: Copy + Sized {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self;

    fn interpolate_spherical(start: Self, end: Self, t: f32) -> Self;

    /// Distance metric used to decide when a slew has converged.
    fn distance(a: Self, b: Self) -> f32;

    fn interpolate(start: Self, end: Self, t: f32, mode: InterpolationType) -> Self {
        match mode {
            InterpolationType::None => end,
            InterpolationType::Linear => Self::interpolate_linear(start, end, t),
            InterpolationType::Spherical => Self::interpolate_spherical(start, end, t),
        }
    }
}

impl Interpolatable for Vec3 {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start.lerp(end, t)
    }

    fn interpolate_spherical(start: Self, end: Self, t: f32) -> Self {
        // Positions have no sphere to travel on.
        start.lerp(end, t)
    }

    fn distance(a: Self, b: Self) -> f32 {
        a.distance(b)
    }
}

impl Interpolatable for Quat {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        // Normalized lerp, shortest path.
        start.lerp(end, t)
    }

    fn interpolate_spherical(start: Self, end: Self, t: f32) -> Self {
        start.slerp(end, t)
    }

    fn distance(a: Self, b: Self) -> f32 {
        a.angle_between(b)
    }
}
