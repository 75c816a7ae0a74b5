//! Actor poses

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// World-space position and orientation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// World position
    pub position: Vec3,
    /// World rotation
    #[serde(default = "identity")]
    pub rotation: Quat,
}

fn identity() -> Quat {
    Quat::IDENTITY
}

impl Pose {
    /// Create a pose from position and rotation
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Create an unrotated pose at a position
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Pose at `position` turned (about +Y) to face `target`
    pub fn facing(position: Vec3, target: Vec3) -> Self {
        let to = target - position;
        if to.x.abs() <= f32::EPSILON && to.z.abs() <= f32::EPSILON {
            return Self::at(position);
        }
        let yaw = to.x.atan2(to.z);
        Self {
            position,
            rotation: Quat::from_rotation_y(yaw),
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

impl From<Vec3> for Pose {
    fn from(position: Vec3) -> Self {
        Self::at(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_points_forward_at_target() {
        let pose = Pose::facing(Vec3::ZERO, Vec3::new(0.0, 0.0, 5.0));
        let forward = pose.rotation * Vec3::Z;
        assert!((forward - Vec3::Z).length() < 1e-5);

        let pose = Pose::facing(Vec3::ZERO, Vec3::new(3.0, 1.0, 0.0));
        let forward = pose.rotation * Vec3::Z;
        assert!((forward - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_facing_degenerate_target() {
        let pose = Pose::facing(Vec3::ONE, Vec3::new(1.0, 4.0, 1.0));
        assert_eq!(pose.rotation, Quat::IDENTITY);
    }
}
