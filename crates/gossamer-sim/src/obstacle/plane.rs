use glam::Vec3;

use super::{Obstacle, Sdf};

/// Half-space obstacle, typically the ground at some height.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    pub point: Vec3,
    pub normal: Vec3,
}

impl Plane {
    pub fn new(point: Vec3, normal: Vec3) -> Self {
        Plane {
            point,
            normal: normal.normalize(),
        }
    }

    /// Ground plane `z = height` with the outward normal pointing up.
    pub fn ground(height: f32) -> Self {
        Plane {
            point: Vec3::new(0.0, 0.0, height),
            normal: Vec3::Z,
        }
    }
}

impl Obstacle<3> for Plane {
    fn sdf(&self, p: [f32; 3]) -> Sdf<3> {
        let p: Vec3 = p.into();

        Sdf {
            distance: (p - self.point).dot(self.normal),
            gradient: self.normal.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ground_distance_is_height_above() {
        let ground = Plane::ground(0.0);
        assert!((ground.sdf([5.0, -3.0, 0.7]).distance - 0.7).abs() < 1e-6);
        assert!((ground.sdf([0.0, 0.0, -0.2]).distance + 0.2).abs() < 1e-6);
    }
}
