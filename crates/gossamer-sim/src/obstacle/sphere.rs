use glam::Vec3;

use super::{Obstacle, Sdf};

/// Solid sphere obstacle. Penetrating particles are pushed back to the
/// surface along the radial direction.
#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Sphere { center, radius }
    }
}

impl Obstacle<3> for Sphere {
    fn sdf(&self, p: [f32; 3]) -> Sdf<3> {
        let p: Vec3 = p.into();
        let d = (p - self.center).length();

        // Query at the exact center has no defined radial direction; push
        // straight up.
        let gradient = if d > 0.0 {
            (p - self.center) / d
        } else {
            Vec3::Z
        };

        Sdf {
            distance: d - self.radius,
            gradient: gradient.into(),
        }
    }
}
