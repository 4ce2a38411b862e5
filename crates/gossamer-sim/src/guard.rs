use glam::{Vec2, Vec3};
use ndarray::Array2;

use crate::error::Divergence;

/// Fail-fast safety net for the explicit integrators. Scans force and
/// position fields once per substep so a blow-up is caught before it
/// contaminates the visible state for multiple frames.
#[derive(Debug, Clone, Copy)]
pub struct StabilityGuard {
    /// Force magnitude above which the simulation is considered diverged.
    pub force_limit: f32,
}

impl Default for StabilityGuard {
    fn default() -> Self {
        StabilityGuard { force_limit: 600.0 }
    }
}

impl StabilityGuard {
    pub fn new(force_limit: f32) -> Self {
        StabilityGuard { force_limit }
    }

    /// Checks per-grid-particle force and position fields, reporting the
    /// first offending flat index in row-major order.
    pub fn check_grid(&self, forces: &Array2<Vec3>, positions: &Array2<Vec3>) -> Result<(), Divergence> {
        for (k, (f, p)) in forces.iter().zip(positions.iter()).enumerate() {
            self.check_one(k, f.is_nan(), f.length(), p.is_nan())?;
        }

        Ok(())
    }

    /// Same scan for flat particle storage.
    pub fn check_particles(&self, forces: &[Vec2], positions: &[Vec2]) -> Result<(), Divergence> {
        for (k, (f, p)) in forces.iter().zip(positions.iter()).enumerate() {
            self.check_one(k, f.is_nan(), f.length(), p.is_nan())?;
        }

        Ok(())
    }

    fn check_one(&self, index: usize, force_nan: bool, magnitude: f32, position_nan: bool) -> Result<(), Divergence> {
        if force_nan {
            return Err(Divergence::NanForce { index });
        }

        if magnitude > self.force_limit {
            return Err(Divergence::ForceMagnitude {
                index,
                magnitude,
                limit: self.force_limit,
            });
        }

        if position_nan {
            return Err(Divergence::NanPosition { index });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(n: usize) -> (Array2<Vec3>, Array2<Vec3>) {
        (
            Array2::from_elem((n, n), Vec3::ZERO),
            Array2::from_elem((n, n), Vec3::ZERO),
        )
    }

    #[test]
    fn in_bounds_fields_pass() {
        let (mut forces, positions) = fields(4);
        forces[(2, 2)] = Vec3::new(0.0, 0.0, -599.0);

        let guard = StabilityGuard::default();
        assert!(guard.check_grid(&forces, &positions).is_ok());
    }

    #[test]
    fn nan_force_is_reported_with_index() {
        let (mut forces, positions) = fields(4);
        forces[(1, 3)] = Vec3::new(0.0, f32::NAN, 0.0);

        let guard = StabilityGuard::default();
        assert_eq!(
            guard.check_grid(&forces, &positions),
            Err(Divergence::NanForce { index: 7 })
        );
    }

    #[test]
    fn nan_position_is_reported() {
        let (forces, mut positions) = fields(4);
        positions[(0, 0)].z = f32::NAN;

        let guard = StabilityGuard::default();
        assert_eq!(
            guard.check_grid(&forces, &positions),
            Err(Divergence::NanPosition { index: 0 })
        );
    }

    #[test]
    fn force_just_over_threshold_is_reported() {
        let (mut forces, positions) = fields(4);
        forces[(0, 1)] = Vec3::new(601.0, 0.0, 0.0);

        let guard = StabilityGuard::default();
        match guard.check_grid(&forces, &positions) {
            Err(Divergence::ForceMagnitude { index, magnitude, limit }) => {
                assert_eq!(index, 1);
                assert!((magnitude - 601.0).abs() < 1e-3);
                assert!((limit - 600.0).abs() < 1e-6);
            }
            other => panic!("expected force magnitude divergence, got {other:?}"),
        }
    }

    #[test]
    fn nan_force_takes_precedence_over_magnitude() {
        let (mut forces, positions) = fields(2);
        forces[(0, 0)] = Vec3::splat(f32::NAN);
        forces[(1, 1)] = Vec3::splat(1e5);

        let guard = StabilityGuard::default();
        assert_eq!(
            guard.check_grid(&forces, &positions),
            Err(Divergence::NanForce { index: 0 })
        );
    }
}
