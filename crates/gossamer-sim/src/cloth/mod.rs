use std::collections::HashMap;

use glam::Vec3;
use ndarray::{azip, Array2};

use crate::{
    error::{ConfigError, Divergence},
    guard::StabilityGuard,
    obstacle::{Obstacle, ObstacleSet},
    Simulate,
};

pub mod topology;

use topology::{build_springs, Spring};

/// Gravitational acceleration, aligned with -Z.
pub const GRAVITY: Vec3 = Vec3::new(0.0, 0.0, -9.81);

/// What happens to the velocity of a pinned particle after its position is
/// forced back to the pin target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PinVelocity {
    /// Leave whatever integration produced, as the historical solver did.
    /// The unbalanced force at the pin keeps integrating into a phantom
    /// drag-limited velocity, so a pinned cloth never reads as settled.
    Keep,
    /// Clear the velocity so a pinned particle is truly at rest.
    #[default]
    Zero,
}

/// What happens to the penetrating velocity component when a particle is
/// pushed out of an obstacle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContactVelocity {
    Keep,
    /// Remove the inward normal component.
    #[default]
    Zero,
    /// Mirror the inward normal component.
    Reflect,
}

#[derive(Debug, Clone, Copy)]
pub struct ClothParams {
    /// Spring stiffness K.
    pub stiffness: f32,
    /// Velocity-proportional drag coefficient mu. This is a linear damping
    /// law, not a normalized aerodynamic drag.
    pub damping: f32,
    /// Total mass of the cloth; per-particle mass is total / count.
    pub mass_total: f32,
    /// Wind force scale along the local surface normal. Zero disables wind.
    pub wind_magnitude: f32,
    /// Integration substeps per frame. Each substep advances by the full
    /// `dt` passed to `step`; more substeps per frame trade compute for
    /// stability under stiff springs.
    pub substeps: usize,
    pub pin_velocity: PinVelocity,
    pub contact_velocity: ContactVelocity,
    pub guard: StabilityGuard,
}

impl Default for ClothParams {
    fn default() -> Self {
        ClothParams {
            stiffness: 5.0,
            damping: 10.0,
            mass_total: 0.8,
            wind_magnitude: 0.0,
            substeps: 5,
            pin_velocity: PinVelocity::default(),
            contact_velocity: ContactVelocity::default(),
            guard: StabilityGuard::default(),
        }
    }
}

impl ClothParams {
    /// Rejects configurations the hot loops are not prepared for.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::ensure_non_negative("stiffness", self.stiffness)?;
        ConfigError::ensure_non_negative("damping", self.damping)?;
        ConfigError::ensure_positive("mass_total", self.mass_total)?;
        ConfigError::ensure_positive("substeps", self.substeps as f32)?;
        ConfigError::ensure_positive("force limit", self.guard.force_limit)?;

        Ok(())
    }
}

/// Square cloth grid simulated as a mass-spring system with semi-implicit
/// Euler integration.
#[derive(Debug, Clone)]
pub struct Cloth {
    resolution: usize,
    /// Undeformed grid spacing, L0 of the structural springs.
    spacing: f32,

    pub positions: Array2<Vec3>,
    pub velocities: Array2<Vec3>,
    pub forces: Array2<Vec3>,
    /// Per-particle surface normals, recomputed every substep. Consumed by
    /// the wind force and exposed for display.
    pub normals: Array2<Vec3>,

    springs: Vec<Spring>,
    pins: HashMap<(usize, usize), Vec3>,
}

impl Cloth {
    /// Creates a flat horizontal cloth covering `side × side` at the given
    /// height, with `resolution` particles per side.
    pub fn new(resolution: usize, side: f32, height: f32) -> Result<Self, ConfigError> {
        if resolution < 2 {
            return Err(ConfigError::ResolutionTooSmall(resolution, 2));
        }
        ConfigError::ensure_positive("side length", side)?;

        let spacing = side / (resolution - 1) as f32;

        let positions = Array2::from_shape_fn((resolution, resolution), |(i, j)| {
            Vec3::new(i as f32 * spacing, j as f32 * spacing, height)
        });
        let velocities = Array2::from_elem((resolution, resolution), Vec3::ZERO);
        let forces = Array2::from_elem((resolution, resolution), Vec3::ZERO);
        let normals = Array2::from_elem((resolution, resolution), Vec3::Z);

        Ok(Cloth {
            resolution,
            spacing,
            positions,
            velocities,
            forces,
            normals,
            springs: build_springs(resolution, spacing),
            pins: HashMap::new(),
        })
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    /// Side length of the undeformed cloth.
    pub fn side(&self) -> f32 {
        self.spacing * (self.resolution - 1) as f32
    }

    pub fn particle_count(&self) -> usize {
        self.resolution * self.resolution
    }

    /// Pins a particle to a fixed target position.
    pub fn pin(&mut self, index: (usize, usize), target: Vec3) {
        self.pins.insert(index, target);
    }

    /// Pins a particle where it currently is.
    pub fn pin_in_place(&mut self, index: (usize, usize)) {
        self.pins.insert(index, self.positions[index]);
    }

    pub fn unpin(&mut self, index: (usize, usize)) -> Option<Vec3> {
        self.pins.remove(&index)
    }

    pub fn pins(&self) -> impl Iterator<Item = (&(usize, usize), &Vec3)> {
        self.pins.iter()
    }

    /// Largest velocity magnitude over the grid, used to decide whether the
    /// cloth has settled.
    pub fn max_speed(&self) -> f32 {
        self.velocities.iter().map(|v| v.length()).fold(0.0, f32::max)
    }

    /// Area-weighted per-particle normals from the cross products of
    /// adjacent grid edges.
    fn update_normals(&mut self) {
        let n = self.resolution;

        for i in 0..n {
            for j in 0..n {
                let p = self.positions[(i, j)];
                let mut acc = Vec3::ZERO;

                let right = (i + 1 < n).then(|| self.positions[(i + 1, j)] - p);
                let up = (j + 1 < n).then(|| self.positions[(i, j + 1)] - p);
                let left = (i > 0).then(|| self.positions[(i - 1, j)] - p);
                let down = (j > 0).then(|| self.positions[(i, j - 1)] - p);

                if let (Some(a), Some(b)) = (right, up) {
                    acc += a.cross(b);
                }
                if let (Some(a), Some(b)) = (up, left) {
                    acc += a.cross(b);
                }
                if let (Some(a), Some(b)) = (left, down) {
                    acc += a.cross(b);
                }
                if let (Some(a), Some(b)) = (down, right) {
                    acc += a.cross(b);
                }

                self.normals[(i, j)] = acc.try_normalize().unwrap_or(Vec3::Z);
            }
        }
    }

    /// Overwrites the force grid with gravity, drag, spring and wind
    /// contributions. Always succeeds algebraically; blow-ups are caught
    /// downstream by the guard.
    fn compute_forces(&mut self, params: &ClothParams, mass: f32) {
        azip!((f in &mut self.forces, &v in &self.velocities) {
            *f = mass * GRAVITY - params.damping * mass * v;
        });

        for spring in &self.springs {
            let d = self.positions[spring.b] - self.positions[spring.a];
            let len = d.length();

            // Coincident particles have no defined direction; skip rather
            // than divide by zero.
            if len <= f32::EPSILON {
                continue;
            }

            let f = params.stiffness * (len - spring.rest_length) * (d / len);
            self.forces[spring.a] += f;
            self.forces[spring.b] -= f;
        }

        if params.wind_magnitude != 0.0 {
            let strength = params.wind_magnitude * self.spacing * self.spacing;
            azip!((f in &mut self.forces, &n in &self.normals) {
                *f += strength * n;
            });
        }
    }

    /// Semi-implicit Euler: velocity from force first, then position from
    /// the new velocity. Applied uniformly; pins are corrected afterward.
    fn integrate(&mut self, dt: f32, mass: f32) {
        azip!((v in &mut self.velocities, &f in &self.forces) {
            *v += dt * f / mass;
        });
        azip!((p in &mut self.positions, &v in &self.velocities) {
            *p += dt * v;
        });
    }

    /// Positional constraints and obstacle response, applied after every
    /// integration substep so the projector always wins last.
    fn apply_constraints(&mut self, params: &ClothParams, obstacles: &ObstacleSet<3>) {
        for (&index, &target) in &self.pins {
            self.positions[index] = target;
            if params.pin_velocity == PinVelocity::Zero {
                self.velocities[index] = Vec3::ZERO;
            }
        }

        if obstacles.is_empty() {
            return;
        }

        let contact = params.contact_velocity;
        azip!((p in &mut self.positions, v in &mut self.velocities) {
            let sd = obstacles.sdf(p.to_array());
            if sd.distance < 0.0 {
                let n = Vec3::from(sd.gradient);
                *p -= sd.distance * n;

                let vn = v.dot(n);
                if vn < 0.0 {
                    match contact {
                        ContactVelocity::Keep => {}
                        ContactVelocity::Zero => *v -= vn * n,
                        ContactVelocity::Reflect => *v -= 2.0 * vn * n,
                    }
                }
            }
        });
    }
}

impl Simulate<3> for Cloth {
    type Params = ClothParams;

    fn step(&mut self, dt: f32, params: &ClothParams, obstacles: &ObstacleSet<3>) -> Result<(), Divergence> {
        let mass = params.mass_total / self.particle_count() as f32;

        for _ in 0..params.substeps {
            self.update_normals();
            self.compute_forces(params, mass);
            self.integrate(dt, mass);
            self.apply_constraints(params, obstacles);

            params.guard.check_grid(&self.forces, &self.positions)?;
        }

        Ok(())
    }
}
