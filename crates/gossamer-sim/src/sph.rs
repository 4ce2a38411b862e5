use std::f32::consts::PI;

use glam::Vec2;

use crate::{
    error::{ConfigError, Divergence},
    guard::StabilityGuard,
    obstacle::ObstacleSet,
    Simulate,
};

/// Gravitational acceleration in the 2D domain.
const GRAVITY: Vec2 = Vec2::new(0.0, -9.81);

#[derive(Debug, Clone, Copy)]
pub struct SphParams {
    /// Kernel support radius h.
    pub smoothing_radius: f32,
    /// Rest density rho0.
    pub rest_density: f32,
    /// Pressure stiffness of the Tait-style equation of state.
    pub stiffness: f32,
    /// Exponent of the equation of state; 1 is the linear law of the
    /// reference solver, 7 gives the stiffer Tait form.
    pub exponent: f32,
    /// Viscosity coefficient nu.
    pub viscosity: f32,
    /// Per-particle mass, rho0 * h^2 for a 2D sampling at spacing h.
    pub particle_mass: f32,
    /// Wall restitution when a particle is clamped back into the domain box.
    pub restitution: f32,
    pub guard: StabilityGuard,
}

impl Default for SphParams {
    fn default() -> Self {
        let h = 0.12;
        let rho0 = 1.0;

        SphParams {
            smoothing_radius: h,
            rest_density: rho0,
            stiffness: 5.0,
            exponent: 1.0,
            viscosity: 0.02,
            particle_mass: rho0 * h * h,
            restitution: 0.5,
            guard: StabilityGuard::default(),
        }
    }
}

impl SphParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::ensure_positive("smoothing radius", self.smoothing_radius)?;
        ConfigError::ensure_positive("rest density", self.rest_density)?;
        ConfigError::ensure_positive("particle mass", self.particle_mass)?;
        ConfigError::ensure_non_negative("stiffness", self.stiffness)?;
        ConfigError::ensure_non_negative("viscosity", self.viscosity)?;
        ConfigError::ensure_non_negative("restitution", self.restitution)?;

        Ok(())
    }
}

/// Smoothed-particle hydrodynamics in the [-1, 1] square: kernel-summed
/// density, Tait pressure, pressure and viscosity forces, symplectic Euler.
/// Particles are created at initialization only.
#[derive(Debug, Clone, Default)]
pub struct SphFluid {
    pub positions: Vec<Vec2>,
    pub velocities: Vec<Vec2>,
    pub forces: Vec<Vec2>,
    pub densities: Vec<f32>,
    pressures: Vec<f32>,
    /// Half side length of the domain box.
    half_extent: f32,
}

impl SphFluid {
    pub fn new() -> Self {
        SphFluid {
            half_extent: 1.0,
            ..SphFluid::default()
        }
    }

    /// Fills a block of jittered particles at spacing `0.7 h`, the initial
    /// condition of the dam-break scene.
    pub fn dam_break(params: &SphParams) -> Self {
        let mut fluid = SphFluid::new();
        let h = params.smoothing_radius;
        let spacing = 0.7 * h;

        // Deterministic jitter; enough to break the lattice symmetry.
        let mut seed: u32 = 0x9e37_79b9;
        let mut jitter = || {
            seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
            (seed >> 8) as f32 / (1 << 24) as f32
        };

        let mut x = h;
        while x < 1.0 - h {
            let mut y = -1.0 + h;
            while y < 1.0 - h {
                let p = Vec2::new(x + h / 8.0 * jitter(), y + h / 8.0 * jitter());
                fluid.insert_particle(p);
                y += spacing;
            }
            x += spacing;
        }

        fluid
    }

    pub fn insert_particle(&mut self, position: Vec2) {
        self.positions.push(position);
        self.velocities.push(Vec2::ZERO);
        self.forces.push(Vec2::ZERO);
        self.densities.push(0.0);
        self.pressures.push(0.0);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter_particles(&self) -> impl Iterator<Item = (&Vec2, &Vec2)> {
        self.positions.iter().zip(self.velocities.iter())
    }

    pub fn max_speed(&self) -> f32 {
        self.velocities.iter().map(|v| v.length()).fold(0.0, f32::max)
    }

    fn update_density_pressure(&mut self, params: &SphParams) {
        let h = params.smoothing_radius;
        let h2 = h * h;
        // 2D poly6 normalization.
        let poly6 = 4.0 / (PI * h2.powi(4));
        let m = params.particle_mass;

        for i in 0..self.len() {
            let pi = self.positions[i];
            let mut rho = 0.0;

            for j in 0..self.len() {
                let r2 = (self.positions[j] - pi).length_squared();
                if r2 < h2 {
                    rho += m * poly6 * (h2 - r2).powi(3);
                }
            }

            self.densities[i] = rho;
            self.pressures[i] = (params.stiffness
                * ((rho / params.rest_density).powf(params.exponent) - 1.0))
                .max(0.0);
        }
    }

    fn compute_forces(&mut self, params: &SphParams) {
        let h = params.smoothing_radius;
        let m = params.particle_mass;
        // 2D spiky gradient and viscosity Laplacian normalizations.
        let spiky_grad = -30.0 / (PI * h.powi(5));
        let visc_lap = 40.0 / (PI * h.powi(5));

        for i in 0..self.len() {
            let pi = self.positions[i];
            let vi = self.velocities[i];
            let rho_i = self.densities[i];
            let pr_i = self.pressures[i];

            let mut f = m * GRAVITY;

            for j in 0..self.len() {
                if j == i {
                    continue;
                }

                let d = self.positions[j] - pi;
                let r = d.length();
                if r >= h || r <= f32::EPSILON {
                    continue;
                }

                let rho_j = self.densities[j];
                let dir = d / r;

                // Symmetrized pressure gradient.
                f -= m * m * (pr_i / (rho_i * rho_i) + self.pressures[j] / (rho_j * rho_j))
                    * spiky_grad
                    * (h - r)
                    * (h - r)
                    * dir;

                // Velocity Laplacian viscosity.
                f += params.viscosity * m * m * (self.velocities[j] - vi) / rho_j
                    * visc_lap
                    * (h - r);
            }

            self.forces[i] = f;
        }
    }

    fn integrate(&mut self, dt: f32, params: &SphParams) {
        let m = params.particle_mass;

        for ((v, p), f) in self
            .velocities
            .iter_mut()
            .zip(self.positions.iter_mut())
            .zip(self.forces.iter())
        {
            *v += dt * *f / m;
            *p += dt * *v;
        }
    }

    /// Clamps escaped particles back into the domain box, reflecting the
    /// wall-normal velocity with restitution.
    fn confine(&mut self, params: &SphParams) {
        let lim = self.half_extent - params.smoothing_radius / 2.0;

        for (p, v) in self.positions.iter_mut().zip(self.velocities.iter_mut()) {
            if p.x < -lim {
                p.x = -lim;
                if v.x < 0.0 {
                    v.x = -params.restitution * v.x;
                }
            } else if p.x > lim {
                p.x = lim;
                if v.x > 0.0 {
                    v.x = -params.restitution * v.x;
                }
            }

            if p.y < -lim {
                p.y = -lim;
                if v.y < 0.0 {
                    v.y = -params.restitution * v.y;
                }
            } else if p.y > lim {
                p.y = lim;
                if v.y > 0.0 {
                    v.y = -params.restitution * v.y;
                }
            }
        }
    }
}

impl Simulate<2> for SphFluid {
    type Params = SphParams;

    fn step(&mut self, dt: f32, params: &SphParams, _obstacles: &ObstacleSet<2>) -> Result<(), Divergence> {
        self.update_density_pressure(params);
        self.compute_forces(params);
        self.integrate(dt, params);
        self.confine(params);

        params.guard.check_particles(&self.forces, &self.positions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dam_break_fills_a_block() {
        let params = SphParams::default();
        let fluid = SphFluid::dam_break(&params);

        assert!(fluid.len() > 100);
        for p in &fluid.positions {
            assert!(p.x > 0.0 && p.x < 1.0);
            assert!(p.y.abs() < 1.0);
        }
    }

    #[test]
    fn densities_are_positive_after_update() {
        let params = SphParams::default();
        let mut fluid = SphFluid::dam_break(&params);

        fluid.update_density_pressure(&params);

        for &rho in &fluid.densities {
            // Every particle at least sees itself.
            assert!(rho > 0.0);
        }
    }

    #[test]
    fn particles_stay_inside_the_box() {
        let params = SphParams::default();
        let mut fluid = SphFluid::dam_break(&params);
        let obstacles = ObstacleSet::default();

        for _ in 0..100 {
            fluid.step(0.005, &params, &obstacles).unwrap();
        }

        for p in &fluid.positions {
            assert!(p.x.abs() <= 1.0 && p.y.abs() <= 1.0, "escaped particle {p:?}");
        }
    }

    #[test]
    fn wall_clamp_reflects_outward_but_keeps_inward_velocity() {
        let params = SphParams::default();
        let lim = 1.0 - params.smoothing_radius / 2.0;

        let mut fluid = SphFluid::new();
        fluid.insert_particle(Vec2::new(-2.0, 0.0));
        fluid.insert_particle(Vec2::new(-2.0, 0.5));
        fluid.velocities[0] = Vec2::new(3.0, 0.0);
        fluid.velocities[1] = Vec2::new(-2.0, 0.0);

        fluid.confine(&params);

        assert_eq!(fluid.positions[0].x, -lim);
        assert_eq!(fluid.positions[1].x, -lim);

        // Already heading back into the domain: left alone.
        assert_eq!(fluid.velocities[0], Vec2::new(3.0, 0.0));
        // Still heading out: reflected and damped.
        assert_eq!(fluid.velocities[1], Vec2::new(1.0, 0.0));
    }

    #[test]
    fn lone_pair_at_rest_feels_only_gravity_scale_forces() {
        let params = SphParams::default();
        let mut fluid = SphFluid::new();
        // Far outside each other's kernel support.
        fluid.insert_particle(Vec2::new(-0.5, 0.0));
        fluid.insert_particle(Vec2::new(0.5, 0.0));

        fluid.update_density_pressure(&params);
        fluid.compute_forces(&params);

        for f in &fluid.forces {
            let expected = params.particle_mass * GRAVITY;
            assert!((*f - expected).length() < 1e-6);
        }
    }
}
