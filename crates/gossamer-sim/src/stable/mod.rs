use std::ops::{Add, Mul};

use glam::{Vec2, Vec3};
use ndarray::Array2;

use crate::{
    error::{ConfigError, Divergence},
    obstacle::ObstacleSet,
    Simulate,
};

/// Boundary policy applied to a field after every relaxation sweep and
/// after advection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Tangential reflection at the domain edges; the wall-normal component
    /// is mirrored so no flow crosses the boundary. Used for velocity.
    Reflective,
    /// Clamp-to-edge (Neumann). Used for scalar and color fields.
    Copy,
}

/// What the density grid holds. Selected once per configuration change,
/// dispatched per step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DensityMode {
    /// An RGB dye field, diffused and advected by the velocity.
    #[default]
    Color,
    /// The density channels visualize the velocity curl instead; nothing is
    /// advected.
    Curl,
}

/// Cell value of a simulated field. The mirror hooks define what reflection
/// at a boundary does to the value; scalars and colors are unaffected,
/// velocity negates the wall-normal component.
pub trait FieldValue:
    Copy + Default + Add<Output = Self> + Mul<f32, Output = Self>
{
    fn mirror_x(self) -> Self {
        self
    }

    fn mirror_y(self) -> Self {
        self
    }
}

impl FieldValue for f32 {}

impl FieldValue for Vec3 {}

impl FieldValue for Vec2 {
    fn mirror_x(self) -> Self {
        Vec2::new(-self.x, self.y)
    }

    fn mirror_y(self) -> Self {
        Vec2::new(self.x, -self.y)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FluidParams {
    pub diffusion_velocity: f32,
    pub diffusion_density: f32,
    /// Gauss-Seidel sweeps per diffusion solve. A fixed count, not a
    /// convergence test; more sweeps reduce visible smoothing error.
    pub diffusion_sweeps: usize,
    /// Relaxation sweeps for the pressure Poisson solve.
    pub projection_sweeps: usize,
    pub density_mode: DensityMode,
}

impl Default for FluidParams {
    fn default() -> Self {
        FluidParams {
            diffusion_velocity: 0.001,
            diffusion_density: 0.005,
            diffusion_sweeps: 20,
            projection_sweeps: 40,
            density_mode: DensityMode::default(),
        }
    }
}

impl FluidParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::ensure_non_negative("velocity diffusion", self.diffusion_velocity)?;
        ConfigError::ensure_non_negative("density diffusion", self.diffusion_density)?;
        ConfigError::ensure_positive("diffusion sweeps", self.diffusion_sweeps as f32)?;
        ConfigError::ensure_positive("projection sweeps", self.projection_sweeps as f32)?;

        Ok(())
    }
}

/// Stable-fluids solver on a square 2D grid: implicit diffusion, divergence
/// removal through a Poisson solve, then semi-Lagrangian advection, applied
/// to the velocity field and then to the density field.
#[derive(Debug, Clone)]
pub struct StableFluid {
    resolution: usize,

    pub velocity: Array2<Vec2>,
    pub density: Array2<Vec3>,

    // Read buffers for each pass. The solver double-buffers so a relaxation
    // pass never reads the grid it is writing.
    velocity_prev: Array2<Vec2>,
    density_prev: Array2<Vec3>,

    divergence: Array2<f32>,
    potential: Array2<f32>,
}

impl StableFluid {
    /// Creates a quiescent fluid on a `resolution × resolution` grid over
    /// the unit square.
    pub fn new(resolution: usize) -> Result<Self, ConfigError> {
        // Relaxation and central differences need a one-cell border plus a
        // non-empty interior.
        if resolution < 3 {
            return Err(ConfigError::ResolutionTooSmall(resolution, 3));
        }

        let shape = (resolution, resolution);

        Ok(StableFluid {
            resolution,
            velocity: Array2::from_elem(shape, Vec2::ZERO),
            density: Array2::from_elem(shape, Vec3::ZERO),
            velocity_prev: Array2::from_elem(shape, Vec2::ZERO),
            density_prev: Array2::from_elem(shape, Vec3::ZERO),
            divergence: Array2::from_elem(shape, 0.0),
            potential: Array2::from_elem(shape, 0.0),
        })
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Adds a velocity impulse at a grid cell. This is the injection point
    /// for external interaction (e.g. a mouse tracker); the cell coordinate
    /// is clamped to the interior.
    pub fn inject_impulse(&mut self, cell: (usize, usize), dv: Vec2) {
        let n = self.resolution;
        let i = cell.0.clamp(1, n - 2);
        let j = cell.1.clamp(1, n - 2);
        self.velocity[(i, j)] += dv;
    }

    /// Seeds the density cell directly, clamped to the interior.
    pub fn inject_density(&mut self, cell: (usize, usize), color: Vec3) {
        let n = self.resolution;
        let i = cell.0.clamp(1, n - 2);
        let j = cell.1.clamp(1, n - 2);
        self.density[(i, j)] = color;
    }

    /// Discrete divergence of the current velocity field: central
    /// differences over the interior, zero on the border.
    pub fn velocity_divergence(&self) -> Array2<f32> {
        let n = self.resolution;
        let h = 1.0 / n as f32;
        let mut div = Array2::from_elem(self.velocity.dim(), 0.0);

        for i in 1..n - 1 {
            for j in 1..n - 1 {
                div[(i, j)] = 0.5
                    * (self.velocity[(i + 1, j)].x - self.velocity[(i - 1, j)].x
                        + self.velocity[(i, j + 1)].y
                        - self.velocity[(i, j - 1)].y)
                    / h;
            }
        }

        div
    }

    pub fn total_density(&self) -> Vec3 {
        self.density.iter().fold(Vec3::ZERO, |acc, &d| acc + d)
    }

    /// Removes the divergent component of the velocity field: solve a
    /// Poisson equation for a scalar potential whose gradient cancels the
    /// divergence, then subtract that gradient.
    pub fn project(&mut self, sweeps: usize) {
        let n = self.resolution;
        let h = 1.0 / n as f32;

        compute_projection_rhs(&mut self.divergence, &self.velocity, h);
        self.potential.fill(0.0);

        for _ in 0..sweeps {
            for i in 1..n - 1 {
                for j in 1..n - 1 {
                    self.potential[(i, j)] = (self.divergence[(i, j)]
                        + self.potential[(i - 1, j)]
                        + self.potential[(i + 1, j)]
                        + self.potential[(i, j - 1)]
                        + self.potential[(i, j + 1)])
                        / 4.0;
                }
            }
            apply_boundary(&mut self.potential, Boundary::Copy);
        }

        for i in 1..n - 1 {
            for j in 1..n - 1 {
                let gx = 0.5 * (self.potential[(i + 1, j)] - self.potential[(i - 1, j)]) / h;
                let gy = 0.5 * (self.potential[(i, j + 1)] - self.potential[(i, j - 1)]) / h;
                self.velocity[(i, j)] -= Vec2::new(gx, gy);
            }
        }
        apply_boundary(&mut self.velocity, Boundary::Reflective);
    }

    /// Writes the velocity curl into the density channels as a signed
    /// red/blue visualization.
    fn write_curl(&mut self) {
        let n = self.resolution;
        let h = 1.0 / n as f32;

        for i in 1..n - 1 {
            for j in 1..n - 1 {
                let curl = 0.5
                    * (self.velocity[(i + 1, j)].y - self.velocity[(i - 1, j)].y
                        - self.velocity[(i, j + 1)].x
                        + self.velocity[(i, j - 1)].x)
                    / h;

                let t = (0.05 * curl).clamp(-0.5, 0.5);
                self.density[(i, j)] = Vec3::new(0.5 + t, 0.5, 0.5 - t);
            }
        }
        apply_boundary(&mut self.density, Boundary::Copy);
    }
}

impl Simulate<2> for StableFluid {
    type Params = FluidParams;

    /// One stable-fluids cycle in fixed order: diffuse, project and
    /// self-advect the velocity, then diffuse and advect the density by the
    /// updated velocity. Unconditionally stable; never diverges.
    fn step(&mut self, dt: f32, params: &FluidParams, _obstacles: &ObstacleSet<2>) -> Result<(), Divergence> {
        self.velocity_prev.assign(&self.velocity);
        diffuse(
            &mut self.velocity,
            &self.velocity_prev,
            params.diffusion_velocity,
            dt,
            Boundary::Reflective,
            params.diffusion_sweeps,
        );

        self.project(params.projection_sweeps);

        self.velocity_prev.assign(&self.velocity);
        advect(&mut self.velocity, &self.velocity_prev, &self.velocity_prev, dt, Boundary::Reflective);

        match params.density_mode {
            DensityMode::Color => {
                self.density_prev.assign(&self.density);
                diffuse(
                    &mut self.density,
                    &self.density_prev,
                    params.diffusion_density,
                    dt,
                    Boundary::Copy,
                    params.diffusion_sweeps,
                );

                self.density_prev.assign(&self.density);
                advect(&mut self.density, &self.density_prev, &self.velocity, dt, Boundary::Copy);
            }
            DensityMode::Curl => self.write_curl(),
        }

        Ok(())
    }
}

/// Implicit diffusion of `src` into `dst` by Gauss-Seidel relaxation.
/// `dst` and `src` must be distinct buffers (the borrow checker enforces
/// this) and the same shape.
pub fn diffuse<T: FieldValue>(
    dst: &mut Array2<T>,
    src: &Array2<T>,
    diffusion: f32,
    dt: f32,
    boundary: Boundary,
    sweeps: usize,
) {
    let (nx, ny) = dst.dim();
    let a = dt * diffusion * (nx * ny) as f32;
    let inv = 1.0 / (1.0 + 4.0 * a);

    dst.assign(src);

    for _ in 0..sweeps {
        for i in 1..nx - 1 {
            for j in 1..ny - 1 {
                let neighbors = dst[(i - 1, j)] + dst[(i + 1, j)] + dst[(i, j - 1)] + dst[(i, j + 1)];
                dst[(i, j)] = (src[(i, j)] + neighbors * a) * inv;
            }
        }
        apply_boundary(dst, boundary);
    }
}

/// Semi-Lagrangian advection: each cell traces one timestep backward along
/// `velocity` and bilinearly samples `src` at the back-traced point,
/// clamped to the grid.
pub fn advect<T: FieldValue>(
    dst: &mut Array2<T>,
    src: &Array2<T>,
    velocity: &Array2<Vec2>,
    dt: f32,
    boundary: Boundary,
) {
    let (nx, ny) = dst.dim();
    // Velocity lives in domain units over the unit square; convert the
    // displacement to cell units.
    let dt0 = dt * nx as f32;

    for i in 1..nx - 1 {
        for j in 1..ny - 1 {
            let v = velocity[(i, j)];
            let back = Vec2::new(i as f32 - dt0 * v.x, j as f32 - dt0 * v.y);
            let back = back.clamp(
                Vec2::splat(0.5),
                Vec2::new(nx as f32 - 1.5, ny as f32 - 1.5),
            );

            dst[(i, j)] = bilinear(src, back);
        }
    }
    apply_boundary(dst, boundary);
}

/// Bilinear sample at a point in cell coordinates. The caller clamps the
/// point into the grid.
pub fn bilinear<T: FieldValue>(field: &Array2<T>, p: Vec2) -> T {
    let (nx, ny) = field.dim();

    let i0 = (p.x.floor() as usize).min(nx - 2);
    let j0 = (p.y.floor() as usize).min(ny - 2);
    let (i1, j1) = (i0 + 1, j0 + 1);

    let tx = p.x - i0 as f32;
    let ty = p.y - j0 as f32;

    let bottom = field[(i0, j0)] * (1.0 - tx) + field[(i1, j0)] * tx;
    let top = field[(i0, j1)] * (1.0 - tx) + field[(i1, j1)] * tx;

    bottom * (1.0 - ty) + top * ty
}

/// Fills the domain border from the adjacent interior cells, mirroring
/// wall-normal components under the reflective policy. Corners average
/// their two neighbors.
pub fn apply_boundary<T: FieldValue>(field: &mut Array2<T>, boundary: Boundary) {
    let (nx, ny) = field.dim();

    for j in 1..ny - 1 {
        let left = field[(1, j)];
        let right = field[(nx - 2, j)];

        field[(0, j)] = match boundary {
            Boundary::Reflective => left.mirror_x(),
            Boundary::Copy => left,
        };
        field[(nx - 1, j)] = match boundary {
            Boundary::Reflective => right.mirror_x(),
            Boundary::Copy => right,
        };
    }

    for i in 1..nx - 1 {
        let bottom = field[(i, 1)];
        let top = field[(i, ny - 2)];

        field[(i, 0)] = match boundary {
            Boundary::Reflective => bottom.mirror_y(),
            Boundary::Copy => bottom,
        };
        field[(i, ny - 1)] = match boundary {
            Boundary::Reflective => top.mirror_y(),
            Boundary::Copy => top,
        };
    }

    field[(0, 0)] = (field[(1, 0)] + field[(0, 1)]) * 0.5;
    field[(nx - 1, 0)] = (field[(nx - 2, 0)] + field[(nx - 1, 1)]) * 0.5;
    field[(0, ny - 1)] = (field[(0, ny - 2)] + field[(1, ny - 1)]) * 0.5;
    field[(nx - 1, ny - 1)] = (field[(nx - 2, ny - 1)] + field[(nx - 1, ny - 2)]) * 0.5;
}

/// Right-hand side of the pressure Poisson equation: the negated velocity
/// divergence scaled by the cell size, so the relaxation below and the
/// gradient subtraction in `project` stay mutually consistent.
fn compute_projection_rhs(rhs: &mut Array2<f32>, velocity: &Array2<Vec2>, h: f32) {
    let (nx, ny) = velocity.dim();

    for i in 1..nx - 1 {
        for j in 1..ny - 1 {
            rhs[(i, j)] = -0.5
                * h
                * (velocity[(i + 1, j)].x - velocity[(i - 1, j)].x + velocity[(i, j + 1)].y
                    - velocity[(i, j - 1)].y);
        }
    }
    apply_boundary(rhs, Boundary::Copy);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_tiny_grids() {
        assert!(StableFluid::new(2).is_err());
        assert!(StableFluid::new(3).is_ok());
    }

    #[test]
    fn impulse_coordinates_are_clamped_to_interior() {
        let mut fluid = StableFluid::new(16).unwrap();
        fluid.inject_impulse((0, 100), Vec2::new(1.0, 0.0));
        assert_eq!(fluid.velocity[(1, 14)], Vec2::new(1.0, 0.0));
    }

    #[test]
    fn projection_removes_interior_divergence() {
        use std::f32::consts::PI;

        let n = 32;
        let mut fluid = StableFluid::new(n).unwrap();

        // A pure gradient field with no flow through the walls; projection
        // annihilates exactly this kind of field. phi = cos(pi x) cos(pi y).
        for i in 0..n {
            for j in 0..n {
                let x = i as f32 / n as f32;
                let y = j as f32 / n as f32;
                fluid.velocity[(i, j)] = -PI
                    * Vec2::new(
                        (PI * x).sin() * (PI * y).cos(),
                        (PI * x).cos() * (PI * y).sin(),
                    );
            }
        }

        // Measure away from the walls; the boundary fill distorts the
        // outermost ring.
        let deep_max = |fluid: &StableFluid| {
            let div = fluid.velocity_divergence();
            let mut max = 0.0f32;
            for i in 4..n - 4 {
                for j in 4..n - 4 {
                    max = max.max(div[(i, j)].abs());
                }
            }
            max
        };

        let before = deep_max(&fluid);
        assert!(before > 1.0, "field should start divergent, got {before}");

        fluid.project(600);
        let after = deep_max(&fluid);
        assert!(
            after < 0.1 * before,
            "projection should collapse divergence: {after} vs {before}"
        );
    }

    #[test]
    fn pure_advection_approximately_conserves_density() {
        let n = 32;
        let mut fluid = StableFluid::new(n).unwrap();

        // Smooth blob of dye and a gentle uniform drift.
        for i in 1..n - 1 {
            for j in 1..n - 1 {
                let dx = i as f32 - n as f32 / 2.0;
                let dy = j as f32 - n as f32 / 2.0;
                let w = (-(dx * dx + dy * dy) / 16.0).exp();
                fluid.density[(i, j)] = Vec3::splat(w);
            }
        }
        for v in fluid.velocity.iter_mut() {
            *v = Vec2::new(0.08, 0.03);
        }

        let before = fluid.total_density().x;

        let src = fluid.density.clone();
        advect(&mut fluid.density, &src, &fluid.velocity, 0.1, Boundary::Copy);

        let after = fluid.total_density().x;
        let drift = (after - before).abs() / before;
        assert!(drift < 0.05, "density drifted by {drift}");
    }

    #[test]
    fn diffusion_spreads_but_does_not_amplify() {
        let n = 24;
        let mut fluid = StableFluid::new(n).unwrap();
        fluid.inject_density((n / 2, n / 2), Vec3::splat(1.0));

        let src = fluid.density.clone();
        diffuse(&mut fluid.density, &src, 0.005, 0.2, Boundary::Copy, 20);

        let center = fluid.density[(n / 2, n / 2)].x;
        let neighbor = fluid.density[(n / 2 + 1, n / 2)].x;

        assert!(center < 1.0, "peak should shrink, got {center}");
        assert!(neighbor > 0.0, "mass should reach the neighbor");

        let max = fluid.density.iter().map(|d| d.x).fold(0.0f32, f32::max);
        assert!(max <= 1.0 + 1e-5, "diffusion must not amplify, max {max}");
    }

    #[test]
    fn reflective_boundary_mirrors_normal_component() {
        let n = 8;
        let mut field = Array2::from_elem((n, n), Vec2::ZERO);
        field[(1, 4)] = Vec2::new(2.0, 1.5);
        field[(4, 1)] = Vec2::new(0.5, -3.0);

        apply_boundary(&mut field, Boundary::Reflective);

        // Wall-normal component negated, tangential copied.
        assert_eq!(field[(0, 4)], Vec2::new(-2.0, 1.5));
        assert_eq!(field[(4, 0)], Vec2::new(0.5, 3.0));
    }

    #[test]
    fn copy_boundary_clamps_to_edge() {
        let n = 8;
        let mut field = Array2::from_elem((n, n), 0.0f32);
        field[(1, 3)] = 7.0;

        apply_boundary(&mut field, Boundary::Copy);
        assert_eq!(field[(0, 3)], 7.0);
    }

    #[test]
    fn curl_mode_leaves_density_unadvected() {
        let mut fluid = StableFluid::new(16).unwrap();
        fluid.inject_impulse((8, 8), Vec2::new(2.0, 0.0));

        let params = FluidParams {
            density_mode: DensityMode::Curl,
            ..FluidParams::default()
        };
        fluid.step(0.1, &params, &ObstacleSet::default()).unwrap();

        // Every interior cell is a curl visualization sample, not dye.
        for i in 1..15 {
            for j in 1..15 {
                let d = fluid.density[(i, j)];
                assert!((d.y - 0.5).abs() < 1e-6);
                assert!((d.x + d.z - 1.0).abs() < 1e-5);
            }
        }
    }
}
