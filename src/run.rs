use std::{error::Error, f32::consts::TAU, path::PathBuf};

use glam::{Vec2, Vec3};
use indicatif::{ProgressBar, ProgressIterator, ProgressStyle};

use gossamer_io::encode::FrameEncoder;
use gossamer_sim::{
    cloth::{Cloth, ClothParams},
    obstacle::{plane::Plane, sphere::Sphere},
    scene::Scene,
    sph::{SphFluid, SphParams},
    stable::{DensityMode, FluidParams, StableFluid},
};

pub struct ClothScenario {
    pub resolution: usize,
    pub stiffness: f32,
    pub damping: f32,
    pub mass: f32,
    pub wind: f32,
    pub substeps: usize,
    pub dt: f32,
    pub sphere: bool,
}

pub struct FluidScenario {
    pub resolution: usize,
    pub diffusion_velocity: f32,
    pub diffusion_density: f32,
    pub impulse: f32,
    pub curl: bool,
}

fn progress(frames: u64) -> ProgressBar {
    let bar_template = "Running Simulation {spinner:.green} [{elapsed}] [{bar:50.white/white}] {pos}/{len} ({eta})";
    let style = ProgressStyle::with_template(bar_template).unwrap()
        .progress_chars("=> ").tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    ProgressBar::new(frames).with_style(style)
}

pub fn run_cloth(
    output: PathBuf,
    fps: u32,
    frames: u64,
    scenario: ClothScenario,
) -> Result<(), Box<dyn Error>> {
    let params = ClothParams {
        stiffness: scenario.stiffness,
        damping: scenario.damping,
        mass_total: scenario.mass,
        wind_magnitude: scenario.wind,
        substeps: scenario.substeps,
        ..ClothParams::default()
    };
    params.validate()?;

    let mut cloth = Cloth::new(scenario.resolution, 1.0, 1.0)?;
    cloth.pin_in_place((0, 0));
    cloth.pin_in_place((0, scenario.resolution - 1));

    let mut scene: Scene<3, _, _> = Scene::new(cloth, params);
    scene.add_obstacle(Plane::ground(0.0));
    if scenario.sphere {
        scene.add_obstacle(Sphere::new(Vec3::new(0.15, 0.5, 0.0), 0.1));
    }

    let mut encoder = FrameEncoder::new(output, frames, fps)?;
    encoder.encode_metadata(&scene.sim)?;

    for _frame in (0..frames).progress_with(progress(frames)) {
        if let Err(diverged) = scene.step(scenario.dt) {
            eprintln!(" **** Simulation has diverged **** ");
            eprintln!(" > {diverged}");
            eprintln!(" > Stop simulation iterations");
            break;
        }

        encoder.encode_frame(&scene.sim)?;
    }

    Ok(())
}

pub fn run_fluid(
    output: PathBuf,
    fps: u32,
    frames: u64,
    scenario: FluidScenario,
) -> Result<(), Box<dyn Error>> {
    let params = FluidParams {
        diffusion_velocity: scenario.diffusion_velocity,
        diffusion_density: scenario.diffusion_density,
        density_mode: if scenario.curl { DensityMode::Curl } else { DensityMode::Color },
        ..FluidParams::default()
    };
    params.validate()?;

    let n = scenario.resolution;
    let mut fluid = StableFluid::new(n)?;

    // Dye pattern: color blocks over the interior; the border ring stays
    // whatever the boundary fill makes of it.
    for i in 1..n - 1 {
        for j in 1..n - 1 {
            let x = i as f32 / (n - 1) as f32;
            let y = j as f32 / (n - 1) as f32;
            let block = ((x * 4.0) as u32 + (y * 4.0) as u32) % 2;
            fluid.inject_density((i, j), if block == 0 {
                Vec3::new(x, 0.2, 1.0 - y)
            } else {
                Vec3::new(1.0 - x, 0.8, y)
            });
        }
    }

    let mut scene: Scene<2, _, _> = Scene::new(fluid, params);

    let mut encoder = FrameEncoder::new(output, frames, fps)?;
    encoder.encode_metadata(&scene.sim)?;

    let dt = 1.0 / fps as f32;

    for frame in (0..frames).progress_with(progress(frames)) {
        // Stand-in for mouse interaction: a slowly rotating stirring
        // impulse at the center cell.
        let theta = frame as f32 / frames.max(1) as f32 * 4.0 * TAU;
        let dv = scenario.impulse * Vec2::new(theta.cos(), theta.sin());
        scene.sim.inject_impulse((n / 2, n / 2), dv);

        scene.step(dt)?;
        encoder.encode_frame(&scene.sim)?;
    }

    Ok(())
}

pub fn run_sph(output: PathBuf, fps: u32, frames: u64, dt: f32) -> Result<(), Box<dyn Error>> {
    let params = SphParams::default();
    params.validate()?;

    let fluid = SphFluid::dam_break(&params);
    let mut scene: Scene<2, _, _> = Scene::new(fluid, params);

    let mut encoder = FrameEncoder::new(output, frames, fps)?;
    encoder.encode_metadata(&scene.sim)?;

    for _frame in (0..frames).progress_with(progress(frames)) {
        if let Err(diverged) = scene.step(dt) {
            eprintln!(" **** Simulation has diverged **** ");
            eprintln!(" > {diverged}");
            eprintln!(" > Stop simulation iterations");
            break;
        }

        encoder.encode_frame(&scene.sim)?;
    }

    Ok(())
}
