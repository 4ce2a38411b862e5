use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod run;

#[derive(Parser)]
#[command(about = "Headless cloth / fluid simulation runner")]
struct Cli {
    /// Directory the recording is written into.
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Frames per second of the recording.
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Simulated duration in seconds.
    #[arg(long, default_value_t = 10.0)]
    duration: f32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Hanging cloth: a pinned mass-spring grid draping under gravity.
    Cloth {
        /// Particles per side of the cloth grid.
        #[arg(short, long, default_value_t = 30)]
        resolution: usize,

        /// Spring stiffness K.
        #[arg(short = 'k', long, default_value_t = 5.0)]
        stiffness: f32,

        /// Velocity damping mu.
        #[arg(short = 'm', long, default_value_t = 10.0)]
        damping: f32,

        /// Total cloth mass.
        #[arg(long, default_value_t = 0.8)]
        mass: f32,

        /// Wind force scale along the surface normal.
        #[arg(short, long, default_value_t = 0.0)]
        wind: f32,

        /// Integration substeps per frame.
        #[arg(long, default_value_t = 5)]
        substeps: usize,

        /// Substep timestep.
        #[arg(long, default_value_t = 0.005)]
        dt: f32,

        /// Put a solid sphere under the falling cloth.
        #[arg(long)]
        sphere: bool,
    },
    /// Stable-fluids box stirred by a rotating impulse.
    Fluid {
        /// Grid cells per side.
        #[arg(short, long, default_value_t = 60)]
        resolution: usize,

        /// Velocity diffusion coefficient.
        #[arg(long, default_value_t = 0.001)]
        diffusion_velocity: f32,

        /// Density diffusion coefficient.
        #[arg(long, default_value_t = 0.005)]
        diffusion_density: f32,

        /// Strength of the stirring impulse.
        #[arg(long, default_value_t = 5.0)]
        impulse: f32,

        /// Record the velocity curl instead of the dye field.
        #[arg(long)]
        curl: bool,
    },
    /// SPH dam break in a box.
    Sph {
        /// Substep timestep.
        #[arg(long, default_value_t = 0.005)]
        dt: f32,
    },
}

fn main() {
    let cli = Cli::parse();
    let frames = (cli.duration * cli.fps as f32) as u64;

    let result = match cli.command {
        Command::Cloth {
            resolution,
            stiffness,
            damping,
            mass,
            wind,
            substeps,
            dt,
            sphere,
        } => run::run_cloth(
            cli.output,
            cli.fps,
            frames,
            run::ClothScenario {
                resolution,
                stiffness,
                damping,
                mass,
                wind,
                substeps,
                dt,
                sphere,
            },
        ),
        Command::Fluid {
            resolution,
            diffusion_velocity,
            diffusion_density,
            impulse,
            curl,
        } => run::run_fluid(
            cli.output,
            cli.fps,
            frames,
            run::FluidScenario {
                resolution,
                diffusion_velocity,
                diffusion_density,
                impulse,
                curl,
            },
        ),
        Command::Sph { dt } => run::run_sph(cli.output, cli.fps, frames, dt),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
