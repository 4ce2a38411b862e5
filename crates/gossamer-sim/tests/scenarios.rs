//! End-to-end scenario runs: whole-scene stepping at the defaults a
//! frame-driven caller would use.

use glam::{Vec2, Vec3};

use gossamer_sim::{
    cloth::{Cloth, ClothParams},
    obstacle::plane::Plane,
    scene::Scene,
    stable::{FluidParams, StableFluid},
};

fn max_abs(field: &ndarray::Array2<f32>) -> f32 {
    field.iter().fold(0.0f32, |m, &v| m.max(v.abs()))
}

/// A cloth pinned at two corners over a ground plane drapes and comes to
/// rest without tripping the stability guard.
#[test]
fn pinned_cloth_settles_over_ground() {
    let n = 30;
    let params = ClothParams::default();
    let mut cloth = Cloth::new(n, 1.0, 1.0).unwrap();
    cloth.pin_in_place((0, 0));
    cloth.pin_in_place((0, n - 1));

    let corner_a = cloth.positions[(0, 0)];
    let corner_b = cloth.positions[(0, n - 1)];

    let mut scene: Scene<3, _, _> = Scene::new(cloth, params);
    scene.add_obstacle(Plane::ground(0.0));

    for _ in 0..200 {
        scene.step(0.005).unwrap();
    }

    assert!(scene.is_running());
    assert_eq!(scene.sim.positions[(0, 0)], corner_a);
    assert_eq!(scene.sim.positions[(0, n - 1)], corner_b);

    // Pins hold their particles fully at rest, not just in place.
    assert_eq!(scene.sim.velocities[(0, 0)], Vec3::ZERO);
    assert_eq!(scene.sim.velocities[(0, n - 1)], Vec3::ZERO);

    for p in scene.sim.positions.iter() {
        assert!(p.is_finite(), "non-finite position {p}");
        assert!(p.z >= -1e-4, "particle below ground: {p}");
    }

    let speed = scene.sim.max_speed();
    assert!(speed < 0.1, "cloth still moving after 5 s: max speed {speed}");
}

/// A stirred grid fluid keeps its velocity field near divergence-free and
/// its dye bounded across many driven frames.
#[test]
fn stirred_fluid_stays_divergence_free_and_bounded() {
    let n = 60;
    let params = FluidParams::default();
    let mut fluid = StableFluid::new(n).unwrap();

    for i in 20..40 {
        for j in 20..40 {
            fluid.inject_density((i, j), Vec3::new(1.0, 0.5, 0.2));
        }
    }
    let dye_before = fluid.total_density();

    let mut scene: Scene<2, _, _> = Scene::new(fluid, params);
    let center = n / 2;
    let dt = 0.002;

    // A smooth stirring impulse a few cells wide, like a dragged mouse
    // rather than a delta at one cell.
    let stir = |scene: &mut Scene<2, StableFluid, FluidParams>, dv: Vec2| {
        for di in -6i32..=6 {
            for dj in -6i32..=6 {
                let w = (-((di * di + dj * dj) as f32) / 18.0).exp();
                let cell = (
                    (center as i32 + di) as usize,
                    (center as i32 + dj) as usize,
                );
                scene.sim.inject_impulse(cell, w * dv);
            }
        }
    };

    // First frame starts from rest, so the whole divergence is the injected
    // blob and the projection must collapse it.
    stir(&mut scene, Vec2::new(2.0, 0.0));
    let injected = max_abs(&scene.sim.velocity_divergence());
    assert!(injected > 1.0, "stir should be divergent, got {injected}");

    scene.step(dt).unwrap();

    let after = max_abs(&scene.sim.velocity_divergence());
    assert!(
        after < 0.5 * injected,
        "divergence {after} not reduced from {injected}"
    );

    // Keep stirring; the field must stay bounded and finite.
    for frame in 1..30 {
        let theta = frame as f32 * 0.4;
        stir(&mut scene, 2.0 * Vec2::new(theta.cos(), theta.sin()));
        scene.step(dt).unwrap();
    }

    let fastest = scene
        .sim
        .velocity
        .iter()
        .fold(0.0f32, |m, v| m.max(v.length()));
    assert!(fastest < 50.0, "velocity blew up to {fastest}");

    // The impulse has spread beyond the injection cell.
    let moving = scene
        .sim
        .velocity
        .iter()
        .filter(|v| v.length() > 1e-4)
        .count();
    assert!(moving > 5, "only {moving} cells moving");

    for v in scene.sim.velocity.iter() {
        assert!(v.is_finite(), "non-finite velocity {v}");
    }

    // Dye is transported, not created: allow diffusion/advection losses
    // but no blow-up.
    let dye_after = scene.sim.total_density();
    for k in 0..3 {
        assert!(
            dye_after[k] <= dye_before[k] * 1.2 + 1.0,
            "dye channel {k} grew from {} to {}",
            dye_before[k],
            dye_after[k]
        );
        assert!(dye_after[k].is_finite());
    }
}
