use crate::{
    error::Divergence,
    obstacle::{Obstacle, ObstacleId, ObstacleSet},
    Simulate,
};

/// A simulation together with its parameters and obstacle set, stepped by
/// an external frame-driven caller.
pub struct Scene<const D: usize, S, P> {
    /// The simulation for this scene.
    pub sim: S,
    /// The parameters for this scene's simulation.
    pub params: P,
    /// The obstacles in this scene.
    obstacles: ObstacleSet<D>,
    /// The number of obstacles (used for IDs).
    n_obstacles: usize,
    /// Cleared when the stability guard reports a divergence; the caller
    /// must not step a stopped scene until it resets the simulation.
    running: bool,
}

impl<const D: usize, S: Simulate<D, Params = P>, P> Scene<D, S, P> {
    pub fn new(sim: S, params: P) -> Self {
        Self {
            sim,
            params,
            obstacles: ObstacleSet::default(),
            n_obstacles: 0,
            running: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Adds an obstacle to the set, returning its ID.
    pub fn add_obstacle<T: Obstacle<D> + 'static>(&mut self, obstacle: T) -> ObstacleId {
        let i = self.n_obstacles;
        self.n_obstacles += 1;

        self.obstacles.obstacles.insert(i, Box::new(obstacle));
        ObstacleId(i)
    }

    /// Removes an obstacle from the set, given its ID.
    pub fn remove_obstacle(&mut self, id: ObstacleId) -> Option<Box<dyn Obstacle<D>>> {
        self.obstacles.obstacles.remove(&id.0)
    }

    /// Insert an obstacle into the set at the given ID, overriding and
    /// returning the old value if it was previously in the set.
    pub fn insert_obstacle<T: Obstacle<D> + 'static>(&mut self, id: ObstacleId, obstacle: T) -> Option<Box<dyn Obstacle<D>>> {
        self.obstacles.obstacles.insert(id.0, Box::new(obstacle))
    }

    /// Advances the scene by one frame. On divergence the scene stops and
    /// the diagnostic is returned; state is left as-is for inspection, not
    /// rolled back.
    pub fn step(&mut self, dt: f32) -> Result<(), Divergence> {
        if !self.running {
            return Ok(());
        }

        let result = self.sim.step(dt, &self.params, &self.obstacles);
        if result.is_err() {
            self.running = false;
        }

        result
    }

    /// Re-arms a scene stopped by the guard. The caller is expected to have
    /// reset the simulation state first.
    pub fn resume(&mut self) {
        self.running = true;
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::cloth::{Cloth, ClothParams};
    use crate::obstacle::plane::Plane;

    #[test]
    fn obstacle_ids_add_replace_and_remove() {
        let cloth = Cloth::new(4, 1.0, 0.5).unwrap();
        let mut scene: Scene<3, _, _> = Scene::new(cloth, ClothParams::default());

        let id = scene.add_obstacle(Plane::ground(0.0));
        assert!(scene.insert_obstacle(id, Plane::ground(0.2)).is_some());
        assert!(scene.remove_obstacle(id).is_some());
        assert!(scene.remove_obstacle(id).is_none());

        // IDs are never reused within a scene.
        let next = scene.add_obstacle(Plane::ground(0.0));
        assert_ne!(id, next);
    }

    #[test]
    fn diverged_scene_stops_stepping() {
        let cloth = Cloth::new(10, 1.0, 1.0).unwrap();
        let params = ClothParams {
            stiffness: 1e6,
            damping: 0.0,
            substeps: 1,
            ..ClothParams::default()
        };
        let mut scene: Scene<3, _, _> = Scene::new(cloth, params);
        scene.sim.pin((0, 0), Vec3::new(0.0, 0.0, 1.0));

        let mut diverged = None;
        for _ in 0..500 {
            if let Err(d) = scene.step(0.05) {
                diverged = Some(d);
                break;
            }
        }

        let d = diverged.expect("explosive parameters should diverge");
        assert!(!scene.is_running());

        // Diagnostic names the failure kind and the offending particle.
        let text = d.to_string();
        assert!(text.contains("particle"), "diagnostic: {text}");

        // Further steps are no-ops until resumed.
        let before = scene.sim.positions.clone();
        scene.step(0.05).unwrap();
        assert_eq!(scene.sim.positions, before);
    }
}
