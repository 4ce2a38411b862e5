use error::Divergence;
use obstacle::ObstacleSet;

pub mod cloth;
pub mod error;
pub mod guard;
pub mod obstacle;
pub mod scene;
pub mod sph;
pub mod stable;

/// A simulation that can be advanced by one frame.
///
/// `step` runs to completion before returning; all state is owned by the
/// simulation for the duration of the call. On numerical blow-up the step
/// returns the divergence diagnostic and the caller must stop issuing
/// further steps until the simulation is reset.
pub trait Simulate<const D: usize> {
    type Params;

    fn step(&mut self, dt: f32, params: &Self::Params, obstacles: &ObstacleSet<D>) -> Result<(), Divergence>;
}
