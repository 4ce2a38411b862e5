use std::io::Write;

use encode::{EncodingError, FrameSink};
use gossamer_sim::{cloth::Cloth, sph::SphFluid, stable::StableFluid};
use smallvec::{smallvec, SmallVec};

pub mod as_bytes;
pub mod decode;
pub mod encode;

/// Which simulation a recording belongs to. Stored in the metadata header
/// so a reader knows how to interpret the frame sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameKind {
    Cloth = 1,
    Fluid = 2,
    Sph = 3,
}

impl TryFrom<u8> for FrameKind {
    type Error = u8;

    fn try_from(v: u8) -> Result<Self, u8> {
        match v {
            1 => Ok(FrameKind::Cloth),
            2 => Ok(FrameKind::Fluid),
            3 => Ok(FrameKind::Sph),
            other => Err(other),
        }
    }
}

/// State that can be recorded frame-by-frame.
pub trait EncodeState {
    fn kind(&self) -> FrameKind;

    /// Grid resolution, or particle count for particle simulations.
    fn resolution(&self) -> u32;

    /// Domain extents, one entry per spatial axis.
    fn extents(&self) -> SmallVec<[f32; 3]>;

    fn encode_state<W: Write>(&self, sink: &mut FrameSink<W>) -> Result<(), EncodingError>;
}

impl EncodeState for Cloth {
    fn kind(&self) -> FrameKind {
        FrameKind::Cloth
    }

    fn resolution(&self) -> u32 {
        Cloth::resolution(self) as u32
    }

    fn extents(&self) -> SmallVec<[f32; 3]> {
        smallvec![self.side(), self.side()]
    }

    fn encode_state<W: Write>(&self, sink: &mut FrameSink<W>) -> Result<(), EncodingError> {
        sink.encode_section(self.positions.len(), self.positions.iter().copied())?;
        sink.encode_section(self.normals.len(), self.normals.iter().copied())?;

        Ok(())
    }
}

impl EncodeState for StableFluid {
    fn kind(&self) -> FrameKind {
        FrameKind::Fluid
    }

    fn resolution(&self) -> u32 {
        StableFluid::resolution(self) as u32
    }

    fn extents(&self) -> SmallVec<[f32; 3]> {
        // The solver works over the unit square.
        smallvec![1.0, 1.0]
    }

    fn encode_state<W: Write>(&self, sink: &mut FrameSink<W>) -> Result<(), EncodingError> {
        sink.encode_section(self.density.len(), self.density.iter().copied())?;
        sink.encode_section(self.velocity.len(), self.velocity.iter().copied())?;

        Ok(())
    }
}

impl EncodeState for SphFluid {
    fn kind(&self) -> FrameKind {
        FrameKind::Sph
    }

    fn resolution(&self) -> u32 {
        self.len() as u32
    }

    fn extents(&self) -> SmallVec<[f32; 3]> {
        // SPH lives in the [-1, 1] square.
        smallvec![2.0, 2.0]
    }

    fn encode_state<W: Write>(&self, sink: &mut FrameSink<W>) -> Result<(), EncodingError> {
        sink.encode_section(self.positions.len(), self.positions.iter().copied())?;

        Ok(())
    }
}
