use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use thiserror::Error;

use crate::{as_bytes::AsBytes, EncodeState};

/// Writes a recording directory: a `_meta` header plus one zero-padded
/// `.dat` file per frame.
pub struct FrameEncoder {
    /// The directory into which the recording is placed.
    path: PathBuf,
    num_frames: u64,
    fps: u32,
    current_frame: u64,
}

impl FrameEncoder {
    pub fn new(path: PathBuf, num_frames: u64, fps: u32) -> Result<FrameEncoder, EncodingError> {
        std::fs::create_dir_all(&path)?;

        Ok(Self {
            path,
            num_frames,
            fps,
            current_frame: 0,
        })
    }

    fn frame_path(&self, frame: u64) -> PathBuf {
        let max_digits = (self.num_frames.max(1) - 1).checked_ilog10().unwrap_or(0) + 1;
        let zeros = max_digits - (frame.checked_ilog10().unwrap_or(0) + 1);

        self.path.join(format!("{}{frame}.dat", "0".repeat(zeros as usize)))
    }

    pub fn encode_metadata<S: EncodeState>(&mut self, state: &S) -> Result<(), EncodingError> {
        let path = self.path.join("_meta");
        let mut writer = File::create(path)?;

        writer.write_all(&[state.kind() as u8])?;
        writer.write_all(&self.fps.to_le_bytes())?;
        writer.write_all(&self.num_frames.to_le_bytes())?;
        writer.write_all(&state.resolution().to_le_bytes())?;

        let extents = state.extents();
        writer.write_all(&[extents.len() as u8])?;
        for e in extents {
            writer.write_all(&e.to_le_bytes())?;
        }

        Ok(())
    }

    pub fn encode_frame<S: EncodeState>(&mut self, state: &S) -> Result<(), EncodingError> {
        let path = self.frame_path(self.current_frame);
        let writer = BufWriter::new(File::create(path)?);

        state.encode_state(&mut FrameSink { writer })?;

        self.current_frame += 1;

        Ok(())
    }
}

/// Sink for the sections of a single frame.
pub struct FrameSink<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> FrameSink<W> {
    /// Writes one section: a length prefix followed by the packed values.
    pub fn encode_section<const N: usize, T, I>(&mut self, len: usize, values: I) -> Result<(), EncodingError>
    where
        I: Iterator<Item = T>,
        T: AsBytes<N>,
    {
        self.writer.write_all(&(len as u64).to_le_bytes())?;

        let bytes: Vec<_> = values.flat_map(|v| v.to_bytes()).collect();
        self.writer.write_all(&bytes)?;

        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
