use std::{
    fs::File,
    io::{BufReader, Read},
    path::PathBuf,
};

use smallvec::SmallVec;
use thiserror::Error;

use crate::{as_bytes::AsBytes, FrameKind};

/// Header of a recording directory.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingMeta {
    pub kind: FrameKind,
    pub fps: u32,
    pub num_frames: u64,
    pub resolution: u32,
    /// Domain extents, one entry per spatial axis.
    pub extents: SmallVec<[f32; 3]>,
}

/// Reads a recording directory written by `FrameEncoder`.
pub struct FrameDecoder {
    path: PathBuf,
    num_frames: u64,
}

impl FrameDecoder {
    pub fn new(path: PathBuf) -> FrameDecoder {
        Self { path, num_frames: 0 }
    }

    fn frame_path(&self, frame: u64) -> PathBuf {
        let max_digits = (self.num_frames.max(1) - 1).checked_ilog10().unwrap_or(0) + 1;
        let zeros = max_digits - (frame.checked_ilog10().unwrap_or(0) + 1);

        self.path.join(format!("{}{frame}.dat", "0".repeat(zeros as usize)))
    }

    pub fn decode_metadata(&mut self) -> Result<RecordingMeta, DecodingError> {
        let path = self.path.join("_meta");
        let mut reader = BufReader::new(File::open(path)?);

        let mut kind = [0u8; 1];
        reader.read_exact(&mut kind)?;
        let kind = FrameKind::try_from(kind[0]).map_err(DecodingError::UnknownKind)?;

        let mut fps = [0u8; 4];
        reader.read_exact(&mut fps)?;
        let mut num_frames = [0u8; 8];
        reader.read_exact(&mut num_frames)?;
        let mut resolution = [0u8; 4];
        reader.read_exact(&mut resolution)?;

        let mut n_extents = [0u8; 1];
        reader.read_exact(&mut n_extents)?;

        let mut extents: SmallVec<[f32; 3]> = SmallVec::new();
        for _ in 0..n_extents[0] {
            let mut e = [0u8; 4];
            reader.read_exact(&mut e)?;
            extents.push(f32::from_bytes(e));
        }

        let num_frames = u64::from_le_bytes(num_frames);
        self.num_frames = num_frames;

        Ok(RecordingMeta {
            kind,
            fps: u32::from_le_bytes(fps),
            num_frames,
            resolution: u32::from_le_bytes(resolution),
            extents,
        })
    }

    /// Opens one frame for section-by-section reading. `decode_metadata`
    /// must have been called first so frame file names resolve.
    pub fn open_frame(&self, frame: u64) -> Result<FrameSource<BufReader<File>>, DecodingError> {
        let reader = BufReader::new(File::open(self.frame_path(frame))?);
        Ok(FrameSource { reader })
    }
}

/// Section reader for a single frame file.
pub struct FrameSource<R: Read> {
    reader: R,
}

impl<R: Read> FrameSource<R> {
    /// Reads one length-prefixed section of packed values.
    pub fn decode_section<const N: usize, T: AsBytes<N>>(&mut self) -> Result<Vec<T>, DecodingError> {
        let mut len = [0u8; 8];
        self.reader.read_exact(&mut len)?;
        let len = u64::from_le_bytes(len) as usize;

        let mut values = Vec::with_capacity(len);
        let mut buf = [0u8; N];

        for _ in 0..len {
            self.reader.read_exact(&mut buf)?;
            values.push(T::from_bytes(buf));
        }

        Ok(values)
    }
}

#[derive(Debug, Error)]
pub enum DecodingError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("unknown recording kind tag {0}")]
    UnknownKind(u8),
}
