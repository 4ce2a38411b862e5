use glam::{Vec2, Vec3};

/// Fixed-size little-endian byte view of a recorded value.
pub trait AsBytes<const N: usize> {
    fn from_bytes(b: [u8; N]) -> Self;

    fn to_bytes(self) -> [u8; N];
}

impl AsBytes<4> for f32 {
    fn from_bytes(b: [u8; 4]) -> Self {
        f32::from_le_bytes(b)
    }

    fn to_bytes(self) -> [u8; 4] {
        self.to_le_bytes()
    }
}

fn lanes_from_bytes<const L: usize>(b: &[u8]) -> [f32; L] {
    let mut lanes = [0.0f32; L];
    for (lane, chunk) in lanes.iter_mut().zip(b.chunks_exact(4)) {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(chunk);
        *lane = f32::from_le_bytes(raw);
    }
    lanes
}

fn lanes_to_bytes<const L: usize, const N: usize>(lanes: [f32; L]) -> [u8; N] {
    let mut out = [0u8; N];
    for (chunk, lane) in out.chunks_exact_mut(4).zip(lanes) {
        chunk.copy_from_slice(&lane.to_le_bytes());
    }
    out
}

impl AsBytes<8> for Vec2 {
    fn from_bytes(b: [u8; 8]) -> Self {
        Vec2::from_array(lanes_from_bytes(&b))
    }

    fn to_bytes(self) -> [u8; 8] {
        lanes_to_bytes(self.to_array())
    }
}

impl AsBytes<12> for Vec3 {
    fn from_bytes(b: [u8; 12]) -> Self {
        Vec3::from_array(lanes_from_bytes(&b))
    }

    fn to_bytes(self) -> [u8; 12] {
        lanes_to_bytes(self.to_array())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_bytes_round_trip() {
        let v = Vec3::new(1.5, -0.25, 3.0e-7);
        assert_eq!(Vec3::from_bytes(v.to_bytes()), v);

        let v = Vec2::new(f32::MIN_POSITIVE, -1.0);
        assert_eq!(Vec2::from_bytes(v.to_bytes()), v);
    }

    #[test]
    fn scalar_encoding_is_little_endian() {
        assert_eq!(1.0f32.to_bytes(), [0x00, 0x00, 0x80, 0x3f]);
    }
}
