use lattice_common::EngineConfig;
use serde::Serialize;

use crate::buffer::Buffer;
use crate::error::MemoryError;
use crate::types::BufferUse;

/// Channels per texel when the instance buffer is read as an RGBA texture.
const CHANNELS: usize = 4;
/// Bytes reserved per channel.
const BYTES_PER_CHANNEL: usize = 8;

/// Owner of the four fixed-purpose arenas.
///
/// Built once from a validated engine config and never rebuilt. The GPU instance
/// buffer is sized `side * side * 4 * 8` so a render backend can treat it as a
/// square texture of side [`buffer_length_of_one_side`](Self::buffer_length_of_one_side).
#[derive(Debug)]
pub struct MemoryManager {
    side_length: usize,
    little_endian: bool,
    buffers: [Buffer; 4],
}

/// Usage snapshot of one arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BufferStats {
    pub usage: BufferUse,
    pub byte_length: usize,
    pub used_byte_length: usize,
}

impl MemoryManager {
    pub fn new(config: &EngineConfig) -> Result<Self, MemoryError> {
        config.validate()?;
        let side = config.buffer_side_length;
        let square = side * side * CHANNELS * BYTES_PER_CHANNEL;
        // One texel narrower per side than the square arenas.
        let ubo = (side - 1) * (side - 1) * CHANNELS * BYTES_PER_CHANNEL;

        let buffers = BufferUse::ALL.map(|usage| {
            let byte_length = match usage {
                BufferUse::GpuInstanceData | BufferUse::GpuVertexData | BufferUse::CpuGeneric => {
                    square
                }
                BufferUse::UboGeneric => ubo,
            };
            Buffer::new(usage.name(), byte_length)
        });
        tracing::info!(side, square_bytes = square, ubo_bytes = ubo, "memory manager ready");

        Ok(Self {
            side_length: side,
            little_endian: config.little_endian,
            buffers,
        })
    }

    /// The arena for `usage`. Pure lookup.
    pub fn buffer(&self, usage: BufferUse) -> &Buffer {
        &self.buffers[usage.index()]
    }

    pub fn buffer_length_of_one_side(&self) -> usize {
        self.side_length
    }

    /// Width and height of the GPU instance buffer read as a texture.
    pub fn texture_dimensions(&self) -> (usize, usize) {
        (self.side_length, self.side_length)
    }

    /// Byte order accessors should use when reading these arenas.
    pub fn little_endian(&self) -> bool {
        self.little_endian
    }

    pub fn stats(&self) -> Vec<BufferStats> {
        BufferUse::ALL
            .iter()
            .map(|&usage| {
                let buffer = self.buffer(usage);
                BufferStats {
                    usage,
                    byte_length: buffer.byte_length(),
                    used_byte_length: buffer.used_byte_length(),
                }
            })
            .collect()
    }
}
