//! Flat chunk generation.
//!
//! Generates McRegion chunks made of horizontal layers, bottom up.

use crate::error::Result;
use crate::region::{REGION_SIZE, Region};

use super::{Chunk, SharedChunk};

/// Bedrock block id.
pub const BEDROCK: u8 = 7;
/// Stone block id.
pub const STONE: u8 = 1;

/// Flat world generator.
///
/// The default layout is one layer of bedrock under three layers of stone.
#[derive(Debug, Clone)]
pub struct FlatGenerator {
    layers: Vec<u8>,
}

impl FlatGenerator {
    /// `layers[y]` is the block id filling row `y`.
    pub fn new(layers: Vec<u8>) -> Self {
        Self { layers }
    }

    pub fn layers(&self) -> &[u8] {
        &self.layers
    }

    /// Generates the chunk at world chunk coordinates `(chunk_x, chunk_z)`.
    pub fn generate(&self, chunk_x: i32, chunk_z: i32) -> Result<Chunk> {
        let mut chunk = Chunk::new()?;
        chunk.set_pos(chunk_x, chunk_z)?;
        chunk.set_terrain_populated(true)?;
        for (y, &blk) in self.layers.iter().enumerate() {
            chunk.floor(y as i32, blk)?;
        }
        Ok(chunk)
    }

    /// Stages one generated chunk in every slot of `region`, all stamped
    /// with `timestamp`. The chunk is shared between slots; each slot gets
    /// its own world position when the region is saved.
    pub fn fill_region(&self, region: &mut Region, timestamp: u32) -> Result<SharedChunk> {
        let chunk = self.generate(0, 0)?.into_shared();
        let side = REGION_SIZE as usize;
        for x in 0..side {
            for z in 0..side {
                region.set_chunk(x, z, chunk.clone())?;
                region.set_timestamp(x, z, timestamp)?;
            }
        }
        log::debug!(
            "Staged {} flat chunks in {}",
            side * side,
            region.path().display()
        );
        Ok(chunk)
    }
}

impl Default for FlatGenerator {
    fn default() -> Self {
        Self::new(vec![BEDROCK, STONE, STONE, STONE])
    }
}
