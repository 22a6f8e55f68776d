//! mcworld: Minecraft save-game access.
//!
//! - [`nbt`]: arena-backed NBT documents with a bounds-checked codec
//! - [`region`]: `.mcr`/`.mca` region containers with staged, atomic saves
//! - [`chunk`], [`level`]: domain wrappers over NBT documents
//! - [`dim`], [`world`]: directories of regions and whole save folders

pub mod chunk;
pub mod dim;
pub mod error;
pub mod level;
pub mod nbt;
pub mod region;
pub mod world;

pub use chunk::{Chunk, FlatGenerator, SharedChunk};
pub use dim::Dimension;
pub use error::{Error, Result};
pub use level::Level;
pub use nbt::{Document, TagId, TagType};
pub use region::{CompressionMethod, Region, RegionFormat, RegionHandle, RegionPos};
pub use world::World;
