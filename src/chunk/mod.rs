//! Chunk domain object.
//!
//! A [`Chunk`] is one decoded NBT document with cached handles to its
//! `Level` compound and, for the section-based layout, its `Sections` list.
//! Two block layouts are understood:
//! - McRegion: one `Blocks` array of 16x128x16, index `y + z*128 + x*128*16`
//! - sections: a list of 16x16x16 compounds tagged with `Y`, index
//!   `(y & 15)*256 + z*16 + x` inside each section's `Blocks`

mod generator;

pub use generator::{BEDROCK, FlatGenerator, STONE};

use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::nbt::{Document, TagId, TagType};
use crate::region::compression::{self, CompressionMethod};

pub const CHUNK_X: usize = 16;
pub const CHUNK_Y: usize = 128;
pub const CHUNK_Z: usize = 16;

/// Blocks in one McRegion chunk.
pub const CHUNK_BLOCKS: usize = CHUNK_X * CHUNK_Y * CHUNK_Z;

/// Blocks in one 16-high section.
pub const SECTION_BLOCKS: usize = CHUNK_X * 16 * CHUNK_Z;

/// Chunk shared between region slots and callers; dropped with the last
/// handle.
pub type SharedChunk = Arc<Mutex<Chunk>>;

#[derive(Debug)]
pub struct Chunk {
    doc: Document,
    level: TagId,
    sections: Option<TagId>,
}

/// Looks up `name` under `parent`, creating a zeroed tag of type `ty` when it
/// is missing.
fn ensure(doc: &mut Document, parent: TagId, name: &str, ty: TagType) -> Result<TagId> {
    if let Some(id) = doc.compound_get(parent, name) {
        let found = doc.tag_type(id).ok_or(Error::StaleTag)?;
        if found != ty {
            return Err(Error::TypeMismatch { expected: ty, found });
        }
        return Ok(id);
    }
    let id = match ty {
        TagType::List => doc.new_list(TagType::Compound)?,
        ty => doc.new_tag(ty)?,
    };
    doc.compound_set(parent, name, id)?;
    Ok(id)
}

fn byte_array(doc: &mut Document, parent: TagId, name: &str, len: usize, fill: u8) -> Result<()> {
    let id = ensure(doc, parent, name, TagType::ByteArray)?;
    if let Some(v) = doc.byte_array_mut(id) {
        v.clear();
        v.resize(len, fill);
    }
    Ok(())
}

impl Chunk {
    /// Builds an empty McRegion-layout chunk at position (0, 0).
    pub fn new() -> Result<Self> {
        let mut doc = Document::new();
        let root = doc.root();
        let level = ensure(&mut doc, root, "Level", TagType::Compound)?;

        ensure(&mut doc, level, "xPos", TagType::Int)?;
        ensure(&mut doc, level, "zPos", TagType::Int)?;
        ensure(&mut doc, level, "LastUpdate", TagType::Long)?;
        ensure(&mut doc, level, "TerrainPopulated", TagType::Byte)?;
        byte_array(&mut doc, level, "Blocks", CHUNK_BLOCKS, 0)?;
        byte_array(&mut doc, level, "Data", CHUNK_BLOCKS / 2, 0)?;
        byte_array(&mut doc, level, "SkyLight", CHUNK_BLOCKS / 2, 0xff)?;
        byte_array(&mut doc, level, "BlockLight", CHUNK_BLOCKS / 2, 0)?;
        byte_array(&mut doc, level, "HeightMap", CHUNK_X * CHUNK_Z, 0)?;
        ensure(&mut doc, level, "Entities", TagType::List)?;
        ensure(&mut doc, level, "TileEntities", TagType::List)?;

        Ok(Self {
            doc,
            level,
            sections: None,
        })
    }

    /// Wraps a decoded document.
    ///
    /// Older chunks keep their fields under a `Level` compound; newer ones
    /// keep them directly in the root compound, with a lowercase `sections`
    /// list.
    pub fn from_document(doc: Document) -> Result<Self> {
        let root = doc.root();
        let is_compound = |id: TagId| doc.tag_type(id) == Some(TagType::Compound);
        let level = match doc.compound_get(root, "Level").filter(|&id| is_compound(id)) {
            Some(level) => level,
            None if is_compound(root) => root,
            None => return Err(Error::MissingTag("Level")),
        };
        let sections = ["Sections", "sections"]
            .into_iter()
            .filter_map(|name| doc.compound_get(level, name))
            .find(|&id| doc.list_element_type(id) == Some(TagType::Compound));
        Ok(Self {
            doc,
            level,
            sections,
        })
    }

    pub fn from_bytes(nbt: &[u8]) -> Result<Self> {
        Self::from_document(Document::decode(nbt)?)
    }

    pub fn into_shared(self) -> SharedChunk {
        Arc::new(Mutex::new(self))
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Mutable access to the underlying tree. Removing `Level` or `Sections`
    /// through it makes the corresponding chunk accessors fail.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn level(&self) -> TagId {
        self.level
    }

    pub fn sections(&self) -> Option<TagId> {
        self.sections
    }

    /// Encodes the tree and wraps it as a stored region blob.
    pub fn encode(&self, method: CompressionMethod) -> Result<Vec<u8>> {
        compression::wrap_chunk(&self.doc.to_bytes()?, method)
    }

    /// World chunk coordinates from `xPos`/`zPos`.
    pub fn pos(&self) -> Option<(i32, i32)> {
        let x = self.doc.compound_get(self.level, "xPos")?;
        let z = self.doc.compound_get(self.level, "zPos")?;
        Some((self.doc.get_int(x)?, self.doc.get_int(z)?))
    }

    pub fn set_pos(&mut self, x: i32, z: i32) -> Result<()> {
        let xt = ensure(&mut self.doc, self.level, "xPos", TagType::Int)?;
        self.doc.set_int(xt, x)?;
        let zt = ensure(&mut self.doc, self.level, "zPos", TagType::Int)?;
        self.doc.set_int(zt, z)
    }

    pub fn set_terrain_populated(&mut self, populated: bool) -> Result<()> {
        let tag = ensure(&mut self.doc, self.level, "TerrainPopulated", TagType::Byte)?;
        self.doc.set_byte(tag, populated as i8)
    }

    pub fn set_last_update(&mut self, tick: i64) -> Result<()> {
        let tag = ensure(&mut self.doc, self.level, "LastUpdate", TagType::Long)?;
        self.doc.set_long(tag, tick)
    }

    /// McRegion `Blocks` array, if this chunk has one.
    pub fn blocks(&self) -> Option<&[u8]> {
        self.doc.byte_array(self.doc.compound_get(self.level, "Blocks")?)
    }

    pub fn blocks_mut(&mut self) -> Option<&mut Vec<u8>> {
        let id = self.doc.compound_get(self.level, "Blocks")?;
        self.doc.byte_array_mut(id)
    }

    /// McRegion block metadata nibbles.
    pub fn data(&self) -> Option<&[u8]> {
        self.doc.byte_array(self.doc.compound_get(self.level, "Data")?)
    }

    pub fn data_mut(&mut self) -> Option<&mut Vec<u8>> {
        let id = self.doc.compound_get(self.level, "Data")?;
        self.doc.byte_array_mut(id)
    }

    /// Drops entities and tile entities.
    pub fn strip_entities(&mut self) -> Result<()> {
        for name in ["Entities", "TileEntities"] {
            if let Some(list) = self.doc.compound_get(self.level, name) {
                self.doc.list_nuke(list)?;
            }
        }
        Ok(())
    }

    fn section_for(&self, section_y: i8) -> Option<TagId> {
        self.doc
            .list_items(self.sections?)?
            .iter()
            .copied()
            .find(|&s| {
                self.doc
                    .compound_get(s, "Y")
                    .and_then(|y| self.doc.get_byte(y))
                    == Some(section_y)
            })
    }

    fn section_y(y: i32) -> Result<i8> {
        i8::try_from(y >> 4).map_err(|_| Error::IndexOutOfBounds {
            index: y.unsigned_abs() as usize,
            len: CHUNK_Y,
        })
    }

    /// Finds the section holding block row `y`, creating an empty one.
    fn section_or_create(&mut self, y: i32) -> Result<TagId> {
        let section_y = Self::section_y(y)?;
        if let Some(section) = self.section_for(section_y) {
            return Ok(section);
        }
        let sections = self.sections.ok_or(Error::MissingTag("Sections"))?;
        let doc = &mut self.doc;
        let section = doc.new_tag(TagType::Compound)?;
        let yt = ensure(doc, section, "Y", TagType::Byte)?;
        doc.set_byte(yt, section_y)?;
        byte_array(doc, section, "Blocks", SECTION_BLOCKS, 0)?;
        byte_array(doc, section, "Data", SECTION_BLOCKS / 2, 0)?;
        byte_array(doc, section, "SkyLight", SECTION_BLOCKS / 2, 0xff)?;
        byte_array(doc, section, "BlockLight", SECTION_BLOCKS / 2, 0)?;
        doc.list_append(sections, section)?;
        Ok(section)
    }

    fn section_blocks(&self, section: TagId) -> Option<&[u8]> {
        self.doc.byte_array(self.doc.compound_get(section, "Blocks")?)
    }

    fn section_blocks_mut(&mut self, section: TagId) -> Result<&mut Vec<u8>> {
        let id = self
            .doc
            .compound_get(section, "Blocks")
            .ok_or(Error::MissingTag("Blocks"))?;
        self.doc
            .byte_array_mut(id)
            .filter(|v| v.len() == SECTION_BLOCKS)
            .ok_or(Error::MissingTag("Blocks"))
    }

    fn legacy_index(x: usize, y: usize, z: usize) -> usize {
        y + z * CHUNK_Y + x * CHUNK_Y * CHUNK_Z
    }

    fn section_index(x: usize, y: i32, z: usize) -> usize {
        (y & 15) as usize * CHUNK_X * CHUNK_Z + z * CHUNK_X + x
    }

    /// Block id at chunk-local `(x, y, z)`.
    pub fn block(&self, x: usize, y: i32, z: usize) -> Option<u8> {
        if x >= CHUNK_X || z >= CHUNK_Z {
            return None;
        }
        if self.sections.is_some() {
            let section = self.section_for(Self::section_y(y).ok()?)?;
            return self
                .section_blocks(section)?
                .get(Self::section_index(x, y, z))
                .copied();
        }
        let y = usize::try_from(y).ok().filter(|&y| y < CHUNK_Y)?;
        self.blocks()?.get(Self::legacy_index(x, y, z)).copied()
    }

    /// Fills horizontal layer `y` with block `blk`.
    pub fn floor(&mut self, y: i32, blk: u8) -> Result<()> {
        if self.sections.is_some() {
            let section = self.section_or_create(y)?;
            let blocks = self.section_blocks_mut(section)?;
            for x in 0..CHUNK_X {
                for z in 0..CHUNK_Z {
                    blocks[Self::section_index(x, y, z)] = blk;
                }
            }
            return Ok(());
        }

        let row = usize::try_from(y)
            .ok()
            .filter(|&y| y < CHUNK_Y)
            .ok_or(Error::IndexOutOfBounds {
                index: y.unsigned_abs() as usize,
                len: CHUNK_Y,
            })?;
        let blocks = self
            .blocks_mut()
            .filter(|b| b.len() == CHUNK_BLOCKS)
            .ok_or(Error::MissingTag("Blocks"))?;
        for x in 0..CHUNK_X {
            for z in 0..CHUNK_Z {
                blocks[Self::legacy_index(x, row, z)] = blk;
            }
        }
        if blk != 0 {
            self.raise_height_map(row as u8 + 1);
        }
        Ok(())
    }

    /// Fills every block of the chunk with `blk`.
    pub fn solid(&mut self, blk: u8) -> Result<()> {
        if let Some(sections) = self.sections {
            let items = self.doc.list_items(sections).unwrap_or_default().to_vec();
            for section in items {
                self.section_blocks_mut(section)?.fill(blk);
            }
            return Ok(());
        }
        self.blocks_mut()
            .ok_or(Error::MissingTag("Blocks"))?
            .fill(blk);
        if blk != 0 {
            self.raise_height_map(CHUNK_Y as u8);
        }
        Ok(())
    }

    fn raise_height_map(&mut self, height: u8) {
        let Some(id) = self.doc.compound_get(self.level, "HeightMap") else {
            return;
        };
        if let Some(map) = self.doc.byte_array_mut(id) {
            for h in map.iter_mut() {
                *h = (*h).max(height);
            }
        }
    }
}
