//! Minecraft region file format (.mcr / .mca).
//!
//! Region files contain 32x32 chunks in a specific binary format:
//! - Bytes 0-4095: Location table (1024 entries × 4 bytes)
//! - Bytes 4096-8191: Timestamp table (1024 entries × 4 bytes)
//! - Bytes 8192+: Chunk data (4 KiB aligned blobs)
//!
//! Writes are staged in memory and flushed by [`Region::save`], which
//! rebuilds the whole file into a temp file next to the original and renames
//! it into place. Chunks that were not touched are copied forward byte for
//! byte, without a decompress/recompress round trip.

pub mod compression;
mod header;

pub use compression::CompressionMethod;
pub use header::{Header, Location};

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::chunk::{Chunk, SharedChunk};
use crate::error::{Error, Result};

/// Size of one sector in bytes (4 KB).
pub const SECTOR_SIZE: usize = 4096;

/// Total header size (location table + timestamp table).
pub const HEADER_SIZE: usize = SECTOR_SIZE * 2; // 8192 bytes

/// Number of chunks per region dimension.
pub const REGION_SIZE: i32 = 32;

/// Number of chunk slots in one region.
pub const SLOTS: usize = (REGION_SIZE * REGION_SIZE) as usize;

/// Shared handle to an open region.
pub type RegionHandle = Arc<Mutex<Region>>;

/// Convert chunk coordinates to local region coordinates (0-31).
#[inline]
pub fn chunk_to_local(chunk_coord: i32) -> i32 {
    chunk_coord.rem_euclid(REGION_SIZE)
}

/// Convert chunk coordinates to region coordinates.
#[inline]
pub fn chunk_to_region(chunk_coord: i32) -> i32 {
    chunk_coord.div_euclid(REGION_SIZE)
}

/// Calculate linear index for a chunk within a region (0-1023).
#[inline]
pub fn local_to_index(local_x: usize, local_z: usize) -> usize {
    local_x * REGION_SIZE as usize + local_z
}

/// Calculate local coordinates from linear index.
#[inline]
pub fn index_to_local(index: usize) -> (usize, usize) {
    (index / REGION_SIZE as usize, index % REGION_SIZE as usize)
}

fn slot_index(x: usize, z: usize) -> Result<usize> {
    if x >= REGION_SIZE as usize || z >= REGION_SIZE as usize {
        return Err(Error::SlotOutOfRange { x, z });
    }
    Ok(local_to_index(x, z))
}

/// Locks a shared value, recovering the data if a previous holder panicked.
pub fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// On-disk flavour of a region file, selected by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionFormat {
    /// `.mcr`, the original McRegion layout.
    McRegion,
    /// `.mca`, the Anvil layout.
    Anvil,
}

impl RegionFormat {
    pub fn extension(self) -> &'static str {
        match self {
            RegionFormat::McRegion => "mcr",
            RegionFormat::Anvil => "mca",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "mcr" => Some(RegionFormat::McRegion),
            "mca" => Some(RegionFormat::Anvil),
            _ => None,
        }
    }
}

/// Region file coordinates (parsed from filename like "r.0.-1.mca").
#[derive(Debug, Clone, Copy, Default, Hash, Eq, PartialEq)]
pub struct RegionPos {
    pub x: i32,
    pub z: i32,
}

impl RegionPos {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Parse region position and format from filename (e.g., "r.0.-1.mca").
    pub fn from_filename(name: &str) -> Option<(Self, RegionFormat)> {
        let parts: Vec<&str> = name.split('.').collect();
        if parts.len() == 4 && parts[0] == "r" {
            let format = RegionFormat::from_extension(parts[3])?;
            let x = parts[1].parse().ok()?;
            let z = parts[2].parse().ok()?;
            Some((Self { x, z }, format))
        } else {
            None
        }
    }

    pub fn filename(&self, format: RegionFormat) -> String {
        format!("r.{}.{}.{}", self.x, self.z, format.extension())
    }

    /// Convert local chunk coordinates to world chunk coordinates.
    pub fn local_to_world(&self, local_x: i32, local_z: i32) -> (i32, i32) {
        (
            self.x * REGION_SIZE + local_x,
            self.z * REGION_SIZE + local_z,
        )
    }
}

/// One region file plus the writes staged against it.
#[derive(Debug)]
pub struct Region {
    path: PathBuf,
    file: File,
    pos: RegionPos,
    header: Header,
    /// Staged slots; `None` stages a removal.
    pending: BTreeMap<usize, Option<SharedChunk>>,
    dirty: bool,
    method: CompressionMethod,
}

impl Region {
    /// Opens an existing region file and reads both header tables.
    ///
    /// The region position is taken from the file name when it follows the
    /// `r.<x>.<z>.<ext>` convention, and defaults to `(0, 0)` otherwise.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path)?;
        let len = file.metadata()?.len();
        if len < HEADER_SIZE as u64 {
            return Err(Error::HeaderTooShort(len));
        }
        let mut raw = [0u8; HEADER_SIZE];
        file.read_exact(&mut raw)?;
        let header = Header::parse(&raw);

        let pos = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(RegionPos::from_filename)
            .map(|(pos, _)| pos)
            .unwrap_or_default();

        log::info!("Opened region {} at ({}, {})", path.display(), pos.x, pos.z);
        Ok(Self {
            path,
            file,
            pos,
            header,
            pending: BTreeMap::new(),
            dirty: false,
            method: CompressionMethod::Zlib,
        })
    }

    /// Creates (or truncates) a region file holding an empty header.
    pub fn create(path: impl AsRef<Path>, pos: RegionPos) -> Result<Self> {
        let path = path.as_ref();
        fs::write(path, Header::new().to_bytes())?;
        let mut region = Self::open(path)?;
        region.pos = pos;
        Ok(region)
    }

    /// Wraps a region in a shared handle.
    pub fn into_handle(self) -> RegionHandle {
        Arc::new(Mutex::new(self))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pos(&self) -> RegionPos {
        self.pos
    }

    /// Sets the region coordinates used to stamp world positions into
    /// chunks on save.
    pub fn set_pos(&mut self, pos: RegionPos) {
        self.pos = pos;
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Compression used for chunks written by [`Region::save`].
    pub fn set_compression(&mut self, method: CompressionMethod) {
        self.method = method;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Local coordinates of every slot holding a chunk, counting staged
    /// writes and removals.
    pub fn populated(&self) -> Vec<(usize, usize)> {
        (0..SLOTS)
            .filter(|i| match self.pending.get(i) {
                Some(staged) => staged.is_some(),
                None => !self.header.locations[*i].is_empty(),
            })
            .map(index_to_local)
            .collect()
    }

    /// Reads the stored blob (`[length][method][payload]` plus page
    /// padding) of a slot as it is on disk.
    pub fn read_raw(&self, x: usize, z: usize) -> Result<Option<Vec<u8>>> {
        let index = slot_index(x, z)?;
        self.read_slot(index)
    }

    fn read_slot(&self, index: usize) -> Result<Option<Vec<u8>>> {
        let loc = self.header.locations[index];
        if loc.is_empty() {
            return Ok(None);
        }
        if loc.offset < 2 {
            return Err(Error::BadLocation {
                index,
                offset: loc.offset,
            });
        }
        let (start, len) = loc.byte_range();
        let mut file = &self.file;
        file.seek(SeekFrom::Start(start))?;
        let mut blob = Vec::with_capacity(len);
        file.take(len as u64).read_to_end(&mut blob)?;
        Ok(Some(blob))
    }

    /// Loads the chunk in slot `(x, z)`.
    ///
    /// A chunk staged with [`Region::set_chunk`] is returned as is; otherwise
    /// the stored blob is decompressed and decoded. An empty slot is
    /// `Ok(None)`; a corrupt one is an error that only concerns this slot.
    pub fn get_chunk(&self, x: usize, z: usize) -> Result<Option<SharedChunk>> {
        let index = slot_index(x, z)?;
        if let Some(staged) = self.pending.get(&index) {
            return Ok(staged.clone());
        }
        let Some(blob) = self.read_slot(index)? else {
            return Ok(None);
        };
        let nbt = compression::unwrap_chunk(&blob)?;
        log::debug!(
            "Slot ({}, {}): {} stored bytes, {} NBT bytes",
            x,
            z,
            blob.len(),
            nbt.len()
        );
        let chunk = Chunk::from_bytes(&nbt)?;
        Ok(Some(chunk.into_shared()))
    }

    /// Stages `chunk` for slot `(x, z)`; nothing touches disk until
    /// [`Region::save`].
    pub fn set_chunk(&mut self, x: usize, z: usize, chunk: SharedChunk) -> Result<()> {
        let index = slot_index(x, z)?;
        self.pending.insert(index, Some(chunk));
        self.dirty = true;
        Ok(())
    }

    /// Stages the removal of slot `(x, z)`.
    pub fn remove_chunk(&mut self, x: usize, z: usize) -> Result<()> {
        let index = slot_index(x, z)?;
        self.pending.insert(index, None);
        self.dirty = true;
        Ok(())
    }

    pub fn get_timestamp(&self, x: usize, z: usize) -> Result<u32> {
        Ok(self.header.timestamps[slot_index(x, z)?])
    }

    pub fn set_timestamp(&mut self, x: usize, z: usize, ts: u32) -> Result<()> {
        let index = slot_index(x, z)?;
        if self.header.timestamps[index] != ts {
            self.header.timestamps[index] = ts;
            self.dirty = true;
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Flushes staged chunks and timestamps.
    ///
    /// The new file is assembled in a temp file next to the target and then
    /// renamed over it, so readers never see a half-written region. On
    /// failure the temp file is removed and the original stays untouched.
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let tmp = self.temp_path();
        let header = match self.write_to(&tmp) {
            Ok(header) => header,
            Err(e) => {
                discard(&tmp);
                return Err(e);
            }
        };
        if let Err(e) = fs::rename(&tmp, &self.path) {
            discard(&tmp);
            return Err(e.into());
        }
        self.file = File::open(&self.path)?;
        self.header = header;
        self.pending.clear();
        self.dirty = false;
        Ok(())
    }

    fn write_to(&self, tmp: &Path) -> Result<Header> {
        let mut out = File::create(tmp)?;
        let mut header = Header {
            locations: [Location::default(); SLOTS],
            timestamps: self.header.timestamps,
        };
        let mut cursor: u32 = 2;
        let (mut written, mut copied) = (0usize, 0usize);

        for index in 0..SLOTS {
            let blob = match self.pending.get(&index) {
                Some(Some(chunk)) => {
                    let (lx, lz) = index_to_local(index);
                    let (wx, wz) = self.pos.local_to_world(lx as i32, lz as i32);
                    let mut chunk = lock(chunk);
                    chunk.set_pos(wx, wz)?;
                    written += 1;
                    chunk.encode(self.method)?
                }
                Some(None) => {
                    header.timestamps[index] = 0;
                    continue;
                }
                None => match self.read_slot(index) {
                    Ok(Some(blob)) if !blob.is_empty() => {
                        copied += 1;
                        blob
                    }
                    Ok(Some(_)) => {
                        log::warn!("Slot {} points past the end of the file, dropping it", index);
                        header.timestamps[index] = 0;
                        continue;
                    }
                    Err(Error::BadLocation { offset, .. }) => {
                        log::warn!(
                            "Slot {} points into the header (page {}), dropping it",
                            index,
                            offset
                        );
                        header.timestamps[index] = 0;
                        continue;
                    }
                    Err(e) => return Err(e),
                    Ok(None) => continue,
                },
            };

            let pages = blob.len().div_ceil(SECTOR_SIZE);
            let count = u8::try_from(pages).map_err(|_| Error::ChunkTooLarge { pages })?;
            if cursor > Location::MAX_OFFSET {
                return Err(Error::RegionFull);
            }
            out.seek(SeekFrom::Start(cursor as u64 * SECTOR_SIZE as u64))?;
            out.write_all(&blob)?;
            header.locations[index] = Location {
                offset: cursor,
                count,
            };
            log::debug!("Slot {} -> page {} ({} pages)", index, cursor, count);
            cursor += count as u32;
        }

        out.set_len(cursor as u64 * SECTOR_SIZE as u64)?;
        out.seek(SeekFrom::Start(0))?;
        out.write_all(&header.to_bytes())?;
        out.sync_all()?;

        log::info!(
            "Saved region {}: {} chunks written, {} copied, {} pages",
            self.path.display(),
            written,
            copied,
            cursor
        );
        Ok(header)
    }
}

pub(crate) fn discard(tmp: &Path) {
    if let Err(e) = fs::remove_file(tmp) {
        log::warn!("Could not remove temp file {}: {}", tmp.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared(chunk: Chunk) -> SharedChunk {
        Arc::new(Mutex::new(chunk))
    }

    fn chunk_with_floor(blk: u8) -> Chunk {
        let mut chunk = Chunk::new().unwrap();
        chunk.floor(0, blk).unwrap();
        chunk
    }

    #[test]
    fn test_index_round_trip() {
        for x in 0..32 {
            for z in 0..32 {
                let index = local_to_index(x, z);
                assert!(index < SLOTS);
                assert_eq!(index_to_local(index), (x, z));
            }
        }
        assert_eq!(local_to_index(1, 0), 32);
    }

    #[test]
    fn test_chunk_to_region_helpers() {
        assert_eq!(chunk_to_region(-1), -1);
        assert_eq!(chunk_to_local(-1), 31);
        assert_eq!(chunk_to_region(33), 1);
        assert_eq!(chunk_to_local(33), 1);
    }

    #[test]
    fn test_region_pos_from_filename() {
        assert_eq!(
            RegionPos::from_filename("r.0.-1.mca"),
            Some((RegionPos::new(0, -1), RegionFormat::Anvil))
        );
        assert_eq!(
            RegionPos::from_filename("r.-3.12.mcr"),
            Some((RegionPos::new(-3, 12), RegionFormat::McRegion))
        );
        assert_eq!(RegionPos::from_filename("r.0.0.dat"), None);
        assert_eq!(RegionPos::from_filename("level.dat"), None);
        assert_eq!(RegionPos::new(-3, 12).filename(RegionFormat::Anvil), "r.-3.12.mca");
    }

    #[test]
    fn test_open_rejects_short_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.0.0.mca");
        fs::write(&path, [0u8; 100]).unwrap();
        assert!(matches!(Region::open(&path), Err(Error::HeaderTooShort(100))));
    }

    #[test]
    fn test_create_writes_empty_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.0.0.mca");
        let region = Region::create(&path, RegionPos::new(0, 0)).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), HEADER_SIZE as u64);
        assert!(region.populated().is_empty());
        assert!(region.get_chunk(3, 4).unwrap().is_none());
        assert!(matches!(
            region.get_chunk(32, 0),
            Err(Error::SlotOutOfRange { x: 32, z: 0 })
        ));
    }

    #[test]
    fn test_save_and_reopen_single_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.0.0.mcr");
        let mut region = Region::create(&path, RegionPos::new(0, 0)).unwrap();

        region.set_chunk(0, 0, shared(chunk_with_floor(7))).unwrap();
        region.set_timestamp(0, 0, 1000).unwrap();
        region.save().unwrap();
        assert!(!region.is_dirty());
        drop(region);

        let region = Region::open(&path).unwrap();
        assert_eq!(region.get_timestamp(0, 0).unwrap(), 1000);
        let chunk = region.get_chunk(0, 0).unwrap().expect("chunk should exist");
        let chunk = lock(&chunk);
        assert_eq!(chunk.pos(), Some((0, 0)));
        assert_eq!(chunk.block(5, 0, 9), Some(7));
        assert_eq!(chunk.block(5, 1, 9), Some(0));
        assert_eq!(region.populated(), vec![(0, 0)]);
        assert!(!dir.path().join("r.0.0.mcr.tmp").exists());
    }

    #[test]
    fn test_save_stamps_world_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.-1.2.mcr");
        let mut region = Region::create(&path, RegionPos::new(-1, 2)).unwrap();
        region.set_chunk(3, 5, shared(Chunk::new().unwrap())).unwrap();
        region.save().unwrap();

        let chunk = region.get_chunk(3, 5).unwrap().unwrap();
        assert_eq!(lock(&chunk).pos(), Some((-32 + 3, 64 + 5)));
    }

    #[test]
    fn test_save_keeps_other_slots() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.0.0.mcr");
        let mut region = Region::create(&path, RegionPos::new(0, 0)).unwrap();
        region.set_chunk(1, 2, shared(chunk_with_floor(3))).unwrap();
        region.set_chunk(30, 31, shared(chunk_with_floor(4))).unwrap();
        region.save().unwrap();
        let before = region.read_raw(30, 31).unwrap().unwrap();

        region.set_chunk(1, 2, shared(chunk_with_floor(9))).unwrap();
        region.save().unwrap();

        let other = region.get_chunk(30, 31).unwrap().unwrap();
        assert_eq!(lock(&other).block(0, 0, 0), Some(4));
        assert_eq!(region.read_raw(30, 31).unwrap().unwrap(), before);
        let changed = region.get_chunk(1, 2).unwrap().unwrap();
        assert_eq!(lock(&changed).block(0, 0, 0), Some(9));
    }

    #[test]
    fn test_copy_forward_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.0.0.mcr");
        let mut region = Region::create(&path, RegionPos::new(0, 0)).unwrap();
        for (x, z) in [(0, 1), (4, 4), (17, 2)] {
            region.set_chunk(x, z, shared(chunk_with_floor(x as u8 + 1))).unwrap();
            region.set_timestamp(x, z, 500 + x as u32).unwrap();
        }
        region.save().unwrap();
        let original = fs::read(&path).unwrap();

        // only a timestamp change: every chunk is copied forward
        region.set_timestamp(31, 31, 42).unwrap();
        region.set_timestamp(31, 31, 0).unwrap();
        assert!(region.is_dirty());
        region.save().unwrap();
        assert_eq!(fs::read(&path).unwrap(), original);
    }

    #[test]
    fn test_save_without_changes_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.0.0.mcr");
        let mut region = Region::create(&path, RegionPos::new(0, 0)).unwrap();
        region.set_timestamp(0, 0, 0).unwrap();
        assert!(!region.is_dirty());
        region.save().unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), HEADER_SIZE as u64);
    }

    #[test]
    fn test_remove_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.0.0.mcr");
        let mut region = Region::create(&path, RegionPos::new(0, 0)).unwrap();
        region.set_chunk(2, 2, shared(Chunk::new().unwrap())).unwrap();
        region.set_timestamp(2, 2, 7).unwrap();
        region.save().unwrap();

        region.remove_chunk(2, 2).unwrap();
        assert!(region.get_chunk(2, 2).unwrap().is_none());
        region.save().unwrap();
        assert!(region.get_chunk(2, 2).unwrap().is_none());
        assert_eq!(region.get_timestamp(2, 2).unwrap(), 0);
        assert_eq!(fs::metadata(&path).unwrap().len(), HEADER_SIZE as u64);
    }

    #[test]
    fn test_shared_chunk_in_many_slots() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.1.0.mcr");
        let mut region = Region::create(&path, RegionPos::new(1, 0)).unwrap();
        let chunk = shared(chunk_with_floor(1));
        for x in 0..4 {
            region.set_chunk(x, 0, Arc::clone(&chunk)).unwrap();
        }
        assert_eq!(Arc::strong_count(&chunk), 5);
        region.save().unwrap();
        assert_eq!(Arc::strong_count(&chunk), 1, "save releases staged references");

        for x in 0..4 {
            let c = region.get_chunk(x, 0).unwrap().unwrap();
            assert_eq!(lock(&c).pos(), Some((32 + x as i32, 0)));
        }
    }

    #[test]
    fn test_corrupt_slot_does_not_affect_others() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.0.0.mcr");
        let mut region = Region::create(&path, RegionPos::new(0, 0)).unwrap();
        region.set_chunk(0, 0, shared(Chunk::new().unwrap())).unwrap();
        region.set_chunk(0, 1, shared(Chunk::new().unwrap())).unwrap();
        region.save().unwrap();
        drop(region);

        // clobber the compression byte of slot (0, 0)
        let mut bytes = fs::read(&path).unwrap();
        let first = Location::unpack(u32::from_be_bytes(bytes[0..4].try_into().unwrap()));
        bytes[first.offset as usize * SECTOR_SIZE + 4] = 77;
        fs::write(&path, bytes).unwrap();

        let region = Region::open(&path).unwrap();
        assert!(matches!(region.get_chunk(0, 0), Err(Error::UnknownCompression(77))));
        assert!(region.get_chunk(0, 1).unwrap().is_some());
    }

    #[test]
    fn test_reads_chunk_without_level_compound() {
        use crate::nbt::{Document, TagType};

        let mut doc = Document::new();
        let root = doc.root();
        let x = doc.new_tag(TagType::Int).unwrap();
        doc.set_int(x, 12).unwrap();
        doc.compound_set(root, "xPos", x).unwrap();
        let blob = compression::wrap_chunk(&doc.to_bytes().unwrap(), CompressionMethod::Zlib)
            .unwrap();

        let mut header = Header::new();
        header.locations[0] = Location { offset: 2, count: 1 };
        let mut bytes = header.to_bytes();
        bytes.extend_from_slice(&blob);
        bytes.resize(HEADER_SIZE + SECTOR_SIZE, 0);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.0.0.mca");
        fs::write(&path, bytes).unwrap();

        let region = Region::open(&path).unwrap();
        let chunk = region.get_chunk(0, 0).unwrap().unwrap();
        let chunk = lock(&chunk);
        let doc = chunk.document();
        assert_eq!(chunk.level(), doc.root());
        assert_eq!(doc.compound_get(doc.root(), "xPos").and_then(|t| doc.get_int(t)), Some(12));
    }

    #[test]
    fn test_save_drops_slot_pointing_into_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.0.0.mcr");
        let mut region = Region::create(&path, RegionPos::new(0, 0)).unwrap();
        region.set_chunk(5, 5, shared(Chunk::new().unwrap())).unwrap();
        region.set_chunk(6, 6, shared(chunk_with_floor(2))).unwrap();
        region.save().unwrap();
        drop(region);

        let bad = local_to_index(5, 5);
        let mut bytes = fs::read(&path).unwrap();
        let entry = Location { offset: 1, count: 1 }.pack().to_be_bytes();
        bytes[bad * 4..bad * 4 + 4].copy_from_slice(&entry);
        fs::write(&path, bytes).unwrap();

        let mut region = Region::open(&path).unwrap();
        assert!(matches!(
            region.get_chunk(5, 5),
            Err(Error::BadLocation { index, offset: 1 }) if index == bad
        ));
        region.set_chunk(1, 1, shared(chunk_with_floor(8))).unwrap();
        region.save().unwrap();

        assert!(region.header().locations[bad].is_empty());
        assert!(region.get_chunk(5, 5).unwrap().is_none());
        let staged = region.get_chunk(1, 1).unwrap().unwrap();
        assert_eq!(lock(&staged).block(0, 0, 0), Some(8));
        let kept = region.get_chunk(6, 6).unwrap().unwrap();
        assert_eq!(lock(&kept).block(0, 0, 0), Some(2));
    }
}
