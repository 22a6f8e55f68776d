//! Region file header.
//!
//! The header consists of two tables:
//! - Location table: where each chunk is stored
//! - Timestamp table: when each chunk was last saved

use super::{HEADER_SIZE, SECTOR_SIZE, SLOTS};

/// One location-table entry: `[offset:3][count:1]`, big-endian, both in
/// 4 KiB pages. An all-zero entry marks an empty slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Location {
    pub offset: u32,
    pub count: u8,
}

impl Location {
    /// Largest page offset the 24-bit field can address.
    pub const MAX_OFFSET: u32 = 0x00FF_FFFF;

    pub fn unpack(raw: u32) -> Self {
        Self {
            offset: raw >> 8,
            count: (raw & 0xFF) as u8,
        }
    }

    pub fn pack(self) -> u32 {
        (self.offset << 8) | self.count as u32
    }

    pub fn is_empty(self) -> bool {
        self.offset == 0 && self.count == 0
    }

    /// Byte range `(start, len)` covered in the file.
    pub fn byte_range(self) -> (u64, usize) {
        (
            self.offset as u64 * SECTOR_SIZE as u64,
            self.count as usize * SECTOR_SIZE,
        )
    }
}

/// In-memory copy of both header tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub locations: [Location; SLOTS],
    pub timestamps: [u32; SLOTS],
}

impl Header {
    pub fn new() -> Self {
        Self {
            locations: [Location::default(); SLOTS],
            timestamps: [0; SLOTS],
        }
    }

    /// Parses the first [`HEADER_SIZE`] bytes of a region file.
    pub fn parse(bytes: &[u8; HEADER_SIZE]) -> Self {
        let mut header = Self::new();
        let (locs, stamps) = bytes.split_at(SECTOR_SIZE);
        for (i, raw) in locs.chunks_exact(4).enumerate() {
            header.locations[i] =
                Location::unpack(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]));
        }
        for (i, raw) in stamps.chunks_exact(4).enumerate() {
            header.timestamps[i] = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]);
        }
        header
    }

    /// Serializes both tables into the 8 KiB on-disk layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE);
        for loc in &self.locations {
            out.extend_from_slice(&loc.pack().to_be_bytes());
        }
        for ts in &self.timestamps {
            out.extend_from_slice(&ts.to_be_bytes());
        }
        out
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new()
    }
}
