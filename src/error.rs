//! Error type shared by the codec, the region container and the world glue.

use std::io;

use thiserror::Error;

use crate::nbt::TagType;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // --- malformed NBT input ---
    #[error("unexpected end of input at offset {offset}: needed {needed} more bytes")]
    UnexpectedEof { offset: usize, needed: usize },
    #[error("negative length {0} in length prefix")]
    NegativeLength(i32),
    #[error("unknown tag type {0}")]
    UnknownTagType(u8),
    #[error("list with element type End")]
    EndList,
    #[error("root tag is End")]
    EndRoot,
    #[error("nesting deeper than {0} levels")]
    DepthLimit(usize),

    // --- tree misuse ---
    #[error("type mismatch: expected {expected:?}, found {found:?}")]
    TypeMismatch { expected: TagType, found: TagType },
    #[error("tag handle refers to a freed tag")]
    StaleTag,
    #[error("tag is already attached to a parent")]
    AlreadyAttached,
    #[error("attaching this tag would create a cycle")]
    WouldCycle,
    #[error("index {index} out of bounds for list of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("cannot create a free-standing End tag")]
    EndTag,
    #[error("lists must be created with an element type")]
    ListWithoutElementType,

    // --- encoding ---
    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },
    #[error("length {0} does not fit its length prefix")]
    LengthOverflow(usize),

    // --- storage ---
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("region header truncated: file is {0} bytes")]
    HeaderTooShort(u64),
    #[error("corrupt chunk header: declared {declared} bytes, {available} available")]
    CorruptChunkHeader { declared: usize, available: usize },
    #[error("unknown compression method {0}")]
    UnknownCompression(u8),
    #[error("decompression failed: {0}")]
    Decompress(String),
    #[error("decompressed chunk exceeds {0} bytes")]
    DecompressLimit(usize),
    #[error("chunk needs {pages} pages, at most 255 can be addressed")]
    ChunkTooLarge { pages: usize },
    #[error("region file would exceed the addressable page range")]
    RegionFull,
    #[error("slot {index} points into the region header (page {offset})")]
    BadLocation { index: usize, offset: u32 },
    #[error("slot ({x}, {z}) is outside the 32x32 region grid")]
    SlotOutOfRange { x: usize, z: usize },

    // --- world glue ---
    #[error("missing tag `{0}`")]
    MissingTag(&'static str),
}
