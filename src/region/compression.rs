//! Chunk blob wrapping and compression.
//!
//! Stored chunks look like `[length:4][method:1][compressed:N]`, where
//! `length` counts the method byte plus the compressed payload.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::{Compression, Decompress, FlushDecompress, Status};

use crate::error::{Error, Result};

/// Size of the `[length][method]` prefix.
pub const BLOB_HEADER_SIZE: usize = 5;

/// Upper bound for one decompressed chunk.
pub const DECOMPRESS_LIMIT: usize = 64 * 1024 * 1024;

/// Compression methods, same ids as vanilla Minecraft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    /// Legacy gzip stream.
    Gzip = 1,
    Zlib = 2,
}

impl TryFrom<u8> for CompressionMethod {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self> {
        match id {
            1 => Ok(CompressionMethod::Gzip),
            2 => Ok(CompressionMethod::Zlib),
            other => Err(Error::UnknownCompression(other)),
        }
    }
}

pub fn compress(data: &[u8], method: CompressionMethod) -> Result<Vec<u8>> {
    Ok(match method {
        CompressionMethod::Zlib => {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data)?;
            encoder.finish()?
        }
        CompressionMethod::Gzip => gzip(data)?,
    })
}

pub fn decompress(data: &[u8], method: CompressionMethod) -> Result<Vec<u8>> {
    match method {
        CompressionMethod::Zlib => inflate(data, DECOMPRESS_LIMIT),
        CompressionMethod::Gzip => gunzip(data, DECOMPRESS_LIMIT),
    }
}

/// Inflates a zlib stream whose decompressed size is unknown: start with a
/// guess, and grow the output whenever the inflater runs out of room.
pub fn inflate(data: &[u8], limit: usize) -> Result<Vec<u8>> {
    let mut inflater = Decompress::new(true);
    let mut out = Vec::with_capacity((data.len() * 4).clamp(1024, limit.max(1024)));
    loop {
        let consumed = inflater.total_in() as usize;
        let status = inflater
            .decompress_vec(&data[consumed..], &mut out, FlushDecompress::Finish)
            .map_err(|e| Error::Decompress(e.to_string()))?;
        match status {
            Status::StreamEnd if out.len() > limit => return Err(Error::DecompressLimit(limit)),
            Status::StreamEnd => return Ok(out),
            Status::Ok | Status::BufError => {
                let stalled = inflater.total_in() as usize == data.len()
                    && out.len() < out.capacity();
                if stalled {
                    return Err(Error::Decompress("truncated zlib stream".into()));
                }
                if out.len() >= limit {
                    return Err(Error::DecompressLimit(limit));
                }
                let grow = out.capacity().min(limit - out.len()).max(1024);
                out.reserve(grow);
            }
        }
    }
}

pub fn gunzip(data: &[u8], limit: usize) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(data)
        .take(limit as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|e| Error::Decompress(e.to_string()))?;
    if out.len() > limit {
        return Err(Error::DecompressLimit(limit));
    }
    Ok(out)
}

pub fn gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Compresses `nbt` and prepends the 5-byte blob header.
pub fn wrap_chunk(nbt: &[u8], method: CompressionMethod) -> Result<Vec<u8>> {
    let compressed = compress(nbt, method)?;
    let total_len = compressed.len() + 1;
    let total = u32::try_from(total_len).map_err(|_| Error::LengthOverflow(total_len))?;

    let mut blob = Vec::with_capacity(BLOB_HEADER_SIZE + compressed.len());
    blob.extend_from_slice(&total.to_be_bytes());
    blob.push(method as u8);
    blob.extend_from_slice(&compressed);
    Ok(blob)
}

/// Splits a stored blob into its compression method and payload, checking
/// the declared length against what was actually read.
pub fn split_blob(blob: &[u8]) -> Result<(CompressionMethod, &[u8])> {
    if blob.len() < BLOB_HEADER_SIZE {
        return Err(Error::CorruptChunkHeader {
            declared: BLOB_HEADER_SIZE,
            available: blob.len(),
        });
    }
    let declared = u32::from_be_bytes([blob[0], blob[1], blob[2], blob[3]]) as usize;
    let available = blob.len() - 4;
    if declared == 0 || declared > available {
        return Err(Error::CorruptChunkHeader {
            declared,
            available,
        });
    }
    let method = CompressionMethod::try_from(blob[4])?;
    Ok((method, &blob[BLOB_HEADER_SIZE..4 + declared]))
}

/// Validates and decompresses a stored blob, returning raw NBT bytes.
pub fn unwrap_chunk(blob: &[u8]) -> Result<Vec<u8>> {
    let (method, payload) = split_blob(blob)?;
    decompress(payload, method)
}
