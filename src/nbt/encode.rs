//! Encoder and exact size computation.

use super::{Document, Payload, TagId};
use crate::error::{Error, Result};

struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl Writer<'_> {
    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        let end = self.pos + bytes.len();
        if end > self.buf.len() {
            return Err(Error::BufferTooSmall {
                needed: end,
                available: self.buf.len(),
            });
        }
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    fn u16_len(&mut self, len: usize) -> Result<()> {
        let len = u16::try_from(len).map_err(|_| Error::LengthOverflow(len))?;
        self.put(&len.to_be_bytes())
    }

    fn i32_len(&mut self, len: usize) -> Result<()> {
        let len = i32::try_from(len).map_err(|_| Error::LengthOverflow(len))?;
        self.put(&len.to_be_bytes())
    }
}

impl Document {
    /// Exact number of bytes [`Document::encode_into`] will write.
    pub fn size_in_bytes(&self) -> usize {
        self.named_size(self.root)
    }

    fn named_size(&self, id: TagId) -> usize {
        let name = self.name(id).map_or(0, <[u8]>::len);
        1 + 2 + name + self.payload_size(id)
    }

    fn payload_size(&self, id: TagId) -> usize {
        let Some(payload) = self.payload(id) else {
            return 0;
        };
        match payload {
            Payload::Byte(_) => 1,
            Payload::Short(_) => 2,
            Payload::Int(_) | Payload::Float(_) => 4,
            Payload::Long(_) | Payload::Double(_) => 8,
            Payload::ByteArray(v) => 4 + v.len(),
            Payload::String(v) => 2 + v.len(),
            Payload::IntArray(v) => 4 + 4 * v.len(),
            Payload::LongArray(v) => 4 + 8 * v.len(),
            Payload::List(list) => {
                1 + 4 + list.items.iter().map(|&i| self.payload_size(i)).sum::<usize>()
            }
            Payload::Compound(children) => {
                children.iter().map(|&c| self.named_size(c)).sum::<usize>() + 1
            }
        }
    }

    /// Encodes the tree into `buf`, returning the number of bytes written.
    ///
    /// `buf` must hold at least [`Document::size_in_bytes`] bytes; a shorter
    /// buffer is rejected before anything is written.
    pub fn encode_into(&self, buf: &mut [u8]) -> Result<usize> {
        let needed = self.size_in_bytes();
        if buf.len() < needed {
            return Err(Error::BufferTooSmall {
                needed,
                available: buf.len(),
            });
        }
        let mut w = Writer { buf, pos: 0 };
        self.write_named(&mut w, self.root)?;
        log::trace!("encoded {} tags into {} bytes", self.len(), w.pos);
        Ok(w.pos)
    }

    /// Encodes the tree into a freshly allocated, exactly sized buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.size_in_bytes()];
        let written = self.encode_into(&mut buf)?;
        buf.truncate(written);
        Ok(buf)
    }

    fn write_named(&self, w: &mut Writer<'_>, id: TagId) -> Result<()> {
        let payload = self.payload(id).ok_or(Error::StaleTag)?;
        let name = self.name(id).unwrap_or_default();
        w.put(&[payload.tag_type().id()])?;
        w.u16_len(name.len())?;
        w.put(name)?;
        self.write_payload(w, id)
    }

    fn write_payload(&self, w: &mut Writer<'_>, id: TagId) -> Result<()> {
        match self.payload(id).ok_or(Error::StaleTag)? {
            Payload::Byte(v) => w.put(&v.to_be_bytes()),
            Payload::Short(v) => w.put(&v.to_be_bytes()),
            Payload::Int(v) => w.put(&v.to_be_bytes()),
            Payload::Long(v) => w.put(&v.to_be_bytes()),
            Payload::Float(v) => w.put(&v.to_bits().to_be_bytes()),
            Payload::Double(v) => w.put(&v.to_bits().to_be_bytes()),
            Payload::ByteArray(v) => {
                w.i32_len(v.len())?;
                w.put(v)
            }
            Payload::String(v) => {
                w.u16_len(v.len())?;
                w.put(v)
            }
            Payload::IntArray(v) => {
                w.i32_len(v.len())?;
                v.iter().try_for_each(|x| w.put(&x.to_be_bytes()))
            }
            Payload::LongArray(v) => {
                w.i32_len(v.len())?;
                v.iter().try_for_each(|x| w.put(&x.to_be_bytes()))
            }
            Payload::List(list) => {
                w.put(&[list.element.id()])?;
                w.i32_len(list.items.len())?;
                list.items
                    .iter()
                    .try_for_each(|&item| self.write_payload(w, item))
            }
            Payload::Compound(children) => {
                children
                    .iter()
                    .try_for_each(|&child| self.write_named(w, child))?;
                w.put(&[0])
            }
        }
    }
}
