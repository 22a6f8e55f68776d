//! Bounds-checked recursive-descent decoder.

use super::{Document, ListPayload, Node, Payload, TagId, TagType};
use crate::error::{Error, Result};

/// Maximum nesting of lists/compounds accepted from the wire.
pub const MAX_DEPTH: usize = 512;

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(Error::UnexpectedEof {
                offset: self.pos,
                needed: n - self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    /// Signed 32-bit length prefix; negative values are malformed.
    fn len(&mut self) -> Result<usize> {
        let len = i32::from_be_bytes(self.array()?);
        usize::try_from(len).map_err(|_| Error::NegativeLength(len))
    }

    /// `count` elements of `width` bytes each, checked against the buffer
    /// before anything is allocated.
    fn elements(&mut self, count: usize, width: usize) -> Result<&'a [u8]> {
        let bytes = count.checked_mul(width).ok_or(Error::UnexpectedEof {
            offset: self.pos,
            needed: usize::MAX,
        })?;
        self.take(bytes)
    }
}

struct Decoder<'a> {
    reader: Reader<'a>,
    doc: Document,
}

impl Decoder<'_> {
    /// Reads a named tag. Returns `None` for the End sentinel.
    fn named(&mut self, parent: Option<TagId>, depth: usize) -> Result<Option<TagId>> {
        let ty = TagType::try_from(self.reader.u8()?)?;
        if ty == TagType::End {
            return Ok(None);
        }
        let name_len = self.reader.u16()? as usize;
        let name = self.reader.take(name_len)?.to_vec();
        let id = self.payload(ty, parent, depth)?;
        if let Some(node) = self.doc.node_mut(id) {
            node.name = Some(name);
        }
        Ok(Some(id))
    }

    /// Reads an anonymous payload of type `ty` into a new node.
    fn payload(&mut self, ty: TagType, parent: Option<TagId>, depth: usize) -> Result<TagId> {
        if depth > MAX_DEPTH {
            return Err(Error::DepthLimit(MAX_DEPTH));
        }
        let r = &mut self.reader;
        let payload = match ty {
            TagType::End => return Err(Error::EndRoot),
            TagType::Byte => Payload::Byte(r.u8()? as i8),
            TagType::Short => Payload::Short(i16::from_be_bytes(r.array()?)),
            TagType::Int => Payload::Int(i32::from_be_bytes(r.array()?)),
            TagType::Long => Payload::Long(i64::from_be_bytes(r.array()?)),
            TagType::Float => Payload::Float(f32::from_bits(u32::from_be_bytes(r.array()?))),
            TagType::Double => Payload::Double(f64::from_bits(u64::from_be_bytes(r.array()?))),
            TagType::ByteArray => {
                let len = r.len()?;
                Payload::ByteArray(r.take(len)?.to_vec())
            }
            TagType::String => {
                let len = r.u16()? as usize;
                Payload::String(r.take(len)?.to_vec())
            }
            TagType::IntArray => {
                let len = r.len()?;
                let bytes = r.elements(len, 4)?;
                Payload::IntArray(
                    bytes
                        .chunks_exact(4)
                        .map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                        .collect(),
                )
            }
            TagType::LongArray => {
                let len = r.len()?;
                let bytes = r.elements(len, 8)?;
                Payload::LongArray(
                    bytes
                        .chunks_exact(8)
                        .map(|c| {
                            let mut b = [0u8; 8];
                            b.copy_from_slice(c);
                            i64::from_be_bytes(b)
                        })
                        .collect(),
                )
            }
            TagType::List => return self.list(parent, depth),
            TagType::Compound => return self.compound(parent, depth),
        };
        Ok(self.doc.alloc(Node {
            name: None,
            parent,
            payload,
        }))
    }

    fn list(&mut self, parent: Option<TagId>, depth: usize) -> Result<TagId> {
        let element = TagType::try_from(self.reader.u8()?)?;
        let len = self.reader.len()?;
        if element == TagType::End {
            return Err(Error::EndList);
        }
        let id = self.doc.alloc(Node {
            name: None,
            parent,
            payload: Payload::List(ListPayload {
                element,
                items: Vec::with_capacity(len.min(self.reader.remaining())),
            }),
        });
        for _ in 0..len {
            let item = self.payload(element, Some(id), depth + 1)?;
            if let Some(Payload::List(list)) = self.doc.node_mut(id).map(|n| &mut n.payload) {
                list.items.push(item);
            }
        }
        Ok(id)
    }

    fn compound(&mut self, parent: Option<TagId>, depth: usize) -> Result<TagId> {
        let id = self.doc.alloc(Node {
            name: None,
            parent,
            payload: Payload::Compound(Vec::new()),
        });
        while let Some(child) = self.named(Some(id), depth + 1)? {
            if let Some(Payload::Compound(children)) =
                self.doc.node_mut(id).map(|n| &mut n.payload)
            {
                children.push(child);
            }
        }
        Ok(id)
    }
}

impl Document {
    /// Decodes one named root tag from the start of `buf`.
    ///
    /// Bytes after the root tag are ignored. On error nothing allocated so
    /// far survives: the partially built arena is dropped with the decoder.
    pub fn decode(buf: &[u8]) -> Result<Document> {
        Self::decode_prefix(buf).map(|(doc, _)| doc)
    }

    /// Like [`Document::decode`], also returning how many bytes were consumed.
    pub fn decode_prefix(buf: &[u8]) -> Result<(Document, usize)> {
        let mut decoder = Decoder {
            reader: Reader { buf, pos: 0 },
            doc: Document::bare(),
        };
        let root = decoder.named(None, 0)?.ok_or(Error::EndRoot)?;
        let consumed = decoder.reader.pos;
        let mut doc = decoder.doc;
        doc.root = root;
        log::trace!("decoded {} tags from {} bytes", doc.len(), consumed);
        Ok((doc, consumed))
    }
}
