//! NBT (Named Binary Tag) documents.
//!
//! A [`Document`] owns every tag of one tree in an arena. Tags are addressed
//! by [`TagId`] handles which stay valid until the tag is removed from the
//! tree (or the document is dropped). Removed subtrees go back to the arena's
//! free list and their handles go stale: every accessor returns `None` or
//! [`Error::StaleTag`] for them instead of aliasing a reused slot.
//!
//! Wire format (big-endian throughout):
//! - named tag: `[type:1][name_len:2][name:N][payload]`
//! - list element: `[payload]` only, the type is stored once in the list header
//! - compound: named tags until a single `0x00` (End) byte

mod decode;
mod dump;
mod encode;
pub mod json;

pub use decode::MAX_DEPTH;

use crate::error::{Error, Result};

/// Tag type ids as stored on the wire.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagType {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

impl TagType {
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Name used by the textual dump (`TAG_Byte_Array` etc).
    pub fn label(self) -> &'static str {
        match self {
            TagType::End => "TAG_End",
            TagType::Byte => "TAG_Byte",
            TagType::Short => "TAG_Short",
            TagType::Int => "TAG_Int",
            TagType::Long => "TAG_Long",
            TagType::Float => "TAG_Float",
            TagType::Double => "TAG_Double",
            TagType::ByteArray => "TAG_Byte_Array",
            TagType::String => "TAG_String",
            TagType::List => "TAG_List",
            TagType::Compound => "TAG_Compound",
            TagType::IntArray => "TAG_Int_Array",
            TagType::LongArray => "TAG_Long_Array",
        }
    }
}

impl TryFrom<u8> for TagType {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self> {
        Ok(match id {
            0 => TagType::End,
            1 => TagType::Byte,
            2 => TagType::Short,
            3 => TagType::Int,
            4 => TagType::Long,
            5 => TagType::Float,
            6 => TagType::Double,
            7 => TagType::ByteArray,
            8 => TagType::String,
            9 => TagType::List,
            10 => TagType::Compound,
            11 => TagType::IntArray,
            12 => TagType::LongArray,
            other => return Err(Error::UnknownTagType(other)),
        })
    }
}

/// Handle to a tag inside one [`Document`].
///
/// Handles are only meaningful for the document that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TagId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListPayload {
    pub element: TagType,
    pub items: Vec<TagId>,
}

/// Type-dependent tag contents.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<u8>),
    /// Raw bytes; NBT strings are not guaranteed to be valid UTF-8.
    String(Vec<u8>),
    List(ListPayload),
    Compound(Vec<TagId>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Payload {
    pub fn tag_type(&self) -> TagType {
        match self {
            Payload::Byte(_) => TagType::Byte,
            Payload::Short(_) => TagType::Short,
            Payload::Int(_) => TagType::Int,
            Payload::Long(_) => TagType::Long,
            Payload::Float(_) => TagType::Float,
            Payload::Double(_) => TagType::Double,
            Payload::ByteArray(_) => TagType::ByteArray,
            Payload::String(_) => TagType::String,
            Payload::List(_) => TagType::List,
            Payload::Compound(_) => TagType::Compound,
            Payload::IntArray(_) => TagType::IntArray,
            Payload::LongArray(_) => TagType::LongArray,
        }
    }

    /// Zero/empty payload for `ty`. Lists need an element type and End has
    /// no payload, so both are rejected here.
    fn zeroed(ty: TagType) -> Result<Self> {
        Ok(match ty {
            TagType::End => return Err(Error::EndTag),
            TagType::Byte => Payload::Byte(0),
            TagType::Short => Payload::Short(0),
            TagType::Int => Payload::Int(0),
            TagType::Long => Payload::Long(0),
            TagType::Float => Payload::Float(0.0),
            TagType::Double => Payload::Double(0.0),
            TagType::ByteArray => Payload::ByteArray(Vec::new()),
            TagType::String => Payload::String(Vec::new()),
            TagType::List => return Err(Error::ListWithoutElementType),
            TagType::Compound => Payload::Compound(Vec::new()),
            TagType::IntArray => Payload::IntArray(Vec::new()),
            TagType::LongArray => Payload::LongArray(Vec::new()),
        })
    }
}

#[derive(Debug, Clone)]
struct Node {
    name: Option<Vec<u8>>,
    parent: Option<TagId>,
    payload: Payload,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// An NBT tree and the arena owning all of its tags.
#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: TagId,
}

macro_rules! scalar_accessors {
    ($($(#[$meta:meta])* $get:ident, $set:ident, $variant:ident, $ty:ty;)*) => {
        $(
            $(#[$meta])*
            pub fn $get(&self, id: TagId) -> Option<$ty> {
                match self.payload(id)? {
                    Payload::$variant(v) => Some(*v),
                    _ => None,
                }
            }

            pub fn $set(&mut self, id: TagId, value: $ty) -> Result<()> {
                match self.payload_mut(id)? {
                    Payload::$variant(v) => {
                        *v = value;
                        Ok(())
                    }
                    other => Err(Error::TypeMismatch {
                        expected: TagType::$variant,
                        found: other.tag_type(),
                    }),
                }
            }
        )*
    };
}

macro_rules! array_accessors {
    ($($get:ident, $get_mut:ident, $set:ident, $variant:ident, $elem:ty;)*) => {
        $(
            pub fn $get(&self, id: TagId) -> Option<&[$elem]> {
                match self.payload(id)? {
                    Payload::$variant(v) => Some(v.as_slice()),
                    _ => None,
                }
            }

            /// In-place access, for filling large arrays without a copy.
            pub fn $get_mut(&mut self, id: TagId) -> Option<&mut Vec<$elem>> {
                match self.payload_mut(id).ok()? {
                    Payload::$variant(v) => Some(v),
                    _ => None,
                }
            }

            /// Replaces the array with a copy of `value`.
            pub fn $set(&mut self, id: TagId, value: &[$elem]) -> Result<()> {
                match self.payload_mut(id)? {
                    Payload::$variant(v) => {
                        *v = value.to_vec();
                        Ok(())
                    }
                    other => Err(Error::TypeMismatch {
                        expected: TagType::$variant,
                        found: other.tag_type(),
                    }),
                }
            }
        )*
    };
}

impl Document {
    /// Creates a document whose root is an empty, empty-named Compound.
    pub fn new() -> Self {
        let mut doc = Self::bare();
        doc.root = doc.alloc(Node {
            name: Some(Vec::new()),
            parent: None,
            payload: Payload::Compound(Vec::new()),
        });
        doc
    }

    /// Document with no root yet; the decoder fills it in.
    fn bare() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: TagId {
                index: u32::MAX,
                generation: 0,
            },
        }
    }

    pub fn root(&self) -> TagId {
        self.root
    }

    /// Number of live tags in the arena.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn alloc(&mut self, node: Node) -> TagId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            TagId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            TagId {
                index,
                generation: 0,
            }
        }
    }

    fn node(&self, id: TagId) -> Option<&Node> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn node_mut(&mut self, id: TagId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    fn live(&self, id: TagId) -> Result<&Node> {
        self.node(id).ok_or(Error::StaleTag)
    }

    fn payload_mut(&mut self, id: TagId) -> Result<&mut Payload> {
        self.node_mut(id)
            .map(|n| &mut n.payload)
            .ok_or(Error::StaleTag)
    }

    /// Frees `id` and everything below it. The caller must already have
    /// unlinked `id` from its parent.
    fn release(&mut self, id: TagId) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let Some(slot) = self.slots.get_mut(id.index as usize) else {
                continue;
            };
            if slot.generation != id.generation {
                continue;
            }
            let Some(node) = slot.node.take() else {
                continue;
            };
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index);
            match node.payload {
                Payload::Compound(children) => stack.extend(children),
                Payload::List(list) => stack.extend(list.items),
                _ => {}
            }
        }
    }

    /// Checks that `child` may become a child of `parent`.
    fn check_attachable(&self, parent: TagId, child: TagId) -> Result<()> {
        let node = self.live(child)?;
        if node.parent.is_some() {
            return Err(Error::AlreadyAttached);
        }
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(Error::WouldCycle);
            }
            cursor = self.live(id)?.parent;
        }
        if child == self.root {
            return Err(Error::WouldCycle);
        }
        Ok(())
    }

    // --- construction ---

    /// Allocates a free-standing, unnamed tag with an empty payload.
    ///
    /// Lists must be created with [`Document::new_list`] because their
    /// element type is fixed at creation.
    pub fn new_tag(&mut self, ty: TagType) -> Result<TagId> {
        let payload = Payload::zeroed(ty)?;
        Ok(self.alloc(Node {
            name: None,
            parent: None,
            payload,
        }))
    }

    /// Allocates a free-standing, empty list of `element` tags.
    pub fn new_list(&mut self, element: TagType) -> Result<TagId> {
        if element == TagType::End {
            return Err(Error::EndList);
        }
        Ok(self.alloc(Node {
            name: None,
            parent: None,
            payload: Payload::List(ListPayload {
                element,
                items: Vec::new(),
            }),
        }))
    }

    // --- inspection ---

    pub fn tag_type(&self, id: TagId) -> Option<TagType> {
        self.payload(id).map(Payload::tag_type)
    }

    pub fn payload(&self, id: TagId) -> Option<&Payload> {
        self.node(id).map(|n| &n.payload)
    }

    pub fn name(&self, id: TagId) -> Option<&[u8]> {
        self.node(id)?.name.as_deref()
    }

    pub fn name_str(&self, id: TagId) -> Option<&str> {
        std::str::from_utf8(self.name(id)?).ok()
    }

    pub fn parent(&self, id: TagId) -> Option<TagId> {
        self.node(id)?.parent
    }

    scalar_accessors! {
        get_byte, set_byte, Byte, i8;
        get_short, set_short, Short, i16;
        get_int, set_int, Int, i32;
        get_long, set_long, Long, i64;
        get_float, set_float, Float, f32;
        get_double, set_double, Double, f64;
    }

    array_accessors! {
        byte_array, byte_array_mut, set_byte_array, ByteArray, u8;
        int_array, int_array_mut, set_int_array, IntArray, i32;
        long_array, long_array_mut, set_long_array, LongArray, i64;
    }

    pub fn string(&self, id: TagId) -> Option<&[u8]> {
        match self.payload(id)? {
            Payload::String(s) => Some(s.as_slice()),
            _ => None,
        }
    }

    pub fn string_str(&self, id: TagId) -> Option<&str> {
        std::str::from_utf8(self.string(id)?).ok()
    }

    pub fn set_string(&mut self, id: TagId, value: impl AsRef<[u8]>) -> Result<()> {
        match self.payload_mut(id)? {
            Payload::String(s) => {
                *s = value.as_ref().to_vec();
                Ok(())
            }
            other => Err(Error::TypeMismatch {
                expected: TagType::String,
                found: other.tag_type(),
            }),
        }
    }

    // --- compounds ---

    pub fn compound_children(&self, id: TagId) -> Option<&[TagId]> {
        match self.payload(id)? {
            Payload::Compound(children) => Some(children.as_slice()),
            _ => None,
        }
    }

    fn compound_position(&self, parent: TagId, name: &[u8]) -> Option<usize> {
        self.compound_children(parent)?
            .iter()
            .position(|&c| self.name(c) == Some(name))
    }

    /// Finds the child of `parent` called `name`.
    pub fn compound_get(&self, parent: TagId, name: impl AsRef<[u8]>) -> Option<TagId> {
        let idx = self.compound_position(parent, name.as_ref())?;
        self.compound_children(parent).map(|c| c[idx])
    }

    /// Names `child` and appends it to `parent`, replacing (and freeing) any
    /// existing child of the same name.
    pub fn compound_set(
        &mut self,
        parent: TagId,
        name: impl AsRef<[u8]>,
        child: TagId,
    ) -> Result<()> {
        let found = self.live(parent)?.payload.tag_type();
        if found != TagType::Compound {
            return Err(Error::TypeMismatch {
                expected: TagType::Compound,
                found,
            });
        }
        self.check_attachable(parent, child)?;

        let name = name.as_ref();
        self.compound_delete(parent, name)?;

        let node = self.node_mut(child).ok_or(Error::StaleTag)?;
        node.name = Some(name.to_vec());
        node.parent = Some(parent);
        if let Payload::Compound(children) = self.payload_mut(parent)? {
            children.push(child);
        }
        Ok(())
    }

    /// Removes and frees the child called `name`. Absent names are ignored.
    pub fn compound_delete(&mut self, parent: TagId, name: impl AsRef<[u8]>) -> Result<()> {
        let found = self.live(parent)?.payload.tag_type();
        if found != TagType::Compound {
            return Err(Error::TypeMismatch {
                expected: TagType::Compound,
                found,
            });
        }
        let Some(idx) = self.compound_position(parent, name.as_ref()) else {
            return Ok(());
        };
        let removed = match self.payload_mut(parent)? {
            Payload::Compound(children) => children.remove(idx),
            _ => return Ok(()),
        };
        self.release(removed);
        Ok(())
    }

    // --- lists ---

    fn list(&self, id: TagId) -> Result<&ListPayload> {
        match &self.live(id)?.payload {
            Payload::List(list) => Ok(list),
            other => Err(Error::TypeMismatch {
                expected: TagType::List,
                found: other.tag_type(),
            }),
        }
    }

    fn list_mut(&mut self, id: TagId) -> Result<&mut ListPayload> {
        match self.payload_mut(id)? {
            Payload::List(list) => Ok(list),
            other => Err(Error::TypeMismatch {
                expected: TagType::List,
                found: other.tag_type(),
            }),
        }
    }

    pub fn list_element_type(&self, id: TagId) -> Option<TagType> {
        self.list(id).ok().map(|l| l.element)
    }

    pub fn list_items(&self, id: TagId) -> Option<&[TagId]> {
        self.list(id).ok().map(|l| l.items.as_slice())
    }

    pub fn list_len(&self, id: TagId) -> Option<usize> {
        self.list(id).ok().map(|l| l.items.len())
    }

    pub fn list_get(&self, id: TagId, idx: usize) -> Option<TagId> {
        self.list(id).ok()?.items.get(idx).copied()
    }

    fn check_element(&self, list: TagId, tag: TagId) -> Result<()> {
        let element = self.list(list)?.element;
        let found = self.live(tag)?.payload.tag_type();
        if found != element {
            return Err(Error::TypeMismatch {
                expected: element,
                found,
            });
        }
        self.check_attachable(list, tag)
    }

    /// Appends `tag` to `list`; its type must match the list's element type.
    pub fn list_append(&mut self, list: TagId, tag: TagId) -> Result<()> {
        self.check_element(list, tag)?;
        if let Some(node) = self.node_mut(tag) {
            node.name = None;
            node.parent = Some(list);
        }
        self.list_mut(list)?.items.push(tag);
        Ok(())
    }

    /// Replaces element `idx` with `tag`, freeing the previous element.
    pub fn list_set(&mut self, list: TagId, idx: usize, tag: TagId) -> Result<()> {
        let len = self.list(list)?.items.len();
        if idx >= len {
            return Err(Error::IndexOutOfBounds { index: idx, len });
        }
        self.check_element(list, tag)?;
        if let Some(node) = self.node_mut(tag) {
            node.name = None;
            node.parent = Some(list);
        }
        let old = std::mem::replace(&mut self.list_mut(list)?.items[idx], tag);
        self.release(old);
        Ok(())
    }

    /// Frees every element, leaving an empty list of the same element type.
    pub fn list_nuke(&mut self, list: TagId) -> Result<()> {
        let items = std::mem::take(&mut self.list_mut(list)?.items);
        for item in items {
            self.release(item);
        }
        Ok(())
    }

    /// Resizes `list` to `len` elements. New elements are zero-valued tags of
    /// the element type (empty lists of Compound when the element type is
    /// List); surplus elements are freed.
    pub fn list_set_size(&mut self, list: TagId, len: usize) -> Result<()> {
        let element = self.list(list)?.element;
        let current = self.list(list)?.items.len();
        if len < current {
            let surplus = self.list_mut(list)?.items.split_off(len);
            for item in surplus {
                self.release(item);
            }
            return Ok(());
        }
        let mut fresh = Vec::with_capacity(len - current);
        for _ in current..len {
            let payload = match element {
                TagType::List => Payload::List(ListPayload {
                    element: TagType::Compound,
                    items: Vec::new(),
                }),
                ty => Payload::zeroed(ty)?,
            };
            fresh.push(self.alloc(Node {
                name: None,
                parent: Some(list),
                payload,
            }));
        }
        self.list_mut(list)?.items.extend(fresh);
        Ok(())
    }

    // --- whole-tree helpers ---

    /// Structural equality of the subtree at `a` in `self` with the subtree at
    /// `b` in `other`: same types, names, values and child order. Floats are
    /// compared bit for bit.
    pub fn subtree_eq(&self, a: TagId, other: &Document, b: TagId) -> bool {
        let (Some(na), Some(nb)) = (self.node(a), other.node(b)) else {
            return false;
        };
        if na.name != nb.name {
            return false;
        }
        match (&na.payload, &nb.payload) {
            (Payload::Float(x), Payload::Float(y)) => x.to_bits() == y.to_bits(),
            (Payload::Double(x), Payload::Double(y)) => x.to_bits() == y.to_bits(),
            (Payload::Compound(xs), Payload::Compound(ys)) => {
                xs.len() == ys.len()
                    && xs.iter().zip(ys).all(|(&x, &y)| self.subtree_eq(x, other, y))
            }
            (Payload::List(xs), Payload::List(ys)) => {
                xs.element == ys.element
                    && xs.items.len() == ys.items.len()
                    && xs
                        .items
                        .iter()
                        .zip(&ys.items)
                        .all(|(&x, &y)| self.subtree_eq(x, other, y))
            }
            (x, y) => x == y,
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.subtree_eq(self.root, other, other.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_has_empty_compound_root() {
        let doc = Document::new();
        assert_eq!(doc.tag_type(doc.root()), Some(TagType::Compound));
        assert_eq!(doc.name(doc.root()), Some(&b""[..]));
        assert_eq!(doc.compound_children(doc.root()).map(<[_]>::len), Some(0));
    }

    #[test]
    fn test_setter_type_mismatch_leaves_tag_alone() {
        let mut doc = Document::new();
        let tag = doc.new_tag(TagType::Int).unwrap();
        doc.set_int(tag, 7).unwrap();

        let err = doc.set_short(tag, 3).unwrap_err();
        assert!(matches!(
            err,
            Error::TypeMismatch { expected: TagType::Short, found: TagType::Int }
        ));
        assert_eq!(doc.get_int(tag), Some(7));
        assert_eq!(doc.get_short(tag), None);
    }

    #[test]
    fn test_compound_set_replaces_same_name() {
        let mut doc = Document::new();
        let root = doc.root();
        for v in 0..5 {
            let tag = doc.new_tag(TagType::Int).unwrap();
            doc.set_int(tag, v).unwrap();
            doc.compound_set(root, "X", tag).unwrap();
        }
        let children = doc.compound_children(root).unwrap();
        assert_eq!(children.len(), 1);
        let x = doc.compound_get(root, "X").unwrap();
        assert_eq!(doc.get_int(x), Some(4));
        // four replaced tags went back to the free list
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_compound_set_keeps_insertion_order() {
        let mut doc = Document::new();
        let root = doc.root();
        for name in ["b", "a", "c"] {
            let tag = doc.new_tag(TagType::Byte).unwrap();
            doc.compound_set(root, name, tag).unwrap();
        }
        let again = doc.new_tag(TagType::Byte).unwrap();
        doc.compound_set(root, "b", again).unwrap();

        let names: Vec<_> = doc
            .compound_children(root)
            .unwrap()
            .iter()
            .map(|&c| doc.name_str(c).unwrap().to_string())
            .collect();
        assert_eq!(names, ["a", "c", "b"]);
    }

    #[test]
    fn test_compound_delete_absent_is_ok() {
        let mut doc = Document::new();
        let root = doc.root();
        doc.compound_delete(root, "missing").unwrap();

        let tag = doc.new_tag(TagType::String).unwrap();
        doc.compound_set(root, "s", tag).unwrap();
        doc.compound_delete(root, "s").unwrap();
        assert!(doc.compound_get(root, "s").is_none());
        assert!(doc.tag_type(tag).is_none(), "deleted handle must go stale");
        assert!(matches!(doc.set_string(tag, "x"), Err(Error::StaleTag)));
    }

    #[test]
    fn test_stale_handle_does_not_alias_reused_slot() {
        let mut doc = Document::new();
        let root = doc.root();
        let old = doc.new_tag(TagType::Int).unwrap();
        doc.compound_set(root, "a", old).unwrap();
        doc.compound_delete(root, "a").unwrap();

        let fresh = doc.new_tag(TagType::Int).unwrap();
        doc.set_int(fresh, 99).unwrap();
        assert_eq!(doc.get_int(old), None);
        assert_eq!(doc.get_int(fresh), Some(99));
    }

    #[test]
    fn test_list_type_safety() {
        let mut doc = Document::new();
        let list = doc.new_list(TagType::Int).unwrap();
        let a = doc.new_tag(TagType::Int).unwrap();
        doc.list_append(list, a).unwrap();

        let wrong = doc.new_tag(TagType::Short).unwrap();
        assert!(doc.list_append(list, wrong).is_err());
        assert!(doc.list_set(list, 0, wrong).is_err());
        assert_eq!(doc.list_items(list), Some(&[a][..]));
        assert_eq!(doc.parent(wrong), None);
    }

    #[test]
    fn test_list_set_out_of_bounds() {
        let mut doc = Document::new();
        let list = doc.new_list(TagType::Byte).unwrap();
        let b = doc.new_tag(TagType::Byte).unwrap();
        assert!(matches!(
            doc.list_set(list, 0, b),
            Err(Error::IndexOutOfBounds { index: 0, len: 0 })
        ));
    }

    #[test]
    fn test_list_set_replaces_and_frees() {
        let mut doc = Document::new();
        let list = doc.new_list(TagType::Long).unwrap();
        doc.list_set_size(list, 3).unwrap();
        let old = doc.list_get(list, 1).unwrap();
        let new = doc.new_tag(TagType::Long).unwrap();
        doc.set_long(new, -1).unwrap();
        doc.list_set(list, 1, new).unwrap();

        assert_eq!(doc.list_get(list, 1), Some(new));
        assert_eq!(doc.get_long(old), None);
        assert_eq!(doc.list_len(list), Some(3));
    }

    #[test]
    fn test_list_nuke_empties_list() {
        let mut doc = Document::new();
        let list = doc.new_list(TagType::Compound).unwrap();
        for _ in 0..4 {
            let c = doc.new_tag(TagType::Compound).unwrap();
            let inner = doc.new_tag(TagType::Int).unwrap();
            doc.compound_set(c, "id", inner).unwrap();
            doc.list_append(list, c).unwrap();
        }
        let before = doc.len();
        doc.list_nuke(list).unwrap();
        assert_eq!(doc.list_len(list), Some(0));
        assert_eq!(doc.list_element_type(list), Some(TagType::Compound));
        assert_eq!(doc.len(), before - 8);
    }

    #[test]
    fn test_list_set_size_shrinks_and_grows() {
        let mut doc = Document::new();
        let list = doc.new_list(TagType::String).unwrap();
        doc.list_set_size(list, 5).unwrap();
        assert_eq!(doc.list_len(list), Some(5));
        let first = doc.list_get(list, 0).unwrap();
        assert_eq!(doc.string(first), Some(&b""[..]));

        doc.list_set_size(list, 2).unwrap();
        assert_eq!(doc.list_len(list), Some(2));

        // appending past a pre-sized length is fine
        let extra = doc.new_tag(TagType::String).unwrap();
        doc.list_append(list, extra).unwrap();
        assert_eq!(doc.list_len(list), Some(3));
    }

    #[test]
    fn test_end_typed_tags_rejected() {
        let mut doc = Document::new();
        assert!(matches!(doc.new_tag(TagType::End), Err(Error::EndTag)));
        assert!(matches!(doc.new_list(TagType::End), Err(Error::EndList)));
        assert!(matches!(
            doc.new_tag(TagType::List),
            Err(Error::ListWithoutElementType)
        ));
    }

    #[test]
    fn test_attach_twice_or_cycle_rejected() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.new_tag(TagType::Compound).unwrap();
        let b = doc.new_tag(TagType::Compound).unwrap();
        doc.compound_set(a, "b", b).unwrap();

        assert!(matches!(doc.compound_set(root, "b", b), Err(Error::AlreadyAttached)));
        assert!(matches!(doc.compound_set(b, "a", a), Err(Error::WouldCycle)));
        assert!(matches!(doc.compound_set(a, "self", a), Err(Error::WouldCycle)));
        assert!(matches!(doc.compound_set(a, "root", root), Err(Error::WouldCycle)));
    }

    #[test]
    fn test_array_setters_copy() {
        let mut doc = Document::new();
        let tag = doc.new_tag(TagType::ByteArray).unwrap();
        let mut source = vec![1u8, 2, 3];
        doc.set_byte_array(tag, &source).unwrap();
        source[0] = 9;
        assert_eq!(doc.byte_array(tag), Some(&[1u8, 2, 3][..]));

        doc.byte_array_mut(tag).unwrap().fill(4);
        assert_eq!(doc.byte_array(tag), Some(&[4u8, 4, 4][..]));
        assert!(doc.set_int_array(tag, &[1]).is_err());
    }
}
