//! Indented, human-readable rendering of a document.

use std::fmt;

use super::{Document, Payload, TagId};

impl Document {
    fn dump_tag(&self, f: &mut fmt::Formatter<'_>, id: TagId, depth: usize) -> fmt::Result {
        let Some(payload) = self.payload(id) else {
            return Ok(());
        };
        let indent = depth * 2;
        write!(f, "{:indent$}{}", "", payload.tag_type().label())?;
        if let Some(name) = self.name(id) {
            write!(f, "('{}')", String::from_utf8_lossy(name))?;
        }
        write!(f, ": ")?;
        match payload {
            Payload::Byte(v) => writeln!(f, "{v}"),
            Payload::Short(v) => writeln!(f, "{v}"),
            Payload::Int(v) => writeln!(f, "{v}"),
            Payload::Long(v) => writeln!(f, "{v}"),
            Payload::Float(v) => writeln!(f, "{v}"),
            Payload::Double(v) => writeln!(f, "{v}"),
            Payload::ByteArray(v) => writeln!(f, "[{} bytes]", v.len()),
            Payload::IntArray(v) => writeln!(f, "[{} ints]", v.len()),
            Payload::LongArray(v) => writeln!(f, "[{} longs]", v.len()),
            Payload::String(v) => writeln!(f, "{}", String::from_utf8_lossy(v)),
            Payload::List(list) => {
                writeln!(
                    f,
                    "{} entries of type {}",
                    list.items.len(),
                    list.element.label()
                )?;
                self.dump_children(f, &list.items, depth)
            }
            Payload::Compound(children) => {
                writeln!(f, "{} entries", children.len())?;
                self.dump_children(f, children, depth)
            }
        }
    }

    fn dump_children(
        &self,
        f: &mut fmt::Formatter<'_>,
        children: &[TagId],
        depth: usize,
    ) -> fmt::Result {
        let indent = depth * 2;
        writeln!(f, "{:indent$}{{", "")?;
        for &child in children {
            self.dump_tag(f, child, depth + 1)?;
        }
        writeln!(f, "{:indent$}}}", "")
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.dump_tag(f, self.root, 0)
    }
}
