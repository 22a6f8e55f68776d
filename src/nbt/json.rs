//! Conversion of NBT documents to JSON, for dumps and inspection.
//!
//! Scalars map to numbers, strings to strings, lists to arrays and compounds
//! to objects. Typed arrays become single-key objects (`__byte_array`,
//! `__int_array`, `__long_array`) so they stay distinguishable from lists.

use serde_json::{Map, Number, Value as JsonValue};

use super::{Document, Payload, TagId};

pub fn to_json(doc: &Document) -> JsonValue {
    tag_to_json(doc, doc.root())
}

pub fn tag_to_json(doc: &Document, id: TagId) -> JsonValue {
    let Some(payload) = doc.payload(id) else {
        return JsonValue::Null;
    };
    match payload {
        Payload::Compound(children) => {
            let mut map = Map::new();
            for &child in children {
                let key = String::from_utf8_lossy(doc.name(child).unwrap_or_default()).into_owned();
                map.insert(key, tag_to_json(doc, child));
            }
            JsonValue::Object(map)
        }
        Payload::List(list) => {
            JsonValue::Array(list.items.iter().map(|&i| tag_to_json(doc, i)).collect())
        }
        Payload::String(s) => JsonValue::String(String::from_utf8_lossy(s).into_owned()),
        Payload::Byte(b) => JsonValue::Number((*b).into()),
        Payload::Short(s) => JsonValue::Number((*s).into()),
        Payload::Int(i) => JsonValue::Number((*i).into()),
        Payload::Long(l) => JsonValue::Number((*l).into()),
        Payload::Float(f) => {
            JsonValue::Number(Number::from_f64(*f as f64).unwrap_or(Number::from(0)))
        }
        Payload::Double(d) => JsonValue::Number(Number::from_f64(*d).unwrap_or(Number::from(0))),
        Payload::ByteArray(ba) => tagged_array(
            "__byte_array",
            ba.iter().map(|&b| JsonValue::Number((b as i8).into())),
        ),
        Payload::IntArray(ia) => {
            tagged_array("__int_array", ia.iter().map(|&i| JsonValue::Number(i.into())))
        }
        Payload::LongArray(la) => {
            tagged_array("__long_array", la.iter().map(|&l| JsonValue::Number(l.into())))
        }
    }
}

fn tagged_array(key: &str, values: impl Iterator<Item = JsonValue>) -> JsonValue {
    let mut map = Map::new();
    map.insert(key.to_string(), JsonValue::Array(values.collect()));
    JsonValue::Object(map)
}
