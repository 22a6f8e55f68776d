//! `level.dat`: gzip-compressed NBT holding world-wide settings under a
//! `Data` compound.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::nbt::{Document, TagId, TagType};
use crate::region::compression::{self, DECOMPRESS_LIMIT};
use crate::region::discard;

/// Keys created by [`Level::new`], with their types.
const DATA_KEYS: [(&str, TagType); 12] = [
    ("thundering", TagType::Byte),
    ("LastPlayed", TagType::Long),
    ("RandomSeed", TagType::Long),
    ("version", TagType::Int),
    ("Time", TagType::Long),
    ("raining", TagType::Byte),
    ("SpawnX", TagType::Int),
    ("thunderTime", TagType::Int),
    ("SpawnY", TagType::Int),
    ("SpawnZ", TagType::Int),
    ("SizeOnDisk", TagType::Long),
    ("rainTime", TagType::Int),
];

#[derive(Debug)]
pub struct Level {
    doc: Document,
    data: TagId,
}

impl Level {
    /// Builds a level with zeroed settings and an empty name.
    pub fn new() -> Result<Self> {
        let mut doc = Document::new();
        let data = doc.new_tag(TagType::Compound)?;
        doc.compound_set(doc.root(), "Data", data)?;
        for (name, ty) in DATA_KEYS {
            let tag = doc.new_tag(ty)?;
            doc.compound_set(data, name, tag)?;
        }
        let name = doc.new_tag(TagType::String)?;
        doc.compound_set(data, "LevelName", name)?;
        Ok(Self { doc, data })
    }

    pub fn from_document(doc: Document) -> Result<Self> {
        let data = doc
            .compound_get(doc.root(), "Data")
            .filter(|&id| doc.tag_type(id) == Some(TagType::Compound))
            .ok_or(Error::MissingTag("Data"))?;
        Ok(Self { doc, data })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read(path)?;
        let nbt = compression::gunzip(&raw, DECOMPRESS_LIMIT)?;
        let level = Self::from_document(Document::decode(&nbt)?)?;
        log::info!("Loaded level {} ({} bytes of NBT)", path.display(), nbt.len());
        Ok(level)
    }

    /// Writes the level gzip-compressed, through a temp file renamed into
    /// place.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = compression::gzip(&self.doc.to_bytes()?)?;
        let tmp = temp_path(path);
        if let Err(e) = fs::write(&tmp, &bytes).and_then(|_| fs::rename(&tmp, path)) {
            discard(&tmp);
            return Err(e.into());
        }
        log::info!("Saved level {}", path.display());
        Ok(())
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// The `Data` compound.
    pub fn data(&self) -> TagId {
        self.data
    }

    fn key(&self, name: &str) -> Option<TagId> {
        self.doc.compound_get(self.data, name)
    }

    /// Returns the tag `name`, creating it with type `ty` when absent.
    fn key_or_create(&mut self, name: &str, ty: TagType) -> Result<TagId> {
        if let Some(id) = self.key(name) {
            return Ok(id);
        }
        let id = self.doc.new_tag(ty)?;
        self.doc.compound_set(self.data, name, id)?;
        Ok(id)
    }

    pub fn name(&self) -> Option<&str> {
        self.doc.string_str(self.key("LevelName")?)
    }

    pub fn set_name(&mut self, name: &str) -> Result<()> {
        let id = self.key_or_create("LevelName", TagType::String)?;
        self.doc.set_string(id, name)
    }

    pub fn seed(&self) -> Option<i64> {
        self.doc.get_long(self.key("RandomSeed")?)
    }

    pub fn set_seed(&mut self, seed: i64) -> Result<()> {
        let id = self.key_or_create("RandomSeed", TagType::Long)?;
        self.doc.set_long(id, seed)
    }

    pub fn spawn(&self) -> Option<(i32, i32, i32)> {
        Some((
            self.doc.get_int(self.key("SpawnX")?)?,
            self.doc.get_int(self.key("SpawnY")?)?,
            self.doc.get_int(self.key("SpawnZ")?)?,
        ))
    }

    pub fn set_spawn(&mut self, x: i32, y: i32, z: i32) -> Result<()> {
        for (name, v) in [("SpawnX", x), ("SpawnY", y), ("SpawnZ", z)] {
            let id = self.key_or_create(name, TagType::Int)?;
            self.doc.set_int(id, v)?;
        }
        Ok(())
    }

    pub fn time(&self) -> Option<i64> {
        self.doc.get_long(self.key("Time")?)
    }

    pub fn set_time(&mut self, ticks: i64) -> Result<()> {
        let id = self.key_or_create("Time", TagType::Long)?;
        self.doc.set_long(id, ticks)
    }

    /// Milliseconds since the epoch.
    pub fn last_played(&self) -> Option<i64> {
        self.doc.get_long(self.key("LastPlayed")?)
    }

    pub fn set_last_played(&mut self, millis: i64) -> Result<()> {
        let id = self.key_or_create("LastPlayed", TagType::Long)?;
        self.doc.set_long(id, millis)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_level_keys() {
        let level = Level::new().unwrap();
        let doc = level.document();
        for (name, ty) in DATA_KEYS {
            let id = doc.compound_get(level.data(), name).unwrap();
            assert_eq!(doc.tag_type(id), Some(ty), "{}", name);
        }
        assert_eq!(level.name(), Some(""));
        assert_eq!(level.spawn(), Some((0, 0, 0)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("level.dat");

        let mut level = Level::new().unwrap();
        level.set_name("flatland").unwrap();
        level.set_seed(-1234567890123).unwrap();
        level.set_spawn(8, 4, -8).unwrap();
        level.set_time(24000).unwrap();
        level.save(&path).unwrap();
        assert!(!dir.path().join("level.dat.tmp").exists());

        // gzip magic
        let raw = fs::read(&path).unwrap();
        assert_eq!(&raw[..2], &[0x1f, 0x8b]);

        let back = Level::load(&path).unwrap();
        assert_eq!(back.name(), Some("flatland"));
        assert_eq!(back.seed(), Some(-1234567890123));
        assert_eq!(back.spawn(), Some((8, 4, -8)));
        assert_eq!(back.time(), Some(24000));
        assert!(back.document() == level.document());
    }

    #[test]
    fn test_failed_save_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // a non-empty directory where level.dat should go makes the rename fail
        let path = dir.path().join("level.dat");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), b"x").unwrap();

        assert!(Level::new().unwrap().save(&path).is_err());
        assert!(!dir.path().join("level.dat.tmp").exists());
        assert!(path.join("keep").exists());
    }

    #[test]
    fn test_load_requires_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("level.dat");
        let doc = Document::new();
        fs::write(&path, compression::gzip(&doc.to_bytes().unwrap()).unwrap()).unwrap();
        assert!(matches!(Level::load(&path), Err(Error::MissingTag("Data"))));
    }

    #[test]
    fn test_load_rejects_plain_nbt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("level.dat");
        fs::write(&path, Level::new().unwrap().document().to_bytes().unwrap()).unwrap();
        assert!(Level::load(&path).is_err());
    }
}
