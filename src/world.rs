//! A whole save directory: `level.dat`, the overworld and the nether.

use std::fs;
use std::path::{Path, PathBuf};

use crate::dim::Dimension;
use crate::error::Result;
use crate::level::Level;

pub const LEVEL_FILE: &str = "level.dat";
pub const OVERWORLD_DIR: &str = "region";
pub const NETHER_DIR: &str = "DIM-1/region";

#[derive(Debug)]
pub struct World {
    dir: PathBuf,
    level: Level,
    overworld: Dimension,
    nether: Option<Dimension>,
}

impl World {
    /// Loads `level.dat` and both dimensions. A world without a nether
    /// directory has no nether.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let level = Level::load(dir.join(LEVEL_FILE))?;
        let overworld = Dimension::open(dir.join(OVERWORLD_DIR))?;
        let nether_dir = dir.join(NETHER_DIR);
        let nether = if nether_dir.is_dir() {
            Some(Dimension::open(nether_dir)?)
        } else {
            None
        };
        log::info!(
            "Opened world {} ({:?}), {} overworld regions",
            dir.display(),
            level.name().unwrap_or_default(),
            overworld.len()
        );
        Ok(Self {
            dir,
            level,
            overworld,
            nether,
        })
    }

    /// Creates the directory layout for a new world with a fresh level and
    /// an empty overworld. Nothing is written until [`World::save`] besides
    /// the directories.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let overworld = Dimension::create(dir.join(OVERWORLD_DIR))?;
        Ok(Self {
            dir,
            level: Level::new()?,
            overworld,
            nether: None,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn overworld(&self) -> &Dimension {
        &self.overworld
    }

    pub fn overworld_mut(&mut self) -> &mut Dimension {
        &mut self.overworld
    }

    pub fn nether(&self) -> Option<&Dimension> {
        self.nether.as_ref()
    }

    /// The nether, created on first use.
    pub fn nether_mut(&mut self) -> Result<&mut Dimension> {
        let nether = match self.nether.take() {
            Some(nether) => nether,
            None => Dimension::create(self.dir.join(NETHER_DIR))?,
        };
        Ok(self.nether.insert(nether))
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn level_mut(&mut self) -> &mut Level {
        &mut self.level
    }

    /// Writes `level.dat` and saves every dimension, returning the first
    /// failure after attempting all of them.
    pub fn save(&self) -> Result<()> {
        let results = [
            self.level.save(self.dir.join(LEVEL_FILE)),
            self.overworld.save(),
            self.nether.as_ref().map_or(Ok(()), Dimension::save),
        ];
        results.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::FlatGenerator;
    use crate::region::{RegionFormat, lock};

    #[test]
    fn test_create_save_open() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("world");

        let mut world = World::create(&root).unwrap();
        world.level_mut().set_name("test").unwrap();
        world.level_mut().set_spawn(0, 5, 0).unwrap();
        let region = world
            .overworld_mut()
            .new_region(0, 0, RegionFormat::McRegion)
            .unwrap();
        let chunk = FlatGenerator::default().generate(0, 0).unwrap();
        lock(&region).set_chunk(1, 2, chunk.into_shared()).unwrap();
        world.save().unwrap();

        assert!(root.join("level.dat").exists());
        assert!(root.join("region/r.0.0.mcr").exists());

        let world = World::open(&root).unwrap();
        assert!(world.nether().is_none());
        assert_eq!(world.level().name(), Some("test"));
        assert_eq!(world.level().spawn(), Some((0, 5, 0)));
        let chunk = world.overworld().get_chunk(1, 2).unwrap().unwrap();
        assert_eq!(lock(&chunk).pos(), Some((1, 2)));
    }

    #[test]
    fn test_nether_is_opened_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let mut world = World::create(dir.path()).unwrap();
        world
            .nether_mut()
            .unwrap()
            .new_region(-1, -1, RegionFormat::McRegion)
            .unwrap();
        world.save().unwrap();

        let world = World::open(dir.path()).unwrap();
        let nether = world.nether().unwrap();
        assert!(nether.get_region(-1, -1).is_some());
        assert!(world.overworld().is_empty());
    }

    #[test]
    fn test_open_without_level_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(World::open(dir.path()).is_err());
    }
}
