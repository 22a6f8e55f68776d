//! Dimensions: a directory of region files.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::chunk::SharedChunk;
use crate::error::Result;
use crate::region::{
    RegionFormat, RegionHandle, RegionPos, Region, chunk_to_local, chunk_to_region, lock,
};

/// Region table growth step.
pub const DIM_ALLOC_BATCH: usize = 16;

#[derive(Debug)]
struct DimRegion {
    pos: RegionPos,
    region: RegionHandle,
}

#[derive(Debug)]
pub struct Dimension {
    path: PathBuf,
    regions: Vec<DimRegion>,
}

impl Dimension {
    /// Opens every `r.<x>.<z>.mcr` / `r.<x>.<z>.mca` file in `path`. A
    /// missing directory is an empty dimension.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut dim = Self {
            path: path.as_ref().to_path_buf(),
            regions: Vec::new(),
        };
        let entries = match fs::read_dir(&dim.path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("No directory at {}, empty dimension", dim.path.display());
                return Ok(dim);
            }
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some((pos, _)) = name.to_str().and_then(RegionPos::from_filename) else {
                continue;
            };
            let mut region = Region::open(entry.path())?;
            region.set_pos(pos);
            dim.push(pos, region.into_handle());
        }
        log::info!(
            "Opened dimension {} with {} regions",
            dim.path.display(),
            dim.regions.len()
        );
        Ok(dim)
    }

    /// Creates the directory if needed and returns an empty dimension.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        fs::create_dir_all(&path)?;
        Ok(Self {
            path,
            regions: Vec::new(),
        })
    }

    fn push(&mut self, pos: RegionPos, region: RegionHandle) {
        if self.regions.len() == self.regions.capacity() {
            self.regions.reserve_exact(DIM_ALLOC_BATCH);
        }
        self.regions.push(DimRegion { pos, region });
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn get_region(&self, x: i32, z: i32) -> Option<RegionHandle> {
        let pos = RegionPos::new(x, z);
        self.regions
            .iter()
            .find(|r| r.pos == pos)
            .map(|r| r.region.clone())
    }

    /// Creates a fresh region file at `(x, z)`, replacing the entry for an
    /// existing one. Outstanding handles to the replaced region stay valid.
    pub fn new_region(&mut self, x: i32, z: i32, format: RegionFormat) -> Result<RegionHandle> {
        let pos = RegionPos::new(x, z);
        let path = self.path.join(pos.filename(format));
        let region = Region::create(&path, pos)?.into_handle();

        match self.regions.iter_mut().find(|r| r.pos == pos) {
            Some(entry) => entry.region = region.clone(),
            None => self.push(pos, region.clone()),
        }
        log::debug!("New region {}", path.display());
        Ok(region)
    }

    /// Positions and handles of every region, in discovery order.
    pub fn regions(&self) -> impl Iterator<Item = (RegionPos, RegionHandle)> + '_ {
        self.regions.iter().map(|r| (r.pos, r.region.clone()))
    }

    /// Loads the chunk at world chunk coordinates `(cx, cz)`.
    pub fn get_chunk(&self, cx: i32, cz: i32) -> Result<Option<SharedChunk>> {
        let Some(region) = self.get_region(chunk_to_region(cx), chunk_to_region(cz)) else {
            return Ok(None);
        };
        let region = lock(&region);
        region.get_chunk(chunk_to_local(cx) as usize, chunk_to_local(cz) as usize)
    }

    /// Saves every region. Failures do not stop the remaining saves; the
    /// first one is returned.
    pub fn save(&self) -> Result<()> {
        let mut first = None;
        for entry in &self.regions {
            if let Err(e) = lock(&entry.region).save() {
                log::error!(
                    "Failed to save region ({}, {}) in {}: {}",
                    entry.pos.x,
                    entry.pos.z,
                    self.path.display(),
                    e
                );
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }
}
