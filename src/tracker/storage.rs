//! Item storage of one project.
//!
//! Items live under `items/<first-char>/<rest>` so no single directory
//! grows with the project. The directory is scanned lazily on first use and
//! the contents of individual items are read only when they are needed.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use log::debug;
use walkdir::WalkDir;

use crate::tracker::config::Config;
use crate::tracker::error::{io_at, Result, TrackerError};
use crate::tracker::file_format::emit_changes;
use crate::tracker::ids::IdGenerator;
use crate::tracker::item::Item;

pub struct Storage {
    data_dir: PathBuf,
    items: BTreeMap<String, Item>,
    id_generator: IdGenerator,
    loaded: bool,
}

impl Storage {
    /// Seeds the configuration of a new project with id generator state.
    pub fn init(config: &Config, alphabet: &str) -> Result<()> {
        IdGenerator::init(config, alphabet)
    }

    pub fn new(data_dir: PathBuf, config: Rc<Config>) -> Self {
        Self {
            data_dir,
            items: BTreeMap::new(),
            id_generator: IdGenerator::new(config),
            loaded: false,
        }
    }

    /// Creates a new empty item under a fresh id.
    pub fn create(&mut self) -> Result<&mut Item> {
        self.ensure_loaded()?;

        let id = self.id_generator.get_id()?;
        debug!("creating item {}", id);

        match self.items.entry(id.clone()) {
            Entry::Occupied(_) => Err(TrackerError::General(format!(
                "Duplicated item id: {}",
                id
            ))),
            Entry::Vacant(slot) => {
                let item = slot.insert(Item::new_fresh(id));
                self.id_generator.advance_id()?;
                Ok(item)
            }
        }
    }

    /// Retrieves an item by id.
    pub fn get(&mut self, id: &str) -> Result<&mut Item> {
        self.ensure_loaded()?;

        self.items
            .get_mut(id)
            .ok_or_else(|| TrackerError::NotFound(format!("Unknown id: {}", id)))
    }

    /// Snapshot of all items.
    pub fn list(&mut self) -> Result<Vec<&mut Item>> {
        self.ensure_loaded()?;
        Ok(self.items.values_mut().collect())
    }

    pub fn id_generator(&self) -> &IdGenerator {
        &self.id_generator
    }

    /// Writes out every modified item, then the id generator's bookkeeping.
    /// Writing items first means a crash in between leaves the generator
    /// conservative rather than ahead of the data.
    pub fn save(&mut self) -> Result<()> {
        for (id, item) in &mut self.items {
            if !item.was_changed() {
                continue;
            }

            let (shard, rest) = shard_id(id)?;
            let dir = self.data_dir.join(shard);
            fs::create_dir_all(&dir).map_err(|e| io_at(&dir, e))?;

            let path = dir.join(rest);
            fs::write(&path, emit_changes(item.raw_changes())).map_err(|e| io_at(&path, e))?;
            item.mark_saved(path);
        }

        self.id_generator.save()
    }

    fn ensure_loaded(&mut self) -> Result<()> {
        if self.loaded {
            return Ok(());
        }
        self.loaded = true;

        // A project without any items has no data directory.
        if !self.data_dir.is_dir() {
            return Ok(());
        }

        for entry in WalkDir::new(&self.data_dir).min_depth(2).max_depth(2) {
            let entry = entry.map_err(|e| TrackerError::General(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let shard = entry
                .path()
                .parent()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let rest = entry.file_name().to_string_lossy().into_owned();
            let id = format!("{}{}", shard, rest);

            self.items
                .insert(id.clone(), Item::new_existing(id, entry.into_path()));
        }

        debug!(
            "scanned {} items under {}",
            self.items.len(),
            self.data_dir.display()
        );
        Ok(())
    }
}

fn shard_id(id: &str) -> Result<(&str, &str)> {
    match id.char_indices().nth(1) {
        Some((split, _)) => Ok((&id[..split], &id[split..])),
        None => Err(TrackerError::IllegalArgument(format!(
            "Id is too short: {}",
            id
        ))),
    }
}
