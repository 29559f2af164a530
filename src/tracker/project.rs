//! A project bundles an item storage with its configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::tracker::config::Config;
use crate::tracker::error::{io_at, Result};
use crate::tracker::storage::Storage;

/// Alphabet used for item ids of newly initialized projects.
pub const DEFAULT_ID_ALPHABET: &str =
    "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub struct Project {
    root: PathBuf,
    storage: Storage,
    config: Rc<Config>,
    proxy: Config,
}

impl Project {
    /// Creates the project directory and seeds its configuration.
    pub fn init(root: impl AsRef<Path>) -> Result<()> {
        let root = root.as_ref();
        fs::create_dir_all(root).map_err(|e| io_at(root, e))?;

        let config = Config::new(root.join("config"));
        Storage::init(&config, DEFAULT_ID_ALPHABET)?;
        config.save()
    }

    /// Opens the project at `root`. The persisted project configuration
    /// falls back to `global`; an in-memory proxy on top of it absorbs
    /// per-invocation overrides without ever being written out.
    pub fn new(root: impl Into<PathBuf>, global: Option<Rc<Config>>) -> Self {
        let root = root.into();

        let config = Rc::new(match global {
            Some(global) => Config::with_parent(root.join("config"), global),
            None => Config::new(root.join("config")),
        });
        let proxy = Config::in_memory(Some(Rc::clone(&config)));
        let storage = Storage::new(root.join("items"), Rc::clone(&config));

        Self {
            root,
            storage,
            config,
            proxy,
        }
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    pub fn name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn storage(&mut self) -> &mut Storage {
        &mut self.storage
    }

    /// The project configuration: the override proxy by default, or the
    /// persisted configuration underneath it.
    pub fn config(&self, proxy: bool) -> &Config {
        if proxy {
            &self.proxy
        } else {
            &self.config
        }
    }

    /// Persists the project. Storage goes first since its save folds id
    /// generator state back into the configuration.
    pub fn save(&mut self) -> Result<()> {
        self.storage.save()?;
        self.config.save()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn init_creates_directory_and_config() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("proj");

        Project::init(&root).unwrap();

        let project = Project::new(root, None);
        assert!(project.exists());
        assert_eq!(
            project.config(false).get("!ids.count").unwrap(),
            "0"
        );
        assert_eq!(project.config(false).get("!ids.next").unwrap().len(), 3);
    }

    #[test]
    fn unknown_directory_does_not_exist() {
        let temp = TempDir::new().unwrap();
        let project = Project::new(temp.path().join("nope"), None);
        assert!(!project.exists());
    }

    #[test]
    fn save_persists_created_items() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("proj");
        Project::init(&root).unwrap();

        let id = {
            let mut project = Project::new(root.clone(), None);
            let item = project.storage().create().unwrap();
            item.set_value_at("title", "hello", 10).unwrap();
            let id = item.id().to_string();
            project.save().unwrap();
            id
        };

        let mut reopened = Project::new(root, None);
        assert_eq!(
            reopened.storage().get(&id).unwrap().value("title").unwrap(),
            "hello"
        );
        assert_eq!(reopened.storage().id_generator().size().unwrap(), 1);
    }

    #[test]
    fn proxy_overrides_do_not_reach_disk() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("proj");
        Project::init(&root).unwrap();

        {
            let mut project = Project::new(root.clone(), None);
            project.config(true).set("ui.ls.fmt", "_id").unwrap();
            assert_eq!(project.config(true).get("ui.ls.fmt").unwrap(), "_id");
            project.save().unwrap();
        }

        let reopened = Project::new(root, None);
        assert!(reopened.config(false).get("ui.ls.fmt").is_err());
    }
}
