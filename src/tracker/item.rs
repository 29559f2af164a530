//! A single tracked item.
//!
//! An item is an ordered, append-only log of field changes. The current
//! value of a field is the value of its latest change; an empty value marks
//! the field as removed. Pseudo-fields start with `_` and are read-only:
//! `_id`, `_created` and `_changed` are derived rather than stored.
//!
//! Key names can include only `[-a-zA-Z_0-9]` and can't start with `[-0-9]`.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::tracker::change::Change;
use crate::tracker::error::{corrupt_item, io_at, Result, TrackerError};
use crate::tracker::file_format::parse_changes;
use crate::tracker::parsing::key_name_prefix_len;
use crate::tracker::util::{time_to_string, unix_now};

pub struct Item {
    id: String,
    path: Option<PathBuf>,
    changes: Vec<Change>,
    loaded: bool,
    modified: bool,
}

impl Item {
    /// Checks whether a key name is well formed, and for writes that it does
    /// not name a read-only field.
    pub fn validate_key_name(name: &str, for_write: bool) -> Result<()> {
        let parsed = key_name_prefix_len(name);
        if parsed != name.len() || name.is_empty() {
            return Err(TrackerError::InvalidKeyName {
                key: name.to_string(),
                message: format!("invalid key name at {}", &name[parsed..]),
            });
        }

        if for_write && name.starts_with('_') {
            return Err(TrackerError::InvalidKeyName {
                key: name.to_string(),
                message: "the key is read-only".to_string(),
            });
        }

        Ok(())
    }

    /// An item discovered on disk; its changes are read on first use.
    pub(crate) fn new_existing(id: String, path: PathBuf) -> Self {
        Self {
            id,
            path: Some(path),
            changes: Vec::new(),
            loaded: false,
            modified: false,
        }
    }

    /// A brand-new item. Creation counts as a modification so that the item
    /// reaches disk even if no field is ever set.
    pub(crate) fn new_fresh(id: String) -> Self {
        Self {
            id,
            path: None,
            changes: Vec::new(),
            loaded: true,
            modified: true,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Retrieves the current value of a key, or an empty string if the key
    /// has no value.
    pub fn value(&mut self, key: &str) -> Result<String> {
        Self::validate_key_name(key, false)?;

        if key == "_id" {
            return Ok(self.id.clone());
        }
        if key == "_created" {
            self.ensure_loaded()?;
            return Ok(self
                .changes
                .first()
                .map(|c| time_to_string(c.timestamp()))
                .unwrap_or_default());
        }
        if key == "_changed" {
            self.ensure_loaded()?;
            return Ok(self
                .changes
                .last()
                .map(|c| time_to_string(c.timestamp()))
                .unwrap_or_default());
        }

        self.ensure_loaded()?;
        Ok(match self.latest_change(key) {
            Some(idx) => self.changes[idx].value().to_string(),
            None => String::new(),
        })
    }

    /// Names of the keys that currently have a value.
    pub fn list_record_names(&mut self) -> Result<BTreeSet<String>> {
        self.ensure_loaded()?;

        let mut names = BTreeSet::new();
        for change in &self.changes {
            if change.value().is_empty() {
                names.remove(change.key());
            } else {
                names.insert(change.key().to_string());
            }
        }
        Ok(names)
    }

    /// Sets `key` to `value` using the current time.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        self.set_value_at(key, value, unix_now())
    }

    /// Sets `key` to `value` as of `timestamp`.
    ///
    /// Writing the current value is a no-op. A write at the timestamp of the
    /// key's latest change overwrites that change instead of appending, and
    /// an overwrite that restores the preceding value drops the change
    /// entirely, so an undone edit leaves no trace.
    pub fn set_value_at(&mut self, key: &str, value: &str, timestamp: i64) -> Result<()> {
        Self::validate_key_name(key, true)?;
        self.ensure_loaded()?;

        if let Some(idx) = self.latest_change(key) {
            if self.changes[idx].value() == value {
                return Ok(());
            }

            if self.changes[idx].timestamp() == timestamp {
                self.changes[idx] = Change::new(timestamp, key, value);

                match self.changes[..idx].iter().rposition(|c| c.key() == key) {
                    Some(prev) if self.changes[prev].value() == value => {
                        self.changes.remove(idx);
                    }
                    None if value.is_empty() => {
                        self.changes.remove(idx);
                    }
                    _ => {}
                }

                self.modified = true;
                return Ok(());
            }
        } else if value.is_empty() {
            return Ok(());
        }

        self.changes.push(Change::new(timestamp, key, value));
        self.modified = true;
        Ok(())
    }

    /// The full ordered change log.
    pub fn changes(&mut self) -> Result<&[Change]> {
        self.ensure_loaded()?;
        Ok(&self.changes)
    }

    /// Whether the item has in-memory modifications that were not saved.
    pub fn was_changed(&self) -> bool {
        self.modified
    }

    pub(crate) fn raw_changes(&self) -> &[Change] {
        &self.changes
    }

    pub(crate) fn mark_saved(&mut self, path: PathBuf) {
        self.path = Some(path);
        self.modified = false;
    }

    fn latest_change(&self, key: &str) -> Option<usize> {
        self.changes.iter().rposition(|c| c.key() == key)
    }

    fn ensure_loaded(&mut self) -> Result<()> {
        if self.loaded {
            return Ok(());
        }
        self.loaded = true;

        let path = match &self.path {
            Some(path) => path,
            None => return Ok(()),
        };

        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(TrackerError::NotFound(format!(
                    "Change set of item {}",
                    self.id
                )))
            }
            Err(e) => return Err(io_at(path, e)),
        };

        let changes = parse_changes(&text).map_err(|msg| corrupt_item(&self.id, msg))?;

        for pair in changes.windows(2) {
            if pair[0].timestamp() > pair[1].timestamp() {
                return Err(corrupt_item(&self.id, "change set is not sorted"));
            }
        }

        self.changes = changes;
        Ok(())
    }
}
