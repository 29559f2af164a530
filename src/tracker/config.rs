//! Hierarchical key/value configuration.
//!
//! A `Config` maps dotted key paths (`ui.ls.fmt`) to string values and is
//! backed by a TOML file with string leaves. Configs chain: a lookup that
//! finds no non-empty value locally falls through to the parent. Keys whose
//! first segment starts with `!` are reserved for internal bookkeeping and
//! are hidden from listings.
//!
//! Loading is lazy. A missing file is treated as a fresh configuration;
//! a file that exists but does not parse is an error.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::rc::Rc;

use crate::tracker::error::{io_at, Result, TrackerError};

pub struct Config {
    path: Option<PathBuf>,
    parent: Option<Rc<Config>>,
    state: RefCell<State>,
}

#[derive(Default)]
struct State {
    props: BTreeMap<String, String>,
    loaded: bool,
    modified: bool,
}

impl Config {
    /// Creates a configuration backed by `path`, without a parent.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            parent: None,
            state: RefCell::new(State::default()),
        }
    }

    /// Creates a configuration backed by `path` that falls back to `parent`
    /// for unknown or empty keys.
    pub fn with_parent(path: impl Into<PathBuf>, parent: Rc<Config>) -> Self {
        Self {
            path: Some(path.into()),
            parent: Some(parent),
            state: RefCell::new(State::default()),
        }
    }

    /// Creates a configuration with no backing file. `save` is a no-op for
    /// it; it exists to carry per-invocation overrides on top of `parent`.
    pub fn in_memory(parent: Option<Rc<Config>>) -> Self {
        Self {
            path: None,
            parent,
            state: RefCell::new(State {
                loaded: true,
                ..State::default()
            }),
        }
    }

    /// Retrieves the value of `key`. Fails with `NoSuchKey` when the key is
    /// absent here and no ancestor has a non-empty value for it.
    pub fn get(&self, key: &str) -> Result<String> {
        self.ensure_loaded()?;

        let local = self.state.borrow().props.get(key).cloned();
        match &self.parent {
            None => local.ok_or_else(|| TrackerError::NoSuchKey(key.to_string())),
            Some(parent) => match local {
                Some(val) if !val.is_empty() => Ok(val),
                _ => parent.get(key),
            },
        }
    }

    /// Retrieves the value of `key` with the whole parent chain consulted;
    /// `def` is the final fallback. A key that is present but empty is
    /// treated as absent.
    pub fn get_or(&self, key: &str, def: &str) -> Result<String> {
        self.ensure_loaded()?;

        let actual_def = match &self.parent {
            None => def.to_string(),
            Some(parent) => parent.get_or(key, def)?,
        };

        match self.state.borrow().props.get(key) {
            Some(val) if !val.is_empty() => Ok(val.clone()),
            _ => Ok(actual_def),
        }
    }

    /// Lists dotted names of the keys under `path`, relative to it and in
    /// sorted order. Builtin keys and keys whose effective value is empty
    /// are skipped. An entirely absent `path` is delegated to the parent.
    pub fn list(&self, path: &str) -> Result<Vec<String>> {
        self.ensure_loaded()?;

        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{}.", path)
        };

        let local_names: Vec<String> = {
            let state = self.state.borrow();
            state
                .props
                .keys()
                .filter(|key| key.starts_with(&prefix) && key.len() > prefix.len())
                .map(|key| key[prefix.len()..].to_string())
                .collect()
        };

        if !path.is_empty() && local_names.is_empty() && !self.has_key(path) {
            return match &self.parent {
                Some(parent) => parent.list(path),
                None => Ok(Vec::new()),
            };
        }

        let mut names = Vec::new();
        for name in local_names {
            if name.starts_with('!') {
                continue;
            }

            let full = format!("{}{}", prefix, name);
            if !self.get_or(&full, "")?.is_empty() {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Assigns `value` to `key`. Does nothing when the key already resolves
    /// to `value`, so untouched configurations stay unmodified.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_loaded()?;

        if let Ok(current) = self.get(key) {
            if current == value {
                return Ok(());
            }
        }

        let mut state = self.state.borrow_mut();
        state.props.insert(key.to_string(), value.to_string());
        state.modified = true;
        Ok(())
    }

    /// Rewrites the backing file, if there is one and there are changes.
    /// The replacement is written to a temporary file first.
    pub fn save(&self) -> Result<()> {
        if !self.state.borrow().modified {
            return Ok(());
        }

        let path = match &self.path {
            Some(path) => path,
            None => return Ok(()),
        };

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| io_at(dir, e))?;
        }

        let serialized = serialize(&self.state.borrow().props)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, serialized).map_err(|e| io_at(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| io_at(path, e))?;

        self.state.borrow_mut().modified = false;
        Ok(())
    }

    /// Whether there are unsaved changes.
    pub fn is_modified(&self) -> bool {
        self.state.borrow().modified
    }

    fn has_key(&self, key: &str) -> bool {
        self.state.borrow().props.contains_key(key)
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.state.borrow().loaded {
            return Ok(());
        }
        self.state.borrow_mut().loaded = true;

        let path = match &self.path {
            Some(path) => path,
            None => return Ok(()),
        };

        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            // Not having been saved yet is fine.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(io_at(path, e)),
        };

        let value: toml::Value = text.parse().map_err(|e: toml::de::Error| {
            TrackerError::ParseFailed {
                path: path.to_string_lossy().into_owned(),
                message: e.to_string(),
            }
        })?;

        let mut props = BTreeMap::new();
        flatten(&value, "", path, &mut props)?;
        self.state.borrow_mut().props = props;
        Ok(())
    }
}

fn flatten(
    value: &toml::Value,
    at: &str,
    path: &PathBuf,
    props: &mut BTreeMap<String, String>,
) -> Result<()> {
    let table = match value {
        toml::Value::Table(table) => table,
        _ => {
            return Err(TrackerError::ParseFailed {
                path: path.to_string_lossy().into_owned(),
                message: format!("expected a table at {}", at),
            })
        }
    };

    for (name, child) in table {
        if name.contains('.') {
            return Err(TrackerError::ParseFailed {
                path: path.to_string_lossy().into_owned(),
                message: format!("key names must not contain dots: {}", name),
            });
        }

        let full = if at.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", at, name)
        };

        match child {
            toml::Value::String(s) => {
                props.insert(full, s.clone());
            }
            toml::Value::Table(_) => flatten(child, &full, path, props)?,
            _ => {
                return Err(TrackerError::ParseFailed {
                    path: path.to_string_lossy().into_owned(),
                    message: format!("value of {} must be a string", full),
                })
            }
        }
    }

    Ok(())
}

enum Node {
    Leaf(String),
    Group(BTreeMap<String, Node>),
}

/// Renders the flat property map as TOML. Group headers are emitted after
/// the scalar entries of their parent, which is the ordering TOML requires.
fn serialize(props: &BTreeMap<String, String>) -> Result<String> {
    let mut root = BTreeMap::new();

    for (key, value) in props {
        let mut segments: Vec<&str> = key.split('.').collect();
        let leaf = segments.pop().unwrap();

        let mut table = &mut root;
        for segment in segments {
            let entry = table
                .entry(segment.to_string())
                .or_insert_with(|| Node::Group(BTreeMap::new()));
            table = match entry {
                Node::Group(table) => table,
                Node::Leaf(_) => {
                    return Err(TrackerError::InvalidConfiguration(format!(
                        "key {} conflicts with a value at {}",
                        key, segment
                    )))
                }
            };
        }

        if let Some(Node::Group(_)) =
            table.insert(leaf.to_string(), Node::Leaf(value.clone()))
        {
            return Err(TrackerError::InvalidConfiguration(format!(
                "key {} conflicts with a group of the same name",
                key
            )));
        }
    }

    let mut out = String::new();
    emit_group(&mut out, "", &root);
    Ok(out)
}

fn emit_group(out: &mut String, path: &str, table: &BTreeMap<String, Node>) {
    for (name, node) in table {
        if let Node::Leaf(value) = node {
            out.push_str(&format!(
                "{} = {}\n",
                key_repr(name),
                toml::Value::String(value.clone())
            ));
        }
    }

    for (name, node) in table {
        if let Node::Group(group) = node {
            let full = if path.is_empty() {
                key_repr(name)
            } else {
                format!("{}.{}", path, key_repr(name))
            };
            out.push_str(&format!("\n[{}]\n", full));
            emit_group(out, &full, group);
        }
    }
}

fn key_repr(name: &str) -> String {
    let bare = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if bare {
        name.to_string()
    } else {
        toml::Value::String(name.to_string()).to_string()
    }
}
