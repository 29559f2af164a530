//! Candidate listing for shell completion.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::cmd::{FAILURE_CODE, SUCCESS_CODE};
use crate::tracker::{io_at, Item, Project, Result, Storage};

/// Names of the projects under `projects_dir`.
pub fn list_projects(projects_dir: &Path) -> Result<Vec<String>> {
    if !projects_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(projects_dir).map_err(|e| io_at(projects_dir, e))? {
        let entry = entry.map_err(|e| io_at(projects_dir, e))?;
        let project = Project::new(entry.path(), None);
        if project.exists() {
            names.push(project.name());
        }
    }
    Ok(names)
}

pub fn complete_ids(storage: &mut Storage, out: &mut dyn Write) -> Result<i32> {
    for item in storage.list()? {
        writeln!(out, "{}", item.id())?;
    }
    Ok(SUCCESS_CODE)
}

/// Completes keys of a single item, omitting ones already on the command
/// line.
pub fn complete_item_keys(
    item: &mut Item,
    out: &mut dyn Write,
    args: &[String],
) -> Result<i32> {
    let mut keys = item.list_record_names()?;
    for arg in args {
        keys.remove(arg);
    }

    for key in keys {
        writeln!(out, "{}", key)?;
    }
    Ok(SUCCESS_CODE)
}

/// Completes keys across all items of the storage.
pub fn complete_keys(storage: &mut Storage, out: &mut dyn Write) -> Result<i32> {
    for key in all_keys(storage)? {
        writeln!(out, "{}", key)?;
    }
    Ok(SUCCESS_CODE)
}

/// Completes keys across all items in the `key:` form used for assignments,
/// omitting keys already assigned on the command line.
pub fn complete_assign_keys(
    storage: &mut Storage,
    out: &mut dyn Write,
    args: &[String],
) -> Result<i32> {
    let mut keys = all_keys(storage)?;

    for arg in args {
        if let Some(pos) = arg.find('=') {
            if pos != 0 {
                keys.remove(&arg[..pos]);
                continue;
            }
        }
        if let Some(stripped) = arg.strip_suffix(':') {
            if !stripped.is_empty() {
                keys.remove(stripped);
            }
        }
    }

    // The colon form is easier to type because completion appends a space.
    for key in keys {
        writeln!(out, "{}:", key)?;
    }
    Ok(SUCCESS_CODE)
}

/// Completes the values a key currently has across all items.
pub fn complete_values(storage: &mut Storage, out: &mut dyn Write, key: &str) -> Result<i32> {
    if Item::validate_key_name(key, false).is_err() {
        return Ok(FAILURE_CODE);
    }

    let mut values = BTreeSet::new();
    for item in storage.list()? {
        let value = item.value(key)?;
        if !value.is_empty() {
            values.insert(value);
        }
    }

    for value in values {
        writeln!(out, "{}", value)?;
    }
    Ok(SUCCESS_CODE)
}

fn all_keys(storage: &mut Storage) -> Result<BTreeSet<String>> {
    let mut keys = BTreeSet::new();
    for item in storage.list()? {
        keys.extend(item.list_record_names()?);
    }
    Ok(keys)
}
