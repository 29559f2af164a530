//! The `add` command, which creates new items.

use std::collections::BTreeMap;
use std::io::Write;

use crate::app::App;
use crate::cmd::completion::{complete_assign_keys, complete_values};
use crate::cmd::{edit_value, Cmd, Io, FAILURE_CODE, SUCCESS_CODE};
use crate::tracker::parsing::parse_paired_args;
use crate::tracker::util::{break_into_args, split_at};
use crate::tracker::{Item, ItemFilter, Project, Result};

const USAGE: &str = "\
Usage: add key[+]=value...

Sets values of the new item:

    key=value   --  set value
    key=-       --  set value via external editor
    key+=value  --  append value (from an earlier key=value pair)
    key+=-      --  append value via external editor

Keys listed under defaults.* of the configuration fill in fields that were
not given. The guards.newitem filter, when set, must accept the new item.";

#[derive(Clone)]
pub struct AddCmd;

impl Cmd for AddCmd {
    fn name(&self) -> &'static str {
        "add"
    }

    fn descr(&self) -> &'static str {
        "add new item"
    }

    fn usage(&self) -> &'static str {
        USAGE
    }

    fn run_project(
        &self,
        _app: &App,
        project: &mut Project,
        io: &mut Io,
        args: &[String],
    ) -> Option<Result<i32>> {
        Some(run(project, io, args))
    }

    fn complete_project(
        &self,
        _app: &App,
        project: &mut Project,
        io: &mut Io,
        args: &[String],
    ) -> Option<Result<i32>> {
        Some(complete(project, io, args))
    }
}

fn run(project: &mut Project, io: &mut Io, args: &[String]) -> Result<i32> {
    if args.is_empty() {
        writeln!(io.err, "Expected at least one argument.")?;
        return Ok(FAILURE_CODE);
    }

    let mut fields: BTreeMap<String, String> = BTreeMap::new();

    for arg in parse_paired_args(args) {
        let (mut key, mut value) = split_at(&arg, '=')?;

        let append = key.ends_with('+');
        if append {
            key.pop();
        }

        if let Err(e) = Item::validate_key_name(&key, true) {
            writeln!(io.err, "{}", e)?;
            return Ok(FAILURE_CODE);
        }

        let current = if append {
            fields.get(&key).cloned().unwrap_or_default()
        } else {
            String::new()
        };
        if let Some(edited) = edit_value(&value, &current)? {
            value = edited;
        }

        if append {
            let mut appended = fields.remove(&key).unwrap_or_default();
            if !appended.is_empty() {
                appended.push('\n');
            }
            appended.push_str(&value);
            fields.insert(key, appended);
        } else {
            fields.insert(key, value);
        }
    }

    let config = project.config(true);
    for def_key in config.list("defaults")? {
        if !fields.contains_key(&def_key) {
            fields.insert(def_key.clone(), config.get(&format!("defaults.{}", def_key))?);
        }
    }

    let guard = config.get_or("guards.newitem", "")?;
    let guard_filter = ItemFilter::from_exprs(&break_into_args(&guard))?;
    let mut error = String::new();
    let passed = guard_filter.matches(
        |field| vec![fields.get(field).cloned().unwrap_or_default()],
        Some(&mut error),
    );
    if !passed {
        writeln!(
            io.err,
            "New item doesn't pass the guard: {}\n{}",
            guard, error
        )?;
        return Ok(FAILURE_CODE);
    }

    let item = project.storage().create()?;
    for (key, value) in &fields {
        item.set_value(key, value)?;
    }
    writeln!(io.out, "Created item: {}", item.id())?;

    Ok(SUCCESS_CODE)
}

fn complete(project: &mut Project, io: &mut Io, args: &[String]) -> Result<i32> {
    let parsed = parse_paired_args(args);

    if let (Some(last_raw), Some(last)) = (args.last(), parsed.last()) {
        if let Some((key, value)) = last.split_once('=') {
            if value.is_empty() || value == last_raw.as_str() {
                return complete_values(project.storage(), io.out, key);
            }
        }
    }

    complete_assign_keys(project.storage(), io.out, args)
}
