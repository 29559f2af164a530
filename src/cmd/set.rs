//! The `set` command, which modifies entries of an existing item.

use std::collections::BTreeMap;
use std::io::Write;

use crate::app::App;
use crate::cmd::completion::{complete_assign_keys, complete_ids, complete_values};
use crate::cmd::{edit_value, Cmd, Io, FAILURE_CODE, SUCCESS_CODE};
use crate::tracker::parsing::parse_paired_args;
use crate::tracker::util::split_at;
use crate::tracker::{Item, Project, Result};

const USAGE: &str = "\
Usage: set id key[+]=value...

Sets or appends to values of the item:

    key=value   --  set new value
    key=-       --  set/edit value via external editor
    key+=value  --  append to the old value after a new-line character
    key+=-      --  append value via external editor

For example:

    status=done comment+='This was a hard one.'";

#[derive(Clone)]
pub struct SetCmd;

impl Cmd for SetCmd {
    fn name(&self) -> &'static str {
        "set"
    }

    fn descr(&self) -> &'static str {
        "modify item entries"
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
    if args.len() < 2 {
        writeln!(io.err, "Expected at least two arguments.")?;
        return Ok(FAILURE_CODE);
    }

    let item = project.storage().get(&args[0])?;

    let mut fields: BTreeMap<String, String> = BTreeMap::new();

    for arg in parse_paired_args(&args[1..]) {
        let (mut key, mut value) = split_at(&arg, '=')?;

        let append = key.ends_with('+');
        if append {
            key.pop();
        }

        if let Err(e) = Item::validate_key_name(&key, true) {
            writeln!(io.err, "{}", e)?;
            return Ok(FAILURE_CODE);
        }

        if !fields.contains_key(&key) {
            fields.insert(key.clone(), item.value(&key)?);
        }

        let current = if append {
            String::new()
        } else {
            fields[&key].clone()
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

    for (key, value) in &fields {
        item.set_value(key, value)?;
    }

    Ok(SUCCESS_CODE)
}

fn complete(project: &mut Project, io: &mut Io, args: &[String]) -> Result<i32> {
    if args.len() <= 1 {
        return complete_ids(project.storage(), io.out);
    }

    let rest = &args[1..];
    let parsed = parse_paired_args(rest);
    if let (Some(last_raw), Some(last)) = (rest.last(), parsed.last()) {
        if let Some((key, value)) = last.split_once('=') {
            if value.is_empty() || value == last_raw.as_str() {
                return complete_values(project.storage(), io.out, key);
            }
        }
    }

    complete_assign_keys(project.storage(), io.out, rest)
}
