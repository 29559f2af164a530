//! The `show` command, which displays entries of a single item.

use std::collections::HashSet;
use std::io::Write;

use crate::app::App;
use crate::cmd::completion::{complete_ids, complete_item_keys};
use crate::cmd::{format_key, format_value, Cmd, Io, FAILURE_CODE, SUCCESS_CODE};
use crate::tracker::{Project, Result};

#[derive(Clone)]
pub struct ShowCmd;

impl Cmd for ShowCmd {
    fn name(&self) -> &'static str {
        "show"
    }

    fn descr(&self) -> &'static str {
        "display item entries"
    }

    fn usage(&self) -> &'static str {
        "Usage: show id [key...]"
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
        writeln!(io.err, "Expected at least one argument (id).")?;
        return Ok(FAILURE_CODE);
    }

    let order = project.config(true).get_or("ui.show.order", "title")?;
    let ordering: Vec<&str> = order.split(',').filter(|k| !k.is_empty()).collect();

    let filter: HashSet<&str> = args[1..].iter().map(String::as_str).collect();
    let item = project.storage().get(&args[0])?;

    // Fields with a configured position go first.
    for field in &ordering {
        if !filter.is_empty() && !filter.contains(field) {
            continue;
        }

        let value = item.value(field)?;
        if !value.is_empty() {
            print_record(io, field, &value)?;
        }
    }

    for name in item.list_record_names()? {
        if !filter.is_empty() && !filter.contains(name.as_str()) {
            continue;
        }

        if !ordering.contains(&name.as_str()) {
            let value = item.value(&name)?;
            print_record(io, &name, &value)?;
        }
    }

    Ok(SUCCESS_CODE)
}

fn print_record(io: &mut Io, name: &str, value: &str) -> Result<()> {
    let key = format_key(name, io.decorate);
    writeln!(io.out, "{}{}", key, format_value(value))?;
    Ok(())
}

fn complete(project: &mut Project, io: &mut Io, args: &[String]) -> Result<i32> {
    if args.len() <= 1 {
        return complete_ids(project.storage(), io.out);
    }

    match project.storage().get(&args[0]) {
        Ok(item) => complete_item_keys(item, io.out, &args[1..]),
        Err(_) => Ok(FAILURE_CODE),
    }
}
