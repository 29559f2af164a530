//! The `ls` command, which lists items in a table.

use crate::app::App;
use crate::cmd::completion::complete_keys;
use crate::cmd::table::ItemTable;
use crate::cmd::{Cmd, Io, SUCCESS_CODE};
use crate::tracker::{ItemFilter, Project, Result};

const USAGE: &str = "\
Usage: ls [expr...]

Where <expr> is of the form:

    <field> == <value>  --  case sensitive equality comparison
    <field> != <value>  --  case sensitive inequality comparison
    <field>  / <value>  --  case insensitive substring match
    <field> =/ <value>  --  case insensitive substring match
    <field>  # <value>  --  case insensitive substring non-match
    <field> !/ <value>  --  case insensitive substring non-match

For example:

    status==done title/ui
    category!=cli";

#[derive(Clone)]
pub struct LsCmd;

impl Cmd for LsCmd {
    fn name(&self) -> &'static str {
        "ls"
    }

    fn descr(&self) -> &'static str {
        "list items"
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
        _args: &[String],
    ) -> Option<Result<i32>> {
        Some(complete_keys(project.storage(), io.out))
    }
}

fn run(project: &mut Project, io: &mut Io, args: &[String]) -> Result<i32> {
    let config = project.config(true);
    let fmt = config.get_or("ui.ls.fmt", "_id,title")?;
    let sort = config.get_or("ui.ls.sort", "title,_id")?;
    let color = config.get_or("ui.ls.color", "fg-cyan inv bold !heading")?;

    let mut table = ItemTable::new(&fmt, &sort, &color, io.term_width)?;
    let filter = ItemFilter::from_exprs(args)?;

    for item in project.storage().list()? {
        if filter.passes_item(item)? {
            table.append(item)?;
        }
    }

    table.print(io.out, io.decorate)?;

    Ok(SUCCESS_CODE)
}
