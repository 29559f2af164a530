//! The `log` command, which displays the change history of an item.

use std::collections::{HashMap, HashSet};
use std::io::Write;

use clap::error::ErrorKind;
use clap::Parser;

use crate::app::App;
use crate::cmd::completion::{complete_ids, complete_item_keys};
use crate::cmd::diff::{diff_lines, render};
use crate::cmd::{format_key, format_value, style, Cmd, Io, FAILURE_CODE, SUCCESS_CODE};
use crate::tracker::util::time_to_string;
use crate::tracker::{Change, Project, Result, TrackerError};

/// Displays item changes.
#[derive(Parser, Debug)]
#[command(name = "log", disable_version_flag = true)]
struct LogOpts {
    /// Display when changes happened
    #[arg(short, long)]
    timestamps: bool,

    /// Id of the item
    #[arg(value_name = "ID")]
    id: String,

    /// Keys to limit the log to
    #[arg(value_name = "KEY")]
    keys: Vec<String>,
}

#[derive(Clone)]
pub struct LogCmd;

impl Cmd for LogCmd {
    fn name(&self) -> &'static str {
        "log"
    }

    fn descr(&self) -> &'static str {
        "display item changes"
    }

    fn usage(&self) -> &'static str {
        "Usage: log [--help|-h] [--timestamps|-t] id [key...]"
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
    let opts = match parse_opts(args, io)? {
        Some(opts) => opts,
        None => return Ok(SUCCESS_CODE),
    };

    let keys: HashSet<&str> = opts.keys.iter().map(String::as_str).collect();

    let item = project.storage().get(&opts.id)?;
    let changes: Vec<Change> = item.changes()?.to_vec();

    let mut values: HashMap<&str, &str> = HashMap::new();

    for change in &changes {
        let key = change.key();
        let value = change.value();

        if !keys.is_empty() && !keys.contains(key) {
            continue;
        }

        let at = if opts.timestamps {
            format!(" ({})", time_to_string(change.timestamp()))
        } else {
            String::new()
        };

        let name = format_key(key, io.decorate);
        if value.is_empty() {
            let state = style::paint(&style::RED.bold(), " deleted", io.decorate);
            writeln!(io.out, "{}{}{}", name, state, at)?;
        } else if values.get(key).map_or(true, |prior| prior.is_empty()) {
            let state = style::paint(&style::YELLOW.bold(), " created", io.decorate);
            writeln!(io.out, "{}{}{}{}", name, state, at, format_value(value))?;
        } else {
            let state = style::paint(&style::BLUE.bold(), " changed", io.decorate);
            let prev: Vec<String> = values[key].split('\n').map(str::to_string).collect();
            let curr: Vec<String> = value.split('\n').map(str::to_string).collect();
            let diff = render(&diff_lines(&prev, &curr), io.decorate);
            write!(io.out, "{}{}{}{}", name, state, at, format_value(&diff))?;
        }

        values.insert(key, value);
    }

    Ok(SUCCESS_CODE)
}

fn parse_opts(args: &[String], io: &mut Io) -> Result<Option<LogOpts>> {
    let argv = std::iter::once("log").chain(args.iter().map(String::as_str));
    match LogOpts::try_parse_from(argv) {
        Ok(opts) => Ok(Some(opts)),
        Err(e) if e.kind() == ErrorKind::DisplayHelp => {
            write!(io.out, "{}", e)?;
            Ok(None)
        }
        Err(e) => Err(TrackerError::IllegalArgument(e.to_string())),
    }
}

fn complete(project: &mut Project, io: &mut Io, args: &[String]) -> Result<i32> {
    writeln!(io.out, "--help\n--timestamps\n-h\n-t")?;

    if args.len() <= 1 {
        return complete_ids(project.storage(), io.out);
    }

    match project.storage().get(&args[0]) {
        Ok(item) => complete_item_keys(item, io.out, &args[1..]),
        Err(_) => Ok(FAILURE_CODE),
    }
}
