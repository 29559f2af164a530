//! The `export` command, which feeds item data to an external consumer.

use std::io::Write;
use std::process::Command as OsCommand;

use crate::app::App;
use crate::cmd::completion::complete_keys;
use crate::cmd::{Cmd, Io, FAILURE_CODE, SUCCESS_CODE};
use crate::tracker::{Item, ItemFilter, Project, Result, TrackerError};

const USAGE: &str = "\
Usage: export (-|cmd) [expr like for ls...]

Either cmd is run once for each item with arguments of the form key=value
or, for -, items are printed to standard output with key=value fields
terminated by a null character and each item also finished by a null
character.";

#[derive(Clone)]
pub struct ExportCmd;

impl Cmd for ExportCmd {
    fn name(&self) -> &'static str {
        "export"
    }

    fn descr(&self) -> &'static str {
        "export item data"
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
        if args.len() <= 1 {
            return Some(Ok(SUCCESS_CODE));
        }
        Some(complete_keys(project.storage(), io.out))
    }
}

fn run(project: &mut Project, io: &mut Io, args: &[String]) -> Result<i32> {
    if args.is_empty() {
        writeln!(io.err, "Expected at least one argument.")?;
        return Ok(FAILURE_CODE);
    }

    let consumer = &args[0];
    let filter = ItemFilter::from_exprs(&args[1..])?;

    for item in project.storage().list()? {
        if filter.passes_item(item)? {
            export_item(consumer, item, io)?;
        }
    }

    Ok(SUCCESS_CODE)
}

fn export_item(consumer: &str, item: &mut Item, io: &mut Io) -> Result<()> {
    let mut records = vec![format!("_id={}", item.id())];
    for key in item.list_record_names()? {
        records.push(format!("{}={}", key, item.value(&key)?));
    }

    // "-" means printing to stdout.
    if consumer == "-" {
        for record in &records {
            write!(io.out, "{}\0", record)?;
        }
        write!(io.out, "\0")?;
        return Ok(());
    }

    let status = OsCommand::new(consumer)
        .args(&records)
        .status()
        .map_err(|e| TrackerError::General(format!("Failed to run {}: {}", consumer, e)))?;

    if !status.success() {
        return Err(TrackerError::General(
            "Exporter client returned an error.".to_string(),
        ));
    }
    Ok(())
}
