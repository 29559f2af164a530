//! The `values` command, which displays all values a key has.

use std::collections::BTreeSet;
use std::io::Write;

use crate::app::App;
use crate::cmd::completion::complete_keys;
use crate::cmd::{Cmd, Io, FAILURE_CODE, SUCCESS_CODE};
use crate::tracker::{Project, Result};

#[derive(Clone)]
pub struct ValuesCmd;

impl Cmd for ValuesCmd {
    fn name(&self) -> &'static str {
        "values"
    }

    fn descr(&self) -> &'static str {
        "display all values of a key"
    }

    fn usage(&self) -> &'static str {
        "Usage: values key"
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
        if args.len() > 1 {
            return Some(Ok(FAILURE_CODE));
        }
        Some(complete_keys(project.storage(), io.out))
    }
}

fn run(project: &mut Project, io: &mut Io, args: &[String]) -> Result<i32> {
    if args.len() != 1 {
        writeln!(io.err, "Expected exactly one argument (key).")?;
        return Ok(FAILURE_CODE);
    }

    let mut values = BTreeSet::new();
    for item in project.storage().list()? {
        let value = item.value(&args[0])?;
        if !value.is_empty() {
            values.insert(value);
        }
    }

    for value in values {
        writeln!(io.out, "{}", value)?;
    }

    Ok(SUCCESS_CODE)
}
