//! The `check` command, which verifies that issued ids and stored items
//! agree.

use std::collections::BTreeSet;
use std::io::Write;

use crate::app::App;
use crate::cmd::{Cmd, Io, FAILURE_CODE, SUCCESS_CODE};
use crate::tracker::{Project, Result};

#[derive(Clone)]
pub struct CheckCmd;

impl Cmd for CheckCmd {
    fn name(&self) -> &'static str {
        "check"
    }

    fn descr(&self) -> &'static str {
        "check project consistency"
    }

    fn usage(&self) -> &'static str {
        "Usage: check"
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
}

fn run(project: &mut Project, io: &mut Io, args: &[String]) -> Result<i32> {
    if !args.is_empty() {
        writeln!(io.err, "Expected no arguments.")?;
        return Ok(FAILURE_CODE);
    }

    let storage = project.storage();

    let mut issued = BTreeSet::new();
    storage.id_generator().for_each_id(|id| {
        issued.insert(id.to_string());
    })?;

    let present: BTreeSet<String> = storage
        .list()?
        .iter()
        .map(|item| item.id().to_string())
        .collect();

    let mut broken = false;
    for id in issued.difference(&present) {
        writeln!(io.out, "No item for issued id: {}", id)?;
        broken = true;
    }
    for id in present.difference(&issued) {
        writeln!(io.out, "Item id was never issued: {}", id)?;
        broken = true;
    }

    Ok(if broken { FAILURE_CODE } else { SUCCESS_CODE })
}
