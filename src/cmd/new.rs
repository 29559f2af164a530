//! The `new` command, which creates projects.

use std::io::Write;

use log::info;

use crate::app::App;
use crate::cmd::{Cmd, Io, FAILURE_CODE, SUCCESS_CODE};
use crate::tracker::{Project, Result};

#[derive(Clone)]
pub struct NewCmd;

impl Cmd for NewCmd {
    fn name(&self) -> &'static str {
        "new"
    }

    fn descr(&self) -> &'static str {
        "create project"
    }

    fn usage(&self) -> &'static str {
        "Usage: new project-name"
    }

    fn run_app(&self, app: &mut App, io: &mut Io, args: &[String]) -> Option<Result<i32>> {
        Some(run(app, io, args))
    }
}

fn run(app: &mut App, io: &mut Io, args: &[String]) -> Result<i32> {
    if args.len() != 1 {
        writeln!(io.err, "Expected exactly one argument (project name).")?;
        return Ok(FAILURE_CODE);
    }

    let name = &args[0];
    if name.contains('/') {
        writeln!(io.err, "Project name can't contain slash: {}", name)?;
        return Ok(FAILURE_CODE);
    }

    let root = app.projects_dir().join(name);
    if Project::new(root.clone(), None).exists() {
        writeln!(io.err, "Project already exists: {}", name)?;
        return Ok(FAILURE_CODE);
    }

    Project::init(&root)?;
    info!("initialized project {}", name);

    Ok(SUCCESS_CODE)
}
