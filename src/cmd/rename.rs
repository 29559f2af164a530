//! The `rename` command, which renames a project.

use std::fs;
use std::io::Write;

use crate::app::App;
use crate::cmd::completion::list_projects;
use crate::cmd::{Cmd, Io, FAILURE_CODE, SUCCESS_CODE};
use crate::tracker::{io_at, Project, Result};

#[derive(Clone)]
pub struct RenameCmd;

impl Cmd for RenameCmd {
    fn name(&self) -> &'static str {
        "rename"
    }

    fn descr(&self) -> &'static str {
        "rename a project"
    }

    fn usage(&self) -> &'static str {
        "Usage: rename <old name> <new name>"
    }

    fn run_app(&self, app: &mut App, io: &mut Io, args: &[String]) -> Option<Result<i32>> {
        Some(run(app, io, args))
    }

    fn complete_app(&self, app: &mut App, io: &mut Io, args: &[String]) -> Option<Result<i32>> {
        if args.len() > 2 {
            return Some(Ok(FAILURE_CODE));
        }

        Some(complete(app, io))
    }
}

fn run(app: &mut App, io: &mut Io, args: &[String]) -> Result<i32> {
    if args.len() != 2 {
        writeln!(io.err, "Expected two arguments (old and new project names).")?;
        return Ok(FAILURE_CODE);
    }

    for name in args {
        if name.contains('/') {
            writeln!(io.err, "Project name can't contain slash: {}", name)?;
            return Ok(FAILURE_CODE);
        }
    }

    let src = app.projects_dir().join(&args[0]);
    let dst = app.projects_dir().join(&args[1]);

    if !Project::new(src.clone(), None).exists() {
        writeln!(io.err, "Source project not found.")?;
        return Ok(FAILURE_CODE);
    }
    if Project::new(dst.clone(), None).exists() {
        writeln!(io.err, "Destination project already exists.")?;
        return Ok(FAILURE_CODE);
    }

    fs::rename(&src, &dst).map_err(|e| io_at(&src, e))?;

    Ok(SUCCESS_CODE)
}

fn complete(app: &App, io: &mut Io) -> Result<i32> {
    let mut names = list_projects(app.projects_dir())?;
    names.sort();

    for name in names {
        writeln!(io.out, "{}", name)?;
    }

    Ok(SUCCESS_CODE)
}
