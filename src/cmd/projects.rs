//! The `projects` command, which lists known projects.

use std::io::Write;
use std::rc::Rc;

use crate::app::App;
use crate::cmd::completion::list_projects;
use crate::cmd::{style, Cmd, Io, FAILURE_CODE, SUCCESS_CODE};
use crate::tracker::{Project, Result};

#[derive(Clone)]
pub struct ProjectsCmd;

impl Cmd for ProjectsCmd {
    fn name(&self) -> &'static str {
        "projects"
    }

    fn descr(&self) -> &'static str {
        "list projects"
    }

    fn usage(&self) -> &'static str {
        "Usage: projects"
    }

    fn run_app(&self, app: &mut App, io: &mut Io, args: &[String]) -> Option<Result<i32>> {
        Some(run(app, io, args))
    }
}

fn run(app: &mut App, io: &mut Io, args: &[String]) -> Result<i32> {
    if !args.is_empty() {
        writeln!(io.err, "Expected no arguments.")?;
        return Ok(FAILURE_CODE);
    }

    let mut infos = Vec::new();
    for name in list_projects(app.projects_dir())? {
        let project = Project::new(
            app.projects_dir().join(&name),
            Some(Rc::clone(app.global_config_rc())),
        );
        let descr = project.config(false).get_or("prj.descr", "")?;
        infos.push((name, descr));
    }
    infos.sort();

    let current = app.default_project();
    for (name, descr) in infos {
        let marker = if name == current { '*' } else { ' ' };
        let label = style::paint(&style::BOLD, &format!("{}{}", marker, name), io.decorate);
        if descr.is_empty() {
            writeln!(io.out, "{}", label)?;
        } else {
            writeln!(io.out, "{} -- {}", label, descr)?;
        }
    }

    Ok(SUCCESS_CODE)
}
