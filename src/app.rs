//! The application object: ties together configuration discovery, the
//! invocation parser and the command registry.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use const_format::concatcp;
use directories::ProjectDirs;
use log::debug;

use crate::cmd::{print_err, Cmd, Commands, Io, FAILURE_CODE, SUCCESS_CODE};
use crate::cmd::completion::list_projects;
use crate::tracker::{Config, Invocation, Project, Result, TrackerError};
use crate::APP_NAME;

/// Marker appended to the argument a completion request points into.
pub const COMPL_CURSOR_MARK: &str = "::cursor::";

const USAGE: &str = concatcp!(
    "Usage: ",
    APP_NAME,
    " [--help|-h] [--version|-v] [.<project>] [key[+]=value...] [command [args...]]"
);

pub struct App {
    invocation: Invocation,
    global: Rc<Config>,
    projects_dir: PathBuf,
    commands: Commands,
}

impl App {
    /// Creates the application from raw arguments (without the program
    /// name), locating the configuration root the XDG way.
    pub fn new(args: Vec<String>) -> Result<Self> {
        let dirs = ProjectDirs::from("", "", APP_NAME).ok_or_else(|| {
            TrackerError::General("Failed to locate the home directory".to_string())
        })?;
        Self::with_config_dir(dirs.config_dir().to_path_buf(), args)
    }

    /// Creates the application against an explicit configuration root.
    pub fn with_config_dir(config_dir: PathBuf, args: Vec<String>) -> Result<Self> {
        let defaults = Rc::new(default_config()?);
        let global = Rc::new(Config::with_parent(config_dir.join("config"), defaults));
        let projects_dir = config_dir.join("projects");

        let mut invocation = Invocation::new();
        invocation.set_cmd_line(args);
        invocation.set_def_cmd_line(global.get("core.defcmd")?);
        invocation.set_def_prj_name(global.get_or("core.defprj", "")?);

        Ok(Self {
            invocation,
            global,
            projects_dir,
            commands: Commands::new(),
        })
    }

    /// Parses the invocation and executes the selected command. On success
    /// pending configuration and storage changes are flushed; on failure
    /// nothing is.
    pub fn run(&mut self, io: &mut Io) -> i32 {
        self.parse_invocation(false);

        if self.invocation.should_print_help() {
            return self.print_usage(io);
        }
        if self.invocation.should_print_version() {
            let _ = writeln!(io.out, "{}", env!("CARGO_PKG_VERSION"));
            return SUCCESS_CODE;
        }

        let cmd_name = self.invocation.cmd_name().to_string();
        let cmd = match self.commands.get(&cmd_name) {
            Some(cmd) => cmd,
            None => {
                let _ = writeln!(io.err, "Unknown command name: {}", cmd_name);
                return FAILURE_CODE;
            }
        };
        let args = self.invocation.cmd_args().to_vec();
        debug!("running {} with {} argument(s)", cmd_name, args.len());

        if let Some(result) = cmd.run_app(self, io, &args) {
            return match result {
                Ok(code) if code == SUCCESS_CODE => self.flush_global(io, code),
                Ok(code) => code,
                Err(e) => {
                    print_err(io, &e);
                    FAILURE_CODE
                }
            };
        }

        let mut project = match self.open_project(&self.invocation.prj_name()) {
            Ok(project) => project,
            Err(e) => {
                print_err(io, &e);
                return FAILURE_CODE;
            }
        };

        match cmd.run_project(self, &mut project, io, &args) {
            Some(Ok(code)) if code == SUCCESS_CODE => {
                if let Err(e) = project.save() {
                    print_err(io, &e);
                    return FAILURE_CODE;
                }
                self.flush_global(io, code)
            }
            Some(Ok(code)) => code,
            Some(Err(e)) => {
                print_err(io, &e);
                FAILURE_CODE
            }
            None => {
                let _ = writeln!(io.err, "Command is not applicable here: {}", cmd_name);
                FAILURE_CODE
            }
        }
    }

    /// Lists completion candidates for a command line with a cursor mark.
    pub fn complete(&mut self, args: Vec<String>, io: &mut Io) -> Result<i32> {
        self.invocation.set_cmd_line(args);
        self.parse_invocation(true);

        let composition = self.invocation.composition().to_string();

        let names: Vec<String> = if self.invocation.prj_name().ends_with(COMPL_CURSOR_MARK) {
            list_projects(&self.projects_dir)?
                .into_iter()
                .map(|name| format!(".{}", name))
                .collect()
        } else if composition.is_empty() {
            Invocation::opts().iter().map(|s| s.to_string()).collect()
        } else if composition.ends_with(COMPL_CURSOR_MARK) {
            let mut names = complete_cmd_name(&composition, self.known_command_names()?);
            names.extend(Invocation::opts().iter().map(|s| s.to_string()));
            names
        } else {
            return self.complete_cmd(io);
        };

        let names: BTreeSet<String> = names.into_iter().collect();
        for name in names {
            writeln!(io.out, "{}", name)?;
        }

        Ok(SUCCESS_CODE)
    }

    pub fn global_config(&self) -> &Config {
        &self.global
    }

    pub fn global_config_rc(&self) -> &Rc<Config> {
        &self.global
    }

    pub fn projects_dir(&self) -> &Path {
        &self.projects_dir
    }

    /// Name of the project this invocation acts on.
    pub fn default_project(&self) -> String {
        self.invocation.prj_name()
    }

    pub fn commands(&self) -> &Commands {
        &self.commands
    }

    /// Opens an existing project, layering invocation overrides on top of
    /// its configuration.
    pub fn open_project(&self, name: &str) -> Result<Project> {
        if name.is_empty() {
            return Err(TrackerError::General("No project specified".to_string()));
        }

        let project = Project::new(
            self.projects_dir.join(name),
            Some(Rc::clone(&self.global)),
        );
        if !project.exists() {
            return Err(TrackerError::General(format!(
                "Project does not exist: {}",
                name
            )));
        }

        for (key, value) in self.invocation.confs() {
            let mut key = key.clone();
            let mut value = value.clone();

            // A trailing + on the key means appending to the current value.
            if key.ends_with('+') {
                key.pop();
                value = format!("{}{}", project.config(true).get_or(&key, "")?, value);
            }
            project.config(true).set(&key, &value)?;
        }

        Ok(project)
    }

    fn parse_invocation(&mut self, completion: bool) {
        let global = Rc::clone(&self.global);
        self.invocation.parse(
            move |name| {
                global
                    .get_or(&format!("alias.{}", name), "")
                    .unwrap_or_default()
            },
            completion,
        );
    }

    fn complete_cmd(&mut self, io: &mut Io) -> Result<i32> {
        let mut project = self.open_project(&self.invocation.prj_name())?;

        let mut args = self.invocation.cmd_args().to_vec();
        if let Some(last) = args.last_mut() {
            if let Some(stripped) = last.strip_suffix(COMPL_CURSOR_MARK) {
                *last = stripped.to_string();
            }
        }

        let cmd = match self.commands.get(self.invocation.cmd_name()) {
            Some(cmd) => cmd,
            None => return Ok(FAILURE_CODE),
        };

        if let Some(result) = cmd.complete_app(self, io, &args) {
            return result;
        }
        if let Some(result) = cmd.complete_project(self, &mut project, io, &args) {
            return result;
        }

        Ok(FAILURE_CODE)
    }

    fn known_command_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .commands
            .list()
            .iter()
            .map(|cmd| cmd.name().to_string())
            .collect();
        names.extend(self.global.list("alias")?);
        Ok(names)
    }

    fn print_usage(&self, io: &mut Io) -> i32 {
        let _ = writeln!(io.out, "{}\n\nsub-commands:", USAGE);
        for cmd in self.commands.list() {
            let _ = writeln!(io.out, "  {} -- {}", cmd.name(), cmd.descr());
        }
        SUCCESS_CODE
    }

    fn flush_global(&self, io: &mut Io, code: i32) -> i32 {
        if let Err(e) = self.global.save() {
            print_err(io, &e);
            return FAILURE_CODE;
        }
        code
    }
}

/// Completion candidates for the command position: all command and alias
/// names, or the remaining ones appended to an unfinished composition.
fn complete_cmd_name(composition: &str, names: Vec<String>) -> Vec<String> {
    let prefix = match composition.rfind('.') {
        Some(dot) => &composition[..dot + 1],
        None => return names,
    };

    let present: BTreeSet<&str> = prefix.trim_end_matches('.').split('.').collect();

    names
        .into_iter()
        .filter(|name| !present.contains(name.as_str()))
        .map(|name| format!("{}{}", prefix, name))
        .collect()
}

fn default_config() -> Result<Config> {
    let config = Config::in_memory(None);
    config.set("core.defcmd", "ls")?;
    config.set("core.defprj", "")?;
    config.set("ui.ls.fmt", "_id,title")?;
    config.set("ui.ls.sort", "title,_id")?;
    config.set("ui.ls.color", "fg-cyan inv bold !heading")?;
    config.set("ui.show.order", "title")?;
    Ok(config)
}
