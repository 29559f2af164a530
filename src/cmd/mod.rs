//! Sub-command implementations and their support code.

use std::io::Write;

use enum_dispatch::enum_dispatch;

use crate::app::App;
use crate::tracker::{Project, Result, TrackerError};

pub use self::add::AddCmd;
pub use self::check::CheckCmd;
pub use self::complete::CompleteCmd;
pub use self::config::ConfigCmd;
pub use self::export::ExportCmd;
pub use self::help::HelpCmd;
pub use self::log::LogCmd;
pub use self::ls::LsCmd;
pub use self::new::NewCmd;
pub use self::projects::ProjectsCmd;
pub use self::rename::RenameCmd;
pub use self::set::SetCmd;
pub use self::show::ShowCmd;
pub use self::values::ValuesCmd;

mod add;
mod check;
mod complete;
pub mod completion;
mod config;
mod diff;
mod export;
mod help;
mod log;
mod ls;
mod new;
mod projects;
mod rename;
mod set;
mod show;
mod table;
mod values;

pub mod style;

pub const SUCCESS_CODE: i32 = 0;
pub const FAILURE_CODE: i32 = 1;

/// Output context handed to every command: where to write, whether to
/// decorate, and how wide the terminal is.
pub struct Io<'a> {
    pub out: &'a mut dyn Write,
    pub err: &'a mut dyn Write,
    pub decorate: bool,
    pub term_width: usize,
}

/// A sub-command. Commands handle the scope (application-wide, or bound to
/// one project) they care about and leave the other returning `None`; the
/// dispatcher falls from application scope through to project scope.
#[enum_dispatch]
pub trait Cmd {
    fn name(&self) -> &'static str;

    fn descr(&self) -> &'static str;

    fn usage(&self) -> &'static str;

    fn run_app(&self, _app: &mut App, _io: &mut Io, _args: &[String]) -> Option<Result<i32>> {
        None
    }

    fn run_project(
        &self,
        _app: &App,
        _project: &mut Project,
        _io: &mut Io,
        _args: &[String],
    ) -> Option<Result<i32>> {
        None
    }

    fn complete_app(&self, _app: &mut App, _io: &mut Io, _args: &[String]) -> Option<Result<i32>> {
        None
    }

    fn complete_project(
        &self,
        _app: &App,
        _project: &mut Project,
        _io: &mut Io,
        _args: &[String],
    ) -> Option<Result<i32>> {
        None
    }
}

#[enum_dispatch(Cmd)]
#[derive(Clone)]
pub enum Command {
    Add(AddCmd),
    Check(CheckCmd),
    Complete(CompleteCmd),
    Config(ConfigCmd),
    Export(ExportCmd),
    Help(HelpCmd),
    Log(LogCmd),
    Ls(LsCmd),
    New(NewCmd),
    Projects(ProjectsCmd),
    Rename(RenameCmd),
    Set(SetCmd),
    Show(ShowCmd),
    Values(ValuesCmd),
}

/// The command registry, built explicitly and kept sorted by name.
pub struct Commands {
    cmds: Vec<Command>,
}

impl Commands {
    pub fn new() -> Self {
        let mut cmds: Vec<Command> = vec![
            AddCmd.into(),
            CheckCmd.into(),
            CompleteCmd.into(),
            ConfigCmd.into(),
            ExportCmd.into(),
            HelpCmd.into(),
            LogCmd.into(),
            LsCmd.into(),
            NewCmd.into(),
            ProjectsCmd.into(),
            RenameCmd.into(),
            SetCmd.into(),
            ShowCmd.into(),
            ValuesCmd.into(),
        ];
        cmds.sort_by_key(|cmd| cmd.name());
        Self { cmds }
    }

    pub fn get(&self, name: &str) -> Option<Command> {
        self.cmds.iter().find(|cmd| cmd.name() == name).cloned()
    }

    pub fn list(&self) -> &[Command] {
        &self.cmds
    }
}

impl Default for Commands {
    fn default() -> Self {
        Self::new()
    }
}

/// Reports an error on the error stream, in red when decorated.
pub fn print_err(io: &mut Io, error: &TrackerError) {
    let message = format!("Error: {}", error);
    let _ = writeln!(io.err, "{}", style::paint(&style::RED, &message, io.decorate));
}

/// Formats a key name for record output.
pub fn format_key(key: &str, decorate: bool) -> String {
    style::paint(&style::BOLD, key, decorate)
}

/// Formats a record value: single-line values follow the key, multi-line
/// ones start on the next line.
pub fn format_value(value: &str) -> String {
    if value.contains('\n') {
        format!(":\n{}", value)
    } else {
        format!(": {}", value)
    }
}

/// Resolves the `key=-` form by spawning the user's editor seeded with the
/// current value. Returns `None` for ordinary values.
pub fn edit_value(value: &str, current: &str) -> Result<Option<String>> {
    if value != "-" {
        return Ok(None);
    }

    match edit::edit(current) {
        Ok(edited) => Ok(Some(edited.trim_end().to_string())),
        Err(e) => Err(TrackerError::General(format!(
            "Failed to prompt for value: {}",
            e
        ))),
    }
}
