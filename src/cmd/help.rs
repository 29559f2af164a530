//! The `help` command.

use std::io::Write;

use crate::app::App;
use crate::cmd::{format_key, Cmd, Io, FAILURE_CODE, SUCCESS_CODE};
use crate::tracker::Result;

#[derive(Clone)]
pub struct HelpCmd;

impl Cmd for HelpCmd {
    fn name(&self) -> &'static str {
        "help"
    }

    fn descr(&self) -> &'static str {
        "provide help information"
    }

    fn usage(&self) -> &'static str {
        "Usage: help [command]"
    }

    fn run_app(&self, app: &mut App, io: &mut Io, args: &[String]) -> Option<Result<i32>> {
        Some(run(app, io, args))
    }

    fn complete_app(&self, app: &mut App, io: &mut Io, args: &[String]) -> Option<Result<i32>> {
        if args.len() > 1 {
            return Some(Ok(FAILURE_CODE));
        }

        for cmd in app.commands().list() {
            if let Err(e) = writeln!(io.out, "{}", cmd.name()) {
                return Some(Err(e.into()));
            }
        }
        Some(Ok(SUCCESS_CODE))
    }
}

fn run(app: &mut App, io: &mut Io, args: &[String]) -> Result<i32> {
    if args.len() > 1 {
        writeln!(io.err, "Expected at most one argument.")?;
        return Ok(FAILURE_CODE);
    }

    if args.is_empty() {
        for cmd in app.commands().list() {
            writeln!(
                io.out,
                "{} -- {}",
                format_key(cmd.name(), io.decorate),
                cmd.descr()
            )?;
        }
        return Ok(SUCCESS_CODE);
    }

    let cmd = match app.commands().get(&args[0]) {
        Some(cmd) => cmd,
        None => {
            writeln!(io.err, "Unknown command name: {}", args[0])?;
            return Ok(FAILURE_CODE);
        }
    };

    writeln!(
        io.out,
        "{} -- {}\n\n{}",
        format_key(cmd.name(), io.decorate),
        cmd.descr(),
        cmd.usage()
    )?;

    Ok(SUCCESS_CODE)
}
