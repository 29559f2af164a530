//! The `config` command, which reads and updates configuration.

use std::collections::BTreeSet;
use std::io::Write;

use clap::error::ErrorKind;
use clap::Parser;

use crate::app::App;
use crate::cmd::{edit_value, format_key, Cmd, Io, FAILURE_CODE, SUCCESS_CODE};
use crate::tracker::parsing::parse_paired_args;
use crate::tracker::{Config, Project, Result, TrackerError};

const NOT_SET: &str = "<not set>";

/// Reads/updates configuration.
///
/// When invoked without arguments, settings are listed.
///
/// ```text
/// key        --  displays configuration value
/// key=value  --  sets configuration value
/// key=-      --  spawns editor to edit configuration value
/// ```
#[derive(Parser, Debug)]
#[command(name = "config", disable_version_flag = true)]
struct ConfigOpts {
    /// Use the global configuration
    #[arg(short, long)]
    global: bool,

    /// Keys to display or assignments to apply
    #[arg(value_name = "KEY[=VAL]")]
    entries: Vec<String>,
}

#[derive(Clone)]
pub struct ConfigCmd;

impl Cmd for ConfigCmd {
    fn name(&self) -> &'static str {
        "config"
    }

    fn descr(&self) -> &'static str {
        "read/update configuration"
    }

    fn usage(&self) -> &'static str {
        "Usage: config [--help|-h] [--global|-g] [key[=val]...]"
    }

    fn run_app(&self, app: &mut App, io: &mut Io, args: &[String]) -> Option<Result<i32>> {
        let opts = match parse_opts(args, io) {
            Ok(Some(opts)) => opts,
            Ok(None) => return Some(Ok(SUCCESS_CODE)),
            Err(e) => return Some(Err(e)),
        };

        if !opts.global {
            return None;
        }
        Some(run(app.global_config(), io, &opts.entries))
    }

    fn run_project(
        &self,
        _app: &App,
        project: &mut Project,
        io: &mut Io,
        args: &[String],
    ) -> Option<Result<i32>> {
        let opts = match parse_opts(args, io) {
            Ok(Some(opts)) => opts,
            Ok(None) => return Some(Ok(SUCCESS_CODE)),
            Err(e) => return Some(Err(e)),
        };

        Some(run(project.config(false), io, &opts.entries))
    }

    fn complete_project(
        &self,
        app: &App,
        project: &mut Project,
        io: &mut Io,
        args: &[String],
    ) -> Option<Result<i32>> {
        Some(complete(app, project, io, args))
    }
}

fn parse_opts(args: &[String], io: &mut Io) -> Result<Option<ConfigOpts>> {
    let argv = std::iter::once("config").chain(args.iter().map(String::as_str));
    match ConfigOpts::try_parse_from(argv) {
        Ok(opts) => Ok(Some(opts)),
        Err(e) if e.kind() == ErrorKind::DisplayHelp => {
            write!(io.out, "{}", e)?;
            Ok(None)
        }
        Err(e) => Err(TrackerError::IllegalArgument(e.to_string())),
    }
}

fn run(config: &Config, io: &mut Io, args: &[String]) -> Result<i32> {
    if args.is_empty() {
        for key in config.list("")? {
            print_key(config, io, &key)?;
        }
        return Ok(SUCCESS_CODE);
    }

    for arg in parse_paired_args(args) {
        let (key, value) = match arg.split_once('=') {
            Some((key, value)) => (key.to_string(), Some(value.to_string())),
            None => (arg.clone(), None),
        };

        if key.is_empty() || key.starts_with('!') {
            writeln!(io.out, "Wrong key name: '{}'", key)?;
            continue;
        }

        let value = match value {
            Some(value) => value,
            None => {
                print_key(config, io, &key)?;
                continue;
            }
        };

        let value = match edit_value(&value, &config.get_or(&key, "")?)? {
            Some(edited) => edited,
            None => value,
        };
        config.set(&key, &value)?;
    }

    Ok(SUCCESS_CODE)
}

fn print_key(config: &Config, io: &mut Io, key: &str) -> Result<()> {
    let value = config.get_or(key, NOT_SET)?;
    if !value.is_empty() {
        writeln!(io.out, "{} = {}", format_key(key, io.decorate), value)?;
    }
    Ok(())
}

fn complete(app: &App, project: &mut Project, io: &mut Io, args: &[String]) -> Result<i32> {
    let global = args.iter().any(|arg| arg == "--global" || arg == "-g");
    let config = if global {
        app.global_config()
    } else {
        project.config(false)
    };

    if let Some(last) = args.last() {
        if last.contains('=') {
            let key = &last[..last.len() - 1];
            writeln!(io.out, "'{}'", config.get_or(key, "")?)?;
            return Ok(SUCCESS_CODE);
        }
    }

    let mut keys: BTreeSet<String> = config.list("")?.into_iter().collect();

    // Keys already on the command line are not offered again.
    for arg in args {
        if let Some(pos) = arg.find('=') {
            if pos != 0 {
                keys.remove(&arg[..pos]);
                continue;
            }
        }
        if let Some(stripped) = arg.strip_suffix(':') {
            keys.remove(stripped);
        }
    }

    writeln!(io.out, "--global\n--help\n-g\n-h")?;

    // The colon form is easier to type because completion appends a space.
    for key in keys {
        writeln!(io.out, "{}:", key)?;
    }

    Ok(SUCCESS_CODE)
}
