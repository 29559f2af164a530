//! Command-line parsing and alias expansion.
//!
//! A raw command line has the shape
//! `[.project] [key=value...] [command [args...]]`. The command token may
//! be a dotted composition (`add.check`) whose segments are resolved as
//! aliases from right to left; resolved segments replace the pending
//! command line with `${N}` positional interpolation, unresolved ones are
//! prepended as literals.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::tracker::util::{break_into_args, split_at};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\$\{(\d+)\}$").unwrap());

const OPTS: &[&str] = &["--help", "-h", "--version", "-v"];

#[derive(Default)]
pub struct Invocation {
    prj_name: String,
    confs: Vec<(String, String)>,
    composition: String,
    cmd_name: String,
    cmd_line: Vec<String>,
    def_prj_name: String,
    def_cmd_line: String,
    help: bool,
    version: bool,
}

impl Invocation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds in a command line (without the application name). A leading
    /// `.name` token selects the project and a run of `key=value` tokens
    /// before the command becomes configuration overrides.
    pub fn set_cmd_line(&mut self, mut args: Vec<String>) {
        if !args.is_empty() && args[0].starts_with('.') {
            self.prj_name = args[0][1..].to_string();
            args.remove(0);
        }

        let split = args
            .iter()
            .position(|arg| !arg.contains('='))
            .unwrap_or(args.len());
        for assign in args.drain(..split) {
            if let Ok(pair) = split_at(&assign, '=') {
                self.confs.push(pair);
            }
        }

        self.cmd_line = args;
    }

    /// Project name to use when the command line names none.
    pub fn set_def_prj_name(&mut self, name: impl Into<String>) {
        self.def_prj_name = name.into();
    }

    /// Command line to fall back to on empty input. Broken into arguments
    /// the way a shell would, but without expansions.
    pub fn set_def_cmd_line(&mut self, line: impl Into<String>) {
        self.def_cmd_line = line.into();
    }

    /// Expands the command line. `resolve_alias` maps an alias name to its
    /// right-hand side, or an empty string for unknown names. During
    /// completion, interpolation stops right after the argument under the
    /// cursor is inserted so that it stays at the very end.
    pub fn parse(&mut self, resolve_alias: impl Fn(&str) -> String, completion: bool) {
        if self.cmd_line.is_empty() {
            self.cmd_line = break_into_args(&self.def_cmd_line);
        }

        while let Some(first) = self.cmd_line.first() {
            match first.as_str() {
                "--help" | "-h" => self.help = true,
                "--version" | "-v" => self.version = true,
                _ => break,
            }
            self.cmd_line.remove(0);
        }

        if !self.cmd_line.is_empty() {
            self.composition = self.cmd_line.remove(0);
            self.cmd_name = self.composition.clone();
        }

        let names: Vec<String> = self.composition.split('.').map(str::to_string).collect();
        for name in names.iter().rev() {
            let rhs = resolve_alias(name);
            if rhs.is_empty() {
                self.cmd_line.insert(0, name.clone());
                continue;
            }

            let expanded = apply_alias(&break_into_args(&rhs), &self.cmd_line, completion);
            self.set_cmd_line(expanded);
        }

        if self.cmd_line.is_empty() {
            self.cmd_name.clear();
        } else {
            self.cmd_name = self.cmd_line.remove(0);
        }
    }

    pub fn should_print_help(&self) -> bool {
        self.help
    }

    pub fn should_print_version(&self) -> bool {
        self.version
    }

    /// Names of the options recognized by the outer dispatcher.
    pub fn opts() -> &'static [&'static str] {
        OPTS
    }

    pub fn prj_name(&self) -> String {
        if self.prj_name.is_empty() {
            self.def_prj_name.clone()
        } else {
            self.prj_name.clone()
        }
    }

    pub fn cmd_name(&self) -> &str {
        &self.cmd_name
    }

    /// The unexpanded command token.
    pub fn composition(&self) -> &str {
        &self.composition
    }

    pub fn cmd_args(&self) -> &[String] {
        &self.cmd_line
    }

    pub fn confs(&self) -> &[(String, String)] {
        &self.confs
    }
}

/// Substitutes `${N}` placeholders of an alias right-hand side with the
/// supplied arguments. Unconsumed arguments are appended at the end.
fn apply_alias(alias: &[String], args: &[String], completion: bool) -> Vec<String> {
    let mut used = vec![false; args.len()];
    let mut substituted = Vec::new();

    for arg in alias {
        let n = match PLACEHOLDER.captures(arg) {
            Some(caps) => caps[1].parse::<usize>().unwrap_or(usize::MAX),
            None => {
                substituted.push(arg.clone());
                continue;
            }
        };

        if n == 0 {
            substituted.push(arg.clone());
        } else if n <= args.len() {
            substituted.push(args[n - 1].clone());
            used[n - 1] = true;

            // Stop after inserting the last argument during completion.
            if completion && n == args.len() {
                return substituted;
            }
        } else {
            substituted.push(String::new());
        }
    }

    for (arg, used) in args.iter().zip(used) {
        if !used {
            substituted.push(arg.clone());
        }
    }

    substituted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    fn no_aliases(_: &str) -> String {
        String::new()
    }

    fn parsed(args: &[&str], resolver: impl Fn(&str) -> String) -> Invocation {
        let mut invocation = Invocation::new();
        invocation.set_cmd_line(strings(args));
        invocation.parse(resolver, false);
        invocation
    }

    #[test]
    fn help_request_is_detected() {
        let invocation = parsed(&["--help"], no_aliases);
        assert!(invocation.should_print_help());
    }

    #[test]
    fn version_request_is_detected() {
        let invocation = parsed(&["--version"], no_aliases);
        assert!(invocation.should_print_version());
    }

    #[test]
    fn lone_dot_selects_default_project() {
        let mut invocation = Invocation::new();
        invocation.set_def_prj_name("defprj");
        invocation.set_cmd_line(strings(&["."]));
        invocation.parse(no_aliases, false);

        assert_eq!(invocation.prj_name(), "defprj");
    }

    #[test]
    fn project_name_is_extracted() {
        let invocation = parsed(&[".proj"], no_aliases);
        assert_eq!(invocation.prj_name(), "proj");
    }

    #[test]
    fn default_command_line_is_used() {
        let mut invocation = Invocation::new();
        invocation.set_def_cmd_line(r#"defcmd 'with' "args" goes\ here"#);
        invocation.parse(no_aliases, false);

        assert_eq!(invocation.cmd_name(), "defcmd");
        assert_eq!(invocation.cmd_args(), strings(&["with", "args", "goes here"]));
    }

    #[test]
    fn confs_are_split_off_before_the_command() {
        let invocation = parsed(&["ui.ls.fmt=_id", "ls", "status==done"], no_aliases);

        assert_eq!(
            invocation.confs(),
            vec![("ui.ls.fmt".to_string(), "_id".to_string())]
        );
        assert_eq!(invocation.cmd_name(), "ls");
        assert_eq!(invocation.cmd_args(), strings(&["status==done"]));
    }

    #[test]
    fn no_argument_alias_is_expanded() {
        let resolver = |name: &str| {
            if name == "alias" {
                "cmd pre-arg".to_string()
            } else {
                String::new()
            }
        };

        let invocation = parsed(&["alias", "arg"], resolver);
        assert_eq!(invocation.cmd_name(), "cmd");
        assert_eq!(invocation.cmd_args(), strings(&["pre-arg", "arg"]));
    }

    #[test]
    fn placeholders_reorder_arguments() {
        let resolver = |name: &str| {
            if name == "alias" {
                "cmd ${2} ${3} ${1}".to_string()
            } else {
                String::new()
            }
        };

        let invocation = parsed(&["alias", "a1", "a2", "a3"], resolver);
        assert_eq!(invocation.cmd_name(), "cmd");
        assert_eq!(invocation.cmd_args(), strings(&["a2", "a3", "a1"]));
    }

    #[test]
    fn unused_arguments_are_appended() {
        let resolver = |name: &str| {
            if name == "alias" {
                "cmd ${2}".to_string()
            } else {
                String::new()
            }
        };

        let invocation = parsed(&["alias", "arg1", "arg2", "arg3"], resolver);
        assert_eq!(invocation.cmd_args(), strings(&["arg2", "arg1", "arg3"]));
    }

    #[test]
    fn placeholders_can_repeat() {
        let resolver = |name: &str| {
            if name == "alias" {
                "cmd ${1} ${1}".to_string()
            } else {
                String::new()
            }
        };

        let invocation = parsed(&["alias", "arg"], resolver);
        assert_eq!(invocation.cmd_args(), strings(&["arg", "arg"]));
    }

    #[test]
    fn malformed_placeholders_pass_through() {
        let resolver = |name: &str| {
            if name == "alias" {
                "cmd ${} ${-1} ${0} a${3}".to_string()
            } else {
                String::new()
            }
        };

        let invocation = parsed(&["alias"], resolver);
        assert_eq!(
            invocation.cmd_args(),
            strings(&["${}", "${-1}", "${0}", "a${3}"])
        );
    }

    #[test]
    fn out_of_range_placeholders_become_empty() {
        let resolver = |name: &str| {
            if name == "alias" {
                "cmd ${10}".to_string()
            } else {
                String::new()
            }
        };

        let invocation = parsed(&["alias"], resolver);
        assert_eq!(invocation.cmd_args(), strings(&[""]));
    }

    #[test]
    fn composition_resolves_right_to_left() {
        let resolver = |name: &str| match name {
            "recur" => "set status=done".to_string(),
            _ => String::new(),
        };

        let invocation = parsed(&["add.recur", "abc"], resolver);
        assert_eq!(invocation.cmd_name(), "add");
        assert_eq!(invocation.cmd_args(), strings(&["set", "status=done", "abc"]));
    }

    #[test]
    fn alias_can_supply_config_overrides() {
        let resolver = |name: &str| match name {
            "mine" => ".work ui.ls.fmt=_id ls".to_string(),
            _ => String::new(),
        };

        let invocation = parsed(&["mine"], resolver);
        assert_eq!(invocation.prj_name(), "work");
        assert_eq!(
            invocation.confs(),
            vec![("ui.ls.fmt".to_string(), "_id".to_string())]
        );
        assert_eq!(invocation.cmd_name(), "ls");
    }

    #[test]
    fn completion_stops_at_the_last_inserted_argument() {
        let resolver = |name: &str| match name {
            "alias" => "cmd ${1} tail".to_string(),
            _ => String::new(),
        };

        let mut invocation = Invocation::new();
        invocation.set_cmd_line(strings(&["alias", "under-cursor"]));
        invocation.parse(resolver, true);

        assert_eq!(invocation.cmd_name(), "cmd");
        assert_eq!(invocation.cmd_args(), strings(&["under-cursor"]));
    }

    #[test]
    fn parse_is_deterministic_on_reparse_inputs() {
        let resolver = |name: &str| match name {
            "alias" => "cmd ${2} ${1}".to_string(),
            _ => String::new(),
        };

        let first = parsed(&["alias", "a", "b"], resolver);
        let second = parsed(&["alias", "a", "b"], resolver);
        assert_eq!(first.cmd_name(), second.cmd_name());
        assert_eq!(first.cmd_args(), second.cmd_args());
        assert_eq!(first.confs(), second.confs());
    }
}
