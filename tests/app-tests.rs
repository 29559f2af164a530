//! End-to-end tests driving the application object against a temporary
//! configuration root.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tempfile::TempDir;

use tally::app::App;
use tally::cmd::Io;

static CREATED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Created item: ([0-9a-zA-Z]{3})\n$").unwrap());

struct Run {
    code: i32,
    out: String,
    err: String,
}

fn tally(config_dir: &Path, args: &[&str]) -> Run {
    let mut out = Vec::new();
    let mut err = Vec::new();

    let code = {
        let mut io = Io {
            out: &mut out,
            err: &mut err,
            decorate: false,
            term_width: 80,
        };

        let args = args.iter().map(|s| s.to_string()).collect();
        match App::with_config_dir(config_dir.to_path_buf(), args) {
            Ok(mut app) => app.run(&mut io),
            Err(e) => panic!("failed to construct the application: {}", e),
        }
    };

    Run {
        code,
        out: String::from_utf8(out).unwrap(),
        err: String::from_utf8(err).unwrap(),
    }
}

fn ok(config_dir: &Path, args: &[&str]) -> Run {
    let run = tally(config_dir, args);
    assert_eq!(
        run.code, 0,
        "command {:?} failed\nstdout: {}\nstderr: {}",
        args, run.out, run.err
    );
    run
}

fn added_id(run: &Run) -> String {
    CREATED
        .captures(&run.out)
        .unwrap_or_else(|| panic!("unexpected add output: {}", run.out))[1]
        .to_string()
}

#[test]
fn project_lifecycle_add_and_ls() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    ok(root, &["new", "proj"]);

    let empty = ok(root, &[".proj", "ls"]);
    assert_eq!(empty.out, "ID  TITLE\n");

    let added = ok(root, &[".proj", "add", "title=hello"]);
    let id = added_id(&added);

    let listed = ok(root, &[".proj", "ls"]);
    assert_eq!(listed.out, format!("ID   TITLE\n{}  hello\n", id));
}

#[test]
fn ls_filters_items() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    ok(root, &["new", "proj"]);
    let done = added_id(&ok(
        root,
        &[".proj", "add", "title=first", "status=done"],
    ));
    added_id(&ok(root, &[".proj", "add", "title=second", "status=wip"]));

    let listed = ok(root, &[".proj", "ls", "status==done"]);
    assert_eq!(listed.out, format!("ID   TITLE\n{}  first\n", done));

    let substring = ok(root, &[".proj", "ls", "_any/irs"]);
    assert_eq!(substring.out, format!("ID   TITLE\n{}  first\n", done));
}

#[test]
fn broken_filter_expression_fails() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    ok(root, &["new", "proj"]);
    let run = tally(root, &[".proj", "ls", "title done"]);
    assert_ne!(run.code, 0);
    assert!(run.err.contains("title done"));
}

#[test]
fn show_orders_and_indents_records() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    ok(root, &["new", "proj"]);
    let id = added_id(&ok(
        root,
        &[".proj", "add", "title=hello", "status=done"],
    ));

    let shown = ok(root, &[".proj", "show", &id]);
    assert_eq!(shown.out, "title: hello\nstatus: done\n");

    let filtered = ok(root, &[".proj", "show", &id, "status"]);
    assert_eq!(filtered.out, "status: done\n");
}

#[test]
fn set_updates_an_item() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    ok(root, &["new", "proj"]);
    let id = added_id(&ok(root, &[".proj", "add", "title=hello"]));

    ok(root, &[".proj", "set", &id, "status=done"]);

    let shown = ok(root, &[".proj", "show", &id]);
    assert_eq!(shown.out, "title: hello\nstatus: done\n");
}

#[test]
fn set_requires_a_known_id() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    ok(root, &["new", "proj"]);
    let run = tally(root, &[".proj", "set", "zzz", "status=done"]);
    assert_ne!(run.code, 0);
    assert!(run.err.contains("zzz"));
}

#[test]
fn log_reports_creations() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    ok(root, &["new", "proj"]);
    let id = added_id(&ok(root, &[".proj", "add", "title=hello"]));

    let logged = ok(root, &[".proj", "log", &id]);
    assert_eq!(logged.out, "title created: hello\n");
}

#[test]
fn values_lists_distinct_values() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    ok(root, &["new", "proj"]);
    ok(root, &[".proj", "add", "status=done"]);
    ok(root, &[".proj", "add", "status=wip"]);
    ok(root, &[".proj", "add", "status=done"]);

    let values = ok(root, &[".proj", "values", "status"]);
    assert_eq!(values.out, "done\nwip\n");
}

#[test]
fn config_overrides_apply_for_one_invocation() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    ok(root, &["new", "proj"]);
    let id = added_id(&ok(root, &[".proj", "add", "title=hello"]));

    let narrow = ok(root, &[".proj", "ui.ls.fmt=_id", "ls"]);
    assert_eq!(narrow.out, format!("ID \n{}\n", id));

    let appended = ok(root, &[".proj", "ui.ls.fmt+=,status", "ls"]);
    assert_eq!(
        appended.out,
        format!("ID   TITLE  STATUS\n{}  hello{}\n", id, " ".repeat(8))
    );

    // The override must not stick.
    let normal = ok(root, &[".proj", "ls"]);
    assert_eq!(normal.out, format!("ID   TITLE\n{}  hello\n", id));
}

#[test]
fn project_config_is_persisted() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    ok(root, &["new", "proj"]);

    let empty = ok(root, &[".proj", "config"]);
    assert_eq!(empty.out, "");

    ok(root, &[".proj", "config", "prj.descr=testing grounds"]);

    let listed = ok(root, &[".proj", "config"]);
    assert_eq!(listed.out, "prj.descr = testing grounds\n");

    let single = ok(root, &[".proj", "config", "prj.descr"]);
    assert_eq!(single.out, "prj.descr = testing grounds\n");
}

#[test]
fn config_refuses_builtin_keys() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    ok(root, &["new", "proj"]);
    let run = ok(root, &[".proj", "config", "!ids.count=7"]);
    assert!(run.out.contains("Wrong key name"));

    let count = ok(root, &[".proj", "config", "!ids.count"]);
    assert!(count.out.contains("Wrong key name"));
}

#[test]
fn global_config_and_default_project() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    ok(root, &["new", "proj"]);
    ok(root, &["config", "--global", "core.defprj=proj"]);

    let projects = ok(root, &["projects"]);
    assert_eq!(projects.out, "*proj\n");

    // With a default project set, the leading dot alone selects it.
    let added = ok(root, &[".", "add", "title=via-default"]);
    added_id(&added);
}

#[test]
fn aliases_expand_with_positional_arguments() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    ok(root, &["new", "proj"]);
    let id = added_id(&ok(root, &[".proj", "add", "title=hello"]));

    ok(
        root,
        &["config", "--global", "alias.done=set ${1} status=done"],
    );
    ok(root, &[".proj", "done", &id]);

    let shown = ok(root, &[".proj", "show", &id, "status"]);
    assert_eq!(shown.out, "status: done\n");
}

#[test]
fn projects_can_be_renamed() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    ok(root, &["new", "proj"]);
    ok(root, &[".proj", "add", "title=hello"]);

    ok(root, &["rename", "proj", "better"]);

    let run = tally(root, &[".proj", "ls"]);
    assert_ne!(run.code, 0);

    let listed = ok(root, &[".better", "ls"]);
    assert!(listed.out.contains("hello"));
}

#[test]
fn export_writes_null_terminated_records() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    ok(root, &["new", "proj"]);
    let id = added_id(&ok(root, &[".proj", "add", "title=hello"]));

    let exported = ok(root, &[".proj", "export", "-"]);
    assert_eq!(exported.out, format!("_id={}\0title=hello\0\0", id));
}

#[test]
fn check_accepts_a_consistent_project() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    ok(root, &["new", "proj"]);
    ok(root, &[".proj", "add", "title=one"]);
    ok(root, &[".proj", "add", "title=two"]);

    let checked = ok(root, &[".proj", "check"]);
    assert_eq!(checked.out, "");
}

#[test]
fn check_reports_missing_items() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    ok(root, &["new", "proj"]);
    let id = added_id(&ok(root, &[".proj", "add", "title=one"]));

    let item = root
        .join("projects")
        .join("proj")
        .join("items")
        .join(&id[..1])
        .join(&id[1..]);
    std::fs::remove_file(item).unwrap();

    let run = tally(root, &[".proj", "check"]);
    assert_ne!(run.code, 0);
    assert!(run.out.contains(&id));
}

#[test]
fn unknown_command_is_rejected() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    let run = tally(root, &["nonsense"]);
    assert_ne!(run.code, 0);
    assert!(run.err.contains("nonsense"));
}

#[test]
fn unknown_project_is_rejected() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    let run = tally(root, &[".ghost", "ls"]);
    assert_ne!(run.code, 0);
    assert!(run.err.contains("ghost"));
}

#[test]
fn corrupt_item_aborts_listing() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    ok(root, &["new", "proj"]);
    let id = added_id(&ok(root, &[".proj", "add", "title=hello"]));

    let item = root
        .join("projects")
        .join("proj")
        .join("items")
        .join(&id[..1])
        .join(&id[1..]);
    std::fs::write(item, "no timestamp here\n").unwrap();

    let run = tally(root, &[".proj", "ls"]);
    assert_ne!(run.code, 0);
    assert!(run.err.contains(&id));
}

#[test]
fn help_lists_subcommands() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    let run = ok(root, &["help"]);
    for name in ["add", "ls", "set", "show", "log", "projects"] {
        assert!(run.out.contains(name), "missing {} in: {}", name, run.out);
    }

    let usage = ok(root, &["help", "set"]);
    assert!(usage.out.contains("Usage: set id"));
}

#[test]
fn completion_offers_command_names() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    let run = ok(root, &["complete", "l::cursor::"]);
    assert!(run.out.contains("ls\n"));
    assert!(run.out.contains("log\n"));
    assert!(run.out.contains("--help\n"));
}

#[test]
fn completion_offers_project_names() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    ok(root, &["new", "proj"]);

    let run = ok(root, &["complete", ".pr::cursor::"]);
    assert_eq!(run.out, ".proj\n");
}

#[test]
fn completion_offers_item_ids() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    ok(root, &["new", "proj"]);
    let id = added_id(&ok(root, &[".proj", "add", "title=hello"]));

    let run = ok(root, &["complete", ".proj", "show", "::cursor::"]);
    assert_eq!(run.out, format!("{}\n", id));
}
