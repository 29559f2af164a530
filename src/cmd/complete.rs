//! The `complete` command, the entry point of shell completion.

use crate::app::App;
use crate::cmd::{Cmd, Io};
use crate::tracker::Result;

#[derive(Clone)]
pub struct CompleteCmd;

impl Cmd for CompleteCmd {
    fn name(&self) -> &'static str {
        "complete"
    }

    fn descr(&self) -> &'static str {
        "complete a command line"
    }

    fn usage(&self) -> &'static str {
        "Usage: complete [args...]"
    }

    fn run_app(&self, app: &mut App, io: &mut Io, args: &[String]) -> Option<Result<i32>> {
        Some(app.complete(args.to_vec(), io))
    }
}
