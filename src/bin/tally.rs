use std::io::Write;
use std::process::exit;
use std::{env, io};

use tally::app::App;
use tally::cmd::{print_err, Io};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();

    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    let mut io_ctx = Io {
        out: &mut stdout,
        err: &mut stderr,
        decorate: atty::is(atty::Stream::Stdout),
        term_width: terminal_width(),
    };

    let mut app = match App::new(args) {
        Ok(app) => app,
        Err(e) => {
            print_err(&mut io_ctx, &e);
            exit(1);
        }
    };

    let code = app.run(&mut io_ctx);
    let _ = io_ctx.out.flush();
    exit(code);
}

fn terminal_width() -> usize {
    env::var("COLUMNS")
        .ok()
        .and_then(|columns| columns.parse().ok())
        .unwrap_or(80)
}
