mod builtins;
mod errors;
mod executor;
mod history;
mod job_control;
mod jobs;
mod lexer;
mod logging;
mod parser;
mod prompt;
mod redirect;
mod segment;
mod signals;
mod state;
mod status;

use std::io::{self, Write};

use executor::ExecutionAction;
use state::ShellState;

fn main() {
    logging::init();

    // The directory the shell starts in becomes its home: the anchor for
    // `~`, `hop`, and the history file.
    let home = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("myshell: cannot determine the starting directory: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = signals::install() {
        eprintln!("myshell: cannot install signal handlers: {err}");
        std::process::exit(1);
    }

    log::info!("shell started, home {}", home.display());
    let mut state = ShellState::new(home);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        // Harvest finished or stopped background children before the prompt
        // so their reports land above it.
        state.jobs.reap();

        print!("{}", prompt::render(&state.home));
        if stdout.flush().is_err() {
            break;
        }

        let mut input = String::new();
        match stdin.read_line(&mut input) {
            Ok(0) => logout(&mut state),
            Ok(_) => {
                let line = input.trim();
                if line.is_empty() {
                    continue;
                }

                state.jobs.reap();
                if let ExecutionAction::Exit = executor::run_line(line, &mut state, true) {
                    println!("Shell terminated.");
                    break;
                }
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                eprintln!("myshell: error reading input: {err}");
                break;
            }
        }
    }
}

/// End-of-input: say goodbye, take the background jobs down, exit cleanly.
fn logout(state: &mut ShellState) -> ! {
    println!("logout");
    state.jobs.kill_all();
    std::process::exit(0);
}
