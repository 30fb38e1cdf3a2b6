use std::env;
use std::io;
use std::process::ExitCode;

use loxrs::error::StderrReporter;
use loxrs::Lox;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let mut lox = Lox::new(Box::new(io::stdout()));

    match args.len() {
        1 => run_prompt(&mut lox),
        2 => run_file(&mut lox, &args[1]),
        _ => {
            eprintln!("Usage: lox [script]");
            ExitCode::from(64)
        }
    }
}

fn run_file(lox: &mut Lox, path: &str) -> ExitCode {
    let reporter = StderrReporter::new();
    match lox.run_file(path, &reporter) {
        Ok(()) => {
            if reporter.had_error() {
                ExitCode::from(65)
            } else if reporter.had_runtime_error() {
                ExitCode::from(70)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(74)
        }
    }
}

fn run_prompt(lox: &mut Lox) -> ExitCode {
    lox.set_repl_mode(true);
    let reporter = StderrReporter::new();
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(74);
        }
    };

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                editor.add_history_entry(line.as_str()).ok();
                lox.run(&line, &reporter);
                // A bad line shouldn't poison the rest of the session.
                reporter.reset();
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{e}");
                break;
            }
        }
    }

    ExitCode::SUCCESS
}
