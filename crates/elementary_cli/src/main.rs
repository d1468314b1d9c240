use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use elementary_core::{compile, CompileOpts, RunResult};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(
    name = "elementary",
    author,
    version,
    about = "ElementaryJS: a safety-restricted JavaScript dialect for teaching introductory programming"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compiles and runs a program file.
    Run {
        /// Path to the ElementaryJS source file.
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Starts an interactive read-eval-print loop.
    Repl,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    match Cli::parse().command {
        Command::Run { file } => run(&file),
        Command::Repl => repl(),
    }
}

fn default_opts() -> CompileOpts {
    CompileOpts {
        console_log: Rc::new(|line| println!("{line}")),
        version: Rc::new(|| info!("elementary {}", env!("CARGO_PKG_VERSION"))),
        ..CompileOpts::default()
    }
}

fn run(file: &PathBuf) -> Result<()> {
    let source = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let mut program =
        compile(&source, default_opts()).map_err(|err| anyhow::anyhow!(err.to_string()))?;

    let mut outcome = None;
    program.run(|result| outcome = Some(result));
    if let Some(RunResult::Exception { value, .. }) = outcome {
        let text = program.describe(&value);
        eprintln!("Uncaught: {text}");
        std::process::exit(1);
    }
    Ok(())
}

fn repl() -> Result<()> {
    let mut program =
        compile("", default_opts()).map_err(|err| anyhow::anyhow!(err.to_string()))?;
    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline("elementary> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line.as_str());

                let mut outcome = None;
                program.eval(&line, |result| outcome = Some(result));
                match outcome {
                    Some(RunResult::Normal(value)) => {
                        let text = program.describe(&value);
                        println!("{text}");
                    }
                    Some(RunResult::Exception { value, .. }) => {
                        let text = program.describe(&value);
                        eprintln!("Uncaught: {text}");
                    }
                    None => {}
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                error!(%err, "readline failed");
                break;
            }
        }
    }
    Ok(())
}
