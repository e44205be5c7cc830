use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use wisplisp::config::{VERSION, WELCOME_MESSAGE, WELCOME_SUBTITLE};
use wisplisp::error::EvalOutcome;
use wisplisp::interpreter::Interpreter;

/// A Clojure-flavored Lisp interpreter
#[derive(Parser, Debug)]
#[command(name = "wisplisp")]
#[command(version = VERSION)]
#[command(about = "A Clojure-flavored Lisp interpreter")]
struct CliArgs {
    /// Script file to execute (optional - if not provided, starts REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Skip loading the bundled standard library
    #[arg(long = "no-stdlib")]
    no_stdlib: bool,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let filter = if verbose > 0 {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    let subscriber = fmt::layer().with_target(false);
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    init_logging(args.verbose);

    let mut interp = if args.no_stdlib {
        Interpreter::bare()
    } else {
        Interpreter::new()
    };

    if let Some(script_path) = args.script {
        return run_script(&script_path, &mut interp);
    }

    run_repl(&mut interp)
}

fn run_script(path: &PathBuf, interp: &mut Interpreter) -> Result<(), Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read script file {}: {}", path.display(), e))?;

    info!(path = %path.display(), "running script");
    match interp.evaluate(&contents) {
        EvalOutcome::Success(_) => Ok(()),
        EvalOutcome::ReadFailure(e) => Err(format!("parse error: {}", e).into()),
        EvalOutcome::EvalFailure(e) => Err(format!("evaluation error: {}", e).into()),
    }
}

fn run_repl(interp: &mut Interpreter) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::builder().auto_add_history(true).build();
    let mut rl =
        Editor::<(), _>::with_config(config).map_err(|e| format!("failed to initialize REPL: {}", e))?;

    let history_file = ".wisplisp_history";
    let _ = rl.load_history(history_file);

    info!("starting REPL");
    println!("{}", WELCOME_MESSAGE);
    println!("{}", WELCOME_SUBTITLE);

    loop {
        let readline = rl.readline("lisp> ");
        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                if matches!(line.trim(), "(quit)" | "(exit)") {
                    println!("Goodbye!");
                    break;
                }

                match interp.evaluate(&line) {
                    EvalOutcome::Success(v) => {
                        println!("=> {}", interp.display(&v));
                    }
                    EvalOutcome::ReadFailure(e) => eprintln!("Parse error: {}", e),
                    EvalOutcome::EvalFailure(e) => eprintln!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);
    Ok(())
}
