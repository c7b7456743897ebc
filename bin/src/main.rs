use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use ast::{RefKind, ScriptErrorPrinter};
use clap::{Parser, Subcommand};
use interpreter::{AngleUnit, NullProvider, RefHandle, Session, SessionConfig};
use tracing::{debug, info};

mod console;

use console::ConsoleBinder;

#[derive(Parser)]
#[command(author, version, about = "Check and run asmgui scripts headlessly", long_about = None)]
struct Cli {
    /// Log filter, overriding RUST_LOG
    #[arg(long, global = true, value_name = "FILTER")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a script and report every diagnostic
    Check {
        file: PathBuf,
    },
    /// Build the dialog, apply inputs and print the resulting state
    Run {
        file: PathBuf,
        /// Input value, applied in order
        #[arg(long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,
        /// References for a selection, e.g. `axes=AXIS#1,AXIS#2`
        #[arg(long = "select", value_name = "NAME=HANDLES")]
        select: Vec<String>,
        /// Trigonometric builtins take and return radians
        #[arg(long)]
        radians: bool,
        /// Run the ASM section once every required field is satisfied
        #[arg(long)]
        confirm: bool,
        /// Only print widget creation and messages
        #[arg(long)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let ok = match cli.command {
        Commands::Check { file } => check(&file),
        Commands::Run {
            file,
            set,
            select,
            radians,
            confirm,
            quiet,
        } => {
            let config = SessionConfig {
                angle_unit: if radians {
                    AngleUnit::Radians
                } else {
                    AngleUnit::Degrees
                },
                ..SessionConfig::default()
            };
            run(&file, config, &set, &select, confirm, quiet)
        }
    };
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn init_logging(level: Option<&str>) {
    let env_filter = match level {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info".into()),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read(file: &Path) -> Option<String> {
    match fs::read_to_string(file) {
        Ok(source) => Some(source),
        Err(error) => {
            eprintln!("cannot read {}: {error}", file.display());
            None
        }
    }
}

/// Parses `source`, printing every diagnostic. Returns the program only when
/// lexing succeeded.
fn parse(source: &str, printer: &mut ScriptErrorPrinter) -> Option<(ast::Program, usize)> {
    match parser::parse(source) {
        Ok(parsed) => {
            for error in &parsed.errors {
                eprint!("{}", printer.format(&error.to_script_error()));
            }
            Some((parsed.program, parsed.errors.len()))
        }
        Err(error) => {
            eprint!("{}", printer.format(&error.to_script_error()));
            None
        }
    }
}

fn check(file: &Path) -> bool {
    let Some(source) = read(file) else {
        return false;
    };
    let mut printer = ScriptErrorPrinter::new(&source);
    let Some((program, errors)) = parse(&source, &mut printer) else {
        return false;
    };
    info!(
        asm = program.asm.len(),
        gui = program.gui.is_some(),
        tab = program.tab.is_some(),
        errors,
        "checked {}",
        file.display()
    );
    errors == 0
}

fn run(
    file: &Path,
    config: SessionConfig,
    set: &[String],
    select: &[String],
    confirm: bool,
    quiet: bool,
) -> bool {
    let Some(source) = read(file) else {
        return false;
    };
    let mut printer = ScriptErrorPrinter::new(&source);
    let Some((program, errors)) = parse(&source, &mut printer) else {
        return false;
    };
    let mut ok = errors == 0;

    let mut session = Session::start(program, ConsoleBinder { quiet }, NullProvider, config);
    for assignment in set {
        let applied = split_assignment(assignment)
            .and_then(|(name, value)| {
                session
                    .set_input_text(name, value)
                    .map_err(|e| e.to_string())
            });
        if let Err(error) = applied {
            eprintln!("--set {assignment}: {error}");
            ok = false;
        }
    }
    for selection in select {
        let applied = split_assignment(selection)
            .and_then(|(name, handles)| Ok((name, parse_handles(handles)?)))
            .and_then(|(name, handles)| {
                session
                    .select(name, handles)
                    .map_err(|e| e.to_string())
            });
        if let Err(error) = applied {
            eprintln!("--select {selection}: {error}");
            ok = false;
        }
    }

    if confirm {
        if let Err(error) = session.confirm() {
            eprintln!("{error}");
            ok = false;
        }
    }
    for failure in session.take_failures() {
        eprint!("{}", printer.format(&failure.to_script_error()));
    }

    print_state(&session);
    ok
}

fn print_state(session: &Session<ConsoleBinder, NullProvider>) {
    println!("variables:");
    for (name, slot) in session.symbols().iter() {
        let marker = if slot.initialized { "" } else { " (unset)" };
        println!("  {name} = {}{marker}", slot.value);
    }
    let missing = session.state().unsatisfied();
    if missing.is_empty() {
        println!("complete: yes");
    } else {
        println!("complete: no, missing {}", missing.join(", "));
    }
    debug!(widgets = session.widgets().len(), "state printed");
}

fn split_assignment(text: &str) -> Result<(&str, &str), String> {
    text.split_once('=')
        .map(|(name, value)| (name.trim(), value))
        .ok_or_else(|| "expected NAME=VALUE".to_string())
}

/// `KIND#ID[,KIND#ID...]`
fn parse_handles(text: &str) -> Result<Vec<RefHandle>, String> {
    text.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            let (kind, id) = part
                .trim()
                .split_once('#')
                .ok_or_else(|| format!("expected KIND#ID, found '{part}'"))?;
            let kind = RefKind::from_name(&kind.to_ascii_uppercase())
                .ok_or_else(|| format!("unknown reference kind '{kind}'"))?;
            let id = id
                .parse()
                .map_err(|_| format!("'{id}' is not a handle number"))?;
            Ok(RefHandle { id, kind })
        })
        .collect()
}
