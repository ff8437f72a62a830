//! Purpose: `recfile` CLI entry point.
//! Role: Binary crate root; parses args, runs commands over `[user]` record files.
//! Invariants: Command results are JSON on stdout, except `list` without `--json`.
//! Invariants: Errors are emitted on stderr, as JSON when stderr is not a terminal.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

use recfile::api::{Error, ErrorKind, ErrorPolicy, LoadOptions, to_exit_code};

mod command_dispatch;
mod user;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Run `recfile --help` for usage."));
            }
        },
    };

    let options = LoadOptions::default().with_errors(cli.errors.into());
    command_dispatch::dispatch_command(cli.command, options)
}

#[derive(Parser)]
#[command(
    name = "recfile",
    version,
    about = "Inspect and edit flat-file [user] records",
    after_help = r#"EXAMPLES
  $ recfile add users.rec name=Alice age=30 role=admin "tags=[ops, oncall]"
  $ recfile list users.rec
  $ recfile set users.rec name Alice age=31
  $ recfile remove users.rec name Alice
  $ recfile check users.rec --json"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        value_enum,
        default_value = "skip",
        global = true,
        help = "What to do when a value cannot be read as its field's type"
    )]
    errors: ErrorsArg,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum ErrorsArg {
    /// Leave the field unset and keep loading
    Skip,
    /// Fail on any unreadable value
    Stop,
    /// Fail only on unknown enum variants
    StopOnEnum,
}

impl From<ErrorsArg> for ErrorPolicy {
    fn from(value: ErrorsArg) -> Self {
        match value {
            ErrorsArg::Skip => ErrorPolicy::Skip,
            ErrorsArg::Stop => ErrorPolicy::Stop,
            ErrorsArg::StopOnEnum => ErrorPolicy::StopOnEnum,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print every record, in file order
    List {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(long, help = "Emit a JSON array instead of the record format")]
        json: bool,
    },
    /// Append a record built from field=value assignments
    Add {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(required = true, value_name = "FIELD=VALUE")]
        assignments: Vec<String>,
    },
    /// Apply field=value assignments to the first record whose FIELD equals KEY
    Set {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        field: String,
        key: String,
        #[arg(required = true, value_name = "FIELD=VALUE")]
        assignments: Vec<String>,
    },
    /// Remove the first record whose FIELD equals KEY
    Remove {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        field: String,
        key: String,
    },
    /// Load a file and report values that could not be read
    Check {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(long, help = "Emit the report as JSON")]
        json: bool,
    },
    /// Generate shell completions
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.trim_start_matches("error: ").to_string())
        .unwrap_or_else(|| "invalid arguments".to_string())
}

fn emit_json(value: Value) {
    println!("{value}");
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert(
        "message".to_string(),
        json!(err.message().unwrap_or("unexpected error")),
    );
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(field) = err.field() {
        inner.insert("field".to_string(), json!(field));
    }
    if let Some(line) = err.line() {
        inner.insert("line".to_string(), json!(line));
    }
    json!({ "error": Value::Object(inner) })
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("error: {err}");
        if let Some(hint) = err.hint() {
            eprintln!("hint: {hint}");
        }
        return;
    }
    eprintln!("{}", error_json(err));
}
