#![forbid(unsafe_code)]
//! `graft` operator CLI.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode as ProcessExitCode;

use clap::{error::ErrorKind, Parser, Subcommand, ValueEnum};
use graft_core::{ErrorCode, ExitCode, MachineError};

#[derive(Parser)]
#[command(name = "graft")]
#[command(about = "graft operations CLI", version)]
struct Cli {
    /// Emit machine-readable JSON on stdout and stderr.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[arg(long, global = true, default_value_t = false)]
    quiet: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode or decode opaque global identifiers.
    Id {
        #[command(subcommand)]
        command: IdCommand,
    },
    /// Validate a schema declaration against the built-in resolver set.
    Registry {
        #[command(subcommand)]
        command: RegistryCommand,
    },
    /// Print the SQLite plan of a keyset page over one entity type.
    ExplainList {
        #[arg(long = "type")]
        type_name: String,
        #[arg(long)]
        sort_by: Option<String>,
        #[arg(long, value_enum, default_value_t = DirectionCli::Asc)]
        direction: DirectionCli,
        #[arg(long, default_value_t = false)]
        backward: bool,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Schema declaration JSON; the bundled demo graph when omitted.
        #[arg(long)]
        declaration: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum IdCommand {
    Encode {
        type_name: String,
        local_id: String,
        /// Schema declaration JSON whose types are accepted; the bundled demo graph when omitted.
        #[arg(long)]
        declaration: Option<PathBuf>,
    },
    Decode {
        opaque: String,
        /// Schema declaration JSON whose types are accepted; the bundled demo graph when omitted.
        #[arg(long)]
        declaration: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum RegistryCommand {
    Check {
        /// Schema declaration JSON; the bundled demo graph when omitted.
        declaration: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DirectionCli {
    Asc,
    Desc,
}

impl DirectionCli {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) struct OutputMode {
    pub(crate) json: bool,
    pub(crate) quiet: bool,
}

#[derive(Debug)]
pub(crate) struct CliError {
    exit_code: ExitCode,
    machine: MachineError,
}

impl CliError {
    pub(crate) fn validation(machine: MachineError) -> Self {
        Self {
            exit_code: ExitCode::Validation,
            machine,
        }
    }

    pub(crate) fn internal(message: String) -> Self {
        Self {
            exit_code: ExitCode::Internal,
            machine: MachineError::new(ErrorCode::Internal, &message),
        }
    }

    fn usage(message: &str) -> Self {
        Self {
            exit_code: ExitCode::Usage,
            machine: MachineError::new(ErrorCode::InvalidArguments, message),
        }
    }
}

pub fn main_entry() -> ProcessExitCode {
    let wants_json = std::env::args().any(|arg| arg == "--json");
    match run() {
        Ok(()) => ProcessExitCode::from(ExitCode::Success as u8),
        Err(err) => {
            emit_error(&err, wants_json);
            ProcessExitCode::from(err.exit_code as u8)
        }
    }
}

fn run() -> Result<(), CliError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{err}");
                return Ok(());
            }
            _ => {
                let mut usage = CliError::usage("invalid command line arguments");
                usage.machine = usage.machine.with_detail("error", &err.to_string());
                return Err(usage);
            }
        },
    };
    let output_mode = OutputMode {
        json: cli.json,
        quiet: cli.quiet,
    };
    let command = cli
        .command
        .ok_or_else(|| CliError::usage("missing command; see --help"))?;

    match command {
        Commands::Id { command } => match command {
            IdCommand::Encode {
                type_name,
                local_id,
                declaration,
            } => commands::run_id_encode(
                &type_name,
                &local_id,
                declaration.as_deref(),
                output_mode,
            ),
            IdCommand::Decode {
                opaque,
                declaration,
            } => commands::run_id_decode(&opaque, declaration.as_deref(), output_mode),
        },
        Commands::Registry { command } => match command {
            RegistryCommand::Check { declaration } => {
                commands::run_registry_check(declaration.as_deref(), output_mode)
            }
        },
        Commands::ExplainList {
            type_name,
            sort_by,
            direction,
            backward,
            limit,
            declaration,
        } => commands::run_explain_list(
            &commands::ExplainListArgs {
                type_name,
                sort_by,
                direction: direction.as_str(),
                backward,
                limit,
                declaration,
            },
            output_mode,
        ),
    }
}

fn emit_error(error: &CliError, machine_json: bool) {
    if machine_json {
        match serde_json::to_string(&error.machine) {
            Ok(payload) => eprintln!("{payload}"),
            Err(_) => eprintln!(
                "{{\"code\":\"Internal\",\"message\":\"failed to encode structured error\",\"details\":{{}}}}"
            ),
        }
    } else {
        eprintln!("{}: {}", error.machine.code, error.machine.message);
    }
}
