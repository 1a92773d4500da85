//! Command-line interface for recordbook.
//!
//! This module provides the CLI structure for the `rbook` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::OutputFormat;
use crate::logging::Verbosity;

pub use commands::{
    ConfigCommand, FieldAddArgs, FieldCommand, FieldUpdateArgs, FileCommand, FileCreateArgs,
    FileUpdateArgs, KeyFileCommand, NoteCommand, PersonArgs, PersonCommand, PositionArgs,
    ProgramCommand, ProgramCreateArgs, ProgramUpdateArgs, RoleArg, StructCommand, ValidCommand,
};

/// rbook - Document legacy record layouts and the programs that use them
///
/// Keeps a catalog of files, their fields and byte positions, permissible
/// values, nested structures, and the programs that read or write them.
#[derive(Debug, Parser)]
#[command(name = "rbook")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the workspace file (overrides configuration)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub workspace: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage files and their layouts
    #[command(subcommand)]
    File(FileCommand),

    /// Manage the fields of a file
    #[command(subcommand)]
    Field(FieldCommand),

    /// Manage the permissible values of a field
    #[command(subcommand)]
    Valid(ValidCommand),

    /// Manage the data structures overlaid on a field
    #[command(subcommand)]
    Struct(StructCommand),

    /// Manage programs
    #[command(subcommand)]
    Program(ProgramCommand),

    /// Manage a program's key programmers and key users
    #[command(subcommand)]
    Person(PersonCommand),

    /// Manage the files a program uses
    #[command(subcommand)]
    Keyfile(KeyFileCommand),

    /// Manage notes on programs
    #[command(subcommand)]
    Note(NoteCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Command {
    /// Whether the command changes the workspace and must save it.
    #[must_use]
    pub fn is_mutating(&self) -> bool {
        match self {
            Self::File(cmd) => !matches!(cmd, FileCommand::List | FileCommand::Show { .. }),
            Self::Field(cmd) => !matches!(cmd, FieldCommand::List { .. }),
            Self::Valid(cmd) => !matches!(cmd, ValidCommand::List { .. }),
            Self::Struct(cmd) => !matches!(cmd, StructCommand::List { .. }),
            Self::Program(cmd) => {
                !matches!(cmd, ProgramCommand::List | ProgramCommand::Show { .. })
            }
            Self::Person(_) => true,
            Self::Keyfile(cmd) => !matches!(cmd, KeyFileCommand::List { .. }),
            Self::Note(cmd) => !matches!(cmd, NoteCommand::List { .. }),
            Self::Config(_) => false,
        }
    }
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }

    /// The output format: `--json` wins over the configured default.
    #[must_use]
    pub fn output_format(&self, configured: OutputFormat) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            configured
        }
    }
}
