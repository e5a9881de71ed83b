use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod demux;
pub mod escape;
pub mod inspect;
pub mod sample;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Summarize the header of an .npy file.
    Inspect(InspectArgs),
    /// Print an .npy file as an escaped byte literal.
    Escape(EscapeArgs),
    /// Split a captured interpreter transcript into text and .npy frames.
    Demux(DemuxArgs),
    /// Round-trip a demo array through a live Python interpreter.
    Sample(SampleArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Inspect(args) => inspect::run(args, format),
        Command::Escape(args) => escape::run(args),
        Command::Demux(args) => demux::run(args, format),
        Command::Sample(args) => sample::run(args),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// .npy file to read.
    pub path: PathBuf,
}

#[derive(Args, Debug)]
pub struct EscapeArgs {
    /// .npy file to escape.
    pub path: PathBuf,
    /// Emit the two assignment commands that bind the array to NAME.
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,
    /// Omit the `b` prefix on the literal (Python 2 interpreters).
    #[arg(long, requires = "name")]
    pub no_bytes_prefix: bool,
}

#[derive(Args, Debug)]
pub struct DemuxArgs {
    /// Transcript to read. Default: stdin.
    pub input: Option<PathBuf>,
    /// Directory receiving frame-N.npy files.
    #[arg(long, value_name = "DIR")]
    pub out_dir: PathBuf,
}

#[derive(Args, Debug)]
pub struct SampleArgs {
    /// Python interpreter to start.
    #[arg(long, env = "NPYBRIDGE_PYTHON", default_value = "python3")]
    pub python: PathBuf,
    /// Script run before the interactive prompt.
    #[arg(long, value_name = "FILE")]
    pub script: Option<PathBuf>,
    /// Module whose `calc(x)` is applied to `x` before it is fetched.
    #[arg(long, value_name = "MODULE")]
    pub calc_module: Option<String>,
    /// Pass the interpreter's stderr (prompts, tracebacks) through.
    #[arg(long)]
    pub show_stderr: bool,
    /// Exit after the demo instead of forwarding stdin to the interpreter.
    #[arg(long)]
    pub no_interactive: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Reject names that would not survive as a Python assignment target.
pub fn check_identifier(name: &str) -> CliResult<()> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|first| first == '_' || first.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(CliError::new(
            USAGE,
            format!("{name:?} is not a valid Python identifier"),
        ))
    }
}
