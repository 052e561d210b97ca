use std::io;

use anyhow::Result;
use tracing::instrument;

use crate::cli::{Args, Command, LogLevel, OutputFormat, Painter};
use crate::printer::MockPrinter;
use crate::telemetry;
use crate::terminal::{SystemTerminalClient, TerminalClient};

/// Runs a parsed command line against a fresh virtual printer.
///
/// ```
/// use clap::Parser;
///
/// let args = marser::Args::try_parse_from(["marser", "--output", "json", "send", "M115"])?;
/// let mut out = Vec::new();
/// marser::run(args, &mut out)?;
/// assert!(String::from_utf8(out)?.contains("FIRMWARE NAME:Marlin mock"));
/// # Ok::<(), anyhow::Error>(())
/// ```
///
/// # Errors
///
/// Returns an error if tracing initialisation fails, an input file cannot be
/// read, the printer answers unexpectedly, or output writing fails.
pub fn run<W>(args: Args, out: &mut W) -> Result<()>
where
    W: io::Write,
{
    run_with_terminal(args, out, &SystemTerminalClient)
}

/// Runs a parsed command line with injected terminal capabilities.
///
/// Output defaults to tables on a terminal and JSON otherwise; colour is only
/// used for tables written to a terminal.
///
/// # Errors
///
/// Returns an error if tracing initialisation fails, an input file cannot be
/// read, the printer answers unexpectedly, or output writing fails.
pub fn run_with_terminal<W>(
    args: Args,
    out: &mut W,
    terminal_client: &dyn TerminalClient,
) -> Result<()>
where
    W: io::Write,
{
    telemetry::initialise_tracing(
        terminal_client.stderr_is_terminal(),
        args.log_level().map(LogLevel::as_level_filter),
    )?;

    let output_format = args.output_format().unwrap_or(if terminal_client.stdout_is_terminal() {
        OutputFormat::Pretty
    } else {
        OutputFormat::Json
    });
    let painter = Painter::new(terminal_client.stdout_is_terminal());
    let (command, device) = args.into_command_and_device();

    dispatch(command, device.build_printer(), out, output_format, &painter)
}

#[instrument(
    skip_all,
    level = "info",
    fields(command = command.name(), ?output_format)
)]
fn dispatch<W>(
    command: Command,
    printer: MockPrinter,
    out: &mut W,
    output_format: OutputFormat,
    painter: &Painter,
) -> Result<()>
where
    W: io::Write,
{
    match command {
        Command::Upload(args) => {
            crate::cli::upload::run(printer, &args, out, output_format, painter)
        }
        Command::Send(args) => crate::cli::send::run(printer, &args, out, output_format, painter),
    }
}
