use std::io;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::cli::OutputFormat;
use crate::client::MarlinClient;
use crate::printer::MockPrinter;
use crate::utils::format_reply;

use super::ui::{Painter, TranscriptView};

/// Arguments for the `send` command.
#[derive(Debug, clap::Args)]
pub struct SendArgs {
    /// Command lines, sent in order; each is terminated with a newline.
    #[arg(required = true)]
    lines: Vec<String>,
}

impl SendArgs {
    /// Creates send arguments.
    ///
    /// ```
    /// use marser::SendArgs;
    ///
    /// let args = SendArgs::new(["M104 S200", "M105"]);
    /// let _ = args;
    /// ```
    #[must_use]
    pub fn new(lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

/// One command line and everything the printer wrote back.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub(crate) struct Exchange {
    pub(crate) command: String,
    pub(crate) reply: String,
}

/// Executes the `send` command.
#[instrument(skip_all, level = "info", fields(lines = args.lines.len()))]
pub(crate) fn run<W>(
    printer: MockPrinter,
    args: &SendArgs,
    out: &mut W,
    output_format: OutputFormat,
    painter: &Painter,
) -> Result<()>
where
    W: io::Write,
{
    let mut client = MarlinClient::new(printer);
    let exchanges: Vec<Exchange> = args
        .lines
        .iter()
        .map(|line| {
            let reply = client.send(line);
            debug!(command = %line, reply = %format_reply(&reply), "exchanged");
            Exchange {
                command: line.clone(),
                reply: String::from_utf8_lossy(&reply).into_owned(),
            }
        })
        .collect();

    match output_format {
        OutputFormat::Pretty => writeln!(out, "{}", TranscriptView::new(&exchanges, painter))?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &exchanges)?;
            writeln!(out)?;
        }
    }

    Ok(())
}
