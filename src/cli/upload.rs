use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;
use tracing::{info, instrument};

use crate::cli::OutputFormat;
use crate::client::MarlinClient;
use crate::error::CliConfigError;
use crate::firmware::SdFileEntry;
use crate::printer::MockPrinter;

use super::ui::{Painter, UploadReportView};

const FIRMWARE_NAME_PREFIX: &str = "FIRMWARE NAME:";

/// Arguments for the `upload` command.
#[derive(Debug, clap::Args)]
pub struct UploadArgs {
    /// Files to save on the virtual SD card, named after their file names.
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// Select and start printing the last uploaded file.
    #[arg(long)]
    print: bool,
}

impl UploadArgs {
    /// Creates upload arguments.
    ///
    /// ```
    /// use marser::UploadArgs;
    ///
    /// let args = UploadArgs::new(["TEST.GCO"], true);
    /// let _ = args;
    /// ```
    #[must_use]
    pub fn new(files: impl IntoIterator<Item = impl Into<PathBuf>>, print: bool) -> Self {
        Self {
            files: files.into_iter().map(Into::into).collect(),
            print,
        }
    }
}

/// Result of an `upload` run.
#[derive(Debug, Serialize)]
pub(crate) struct UploadReport {
    pub(crate) firmware: String,
    pub(crate) uploaded: Vec<SdFileEntry>,
    pub(crate) printing: Option<String>,
    pub(crate) card: Vec<SdFileEntry>,
}

/// Executes the `upload` command.
#[instrument(skip_all, level = "info", fields(files = args.files.len(), print = args.print))]
pub(crate) fn run<W>(
    printer: MockPrinter,
    args: &UploadArgs,
    out: &mut W,
    output_format: OutputFormat,
    painter: &Painter,
) -> Result<()>
where
    W: io::Write,
{
    let mut client = MarlinClient::new(printer);
    let firmware = firmware_name(&client.firmware_info());

    let mut uploaded = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let name = sd_name(path)?;
        let data = std::fs::read(path).map_err(|source| CliConfigError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        client.save_file(&name, &data)?;
        info!(name = %name, size = data.len(), "uploaded");
        uploaded.push(SdFileEntry::new(name, data.len()));
    }

    let printing = match uploaded.last() {
        Some(entry) if args.print => {
            client.start_print(entry.name())?;
            Some(entry.name().to_string())
        }
        _ => None,
    };
    let card = client.list_sd_card()?;

    let report = UploadReport {
        firmware,
        uploaded,
        printing,
        card,
    };
    match output_format {
        OutputFormat::Pretty => writeln!(out, "{}", UploadReportView::new(&report, painter))?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
    }

    Ok(())
}

fn sd_name(path: &Path) -> Result<String, CliConfigError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.chars().any(char::is_whitespace))
        .map(str::to_string)
        .ok_or_else(|| CliConfigError::InvalidFileName {
            path: path.display().to_string(),
        })
}

/// Extracts the identity from an `M115` reply, falling back to its first line.
fn firmware_name(reply: &[u8]) -> String {
    let text = String::from_utf8_lossy(reply);
    let first_line = text.lines().next().unwrap_or_default();
    first_line
        .strip_prefix(FIRMWARE_NAME_PREFIX)
        .unwrap_or(first_line)
        .to_string()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(b"FIRMWARE NAME:Marlin mock\nok\n", "Marlin mock")]
    #[case(b"garbled\nok\n", "garbled")]
    #[case(b"", "")]
    fn firmware_name_strips_prefix(#[case] reply: &[u8], #[case] expected: &str) {
        assert_eq!(expected, firmware_name(reply));
    }

    #[test]
    fn sd_name_uses_file_name() {
        assert_eq!(
            "abc.g",
            sd_name(Path::new("/tmp/jobs/abc.g")).expect("plain name should be accepted")
        );
    }

    #[test]
    fn sd_name_rejects_whitespace() {
        assert_matches!(
            sd_name(Path::new("my part.g")),
            Err(CliConfigError::InvalidFileName { .. })
        );
    }
}
