use thiserror::Error;

/// Recoverable, protocol-legal command failures.
///
/// The display text of each variant is exactly the line the firmware sends
/// back before the trailing `ok`.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum DomainError {
    #[error("no filename")]
    NoFilename,
    #[error("file not found")]
    FileNotFound { name: String },
    #[error("no file selected")]
    NoFileSelected,
    #[error("Not SD printing")]
    NotPrinting,
    #[error("no temperature")]
    NoTemperature,
    #[error("Deletion failed, File:")]
    DeletionWithoutFilename,
    #[error("Deletion failed, File: {name}")]
    DeletionFailed { name: String },
}

/// Errors returned by [`crate::MarlinClient`] when the device misbehaves.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(
        "unexpected reply to `{command}`: expected {expected:?}, got {actual:?}",
        expected = String::from_utf8_lossy(expected),
        actual = String::from_utf8_lossy(actual)
    )]
    UnexpectedReply {
        command: String,
        expected: Vec<u8>,
        actual: Vec<u8>,
    },
    #[error(
        "unexpected output while streaming file data: `{}`",
        crate::utils::format_reply(output)
    )]
    UnexpectedOutput { output: Vec<u8> },
    #[error("malformed file listing line `{line}`")]
    MalformedListing { line: String },
}

/// Errors returned when validating runtime options.
#[derive(Debug, Error)]
pub(crate) enum CliConfigError {
    #[error("error probability for {op} must be within 0..=1, got {value}")]
    ErrorProbabilityOutOfRange { op: &'static str, value: f64 },
    #[error("failed to read `{path}`")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },
    #[error("file name `{path}` cannot be used as an SD card name")]
    InvalidFileName { path: String },
}

/// Errors returned by telemetry initialisation.
#[derive(Debug, Error)]
pub(crate) enum TelemetryError {
    #[error("failed to install tracing subscriber")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}
