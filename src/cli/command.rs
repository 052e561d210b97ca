use std::time::Duration;

use bon::Builder;
use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::level_filters::LevelFilter;

use crate::cli::send::SendArgs;
use crate::cli::upload::UploadArgs;
use crate::error::CliConfigError;
use crate::firmware::{DEFAULT_FIRMWARE_NAME, DEFAULT_STATUS_INTERVAL, FirmwareConfig, ResetPolicy};
use crate::printer::MockPrinter;
use crate::transport::{ErrorProbability, LoopbackLink};

/// Command-line options for the virtual printer tool.
#[derive(Debug, Parser)]
#[command(
    name = "marser",
    version,
    about = "Drive a virtual Marlin printer over an emulated serial link."
)]
pub struct Args {
    /// Log verbosity; overrides `RUST_LOG`.
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,
    /// Output format; defaults to `pretty` on a terminal and `json` otherwise.
    #[arg(long, global = true, value_enum)]
    output: Option<OutputFormat>,
    #[command(flatten)]
    device: DeviceArgs,
    #[command(subcommand)]
    command: Command,
}

impl Args {
    /// Creates argument values directly without CLI parsing.
    ///
    /// ```
    /// use marser::{Args, Command, SendArgs};
    ///
    /// let args = Args::new(Command::Send(SendArgs::new(["M115"])));
    /// let _ = args;
    /// ```
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self {
            log_level: None,
            output: None,
            device: DeviceArgs::builder().build(),
            command,
        }
    }

    /// Replaces the virtual device settings.
    #[must_use]
    pub fn with_device(mut self, device: DeviceArgs) -> Self {
        self.device = device;
        self
    }

    /// Forces an output format.
    #[must_use]
    pub fn with_output(mut self, output: OutputFormat) -> Self {
        self.output = Some(output);
        self
    }

    #[must_use]
    pub fn log_level(&self) -> Option<LogLevel> {
        self.log_level
    }

    #[must_use]
    pub fn output_format(&self) -> Option<OutputFormat> {
        self.output
    }

    /// Splits parsed arguments into the command and the device settings.
    #[must_use]
    pub fn into_command_and_device(self) -> (Command, DeviceArgs) {
        (self.command, self.device)
    }
}

/// Settings of the emulated link and firmware.
#[derive(Debug, Clone, clap::Args, Builder)]
pub struct DeviceArgs {
    /// Probability of corrupting one byte of each payload sent to the printer.
    #[arg(long, global = true, default_value_t = 0.0, value_parser = parse_write_probability)]
    #[builder(default)]
    write_error_probability: f64,
    /// Probability of corrupting one byte of each payload read from the printer.
    #[arg(long, global = true, default_value_t = 0.0, value_parser = parse_read_probability)]
    #[builder(default)]
    read_error_probability: f64,
    /// Seed for the noise source, for reproducible corruption.
    #[arg(long, global = true)]
    seed: Option<u64>,
    /// Print progress interval (e.g. `500ms`, `2s`).
    #[arg(long, global = true, default_value = "1s", value_parser = parse_duration)]
    #[builder(default = DEFAULT_STATUS_INTERVAL)]
    status_interval: Duration,
    /// Identity reported by `M115`.
    #[arg(long, global = true, default_value = DEFAULT_FIRMWARE_NAME)]
    #[builder(into, default = String::from(DEFAULT_FIRMWARE_NAME))]
    firmware_name: String,
    /// Whether a reset keeps the selected and open-for-write files.
    #[arg(long, global = true, value_enum, default_value_t = ResetPolicy::ClearSelection)]
    #[builder(default)]
    reset_policy: ResetPolicy,
}

impl DeviceArgs {
    /// Builds a fresh virtual printer from these settings.
    #[must_use]
    pub fn build_printer(&self) -> MockPrinter {
        let noise = ErrorProbability::builder()
            .read(self.read_error_probability)
            .write(self.write_error_probability)
            .build();
        let link = LoopbackLink::with_error_probability(noise, ErrorProbability::default())
            .map_client(|client| match self.seed {
                Some(seed) => client.with_noise_source(StdRng::seed_from_u64(seed)),
                None => client,
            });
        let config = FirmwareConfig::builder()
            .firmware_name(self.firmware_name.clone())
            .status_interval(self.status_interval)
            .reset_policy(self.reset_policy)
            .build();

        MockPrinter::from_link(link, config)
    }
}

/// Supported CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Save files to the virtual SD card, optionally print the last one, and list the card.
    Upload(UploadArgs),
    /// Send raw command lines one at a time and show each reply.
    Send(SendArgs),
}

impl Command {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Upload(_args) => "upload",
            Self::Send(_args) => "send",
        }
    }
}

/// Log verbosity accepted by `--log-level`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub(crate) fn as_level_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::ERROR,
            Self::Warn => LevelFilter::WARN,
            Self::Info => LevelFilter::INFO,
            Self::Debug => LevelFilter::DEBUG,
            Self::Trace => LevelFilter::TRACE,
        }
    }
}

/// Rendering of command results.
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables.
    Pretty,
    /// Machine-readable JSON.
    Json,
}

fn parse_duration(value: &str) -> Result<Duration, String> {
    humantime::parse_duration(value).map_err(|error| error.to_string())
}

fn parse_write_probability(value: &str) -> Result<f64, String> {
    parse_probability("write", value)
}

fn parse_read_probability(value: &str) -> Result<f64, String> {
    parse_probability("read", value)
}

fn parse_probability(op: &'static str, value: &str) -> Result<f64, String> {
    let parsed: f64 = value.parse().map_err(|error| format!("{error}"))?;
    if !(0.0..=1.0).contains(&parsed) {
        return Err(CliConfigError::ErrorProbabilityOutOfRange { op, value: parsed }.to_string());
    }
    Ok(parsed)
}
