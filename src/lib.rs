mod app;
mod cli;
mod client;
mod error;
mod firmware;
mod printer;
mod telemetry;
mod terminal;
mod transport;
mod utils;

pub use app::{run, run_with_terminal};
pub use cli::{Args, Command, DeviceArgs, LogLevel, OutputFormat, SendArgs, UploadArgs};
pub use client::MarlinClient;
pub use error::{ClientError, DomainError};
pub use firmware::{
    ANONYMOUS_REGISTER, Arguments, Clock, CommandCode, FirmwareConfig, GcodeLine, ManualClock,
    ResetPolicy, SdFileEntry, SystemClock, VirtualFirmware,
};
pub use printer::MockPrinter;
pub use terminal::{SystemTerminalClient, TerminalClient};
pub use transport::{ByteBuffer, ErrorProbability, LoopbackLink, NoiseOp, NoisyChannel, SerialPort};
