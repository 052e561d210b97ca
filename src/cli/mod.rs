mod command;
pub(crate) mod send;
mod ui;
pub(crate) mod upload;

pub use self::command::{Args, Command, DeviceArgs, LogLevel, OutputFormat};
pub use self::send::SendArgs;
pub use self::upload::UploadArgs;

pub(crate) use self::ui::Painter;
