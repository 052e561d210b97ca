use strum_macros::{Display, EnumIter, EnumString};

use super::VirtualFirmware;
use super::gcode::Arguments;
use crate::error::DomainError;

/// Command codes understood by the virtual firmware.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, EnumIter, EnumString, Display)]
pub enum CommandCode {
    /// List the SD card.
    #[strum(serialize = "M20")]
    ListFiles,
    /// Select an SD file for printing.
    #[strum(serialize = "M23")]
    SelectFile,
    /// Start printing the selected file.
    #[strum(serialize = "M24")]
    StartPrint,
    /// Report SD print status, or set the auto-report interval with `S`.
    #[strum(serialize = "M27")]
    ReportPrintStatus,
    /// Open a file and capture subsequent lines into it.
    #[strum(serialize = "M28")]
    StartSdWrite,
    /// Close the file opened by `M28`.
    #[strum(serialize = "M29")]
    StopSdWrite,
    /// Delete an SD file.
    #[strum(serialize = "M30")]
    DeleteFile,
    /// Report elapsed print time.
    #[strum(serialize = "M31")]
    PrintTime,
    /// Set the hotend target temperature.
    #[strum(serialize = "M104")]
    SetHotendTemperature,
    /// Report current temperatures.
    #[strum(serialize = "M105")]
    ReportTemperatures,
    /// Set the bed target temperature.
    #[strum(serialize = "M140")]
    SetBedTemperature,
    /// Report firmware identity.
    #[strum(serialize = "M115")]
    FirmwareInfo,
}

/// Text produced by one command, and whether it is followed by `ok`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct Reply {
    text: String,
    acknowledge: bool,
}

impl Reply {
    /// No output beyond the trailing `ok`.
    pub(crate) fn silent() -> Self {
        Self::text(String::new())
    }

    /// One line of output; the terminator is added here.
    pub(crate) fn line(line: impl AsRef<str>) -> Self {
        Self::text(format!("{}\n", line.as_ref()))
    }

    /// Pre-formatted output followed by `ok`.
    pub(crate) fn text(text: String) -> Self {
        Self {
            text,
            acknowledge: true,
        }
    }

    /// Pre-formatted output with no trailing `ok`.
    pub(crate) fn unacknowledged(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            acknowledge: false,
        }
    }

    pub(crate) fn failure(error: &DomainError) -> Self {
        Self::line(error.to_string())
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.text
    }

    pub(crate) fn acknowledge(&self) -> bool {
        self.acknowledge
    }
}

pub(crate) type Handler = fn(&mut VirtualFirmware, &Arguments) -> Result<Reply, DomainError>;

impl CommandCode {
    /// Returns the handler for this code.
    pub(crate) fn handler(self) -> Handler {
        match self {
            Self::ListFiles => VirtualFirmware::handle_list_files,
            Self::SelectFile => VirtualFirmware::handle_select_file,
            Self::StartPrint => VirtualFirmware::handle_start_print,
            Self::ReportPrintStatus => VirtualFirmware::handle_report_print_status,
            Self::StartSdWrite => VirtualFirmware::handle_start_sd_write,
            Self::StopSdWrite => VirtualFirmware::handle_stop_sd_write,
            Self::DeleteFile => VirtualFirmware::handle_delete_file,
            Self::PrintTime => VirtualFirmware::handle_print_time,
            Self::SetHotendTemperature => VirtualFirmware::handle_set_hotend_temperature,
            Self::ReportTemperatures => VirtualFirmware::handle_report_temperatures,
            Self::SetBedTemperature => VirtualFirmware::handle_set_bed_temperature,
            Self::FirmwareInfo => VirtualFirmware::handle_firmware_info,
        }
    }
}
