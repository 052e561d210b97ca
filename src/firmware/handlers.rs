use std::fmt::Write as _;
use std::time::Duration;

use tracing::debug;

use super::VirtualFirmware;
use super::command::Reply;
use super::gcode::Arguments;
use crate::error::DomainError;

/// Progress reported by `M27`, as a fraction of the selected file.
const REPORTED_PROGRESS: (usize, usize) = (9, 10);

impl VirtualFirmware {
    pub(super) fn handle_list_files(
        &mut self,
        _arguments: &Arguments,
    ) -> Result<Reply, DomainError> {
        let mut listing = String::from("Begin file list\n");
        for entry in self.files.list() {
            let _ = writeln!(listing, "{} {}", entry.name(), entry.size());
        }
        listing.push_str("End file list\n");
        Ok(Reply::text(listing))
    }

    pub(super) fn handle_select_file(
        &mut self,
        arguments: &Arguments,
    ) -> Result<Reply, DomainError> {
        let name = arguments.filename().ok_or(DomainError::NoFilename)?;
        self.select_file(name)?;
        Ok(Reply::silent())
    }

    pub(super) fn handle_start_print(
        &mut self,
        _arguments: &Arguments,
    ) -> Result<Reply, DomainError> {
        self.start_print()?;
        Ok(Reply::silent())
    }

    pub(super) fn handle_report_print_status(
        &mut self,
        arguments: &Arguments,
    ) -> Result<Reply, DomainError> {
        if let Some(value) = arguments.get('S') {
            match value.parse::<u64>() {
                Ok(seconds) => {
                    self.session.status_interval = Duration::from_secs(seconds);
                    self.rearm_print_timer();
                }
                Err(_) => debug!(value, "ignoring invalid status interval"),
            }
            return Ok(Reply::silent());
        }

        if !self.session.printing {
            return Err(DomainError::NotPrinting);
        }
        let size = self
            .session
            .selected_file
            .as_deref()
            .and_then(|name| self.files.get(name))
            .map_or(0, <[u8]>::len);
        let (numerator, denominator) = REPORTED_PROGRESS;
        let position = size * numerator / denominator;
        Ok(Reply::line(format!("printing byte {position}/{size}")))
    }

    pub(super) fn handle_start_sd_write(
        &mut self,
        arguments: &Arguments,
    ) -> Result<Reply, DomainError> {
        let name = arguments.filename().ok_or(DomainError::NoFilename)?;
        self.start_sd_write(name);
        Ok(Reply::line(format!("Writing to file: {name}")))
    }

    pub(super) fn handle_stop_sd_write(
        &mut self,
        _arguments: &Arguments,
    ) -> Result<Reply, DomainError> {
        self.stop_sd_write();
        Ok(Reply::unacknowledged("Done saving file.\n"))
    }

    pub(super) fn handle_delete_file(
        &mut self,
        arguments: &Arguments,
    ) -> Result<Reply, DomainError> {
        let name = arguments
            .filename()
            .ok_or(DomainError::DeletionWithoutFilename)?;
        self.delete_file(name)?;
        Ok(Reply::line(format!("File deleted:{name}")))
    }

    /// Elapsed time is measured from session start, not from print start.
    pub(super) fn handle_print_time(
        &mut self,
        _arguments: &Arguments,
    ) -> Result<Reply, DomainError> {
        let elapsed = if self.session.print_started {
            self.clock
                .now()
                .saturating_duration_since(self.session.session_start)
        } else {
            Duration::ZERO
        };
        let seconds = elapsed.as_secs();
        Ok(Reply::line(format!(
            "echo:{} min, {} sec",
            seconds / 60,
            seconds % 60
        )))
    }

    pub(super) fn handle_set_hotend_temperature(
        &mut self,
        arguments: &Arguments,
    ) -> Result<Reply, DomainError> {
        self.session.hotend_target = parse_temperature(arguments)?;
        self.update_temperature_timer();
        Ok(Reply::silent())
    }

    pub(super) fn handle_set_bed_temperature(
        &mut self,
        arguments: &Arguments,
    ) -> Result<Reply, DomainError> {
        self.session.bed_target = parse_temperature(arguments)?;
        self.update_temperature_timer();
        Ok(Reply::silent())
    }

    pub(super) fn handle_report_temperatures(
        &mut self,
        _arguments: &Arguments,
    ) -> Result<Reply, DomainError> {
        Ok(Reply::line(self.temperature_report()))
    }

    pub(super) fn handle_firmware_info(
        &mut self,
        _arguments: &Arguments,
    ) -> Result<Reply, DomainError> {
        Ok(Reply::line(format!(
            "FIRMWARE NAME:{}",
            self.config.firmware_name()
        )))
    }
}

/// Reads a non-negative `S` temperature, rounding fractional degrees.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_temperature(arguments: &Arguments) -> Result<u16, DomainError> {
    let value = arguments.get('S').ok_or(DomainError::NoTemperature)?;
    let celsius: f64 = value.parse().map_err(|_| DomainError::NoTemperature)?;
    if !celsius.is_finite() || celsius < 0.0 {
        return Err(DomainError::NoTemperature);
    }
    Ok(celsius.round().min(f64::from(u16::MAX)) as u16)
}
