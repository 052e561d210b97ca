//! Virtual printer firmware.
//!
//! [`VirtualFirmware`] owns the device-facing end of a serial link. Each call
//! to [`VirtualFirmware::poll`] first emits any due asynchronous status lines
//! and then executes every complete command line waiting on the link, so the
//! output of one poll is the status chatter followed by the replies to the
//! whole buffered backlog.

mod clock;
mod command;
mod config;
mod file_store;
mod gcode;
mod handlers;
mod timer;

use std::time::{Duration, Instant};

use tracing::{debug, instrument, trace};

pub use self::clock::{Clock, ManualClock, SystemClock};
pub use self::command::CommandCode;
pub use self::config::{FirmwareConfig, ResetPolicy};
pub(crate) use self::config::{DEFAULT_FIRMWARE_NAME, DEFAULT_STATUS_INTERVAL};
pub use self::file_store::SdFileEntry;
pub use self::gcode::{ANONYMOUS_REGISTER, Arguments, GcodeLine};

use self::command::Reply;
use self::file_store::FileStore;
use self::timer::Timer;
use crate::error::DomainError;
use crate::transport::NoisyChannel;

const STOP_SD_WRITE: &[u8] = b"M29";
const ACKNOWLEDGEMENT: &[u8] = b"ok\n";
const PRINT_PROGRESS_LINE: &[u8] =
    b"NORMAL MODE: Percent done: 90; print time remaining in mins: 24\n";

/// Transient per-session state. Everything here is discarded by a reset; the
/// file store is not.
#[derive(Debug, Clone)]
struct SessionState {
    selected_file: Option<String>,
    write_file: Option<String>,
    hotend_target: u16,
    bed_target: u16,
    status_interval: Duration,
    printing: bool,
    print_started: bool,
    print_timer: Option<Timer>,
    temperature_timer: Option<Timer>,
    session_start: Instant,
}

impl SessionState {
    fn new(now: Instant, config: &FirmwareConfig) -> Self {
        Self {
            selected_file: None,
            write_file: None,
            hotend_target: 0,
            bed_target: 0,
            status_interval: config.status_interval(),
            printing: false,
            print_started: false,
            print_timer: None,
            temperature_timer: None,
            session_start: now,
        }
    }
}

/// Command interpreter emulating a Marlin-style printer with an SD card.
#[derive(Debug)]
pub struct VirtualFirmware {
    port: NoisyChannel,
    clock: Box<dyn Clock>,
    config: FirmwareConfig,
    files: FileStore,
    session: SessionState,
}

impl VirtualFirmware {
    /// Creates firmware driven by the wall clock.
    #[must_use]
    pub fn new(port: NoisyChannel, config: FirmwareConfig) -> Self {
        Self::with_clock(port, config, SystemClock)
    }

    /// Creates firmware driven by an explicit clock.
    #[must_use]
    pub fn with_clock(
        port: NoisyChannel,
        config: FirmwareConfig,
        clock: impl Clock + 'static,
    ) -> Self {
        let session = SessionState::new(clock.now(), &config);
        Self {
            port,
            clock: Box::new(clock),
            config,
            files: FileStore::default(),
            session,
        }
    }

    /// Emits due status lines, then executes every complete buffered line.
    ///
    /// A trailing partial line stays buffered for a later poll.
    #[instrument(skip(self), level = "debug", fields(pending = self.port.bytes_available()))]
    pub fn poll(&mut self) {
        let now = self.clock.now();
        self.emit_due_status(now);

        while self.port.has_line() {
            let line = self.port.read_line();
            self.process_line(&line);
        }
    }

    /// Discards transient session state and restarts the session clock.
    ///
    /// Stored files survive. Whether the print selection and an open write
    /// survive depends on [`ResetPolicy`].
    #[instrument(skip(self), level = "debug", fields(policy = ?self.config.reset_policy()))]
    pub fn reset(&mut self) {
        let previous = std::mem::replace(
            &mut self.session,
            SessionState::new(self.clock.now(), &self.config),
        );
        if self.config.reset_policy() == ResetPolicy::PreserveSelection {
            self.session.selected_file = previous.selected_file;
            self.session.write_file = previous.write_file;
        }
    }

    /// Opens `name` for writing, truncating any existing content.
    pub fn start_sd_write(&mut self, name: &str) {
        self.files.create(name);
        self.session.write_file = Some(name.to_string());
        debug!(name, "opened file for writing");
    }

    /// Appends bytes to `name`, creating it if needed.
    pub fn sd_append(&mut self, name: &str, data: &[u8]) {
        self.files.append(name, data);
    }

    /// Closes the file opened for writing, if any.
    pub fn stop_sd_write(&mut self) {
        if let Some(name) = self.session.write_file.take() {
            debug!(name = %name, "closed file");
        }
    }

    /// Deletes `name`, stopping the print if it was the selected file.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::DeletionFailed`] when the file does not exist.
    pub fn delete_file(&mut self, name: &str) -> Result<(), DomainError> {
        if !self.files.delete(name) {
            return Err(DomainError::DeletionFailed {
                name: name.to_string(),
            });
        }
        if self.session.selected_file.as_deref() == Some(name) {
            self.session.selected_file = None;
            self.stop_print();
        }
        if self.session.write_file.as_deref() == Some(name) {
            self.session.write_file = None;
        }
        Ok(())
    }

    /// Marks `name` as the file to print.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::FileNotFound`] when the file does not exist.
    pub fn select_file(&mut self, name: &str) -> Result<(), DomainError> {
        if !self.files.contains(name) {
            return Err(DomainError::FileNotFound {
                name: name.to_string(),
            });
        }
        self.session.selected_file = Some(name.to_string());
        Ok(())
    }

    /// Starts printing the selected file and arms the progress timer.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NoFileSelected`] when nothing is selected.
    pub fn start_print(&mut self) -> Result<(), DomainError> {
        let Some(name) = self.session.selected_file.as_deref() else {
            return Err(DomainError::NoFileSelected);
        };
        debug!(name, "print started");
        self.session.printing = true;
        self.session.print_started = true;
        self.rearm_print_timer();
        Ok(())
    }

    /// Lists stored files in creation order.
    #[must_use]
    pub fn list_files(&self) -> Vec<SdFileEntry> {
        self.files.list()
    }

    /// Returns the content of a stored file.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::FileNotFound`] when the file does not exist.
    pub fn file(&self, name: &str) -> Result<&[u8], DomainError> {
        self.files.get(name).ok_or_else(|| DomainError::FileNotFound {
            name: name.to_string(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &FirmwareConfig {
        &self.config
    }

    #[must_use]
    pub fn selected_file(&self) -> Option<&str> {
        self.session.selected_file.as_deref()
    }

    /// Name of the file currently capturing input lines.
    #[must_use]
    pub fn write_file(&self) -> Option<&str> {
        self.session.write_file.as_deref()
    }

    #[must_use]
    pub fn is_printing(&self) -> bool {
        self.session.printing
    }

    #[must_use]
    pub fn hotend_target(&self) -> u16 {
        self.session.hotend_target
    }

    #[must_use]
    pub fn bed_target(&self) -> u16 {
        self.session.bed_target
    }

    #[must_use]
    pub fn status_interval(&self) -> Duration {
        self.session.status_interval
    }

    #[must_use]
    pub fn print_timer_armed(&self) -> bool {
        self.session.print_timer.is_some()
    }

    #[must_use]
    pub fn temperature_timer_armed(&self) -> bool {
        self.session.temperature_timer.is_some()
    }

    fn emit_due_status(&mut self, now: Instant) {
        if self
            .session
            .print_timer
            .as_mut()
            .is_some_and(|timer| timer.tick(now))
        {
            trace!("print progress due");
            self.port.write(PRINT_PROGRESS_LINE);
        }
        if self
            .session
            .temperature_timer
            .as_mut()
            .is_some_and(|timer| timer.tick(now))
        {
            trace!("temperature report due");
            let report = format!("{}\n", self.temperature_report());
            self.port.write(report.as_bytes());
        }
    }

    fn process_line(&mut self, line: &[u8]) {
        if let Some(name) = &self.session.write_file
            && line.trim_ascii() != STOP_SD_WRITE
        {
            trace!(name = %name, len = line.len(), "captured line");
            self.files.append(name, line);
            return;
        }

        let Some(gcode) = GcodeLine::decode(line) else {
            trace!("ignoring blank line");
            return;
        };
        let reply = self.dispatch(&gcode);
        self.send_reply(&reply);
    }

    fn dispatch(&mut self, gcode: &GcodeLine) -> Reply {
        let Ok(code) = gcode.code().parse::<CommandCode>() else {
            debug!(code = gcode.code(), "unknown command");
            return Reply::line(format!("Unknown command: {}", gcode.code()));
        };

        match code.handler()(self, gcode.arguments()) {
            Ok(reply) => {
                debug!(%code, "command succeeded");
                reply
            }
            Err(error) => {
                debug!(%code, %error, "command failed");
                Reply::failure(&error)
            }
        }
    }

    fn send_reply(&mut self, reply: &Reply) {
        if !reply.as_str().is_empty() {
            self.port.write(reply.as_str().as_bytes());
        }
        if reply.acknowledge() {
            self.port.write(ACKNOWLEDGEMENT);
        }
    }

    fn stop_print(&mut self) {
        self.session.printing = false;
        self.session.print_timer = None;
    }

    fn rearm_print_timer(&mut self) {
        let interval = self.session.status_interval;
        self.session.print_timer = (self.session.printing && !interval.is_zero())
            .then(|| Timer::new(self.clock.now(), interval));
    }

    fn update_temperature_timer(&mut self) {
        let heating = self.session.hotend_target > 0 || self.session.bed_target > 0;
        if !heating {
            self.session.temperature_timer = None;
        } else if self.session.temperature_timer.is_none() {
            self.session.temperature_timer = Some(Timer::new(
                self.clock.now(),
                self.config.temperature_interval(),
            ));
        }
    }

    fn temperature_report(&self) -> String {
        let ambient = self.config.ambient_temperature();
        format!("T:{ambient} E:0 B:{ambient}")
    }
}
