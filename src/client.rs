use tracing::{debug, instrument};

use crate::error::ClientError;
use crate::firmware::SdFileEntry;
use crate::transport::SerialPort;

const LISTING_MARKERS: [&[u8]; 3] = [b"Begin file list", b"End file list", b"ok"];
/// Prefixes of status lines the printer may interleave with any reply.
const STATUS_PREFIXES: [&[u8]; 2] = [b"NORMAL MODE:", b"T:"];

/// Thin G-code client that formats commands and checks replies verbatim.
///
/// ```
/// use marser::{MarlinClient, MockPrinter};
///
/// let mut client = MarlinClient::new(MockPrinter::new());
/// client.save_file("abc.g", b"G29\n")?;
/// assert_eq!(1, client.list_sd_card()?.len());
/// # Ok::<(), marser::ClientError>(())
/// ```
#[derive(Debug)]
pub struct MarlinClient<P> {
    port: P,
}

impl<P: SerialPort> MarlinClient<P> {
    #[must_use]
    pub fn new(port: P) -> Self {
        Self { port }
    }

    #[must_use]
    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    #[must_use]
    pub fn into_port(self) -> P {
        self.port
    }

    /// Reads everything currently available.
    pub fn read_all(&mut self) -> Vec<u8> {
        let available = self.port.bytes_available();
        self.port.read(available)
    }

    /// Sends one command line and returns the raw reply.
    pub fn send(&mut self, command: &str) -> Vec<u8> {
        self.port.write(format!("{command}\n").as_bytes());
        self.read_all()
    }

    /// Uploads `data` to the SD card as `filename`.
    ///
    /// A missing final newline is added, since an unterminated last line
    /// would swallow the closing `M29`.
    ///
    /// # Errors
    ///
    /// Returns an error when any reply differs from the expected text or the
    /// device answers while file data is being streamed.
    #[instrument(skip(self, data), level = "debug", fields(len = data.len()))]
    pub fn save_file(&mut self, filename: &str, data: &[u8]) -> Result<(), ClientError> {
        let command = format!("M28 {filename}");
        let reply = self.send(&command);
        expect_reply(&command, format!("Writing to file: {filename}\nok\n"), reply)?;

        self.port.write(data);
        if data.last().is_some_and(|&byte| byte != b'\n') {
            self.port.write(b"\n");
        }
        if self.port.bytes_available() > 0 {
            return Err(ClientError::UnexpectedOutput {
                output: self.read_all(),
            });
        }

        let reply = self.send("M29");
        expect_reply("M29", "Done saving file.\n", reply)?;
        debug!(filename, "file saved");
        Ok(())
    }

    /// Lists the SD card, skipping status lines emitted meanwhile.
    ///
    /// # Errors
    ///
    /// Returns an error when a listing line is not `<name> <size>`.
    pub fn list_sd_card(&mut self) -> Result<Vec<SdFileEntry>, ClientError> {
        let reply = self.send("M20");
        reply
            .trim_ascii()
            .split(|&byte| byte == b'\n')
            .map(<[u8]>::trim_ascii)
            .filter(|line| !line.is_empty() && !LISTING_MARKERS.contains(line))
            .filter(|line| !is_status_line(line))
            .map(parse_listing_line)
            .collect()
    }

    /// Deletes `filename` from the SD card.
    ///
    /// # Errors
    ///
    /// Returns an error when the device does not confirm the deletion.
    pub fn delete_sd_file(&mut self, filename: &str) -> Result<(), ClientError> {
        let command = format!("M30 {filename}");
        let reply = self.send(&command);
        expect_reply(&command, format!("File deleted:{filename}\nok\n"), reply)
    }

    /// Selects `filename` and starts printing it.
    ///
    /// # Errors
    ///
    /// Returns an error when either the selection or the start is refused.
    pub fn start_print(&mut self, filename: &str) -> Result<(), ClientError> {
        let command = format!("M23 {filename}");
        let reply = self.send(&command);
        expect_reply(&command, "ok\n", reply)?;

        let reply = self.send("M24");
        expect_reply("M24", "ok\n", reply)
    }

    /// Returns the raw `M31` reply.
    pub fn print_time(&mut self) -> Vec<u8> {
        self.send("M31")
    }

    /// Returns the raw `M115` reply.
    pub fn firmware_info(&mut self) -> Vec<u8> {
        self.send("M115")
    }

    /// Returns the raw `M105` reply.
    pub fn report_temperatures(&mut self) -> Vec<u8> {
        self.send("M105")
    }

    /// Sets the hotend target temperature.
    ///
    /// # Errors
    ///
    /// Returns an error when the device does not acknowledge the command.
    pub fn set_hotend_temperature(&mut self, celsius: u16) -> Result<(), ClientError> {
        let command = format!("M104 S{celsius}");
        let reply = self.send(&command);
        expect_reply(&command, "ok\n", reply)
    }

    /// Sets the bed target temperature.
    ///
    /// # Errors
    ///
    /// Returns an error when the device does not acknowledge the command.
    pub fn set_bed_temperature(&mut self, celsius: u16) -> Result<(), ClientError> {
        let command = format!("M140 S{celsius}");
        let reply = self.send(&command);
        expect_reply(&command, "ok\n", reply)
    }
}

fn expect_reply(
    command: &str,
    expected: impl Into<Vec<u8>>,
    actual: Vec<u8>,
) -> Result<(), ClientError> {
    let expected = expected.into();
    if actual == expected {
        return Ok(());
    }
    Err(ClientError::UnexpectedReply {
        command: command.to_string(),
        expected,
        actual,
    })
}

fn is_status_line(line: &[u8]) -> bool {
    STATUS_PREFIXES
        .iter()
        .any(|prefix| line.starts_with(prefix))
}

fn parse_listing_line(line: &[u8]) -> Result<SdFileEntry, ClientError> {
    let text = String::from_utf8_lossy(line);
    let malformed = || ClientError::MalformedListing {
        line: text.to_string(),
    };
    let mut fields = text.split_whitespace();
    let (Some(name), Some(size), None) = (fields.next(), fields.next(), fields.next()) else {
        return Err(malformed());
    };
    let size = size.parse().map_err(|_| malformed())?;
    Ok(SdFileEntry::new(name, size))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(b"abc.g 4", "abc.g", 4)]
    #[case(b"TEST.GCO 1024", "TEST.GCO", 1024)]
    fn listing_lines_parse(#[case] line: &[u8], #[case] name: &str, #[case] size: usize) {
        let entry = parse_listing_line(line).expect("well-formed line should parse");
        assert_eq!(SdFileEntry::new(name, size), entry);
    }

    #[rstest]
    #[case(b"abc.g")]
    #[case(b"abc.g four")]
    #[case(b"abc.g 4 extra")]
    fn malformed_listing_lines_are_rejected(#[case] line: &[u8]) {
        assert_matches!(
            parse_listing_line(line),
            Err(ClientError::MalformedListing { .. })
        );
    }

    #[rstest]
    #[case(b"NORMAL MODE: Percent done: 90; print time remaining in mins: 24", true)]
    #[case(b"T:20 E:0 B:20", true)]
    #[case(b"abc.g 4", false)]
    fn status_lines_are_recognised(#[case] line: &[u8], #[case] expected: bool) {
        assert_eq!(expected, is_status_line(line));
    }

    #[test]
    fn expect_reply_reports_both_sides() {
        let error = expect_reply("M24", "ok\n", b"no file selected\nok\n".to_vec())
            .expect_err("mismatched reply should fail");

        assert_eq!(
            r#"unexpected reply to `M24`: expected "ok\n", got "no file selected\nok\n""#,
            error.to_string()
        );
    }
}
