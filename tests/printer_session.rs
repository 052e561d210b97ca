use std::time::Duration;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use rstest::rstest;

use marser::{
    ClientError, ErrorProbability, FirmwareConfig, LoopbackLink, ManualClock, MarlinClient,
    MockPrinter, ResetPolicy, SdFileEntry, SerialPort,
};

fn client_with_clock(config: FirmwareConfig) -> (MarlinClient<MockPrinter>, ManualClock) {
    let clock = ManualClock::new();
    let printer = MockPrinter::from_link_with_clock(LoopbackLink::new(), config, clock.clone());
    (MarlinClient::new(printer), clock)
}

#[test]
fn saved_files_are_listed_and_deleted() -> anyhow::Result<()> {
    let mut client = MarlinClient::new(MockPrinter::new());

    client.save_file("abc.g", b"G28\nG1 X10\n")?;
    client.save_file("TEST.GCO", b"M104 S200\n")?;
    assert_eq!(
        vec![
            SdFileEntry::new("abc.g", 11),
            SdFileEntry::new("TEST.GCO", 10),
        ],
        client.list_sd_card()?
    );

    client.delete_sd_file("abc.g")?;
    assert_eq!(vec![SdFileEntry::new("TEST.GCO", 10)], client.list_sd_card()?);
    assert_eq!(
        b"M104 S200\n".as_slice(),
        client.port().firmware().file("TEST.GCO")?
    );

    Ok(())
}

#[test]
fn resaving_a_file_replaces_its_content() -> anyhow::Result<()> {
    let mut client = MarlinClient::new(MockPrinter::new());

    client.save_file("abc.g", b"G28\nG28\nG28\n")?;
    client.save_file("abc.g", b"G29\n")?;

    assert_eq!(vec![SdFileEntry::new("abc.g", 4)], client.list_sd_card()?);
    Ok(())
}

#[test]
fn unterminated_upload_still_closes_the_file() -> anyhow::Result<()> {
    let mut client = MarlinClient::new(MockPrinter::new());

    client.save_file("a.g", b"G28\nG1 X5")?;

    assert_eq!(None, client.port().firmware().write_file());
    assert_eq!(b"G28\nG1 X5\n".as_slice(), client.port().firmware().file("a.g")?);
    assert_eq!(b"FIRMWARE NAME:Marlin mock\nok\n".to_vec(), client.firmware_info());
    Ok(())
}

#[test]
fn listing_skips_interleaved_status_lines() -> anyhow::Result<()> {
    let (mut client, clock) = client_with_clock(FirmwareConfig::default());
    client.save_file("abc.g", b"G28\n")?;
    client.start_print("abc.g")?;
    client.set_bed_temperature(60)?;

    clock.advance(Duration::from_secs(2));

    assert_eq!(vec![SdFileEntry::new("abc.g", 4)], client.list_sd_card()?);
    Ok(())
}

#[test]
fn unrepresentable_status_interval_keeps_the_printer_running() -> anyhow::Result<()> {
    let config = FirmwareConfig::builder()
        .status_interval(Duration::MAX)
        .build();
    let (mut client, clock) = client_with_clock(config);
    client.save_file("abc.g", b"G28\n")?;
    client.start_print("abc.g")?;

    clock.advance(Duration::from_secs(3_600));

    assert_eq!(b"".to_vec(), client.read_all());
    assert!(client.port().firmware().is_printing());
    Ok(())
}

#[test]
fn deleting_a_missing_file_is_reported() {
    let mut client = MarlinClient::new(MockPrinter::new());

    let error = client
        .delete_sd_file("ghost.g")
        .expect_err("missing file should not be deleted");
    assert_matches!(
        error,
        ClientError::UnexpectedReply { actual, .. }
            if actual == b"Deletion failed, File: ghost.g\nok\n"
    );
}

#[test]
fn printing_emits_progress_on_the_status_interval() -> anyhow::Result<()> {
    let config = FirmwareConfig::builder()
        .status_interval(Duration::from_secs(2))
        .build();
    let (mut client, clock) = client_with_clock(config);

    client.save_file("abc.g", b"G28\n")?;
    client.start_print("abc.g")?;
    assert!(client.port().firmware().is_printing());

    clock.advance(Duration::from_secs(1));
    assert_eq!(b"".to_vec(), client.read_all());

    clock.advance(Duration::from_millis(1500));
    assert_eq!(
        b"NORMAL MODE: Percent done: 90; print time remaining in mins: 24\n".to_vec(),
        client.read_all()
    );

    clock.advance(Duration::from_secs(60));
    assert_eq!(
        b"NORMAL MODE: Percent done: 90; print time remaining in mins: 24\necho:1 min, 2 sec\nok\n"
            .to_vec(),
        client.print_time()
    );
    Ok(())
}

#[test]
fn heating_emits_temperature_reports_until_cooled() -> anyhow::Result<()> {
    let (mut client, clock) = client_with_clock(FirmwareConfig::default());

    client.set_hotend_temperature(210)?;
    clock.advance(Duration::from_millis(1500));
    assert_eq!(b"T:20 E:0 B:20\n".to_vec(), client.read_all());

    client.set_hotend_temperature(0)?;
    clock.advance(Duration::from_secs(5));
    assert_eq!(b"".to_vec(), client.read_all());
    Ok(())
}

#[test]
fn partial_lines_wait_for_their_terminator() {
    let mut printer = MockPrinter::new();

    printer.write(b"M10");
    assert_eq!(0, printer.bytes_available());

    printer.write(b"5\n");
    let available = printer.bytes_available();
    assert_eq!(b"T:20 E:0 B:20\nok\n".to_vec(), printer.read(available));
}

#[test]
fn backlog_is_answered_in_order() {
    let mut printer = MockPrinter::new();

    printer.write(b"M105\n\nM999\nM24\n");
    let available = printer.bytes_available();

    assert_eq!(
        b"T:20 E:0 B:20\nok\nUnknown command: M999\nok\nno file selected\nok\n".to_vec(),
        printer.read(available)
    );
}

#[rstest]
#[case::clear(ResetPolicy::ClearSelection, None)]
#[case::preserve(ResetPolicy::PreserveSelection, Some("abc.g"))]
fn dtr_drop_resets_the_session(
    #[case] reset_policy: ResetPolicy,
    #[case] selected_after: Option<&str>,
) -> anyhow::Result<()> {
    let config = FirmwareConfig::builder().reset_policy(reset_policy).build();
    let (mut client, _clock) = client_with_clock(config);
    client.save_file("abc.g", b"G28\n")?;
    client.start_print("abc.g")?;

    client.port_mut().set_dtr(true);
    client.port_mut().set_dtr(false);

    let firmware = client.port().firmware();
    assert!(!firmware.is_printing());
    assert_eq!(selected_after, firmware.selected_file());
    assert_eq!(vec![SdFileEntry::new("abc.g", 4)], firmware.list_files());
    Ok(())
}

#[test]
fn reset_discards_unread_output() {
    let mut printer = MockPrinter::new();
    printer.write(b"M115\n");

    SerialPort::reset(&mut printer);

    assert_eq!(0, printer.bytes_available());
}

#[test]
fn corrupted_replies_are_rejected_by_the_client() {
    let noise = ErrorProbability::builder().read(1.0).build();
    let link = LoopbackLink::with_error_probability(noise, ErrorProbability::default());
    let mut client = MarlinClient::new(MockPrinter::from_link(link, FirmwareConfig::default()));

    let error = client
        .save_file("abc.g", b"G28\n")
        .expect_err("a corrupted reply should not match");

    assert_matches!(error, ClientError::UnexpectedReply { command, .. } if command == "M28 abc.g");
}
