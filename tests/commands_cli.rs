use std::path::PathBuf;

use clap::Parser;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

#[derive(Debug, Default)]
struct FakeTerminalClient;

impl marser::TerminalClient for FakeTerminalClient {
    fn stdout_is_terminal(&self) -> bool {
        false
    }

    fn stderr_is_terminal(&self) -> bool {
        false
    }
}

fn run_with_parsed_args(args: marser::Args) -> anyhow::Result<String> {
    let mut output = Vec::new();
    marser::run_with_terminal(args, &mut output, &FakeTerminalClient)?;
    Ok(String::from_utf8(output)?)
}

fn run_with_argv<const N: usize>(argv: [&str; N]) -> anyhow::Result<String> {
    run_with_parsed_args(marser::Args::try_parse_from(argv)?)
}

/// Writes `content` to a file unique to this test process.
fn job_file(name: &str, content: &[u8]) -> anyhow::Result<PathBuf> {
    let directory = std::env::temp_dir().join(format!("marser-cli-{}", std::process::id()));
    std::fs::create_dir_all(&directory)?;
    let path = directory.join(name);
    std::fs::write(&path, content)?;
    Ok(path)
}

#[test]
fn upload_command_reports_card_as_json() -> anyhow::Result<()> {
    let first = job_file("first.g", b"G28\n")?;
    let second = job_file("second.g", b"G28\nG1 X5\n")?;
    let args = marser::Args::new(marser::Command::Upload(marser::UploadArgs::new(
        [first, second],
        true,
    )));

    let stdout = run_with_parsed_args(args)?;
    let report: Value = serde_json::from_str(&stdout)?;

    assert_eq!(
        json!({
            "firmware": "Marlin mock",
            "uploaded": [
                {"name": "first.g", "size": 4},
                {"name": "second.g", "size": 10},
            ],
            "printing": "second.g",
            "card": [
                {"name": "first.g", "size": 4},
                {"name": "second.g", "size": 10},
            ],
        }),
        report
    );
    Ok(())
}

#[test]
fn upload_command_renders_tables_when_asked() -> anyhow::Result<()> {
    let path = job_file("pretty.g", b"G29\n")?;
    let args = marser::Args::new(marser::Command::Upload(marser::UploadArgs::new(
        [path],
        false,
    )))
    .with_output(marser::OutputFormat::Pretty);

    let stdout = run_with_parsed_args(args)?;

    assert!(stdout.starts_with("Session:\n"));
    assert!(stdout.contains("│ printing │ idle"));
    assert!(stdout.contains("│ pretty.g │ 4 B  │"));
    Ok(())
}

#[test]
fn upload_command_fails_for_missing_file() {
    let args = marser::Args::new(marser::Command::Upload(marser::UploadArgs::new(
        ["/nonexistent/marser/job.g"],
        false,
    )));

    let error = run_with_parsed_args(args).expect_err("missing input should fail");
    assert_eq!(
        "failed to read `/nonexistent/marser/job.g`",
        error.to_string()
    );
}

#[test]
fn send_command_uses_device_flags() -> anyhow::Result<()> {
    let stdout = run_with_argv([
        "marser",
        "--firmware-name",
        "Prusa mock",
        "send",
        "M115",
        "M104 S-5",
    ])?;
    let transcript: Value = serde_json::from_str(&stdout)?;

    assert_eq!(
        json!([
            {"command": "M115", "reply": "FIRMWARE NAME:Prusa mock\nok\n"},
            {"command": "M104 S-5", "reply": "no temperature\nok\n"},
        ]),
        transcript
    );
    Ok(())
}

#[test]
fn send_command_renders_transcript() -> anyhow::Result<()> {
    let stdout = run_with_argv(["marser", "--output", "pretty", "send", "M20", "M30"])?;

    assert_eq!(
        "> M20\nBegin file list\nEnd file list\nok\n> M30\nDeletion failed, File:\nok\n",
        stdout
    );
    Ok(())
}

#[test]
fn corrupted_upload_surfaces_client_error() -> anyhow::Result<()> {
    let path = job_file("noisy.g", b"G28\n")?;

    let error = run_with_argv([
        "marser",
        "--read-error-probability",
        "1",
        "--seed",
        "3",
        "upload",
        path.to_str().unwrap_or_default(),
    ])
    .expect_err("every reply is corrupted");

    assert!(
        error
            .to_string()
            .starts_with("unexpected reply to `M28 noisy.g`")
    );
    Ok(())
}
