use std::fmt::{self, Display, Formatter};

use crate::cli::upload::UploadReport;
use crate::firmware::SdFileEntry;

use super::painter::Painter;
use super::table::Table;

#[derive(Debug, Clone, Copy, Eq, PartialEq, derive_more::Display, derive_more::From)]
#[display("{_0} B")]
struct Bytes(usize);

/// Renders the outcome of an upload: session summary, then the card listing.
pub(crate) struct UploadReportView<'a> {
    report: &'a UploadReport,
    painter: &'a Painter,
}

impl<'a> UploadReportView<'a> {
    pub(crate) fn new(report: &'a UploadReport, painter: &'a Painter) -> Self {
        Self { report, painter }
    }

    fn file_table(&self, entries: &[SdFileEntry]) -> Table {
        let rows = entries.iter().map(|entry| {
            vec![
                self.painter.value(entry.name()),
                Bytes::from(entry.size()).to_string(),
            ]
        });
        Table::grid(["name", "size"], rows)
    }
}

impl Display for UploadReportView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let printing = match &self.report.printing {
            Some(name) => self.painter.success(name),
            None => self.painter.muted("idle"),
        };
        let summary = Table::key_value(
            self.painter,
            [
                ("firmware", self.painter.value(&self.report.firmware)),
                ("uploaded", self.report.uploaded.len().to_string()),
                ("printing", printing),
            ],
        );

        write!(f, "{}", self.painter.heading("Session:"))?;
        write!(f, "\n{summary}")?;
        writeln!(f)?;
        write!(f, "\n{}", self.painter.heading("SD card:"))?;
        if self.report.card.is_empty() {
            write!(f, "\n{}", self.painter.warning("no files"))
        } else {
            write!(f, "\n{}", self.file_table(&self.report.card))
        }
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    fn report(printing: Option<&str>, card: Vec<SdFileEntry>) -> UploadReport {
        UploadReport {
            firmware: "Marlin mock".to_string(),
            uploaded: card.clone(),
            printing: printing.map(str::to_string),
            card,
        }
    }

    #[test]
    fn renders_summary_and_card() {
        let painter = Painter::new(false);
        let report = report(Some("abc.g"), vec![SdFileEntry::new("abc.g", 4)]);

        assert_snapshot!(UploadReportView::new(&report, &painter).to_string(), @r"
        Session:
        ╭──────────┬─────────────╮
        │ field    │ value       │
        ├──────────┼─────────────┤
        │ firmware │ Marlin mock │
        │ uploaded │ 1           │
        │ printing │ abc.g       │
        ╰──────────┴─────────────╯

        SD card:
        ╭───────┬──────╮
        │ name  │ size │
        ├───────┼──────┤
        │ abc.g │ 4 B  │
        ╰───────┴──────╯
        ");
    }

    #[test]
    fn empty_card_is_called_out() {
        let painter = Painter::new(false);
        let rendered = UploadReportView::new(&report(None, Vec::new()), &painter).to_string();

        assert!(rendered.contains("│ printing │ idle"));
        assert!(rendered.ends_with("SD card:\nno files"));
    }
}
