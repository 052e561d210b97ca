use std::fmt::{self, Display, Formatter};

use tabled::{builder::Builder, settings::Style as TableStyle};

use super::painter::Painter;

/// Rows of cells rendered as a rounded table; the first record is the header.
#[derive(Debug)]
pub(crate) struct Table {
    records: Vec<Vec<String>>,
}

impl Table {
    /// Creates a table from a header row followed by data rows.
    pub(crate) fn grid(
        headers: impl IntoIterator<Item = impl Into<String>>,
        rows: impl IntoIterator<Item = Vec<String>>,
    ) -> Self {
        let header = headers.into_iter().map(Into::into).collect();
        Self {
            records: std::iter::once(header).chain(rows).collect(),
        }
    }

    /// Creates a field/value table; field names are muted.
    pub(crate) fn key_value<'f>(
        painter: &Painter,
        fields: impl IntoIterator<Item = (&'f str, String)>,
    ) -> Self {
        Self::grid(
            ["field", "value"],
            fields
                .into_iter()
                .map(|(field, value)| vec![painter.muted(field), value]),
        )
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut table = Builder::from(self.records.clone()).build();
        table.with(TableStyle::rounded());
        write!(f, "{table}")
    }
}
