use std::fmt::{self, Display, Formatter};

use crate::cli::send::Exchange;

use super::painter::Painter;

const ACKNOWLEDGEMENT: &str = "ok";

/// Renders a `send` transcript: each command followed by its reply lines.
pub(crate) struct TranscriptView<'a> {
    exchanges: &'a [Exchange],
    painter: &'a Painter,
}

impl<'a> TranscriptView<'a> {
    pub(crate) fn new(exchanges: &'a [Exchange], painter: &'a Painter) -> Self {
        Self { exchanges, painter }
    }
}

impl Display for TranscriptView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (index, exchange) in self.exchanges.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", self.painter.heading(format!("> {}", exchange.command)))?;
            if exchange.reply.is_empty() {
                write!(f, "\n{}", self.painter.warning("<no reply>"))?;
            }
            for line in exchange.reply.lines() {
                let line = if line == ACKNOWLEDGEMENT {
                    self.painter.success(line)
                } else {
                    self.painter.value(line)
                };
                write!(f, "\n{line}")?;
            }
        }
        Ok(())
    }
}
