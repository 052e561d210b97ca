use owo_colors::{OwoColorize, Style as OwoStyle};
use strum_macros::EnumIter;

/// Visual role of a piece of output text.
#[derive(Debug, Clone, Copy, Eq, PartialEq, EnumIter)]
pub(crate) enum Tone {
    Heading,
    Success,
    Warning,
    Muted,
    Value,
}

impl Tone {
    fn style(self) -> OwoStyle {
        match self {
            Self::Heading => OwoStyle::new().bold().cyan(),
            Self::Success => OwoStyle::new().bold().green(),
            Self::Warning => OwoStyle::new().bold().yellow(),
            Self::Muted => OwoStyle::new().dimmed(),
            Self::Value => OwoStyle::new().bold(),
        }
    }
}

/// Applies colour to terminal text, or passes it through untouched.
#[derive(Debug)]
pub(crate) struct Painter {
    use_colour: bool,
}

impl Painter {
    pub(crate) fn new(use_colour: bool) -> Self {
        Self { use_colour }
    }

    pub(crate) fn paint(&self, tone: Tone, text: impl AsRef<str>) -> String {
        let text = text.as_ref();
        if self.use_colour {
            text.style(tone.style()).to_string()
        } else {
            text.to_string()
        }
    }

    pub(crate) fn heading(&self, text: impl AsRef<str>) -> String {
        self.paint(Tone::Heading, text)
    }

    pub(crate) fn success(&self, text: impl AsRef<str>) -> String {
        self.paint(Tone::Success, text)
    }

    pub(crate) fn warning(&self, text: impl AsRef<str>) -> String {
        self.paint(Tone::Warning, text)
    }

    pub(crate) fn muted(&self, text: impl AsRef<str>) -> String {
        self.paint(Tone::Muted, text)
    }

    pub(crate) fn value(&self, text: impl AsRef<str>) -> String {
        self.paint(Tone::Value, text)
    }
}
