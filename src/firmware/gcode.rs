use std::collections::BTreeMap;

use tracing::instrument;

/// Register holding the first token that is not a register/value pair,
/// typically a filename.
pub const ANONYMOUS_REGISTER: char = '@';

/// Register/value arguments of one command line.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Arguments {
    registers: BTreeMap<char, String>,
}

impl Arguments {
    /// Returns the raw value stored for `register`.
    #[must_use]
    pub fn get(&self, register: char) -> Option<&str> {
        self.registers.get(&register).map(String::as_str)
    }

    /// Returns the anonymous argument.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.get(ANONYMOUS_REGISTER)
    }

    #[must_use]
    pub fn contains(&self, register: char) -> bool {
        self.registers.contains_key(&register)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(char, S)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (char, S)>>(iter: I) -> Self {
        Self {
            registers: iter
                .into_iter()
                .map(|(register, value)| (register, value.into()))
                .collect(),
        }
    }
}

/// A decoded command line: upper-cased code plus its arguments.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct GcodeLine {
    code: String,
    arguments: Arguments,
}

impl GcodeLine {
    /// Decodes one line. Returns `None` for blank lines.
    ///
    /// Tokens after the code starting with an ASCII uppercase letter become
    /// register/value pairs; any other token is stored under
    /// [`ANONYMOUS_REGISTER`], the last one winning.
    #[instrument(skip(line), level = "trace", fields(line_len = line.len()))]
    pub fn decode(line: &[u8]) -> Option<Self> {
        let text = String::from_utf8_lossy(line);
        let mut tokens = text.split_whitespace();
        let code = tokens.next()?.to_uppercase();

        let mut registers = BTreeMap::new();
        for token in tokens {
            let mut chars = token.chars();
            match chars.next() {
                Some(register) if register.is_ascii_uppercase() => {
                    registers.insert(register, chars.as_str().to_string());
                }
                _ => {
                    registers.insert(ANONYMOUS_REGISTER, token.to_string());
                }
            }
        }

        Some(Self {
            code,
            arguments: Arguments { registers },
        })
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }
}
