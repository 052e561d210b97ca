use std::collections::VecDeque;

use tracing::trace;

use crate::utils::format_hex;

const LINE_TERMINATOR: u8 = b'\n';

/// Append/consume byte queue backing one direction of a serial link.
///
/// Reads never block: they return whatever prefix is buffered, which may be
/// empty.
#[derive(Debug, Default, Clone)]
pub struct ByteBuffer {
    content: VecDeque<u8>,
}

impl ByteBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends bytes to the end of the queue.
    pub fn append(&mut self, data: &[u8]) {
        self.content.extend(data);
    }

    /// Removes and returns up to `num_bytes` bytes from the front of the queue.
    pub fn read(&mut self, num_bytes: usize) -> Vec<u8> {
        let count = num_bytes.min(self.content.len());
        if count < num_bytes {
            trace!(requested = num_bytes, available = count, "short read");
        }
        self.content.drain(..count).collect()
    }

    /// Removes and returns everything up to and including the next `\n`.
    ///
    /// When no terminator is buffered the whole content is returned, so
    /// callers must check for a trailing `\n` to tell a complete line from a
    /// partial one.
    pub fn read_line(&mut self) -> Vec<u8> {
        let count = self
            .content
            .iter()
            .position(|&byte| byte == LINE_TERMINATOR)
            .map_or(self.content.len(), |index| index + 1);
        let line: Vec<u8> = self.content.drain(..count).collect();
        trace!(line = %format_hex(&line), "read line");
        line
    }

    /// Returns `true` when a complete `\n`-terminated line is buffered.
    #[must_use]
    pub fn has_line(&self) -> bool {
        self.content.contains(&LINE_TERMINATOR)
    }

    /// Number of buffered bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Drops all buffered bytes.
    pub fn clear(&mut self) {
        self.content.clear();
    }

    /// Copies the buffered bytes without consuming them.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.content.iter().copied().collect()
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(data: &[u8]) -> Self {
        Self {
            content: data.iter().copied().collect(),
        }
    }
}
