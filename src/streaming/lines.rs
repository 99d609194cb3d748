use bytes::{Buf, BytesMut};

/// Stateful splitter turning arbitrary body chunks into complete text lines
///
/// Bytes are buffered until a line terminator arrives, so a line (or a
/// multi-byte UTF-8 character) split across chunks is reassembled before
/// decoding. `\n`, `\r\n` and a bare `\r` all end a line.
pub struct LineSplitter {
    buffer: BytesMut,
    /// Prefix of `buffer` already known to hold no terminator
    scanned: usize,
    /// The last line ended with `\r` at a chunk boundary; a leading `\n` belongs to it
    skip_lf: bool,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(8192),
            scanned: 0,
            skip_lf: false,
        }
    }

    /// Feed new data and extract every line it completes
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut chunk = chunk;
        if self.skip_lf && !chunk.is_empty() {
            self.skip_lf = false;
            if chunk[0] == b'\n' {
                chunk = &chunk[1..];
            }
        }
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(offset) = self.buffer[self.scanned..]
            .iter()
            .position(|&b| b == b'\n' || b == b'\r')
        {
            let pos = self.scanned + offset;
            let terminator_len = match (self.buffer[pos], self.buffer.get(pos + 1).copied()) {
                (b'\r', Some(b'\n')) => 2,
                (b'\r', None) => {
                    self.skip_lf = true;
                    1
                }
                _ => 1,
            };

            let line = self.buffer.split_to(pos);
            self.buffer.advance(terminator_len);
            self.scanned = 0;
            lines.push(decode(&line));
        }
        self.scanned = self.buffer.len();
        lines
    }

    /// Flush a trailing line that never received its terminator
    pub fn finish(&mut self) -> Option<String> {
        self.scanned = 0;
        self.skip_lf = false;
        if self.buffer.is_empty() {
            return None;
        }
        let rest = self.buffer.split();
        Some(decode(&rest))
    }

    /// Number of bytes waiting for a terminator
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

impl Default for LineSplitter {
    fn default() -> Self {
        Self::new()
    }
}

fn decode(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}
