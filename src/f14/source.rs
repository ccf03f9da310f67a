//! Chunked line source over any buffered reader.

use std::io::BufRead;

/// Pulls raw lines off a reader in batches of at most `chunk_lines`.
///
/// The batch size is a memory and throughput knob only; it has no relation to
/// event boundaries, which routinely straddle batches. The final batch may be
/// short. Event logs are plain ASCII, so an invalid-UTF-8 read or any I/O
/// failure is a fatal input error and propagates.
#[derive(Debug)]
pub struct LineBatches<R> {
    reader: R,
    chunk_lines: usize,
}

impl<R: BufRead> LineBatches<R> {
    /// Wraps a reader; `chunk_lines` must be positive (validated at the
    /// configuration boundary).
    pub fn new(reader: R, chunk_lines: usize) -> Self {
        Self {
            reader,
            chunk_lines,
        }
    }

    /// Reads the next batch of lines, without their terminators.
    ///
    /// Returns `Ok(None)` once the input is exhausted.
    pub fn next_batch(&mut self) -> std::io::Result<Option<Vec<String>>> {
        let mut lines = Vec::with_capacity(self.chunk_lines);
        let mut buf = String::new();
        for _ in 0..self.chunk_lines {
            buf.clear();
            if self.reader.read_line(&mut buf)? == 0 {
                break;
            }
            while buf.ends_with('\n') || buf.ends_with('\r') {
                buf.pop();
            }
            lines.push(buf.clone());
        }
        if lines.is_empty() {
            Ok(None)
        } else {
            Ok(Some(lines))
        }
    }
}
