use std::io::BufRead;
use std::path::Path;

use crate::input::{InputError, open_reader};

/// A single input line with its terminator stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    /// Length in bytes of the line without `\n` or `\r\n`.
    pub bytes: usize,
}

/// Consecutive raw lines handed to the batch parser.
#[derive(Debug, Clone, Default)]
pub struct LineChunk {
    /// 1-based line number of `lines[0]`.
    pub first_line: usize,
    pub lines: Vec<String>,
    pub last_line_bytes: usize,
}

impl LineChunk {
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Lazy, single-pass reader over the lines of an input file.
pub struct LineSource {
    reader: Box<dyn BufRead>,
    total_bytes: u64,
    lines_read: usize,
    buf: Vec<u8>,
    exhausted: bool,
}

impl LineSource {
    pub fn open(path: &Path) -> Result<Self, InputError> {
        let reader = open_reader(path)?;
        let total_bytes = std::fs::metadata(path)
            .map_err(|source| InputError::Stat {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        Ok(Self {
            reader,
            total_bytes,
            lines_read: 0,
            buf: Vec::new(),
            exhausted: false,
        })
    }

    /// On-disk size of the input, used as the progress denominator.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn lines_read(&self) -> usize {
        self.lines_read
    }

    /// Reads up to `chunk_size` lines. Returns `None` once the input is exhausted.
    pub fn next_chunk(&mut self, chunk_size: usize) -> Result<Option<LineChunk>, InputError> {
        let mut chunk = LineChunk {
            first_line: self.lines_read + 1,
            lines: Vec::with_capacity(chunk_size),
            last_line_bytes: 0,
        };
        while chunk.lines.len() < chunk_size {
            match self.next() {
                Some(line) => {
                    let line = line?;
                    chunk.last_line_bytes = line.bytes;
                    chunk.lines.push(line.text);
                }
                None => break,
            }
        }
        if chunk.lines.is_empty() {
            return Ok(None);
        }
        Ok(Some(chunk))
    }

    fn read_line(&mut self) -> Result<Option<Line>, InputError> {
        self.buf.clear();
        let read = self
            .reader
            .read_until(b'\n', &mut self.buf)
            .map_err(|source| InputError::Read {
                line: self.lines_read + 1,
                source,
            })?;
        if read == 0 {
            return Ok(None);
        }
        let mut end = self.buf.len();
        if self.buf[..end].ends_with(b"\n") {
            end -= 1;
        }
        if self.buf[..end].ends_with(b"\r") {
            end -= 1;
        }
        self.lines_read += 1;
        Ok(Some(Line {
            text: String::from_utf8_lossy(&self.buf[..end]).into_owned(),
            bytes: end,
        }))
    }
}

impl Iterator for LineSource {
    type Item = Result<Line, InputError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        match self.read_line() {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => {
                self.exhausted = true;
                None
            }
            Err(e) => {
                self.exhausted = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/lines.rs"]
mod tests;
