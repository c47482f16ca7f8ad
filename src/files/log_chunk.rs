use crate::errors::{AppError, AppResult};
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

#[derive(Debug, Clone, Copy)]
pub struct ChunkLimits {
    pub default: u64,
    pub max: u64,
}

impl ChunkLimits {
    /// Parses the raw `offset`/`limit` query values. The offset must be a
    /// non-negative integer; the limit is clamped to `1..=max`. Integers too
    /// large for `u64` saturate rather than fail.
    pub fn parse(&self, offset: Option<&str>, limit: Option<&str>) -> AppResult<(u64, u64)> {
        let offset = match offset {
            None => 0,
            Some(raw) => match parse_integer(raw) {
                None => return Err(AppError::invalid("invalid offset")),
                Some((true, v)) if v > 0 => {
                    return Err(AppError::invalid("offset must be non-negative"))
                }
                Some((_, v)) => v,
            },
        };
        let limit = match limit {
            None => self.default,
            Some(raw) => match parse_integer(raw) {
                None => return Err(AppError::invalid("invalid limit")),
                Some((true, _)) => 1,
                Some((false, v)) => v,
            },
        };
        Ok((offset, limit.clamp(1, self.max)))
    }
}

/// `(negative, magnitude)` for an optionally signed run of ASCII digits.
fn parse_integer(raw: &str) -> Option<(bool, u64)> {
    let raw = raw.trim();
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // only overflow can fail once the digits are checked
    Some((negative, digits.parse().unwrap_or(u64::MAX)))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogChunk {
    pub offset: u64,
    pub next_offset: u64,
    pub size: u64,
    pub eof: bool,
    pub content: String,
}

/// Reads at most `limit` bytes starting at `offset`, clamped to the size seen
/// just before the read. Undecodable bytes are replaced, never rejected.
pub fn read_chunk(path: &Path, offset: u64, limit: u64) -> AppResult<LogChunk> {
    let mut file = File::open(path)?;
    let meta = file.metadata()?;
    if !meta.is_file() {
        return Err(AppError::invalid("not a file"));
    }
    let size = meta.len();
    let offset = offset.min(size);
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = Vec::with_capacity(limit.min(size - offset) as usize);
    file.take(limit).read_to_end(&mut buf)?;
    // bytes consumed, not characters decoded
    let next_offset = offset + buf.len() as u64;
    Ok(LogChunk {
        offset,
        next_offset,
        size,
        eof: next_offset >= size,
        content: String::from_utf8_lossy(&buf).into_owned(),
    })
}
