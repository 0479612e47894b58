use crate::error::AppError;

/// An inclusive byte span within a file of known total size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
    pub total: u64,
}

impl ByteRange {
    /// Number of bytes covered by the span. Never zero: `end` is inclusive
    /// and parsing rejects inverted spans.
    pub fn byte_count(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Outcome of parsing a `Range` header against a known content length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSpec {
    /// Serve the whole file with status 200.
    Full,
    /// Serve the given span with status 206.
    Partial(ByteRange),
}

/// Parses a `Range` header value.
///
/// Supported forms are `bytes=start-end`, `bytes=start-` (to end of file)
/// and `bytes=-N` (last N bytes). A missing header yields `Full`, as does
/// a multi-range header (serving the whole file instead of a multipart
/// response is a deliberate simplification) or one we cannot parse.
/// A range starting at or beyond the end of file is unsatisfiable; the
/// caller must answer 416 with `Content-Range: bytes */<total>`.
pub fn parse_range(header: Option<&str>, total: u64) -> Result<RangeSpec, AppError> {
    let header = match header {
        Some(h) => h.trim(),
        None => return Ok(RangeSpec::Full),
    };
    let spec = match header.strip_prefix("bytes=") {
        Some(s) => s.trim(),
        None => return Ok(RangeSpec::Full),
    };
    if spec.contains(',') {
        return Ok(RangeSpec::Full);
    }

    if let Some(suffix) = spec.strip_prefix('-') {
        let n: u64 = match suffix.trim().parse() {
            Ok(n) => n,
            Err(_) => return Ok(RangeSpec::Full),
        };
        if n == 0 || total == 0 {
            return Err(AppError::UnsatisfiableRange(total));
        }
        return Ok(RangeSpec::Partial(ByteRange {
            start: total.saturating_sub(n),
            end: total - 1,
            total,
        }));
    }

    let (start_str, end_str) = match spec.split_once('-') {
        Some(parts) => parts,
        None => return Ok(RangeSpec::Full),
    };
    let start: u64 = match start_str.trim().parse() {
        Ok(v) => v,
        Err(_) => return Ok(RangeSpec::Full),
    };
    if start >= total {
        return Err(AppError::UnsatisfiableRange(total));
    }
    let end = if end_str.trim().is_empty() {
        total - 1
    } else {
        match end_str.trim().parse::<u64>() {
            // An end past the last byte is clamped, not rejected.
            Ok(v) => v.min(total - 1),
            Err(_) => return Ok(RangeSpec::Full),
        }
    };
    if start > end {
        return Err(AppError::UnsatisfiableRange(total));
    }
    Ok(RangeSpec::Partial(ByteRange { start, end, total }))
}
