//! Chunked file-to-socket byte transfer.

use crate::range::ByteRange;
use std::fs::File;
use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};

/// Fixed read/write chunk size. Bounds peak memory per transfer no matter
/// how large the served file is.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Streams the given byte span from `file` to `sink` in [`CHUNK_SIZE`]
/// chunks, flushing after each write, and returns the number of bytes
/// actually delivered.
///
/// A peer that disappears mid-transfer is a normal outcome, not an error:
/// the partial count is returned and nothing propagates. Only unexpected
/// IO failures (a failed read, a non-disconnect write error) surface as
/// `Err`. Never writes more than `range.byte_count()` bytes.
pub fn stream_range<W: Write>(file: &mut File, range: &ByteRange, sink: &mut W) -> io::Result<u64> {
    file.seek(SeekFrom::Start(range.start))?;

    let mut remaining = range.byte_count();
    let mut written: u64 = 0;
    let mut buffer = vec![0u8; CHUNK_SIZE];

    while remaining > 0 {
        let to_read = remaining.min(CHUNK_SIZE as u64) as usize;
        let read = file.read(&mut buffer[..to_read])?;
        if read == 0 {
            // File shrank under us; stop at what we could deliver.
            break;
        }
        match write_chunk(sink, &buffer[..read]) {
            Ok(()) => {
                written += read as u64;
                remaining -= read as u64;
            }
            Err(e) if is_disconnect(&e) => return Ok(written),
            Err(e) => return Err(e),
        }
    }
    Ok(written)
}

fn write_chunk<W: Write>(sink: &mut W, chunk: &[u8]) -> io::Result<()> {
    sink.write_all(chunk)?;
    sink.flush()
}

/// Whether an IO error means the peer hung up.
pub fn is_disconnect(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::BrokenPipe
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::WriteZero
    )
}
