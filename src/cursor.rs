//! Little-endian field readers and signature scanning shared by the header codecs

use crate::error::{Result, ZipError};
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Bytes examined per read while scanning for a signature
const SCAN_BATCH: usize = 4096;

/// Upper bound on buffer space reserved from a size field before the bytes arrive
pub(crate) const PREALLOC_LIMIT: usize = 1 << 20;

pub(crate) fn read_u32<R: Read + ?Sized>(stream: &mut R, context: &'static str) -> Result<u32> {
    let mut buf = [0u8; 4];
    stream
        .read_exact(&mut buf)
        .map_err(|e| ZipError::from_read(e, 4, context))?;
    Ok(u32::from_le_bytes(buf))
}

/// Read exactly `len` bytes into a new buffer.
///
/// The buffer grows with the data actually read, so a bogus length in a
/// header cannot force a large allocation up front.
pub(crate) fn read_vec<R: Read + ?Sized>(
    stream: &mut R,
    len: usize,
    context: &'static str,
) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(len.min(PREALLOC_LIMIT));
    (&mut *stream)
        .take(len as u64)
        .read_to_end(&mut buf)
        .map_err(|e| ZipError::from_read(e, len, context))?;
    if buf.len() < len {
        return Err(ZipError::TruncatedStream {
            needed: len,
            context,
        });
    }
    Ok(buf)
}

/// Little-endian u16 at `at` within an already-read fixed-size record
pub(crate) fn le_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

/// Little-endian u32 at `at` within an already-read fixed-size record
pub(crate) fn le_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

/// Read a 4-byte little-endian signature
pub(crate) fn read_signature<R: Read + ?Sized>(stream: &mut R) -> Result<u32> {
    read_u32(stream, "signature")
}

/// Consume the next four bytes if they are `expected`.
///
/// On a mismatch, or when fewer than four bytes remain, the stream is put back
/// where it was and `false` is returned.
pub(crate) fn accept_signature<R: Read + Seek + ?Sized>(
    stream: &mut R,
    expected: u32,
) -> Result<bool> {
    let mut buf = [0u8; 4];
    let read = fill(stream, &mut buf)?;

    if read == buf.len() && u32::from_le_bytes(buf) == expected {
        return Ok(true);
    }

    stream.seek(SeekFrom::Current(-(read as i64)))?;
    Ok(false)
}

/// Scan forward for `target` and leave the stream just past it.
///
/// Returns the number of bytes between the starting position and the
/// signature. If the signature never appears the stream is rewound to where
/// the scan began and `None` is returned.
pub(crate) fn find_signature<R: Read + Seek + ?Sized>(
    stream: &mut R,
    target: u32,
) -> Result<Option<u64>> {
    let start = stream.stream_position()?;
    let needle = target.to_le_bytes();

    let mut batch = vec![0u8; SCAN_BATCH];
    let mut batch_start = start;
    let mut carried = 0usize;

    loop {
        let read = fill(stream, &mut batch[carried..])?;
        let filled = carried + read;

        if let Some(i) = batch[..filled].windows(4).position(|w| w == needle) {
            let found = batch_start + i as u64;
            stream.seek(SeekFrom::Start(found))?;
            if read_signature(stream)? == target {
                return Ok(Some(found - start));
            }
            break;
        }

        if read == 0 {
            break;
        }

        // keep the tail in case the signature straddles two batches
        let keep = filled.min(needle.len() - 1);
        batch.copy_within(filled - keep..filled, 0);
        batch_start += (filled - keep) as u64;
        carried = keep;
    }

    stream.seek(SeekFrom::Start(start))?;
    Ok(None)
}

/// Decode a name stored in a header.
///
/// Bytes are taken up to the first NUL or `max_len`, whichever comes first.
/// Valid UTF-8 is decoded as such; anything else is treated as a single-byte
/// (Latin-1) legacy name so every byte maps to exactly one character.
pub(crate) fn fixed_length_string(buffer: &[u8], start: usize, max_len: usize) -> String {
    let begin = start.min(buffer.len());
    let end = start.saturating_add(max_len).min(buffer.len());
    let bytes = &buffer[begin..end];
    let bytes = match bytes.iter().position(|&b| b == 0) {
        Some(nul) => &bytes[..nul],
        None => bytes,
    };

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Writer that tracks how many bytes have passed through it.
///
/// Header offsets are taken from this count, so the output does not need to be seekable.
pub(crate) struct PositionWriter<W> {
    inner: W,
    position: u64,
}

impl<W: Write> PositionWriter<W> {
    pub(crate) fn new(inner: W) -> Self {
        Self { inner, position: 0 }
    }

    pub(crate) fn position(&self) -> u64 {
        self.position
    }

    pub(crate) fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for PositionWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.position += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Read until `buf` is full or the stream ends, returning the byte count
fn fill<R: Read + ?Sized>(stream: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match stream.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}
