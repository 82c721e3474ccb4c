//! One file's worth of data inside an archive
//!
//! An entry is either pending (it references raw bytes or a file that will be
//! compressed on save) or archived (its local header and compressed payload
//! were read from an existing archive and are inflated on extraction).
//!
//! Writing is two-phase: [`ZipEntry::compress`] produces a [`CompressedPayload`]
//! with the CRC and sizes, then [`ZipEntry::emit_header`] writes the local
//! header followed by the payload. Sizes are therefore always known before the
//! header goes out and the written header never sets the data-descriptor flag.

use crate::codec::DeflateCodec;
use crate::crc32;
use crate::cursor::{
    accept_signature, find_signature, fixed_length_string, le_u16, le_u32, read_signature,
    read_u32, read_vec, PositionWriter, PREALLOC_LIMIT,
};
use crate::dos_time::{self, DaylightSaving};
use crate::error::{Result, ZipError};
use crate::options::ArchiveOptions;
use chrono::{Local, NaiveDateTime};
use std::fs::{self, File};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// ZIP local file header signature
pub(crate) const LOCAL_FILE_HEADER_SIGNATURE: u32 = 0x04034b50;

/// ZIP data descriptor signature
pub(crate) const DATA_DESCRIPTOR_SIGNATURE: u32 = 0x08074b50;

/// Fixed part of a local file header, signature included
pub(crate) const LOCAL_HEADER_LEN: usize = 30;

/// Version needed to extract: 2.0 (deflate)
pub(crate) const VERSION_NEEDED: u16 = 0x0014;

/// General purpose flag bit 3: CRC and sizes follow the payload in a data descriptor
pub(crate) const FLAG_DATA_DESCRIPTOR: u16 = 1 << 3;

/// Compression methods this codec understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    /// No compression (stored)
    Stored,
    /// DEFLATE compression
    Deflate,
}

impl CompressionMethod {
    pub fn to_zip_method(self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
        }
    }
}

impl TryFrom<u16> for CompressionMethod {
    type Error = ZipError;

    fn try_from(method: u16) -> Result<Self> {
        match method {
            0 => Ok(CompressionMethod::Stored),
            8 => Ok(CompressionMethod::Deflate),
            other => Err(ZipError::UnsupportedCompression(other)),
        }
    }
}

/// Where a pending entry's bytes come from
#[derive(Debug, Clone)]
pub enum EntrySource {
    Bytes(Vec<u8>),
    File(PathBuf),
}

#[derive(Debug, Clone)]
enum Payload {
    /// Not compressed yet
    Pending(EntrySource),
    /// Raw compressed bytes read from an archive
    Archived(Vec<u8>),
    /// Already written to an output; the bytes are not retained
    Written,
}

/// Result of the first write phase
#[derive(Debug, Clone)]
pub struct CompressedPayload {
    pub bytes: Vec<u8>,
    pub crc32: u32,
    pub uncompressed_size: u64,
}

/// A single entry of a ZIP archive
#[derive(Debug, Clone)]
pub struct ZipEntry {
    name: String,
    last_modified: NaiveDateTime,
    version_needed: u16,
    bit_flags: u16,
    compression_method: u16,
    packed_time: u32,
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    extra_field: Vec<u8>,
    payload: Payload,
    local_header_offset: Option<u64>,
    local_header: Vec<u8>,
}

impl ZipEntry {
    fn pending(name: String, source: EntrySource, last_modified: NaiveDateTime) -> Self {
        Self {
            name: name.replace('\\', "/"),
            last_modified,
            version_needed: VERSION_NEEDED,
            bit_flags: 0,
            compression_method: CompressionMethod::Deflate.to_zip_method(),
            packed_time: 0,
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            extra_field: Vec::new(),
            payload: Payload::Pending(source),
            local_header_offset: None,
            local_header: Vec::new(),
        }
    }

    /// Entry holding `bytes` under `name`
    pub fn from_bytes(
        name: impl Into<String>,
        bytes: Vec<u8>,
        last_modified: NaiveDateTime,
    ) -> Self {
        Self::pending(name.into(), EntrySource::Bytes(bytes), last_modified)
    }

    /// Entry for the file at `path`, named after the path itself
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Self::from_file_as(path, path.to_string_lossy())
    }

    /// Entry for the file at `path`, stored under `name`
    pub fn from_file_as(path: impl AsRef<Path>, name: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = fs::metadata(path).map_err(|e| ZipError::file_system(path, e))?;
        let modified = metadata
            .modified()
            .map(dos_time::from_system_time)
            .unwrap_or_else(|_| Local::now().naive_local());

        Ok(Self::pending(
            name.into(),
            EntrySource::File(path.to_path_buf()),
            modified,
        ))
    }

    /// Zero-length directory marker; a trailing `/` is appended if missing
    pub fn directory(name: impl Into<String>, last_modified: NaiveDateTime) -> Self {
        let mut name = name.into().replace('\\', "/");
        if !name.ends_with('/') {
            name.push('/');
        }
        Self::pending(name, EntrySource::Bytes(Vec::new()), last_modified)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_dir(&self) -> bool {
        self.name.ends_with('/')
    }

    pub fn last_modified(&self) -> NaiveDateTime {
        self.last_modified
    }

    pub fn version_needed(&self) -> u16 {
        self.version_needed
    }

    pub fn bit_flags(&self) -> u16 {
        self.bit_flags
    }

    /// Whether the sizes were deferred to a trailing data descriptor
    pub fn has_data_descriptor(&self) -> bool {
        self.bit_flags & FLAG_DATA_DESCRIPTOR != 0
    }

    /// Raw method code from the header
    pub fn method_code(&self) -> u16 {
        self.compression_method
    }

    pub fn compression_method(&self) -> Result<CompressionMethod> {
        CompressionMethod::try_from(self.compression_method)
    }

    pub fn packed_time(&self) -> u32 {
        self.packed_time
    }

    pub fn crc32(&self) -> u32 {
        self.crc32
    }

    pub fn compressed_size(&self) -> u32 {
        self.compressed_size
    }

    pub fn uncompressed_size(&self) -> u32 {
        self.uncompressed_size
    }

    pub fn extra_field(&self) -> &[u8] {
        &self.extra_field
    }

    /// Offset of the local header in the archive; `None` until written or read
    pub fn local_header_offset(&self) -> Option<u64> {
        self.local_header_offset
    }

    /// Exact bytes of the local header (signature, fixed fields, name, extra)
    pub fn local_header(&self) -> &[u8] {
        &self.local_header
    }

    /// Source of a pending entry
    pub fn source(&self) -> Option<&EntrySource> {
        match &self.payload {
            Payload::Pending(source) => Some(source),
            _ => None,
        }
    }

    // ---- write side ----

    /// Checksum and deflate the whole source in one pass
    pub fn compress(&self, codec: &dyn DeflateCodec) -> Result<CompressedPayload> {
        let Payload::Pending(source) = &self.payload else {
            return Err(ZipError::NotWritable);
        };

        let mut sink = codec.encoder();
        let (crc32, uncompressed_size) = match source {
            EntrySource::Bytes(bytes) => crc32::compute(&mut &bytes[..], Some(&mut *sink))?,
            EntrySource::File(path) => {
                let file = File::open(path).map_err(|e| ZipError::file_system(path, e))?;
                crc32::compute(&mut BufReader::new(file), Some(&mut *sink))
                    .map_err(|e| ZipError::file_system(path, e))?
            }
        };
        let bytes = sink.finish()?;

        Ok(CompressedPayload {
            bytes,
            crc32,
            uncompressed_size,
        })
    }

    /// Write the local header for `payload` at the writer's current position,
    /// followed by the name and the compressed bytes
    pub(crate) fn emit_header<W: Write>(
        &mut self,
        out: &mut PositionWriter<W>,
        payload: CompressedPayload,
        options: &ArchiveOptions,
    ) -> Result<u64> {
        let too_large =
            |size: u64| ZipError::Zip64Required(format!("{} is {} bytes", self.name, size));
        let uncompressed_size = u32::try_from(payload.uncompressed_size)
            .map_err(|_| too_large(payload.uncompressed_size))?;
        let compressed_size = u32::try_from(payload.bytes.len() as u64)
            .map_err(|_| too_large(payload.bytes.len() as u64))?;

        let name = archive_name(&self.name, options.trim_volume_from_fully_qualified_paths);
        let name_len = u16::try_from(name.len()).map_err(|_| {
            ZipError::InvalidName(format!("{} bytes exceed the 65535-byte limit", name.len()))
        })?;
        let packed_time =
            dos_time::to_packed(options.daylight_saving.adjust_for_write(self.last_modified));
        let method = CompressionMethod::Deflate.to_zip_method();

        let mut header = Vec::with_capacity(LOCAL_HEADER_LEN + name.len());
        header.extend_from_slice(&LOCAL_FILE_HEADER_SIGNATURE.to_le_bytes());
        header.extend_from_slice(&VERSION_NEEDED.to_le_bytes());
        header.extend_from_slice(&0u16.to_le_bytes()); // general purpose bit flag
        header.extend_from_slice(&method.to_le_bytes());
        header.extend_from_slice(&packed_time.to_le_bytes()); // mod time, then date
        header.extend_from_slice(&payload.crc32.to_le_bytes());
        header.extend_from_slice(&compressed_size.to_le_bytes());
        header.extend_from_slice(&uncompressed_size.to_le_bytes());
        header.extend_from_slice(&name_len.to_le_bytes());
        header.extend_from_slice(&0u16.to_le_bytes()); // extra len
        header.extend_from_slice(name.as_bytes());

        let offset = out.position();
        out.write_all(&header)?;
        out.write_all(&payload.bytes)?;

        trace!(
            name = %name,
            offset,
            compressed_size,
            uncompressed_size,
            "wrote local entry"
        );

        self.name = name;
        self.version_needed = VERSION_NEEDED;
        self.bit_flags = 0;
        self.compression_method = method;
        self.packed_time = packed_time;
        self.crc32 = payload.crc32;
        self.compressed_size = compressed_size;
        self.uncompressed_size = uncompressed_size;
        self.extra_field.clear();
        self.local_header = header;
        self.local_header_offset = Some(offset);
        self.payload = Payload::Written;

        Ok(offset)
    }

    /// Compress the entry and write it; returns the local header offset
    pub(crate) fn write_to<W: Write>(
        &mut self,
        out: &mut PositionWriter<W>,
        codec: &dyn DeflateCodec,
        options: &ArchiveOptions,
    ) -> Result<u64> {
        let payload = self.compress(codec)?;
        self.emit_header(out, payload, options)
    }

    // ---- read side ----

    /// Parse the next local entry (header and payload).
    ///
    /// Returns `None`, with the stream left untouched, when the next four
    /// bytes are not a local file header signature.
    pub fn read_next<R: Read + Seek + ?Sized>(stream: &mut R) -> Result<Option<Self>> {
        let offset = stream.stream_position()?;
        if !accept_signature(stream, LOCAL_FILE_HEADER_SIGNATURE)? {
            return Ok(None);
        }

        let fixed = read_vec(stream, LOCAL_HEADER_LEN - 4, "local file header")?;
        let version_needed = le_u16(&fixed, 0);
        let bit_flags = le_u16(&fixed, 2);
        let compression_method = le_u16(&fixed, 4);
        let packed_time = le_u32(&fixed, 6);
        let mut crc32 = le_u32(&fixed, 10);
        let mut compressed_size = le_u32(&fixed, 14);
        let mut uncompressed_size = le_u32(&fixed, 18);
        let name_len = le_u16(&fixed, 22) as usize;
        let extra_len = le_u16(&fixed, 24) as usize;

        let name_bytes = read_vec(stream, name_len, "entry name")?;
        let name = fixed_length_string(&name_bytes, 0, name_len);
        let extra_field = read_vec(stream, extra_len, "extra field")?;

        let data = if bit_flags & FLAG_DATA_DESCRIPTOR != 0 {
            let data_start = stream.stream_position()?;
            let skipped = find_signature(stream, DATA_DESCRIPTOR_SIGNATURE)?.ok_or_else(|| {
                ZipError::CorruptArchive(format!("data descriptor for {} not found", name))
            })?;

            stream.seek(SeekFrom::Start(data_start))?;
            let data = read_vec(stream, skipped as usize, "entry payload")?;
            read_signature(stream)?;
            crc32 = read_u32(stream, "data descriptor")?;
            compressed_size = read_u32(stream, "data descriptor")?;
            uncompressed_size = read_u32(stream, "data descriptor")?;

            if compressed_size as u64 != skipped {
                return Err(ZipError::CorruptArchive(format!(
                    "{}: data descriptor declares {} compressed bytes but {} precede it",
                    name, compressed_size, skipped
                )));
            }
            data
        } else {
            read_vec(stream, compressed_size as usize, "entry payload")?
        };

        let mut local_header = Vec::with_capacity(LOCAL_HEADER_LEN + name_len + extra_len);
        local_header.extend_from_slice(&LOCAL_FILE_HEADER_SIGNATURE.to_le_bytes());
        local_header.extend_from_slice(&fixed);
        local_header.extend_from_slice(&name_bytes);
        local_header.extend_from_slice(&extra_field);

        trace!(name = %name, offset, compressed_size, "read local entry");

        Ok(Some(Self {
            name,
            last_modified: dos_time::from_packed(packed_time),
            version_needed,
            bit_flags,
            compression_method,
            packed_time,
            crc32,
            compressed_size,
            uncompressed_size,
            extra_field,
            payload: Payload::Archived(data),
            local_header_offset: Some(offset),
            local_header,
        }))
    }

    /// Inflate the archived payload and verify its CRC.
    ///
    /// Equal compressed and uncompressed sizes mean the payload is taken as
    /// stored; the method code is only consulted when that guess fails the CRC.
    pub fn decompress(&self, codec: Option<&dyn DeflateCodec>) -> Result<Vec<u8>> {
        let Payload::Archived(raw) = &self.payload else {
            return Err(ZipError::NotExtractable(self.name.clone()));
        };

        if self.compressed_size == self.uncompressed_size {
            if crc32::checksum(raw) == self.crc32
                || self.compression_method != CompressionMethod::Deflate.to_zip_method()
            {
                return self.verified(raw.clone());
            }
            debug!(name = %self.name, "equal sizes but CRC mismatch, inflating instead");
        }

        let codec = codec.ok_or(ZipError::MissingCompressor)?;
        let mut data = Vec::with_capacity((self.uncompressed_size as usize).min(PREALLOC_LIMIT));
        codec
            .decoder(raw)
            .read_to_end(&mut data)
            .map_err(|e| {
                ZipError::CorruptArchive(format!("failed to inflate {}: {}", self.name, e))
            })?;

        self.verified(data)
    }

    fn verified(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        let actual = crc32::checksum(&data);
        if actual != self.crc32 {
            return Err(ZipError::CorruptArchive(format!(
                "CRC mismatch for {}: expected 0x{:08x}, got 0x{:08x}",
                self.name, self.crc32, actual
            )));
        }
        Ok(data)
    }

    /// Decompress into `out`; returns the number of bytes written
    pub fn extract_to<W: Write + ?Sized>(
        &self,
        out: &mut W,
        codec: Option<&dyn DeflateCodec>,
    ) -> Result<u64> {
        let data = self.decompress(codec)?;
        out.write_all(&data)?;
        Ok(data.len() as u64)
    }

    /// Extract to the file at `destination` and restore its modification time.
    ///
    /// Directory markers only create the directory.
    pub fn extract_to_path(
        &self,
        destination: &Path,
        codec: Option<&dyn DeflateCodec>,
        daylight_saving: DaylightSaving,
    ) -> Result<()> {
        if self.is_dir() {
            fs::create_dir_all(destination).map_err(|e| ZipError::file_system(destination, e))?;
            return Ok(());
        }

        let data = self.decompress(codec)?;

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|e| ZipError::file_system(parent, e))?;
        }
        let mut file =
            File::create(destination).map_err(|e| ZipError::file_system(destination, e))?;
        file.write_all(&data)
            .map_err(|e| ZipError::file_system(destination, e))?;

        let modified = daylight_saving.adjust_for_extract(self.last_modified);
        match dos_time::to_system_time(modified) {
            Some(time) => file
                .set_modified(time)
                .map_err(|e| ZipError::file_system(destination, e))?,
            None => warn!(name = %self.name, %modified, "cannot map timestamp to local time"),
        }

        trace!(name = %self.name, path = %destination.display(), "extracted entry");
        Ok(())
    }
}

/// Name as written to the archive: forward slashes, and optionally without a
/// `C:\` volume prefix or leading slashes
pub(crate) fn archive_name(name: &str, trim_volume: bool) -> String {
    let name = name.replace('\\', "/");
    if !trim_volume {
        return name;
    }

    let bytes = name.as_bytes();
    let without_volume = if bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && bytes[2] == b'/'
    {
        &name[3..]
    } else {
        &name[..]
    };

    without_volume.trim_start_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::FlateCodec;
    use chrono::NaiveDate;
    use std::io::Cursor;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 3, 4)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn options() -> ArchiveOptions {
        ArchiveOptions::default().daylight_saving(DaylightSaving::Ignore)
    }

    fn written(entry: &mut ZipEntry) -> Vec<u8> {
        let mut out = PositionWriter::new(Vec::new());
        entry
            .write_to(&mut out, &FlateCodec::default(), &options())
            .unwrap();
        out.into_inner()
    }

    /// Hand-built stored entry whose sizes live in a trailing data descriptor
    fn deferred_entry(data: &[u8], declared_size: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&LOCAL_FILE_HEADER_SIGNATURE.to_le_bytes());
        buf.extend_from_slice(&20u16.to_le_bytes());
        buf.extend_from_slice(&FLAG_DATA_DESCRIPTOR.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes()); // stored
        buf.extend_from_slice(&dos_time::to_packed(noon()).to_le_bytes());
        buf.extend_from_slice(&[0; 12]); // crc and sizes deferred
        buf.extend_from_slice(&5u16.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(b"a.txt");
        buf.extend_from_slice(data);
        buf.extend_from_slice(&DATA_DESCRIPTOR_SIGNATURE.to_le_bytes());
        buf.extend_from_slice(&crc32::checksum(data).to_le_bytes());
        buf.extend_from_slice(&declared_size.to_le_bytes());
        buf.extend_from_slice(&(data.len() as u32).to_le_bytes());
        buf
    }

    #[test]
    fn test_local_header_layout() {
        let mut entry = ZipEntry::from_bytes("Test.txt", b"Hello World".to_vec(), noon());
        let bytes = written(&mut entry);

        assert_eq!(&bytes[0..4], &[0x50, 0x4b, 0x03, 0x04]);
        assert_eq!(le_u16(&bytes, 4), 0x0014);
        assert_eq!(le_u16(&bytes, 6), 0);
        assert_eq!(le_u16(&bytes, 8), 8);
        assert_eq!(le_u32(&bytes, 10), dos_time::to_packed(noon()));
        assert_eq!(le_u32(&bytes, 14), crc32::checksum(b"Hello World"));
        assert_eq!(le_u32(&bytes, 22), 11);
        assert_eq!(le_u16(&bytes, 26), 8);
        assert_eq!(le_u16(&bytes, 28), 0);
        assert_eq!(&bytes[30..38], b"Test.txt");

        let compressed = le_u32(&bytes, 18) as usize;
        assert_eq!(bytes.len(), 38 + compressed);
        assert_eq!(entry.local_header(), &bytes[..38]);
        assert_eq!(entry.local_header_offset(), Some(0));
        assert_eq!(entry.uncompressed_size(), 11);
    }

    #[test]
    fn test_unwritten_entry_has_no_offset() {
        let entry = ZipEntry::from_bytes("x", vec![1, 2, 3], noon());
        assert_eq!(entry.local_header_offset(), None);
        assert!(entry.local_header().is_empty());
    }

    #[test]
    fn test_source_is_released_after_write() {
        let mut entry = ZipEntry::from_bytes("src.txt", b"payload".to_vec(), noon());
        assert!(matches!(entry.source(), Some(EntrySource::Bytes(b)) if b == b"payload"));

        written(&mut entry);
        assert!(entry.source().is_none());
        assert!(entry.extra_field().is_empty());
        assert_eq!(entry.compression_method().unwrap(), CompressionMethod::Deflate);
    }

    #[test]
    fn test_empty_payload_is_still_deflated() {
        let mut entry = ZipEntry::from_bytes("empty", Vec::new(), noon());
        written(&mut entry);
        assert_eq!(entry.method_code(), 8);
        assert_eq!(entry.uncompressed_size(), 0);
        assert!(entry.compressed_size() > 0);
    }

    #[test]
    fn test_write_then_read_next() {
        let mut entry = ZipEntry::from_bytes("dir\\file.bin", vec![42; 4000], noon());
        let bytes = written(&mut entry);

        let mut c = Cursor::new(bytes);
        let read = ZipEntry::read_next(&mut c).unwrap().unwrap();
        assert_eq!(read.name(), "dir/file.bin");
        assert_eq!(read.last_modified(), noon());
        assert_eq!(read.local_header(), entry.local_header());
        assert_eq!(read.decompress(Some(&FlateCodec::default())).unwrap(), vec![42; 4000]);

        // end of stream: no more entries
        assert!(ZipEntry::read_next(&mut c).unwrap().is_none());
    }

    #[test]
    fn test_read_next_rejects_other_signature() {
        let mut c = Cursor::new(vec![0x50, 0x4b, 0x01, 0x02, 0, 0, 0, 0]);
        assert!(ZipEntry::read_next(&mut c).unwrap().is_none());
        assert_eq!(c.position(), 0);
    }

    #[test]
    fn test_read_deferred_sizes() {
        let mut c = Cursor::new(deferred_entry(b"hello", 5));
        let entry = ZipEntry::read_next(&mut c).unwrap().unwrap();

        assert!(entry.has_data_descriptor());
        assert_eq!(entry.compressed_size(), 5);
        assert_eq!(entry.uncompressed_size(), 5);
        assert_eq!(entry.crc32(), crc32::checksum(b"hello"));
        assert_eq!(c.position(), c.get_ref().len() as u64);
        assert_eq!(entry.decompress(None).unwrap(), b"hello");
    }

    #[test]
    fn test_descriptor_size_mismatch_is_corrupt() {
        let mut c = Cursor::new(deferred_entry(b"hello", 4));
        match ZipEntry::read_next(&mut c) {
            Err(ZipError::CorruptArchive(_)) => {}
            other => panic!("expected corrupt archive, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_payload() {
        let mut entry = ZipEntry::from_bytes("t", vec![1; 100], noon());
        let mut bytes = written(&mut entry);
        bytes.truncate(bytes.len() - 1);

        match ZipEntry::read_next(&mut Cursor::new(bytes)) {
            Err(ZipError::TruncatedStream { .. }) => {}
            other => panic!("expected truncation, got {:?}", other),
        }
    }

    #[test]
    fn test_oversized_declared_payload_is_truncated() {
        let mut header = Vec::new();
        header.extend_from_slice(&LOCAL_FILE_HEADER_SIGNATURE.to_le_bytes());
        header.extend_from_slice(&20u16.to_le_bytes());
        header.extend_from_slice(&0u16.to_le_bytes());
        header.extend_from_slice(&8u16.to_le_bytes());
        header.extend_from_slice(&dos_time::to_packed(noon()).to_le_bytes());
        header.extend_from_slice(&0u32.to_le_bytes());
        header.extend_from_slice(&0xFFFF_FFF0u32.to_le_bytes()); // compressed size
        header.extend_from_slice(&0xFFFF_FFF0u32.to_le_bytes()); // uncompressed size
        header.extend_from_slice(&1u16.to_le_bytes());
        header.extend_from_slice(&0u16.to_le_bytes());
        header.push(b'x');
        assert_eq!(header.len(), 31);

        match ZipEntry::read_next(&mut Cursor::new(header)) {
            Err(ZipError::TruncatedStream {
                needed: 0xFFFF_FFF0,
                ..
            }) => {}
            other => panic!("expected truncation, got {:?}", other),
        }
    }

    #[test]
    fn test_crc_mismatch_on_extract() {
        let mut bytes = deferred_entry(b"hello", 5);
        let crc_at = bytes.len() - 12;
        bytes[crc_at] ^= 0xFF;

        let entry = ZipEntry::read_next(&mut Cursor::new(bytes)).unwrap().unwrap();
        assert!(matches!(entry.decompress(None), Err(ZipError::CorruptArchive(_))));
    }

    #[test]
    fn test_pending_entry_is_not_extractable() {
        let entry = ZipEntry::from_bytes("p", vec![1], noon());
        assert!(matches!(
            entry.decompress(None),
            Err(ZipError::NotExtractable(_))
        ));
    }

    #[test]
    fn test_archive_name_rules() {
        assert_eq!(archive_name("C:\\data\\a.txt", true), "data/a.txt");
        assert_eq!(archive_name("C:\\data\\a.txt", false), "C:/data/a.txt");
        assert_eq!(archive_name("/tmp/x/y.bin", true), "tmp/x/y.bin");
        assert_eq!(archive_name("rel/path.txt", true), "rel/path.txt");
        assert_eq!(archive_name("1:\\a", true), "1:/a");
    }

    #[test]
    fn test_directory_marker() {
        let entry = ZipEntry::directory("docs\\empty", noon());
        assert_eq!(entry.name(), "docs/empty/");
        assert!(entry.is_dir());
    }

    #[test]
    fn test_method_codes() {
        assert_eq!(CompressionMethod::try_from(8).unwrap(), CompressionMethod::Deflate);
        assert_eq!(CompressionMethod::try_from(0).unwrap(), CompressionMethod::Stored);
        assert!(matches!(
            CompressionMethod::try_from(93),
            Err(ZipError::UnsupportedCompression(93))
        ));
    }
}
