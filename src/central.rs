//! Central directory records and the end-of-central-directory footer

use crate::cursor::{accept_signature, fixed_length_string, le_u16, le_u32, read_vec};
use crate::entry::{ZipEntry, LOCAL_HEADER_LEN};
use crate::error::{Result, ZipError};
use std::io::{Read, Seek, Write};

/// ZIP central directory signature
pub(crate) const CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x02014b50;

/// ZIP end of central directory signature
pub(crate) const END_OF_CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x06054b50;

/// Fixed part of a central directory record, signature included
const CENTRAL_RECORD_LEN: usize = 46;

/// Fixed part of the end-of-central-directory record, signature included
const END_RECORD_LEN: usize = 22;

/// Bytes shared with the local header: version needed through extra length
const SHARED_LEN: usize = 26;

/// Made by MS-DOS, format version 2.0
const VERSION_MADE_BY: u16 = 0x0014;

/// Internal attributes written for every record
const INTERNAL_ATTRIBUTES: u16 = 1;

/// MS-DOS archive attribute: a regular file
const EXTERNAL_ATTRIBUTES: u32 = 0x0000_0020;

/// Catalog entry describing one local entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirectoryRecord {
    version_made_by: u16,
    shared: [u8; SHARED_LEN],
    disk_number: u16,
    internal_attributes: u16,
    external_attributes: u32,
    local_header_offset: u32,
    name: String,
    name_bytes: Vec<u8>,
    extra_field: Vec<u8>,
    comment: String,
}

impl CentralDirectoryRecord {
    /// Build the record for an entry that has already been written.
    ///
    /// The version/flags/method/time/CRC/sizes/name-length block is copied
    /// from the entry's local header bytes, so the two can never disagree.
    pub fn from_written_entry(entry: &ZipEntry) -> Result<Self> {
        let header = entry.local_header();
        let offset = entry
            .local_header_offset()
            .filter(|_| header.len() >= LOCAL_HEADER_LEN)
            .ok_or_else(|| ZipError::EntryNotWritten(entry.name().to_string()))?;
        let local_header_offset = u32::try_from(offset)
            .map_err(|_| ZipError::Zip64Required(format!("local header at offset {}", offset)))?;

        let mut shared = [0u8; SHARED_LEN];
        shared.copy_from_slice(&header[4..LOCAL_HEADER_LEN]);
        // extra field is not repeated in the central directory
        shared[24..26].copy_from_slice(&0u16.to_le_bytes());

        let name_len = le_u16(&shared, 22) as usize;
        let name_bytes = header[LOCAL_HEADER_LEN..LOCAL_HEADER_LEN + name_len].to_vec();

        Ok(Self {
            version_made_by: VERSION_MADE_BY,
            shared,
            disk_number: 0,
            internal_attributes: INTERNAL_ATTRIBUTES,
            external_attributes: EXTERNAL_ATTRIBUTES,
            local_header_offset,
            name: entry.name().to_string(),
            name_bytes,
            extra_field: Vec::new(),
            comment: String::new(),
        })
    }

    /// Serialize the record; returns the number of bytes written
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> Result<u64> {
        let mut record = Vec::with_capacity(CENTRAL_RECORD_LEN + self.name_bytes.len());
        record.extend_from_slice(&CENTRAL_DIRECTORY_SIGNATURE.to_le_bytes());
        record.extend_from_slice(&self.version_made_by.to_le_bytes());
        record.extend_from_slice(&self.shared);
        record.extend_from_slice(&0u16.to_le_bytes()); // file comment len
        record.extend_from_slice(&self.disk_number.to_le_bytes());
        record.extend_from_slice(&self.internal_attributes.to_le_bytes());
        record.extend_from_slice(&self.external_attributes.to_le_bytes());
        record.extend_from_slice(&self.local_header_offset.to_le_bytes());
        record.extend_from_slice(&self.name_bytes);

        out.write_all(&record)?;
        Ok(record.len() as u64)
    }

    /// Parse the next record.
    ///
    /// Returns `None`, with the stream left untouched, when the next four
    /// bytes are not a central directory signature.
    pub fn parse<R: Read + Seek + ?Sized>(stream: &mut R) -> Result<Option<Self>> {
        if !accept_signature(stream, CENTRAL_DIRECTORY_SIGNATURE)? {
            return Ok(None);
        }

        let fixed = read_vec(stream, CENTRAL_RECORD_LEN - 4, "central directory record")?;
        let mut shared = [0u8; SHARED_LEN];
        shared.copy_from_slice(&fixed[2..2 + SHARED_LEN]);

        let name_len = le_u16(&fixed, 24) as usize;
        let extra_len = le_u16(&fixed, 26) as usize;
        let comment_len = le_u16(&fixed, 28) as usize;

        let name_bytes = read_vec(stream, name_len, "central directory name")?;
        let extra_field = read_vec(stream, extra_len, "central directory extra field")?;
        let comment = read_vec(stream, comment_len, "central directory comment")?;

        Ok(Some(Self {
            version_made_by: le_u16(&fixed, 0),
            shared,
            disk_number: le_u16(&fixed, 30),
            internal_attributes: le_u16(&fixed, 32),
            external_attributes: le_u32(&fixed, 34),
            local_header_offset: le_u32(&fixed, 38),
            name: fixed_length_string(&name_bytes, 0, name_len),
            name_bytes,
            extra_field,
            comment: fixed_length_string(&comment, 0, comment_len),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version_made_by(&self) -> u16 {
        self.version_made_by
    }

    pub fn version_needed(&self) -> u16 {
        le_u16(&self.shared, 0)
    }

    pub fn bit_flags(&self) -> u16 {
        le_u16(&self.shared, 2)
    }

    pub fn method_code(&self) -> u16 {
        le_u16(&self.shared, 4)
    }

    pub fn packed_time(&self) -> u32 {
        le_u32(&self.shared, 6)
    }

    pub fn crc32(&self) -> u32 {
        le_u32(&self.shared, 10)
    }

    pub fn compressed_size(&self) -> u32 {
        le_u32(&self.shared, 14)
    }

    pub fn uncompressed_size(&self) -> u32 {
        le_u32(&self.shared, 18)
    }

    pub fn disk_number(&self) -> u16 {
        self.disk_number
    }

    pub fn internal_attributes(&self) -> u16 {
        self.internal_attributes
    }

    pub fn external_attributes(&self) -> u32 {
        self.external_attributes
    }

    pub fn local_header_offset(&self) -> u64 {
        self.local_header_offset as u64
    }

    pub fn extra_field(&self) -> &[u8] {
        &self.extra_field
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }
}

/// End-of-central-directory footer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub central_directory_disk: u16,
    pub entries_on_disk: u16,
    pub total_entries: u16,
    pub central_directory_size: u32,
    pub central_directory_offset: u32,
    pub comment: String,
}

impl EndOfCentralDirectory {
    /// Footer for a single-disk archive without a comment
    pub fn new(
        entries: usize,
        central_directory_size: u64,
        central_directory_offset: u64,
    ) -> Result<Self> {
        let count = u16::try_from(entries)
            .map_err(|_| ZipError::Zip64Required(format!("{} entries", entries)))?;
        let size = u32::try_from(central_directory_size).map_err(|_| {
            ZipError::Zip64Required(format!(
                "central directory of {} bytes",
                central_directory_size
            ))
        })?;
        let offset = u32::try_from(central_directory_offset).map_err(|_| {
            ZipError::Zip64Required(format!(
                "central directory at offset {}",
                central_directory_offset
            ))
        })?;

        Ok(Self {
            disk_number: 0,
            central_directory_disk: 0,
            entries_on_disk: count,
            total_entries: count,
            central_directory_size: size,
            central_directory_offset: offset,
            comment: String::new(),
        })
    }

    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        let comment = self.comment.as_bytes();
        let comment_len = u16::try_from(comment.len()).unwrap_or(u16::MAX);

        let mut record = Vec::with_capacity(END_RECORD_LEN + comment_len as usize);
        record.extend_from_slice(&END_OF_CENTRAL_DIRECTORY_SIGNATURE.to_le_bytes());
        record.extend_from_slice(&self.disk_number.to_le_bytes());
        record.extend_from_slice(&self.central_directory_disk.to_le_bytes());
        record.extend_from_slice(&self.entries_on_disk.to_le_bytes());
        record.extend_from_slice(&self.total_entries.to_le_bytes());
        record.extend_from_slice(&self.central_directory_size.to_le_bytes());
        record.extend_from_slice(&self.central_directory_offset.to_le_bytes());
        record.extend_from_slice(&comment_len.to_le_bytes());
        record.extend_from_slice(&comment[..comment_len as usize]);

        out.write_all(&record)?;
        Ok(())
    }

    /// Parse the footer, or `None` (stream untouched) if the signature is absent
    pub fn parse<R: Read + Seek + ?Sized>(stream: &mut R) -> Result<Option<Self>> {
        if !accept_signature(stream, END_OF_CENTRAL_DIRECTORY_SIGNATURE)? {
            return Ok(None);
        }

        let fixed = read_vec(stream, END_RECORD_LEN - 4, "end of central directory")?;
        let comment_len = le_u16(&fixed, 16) as usize;
        let comment = read_vec(stream, comment_len, "archive comment")?;

        Ok(Some(Self {
            disk_number: le_u16(&fixed, 0),
            central_directory_disk: le_u16(&fixed, 2),
            entries_on_disk: le_u16(&fixed, 4),
            total_entries: le_u16(&fixed, 6),
            central_directory_size: le_u32(&fixed, 8),
            central_directory_offset: le_u32(&fixed, 12),
            comment: fixed_length_string(&comment, 0, comment_len),
        }))
    }
}
