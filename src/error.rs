//! Error types for pk-zip

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for pk-zip operations
pub type Result<T> = std::result::Result<T, ZipError>;

/// Error types that can occur during ZIP operations
#[derive(Debug, Error)]
pub enum ZipError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Fewer bytes were available than a fixed-width field or payload requires
    #[error("Truncated stream: needed {needed} bytes for {context}")]
    TruncatedStream { needed: usize, context: &'static str },
    /// Structure was found but its contents are inconsistent
    #[error("Corrupt archive: {0}")]
    CorruptArchive(String),
    /// No DEFLATE codec is configured
    #[error("No DEFLATE compressor is available")]
    MissingCompressor,
    /// File-system failure on a specific path
    #[error("File system error on {}: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Entry not found in ZIP archive
    #[error("Entry not found: {0}")]
    EntryNotFound(String),
    /// Archive was opened for reading or has already been saved
    #[error("Archive is not writable (opened for reading or already saved)")]
    NotWritable,
    /// Entry has no archived payload to extract (it was never read from an archive)
    #[error("Entry {0} has no archived payload to extract")]
    NotExtractable(String),
    /// A size, offset or count does not fit the classic (non-ZIP64) fields
    #[error("Archive needs ZIP64 extensions: {0}")]
    Zip64Required(String),
    /// Entry has not been written yet, so it has no local header to catalog
    #[error("Entry {0} has not been written")]
    EntryNotWritten(String),
    /// Entry name cannot be encoded in a header
    #[error("Invalid entry name: {0}")]
    InvalidName(String),
    /// Unsupported compression method
    #[error("Unsupported compression method: {0}")]
    UnsupportedCompression(u16),
}

impl ZipError {
    /// Wrap an I/O error with the path it occurred on
    pub(crate) fn file_system(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ZipError::FileSystem {
            path: path.into(),
            source,
        }
    }

    /// Map a read error, turning an early EOF into `TruncatedStream`
    pub(crate) fn from_read(err: io::Error, needed: usize, context: &'static str) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            ZipError::TruncatedStream { needed, context }
        } else {
            ZipError::Io(err)
        }
    }
}
