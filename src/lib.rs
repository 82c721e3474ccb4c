//! # pk-zip: Self-Contained PKZIP Codec
//!
//! `pk-zip` reads and writes ZIP archives by producing and consuming the PKZIP
//! binary layout directly: local file headers, optional data descriptors,
//! central directory records and the end-of-central-directory footer.
//!
//! ## Features
//!
//! - **Build**: add raw bytes, single files or whole directory trees, then `save()`
//! - **Open**: parse an archive from a file, a byte buffer or any seekable reader
//! - **Extract**: one entry or all of them, to disk or to any writer
//! - **From-scratch CRC-32**: table-driven, fused with compression in one pass
//! - **MS-DOS timestamps**: packed date/time with the legacy daylight-saving adjustment
//!
//! Entries are deflated into memory before their header is written, so sizes
//! are always known up front and written archives never need data descriptors.
//! Archives that do use them (bit 3) are still read.
//!
//! ## Quick Start
//!
//! ### Building an archive
//!
//! ```no_run
//! use pk_zip::ZipArchive;
//!
//! let mut archive = ZipArchive::new("output.zip")?;
//!
//! archive.add_bytes("hello.txt", b"Hello, World!".to_vec())?;
//! archive.add_file("Cargo.toml")?;
//! archive.add_directory("assets")?;
//!
//! archive.save()?;
//! # Ok::<(), pk_zip::ZipError>(())
//! ```
//!
//! ### Reading an archive
//!
//! ```no_run
//! use pk_zip::ZipArchive;
//!
//! let archive = ZipArchive::open("archive.zip")?;
//!
//! for entry in archive.entries() {
//!     println!("{}: {} bytes", entry.name(), entry.uncompressed_size());
//! }
//!
//! if let Some(entry) = archive.get("hello.txt") {
//!     println!("crc32 = {:08x}", entry.crc32());
//! }
//!
//! let data = archive.read("hello.txt")?;
//! archive.extract_all("out")?;
//! # Ok::<(), pk_zip::ZipError>(())
//! ```
//!
//! ### Building in memory
//!
//! ```
//! use pk_zip::ZipArchive;
//!
//! let mut archive = ZipArchive::in_memory();
//! archive.add_bytes("data.txt", b"In-memory ZIP content".to_vec())?;
//! archive.save()?;
//!
//! let bytes = archive.into_saved_bytes().unwrap();
//! let reopened = ZipArchive::open_bytes(bytes)?;
//! assert_eq!(reopened.read("data.txt")?, b"In-memory ZIP content");
//! # Ok::<(), pk_zip::ZipError>(())
//! ```

pub mod archive;
pub mod central;
pub mod codec;
pub mod crc32;
mod cursor;
pub mod dos_time;
pub mod entry;
pub mod error;
pub mod options;

pub use archive::ZipArchive;
pub use central::{CentralDirectoryRecord, EndOfCentralDirectory};
pub use codec::{DeflateCodec, DeflateSink, FlateCodec};
pub use crc32::Crc32;
pub use dos_time::DaylightSaving;
pub use entry::{CompressedPayload, CompressionMethod, EntrySource, ZipEntry};
pub use error::{Result, ZipError};
pub use options::ArchiveOptions;
