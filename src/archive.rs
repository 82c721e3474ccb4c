//! The archive aggregate: builds new archives, opens existing ones and drives extraction
//!
//! Entries are kept in insertion order, which is also their order on disk.
//! An archive is either being built (entries can be appended until `save()`),
//! saved (sealed), or opened for reading (every local entry and central
//! directory record parsed eagerly).

use crate::central::{CentralDirectoryRecord, EndOfCentralDirectory};
use crate::codec::DeflateCodec;
use crate::cursor::PositionWriter;
use crate::dos_time;
use crate::entry::ZipEntry;
use crate::error::{Result, ZipError};
use crate::options::ArchiveOptions;
use chrono::{Local, NaiveDateTime};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Where a build-mode archive is written
#[derive(Debug)]
enum Output {
    File(BufWriter<File>),
    Memory(Vec<u8>),
}

impl Output {
    /// Flush and release the target; in-memory archives hand back their bytes
    fn finish(self) -> io::Result<Option<Vec<u8>>> {
        match self {
            Output::File(mut writer) => {
                writer.flush()?;
                Ok(None)
            }
            Output::Memory(bytes) => Ok(Some(bytes)),
        }
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::File(writer) => writer.write(buf),
            Output::Memory(bytes) => bytes.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::File(writer) => writer.flush(),
            Output::Memory(_) => Ok(()),
        }
    }
}

#[derive(Debug)]
enum State {
    Building(Output),
    Saved(Option<Vec<u8>>),
    Opened,
}

/// A ZIP archive being built or read
#[derive(Debug)]
pub struct ZipArchive {
    entries: Vec<ZipEntry>,
    central_directory: Vec<CentralDirectoryRecord>,
    footer: Option<EndOfCentralDirectory>,
    options: ArchiveOptions,
    state: State,
}

impl ZipArchive {
    /// Start a new archive at `path`, deleting any file already there
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_options(path, ArchiveOptions::default())
    }

    /// Start a new archive at `path` with custom options
    pub fn with_options<P: AsRef<Path>>(path: P, options: ArchiveOptions) -> Result<Self> {
        let path = path.as_ref();
        match fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "replacing existing archive"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(ZipError::file_system(path, e)),
        }

        let file = File::create(path).map_err(|e| ZipError::file_system(path, e))?;
        Ok(Self::building(Output::File(BufWriter::new(file)), options))
    }

    /// Start a new archive that is built into memory
    pub fn in_memory() -> Self {
        Self::in_memory_with_options(ArchiveOptions::default())
    }

    pub fn in_memory_with_options(options: ArchiveOptions) -> Self {
        Self::building(Output::Memory(Vec::new()), options)
    }

    fn building(output: Output, options: ArchiveOptions) -> Self {
        Self {
            entries: Vec::new(),
            central_directory: Vec::new(),
            footer: None,
            options,
            state: State::Building(output),
        }
    }

    /// Open and fully parse the archive at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ArchiveOptions::default())
    }

    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ArchiveOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ZipError::file_system(path, e))?;
        Self::open_reader_with_options(BufReader::new(file), options)
    }

    /// Parse an archive held in memory
    pub fn open_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        Self::open_reader(Cursor::new(bytes.into()))
    }

    /// Parse an archive from any seekable reader positioned at its first byte
    pub fn open_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        Self::open_reader_with_options(reader, ArchiveOptions::default())
    }

    pub fn open_reader_with_options<R: Read + Seek>(
        mut reader: R,
        options: ArchiveOptions,
    ) -> Result<Self> {
        let mut entries = Vec::new();
        while let Some(entry) = ZipEntry::read_next(&mut reader)? {
            entries.push(entry);
        }

        let mut central_directory = Vec::new();
        while let Some(record) = CentralDirectoryRecord::parse(&mut reader)? {
            central_directory.push(record);
        }

        let footer = EndOfCentralDirectory::parse(&mut reader)?;
        match &footer {
            None if entries.is_empty() && central_directory.is_empty() => {
                return Err(ZipError::CorruptArchive("no ZIP structures found".to_string()));
            }
            None => warn!("end of central directory record not found"),
            Some(f) if f.total_entries as usize != central_directory.len() => warn!(
                declared = f.total_entries,
                parsed = central_directory.len(),
                "central directory count disagrees with footer"
            ),
            Some(_) => {}
        }

        debug!(
            entries = entries.len(),
            records = central_directory.len(),
            "opened archive"
        );

        Ok(Self {
            entries,
            central_directory,
            footer,
            options,
            state: State::Opened,
        })
    }

    // ---- building ----

    fn ensure_building(&self) -> Result<()> {
        match self.state {
            State::Building(_) => Ok(()),
            _ => Err(ZipError::NotWritable),
        }
    }

    /// Append a prepared entry
    pub fn add_entry(&mut self, entry: ZipEntry) -> Result<()> {
        self.ensure_building()?;
        self.entries.push(entry);
        Ok(())
    }

    /// Add `bytes` under `name`, stamped with the current local time
    pub fn add_bytes(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Result<()> {
        self.add_bytes_with_time(name, bytes, Local::now().naive_local())
    }

    pub fn add_bytes_with_time(
        &mut self,
        name: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
        last_modified: NaiveDateTime,
    ) -> Result<()> {
        self.add_entry(ZipEntry::from_bytes(name, bytes.into(), last_modified))
    }

    /// Add the file at `path`, named after the path. The file is read on `save()`.
    pub fn add_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.ensure_building()?;
        self.add_entry(ZipEntry::from_file(path)?)
    }

    /// Add the file at `path` under an explicit archive name
    pub fn add_file_as<P: AsRef<Path>>(&mut self, path: P, name: impl Into<String>) -> Result<()> {
        self.ensure_building()?;
        self.add_entry(ZipEntry::from_file_as(path, name)?)
    }

    /// Add every file below `path`, recursively.
    ///
    /// Names are relative to the directory's parent, so `assets/img/a.png`
    /// is stored for a file `a.png` under `/src/assets/img` when adding
    /// `/src/assets`. Empty directories become directory-marker entries.
    pub fn add_directory<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.ensure_building()?;
        let root = path.as_ref();
        let prefix = root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());

        let mut added = 0usize;
        for item in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let item = item.map_err(|e| {
                let at = e.path().unwrap_or(root).to_path_buf();
                ZipError::file_system(at, e.into())
            })?;

            let relative = item.path().strip_prefix(root).unwrap_or(item.path());
            let name = archive_relative_name(prefix.as_deref(), relative);

            if item.file_type().is_file() {
                self.entries.push(ZipEntry::from_file_as(item.path(), name)?);
                added += 1;
            } else if item.file_type().is_dir() && !name.is_empty() {
                let mut children =
                    fs::read_dir(item.path()).map_err(|e| ZipError::file_system(item.path(), e))?;
                if children.next().is_none() {
                    let modified = item
                        .metadata()
                        .ok()
                        .and_then(|m| m.modified().ok())
                        .map(dos_time::from_system_time)
                        .unwrap_or_else(|| Local::now().naive_local());
                    self.entries.push(ZipEntry::directory(name, modified));
                    added += 1;
                }
            }
        }

        debug!(path = %root.display(), added, "added directory");
        Ok(())
    }

    /// Write all entries, the central directory and the footer, then seal the archive.
    ///
    /// The output is released on every path. A failure part-way leaves the
    /// partially written file in place and the archive sealed.
    pub fn save(&mut self) -> Result<()> {
        self.ensure_building()?;
        let codec = self
            .options
            .codec
            .clone()
            .ok_or(ZipError::MissingCompressor)?;
        if self.entries.len() > u16::MAX as usize {
            return Err(ZipError::Zip64Required(format!(
                "{} entries",
                self.entries.len()
            )));
        }

        let State::Building(output) = std::mem::replace(&mut self.state, State::Saved(None))
        else {
            return Err(ZipError::NotWritable);
        };

        let mut out = PositionWriter::new(output);
        self.write_archive(&mut out, codec.as_ref())?;
        let bytes = out.into_inner().finish()?;

        self.state = State::Saved(bytes);
        Ok(())
    }

    fn write_archive<W: Write>(
        &mut self,
        out: &mut PositionWriter<W>,
        codec: &dyn DeflateCodec,
    ) -> Result<()> {
        for entry in &mut self.entries {
            entry.write_to(out, codec, &self.options)?;
        }

        let central_directory_offset = out.position();
        let mut records = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let record = CentralDirectoryRecord::from_written_entry(entry)?;
            record.write_to(out)?;
            records.push(record);
        }
        let central_directory_size = out.position() - central_directory_offset;

        let footer = EndOfCentralDirectory::new(
            records.len(),
            central_directory_size,
            central_directory_offset,
        )?;
        footer.write_to(out)?;
        out.flush()?;

        debug!(
            entries = records.len(),
            central_directory_offset,
            central_directory_size,
            "saved archive"
        );

        self.central_directory = records;
        self.footer = Some(footer);
        Ok(())
    }

    /// Whether `save()` has completed
    pub fn is_saved(&self) -> bool {
        matches!(self.state, State::Saved(_))
    }

    /// Bytes of a saved in-memory archive
    pub fn saved_bytes(&self) -> Option<&[u8]> {
        match &self.state {
            State::Saved(Some(bytes)) => Some(bytes),
            _ => None,
        }
    }

    /// Take the bytes of a saved in-memory archive
    pub fn into_saved_bytes(self) -> Option<Vec<u8>> {
        match self.state {
            State::Saved(bytes) => bytes,
            _ => None,
        }
    }

    // ---- inspection ----

    /// Entries in archive order
    pub fn entries(&self) -> &[ZipEntry] {
        &self.entries
    }

    /// Central directory records in archive order (empty until saved or opened)
    pub fn central_directory(&self) -> &[CentralDirectoryRecord] {
        &self.central_directory
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry named exactly `name`
    pub fn get(&self, name: &str) -> Option<&ZipEntry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    /// Archive comment from the footer, if the archive was saved or opened
    pub fn comment(&self) -> Option<&str> {
        self.footer.as_ref().map(|f| f.comment.as_str())
    }

    pub fn options(&self) -> &ArchiveOptions {
        &self.options
    }

    // ---- extraction ----

    fn find(&self, name: &str) -> Result<&ZipEntry> {
        self.get(name)
            .ok_or_else(|| ZipError::EntryNotFound(name.to_string()))
    }

    /// Decompress the entry named `name` into memory
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        self.find(name)?.decompress(self.options.codec_ref())
    }

    /// Decompress the entry named `name` into `out`
    pub fn extract_to<W: Write + ?Sized>(&self, name: &str, out: &mut W) -> Result<u64> {
        self.find(name)?.extract_to(out, self.options.codec_ref())
    }

    /// Extract the entry named `name` below `destination`; returns the path written
    pub fn extract<P: AsRef<Path>>(&self, name: &str, destination: P) -> Result<PathBuf> {
        let entry = self.find(name)?;
        let target = destination.as_ref().join(enclosed_path(entry.name()));
        entry.extract_to_path(&target, self.options.codec_ref(), self.options.daylight_saving)?;
        Ok(target)
    }

    /// Extract every entry below `destination`, stopping at the first failure
    pub fn extract_all<P: AsRef<Path>>(&self, destination: P) -> Result<()> {
        let destination = destination.as_ref();
        fs::create_dir_all(destination).map_err(|e| ZipError::file_system(destination, e))?;

        for entry in &self.entries {
            let relative = enclosed_path(entry.name());
            if relative.as_os_str().is_empty() {
                warn!(name = entry.name(), "skipping entry without a usable path");
                continue;
            }
            entry.extract_to_path(
                &destination.join(relative),
                self.options.codec_ref(),
                self.options.daylight_saving,
            )?;
        }

        debug!(
            path = %destination.display(),
            entries = self.entries.len(),
            "extracted archive"
        );
        Ok(())
    }
}

/// Archive name for a path found under an added directory
fn archive_relative_name(prefix: Option<&str>, relative: &Path) -> String {
    let mut parts: Vec<String> = prefix.map(|p| vec![p.to_string()]).unwrap_or_default();
    parts.extend(
        relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            }),
    );
    parts.join("/")
}

/// Entry name as a relative path with `..`, root and prefix components removed
fn enclosed_path(name: &str) -> PathBuf {
    name.split(['/', '\\'])
        .filter(|part| !part.is_empty() && *part != "." && *part != "..")
        .filter(|part| !Path::new(part).components().any(|c| matches!(c, Component::Prefix(_))))
        .collect()
}
