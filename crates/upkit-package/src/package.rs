//! Package session: one open stream plus the tables derived from it.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use log::{debug, info};
use upkit_common::{ansi, search};

use crate::relocate::{self, PayloadShape};
use crate::tables::Tables;
use crate::{Error, ExportEntry, ImportEntry, NameEntry, PackageHeader, Result};

/// An open package.
///
/// The session owns its stream exclusively. Table state is only ever replaced
/// wholesale by [`reload`](Self::reload), which every structural mutation runs
/// before returning, so callers never observe half-updated tables.
///
/// Exports and imports are 1-based: index 0 of each is a synthetic null entry
/// with an empty qualified name. Names are 0-based.
///
/// # Example
///
/// ```no_run
/// use upkit_package::{PayloadShape, UpkPackage};
///
/// let mut package = UpkPackage::open("XComGame.upk")?;
///
/// if let Some(index) = package.find_export("XGUnit.GetMaxMoves") {
///     let payload = package.read_payload(index)?;
///     println!("{} bytes at {:#x}", payload.len(), package.export(index).data_offset);
///
///     // Make room for 16 more bytes of bytecode
///     let new_size = package.export(index).object_file_size + 16;
///     package.relocate(index, new_size, PayloadShape::Function)?;
/// }
/// # Ok::<(), upkit_package::Error>(())
/// ```
pub struct UpkPackage<S = File> {
    stream: S,
    file_size: u64,
    header: PackageHeader,
    tables: Tables,
}

impl UpkPackage<File> {
    /// Open a package file for reading and writing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        debug!("opened {}", path.display());
        Self::from_stream(file)
    }
}

impl<S: Read + Write + Seek> UpkPackage<S> {
    /// Load a package from any seekable read/write stream.
    pub fn from_stream(mut stream: S) -> Result<Self> {
        let file_size = stream.seek(SeekFrom::End(0))?;
        let mut package = Self {
            stream,
            file_size,
            header: PackageHeader::default(),
            tables: Tables::default(),
        };
        package.reload()?;
        Ok(package)
    }

    /// Flush pending writes and hand back the underlying stream.
    pub fn close(mut self) -> Result<S> {
        self.stream.flush()?;
        Ok(self.stream)
    }

    /// Re-read the header and all tables, then rebuild the qualified names.
    ///
    /// On failure the tables are left empty and the session should be
    /// discarded.
    pub fn reload(&mut self) -> Result<()> {
        self.tables = Tables::default();

        let (header, tables) = {
            let mut reader = BufReader::new(&mut self.stream);
            reader.seek(SeekFrom::Start(0))?;
            let header = PackageHeader::read_from(&mut reader)?;
            let tables = Tables::load(&mut reader, &header, self.file_size)?;
            (header, tables)
        };

        self.header = header;
        self.tables = tables;
        Ok(())
    }

    // Header and file

    /// The package header.
    #[inline]
    pub fn header(&self) -> &PackageHeader {
        &self.header
    }

    /// Current size of the package in bytes.
    #[inline]
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Whether `offset` is accepted by [`write_raw`](Self::write_raw).
    ///
    /// This is a coarse guard: anything from the name table to the end of the
    /// file is writable.
    #[inline]
    pub fn is_valid_offset(&self, offset: u64) -> bool {
        offset >= u64::from(self.header.name_offset) && offset < self.file_size
    }

    // Tables

    /// All name entries.
    #[inline]
    pub fn names(&self) -> &[NameEntry] {
        &self.tables.names
    }

    /// All export entries, null export included.
    #[inline]
    pub fn exports(&self) -> &[ExportEntry] {
        &self.tables.exports
    }

    /// All import entries, null import included.
    #[inline]
    pub fn imports(&self) -> &[ImportEntry] {
        &self.tables.imports
    }

    /// Qualified names of all exports, parallel to [`exports`](Self::exports).
    #[inline]
    pub fn export_paths(&self) -> &[String] {
        &self.tables.export_paths
    }

    /// Qualified names of all imports, parallel to [`imports`](Self::imports).
    #[inline]
    pub fn import_paths(&self) -> &[String] {
        &self.tables.import_paths
    }

    /// Name entry `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[inline]
    pub fn name(&self, index: usize) -> &NameEntry {
        &self.tables.names[index]
    }

    /// Export entry `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[inline]
    pub fn export(&self, index: usize) -> &ExportEntry {
        &self.tables.exports[index]
    }

    /// Import entry `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[inline]
    pub fn import(&self, index: usize) -> &ImportEntry {
        &self.tables.imports[index]
    }

    /// Name entry `index`, if it exists.
    #[inline]
    pub fn get_name(&self, index: usize) -> Option<&NameEntry> {
        self.tables.names.get(index)
    }

    /// Export entry `index`, if it exists.
    #[inline]
    pub fn get_export(&self, index: usize) -> Option<&ExportEntry> {
        self.tables.exports.get(index)
    }

    /// Import entry `index`, if it exists.
    #[inline]
    pub fn get_import(&self, index: usize) -> Option<&ImportEntry> {
        self.tables.imports.get(index)
    }

    /// String of name entry `index`. Panics if out of range.
    #[inline]
    pub fn name_str(&self, index: usize) -> &str {
        &self.tables.names[index].name
    }

    /// Qualified name of export `index`. Panics if out of range.
    #[inline]
    pub fn export_path(&self, index: usize) -> &str {
        &self.tables.export_paths[index]
    }

    /// Qualified name of import `index`. Panics if out of range.
    #[inline]
    pub fn import_path(&self, index: usize) -> &str {
        &self.tables.import_paths[index]
    }

    /// File offset of name entry `index` (its length prefix).
    #[inline]
    pub fn name_entry_offset(&self, index: usize) -> u64 {
        self.tables.name_offsets[index]
    }

    /// File offset of the first string byte of name entry `index`.
    #[inline]
    pub fn name_string_offset(&self, index: usize) -> u64 {
        self.tables.name_offsets[index] + NameEntry::LENGTH_PREFIX_SIZE
    }

    /// File offset of export record `index`. Index 0 gives the table start.
    #[inline]
    pub fn export_entry_offset(&self, index: usize) -> u64 {
        self.tables.export_offsets[index]
    }

    // Lookup

    /// Index of the first name entry equal to `name`.
    pub fn find_name(&self, name: &str) -> Option<usize> {
        self.tables.names.iter().position(|n| n.name == name)
    }

    /// Index of the first export whose qualified name equals `path`.
    pub fn find_export(&self, path: &str) -> Option<usize> {
        Self::find_path(&self.tables.export_paths, path)
    }

    /// Index of the first import whose qualified name equals `path`.
    pub fn find_import(&self, path: &str) -> Option<usize> {
        Self::find_path(&self.tables.import_paths, path)
    }

    fn find_path(paths: &[String], path: &str) -> Option<usize> {
        // Skip the null entry so an empty query never matches it
        paths.iter().skip(1).position(|p| p == path).map(|i| i + 1)
    }

    // Payloads

    /// Read the serialized payload of export `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn read_payload(&mut self, index: usize) -> Result<Vec<u8>> {
        let entry = self.tables.exports[index];
        let mut data = vec![0u8; entry.object_file_size as usize];
        self.stream.seek(SeekFrom::Start(entry.data_offset.into()))?;
        self.stream.read_exact(&mut data)?;
        Ok(data)
    }

    /// Overwrite the payload of export `index` in place.
    ///
    /// `data` must be exactly the recorded payload size; use
    /// [`relocate`](Self::relocate) to grow a payload.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn write_payload(&mut self, index: usize, data: &[u8]) -> Result<()> {
        let entry = self.tables.exports[index];
        if index == 0 {
            return Err(Error::NullExport);
        }
        if data.len() != entry.object_file_size as usize {
            return Err(Error::PayloadSizeMismatch {
                index,
                expected: entry.object_file_size,
                actual: data.len(),
            });
        }

        self.stream.seek(SeekFrom::Start(entry.data_offset.into()))?;
        self.stream.write_all(data)?;
        Ok(())
    }

    // Mutation

    /// Write `data` at `offset`.
    ///
    /// The offset must satisfy [`is_valid_offset`](Self::is_valid_offset).
    /// Writes that start before the import table reload all tables. Writes at
    /// or after it do not; call [`reload`](Self::reload) to pick up changes to
    /// the import table itself.
    pub fn write_raw(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        if !self.is_valid_offset(offset) {
            return Err(Error::OffsetOutOfRange {
                offset,
                start: self.header.name_offset.into(),
                end: self.file_size,
            });
        }

        self.stream.seek(SeekFrom::Start(offset))?;
        self.stream.write_all(data)?;
        self.file_size = self.file_size.max(offset + data.len() as u64);
        info!("wrote {} bytes at {:#x}", data.len(), offset);

        if offset < u64::from(self.header.import_offset) {
            self.reload()?;
        }
        Ok(())
    }

    /// Replace the string of name entry `index` without changing its length.
    ///
    /// `new_name` is stored one byte per char, so it may only contain chars
    /// up to U+00FF and no NUL.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn rename(&mut self, index: usize, new_name: &str) -> Result<()> {
        let entry = &self.tables.names[index];
        let bytes = ansi::encode(new_name)
            .filter(|bytes| !bytes.contains(&0))
            .ok_or_else(|| Error::InvalidName(new_name.to_string()))?;
        if bytes.len() as u64 + 1 != u64::from(entry.length) {
            return Err(Error::NameLengthMismatch {
                index,
                expected: (entry.length as usize).saturating_sub(1),
                actual: bytes.len(),
            });
        }

        let offset = self.name_string_offset(index);
        self.stream.seek(SeekFrom::Start(offset))?;
        self.stream.write_all(&bytes)?;
        info!("renamed name {} to {:?}", index, new_name);

        self.reload()
    }

    /// Move the payload of export `index` to the end of the file, growing it
    /// to `new_size` bytes when that is larger than the current size.
    ///
    /// The export record's size and offset fields are patched in place. The
    /// old payload bytes stay in the file unreferenced. Returns the new
    /// payload offset.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn relocate(&mut self, index: usize, new_size: u32, shape: PayloadShape) -> Result<u64> {
        let entry = self.tables.exports[index];
        if index == 0 {
            return Err(Error::NullExport);
        }

        let record_offset = self.tables.export_offsets[index];
        let mut payload = self.read_payload(index)?;
        let new_offset = self.stream.seek(SeekFrom::End(0))?;
        let new_offset_field =
            u32::try_from(new_offset).map_err(|_| Error::OffsetOverflow(new_offset))?;

        if new_size > entry.object_file_size {
            payload = relocate::grow_payload(&payload, new_size as usize, shape)?;
            self.stream
                .seek(SeekFrom::Start(record_offset + ExportEntry::FILE_SIZE_FIELD))?;
            self.stream.write_u32::<LittleEndian>(new_size)?;
        }

        self.stream
            .seek(SeekFrom::Start(record_offset + ExportEntry::DATA_OFFSET_FIELD))?;
        self.stream.write_u32::<LittleEndian>(new_offset_field)?;

        self.stream.seek(SeekFrom::Start(new_offset))?;
        self.stream.write_all(&payload)?;

        self.file_size = self.stream.seek(SeekFrom::End(0))?;
        info!(
            "moved export {} ({} -> {} bytes) to {:#x}",
            index,
            entry.object_file_size,
            payload.len(),
            new_offset
        );

        self.reload()?;
        Ok(new_offset)
    }

    // Search

    /// Offset of the first occurrence of `pattern` in the file.
    ///
    /// An empty pattern never matches.
    pub fn find_chunk(&mut self, pattern: &[u8]) -> Result<Option<u64>> {
        let contents = self.read_all()?;
        Ok(search::find_pattern(pattern, &contents).map(|pos| pos as u64))
    }

    /// Offsets of every non-overlapping occurrence of `pattern` in the file.
    pub fn find_all_chunks(&mut self, pattern: &[u8]) -> Result<Vec<u64>> {
        let contents = self.read_all()?;
        Ok(search::find_all(pattern, &contents)
            .into_iter()
            .map(|pos| pos as u64)
            .collect())
    }

    fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut contents = Vec::with_capacity(self.file_size as usize);
        self.stream.seek(SeekFrom::Start(0))?;
        self.stream.read_to_end(&mut contents)?;
        Ok(contents)
    }
}

impl<S> std::fmt::Debug for UpkPackage<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpkPackage")
            .field("folder_name", &self.header.folder_name)
            .field("file_size", &self.file_size)
            .field("names", &self.tables.names.len())
            .field("exports", &self.tables.exports.len())
            .field("imports", &self.tables.imports.len())
            .finish()
    }
}
