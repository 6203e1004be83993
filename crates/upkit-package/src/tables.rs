//! Table loading.
//!
//! Tables are always rebuilt from scratch: there is no incremental update
//! path, so every reload yields exactly what the bytes on disk describe.

use std::io::{BufRead, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};
use log::debug;
use upkit_common::ReadExt;

use crate::resolve;
use crate::{Error, ExportEntry, ImportEntry, NameEntry, PackageHeader, Result, Section};

/// Everything derived from the header: the three tables, the file offsets of
/// names and exports, and the reconstructed qualified names.
///
/// Exports and imports carry a synthetic all-zero entry at index 0 so that
/// 1-based owner references index the vectors directly.
#[derive(Debug, Clone, Default)]
pub(crate) struct Tables {
    pub names: Vec<NameEntry>,
    pub name_offsets: Vec<u64>,
    pub exports: Vec<ExportEntry>,
    /// Index 0 holds the export table start.
    pub export_offsets: Vec<u64>,
    pub imports: Vec<ImportEntry>,
    pub export_paths: Vec<String>,
    pub import_paths: Vec<String>,
}

impl Tables {
    /// Load all tables described by `header` and resolve their names.
    pub fn load<R: BufRead + Seek>(
        reader: &mut R,
        header: &PackageHeader,
        file_size: u64,
    ) -> Result<Self> {
        for (section, count, offset) in header.tables() {
            if count != 0 && u64::from(offset) >= file_size {
                return Err(Error::TableOutOfBounds {
                    section,
                    offset: offset.into(),
                    file_size,
                });
            }
        }

        let mut tables = Self::default();
        tables.read_names(reader, header)?;
        tables.read_exports(reader, header)?;
        tables.read_imports(reader, header)?;

        tables.export_paths = resolve::export_paths(&tables.names, &tables.exports);
        tables.import_paths =
            resolve::import_paths(&tables.names, &tables.exports, &tables.imports);

        debug!(
            "loaded {} names, {} exports, {} imports",
            tables.names.len(),
            tables.exports.len() - 1,
            tables.imports.len() - 1
        );

        Ok(tables)
    }

    fn read_names<R: BufRead + Seek>(
        &mut self,
        reader: &mut R,
        header: &PackageHeader,
    ) -> Result<()> {
        reader.seek(SeekFrom::Start(header.name_offset.into()))?;

        let count = header.name_count as usize;

        for index in 0..count {
            let eof = || Error::while_reading(Section::Names, index);

            self.name_offsets.push(reader.stream_position()?);
            let length = reader.read_u32::<LittleEndian>().map_err(eof())?;
            let name = reader.read_cstring().map_err(eof())?;
            let flags_lo = reader.read_u32::<LittleEndian>().map_err(eof())?;
            let flags_hi = reader.read_u32::<LittleEndian>().map_err(eof())?;

            self.names.push(NameEntry {
                length,
                name,
                flags_lo,
                flags_hi,
            });
        }

        Ok(())
    }

    fn read_exports<R: BufRead + Seek>(
        &mut self,
        reader: &mut R,
        header: &PackageHeader,
    ) -> Result<()> {
        let start = reader.seek(SeekFrom::Start(header.export_offset.into()))?;

        let count = header.export_count as usize;
        self.exports.push(ExportEntry::default());
        self.export_offsets.push(start);

        for index in 1..=count {
            self.export_offsets.push(reader.stream_position()?);
            let entry: ExportEntry = reader
                .read_struct()
                .map_err(Error::while_reading(Section::Exports, index))?;

            if entry.num_additional_fields != 0 {
                reader.seek(SeekFrom::Current(i64::from(entry.num_additional_fields) * 4))?;
            }
            self.exports.push(entry);
        }

        Ok(())
    }

    fn read_imports<R: BufRead + Seek>(
        &mut self,
        reader: &mut R,
        header: &PackageHeader,
    ) -> Result<()> {
        reader.seek(SeekFrom::Start(header.import_offset.into()))?;

        let count = header.import_count as usize;
        self.imports.push(ImportEntry::default());

        for index in 1..=count {
            let entry: ImportEntry = reader
                .read_struct()
                .map_err(Error::while_reading(Section::Imports, index))?;
            self.imports.push(entry);
        }

        Ok(())
    }
}
