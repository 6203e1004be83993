//! Synthetic packages for tests.

use upkit_common::ansi;
use zerocopy::IntoBytes;

use crate::{ExportEntry, ImportEntry, PackageHeader};

/// Words appended after an export record that declares additional fields.
pub const ADDITIONAL_FIELD_WORD: u32 = 0xA5A5_A5A5;

struct FixtureExport {
    entry: ExportEntry,
    payload: Vec<u8>,
}

/// Builds a package laid out as: header, names, exports, imports, payloads.
pub struct FixtureBuilder {
    folder_name: String,
    names: Vec<Vec<u8>>,
    exports: Vec<FixtureExport>,
    imports: Vec<ImportEntry>,
}

impl FixtureBuilder {
    pub fn new() -> Self {
        Self {
            folder_name: "None".to_string(),
            names: Vec::new(),
            exports: Vec::new(),
            imports: Vec::new(),
        }
    }

    /// Add a name, stored one byte per char, and return its index.
    pub fn name(&mut self, name: &str) -> u32 {
        self.names.push(ansi::encode(name).unwrap());
        self.names.len() as u32 - 1
    }

    /// Add an export and return its 1-based index.
    pub fn export(&mut self, name_idx: u32, owner_ref: u32, payload: Vec<u8>) -> u32 {
        self.export_with_fields(name_idx, owner_ref, payload, 0)
    }

    /// Add an export followed by `additional` trailing words.
    pub fn export_with_fields(
        &mut self,
        name_idx: u32,
        owner_ref: u32,
        payload: Vec<u8>,
        additional: u32,
    ) -> u32 {
        let entry = ExportEntry {
            name_idx,
            owner_ref,
            object_file_size: payload.len() as u32,
            num_additional_fields: additional,
            ..Default::default()
        };
        self.exports.push(FixtureExport { entry, payload });
        self.exports.len() as u32
    }

    /// Add an import and return its 1-based index.
    pub fn import(&mut self, package_idx: u32, name_idx: u32, owner_ref: i32) -> u32 {
        self.imports.push(ImportEntry {
            package_idx,
            name_idx,
            owner_ref,
            ..Default::default()
        });
        self.imports.len() as u32
    }

    /// Serialize the package.
    pub fn build(mut self) -> Vec<u8> {
        let header_size = 4 + 2 + 2 + 4 + 4 + self.folder_name.len() + 1 + 4 + 6 * 4;
        let names_size: usize = self.names.iter().map(|n| 4 + n.len() + 1 + 8).sum();
        let exports_size: usize = self
            .exports
            .iter()
            .map(|e| e.entry.disk_size() as usize)
            .sum();

        let name_offset = header_size;
        let export_offset = name_offset + names_size;
        let import_offset = export_offset + exports_size;
        let mut data_offset = import_offset + self.imports.len() * ImportEntry::SIZE;

        for export in &mut self.exports {
            export.entry.data_offset = data_offset as u32;
            data_offset += export.payload.len();
        }

        let header = PackageHeader {
            signature: PackageHeader::SIGNATURE,
            version: 845,
            license_version: 64,
            header_size: header_size as u32,
            folder_name_length: self.folder_name.len() as u32 + 1,
            folder_name: self.folder_name.clone(),
            package_flags: 0,
            name_count: self.names.len() as u32,
            name_offset: name_offset as u32,
            export_count: self.exports.len() as u32,
            export_offset: export_offset as u32,
            import_count: self.imports.len() as u32,
            import_offset: import_offset as u32,
        };

        let mut out = Vec::with_capacity(data_offset);
        write_header(&mut out, &header);

        for name in &self.names {
            put_u32(&mut out, name.len() as u32 + 1);
            out.extend_from_slice(name);
            out.push(0);
            put_u32(&mut out, 0x0007_0010);
            put_u32(&mut out, 0);
        }

        for export in &self.exports {
            out.extend_from_slice(export.entry.as_bytes());
            for _ in 0..export.entry.num_additional_fields {
                put_u32(&mut out, ADDITIONAL_FIELD_WORD);
            }
        }

        for import in &self.imports {
            out.extend_from_slice(import.as_bytes());
        }

        for export in &self.exports {
            out.extend_from_slice(&export.payload);
        }

        debug_assert_eq!(out.len(), data_offset);
        out
    }
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn write_header(out: &mut Vec<u8>, header: &PackageHeader) {
    put_u32(out, header.signature);
    out.extend_from_slice(&header.version.to_le_bytes());
    out.extend_from_slice(&header.license_version.to_le_bytes());
    put_u32(out, header.header_size);
    put_u32(out, header.folder_name_length);
    out.extend_from_slice(header.folder_name.as_bytes());
    out.push(0);
    for value in [
        header.package_flags,
        header.name_count,
        header.name_offset,
        header.export_count,
        header.export_offset,
        header.import_count,
        header.import_offset,
    ] {
        put_u32(out, value);
    }
}

/// Package with a three-level export chain, an import chain and one
/// function-shaped export.
///
/// | Export | Path | Payload |
/// |--------|------|---------|
/// | 1 | `Outer` | 8 bytes |
/// | 2 | `Outer.Middle` | 4 bytes, 2 trailing words |
/// | 3 | `Outer.Middle.Leaf` | 6 bytes |
/// | 4 | `Outer.Tick` | function, 0x24 bytes of bytecode |
///
/// | Import | Path |
/// |--------|------|
/// | 1 | `Core::Core` |
/// | 2 | `Core::Core.Object` |
/// | 3 | `Core::Outer.Function` |
pub fn sample() -> Vec<u8> {
    let mut b = FixtureBuilder::new();
    let _none = b.name("None");
    let core = b.name("Core");
    let object = b.name("Object");
    let outer = b.name("Outer");
    let middle = b.name("Middle");
    let leaf = b.name("Leaf");
    let tick = b.name("Tick");
    let function = b.name("Function");

    let e_outer = b.export(outer, 0, (1..=8).collect());
    let e_middle = b.export_with_fields(middle, e_outer, vec![0xAA; 4], 2);
    b.export(leaf, e_middle, vec![0x10, 0x11, 0x12, 0x13, 0x14, 0x15]);
    b.export(tick, e_outer, function_payload(0x24, 0x10));

    let i_core = b.import(core, core, 0);
    b.import(core, object, -(i_core as i32));
    b.import(core, function, e_outer as i32);

    b.build()
}

/// Function payload: a 0x30 byte head, `bytecode` bytes of script and
/// `trailer` bytes after it.
pub fn function_payload(bytecode: usize, trailer: usize) -> Vec<u8> {
    let mut data = vec![0x5A; 0x30];
    data[0x28..0x2C].copy_from_slice(&(bytecode as u32 + 8).to_le_bytes());
    data[0x2C..0x30].copy_from_slice(&(bytecode as u32).to_le_bytes());
    data.extend((0..bytecode).map(|i| 0x80 | (i as u8 & 0x3F)));
    data.extend((0..trailer).map(|i| 0xC0 | (i as u8 & 0x3F)));
    data
}
