//! Fully-qualified name reconstruction.
//!
//! Exports and imports only store their own short name plus an owner
//! reference. Walking the owner chain back to the root and joining the names
//! with `.` yields the qualified path, e.g. `Outer.Middle.Leaf`. Imports are
//! additionally prefixed with their package: `Core::Object.Leaf`.
//!
//! Every walk is capped by the size of the tables it can visit, so cycles and
//! dangling references in malformed packages terminate with a partial name.

use log::warn;

use crate::{ExportEntry, ImportEntry, NameEntry};

/// Separator between owner names.
pub const OWNER_SEPARATOR: &str = ".";

/// Separator between an import's package name and its path.
pub const PACKAGE_SEPARATOR: &str = "::";

#[inline]
fn name_at(names: &[NameEntry], idx: u32) -> &str {
    names.get(idx as usize).map_or("", |n| n.name.as_str())
}

/// Name used as an owner prefix. Index 0 and out-of-range indices contribute nothing.
#[inline]
fn owner_name(names: &[NameEntry], idx: u32) -> Option<&str> {
    if idx != 0 && (idx as usize) < names.len() {
        Some(&names[idx as usize].name)
    } else {
        None
    }
}

fn prepend(path: &mut String, owner: &str) {
    path.insert_str(0, OWNER_SEPARATOR);
    path.insert_str(0, owner);
}

/// Qualified name of export `index`.
pub fn export_path(names: &[NameEntry], exports: &[ExportEntry], index: usize) -> String {
    let mut path = name_at(names, exports[index].name_idx).to_string();
    let mut owner = exports[index].owner_ref as usize;
    let mut hops = 0;

    while owner != 0 && owner < exports.len() {
        if hops == exports.len() {
            warn!("export {index}: owner chain does not reach the root, truncating");
            break;
        }
        if let Some(name) = owner_name(names, exports[owner].name_idx) {
            prepend(&mut path, name);
        }
        owner = exports[owner].owner_ref as usize;
        hops += 1;
    }

    path
}

/// Qualified name of import `index`, prefixed with its package name.
pub fn import_path(
    names: &[NameEntry],
    exports: &[ExportEntry],
    imports: &[ImportEntry],
    index: usize,
) -> String {
    let entry = &imports[index];
    let mut path = name_at(names, entry.name_idx).to_string();
    let mut owner = entry.owner_ref;
    let max_hops = exports.len() + imports.len();
    let mut hops = 0;

    while owner != 0 {
        if hops == max_hops {
            warn!("import {index}: owner chain does not reach the root, truncating");
            break;
        }

        let name_idx = if owner > 0 && (owner as usize) < exports.len() {
            let export = &exports[owner as usize];
            owner = export.owner_ref as i32;
            export.name_idx
        } else if owner < 0 && (owner.unsigned_abs() as usize) < imports.len() {
            let import = &imports[owner.unsigned_abs() as usize];
            owner = import.owner_ref;
            import.name_idx
        } else {
            warn!("import {index}: owner reference {owner} is out of range, truncating");
            break;
        };

        if let Some(name) = owner_name(names, name_idx) {
            prepend(&mut path, name);
        }
        hops += 1;
    }

    format!("{}{}{}", name_at(names, entry.package_idx), PACKAGE_SEPARATOR, path)
}

/// Qualified names for every export, with an empty string for the null export at 0.
pub fn export_paths(names: &[NameEntry], exports: &[ExportEntry]) -> Vec<String> {
    let mut paths = Vec::with_capacity(exports.len().max(1));
    paths.push(String::new());
    paths.extend((1..exports.len()).map(|i| export_path(names, exports, i)));
    paths
}

/// Qualified names for every import, with an empty string for the null import at 0.
pub fn import_paths(
    names: &[NameEntry],
    exports: &[ExportEntry],
    imports: &[ImportEntry],
) -> Vec<String> {
    let mut paths = Vec::with_capacity(imports.len().max(1));
    paths.push(String::new());
    paths.extend((1..imports.len()).map(|i| import_path(names, exports, imports, i)));
    paths
}
