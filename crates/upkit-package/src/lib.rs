//! Unreal package (UPK) reader and in-place patcher.
//!
//! A package is a header followed by three tables and the serialized object
//! payloads they point at:
//!
//! - **Names** - interned strings referenced by index
//! - **Exports** - objects stored in this package, with payload size and offset
//! - **Imports** - objects referenced from other packages
//!
//! [`UpkPackage`] parses the tables, rebuilds fully-qualified object names by
//! walking owner chains, and supports fixed-size in-place edits plus moving a
//! payload to the end of the file so it can grow.
//!
//! Payload bytes are opaque, with one exception: growing a function object
//! ([`PayloadShape::Function`]) patches the bytecode size fields in its head.
//!
//! # Example
//!
//! ```no_run
//! use upkit_package::UpkPackage;
//!
//! let mut package = UpkPackage::open("Core.upk")?;
//!
//! for (index, path) in package.export_paths().iter().enumerate().skip(1) {
//!     let export = package.export(index);
//!     println!("{index:>5} {path} ({} bytes)", export.object_file_size);
//! }
//!
//! // Rename a name table entry in place (length must not change)
//! if let Some(index) = package.find_name("Engine") {
//!     package.rename(index, "Enjine")?;
//! }
//! # Ok::<(), upkit_package::Error>(())
//! ```

mod entry;
mod error;
mod header;
mod package;
mod tables;

pub mod relocate;
pub mod resolve;

#[cfg(test)]
mod fixture;

pub use entry::{ExportEntry, ImportEntry, NameEntry};
pub use error::{Error, Result, Section};
pub use header::PackageHeader;
pub use package::UpkPackage;
pub use relocate::PayloadShape;
