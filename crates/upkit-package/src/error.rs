//! Error types for the package crate.

use std::fmt;

use thiserror::Error;

/// Part of the package a parse error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Header,
    Names,
    Exports,
    Imports,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::Header => "header",
            Section::Names => "name table",
            Section::Exports => "export table",
            Section::Imports => "import table",
        };
        f.write_str(name)
    }
}

/// Errors that can occur when working with packages.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] upkit_common::Error),

    /// The stream ended in the middle of a table.
    #[error("{section} truncated at entry {index}")]
    Truncated { section: Section, index: usize },

    /// A non-empty table starts at or past the end of the file.
    #[error("{section} offset {offset:#x} lies outside the file ({file_size} bytes)")]
    TableOutOfBounds {
        section: Section,
        offset: u64,
        file_size: u64,
    },

    /// Raw write offset outside the structured region.
    #[error("offset {offset:#x} outside writable range {start:#x}..{end:#x}")]
    OffsetOutOfRange { offset: u64, start: u64, end: u64 },

    /// Payload write with a size different from the export's recorded size.
    #[error("export {index}: payload is {actual} bytes, expected {expected}")]
    PayloadSizeMismatch {
        index: usize,
        expected: u32,
        actual: usize,
    },

    /// Rename that would change the stored name length.
    #[error("name {index}: new name is {actual} bytes, expected {expected}")]
    NameLengthMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    /// Name that cannot be stored as a C string.
    #[error("invalid name: {0:?}")]
    InvalidName(String),

    /// Mutation of the synthetic null export at index 0.
    #[error("export 0 is the null export and has no on-disk record")]
    NullExport,

    /// Function-shaped payload whose size fields do not fit the payload.
    #[error("malformed function payload: {0}")]
    MalformedFunction(String),

    /// File offset that cannot be stored in a 32-bit table field.
    #[error("offset {0:#x} does not fit in a 32-bit field")]
    OffsetOverflow(u64),
}

/// Result type for package operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Map a stream error raised while reading `section` entry `index`.
    ///
    /// Running out of bytes becomes [`Error::Truncated`]; anything else stays an I/O error.
    pub(crate) fn while_reading(
        section: Section,
        index: usize,
    ) -> impl FnOnce(std::io::Error) -> Error {
        move |err| {
            if err.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::Truncated { section, index }
            } else {
                Error::Io(err)
            }
        }
    }
}
