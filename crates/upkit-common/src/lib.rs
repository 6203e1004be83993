//! Common utilities for upkit.
//!
//! This crate provides the low-level building blocks shared by the upkit crates:
//!
//! - [`BinaryReader`] - Zero-copy little-endian reading from byte slices
//! - [`ReadExt`] - Struct and C-string reads from streams
//! - [`ansi`] - Lossless single-byte string decoding
//! - [`search`] - Byte pattern search backed by `memchr`

mod error;
mod reader;

pub mod ansi;
pub mod search;

pub use error::{Error, Result};
pub use reader::{BinaryReader, ReadExt};
