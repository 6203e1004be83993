//! upkit - Unreal package inspection and patching library.
//!
//! This crate provides a unified interface to the upkit library crates.
//!
//! # Crates
//!
//! - [`upkit_common`] - Common utilities (binary reading, pattern search)
//! - [`upkit_package`] - Package tables, name resolution and patching
//!
//! # Example
//!
//! ```no_run
//! use upkit::prelude::*;
//!
//! let mut package = UpkPackage::open("XComStrategyGame.upk")?;
//!
//! if let Some(index) = package.find_export("XGFacility_Labs.GetCostSummary") {
//!     let payload = package.read_payload(index)?;
//!     println!("{} bytes", payload.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use upkit_common as common;
pub use upkit_package as package;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use upkit_common::BinaryReader;
    pub use upkit_package::{
        ExportEntry, ImportEntry, NameEntry, PackageHeader, PayloadShape, UpkPackage,
    };
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
