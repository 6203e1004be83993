//! upkit CLI - Command-line tool for inspecting and patching Unreal packages.
//!
//! This is the main entry point for the upkit command-line application.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use glob::MatchOptions;

use upkit::prelude::*;

/// upkit - Unreal package inspection and patching tool
#[derive(Parser)]
#[command(name = "upkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the package file
    #[arg(short, long, global = true, env = "INPUT_UPK")]
    upk: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the package header
    Info {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the name table
    Names {
        /// Filter pattern (glob-style)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// List exports with their qualified names
    Exports {
        /// Filter pattern (glob-style)
        #[arg(short, long)]
        filter: Option<String>,

        /// Show size and offset of each payload
        #[arg(short, long)]
        detailed: bool,
    },

    /// List imports with their qualified names
    Imports {
        /// Filter pattern (glob-style)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Save an export's payload to a file
    Extract {
        /// Qualified export name
        #[arg(short, long)]
        export: String,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Overwrite an export's payload with a file of the same size
    Replace {
        /// Qualified export name
        #[arg(short, long)]
        export: String,

        /// Input file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Write hex bytes at a file offset
    Patch {
        /// File offset (decimal or 0x-prefixed hex)
        #[arg(short, long, value_parser = parse_offset)]
        offset: u64,

        /// Bytes to write, as hex
        #[arg(short = 'x', long)]
        hex: String,
    },

    /// Rename a name table entry without changing its length
    Rename {
        /// Current name
        #[arg(short, long)]
        from: String,

        /// New name
        #[arg(short, long)]
        to: String,
    },

    /// Move an export's payload to the end of the file and grow it
    Grow {
        /// Qualified export name
        #[arg(short, long)]
        export: String,

        /// New payload size in bytes
        #[arg(short, long)]
        size: u32,

        /// Treat the payload as a function and grow its bytecode
        #[arg(long)]
        function: bool,
    },

    /// Search the package for a hex byte pattern
    Find {
        /// Pattern to search for, as hex
        #[arg(short = 'x', long)]
        hex: String,

        /// Report every occurrence instead of the first
        #[arg(short, long)]
        all: bool,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run(Cli::parse()) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let Some(path) = cli.upk else {
        bail!("no package given (use --upk or set INPUT_UPK)");
    };

    let mut package = open_package(&path)?;

    match cli.command {
        Commands::Info { json } => cmd_info(&package, json)?,
        Commands::Names { filter } => {
            cmd_names(&package, Filter::parse(filter.as_deref())?.as_ref())
        }
        Commands::Exports { filter, detailed } => {
            cmd_exports(&package, Filter::parse(filter.as_deref())?.as_ref(), detailed)
        }
        Commands::Imports { filter } => {
            cmd_imports(&package, Filter::parse(filter.as_deref())?.as_ref())
        }
        Commands::Extract { export, output } => cmd_extract(&mut package, &export, &output)?,
        Commands::Replace { export, input } => cmd_replace(&mut package, &export, &input)?,
        Commands::Patch { offset, hex } => cmd_patch(&mut package, offset, &hex)?,
        Commands::Rename { from, to } => cmd_rename(&mut package, &from, &to)?,
        Commands::Grow {
            export,
            size,
            function,
        } => cmd_grow(&mut package, &export, size, function)?,
        Commands::Find { hex, all } => cmd_find(&mut package, &hex, all)?,
    }

    package.close().context("Failed to flush package")?;
    Ok(())
}

fn open_package(path: &Path) -> Result<UpkPackage> {
    let package = UpkPackage::open(path)
        .with_context(|| format!("Failed to open package {}", path.display()))?;

    if !package.header().has_valid_signature() {
        log::warn!(
            "{}: unexpected signature {:#010x}",
            path.display(),
            package.header().signature
        );
    }

    Ok(package)
}

fn find_export(package: &UpkPackage, name: &str) -> Result<usize> {
    package
        .find_export(name)
        .with_context(|| format!("Export not found: {}", name))
}

fn cmd_info(package: &UpkPackage, json: bool) -> Result<()> {
    let header = package.header();

    if json {
        println!("{}", serde_json::to_string_pretty(header)?);
        return Ok(());
    }

    println!("Signature:       {:#010x}", header.signature);
    println!("Version:         {}/{}", header.version, header.license_version);
    println!("Header size:     {}", header.header_size);
    println!("Folder:          {}", header.folder_name);
    println!("Package flags:   {:#010x}", header.package_flags);
    println!("Names:           {} at {:#x}", header.name_count, header.name_offset);
    println!("Exports:         {} at {:#x}", header.export_count, header.export_offset);
    println!("Imports:         {} at {:#x}", header.import_count, header.import_offset);
    println!("File size:       {}", package.file_size());

    Ok(())
}

fn cmd_names(package: &UpkPackage, filter: Option<&Filter>) {
    let mut count = 0;
    for (index, entry) in package.names().iter().enumerate() {
        if filter.is_some_and(|f| !f.matches(&entry.name)) {
            continue;
        }
        println!("{:>6} {:#010x} {}", index, package.name_entry_offset(index), entry.name);
        count += 1;
    }

    println!("\nTotal: {} names", count);
}

fn cmd_exports(package: &UpkPackage, filter: Option<&Filter>, detailed: bool) {
    let mut count = 0;
    for (index, path) in package.export_paths().iter().enumerate().skip(1) {
        if filter.is_some_and(|f| !f.matches(path)) {
            continue;
        }

        if detailed {
            let export = package.export(index);
            println!(
                "{:>6} {:>10} {:#010x} {}",
                index, export.object_file_size, export.data_offset, path
            );
        } else {
            println!("{:>6} {}", index, path);
        }
        count += 1;
    }

    println!("\nTotal: {} exports", count);
}

fn cmd_imports(package: &UpkPackage, filter: Option<&Filter>) {
    let mut count = 0;
    for (index, path) in package.import_paths().iter().enumerate().skip(1) {
        if filter.is_some_and(|f| !f.matches(path)) {
            continue;
        }
        println!("{:>6} {}", index, path);
        count += 1;
    }

    println!("\nTotal: {} imports", count);
}

fn cmd_extract(package: &mut UpkPackage, name: &str, output: &Path) -> Result<()> {
    let index = find_export(package, name)?;
    let data = package.read_payload(index).context("Failed to read payload")?;
    fs::write(output, &data).context("Failed to write output file")?;

    println!("Extracted {} bytes to {}", data.len(), output.display());

    Ok(())
}

fn cmd_replace(package: &mut UpkPackage, name: &str, input: &Path) -> Result<()> {
    let index = find_export(package, name)?;
    let data = fs::read(input).context("Failed to read input file")?;
    package
        .write_payload(index, &data)
        .context("Failed to write payload")?;

    println!("Replaced payload of {} ({} bytes)", name, data.len());

    Ok(())
}

fn cmd_patch(package: &mut UpkPackage, offset: u64, hex: &str) -> Result<()> {
    let data = parse_hex(hex)?;
    package
        .write_raw(offset, &data)
        .context("Failed to write bytes")?;

    println!("Wrote {} bytes at {:#x}", data.len(), offset);

    Ok(())
}

fn cmd_rename(package: &mut UpkPackage, from: &str, to: &str) -> Result<()> {
    let Some(index) = package.find_name(from) else {
        bail!("Name not found: {}", from);
    };
    package.rename(index, to).context("Failed to rename")?;

    println!("Renamed name {}: {} -> {}", index, from, to);

    Ok(())
}

fn cmd_grow(package: &mut UpkPackage, name: &str, size: u32, function: bool) -> Result<()> {
    let index = find_export(package, name)?;
    let old_size = package.export(index).object_file_size;
    if size < old_size {
        log::warn!("{}: shrinking is not supported, payload is only moved", name);
    }

    let shape = if function {
        PayloadShape::Function
    } else {
        PayloadShape::Opaque
    };
    let offset = package
        .relocate(index, size, shape)
        .context("Failed to relocate export")?;

    println!(
        "Moved {} to {:#x} ({} -> {} bytes)",
        name,
        offset,
        old_size,
        package.export(index).object_file_size
    );

    Ok(())
}

fn cmd_find(package: &mut UpkPackage, hex: &str, all: bool) -> Result<()> {
    let pattern = parse_hex(hex)?;

    if all {
        let hits = package.find_all_chunks(&pattern)?;
        for offset in &hits {
            println!("{:#010x}", offset);
        }
        println!("\nTotal: {} matches", hits.len());
    } else {
        match package.find_chunk(&pattern)? {
            Some(offset) => println!("{:#010x}", offset),
            None => println!("not found"),
        }
    }

    Ok(())
}

/// Parse hex bytes, ignoring whitespace.
fn parse_hex(text: &str) -> Result<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let data = hex::decode(&compact).with_context(|| format!("Invalid hex: {}", text))?;
    if data.is_empty() {
        bail!("Empty byte pattern");
    }
    Ok(data)
}

fn parse_offset(text: &str) -> std::result::Result<u64, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(digits) => u64::from_str_radix(digits, 16),
        None => text.parse(),
    };
    parsed.map_err(|e| format!("invalid offset {:?}: {}", text, e))
}

/// Name filter for the listing commands.
///
/// Patterns without glob metacharacters match any name containing them.
/// Matching is case-insensitive either way.
enum Filter {
    Substring(String),
    Glob(glob::Pattern),
}

impl Filter {
    fn new(pattern: &str) -> Result<Self> {
        if !pattern.contains(['*', '?', '[']) {
            return Ok(Self::Substring(pattern.to_lowercase()));
        }
        let pattern = glob::Pattern::new(pattern)
            .with_context(|| format!("Invalid glob pattern: {}", pattern))?;
        Ok(Self::Glob(pattern))
    }

    fn parse(pattern: Option<&str>) -> Result<Option<Self>> {
        pattern.map(Self::new).transpose()
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            Self::Substring(needle) => name.to_lowercase().contains(needle.as_str()),
            Self::Glob(pattern) => pattern.matches_with(
                name,
                MatchOptions {
                    case_sensitive: false,
                    ..MatchOptions::new()
                },
            ),
        }
    }
}
