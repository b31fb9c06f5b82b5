//! CLI Application logic
//!
//! Contains the command-line interface implementation. Every command
//! indexes the workspace first, then answers one query.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use ffi_navigator_core::{split_lines, Definition, Fact, Location, Position, Reference};
use ffi_navigator_lsp::Workspace;

/// Output format for query results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for tool consumption
    Json,
}

#[derive(Parser)]
#[command(name = "ffi-navigator")]
#[command(author, version, about = "Follow FFI registrations between Python and C++", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a source tree and print statistics
    Index {
        /// Root of the source tree
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Find the definitions of a Python expression
    Defs {
        /// Root of the source tree
        root: PathBuf,

        /// Python file the expression appears in
        file: PathBuf,

        /// Dotted expression, e.g. `_make.Let`
        symbol: String,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Find every reference to a registry key
    Refs {
        /// Root of the source tree
        root: PathBuf,

        /// Registry key, e.g. `relay._make.Let`
        key: String,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Resolve whatever sits at a cursor position
    Lookup {
        /// Root of the source tree
        root: PathBuf,

        /// File containing the cursor
        file: PathBuf,

        /// Line number, starting at 1
        line: u32,

        /// Column, starting at 1
        character: u32,

        /// List references instead of definitions
        #[arg(short, long)]
        references: bool,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Index { root, format } => index_command(&root, format, &mut out),
        Commands::Defs {
            root,
            file,
            symbol,
            format,
        } => defs_command(&root, &file, &symbol, format, &mut out),
        Commands::Refs { root, key, format } => refs_command(&root, &key, format, &mut out),
        Commands::Lookup {
            root,
            file,
            line,
            character,
            references,
            format,
        } => {
            let pos = Position::new(line.saturating_sub(1), character.saturating_sub(1));
            lookup_command(&root, &file, pos, references, format, &mut out)
        }
    }
}

/// Index `root` with its `ffi-navigator.toml`, if any
pub fn open_workspace(root: &Path) -> Result<Workspace> {
    let workspace = Workspace::new();
    workspace
        .initialize(root)
        .with_context(|| format!("Failed to index {}", root.display()))?;
    Ok(workspace)
}

/// Execute the index command
pub fn index_command(root: &Path, format: OutputFormat, out: &mut dyn Write) -> Result<()> {
    let workspace = open_workspace(root)?;
    let stats = workspace
        .stats()
        .context("Workspace has no index after initialization")?;

    match format {
        OutputFormat::Json => write_json(out, &stats)?,
        OutputFormat::Text => {
            writeln!(out, "Root:            {}", stats.root.display())?;
            writeln!(out, "Dialects:        {}", stats.dialects.join(", "))?;
            writeln!(out, "Files:           {}", stats.files)?;
            writeln!(out, "Definition keys: {}", stats.definition_keys)?;
            writeln!(out, "Reference keys:  {}", stats.reference_keys)?;
            writeln!(out, "Exports:         {}", stats.exports)?;
        }
    }
    Ok(())
}

/// Execute the defs command
pub fn defs_command(
    root: &Path,
    file: &Path,
    symbol: &str,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    let workspace = open_workspace(root)?;
    let file = locate_file(root, file)?;
    let defs = workspace.find_defs(&file, symbol);

    match format {
        OutputFormat::Json => write_json(out, &defs)?,
        OutputFormat::Text => write_definitions(out, &defs, symbol)?,
    }
    Ok(())
}

/// Execute the refs command
pub fn refs_command(root: &Path, key: &str, format: OutputFormat, out: &mut dyn Write) -> Result<()> {
    let workspace = open_workspace(root)?;
    let refs = unique_references(workspace.find_refs(key));

    match format {
        OutputFormat::Json => write_json(out, &refs)?,
        OutputFormat::Text => write_references(out, &refs, key)?,
    }
    Ok(())
}

/// Result of a cursor lookup
#[derive(Debug, Serialize)]
struct LookupReport<'a> {
    fact: Option<&'a Fact>,
    locations: &'a [Location],
}

/// Execute the lookup command; `pos` is zero-based
pub fn lookup_command(
    root: &Path,
    file: &Path,
    pos: Position,
    references: bool,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    let workspace = open_workspace(root)?;
    let file = locate_file(root, file)?;
    let text = read_lossy(&file)?;
    let lines = split_lines(&text);

    let fact = workspace.extract_symbol(&file, &lines, pos);
    let locations = if references {
        workspace.references_at(&file, &lines, pos)
    } else {
        workspace.definitions_at(&file, &lines, pos)
    };

    match format {
        OutputFormat::Json => write_json(
            out,
            &LookupReport {
                fact: fact.as_ref(),
                locations: &locations,
            },
        )?,
        OutputFormat::Text => {
            match &fact {
                Some(Fact::Symbol(symbol)) => writeln!(out, "symbol {}", symbol.value)?,
                Some(fact) => writeln!(out, "{} {}", fact.kind(), fact.key().unwrap_or(""))?,
                None => writeln!(out, "Nothing recognized at {}", describe(&file, pos))?,
            }
            for location in &locations {
                writeln!(out, "{}", describe(&location.path, location.range.start))?;
            }
        }
    }
    Ok(())
}

fn write_definitions(out: &mut dyn Write, defs: &[Definition], symbol: &str) -> io::Result<()> {
    if defs.is_empty() {
        return writeln!(out, "No definitions found for {}", symbol);
    }
    for def in defs {
        writeln!(out, "{}  {}", describe(&def.path, def.range.start), def.key)?;
    }
    Ok(())
}

fn write_references(out: &mut dyn Write, refs: &[Reference], key: &str) -> io::Result<()> {
    if refs.is_empty() {
        return writeln!(out, "No references found for {}", key);
    }
    for reference in refs {
        writeln!(out, "{}", describe(&reference.path, reference.range.start))?;
    }
    writeln!(out, "Found {} reference(s)", refs.len())
}

/// Drop references reported more than once at the same location
fn unique_references(mut refs: Vec<Reference>) -> Vec<Reference> {
    let mut seen = HashSet::new();
    refs.retain(|reference| seen.insert(Location::from(reference)));
    refs
}

fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize results to JSON")?;
    writeln!(out, "{}", json)?;
    Ok(())
}

/// `path:line:column`, one-based
fn describe(path: &Path, pos: Position) -> String {
    format!("{}:{}:{}", path.display(), pos.line + 1, pos.character + 1)
}

/// `file` as given, or relative to `root`, made absolute
fn locate_file(root: &Path, file: &Path) -> Result<PathBuf> {
    let candidate = if file.exists() {
        file.to_path_buf()
    } else {
        root.join(file)
    };
    fs::canonicalize(&candidate)
        .with_context(|| format!("Input file not found: {}", file.display()))
}

fn read_lossy(path: &Path) -> Result<String> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read input file: {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
