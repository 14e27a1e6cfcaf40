//! Main entry point for the zipsection CLI application.
//!
//! Finds the ZIP archive embedded at the end of a host file (local or
//! remote) and reports, lists or extracts it.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use zipsection::{
    Cli, HttpRangeReader, LocalFileReader, ReadAt, SectionLocation, ZipExtractor, ZipFileEntry,
    open_section,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    if cli.is_http_url() {
        let reader = HttpRangeReader::new(cli.file.clone())
            .await
            .with_context(|| format!("failed to open {}", cli.file))?;
        let reader = Arc::new(reader);

        process(reader.clone(), &cli).await?;

        if !cli.is_quiet() {
            eprintln!(
                "\nTotal bytes transferred: {}",
                format_size(reader.transferred_bytes())
            );
        }
    } else {
        let reader = LocalFileReader::new(Path::new(&cli.file))
            .with_context(|| format!("failed to open {}", cli.file))?;
        process(Arc::new(reader), &cli).await?;
    }

    Ok(())
}

fn init_logging(cli: &Cli) {
    let filter = match &cli.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Locate the embedded archive and run the requested action on it.
///
/// # Arguments
///
/// * `reader` - The host file, local or remote
/// * `cli` - Parsed command line options
///
/// # Returns
///
/// `Ok(())` once the action completes, or an error if no archive is found
/// or an entry fails to extract.
async fn process<R: ReadAt + 'static>(reader: Arc<R>, cli: &Cli) -> Result<()> {
    let size = reader.size();
    let archive = open_section(reader, size)
        .await
        .with_context(|| format!("no embedded zip archive found in {}", cli.file))?;

    if cli.section {
        print_section(archive.location(), size);
        return Ok(());
    }

    if cli.list || cli.verbose {
        list_files(archive.entries(), cli.verbose);
        return Ok(());
    }

    let selected: Vec<_> = archive
        .entries()
        .iter()
        .filter(|e| !e.is_directory && is_selected(e, cli))
        .collect();

    let multiple_files = cli.pipe && selected.len() > 1;
    for entry in selected {
        extract_file(&archive, entry, cli, multiple_files).await?;
    }

    Ok(())
}

/// Print where the archive sits in a host of `host_size` bytes.
fn print_section(location: &SectionLocation, host_size: u64) {
    // `location` is relative to the section view, which spans the whole archive
    let start = host_size - location.section_size;
    println!("host size:      {}", host_size);
    println!("section start:  {}", start);
    println!(
        "section size:   {} ({})",
        location.section_size,
        format_size(location.section_size)
    );
    println!("entries:        {}", location.directory.total_entries);
    println!("zip64:          {}", if location.is_zip64() { "yes" } else { "no" });
}

/// Apply positional file selection and `-x` exclusions.
fn is_selected(entry: &ZipFileEntry, cli: &Cli) -> bool {
    if !cli.files.is_empty() {
        let matches = cli.files.iter().any(|f| {
            if has_glob_chars(f) {
                glob_match(f, &entry.file_name)
            } else {
                entry.file_name == *f || base_name(&entry.file_name) == *f
            }
        });
        if !matches {
            return false;
        }
    }

    !cli
        .exclude
        .iter()
        .any(|x| entry.file_name.contains(x) || glob_match(x, &entry.file_name))
}

/// List archive contents
///
/// # Arguments
///
/// * `entries` - Central directory entries
/// * `verbose` - If true, show sizes, ratio and timestamps with totals
fn list_files(entries: &[ZipFileEntry], verbose: bool) {
    if !verbose {
        for entry in entries {
            println!("{}", entry.file_name);
        }
        return;
    }

    println!(
        "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
        "Length", "Size", "Cmpr", "Date", "Time"
    );
    println!("{}", "-".repeat(70));

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for entry in entries {
        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();
        println!(
            "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            ratio(entry.compressed_size, entry.uncompressed_size),
            year,
            month,
            day,
            hour,
            minute,
            entry.file_name
        );

        if !entry.is_directory {
            total_uncompressed += entry.uncompressed_size;
            total_compressed += entry.compressed_size;
            file_count += 1;
        }
    }

    println!("{}", "-".repeat(70));
    println!(
        "{:>10}  {:>10}  {}  {:>21}  {} files",
        total_uncompressed,
        total_compressed,
        ratio(total_compressed, total_uncompressed),
        "",
        file_count
    );
}

/// Space saved by compression, as a right-aligned percentage.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 && compressed <= uncompressed {
        format!("{:>4}%", 100 - (compressed * 100 / uncompressed))
    } else {
        "  0%".to_string()
    }
}

/// Extract one entry to disk, or to stdout in pipe mode.
///
/// Entries whose names would escape the extraction directory are skipped
/// with a warning.
///
/// # Arguments
///
/// * `archive` - The opened archive
/// * `entry` - The entry to extract
/// * `cli` - Parsed command line options
/// * `show_filename` - Print a header before the data when piping
///
/// # Returns
///
/// `Ok(())` when the entry was written or skipped.
async fn extract_file<R: ReadAt + 'static>(
    archive: &ZipExtractor<R>,
    entry: &ZipFileEntry,
    cli: &Cli,
    show_filename: bool,
) -> Result<()> {
    if cli.pipe {
        if show_filename {
            use tokio::io::AsyncWriteExt;
            tokio::io::stdout()
                .write_all(format!("--- {} ---\n", entry.file_name).as_bytes())
                .await?;
        }
        archive
            .extract_to_stdout(entry)
            .await
            .with_context(|| format!("failed to extract {}", entry.file_name))?;
        return Ok(());
    }

    let Some(relative) = safe_relative_path(&entry.file_name, cli.junk_paths) else {
        warn!(name = %entry.file_name, "skipping entry with unsafe path");
        if !cli.is_quiet() {
            eprintln!("Skipping: {} (unsafe path)", entry.file_name);
        }
        return Ok(());
    };
    let output_path = match &cli.extract_dir {
        Some(dir) => PathBuf::from(dir).join(relative),
        None => relative,
    };

    if output_path.exists() && (cli.never_overwrite || !cli.overwrite) {
        if !cli.is_quiet() {
            let hint = if cli.never_overwrite {
                "file exists"
            } else {
                "use -o to overwrite"
            };
            eprintln!("Skipping: {} ({})", entry.file_name, hint);
        }
        return Ok(());
    }

    if !cli.is_quiet() {
        println!("  extracting: {}", entry.file_name);
    }

    archive
        .extract_to_file(entry, &output_path)
        .await
        .with_context(|| format!("failed to extract {}", entry.file_name))?;

    Ok(())
}

/// Turn an entry name into a path that stays inside the extraction root.
///
/// Only plain name components are kept; `.` is dropped. Names with `..`,
/// a root or a drive prefix are rejected, as are names that leave nothing
/// to write. Backslashes count as separators.
///
/// # Arguments
///
/// * `name` - The entry name as stored in the archive
/// * `junk_paths` - If true, keep only the final component
///
/// # Returns
///
/// The relative output path, or `None` if the entry must be skipped.
fn safe_relative_path(name: &str, junk_paths: bool) -> Option<PathBuf> {
    let name = name.replace('\\', "/");
    let mut parts = Vec::new();
    for component in Path::new(&name).components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if junk_paths {
        return parts.last().map(PathBuf::from);
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.iter().collect())
}

/// Final component of an entry name, or the whole name if it has none.
fn base_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| name.to_string())
}

fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Glob matching supporting `*` (any run) and `?` (one character).
fn glob_match(pattern: &str, text: &str) -> bool {
    fn do_match(pattern: &[char], text: &[char]) -> bool {
        match (pattern.first(), text.first()) {
            (None, None) => true,
            (Some('*'), _) => {
                do_match(&pattern[1..], text) || (!text.is_empty() && do_match(pattern, &text[1..]))
            }
            (Some('?'), Some(_)) => do_match(&pattern[1..], &text[1..]),
            (Some(p), Some(t)) if p == t => do_match(&pattern[1..], &text[1..]),
            _ => false,
        }
    }

    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    do_match(&pattern, &text)
}

/// Human readable size with binary units
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
