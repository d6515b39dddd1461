//! I/O utilities for CSV reading, writing, and directory enumeration.
//!
//! All file I/O in csv-drift flows through this module. It provides:
//!
//! - **Format**: a [`CsvFormat`] carrying the input delimiter and the input
//!   encoding (decoded via `encoding_rs`, defaulting to UTF-8).
//! - **Reader/writer construction** on top of `csv::ReaderBuilder` and
//!   `csv::WriterBuilder`. Output is always UTF-8 and only quotes fields that
//!   need it, so rewriting a file leaves untouched cells as they were.
//! - **Enumeration**: `*.csv` files and subdirectories are always listed in
//!   lexicographic order, so "the first file of a table" is stable across
//!   file systems.

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';

/// How input CSV files are parsed.
#[derive(Debug, Clone, Copy)]
pub struct CsvFormat {
    pub delimiter: u8,
    pub encoding: &'static Encoding,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_CSV_DELIMITER,
            encoding: UTF_8,
        }
    }
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn open_csv_reader_from_path(path: &Path, delimiter: u8) -> Result<csv::Reader<BufReader<File>>> {
    let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
    Ok(open_csv_reader(BufReader::new(file), delimiter))
}

pub fn open_csv_writer(path: &Path) -> Result<csv::Writer<BufWriter<File>>> {
    let file = File::create(path).with_context(|| format!("Creating output file {path:?}"))?;
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(DEFAULT_CSV_DELIMITER)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    Ok(builder.from_writer(BufWriter::new(file)))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

pub fn reader_headers<R>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<Vec<String>>
where
    R: Read,
{
    let headers = reader.byte_headers()?.clone();
    decode_record(&headers, encoding)
}

/// Reads only the header row of `path`.
pub fn read_headers(path: &Path, format: &CsvFormat) -> Result<Vec<String>> {
    let mut reader = open_csv_reader_from_path(path, format.delimiter)?;
    reader_headers(&mut reader, format.encoding)
        .with_context(|| format!("Reading headers from {path:?}"))
}

fn is_csv_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Lists the `*.csv` files directly inside `dir`, sorted by file name.
/// A missing directory yields an empty list.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Listing directory {dir:?}"))? {
        let path = entry?.path();
        if is_csv_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub fn first_csv_file(dir: &Path) -> Result<Option<PathBuf>> {
    Ok(list_csv_files(dir)?.into_iter().next())
}

/// Names of the subdirectories directly inside `dir`, sorted.
pub fn list_subdirectories(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Listing directory {dir:?}"))? {
        let entry = entry?;
        if entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Copies every CSV file of `src` into `dest` (created if needed) and returns
/// the destination paths.
pub fn copy_csv_files(src: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dest).with_context(|| format!("Creating directory {dest:?}"))?;
    let mut copied = Vec::new();
    for file in list_csv_files(src)? {
        let Some(name) = file.file_name() else {
            continue;
        };
        let target = dest.join(name);
        fs::copy(&file, &target)
            .with_context(|| format!("Copying {file:?} to {target:?}"))?;
        copied.push(target);
    }
    Ok(copied)
}

/// Renders `path` relative to `base` for diagnostics.
pub fn display_relative(path: &Path, base: &Path) -> String {
    path.strip_prefix(base).unwrap_or(path).display().to_string()
}

pub fn flush_writer<W: Write>(writer: &mut csv::Writer<W>, path: &Path) -> Result<()> {
    writer
        .flush()
        .with_context(|| format!("Flushing output file {path:?}"))
}
