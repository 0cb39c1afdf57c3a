//! Flat CSV export and re-import.
//!
//! Files are UTF-8 with a byte-order mark so spreadsheet tools pick the
//! right encoding for CJK titles. Fields are quoted only when they contain a
//! delimiter, a quote or a line break.

use std::borrow::Cow;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};

use crate::reconcile::{PlaylistCollection, Tabular, TrackField, TrackRecord};

const BOM: char = '\u{feff}';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CsvError {
    #[error("Missing header row")]
    MissingHeader,
    #[error("Unterminated quoted field starting on line {line}")]
    UnterminatedQuote { line: usize },
}

/// Replace characters that are not allowed in file names on common
/// platforms.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

/// File name `fetch` uses for a downloaded playlist.
pub fn playlist_file_name(name: &str) -> String {
    format!("playlist_{}.csv", sanitize_filename(name))
}

fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

fn write_record<'a>(
    writer: &mut impl Write,
    fields: impl IntoIterator<Item = Cow<'a, str>>,
) -> io::Result<()> {
    let line = fields
        .into_iter()
        .map(|field| escape_field(&field).into_owned())
        .collect::<Vec<_>>()
        .join(",");
    writeln!(writer, "{}", line)
}

/// Write a header row followed by every row.
pub fn write_csv<R: Tabular>(writer: &mut impl Write, rows: &[R]) -> io::Result<()> {
    write!(writer, "{}", BOM)?;
    write_record(writer, R::headers().iter().map(|header| Cow::Borrowed(*header)))?;
    for row in rows {
        write_record(writer, row.fields())?;
    }
    Ok(())
}

pub fn export_csv<R: Tabular>(path: &Path, rows: &[R]) -> Result<()> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, rows)?;
    fs::write(path, buffer)
        .wrap_err_with(|| format!("Failed to write CSV file: {}", path.display()))?;
    log::info!("Exported {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Split CSV text into records of fields.
///
/// Accepts `\n` and `\r\n` line endings and an optional leading BOM. Blank
/// lines are skipped.
pub fn parse_csv(contents: &str) -> Result<Vec<Vec<String>>, CsvError> {
    let contents = contents.strip_prefix(BOM).unwrap_or(contents);

    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut quote_line = 0;
    let mut chars = contents.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => {
                in_quotes = true;
                quote_line = line;
            }
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                line += 1;
                record.push(std::mem::take(&mut field));
                if !(record.len() == 1 && record[0].is_empty()) {
                    records.push(std::mem::take(&mut record));
                }
                record.clear();
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(CsvError::UnterminatedQuote { line: quote_line });
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    Ok(records)
}

/// Read tracks back from a CSV written by [`export_csv`] (or any CSV with
/// the same column names). Columns are matched by header; missing ones are
/// left empty and unknown ones ignored.
pub fn parse_tracks(contents: &str) -> Result<Vec<TrackRecord>, CsvError> {
    let mut records = parse_csv(contents)?.into_iter();
    let header = records.next().ok_or(CsvError::MissingHeader)?;
    let columns: Vec<Option<TrackField>> = header
        .iter()
        .map(|name| TrackField::from_name(name.trim()))
        .collect();

    Ok(records
        .map(|record| {
            let mut track = TrackRecord {
                id: String::new(),
                title: String::new(),
                artist: String::new(),
                album: String::new(),
                duration: String::new(),
            };
            for (column, value) in columns.iter().zip(record) {
                if let Some(field) = column {
                    track.set(*field, value);
                }
            }
            track
        })
        .collect())
}

/// Load a playlist collection from a CSV file; its name is the file stem.
pub fn import_playlist(path: &Path) -> Result<PlaylistCollection> {
    let contents = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read CSV file: {}", path.display()))?;
    let tracks = parse_tracks(&contents)
        .wrap_err_with(|| format!("Failed to parse CSV file: {}", path.display()))?;
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(PlaylistCollection::new(name, tracks))
}
