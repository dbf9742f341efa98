use csv::{ReaderBuilder, StringRecord};
use log::{debug, info};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::error::LoadError;
use crate::models::{ColumnType, FieldValue, Record};

/// Reads a comma-delimited file with a header row into records, in file order.
///
/// The whole file is read before anything is returned, so a malformed row
/// anywhere yields an error and no records.
pub fn read_records(path: &Path) -> Result<Vec<Record>, LoadError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => LoadError::FileNotFound(path.to_path_buf()),
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let records = parse_records(file, path)?;
    info!("Read {} rows from {}", records.len(), path.display());
    Ok(records)
}

fn parse_records<R: Read>(input: R, path: &Path) -> Result<Vec<Record>, LoadError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| csv_error(e, path))?
        .clone();
    if headers.is_empty() {
        return Err(LoadError::MissingHeader(path.to_path_buf()));
    }
    debug!("Columns in {}: {:?}", path.display(), headers);

    let rows = reader
        .records()
        .collect::<Result<Vec<StringRecord>, _>>()
        .map_err(|e| csv_error(e, path))?;

    let columns: Vec<ColumnType> = (0..headers.len())
        .map(|i| ColumnType::infer(rows.iter().filter_map(|row| row.get(i))))
        .collect();

    Ok(rows
        .iter()
        .map(|row| to_record(&headers, &columns, row))
        .collect())
}

fn to_record(headers: &StringRecord, columns: &[ColumnType], row: &StringRecord) -> Record {
    headers
        .iter()
        .zip(columns)
        .zip(row.iter())
        .map(|((column, kind), cell)| (column.to_string(), FieldValue::parse(cell, *kind)))
        .collect()
}

fn csv_error(err: csv::Error, path: &Path) -> LoadError {
    if let csv::ErrorKind::Io(source) = err.kind() {
        return LoadError::Io {
            path: path.to_path_buf(),
            source: io::Error::new(source.kind(), source.to_string()),
        };
    }

    let line = err.position().map(|p| p.line()).unwrap_or(0);
    LoadError::Parse {
        path: path.to_path_buf(),
        line,
        source: err,
    }
}
