pub mod timestamp;

use std::fs::File;
use std::path::Path;

use csv::ByteRecord;
use tracing::debug;

use crate::error::LoadError;
use crate::model::table::{ObservationRow, ReferencePrices, SeriesTable, SnapshotTable, StrikeRow};

pub use timestamp::TimestampParser;

/// Load a headerless time-series file. `columns` is the full schema,
/// timestamp first.
///
/// Rows with the wrong number of cells or a non-numeric value are dropped and
/// counted in `rejected`; an unparseable timestamp fails the whole load.
pub fn load_series(
    path: &Path,
    columns: &[String],
    timestamps: &TimestampParser,
) -> Result<SeriesTable, LoadError> {
    let mut reader = open(path)?;
    let mut rows = Vec::new();
    let mut rejected = 0usize;

    for record in reader.byte_records() {
        let record = record.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let line = line_of(&record);
        if record.len() != columns.len() {
            debug!(path = %path.display(), line, cells = record.len(), "row width does not match schema");
            rejected += 1;
            continue;
        }

        let Some(Ok(raw)) = record.get(0).map(std::str::from_utf8) else {
            debug!(path = %path.display(), line, "dropping row with undecodable timestamp");
            rejected += 1;
            continue;
        };
        let timestamp = timestamps.parse(raw).ok_or_else(|| LoadError::Timestamp {
            path: path.to_path_buf(),
            line,
            value: raw.to_string(),
        })?;

        match parse_numbers(record.iter().skip(1)) {
            Some(values) => rows.push(ObservationRow { timestamp, values }),
            None => {
                debug!(path = %path.display(), line, "dropping row with non-numeric cell");
                rejected += 1;
            }
        }
    }

    Ok(SeriesTable {
        columns: columns.get(1..).unwrap_or_default().to_vec(),
        rows: unique_by_timestamp(rows),
        rejected,
    })
}

/// Load a volume-by-strike snapshot. The first row carries reference prices,
/// every later row must match `columns` (strike first).
pub fn load_snapshot(path: &Path, columns: &[String]) -> Result<SnapshotTable, LoadError> {
    let mut reader = open(path)?;
    let mut records = reader.byte_records();

    let first = match records.next() {
        Some(record) => record.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?,
        None => {
            return Err(LoadError::MissingReferencePrices {
                path: path.to_path_buf(),
            })
        }
    };
    let reference = reference_prices(path, &first)?;

    let mut rows = Vec::new();
    let mut rejected = 0usize;
    for record in records {
        let record = record.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        if record.len() != columns.len() {
            debug!(path = %path.display(), line = line_of(&record), "row width does not match schema");
            rejected += 1;
            continue;
        }
        match parse_numbers(record.iter()) {
            Some(mut values) => {
                let strike = values.remove(0);
                rows.push(StrikeRow {
                    strike,
                    volumes: values,
                });
            }
            None => {
                debug!(path = %path.display(), line = line_of(&record), "dropping row with non-numeric cell");
                rejected += 1;
            }
        }
    }

    Ok(SnapshotTable {
        reference,
        volume_columns: columns.get(1..).unwrap_or_default().to_vec(),
        rows: merge_strikes(rows),
        rejected,
    })
}

// ── Helpers ──────────────────────────────────────────────────────────

fn open(path: &Path) -> Result<csv::Reader<File>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file))
}

fn line_of(record: &ByteRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

/// `None` if any cell is empty, not UTF-8, non-numeric, or not finite.
fn parse_numbers<'a>(cells: impl Iterator<Item = &'a [u8]>) -> Option<Vec<f64>> {
    cells.map(parse_cell).collect()
}

fn parse_cell(cell: &[u8]) -> Option<f64> {
    std::str::from_utf8(cell)
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Leading numeric cells of the first snapshot row. Parsing stops at the
/// first empty or non-numeric cell after at least one price.
fn reference_prices(path: &Path, record: &ByteRecord) -> Result<ReferencePrices, LoadError> {
    let mut values = Vec::new();
    for cell in record.iter() {
        match parse_cell(cell) {
            Some(v) if v > 0.0 || !values.is_empty() => values.push(v),
            _ if values.is_empty() => {
                return Err(LoadError::BadReferencePrice {
                    path: path.to_path_buf(),
                    value: String::from_utf8_lossy(cell).into_owned(),
                })
            }
            _ => break,
        }
    }
    ReferencePrices::new(values).ok_or_else(|| LoadError::MissingReferencePrices {
        path: path.to_path_buf(),
    })
}

/// Stable sort by time; a repeated timestamp keeps its last observation.
fn unique_by_timestamp(mut rows: Vec<ObservationRow>) -> Vec<ObservationRow> {
    rows.sort_by_key(|r| r.timestamp);
    let mut unique: Vec<ObservationRow> = Vec::with_capacity(rows.len());
    for row in rows {
        match unique.last_mut() {
            Some(last) if last.timestamp == row.timestamp => *last = row,
            _ => unique.push(row),
        }
    }
    unique
}

/// Sort by strike and sum the buckets of repeated strikes.
fn merge_strikes(mut rows: Vec<StrikeRow>) -> Vec<StrikeRow> {
    rows.sort_by(|a, b| a.strike.total_cmp(&b.strike));
    let mut merged: Vec<StrikeRow> = Vec::with_capacity(rows.len());
    for row in rows {
        match merged.last_mut() {
            Some(last) if last.strike == row.strike => {
                for (acc, v) in last.volumes.iter_mut().zip(&row.volumes) {
                    *acc += v;
                }
            }
            _ => merged.push(row),
        }
    }
    merged
}
