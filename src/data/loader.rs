use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray, Float64Array};
use arrow::compute::cast;
use arrow::datatypes::{
    DataType, TimeUnit, TimestampMicrosecondType, TimestampMillisecondType,
    TimestampNanosecondType, TimestampSecondType,
};
use chrono::{NaiveDate, NaiveDateTime};
use log::{info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value as JsonValue;

use super::model::RawTrip;
use crate::error::PipelineError;

pub const PICKUP_COLUMN: &str = "tpep_pickup_datetime";
pub const PASSENGER_COLUMN: &str = "passenger_count";
pub const DISTANCE_COLUMN: &str = "trip_distance";

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a trip table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – e.g. the TLC yellow taxi monthly files (recommended)
/// * `.csv`     – header row with at least the three required columns
/// * `.json`    – `[{ "tpep_pickup_datetime": "...", ... }, ...]`
///
/// A missing required column or an unreadable pickup timestamp fails the
/// whole load. Rows with a null passenger count or distance are skipped.
pub fn load_file(path: &Path) -> Result<Vec<RawTrip>> {
    load_sampled(path, usize::MAX, 0)
}

/// Load a file and cap it at `sample_size` rows.
///
/// The cap is drawn over every parsed row, before rows with missing
/// numbers are dropped, so the sample matches a plain row sample of the
/// source table.
pub fn load_sampled(path: &Path, sample_size: usize, seed: u64) -> Result<Vec<RawTrip>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let mut rows = RowCollector::default();
    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path, &mut rows)?,
        "json" => load_json(path, &mut rows)?,
        "csv" => load_csv(path, &mut rows)?,
        other => bail!("Unsupported file extension: .{other}"),
    }
    rows.finish(path, sample_size, seed)
}

/// Draw `sample_size` distinct rows without replacement, in draw order.
/// Tables at or below the cap are returned untouched.
pub fn sample_rows<T: Clone>(rows: Vec<T>, sample_size: usize, seed: u64) -> Vec<T> {
    if rows.len() <= sample_size {
        return rows;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let picked = rand::seq::index::sample(&mut rng, rows.len(), sample_size);
    info!("sampled {sample_size} of {} rows (seed {seed})", rows.len());
    picked.into_iter().map(|i| rows[i].clone()).collect()
}

/// Parse a pickup timestamp. Accepts `YYYY-MM-DD HH:MM:SS[.fff]`, the same
/// with a `T` separator, or a bare date (midnight).
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

// ---------------------------------------------------------------------------
// Row validation shared by every format
// ---------------------------------------------------------------------------

/// A parsed row whose numeric cells have not been checked yet.
#[derive(Debug, Clone)]
struct PendingRow {
    row: usize,
    pickup_time: NaiveDateTime,
    passengers: Option<f64>,
    distance: Option<f64>,
}

#[derive(Default)]
struct RowCollector {
    pending: Vec<PendingRow>,
}

impl RowCollector {
    fn push(&mut self, pickup_time: NaiveDateTime, passengers: Option<f64>, distance: Option<f64>) {
        let row = self.pending.len();
        self.pending.push(PendingRow {
            row,
            pickup_time,
            passengers,
            distance,
        });
    }

    /// Sample, then validate the sampled rows.
    fn finish(self, path: &Path, sample_size: usize, seed: u64) -> Result<Vec<RawTrip>> {
        let total = self.pending.len();
        let sampled = sample_rows(self.pending, sample_size, seed);
        let considered = sampled.len();

        let mut trips = Vec::with_capacity(considered);
        for row in sampled {
            if let Some(trip) = validate_row(row)? {
                trips.push(trip);
            }
        }

        let skipped = considered - trips.len();
        if skipped > 0 {
            warn!(
                "{}: skipped {skipped} of {considered} rows with missing passenger count or distance",
                path.display()
            );
        }
        info!("{}: loaded {} trips from {total} rows", path.display(), trips.len());
        Ok(trips)
    }

    fn current_row(&self) -> usize {
        self.pending.len()
    }
}

/// `Ok(None)` for rows that are skipped rather than rejected.
fn validate_row(row: PendingRow) -> Result<Option<RawTrip>> {
    let (Some(passengers), Some(distance)) = (row.passengers, row.distance) else {
        return Ok(None);
    };
    if !distance.is_finite() || distance < 0.0 || passengers.is_nan() {
        return Ok(None);
    }
    if passengers < 0.0 || passengers.fract() != 0.0 || passengers > u32::MAX as f64 {
        return Err(PipelineError::MalformedColumn {
            column: PASSENGER_COLUMN.into(),
            row: row.row,
            reason: format!("{passengers} is not a non-negative integer"),
        }
        .into());
    }
    Ok(Some(RawTrip {
        pickup_time: row.pickup_time,
        passenger_count: passengers as u32,
        trip_distance: distance,
    }))
}

fn malformed_timestamp(row: usize, reason: impl Into<String>) -> anyhow::Error {
    PipelineError::MalformedColumn {
        column: PICKUP_COLUMN.into(),
        row,
        reason: reason.into(),
    }
    .into()
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`
/// with ISO dates):
///
/// ```json
/// [
///   { "tpep_pickup_datetime": "2025-01-01 00:18:38", "passenger_count": 1, "trip_distance": 1.6 },
///   ...
/// ]
/// ```
fn load_json(path: &Path, rows: &mut RowCollector) -> Result<()> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let pickup = match obj.get(PICKUP_COLUMN) {
            None => return Err(PipelineError::MissingColumn(PICKUP_COLUMN.into()).into()),
            Some(JsonValue::String(s)) => parse_timestamp(s)
                .ok_or_else(|| malformed_timestamp(i, format!("cannot parse '{s}'")))?,
            Some(other) => return Err(malformed_timestamp(i, format!("expected a string, got {other}"))),
        };
        let passengers = json_number(obj.get(PASSENGER_COLUMN), PASSENGER_COLUMN, i)?;
        let distance = json_number(obj.get(DISTANCE_COLUMN), DISTANCE_COLUMN, i)?;
        rows.push(pickup, passengers, distance);
    }
    Ok(())
}

fn json_number(val: Option<&JsonValue>, col: &str, row: usize) -> Result<Option<f64>> {
    match val {
        None => Err(PipelineError::MissingColumn(col.into()).into()),
        Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Number(n)) => Ok(n.as_f64()),
        Some(other) => Err(PipelineError::MalformedColumn {
            column: col.into(),
            row,
            reason: format!("expected a number, got {other}"),
        }
        .into()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names; extra columns are ignored.
/// Empty numeric cells count as missing.
fn load_csv(path: &Path, rows: &mut RowCollector) -> Result<()> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| PipelineError::MissingColumn(name.into()).into())
    };
    let pickup_idx = column(PICKUP_COLUMN)?;
    let passenger_idx = column(PASSENGER_COLUMN)?;
    let distance_idx = column(DISTANCE_COLUMN)?;

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let raw = record.get(pickup_idx).unwrap_or("");
        let pickup = parse_timestamp(raw)
            .ok_or_else(|| malformed_timestamp(row_no, format!("cannot parse '{raw}'")))?;
        let passengers = csv_number(record.get(passenger_idx), PASSENGER_COLUMN, row_no)?;
        let distance = csv_number(record.get(distance_idx), DISTANCE_COLUMN, row_no)?;
        rows.push(pickup, passengers, distance);
    }
    Ok(())
}

fn csv_number(cell: Option<&str>, col: &str, row: usize) -> Result<Option<f64>> {
    let s = cell.unwrap_or("").trim();
    if s.is_empty() {
        return Ok(None);
    }
    s.parse::<f64>().map(Some).map_err(|_| {
        PipelineError::MalformedColumn {
            column: col.into(),
            row,
            reason: format!("'{s}' is not a number"),
        }
        .into()
    })
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet trip table.
///
/// Expected schema:
/// - `tpep_pickup_datetime`: Timestamp (any unit) or Utf8
/// - `passenger_count`: any integer or float type (TLC files use Float64)
/// - `trip_distance`: any integer or float type
///
/// Other columns are ignored.
fn load_parquet(path: &Path, rows: &mut RowCollector) -> Result<()> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let column = |name: &str| -> Result<ArrayRef> {
            let idx = schema
                .index_of(name)
                .map_err(|_| PipelineError::MissingColumn(name.into()))?;
            Ok(batch.column(idx).clone())
        };
        let pickup_col = column(PICKUP_COLUMN)?;
        let passenger_col = as_f64_column(&column(PASSENGER_COLUMN)?, PASSENGER_COLUMN)?;
        let distance_col = as_f64_column(&column(DISTANCE_COLUMN)?, DISTANCE_COLUMN)?;

        for row in 0..batch.num_rows() {
            let global_row = rows.current_row();
            let pickup = extract_timestamp(&pickup_col, row)
                .map_err(|reason| malformed_timestamp(global_row, reason))?;
            rows.push(
                pickup,
                nullable_value(&passenger_col, row),
                nullable_value(&distance_col, row),
            );
        }
    }
    Ok(())
}

// -- Parquet / Arrow helpers --

/// Cast any numeric column to Float64.
fn as_f64_column(col: &ArrayRef, name: &str) -> Result<Float64Array> {
    if !col.data_type().is_numeric() {
        return Err(PipelineError::MalformedColumn {
            column: name.into(),
            row: 0,
            reason: format!("expected a numeric column, got {:?}", col.data_type()),
        }
        .into());
    }
    let casted = cast(col.as_ref(), &DataType::Float64).with_context(|| format!("casting '{name}'"))?;
    Ok(casted.as_primitive::<arrow::datatypes::Float64Type>().clone())
}

fn nullable_value(col: &Float64Array, row: usize) -> Option<f64> {
    if col.is_null(row) {
        None
    } else {
        Some(col.value(row))
    }
}

/// Extract a pickup timestamp from an Arrow column at the given row.
fn extract_timestamp(col: &ArrayRef, row: usize) -> std::result::Result<NaiveDateTime, String> {
    if col.is_null(row) {
        return Err("null timestamp".into());
    }
    let ts = match col.data_type() {
        DataType::Timestamp(TimeUnit::Second, _) => {
            col.as_primitive::<TimestampSecondType>().value_as_datetime(row)
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            col.as_primitive::<TimestampMillisecondType>().value_as_datetime(row)
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            col.as_primitive::<TimestampMicrosecondType>().value_as_datetime(row)
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            col.as_primitive::<TimestampNanosecondType>().value_as_datetime(row)
        }
        DataType::Utf8 => parse_timestamp(col.as_string::<i32>().value(row)),
        DataType::LargeUtf8 => parse_timestamp(col.as_string::<i64>().value(row)),
        other => return Err(format!("expected a timestamp column, got {other:?}")),
    };
    ts.ok_or_else(|| "timestamp out of range or unparseable".into())
}
