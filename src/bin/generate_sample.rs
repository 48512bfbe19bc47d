use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int32Array, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate};
use parquet::arrow::ArrowWriter;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const N_TRIPS: usize = 120_000;
const OUTPUT_PATH: &str = "sample_trips.parquet";

/// Relative pickup volume per hour of day, 0–23.
const HOUR_WEIGHTS: [u32; 24] = [
    5, 3, 2, 1, 1, 2, 4, 7, 9, 9, 8, 8, 9, 9, 10, 11, 12, 13, 14, 13, 11, 10, 9, 7,
];

/// Relative frequency of passenger counts 0–6.
const PASSENGER_WEIGHTS: [u32; 7] = [2, 70, 15, 4, 3, 3, 3];

/// Exponential-ish trip length in miles, capped at 60.
fn trip_distance(rng: &mut StdRng) -> f64 {
    let u: f64 = rng.gen_range(1e-9..1.0);
    let miles = -u.ln() * 3.2;
    (miles.min(60.0) * 100.0).round() / 100.0
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = StdRng::seed_from_u64(42);

    let month_start = NaiveDate::from_ymd_opt(2025, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid month start")?;
    let hours = WeightedIndex::new(HOUR_WEIGHTS).context("hour weights")?;
    let passengers = WeightedIndex::new(PASSENGER_WEIGHTS).context("passenger weights")?;

    let mut pickup = Vec::with_capacity(N_TRIPS);
    let mut passenger_count = Vec::with_capacity(N_TRIPS);
    let mut distance = Vec::with_capacity(N_TRIPS);
    let mut vendor = Vec::with_capacity(N_TRIPS);

    for _ in 0..N_TRIPS {
        let day = rng.gen_range(0..31i64);
        let hour = hours.sample(&mut rng) as i64;
        let second = rng.gen_range(0..3600i64);
        let ts = month_start + Duration::days(day) + Duration::hours(hour) + Duration::seconds(second);
        pickup.push(ts.and_utc().timestamp_micros());

        // TLC files carry a few percent of trips without a passenger count.
        if rng.gen_bool(0.03) {
            passenger_count.push(None);
        } else {
            passenger_count.push(Some(passengers.sample(&mut rng) as f64));
        }
        distance.push(trip_distance(&mut rng));
        vendor.push(rng.gen_range(1..=2));
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("VendorID", DataType::Int32, false),
        Field::new(
            "tpep_pickup_datetime",
            DataType::Timestamp(TimeUnit::Microsecond, None),
            false,
        ),
        Field::new("passenger_count", DataType::Float64, true),
        Field::new("trip_distance", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int32Array::from(vendor)),
            Arc::new(TimestampMicrosecondArray::from(pickup)),
            Arc::new(Float64Array::from(passenger_count)),
            Arc::new(Float64Array::from(distance)),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(OUTPUT_PATH).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;

    println!("Wrote {N_TRIPS} trips to {OUTPUT_PATH}");
    Ok(())
}
