use std::collections::BTreeMap;

use serde::Serialize;

use super::model::{Record, TimePeriod};

// ---------------------------------------------------------------------------
// Projection row types
// ---------------------------------------------------------------------------

/// One visible pickup on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapPoint {
    pub lat: f64,
    pub lon: f64,
    pub cluster: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourCount {
    pub hour: u32,
    pub trips: usize,
}

/// Equal-width bin `[start, end)`; the last bin also includes `end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistanceBin {
    pub start: f64,
    pub end: f64,
    pub trips: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DistanceHistogram {
    pub bins: Vec<DistanceBin>,
}

impl DistanceHistogram {
    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.trips).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PassengerCount {
    pub passengers: u32,
    pub trips: usize,
}

// ---------------------------------------------------------------------------
// AggregateResult – the four projections of one filtered view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AggregateResult {
    pub points: Vec<MapPoint>,
    pub hourly: Vec<HourCount>,
    pub distance: DistanceHistogram,
    pub passengers: Vec<PassengerCount>,
}

impl AggregateResult {
    /// Compute all four projections from scratch.
    pub fn from_records<'a, I>(records: I, distance_bins: usize) -> Self
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let records: Vec<&Record> = records.into_iter().collect();
        AggregateResult {
            points: map_points(&records),
            hourly: hourly_counts(&records),
            distance: distance_histogram(&records, distance_bins),
            passengers: passenger_counts(&records),
        }
    }

    /// Number of records the projections were computed from.
    pub fn total_trips(&self) -> usize {
        self.points.len()
    }
}

// ---------------------------------------------------------------------------
// Individual projections
// ---------------------------------------------------------------------------

pub fn map_points(records: &[&Record]) -> Vec<MapPoint> {
    records
        .iter()
        .map(|r| MapPoint {
            lat: r.lat,
            lon: r.lon,
            cluster: r.cluster,
        })
        .collect()
}

/// Trips per hour of day, ascending, present hours only.
pub fn hourly_counts(records: &[&Record]) -> Vec<HourCount> {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for r in records {
        *counts.entry(r.hour).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(hour, trips)| HourCount { hour, trips })
        .collect()
}

/// Fold hourly counts back into time-of-day buckets.
pub fn period_totals(hourly: &[HourCount]) -> BTreeMap<TimePeriod, usize> {
    let mut totals = BTreeMap::new();
    for h in hourly {
        *totals.entry(TimePeriod::from_hour(h.hour)).or_default() += h.trips;
    }
    totals
}

/// Trips per passenger count, ascending, present values only.
pub fn passenger_counts(records: &[&Record]) -> Vec<PassengerCount> {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for r in records {
        *counts.entry(r.passenger_count).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(passengers, trips)| PassengerCount { passengers, trips })
        .collect()
}

/// Bin trip distances into `n_bins` equal-width bins spanning the observed
/// min and max. A single distinct value is widened to `[v - 0.5, v + 0.5]`.
pub fn distance_histogram(records: &[&Record], n_bins: usize) -> DistanceHistogram {
    if records.is_empty() || n_bins == 0 {
        return DistanceHistogram::default();
    }
    let (mut lo, mut hi) = records.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
        (lo.min(r.trip_distance), hi.max(r.trip_distance))
    });
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / n_bins as f64;
    // Counting and reported bin bounds share one edge function.
    let edge = |i: usize| if i == n_bins { hi } else { lo + i as f64 * width };

    let mut counts = vec![0usize; n_bins];
    for r in records {
        let d = r.trip_distance;
        let mut idx = (((d - lo) / width) as usize).min(n_bins - 1);
        if idx > 0 && d < edge(idx) {
            idx -= 1;
        } else if idx + 1 < n_bins && d >= edge(idx + 1) {
            idx += 1;
        }
        counts[idx] += 1;
    }

    let bins = counts
        .into_iter()
        .enumerate()
        .map(|(i, trips)| DistanceBin {
            start: edge(i),
            end: edge(i + 1),
            trips,
        })
        .collect();
    DistanceHistogram { bins }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(hour: u32, passengers: u32, distance: f64) -> Record {
        let pickup_time = NaiveDate::from_ymd_opt(2025, 1, 10)
            .unwrap()
            .and_hms_opt(hour, 30, 0)
            .unwrap();
        Record {
            pickup_time,
            hour,
            date: pickup_time.date(),
            passenger_count: passengers,
            trip_distance: distance,
            lat: 40.6,
            lon: -74.0,
            cluster: 0,
        }
    }

    #[test]
    fn empty_input_gives_empty_projections() {
        let result = AggregateResult::from_records(std::iter::empty::<&Record>(), 30);
        assert_eq!(result, AggregateResult::default());
        assert_eq!(result.total_trips(), 0);
    }

    #[test]
    fn only_present_keys_are_reported() {
        let rows = [record(7, 2, 1.0), record(20, 3, 19.5), record(7, 2, 4.0)];
        let result = AggregateResult::from_records(&rows, 30);
        assert_eq!(
            result.hourly,
            vec![HourCount { hour: 7, trips: 2 }, HourCount { hour: 20, trips: 1 }]
        );
        assert_eq!(
            result.passengers,
            vec![
                PassengerCount { passengers: 2, trips: 2 },
                PassengerCount { passengers: 3, trips: 1 }
            ]
        );
    }

    #[test]
    fn histogram_spans_observed_range() {
        let rows: Vec<Record> = (0..=30).map(|i| record(9, 1, i as f64)).collect();
        let refs: Vec<&Record> = rows.iter().collect();
        let hist = distance_histogram(&refs, 30);
        assert_eq!(hist.bins.len(), 30);
        assert_eq!(hist.bins[0].start, 0.0);
        assert_eq!(hist.bins[29].end, 30.0);
        assert_eq!(hist.total(), 31);
        // 29.0 and the maximum both land in the last bin.
        assert_eq!(hist.bins[29].trips, 2);
    }

    #[test]
    fn histogram_counts_agree_with_bin_edges() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..2000 {
            let n = rng.gen_range(1..60);
            let rows: Vec<Record> = (0..n)
                .map(|_| record(9, 1, rng.gen_range(0..2000u32) as f64 / 100.0))
                .collect();
            let refs: Vec<&Record> = rows.iter().collect();
            let hist = distance_histogram(&refs, 30);
            let last = hist.bins.len() - 1;
            for (i, bin) in hist.bins.iter().enumerate() {
                let inside = rows
                    .iter()
                    .filter(|r| {
                        let d = r.trip_distance;
                        bin.start <= d && (d < bin.end || (i == last && d <= bin.end))
                    })
                    .count();
                assert_eq!(bin.trips, inside, "bin {i} [{}, {})", bin.start, bin.end);
            }
            assert_eq!(hist.total(), rows.len());
        }
    }

    #[test]
    fn histogram_of_single_value_is_widened() {
        let rows = [record(9, 1, 3.0), record(10, 1, 3.0)];
        let refs: Vec<&Record> = rows.iter().collect();
        let hist = distance_histogram(&refs, 30);
        assert_eq!(hist.bins[0].start, 2.5);
        assert_eq!(hist.bins[29].end, 3.5);
        assert_eq!(hist.total(), 2);
    }

    #[test]
    fn period_totals_conserve_trip_count() {
        let rows: Vec<Record> = (0..24).map(|h| record(h, 1, 1.0)).collect();
        let result = AggregateResult::from_records(&rows, 30);
        let totals = period_totals(&result.hourly);
        assert_eq!(totals.values().sum::<usize>(), 24);
        assert_eq!(totals[&TimePeriod::Night], 6);
        assert_eq!(totals[&TimePeriod::Morning], 6);
    }
}
