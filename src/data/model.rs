use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Cluster label of a record that no core point reaches.
pub const NOISE: i32 = -1;

// ---------------------------------------------------------------------------
// RawTrip – one row as handed over by the loader
// ---------------------------------------------------------------------------

/// The minimum set of columns the pipeline needs from a trip table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTrip {
    pub pickup_time: NaiveDateTime,
    pub passenger_count: u32,
    pub trip_distance: f64,
}

// ---------------------------------------------------------------------------
// DerivedTrip – a raw trip plus temporal and synthetic spatial features
// ---------------------------------------------------------------------------

/// A trip after feature derivation but before clustering.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedTrip {
    pub pickup_time: NaiveDateTime,
    pub hour: u32,
    pub date: NaiveDate,
    pub passenger_count: u32,
    pub trip_distance: f64,
    pub lat: f64,
    pub lon: f64,
}

// ---------------------------------------------------------------------------
// Record – one fully enriched, labeled trip
// ---------------------------------------------------------------------------

/// One trip of the labeled dataset. Only a [`Dataset`] hands these out, so a
/// `Record` always carries its final cluster label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub pickup_time: NaiveDateTime,
    /// Hour of day, 0–23.
    pub hour: u32,
    pub date: NaiveDate,
    pub passenger_count: u32,
    pub trip_distance: f64,
    pub lat: f64,
    pub lon: f64,
    /// Density cluster id, or [`NOISE`].
    pub cluster: i32,
}

impl Record {
    pub fn time_period(&self) -> TimePeriod {
        TimePeriod::from_hour(self.hour)
    }
}

// ---------------------------------------------------------------------------
// TimePeriod – time-of-day buckets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimePeriod {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimePeriod {
    pub const ALL: [TimePeriod; 4] = [
        TimePeriod::Morning,
        TimePeriod::Afternoon,
        TimePeriod::Evening,
        TimePeriod::Night,
    ];

    /// Half-open buckets: [6,12) morning, [12,18) afternoon, [18,24) evening,
    /// everything else night.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => TimePeriod::Morning,
            12..=17 => TimePeriod::Afternoon,
            18..=23 => TimePeriod::Evening,
            _ => TimePeriod::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimePeriod::Morning => "morning",
            TimePeriod::Afternoon => "afternoon",
            TimePeriod::Evening => "evening",
            TimePeriod::Night => "night",
        }
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimePeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "morning" => Ok(TimePeriod::Morning),
            "afternoon" => Ok(TimePeriod::Afternoon),
            "evening" => Ok(TimePeriod::Evening),
            "night" => Ok(TimePeriod::Night),
            other => Err(format!("unknown time period '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the labeled, read-only trip table
// ---------------------------------------------------------------------------

/// The enriched and clustered trip table. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    /// Attach cluster labels to derived trips. `labels` must be parallel to
    /// `trips`.
    pub(crate) fn from_labeled(trips: Vec<DerivedTrip>, labels: Vec<i32>) -> Self {
        debug_assert_eq!(trips.len(), labels.len());
        let records = trips
            .into_iter()
            .zip(labels)
            .map(|(t, cluster)| Record {
                pickup_time: t.pickup_time,
                hour: t.hour,
                date: t.date,
                passenger_count: t.passenger_count,
                trip_distance: t.trip_distance,
                lat: t.lat,
                lon: t.lon,
                cluster,
            })
            .collect();
        Dataset { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest pickup time, if any record exists.
    pub fn time_span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let first = self.records.first()?.pickup_time;
        Some(self.records.iter().fold((first, first), |(lo, hi), r| {
            (lo.min(r.pickup_time), hi.max(r.pickup_time))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_buckets_are_exhaustive() {
        let periods: Vec<TimePeriod> = (0..24).map(TimePeriod::from_hour).collect();
        assert_eq!(periods[0], TimePeriod::Night);
        assert_eq!(periods[5], TimePeriod::Night);
        assert_eq!(periods[6], TimePeriod::Morning);
        assert_eq!(periods[11], TimePeriod::Morning);
        assert_eq!(periods[12], TimePeriod::Afternoon);
        assert_eq!(periods[17], TimePeriod::Afternoon);
        assert_eq!(periods[18], TimePeriod::Evening);
        assert_eq!(periods[23], TimePeriod::Evening);
    }

    #[test]
    fn period_parses_case_insensitively() {
        assert_eq!("Morning".parse::<TimePeriod>(), Ok(TimePeriod::Morning));
        assert_eq!(" night ".parse::<TimePeriod>(), Ok(TimePeriod::Night));
        assert!("noon".parse::<TimePeriod>().is_err());
    }

    #[test]
    fn time_span_of_empty_dataset_is_none() {
        assert!(Dataset::default().time_span().is_none());
    }
}
