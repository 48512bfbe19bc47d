use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::model::{Dataset, Record, TimePeriod};
use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// FilterSpec – the complete set of predicates for one interaction
// ---------------------------------------------------------------------------

/// User-supplied predicates. A fresh value is built for every interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Inclusive lower bound on the full pickup timestamp.
    pub date_start: NaiveDateTime,
    /// Inclusive upper bound on the full pickup timestamp.
    pub date_end: NaiveDateTime,
    pub min_passengers: u32,
    /// Inclusive `(lo, hi)` bounds on trip distance.
    pub distance_range: (f64, f64),
    /// Time-of-day buckets to keep. Empty keeps nothing.
    pub time_periods: BTreeSet<TimePeriod>,
}

impl FilterSpec {
    /// The initial control state of the dashboard: the dataset's full time
    /// span, at least one passenger, 0–20 miles, every period.
    pub fn default_for(dataset: &Dataset) -> Self {
        let (date_start, date_end) = dataset
            .time_span()
            .unwrap_or((NaiveDateTime::MIN, NaiveDateTime::MAX));
        FilterSpec {
            date_start,
            date_end,
            min_passengers: 1,
            distance_range: (0.0, 20.0),
            time_periods: TimePeriod::ALL.into_iter().collect(),
        }
    }

    /// Reject inverted ranges.
    pub fn validate(&self) -> Result<()> {
        if self.date_start > self.date_end {
            return Err(PipelineError::InvalidDateRange {
                start: self.date_start,
                end: self.date_end,
            });
        }
        let (lo, hi) = self.distance_range;
        // NaN bounds compare false both ways, so test for the accepting order.
        if !(lo <= hi) {
            return Err(PipelineError::InvalidDistanceRange { lo, hi });
        }
        Ok(())
    }

    /// Whether a single record passes every predicate.
    pub fn matches(&self, record: &Record) -> bool {
        let (lo, hi) = self.distance_range;
        record.pickup_time >= self.date_start
            && record.pickup_time <= self.date_end
            && record.passenger_count >= self.min_passengers
            && record.trip_distance >= lo
            && record.trip_distance <= hi
            && self.time_periods.contains(&record.time_period())
    }
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Indices of records passing `spec`, in dataset order.
pub fn filtered_indices(dataset: &Dataset, spec: &FilterSpec) -> Result<Vec<usize>> {
    spec.validate()?;
    Ok(dataset
        .records()
        .iter()
        .enumerate()
        .filter(|(_, r)| spec.matches(r))
        .map(|(i, _)| i)
        .collect())
}

/// A borrowed, order-preserving subset of a [`Dataset`].
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    pub fn new(dataset: &'a Dataset, spec: &FilterSpec) -> Result<Self> {
        let indices = filtered_indices(dataset, spec)?;
        Ok(FilteredView { dataset, indices })
    }

    /// Positions of the visible records in the underlying dataset.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Record> + '_ {
        let records = self.dataset.records();
        self.indices.iter().map(move |&i| &records[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::DerivedTrip;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn dataset(rows: &[(u32, u32, u32, f64)]) -> Dataset {
        let trips = rows
            .iter()
            .map(|&(day, hour, passengers, distance)| DerivedTrip {
                pickup_time: at(day, hour),
                hour,
                date: at(day, hour).date(),
                passenger_count: passengers,
                trip_distance: distance,
                lat: 40.7,
                lon: -74.0,
            })
            .collect::<Vec<_>>();
        let labels = (0..trips.len() as i32).collect();
        Dataset::from_labeled(trips, labels)
    }

    fn open_spec(ds: &Dataset) -> FilterSpec {
        FilterSpec {
            min_passengers: 0,
            distance_range: (0.0, f64::MAX),
            ..FilterSpec::default_for(ds)
        }
    }

    #[test]
    fn keeps_matching_records_in_order() {
        let ds = dataset(&[(1, 7, 2, 1.0), (1, 14, 1, 5.0), (1, 20, 3, 19.5)]);
        let spec = FilterSpec {
            min_passengers: 2,
            distance_range: (0.0, 20.0),
            time_periods: [TimePeriod::Morning, TimePeriod::Evening].into_iter().collect(),
            ..FilterSpec::default_for(&ds)
        };
        assert_eq!(filtered_indices(&ds, &spec).unwrap(), vec![0, 2]);
    }

    #[test]
    fn distance_bounds_are_inclusive() {
        let ds = dataset(&[(1, 8, 1, 5.0), (1, 8, 1, 5.0 + 1e-9), (1, 8, 1, 2.0)]);
        let spec = FilterSpec {
            distance_range: (2.0, 5.0),
            ..open_spec(&ds)
        };
        assert_eq!(filtered_indices(&ds, &spec).unwrap(), vec![0, 2]);
    }

    #[test]
    fn date_bounds_compare_full_timestamps() {
        let ds = dataset(&[(1, 9, 1, 1.0), (2, 9, 1, 1.0), (2, 15, 1, 1.0), (3, 0, 1, 1.0)]);
        let spec = FilterSpec {
            date_start: at(2, 9),
            date_end: at(2, 12),
            ..open_spec(&ds)
        };
        assert_eq!(filtered_indices(&ds, &spec).unwrap(), vec![1]);
    }

    #[test]
    fn empty_period_set_keeps_nothing() {
        let ds = dataset(&[(1, 9, 1, 1.0), (1, 22, 1, 1.0)]);
        let spec = FilterSpec {
            time_periods: BTreeSet::new(),
            ..open_spec(&ds)
        };
        let view = FilteredView::new(&ds, &spec).unwrap();
        assert!(view.is_empty());
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        let ds = dataset(&[(1, 9, 1, 1.0)]);
        let spec = FilterSpec {
            date_start: at(3, 0),
            date_end: at(1, 0),
            ..open_spec(&ds)
        };
        assert!(matches!(
            filtered_indices(&ds, &spec),
            Err(PipelineError::InvalidDateRange { .. })
        ));

        let spec = FilterSpec {
            distance_range: (10.0, 1.0),
            ..open_spec(&ds)
        };
        assert!(matches!(
            filtered_indices(&ds, &spec),
            Err(PipelineError::InvalidDistanceRange { .. })
        ));
    }

    #[test]
    fn view_preserves_cluster_labels() {
        let ds = dataset(&[(1, 1, 1, 1.0), (1, 9, 1, 1.0), (1, 13, 1, 1.0)]);
        let spec = FilterSpec {
            time_periods: [TimePeriod::Morning, TimePeriod::Afternoon].into_iter().collect(),
            ..open_spec(&ds)
        };
        let view = FilteredView::new(&ds, &spec).unwrap();
        let clusters: Vec<i32> = view.iter().map(|r| r.cluster).collect();
        assert_eq!(clusters, vec![1, 2]);
        assert_eq!(view.indices(), &[1, 2]);
    }
}
