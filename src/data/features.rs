use chrono::Timelike;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::model::{DerivedTrip, RawTrip};

// ---------------------------------------------------------------------------
// Feature derivation
// ---------------------------------------------------------------------------

/// Add hour-of-day, calendar date and synthetic coordinates to every trip.
///
/// Coordinates are uniform over `lat_range × lon_range` and carry no
/// geographic meaning. One generator seeded with `seed` draws every latitude
/// first, then every longitude, so identical inputs give identical output.
pub fn derive_features(
    trips: Vec<RawTrip>,
    seed: u64,
    lat_range: (f64, f64),
    lon_range: (f64, f64),
) -> Vec<DerivedTrip> {
    let mut rng = StdRng::seed_from_u64(seed);
    let lats = uniform_column(&mut rng, trips.len(), lat_range);
    let lons = uniform_column(&mut rng, trips.len(), lon_range);

    trips
        .into_iter()
        .zip(lats.into_iter().zip(lons))
        .map(|(t, (lat, lon))| DerivedTrip {
            hour: t.pickup_time.hour(),
            date: t.pickup_time.date(),
            pickup_time: t.pickup_time,
            passenger_count: t.passenger_count,
            trip_distance: t.trip_distance,
            lat,
            lon,
        })
        .collect()
}

fn uniform_column(rng: &mut StdRng, n: usize, (lo, hi): (f64, f64)) -> Vec<f64> {
    let width = hi - lo;
    (0..n).map(|_| lo + rng.gen::<f64>() * width).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn trip(h: u32, m: u32) -> RawTrip {
        RawTrip {
            pickup_time: NaiveDate::from_ymd_opt(2025, 1, 15)
                .unwrap()
                .and_hms_opt(h, m, 0)
                .unwrap(),
            passenger_count: 1,
            trip_distance: 2.5,
        }
    }

    #[test]
    fn derives_hour_and_date() {
        let out = derive_features(vec![trip(0, 5), trip(23, 59)], 42, (40.55, 40.90), (-74.15, -73.80));
        assert_eq!(out[0].hour, 0);
        assert_eq!(out[1].hour, 23);
        assert_eq!(out[1].date, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
        assert_eq!(out[1].trip_distance, 2.5);
    }

    #[test]
    fn coordinates_stay_in_range_and_are_reproducible() {
        let trips: Vec<RawTrip> = (0..500).map(|i| trip(i % 24, 0)).collect();
        let a = derive_features(trips.clone(), 7, (40.55, 40.90), (-74.15, -73.80));
        let b = derive_features(trips, 7, (40.55, 40.90), (-74.15, -73.80));
        assert_eq!(a, b);
        for t in &a {
            assert!((40.55..40.90).contains(&t.lat));
            assert!((-74.15..-73.80).contains(&t.lon));
        }
    }

    #[test]
    fn different_seed_moves_points() {
        let trips: Vec<RawTrip> = (0..10).map(|_| trip(8, 0)).collect();
        let a = derive_features(trips.clone(), 1, (0.0, 1.0), (0.0, 1.0));
        let b = derive_features(trips, 2, (0.0, 1.0), (0.0, 1.0));
        assert_ne!(a, b);
    }
}
