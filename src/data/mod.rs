/// Data layer: core types, loading, enrichment, clustering, filtering and
/// aggregation.
///
/// Architecture:
/// ```text
///  .parquet / .csv / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file, cap sample size → Vec<RawTrip>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ features  │  hour, date, synthetic lat/lon → Vec<DerivedTrip>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ cluster   │  standardize + DBSCAN → Dataset (labeled, read-only)
///   └──────────┘
///        │            (once at startup; below runs per interaction)
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterSpec predicates → FilteredView
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ aggregate │  map points, hourly, distance histogram, passengers
///   └──────────┘
/// ```

pub mod aggregate;
pub mod cluster;
pub mod features;
pub mod filter;
pub mod loader;
pub mod model;
