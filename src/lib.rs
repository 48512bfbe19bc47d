//! Filter-and-aggregate engine behind an NYC yellow taxi trip dashboard.
//!
//! A [`Dashboard`] is built once from loaded trips: features are derived and
//! every trip receives a density-cluster label. Each filter change then runs
//! one synchronous [`Dashboard::update`] producing four projections.

pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod figure;
pub mod state;

pub use config::PipelineConfig;
pub use data::aggregate::AggregateResult;
pub use data::filter::{FilterSpec, FilteredView};
pub use data::model::{Dataset, RawTrip, Record, TimePeriod, NOISE};
pub use error::PipelineError;
pub use state::{Dashboard, DashboardView};
