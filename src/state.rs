use log::{debug, info};

use crate::color::ColorMap;
use crate::config::PipelineConfig;
use crate::data::aggregate::AggregateResult;
use crate::data::cluster::{cluster_coordinates, ClusterSummary};
use crate::data::features::derive_features;
use crate::data::filter::{FilterSpec, FilteredView};
use crate::data::model::{Dataset, RawTrip};
use crate::error::Result;
use crate::figure::{self, Figures};

// ---------------------------------------------------------------------------
// Dashboard – the process-wide, read-only context
// ---------------------------------------------------------------------------

/// The labeled dataset plus everything fixed at startup.
///
/// Built once; afterwards only `&self` methods exist, so any number of
/// interactions may run against it without synchronization.
#[derive(Debug, Clone)]
pub struct Dashboard {
    dataset: Dataset,
    config: PipelineConfig,
    clusters: ClusterSummary,
    color_map: ColorMap,
}

/// Everything one interaction produces.
#[derive(Debug, Clone)]
pub struct DashboardView<'a> {
    pub filter: FilterSpec,
    pub visible: FilteredView<'a>,
    pub aggregates: AggregateResult,
}

impl Dashboard {
    /// Derive features and cluster the (already sampled) trips.
    pub fn build(trips: Vec<RawTrip>, config: PipelineConfig) -> Result<Self> {
        config.validate()?;

        let derived = derive_features(trips, config.seed, config.lat_range, config.lon_range);
        let coords: Vec<[f64; 2]> = derived.iter().map(|t| [t.lat, t.lon]).collect();
        let labels = cluster_coordinates(&coords, config.eps, config.min_samples);
        let clusters = ClusterSummary::from_labels(&labels);
        info!(
            "clustered {} trips: {} clusters, {} noise (eps={}, min_samples={})",
            labels.len(),
            clusters.clusters,
            clusters.noise,
            config.eps,
            config.min_samples
        );

        Ok(Dashboard {
            dataset: Dataset::from_labeled(derived, labels),
            color_map: ColorMap::for_clusters(clusters.clusters),
            config,
            clusters,
        })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn clusters(&self) -> ClusterSummary {
        self.clusters
    }

    pub fn color_map(&self) -> &ColorMap {
        &self.color_map
    }

    /// The filter the dashboard opens with.
    pub fn default_filter(&self) -> FilterSpec {
        FilterSpec::default_for(&self.dataset)
    }

    /// Run one filter → aggregate pass.
    pub fn update(&self, filter: FilterSpec) -> Result<DashboardView<'_>> {
        let visible = FilteredView::new(&self.dataset, &filter)?;
        debug!("filter kept {} of {} trips", visible.len(), self.dataset.len());
        let aggregates = AggregateResult::from_records(visible.iter(), self.config.distance_bins);
        Ok(DashboardView {
            filter,
            visible,
            aggregates,
        })
    }

    /// Figure descriptions for a view produced by [`Dashboard::update`].
    pub fn render(&self, view: &DashboardView<'_>) -> Figures {
        figure::render(&view.aggregates, &self.color_map)
    }
}
