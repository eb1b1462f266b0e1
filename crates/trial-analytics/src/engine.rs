//! Orchestration of the load, aggregate and insight passes.

use crate::correlation::correlation_analysis;
use crate::error::Result;
use crate::insights::derive_insights;
use crate::loader::{self, CleanedDataset};
use crate::queries::{age_group_analysis, site_performance, summary_statistics, temporal_analysis};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use trial_domain::{SummaryStatistics, TrialAnalytics};

/// Run every aggregator over one cleaned dataset.
///
/// Only the insight pass sees other aggregators' output. Any failure aborts
/// the whole run.
pub fn analyze(ds: &CleanedDataset) -> Result<TrialAnalytics> {
    let summary_statistics = summary_statistics(ds)?;
    let site_performance = site_performance(ds)?;
    let age_group_analysis = age_group_analysis(ds);
    let temporal_analysis = temporal_analysis(ds);
    let correlation_analysis = correlation_analysis(ds)?;
    let key_insights = derive_insights(&site_performance, &age_group_analysis);

    debug!(
        records = ds.len(),
        sites = site_performance.len(),
        months = temporal_analysis.len(),
        "Analytics computed"
    );

    Ok(TrialAnalytics {
        summary_statistics,
        site_performance,
        age_group_analysis,
        temporal_analysis,
        correlation_analysis,
        key_insights,
    })
}

/// Load and analyze CSV text from a reader.
pub fn analyze_reader<R: Read>(reader: R) -> Result<TrialAnalytics> {
    analyze(&loader::load_reader(reader)?)
}

/// Analytics over a CSV file on disk.
///
/// Nothing is cached: every call re-reads and re-cleans the source.
#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    source: PathBuf,
}

impl AnalyticsEngine {
    /// Create an engine reading from `source`.
    pub fn new<P: AsRef<Path>>(source: P) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Load and clean the source.
    pub fn load(&self) -> Result<CleanedDataset> {
        debug!(source = %self.source.display(), "Loading trial data");
        loader::load_path(&self.source)
    }

    /// Summary statistics only.
    pub fn summary(&self) -> Result<SummaryStatistics> {
        summary_statistics(&self.load()?)
    }

    /// Every analysis section.
    pub fn all_analytics(&self) -> Result<TrialAnalytics> {
        analyze(&self.load()?)
    }
}
