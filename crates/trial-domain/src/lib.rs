//! # Clinical Trial Analytics - Domain Model
//!
//! Record types and aggregate result value objects for clinical trial
//! analysis. These types are shared by the analytics core, the HTTP API
//! and the synthetic data generator.
//!
//! Rates and means that can be computed over an empty set are
//! `Option<f64>`: `None` is the undefined value (serialized as `null`)
//! and is never the same thing as a valid `0.0`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// =============================================================================
// COLUMNS
// =============================================================================

/// Cell values treated as missing. Matching is exact and case-sensitive.
pub const NULL_MARKERS: [&str; 5] = ["Null", "null", "NULL", "", " "];

/// The six expected input columns, in header order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    PatientId,
    TrialSite,
    EnrollmentDate,
    Age,
    AdverseEvent,
    CompletedTrial,
}

impl Column {
    /// All expected columns in header order.
    pub const ALL: [Self; 6] = [
        Self::PatientId,
        Self::TrialSite,
        Self::EnrollmentDate,
        Self::Age,
        Self::AdverseEvent,
        Self::CompletedTrial,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PatientId => "patient_id",
            Self::TrialSite => "trial_site",
            Self::EnrollmentDate => "enrollment_date",
            Self::Age => "age",
            Self::AdverseEvent => "adverse_event",
            Self::CompletedTrial => "completed_trial",
        }
    }

    /// Look up a column by its exact header name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// AGE GROUPS
// =============================================================================

/// Fixed age buckets used for stratified analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "18-30")]
    Age18To30,
    #[serde(rename = "31-50")]
    Age31To50,
    #[serde(rename = "51-70")]
    Age51To70,
    #[serde(rename = "71-80")]
    Age71To80,
}

impl AgeGroup {
    /// All groups in bin order.
    pub const ALL: [Self; 4] = [
        Self::Age18To30,
        Self::Age31To50,
        Self::Age51To70,
        Self::Age71To80,
    ];

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Age18To30 => "18-30",
            Self::Age31To50 => "31-50",
            Self::Age51To70 => "51-70",
            Self::Age71To80 => "71-80",
        }
    }

    /// Bin an age using the half-open intervals `(0,30] (30,50] (50,70] (70,100]`.
    ///
    /// Returns `None` for ages outside `(0, 100]`, including NaN.
    pub fn from_age(age: f64) -> Option<Self> {
        if age.is_nan() || age <= 0.0 || age > 100.0 {
            return None;
        }
        Some(if age <= 30.0 {
            Self::Age18To30
        } else if age <= 50.0 {
            Self::Age31To50
        } else if age <= 70.0 {
            Self::Age51To70
        } else {
            Self::Age71To80
        })
    }
}

impl std::fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// One input row as it appears in the source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub patient_id: String,
    pub trial_site: String,
    pub enrollment_date: String,
    pub age: String,
    pub adverse_event: String,
    pub completed_trial: String,
}

/// A row that survived cleaning, with typed fields and derived columns.
///
/// `patient_id` and `trial_site` are `None` only when the whole column was
/// dropped because every value in it was missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedRecord {
    pub patient_id: Option<String>,
    pub trial_site: Option<String>,
    pub enrollment_date: NaiveDate,
    pub age: f64,
    pub adverse_event: bool,
    pub completed_trial: bool,
    pub age_group: AgeGroup,
    pub enrollment_month: u32,
}

// =============================================================================
// AGGREGATE RESULTS
// =============================================================================

/// Patient count for one trial site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteCount {
    pub trial_site: String,
    pub patient_count: usize,
}

/// Trial-wide headline metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub total_patients: usize,
    pub patients_per_site: Vec<SiteCount>,
    pub average_age: Option<f64>,
    pub completion_rate: Option<f64>,
    pub adverse_event_rate: Option<f64>,
    /// Completion rate among patients with an adverse event
    pub completion_rate_with_ae: Option<f64>,
    /// Completion rate among patients without an adverse event
    pub completion_rate_without_ae: Option<f64>,
}

/// Performance metrics for one trial site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteStats {
    pub trial_site: String,
    pub total_patients: usize,
    pub completed_count: usize,
    pub completion_rate: Option<f64>,
    pub ae_count: usize,
    pub ae_rate: Option<f64>,
    pub avg_age: Option<f64>,
}

/// Outcome metrics for one age group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeGroupStats {
    pub age_group: AgeGroup,
    pub count: usize,
    pub completion_rate: Option<f64>,
    pub ae_rate: Option<f64>,
    pub min_age: Option<f64>,
    pub max_age: Option<f64>,
    pub avg_age: Option<f64>,
}

/// Enrollment and outcome metrics for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStats {
    pub month: u32,
    pub enrollments: usize,
    pub completion_rate: Option<f64>,
    pub ae_rate: Option<f64>,
}

/// Symmetric Pearson correlation matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    /// Column labels, also the row labels
    pub columns: Vec<String>,
    /// `values[i][j]` is the correlation between `columns[i]` and `columns[j]`
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    /// Correlation between two named columns.
    ///
    /// The outer `Option` is `None` when either label is unknown.
    pub fn get(&self, row: &str, col: &str) -> Option<Option<f64>> {
        let i = self.columns.iter().position(|c| c == row)?;
        let j = self.columns.iter().position(|c| c == col)?;
        Some(self.values[i][j])
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Site named in an insight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteInsight {
    pub name: String,
    pub completion_rate: Option<f64>,
    pub ae_rate: Option<f64>,
}

/// Age group named in an insight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeGroupInsight {
    pub name: AgeGroup,
    pub completion_rate: Option<f64>,
}

/// Best/worst rankings and advisory text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyInsights {
    pub best_site: Option<SiteInsight>,
    pub worst_site: Option<SiteInsight>,
    pub best_age_group: Option<AgeGroupInsight>,
    pub worst_age_group: Option<AgeGroupInsight>,
    pub recommendations: Vec<String>,
}

/// Every analysis section for one pass over a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialAnalytics {
    pub summary_statistics: SummaryStatistics,
    pub site_performance: Vec<SiteStats>,
    pub age_group_analysis: Vec<AgeGroupStats>,
    pub temporal_analysis: Vec<MonthlyStats>,
    pub correlation_analysis: CorrelationMatrix,
    pub key_insights: KeyInsights,
}
