//! Report generation for trial analytics.

use crate::engine::AnalyticsEngine;
use crate::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};
use trial_domain::TrialAnalytics;

/// Analytics for one source, stamped with generation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub generated_at: String,
    pub source: String,
    pub analytics: TrialAnalytics,
}

impl AnalyticsReport {
    pub fn new(source: impl Into<String>, analytics: TrialAnalytics) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            source: source.into(),
            analytics,
        }
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| AnalyticsError::Conversion(e.to_string()))
    }

    /// Render as a Markdown document with one table per section.
    pub fn to_markdown(&self) -> String {
        let a = &self.analytics;
        let s = &a.summary_statistics;
        let mut md = String::new();

        md.push_str("# Clinical Trial Analytics Report\n\n");
        md.push_str(&format!("**Generated:** {}  \n", self.generated_at));
        md.push_str(&format!("**Source:** {}\n\n", self.source));

        md.push_str("## Summary Statistics\n\n");
        md.push_str("| Metric | Value |\n");
        md.push_str("|--------|-------|\n");
        md.push_str(&format!("| Total Patients | {} |\n", s.total_patients));
        md.push_str(&format!("| Average Age | {} |\n", fmt_num(s.average_age)));
        md.push_str(&format!("| Completion Rate | {} |\n", fmt_pct(s.completion_rate)));
        md.push_str(&format!("| Adverse Event Rate | {} |\n", fmt_pct(s.adverse_event_rate)));
        md.push_str(&format!(
            "| Completion With AE | {} |\n",
            fmt_pct(s.completion_rate_with_ae)
        ));
        md.push_str(&format!(
            "| Completion Without AE | {} |\n",
            fmt_pct(s.completion_rate_without_ae)
        ));
        md.push('\n');

        if !a.site_performance.is_empty() {
            md.push_str("## Site Performance\n\n");
            md.push_str("| Rank | Site | Patients | Completed | Completion | AE Count | AE Rate | Avg Age |\n");
            md.push_str("|------|------|----------|-----------|------------|----------|---------|---------|\n");
            for (i, site) in a.site_performance.iter().enumerate() {
                md.push_str(&format!(
                    "| {} | {} | {} | {} | {} | {} | {} | {} |\n",
                    i + 1,
                    site.trial_site,
                    site.total_patients,
                    site.completed_count,
                    fmt_pct(site.completion_rate),
                    site.ae_count,
                    fmt_pct(site.ae_rate),
                    fmt_num(site.avg_age)
                ));
            }
            md.push('\n');
        }

        md.push_str("## Age Groups\n\n");
        md.push_str("| Group | Patients | Completion | AE Rate | Min Age | Max Age | Avg Age |\n");
        md.push_str("|-------|----------|------------|---------|---------|---------|---------|\n");
        for group in &a.age_group_analysis {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} |\n",
                group.age_group,
                group.count,
                fmt_pct(group.completion_rate),
                fmt_pct(group.ae_rate),
                fmt_num(group.min_age),
                fmt_num(group.max_age),
                fmt_num(group.avg_age)
            ));
        }
        md.push('\n');

        if !a.temporal_analysis.is_empty() {
            md.push_str("## Monthly Trends\n\n");
            md.push_str("| Month | Enrollments | Completion | AE Rate |\n");
            md.push_str("|-------|-------------|------------|---------|\n");
            for month in &a.temporal_analysis {
                md.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    month.month,
                    month.enrollments,
                    fmt_pct(month.completion_rate),
                    fmt_pct(month.ae_rate)
                ));
            }
            md.push('\n');
        }

        let corr = &a.correlation_analysis;
        if !corr.is_empty() {
            md.push_str("## Correlations\n\n");
            md.push_str(&format!("| | {} |\n", corr.columns.join(" | ")));
            md.push_str(&format!("|---|{}\n", "---|".repeat(corr.len())));
            for (name, row) in corr.columns.iter().zip(&corr.values) {
                let cells: Vec<String> = row
                    .iter()
                    .map(|v| v.map_or_else(|| "n/a".to_owned(), |r| format!("{r:.2}")))
                    .collect();
                md.push_str(&format!("| {} | {} |\n", name, cells.join(" | ")));
            }
            md.push('\n');
        }

        let k = &a.key_insights;
        md.push_str("## Key Insights\n\n");
        if let (Some(best), Some(worst)) = (&k.best_site, &k.worst_site) {
            md.push_str(&format!(
                "- Best site: **{}** ({} completion, {} AE)\n",
                best.name,
                fmt_pct(best.completion_rate),
                fmt_pct(best.ae_rate)
            ));
            md.push_str(&format!(
                "- Worst site: **{}** ({} completion, {} AE)\n",
                worst.name,
                fmt_pct(worst.completion_rate),
                fmt_pct(worst.ae_rate)
            ));
        }
        if let (Some(best), Some(worst)) = (&k.best_age_group, &k.worst_age_group) {
            md.push_str(&format!(
                "- Best age group: **{}** ({} completion)\n",
                best.name,
                fmt_pct(best.completion_rate)
            ));
            md.push_str(&format!(
                "- Worst age group: **{}** ({} completion)\n",
                worst.name,
                fmt_pct(worst.completion_rate)
            ));
        }
        md.push_str("\n### Recommendations\n\n");
        for rec in &k.recommendations {
            md.push_str(&format!("- {rec}\n"));
        }

        md
    }
}

fn fmt_pct(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_owned(), |v| format!("{v:.1}%"))
}

fn fmt_num(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_owned(), |v| format!("{v:.1}"))
}

impl AnalyticsEngine {
    /// Generate a report over the engine's source.
    pub fn generate_report(&self) -> Result<AnalyticsReport> {
        let analytics = self.all_analytics()?;
        Ok(AnalyticsReport::new(
            self.source().display().to_string(),
            analytics,
        ))
    }

    /// Generate report as JSON string.
    pub fn generate_report_json(&self) -> Result<String> {
        self.generate_report()?.to_json()
    }

    /// Generate Markdown report.
    pub fn generate_report_markdown(&self) -> Result<String> {
        Ok(self.generate_report()?.to_markdown())
    }
}
