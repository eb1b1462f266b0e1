//! Best/worst rankings derived from site and age-group results.

use crate::queries::round_to;
use trial_domain::{AgeGroupInsight, AgeGroupStats, KeyInsights, SiteInsight, SiteStats};

/// Advisory text attached to every insight set.
pub const RECOMMENDATIONS: [&str; 4] = [
    "Investigate why certain sites have lower completion rates",
    "Focus support on underperforming age groups",
    "Monitor temporal trends for seasonal patterns",
    "Analyze correlations to identify key success factors",
];

/// Derive insights from the outputs of site performance and age-group analysis.
///
/// `sites` must already be ordered best first: the best site is the first
/// entry and the worst the last. Age groups are ranked by completion rate,
/// skipping undefined rates; on ties the earliest group wins.
pub fn derive_insights(sites: &[SiteStats], age_groups: &[AgeGroupStats]) -> KeyInsights {
    let site_insight = |s: &SiteStats| SiteInsight {
        name: s.trial_site.clone(),
        completion_rate: s.completion_rate.map(|r| round_to(r, 1)),
        ae_rate: s.ae_rate.map(|r| round_to(r, 1)),
    };

    let rated: Vec<(&AgeGroupStats, f64)> = age_groups
        .iter()
        .filter_map(|g| g.completion_rate.map(|r| (g, r)))
        .collect();

    let mut best: Option<(&AgeGroupStats, f64)> = None;
    let mut worst: Option<(&AgeGroupStats, f64)> = None;
    for &(group, rate) in &rated {
        if best.is_none_or(|(_, b)| rate > b) {
            best = Some((group, rate));
        }
        if worst.is_none_or(|(_, w)| rate < w) {
            worst = Some((group, rate));
        }
    }

    let age_insight = |(g, rate): (&AgeGroupStats, f64)| AgeGroupInsight {
        name: g.age_group,
        completion_rate: Some(round_to(rate, 1)),
    };

    KeyInsights {
        best_site: sites.first().map(site_insight),
        worst_site: sites.last().map(site_insight),
        best_age_group: best.map(age_insight),
        worst_age_group: worst.map(age_insight),
        recommendations: RECOMMENDATIONS.iter().map(|s| (*s).to_owned()).collect(),
    }
}
