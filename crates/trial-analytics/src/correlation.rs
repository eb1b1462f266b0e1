//! Pearson correlation across numeric and one-hot encoded columns.

use crate::error::Result;
use crate::loader::CleanedDataset;
use crate::queries::group_by;
use statrs::statistics::Statistics;
use trial_domain::{Column, CorrelationMatrix};

/// Prefix for one-hot trial site indicator columns.
pub const SITE_PREFIX: &str = "site_";

fn indicator(flag: bool) -> f64 {
    if flag { 1.0 } else { 0.0 }
}

/// Build the correlation matrix over `age`, `completed_trial`,
/// `adverse_event`, `enrollment_month` and one `site_<name>` indicator per
/// distinct site in first-seen order.
///
/// Entries involving a zero-variance column, or any entry when there are
/// fewer than two records, are `None`. Every other diagonal entry is `1.0`.
pub fn correlation_analysis(ds: &CleanedDataset) -> Result<CorrelationMatrix> {
    ds.require(Column::TrialSite)?;
    let records = &ds.records;

    let mut columns: Vec<(String, Vec<f64>)> = vec![
        ("age".to_owned(), records.iter().map(|r| r.age).collect()),
        (
            "completed_trial".to_owned(),
            records.iter().map(|r| indicator(r.completed_trial)).collect(),
        ),
        (
            "adverse_event".to_owned(),
            records.iter().map(|r| indicator(r.adverse_event)).collect(),
        ),
        (
            "enrollment_month".to_owned(),
            records.iter().map(|r| f64::from(r.enrollment_month)).collect(),
        ),
    ];

    let sites = group_by(records, |r| r.trial_site.as_deref().unwrap_or_default());
    for (site, _) in sites {
        let values = records
            .iter()
            .map(|r| indicator(r.trial_site.as_deref() == Some(site)))
            .collect();
        columns.push((format!("{SITE_PREFIX}{site}"), values));
    }

    let varies: Vec<bool> = columns.iter().map(|(_, v)| has_variance(v)).collect();
    let n = columns.len();
    let mut values = vec![vec![None; n]; n];

    for i in 0..n {
        if !varies[i] {
            continue;
        }
        values[i][i] = Some(1.0);
        for j in (i + 1)..n {
            if !varies[j] {
                continue;
            }
            let r = pearson(&columns[i].1, &columns[j].1);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix {
        columns: columns.into_iter().map(|(name, _)| name).collect(),
        values,
    })
}

/// At least two observations and at least two distinct values.
fn has_variance(values: &[f64]) -> bool {
    values.len() >= 2 && values.windows(2).any(|w| w[0] != w[1])
}

/// Sample Pearson coefficient, clamped to `[-1, 1]`.
fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let cov = x.iter().covariance(y.iter());
    let denom = x.iter().std_dev() * y.iter().std_dev();
    let r = cov / denom;
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}
