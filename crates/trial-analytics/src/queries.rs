//! Grouped aggregations over a cleaned dataset.
//!
//! Rates are `mean(flag as 0/1) * 100`. Per-group rates (site, age group,
//! month) round the fraction to three decimals before scaling, while
//! trial-wide rates round only the final percentage to one decimal. Any rate
//! or mean over an empty set is `None`.

use crate::error::Result;
use crate::loader::CleanedDataset;
use statrs::statistics::Statistics;
use std::collections::HashMap;
use std::hash::Hash;
use trial_domain::{
    AgeGroup, AgeGroupStats, CleanedRecord, Column, MonthlyStats, SiteCount, SiteStats,
    SummaryStatistics,
};

/// Group records by key, keeping groups in first-seen order.
pub fn group_by<'a, K, F>(records: &'a [CleanedRecord], key: F) -> Vec<(K, Vec<&'a CleanedRecord>)>
where
    K: Eq + Hash + Clone,
    F: Fn(&'a CleanedRecord) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<&CleanedRecord>)> = Vec::new();

    for record in records {
        let k = key(record);
        let slot = *index.entry(k.clone()).or_insert_with(|| {
            groups.push((k, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(record);
    }

    groups
}

/// Round to `places` decimals, ties to even.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round_ties_even() / factor
}

/// Arithmetic mean, `None` for an empty input.
fn mean<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let values: Vec<f64> = values.into_iter().collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().mean())
}

/// Fraction of `true` flags, `None` for an empty input.
fn fraction<I: IntoIterator<Item = bool>>(flags: I) -> Option<f64> {
    mean(flags.into_iter().map(|f| if f { 1.0 } else { 0.0 }))
}

/// Trial-wide percentage: scale, then round to one decimal.
fn overall_pct(fraction: Option<f64>) -> Option<f64> {
    fraction.map(|f| round_to(f * 100.0, 1))
}

/// Per-group percentage: round the fraction to three decimals, then scale.
fn group_pct(fraction: Option<f64>) -> Option<f64> {
    fraction.map(|f| round_to(f, 3) * 100.0)
}

fn site_of(record: &CleanedRecord) -> &str {
    record.trial_site.as_deref().unwrap_or_default()
}

/// Trial-wide headline metrics.
pub fn summary_statistics(ds: &CleanedDataset) -> Result<SummaryStatistics> {
    ds.require(Column::TrialSite)?;
    let records = &ds.records;

    let mut patients_per_site: Vec<SiteCount> = group_by(records, site_of)
        .into_iter()
        .map(|(site, members)| SiteCount {
            trial_site: site.to_owned(),
            patient_count: members.len(),
        })
        .collect();
    patients_per_site.sort_by(|a, b| a.trial_site.cmp(&b.trial_site));

    let completion_among = |with_ae: bool| {
        overall_pct(fraction(
            records
                .iter()
                .filter(|r| r.adverse_event == with_ae)
                .map(|r| r.completed_trial),
        ))
    };

    Ok(SummaryStatistics {
        total_patients: records.len(),
        patients_per_site,
        average_age: mean(records.iter().map(|r| r.age)).map(|a| round_to(a, 1)),
        completion_rate: overall_pct(fraction(records.iter().map(|r| r.completed_trial))),
        adverse_event_rate: overall_pct(fraction(records.iter().map(|r| r.adverse_event))),
        completion_rate_with_ae: completion_among(true),
        completion_rate_without_ae: completion_among(false),
    })
}

/// Per-site metrics ordered by completion rate, best first.
///
/// Equal rates keep first-seen site order; undefined rates sort last.
pub fn site_performance(ds: &CleanedDataset) -> Result<Vec<SiteStats>> {
    ds.require(Column::TrialSite)?;

    let mut sites: Vec<SiteStats> = group_by(&ds.records, site_of)
        .into_iter()
        .map(|(site, members)| {
            let completed_count = members.iter().filter(|r| r.completed_trial).count();
            let ae_count = members.iter().filter(|r| r.adverse_event).count();
            SiteStats {
                trial_site: site.to_owned(),
                total_patients: members.len(),
                completed_count,
                completion_rate: group_pct(fraction(members.iter().map(|r| r.completed_trial))),
                ae_count,
                ae_rate: group_pct(fraction(members.iter().map(|r| r.adverse_event))),
                avg_age: mean(members.iter().map(|r| r.age)).map(|a| round_to(a, 3)),
            }
        })
        .collect();

    sites.sort_by(|a, b| match (a.completion_rate, b.completion_rate) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    Ok(sites)
}

/// Metrics for every age group, in bin order.
///
/// Groups with no members are reported with a zero count and `None` metrics.
pub fn age_group_analysis(ds: &CleanedDataset) -> Vec<AgeGroupStats> {
    let mut groups: HashMap<AgeGroup, Vec<&CleanedRecord>> =
        group_by(&ds.records, |r| r.age_group).into_iter().collect();

    AgeGroup::ALL
        .into_iter()
        .map(|age_group| {
            let members = groups.remove(&age_group).unwrap_or_default();
            let ages = || members.iter().map(|r| r.age);

            AgeGroupStats {
                age_group,
                count: members.len(),
                completion_rate: group_pct(fraction(members.iter().map(|r| r.completed_trial))),
                ae_rate: group_pct(fraction(members.iter().map(|r| r.adverse_event))),
                min_age: ages().reduce(f64::min).map(|a| round_to(a, 3)),
                max_age: ages().reduce(f64::max).map(|a| round_to(a, 3)),
                avg_age: mean(ages()).map(|a| round_to(a, 3)),
            }
        })
        .collect()
}

/// Monthly enrollment and outcome metrics, months ascending.
///
/// Only months present in the data appear.
pub fn temporal_analysis(ds: &CleanedDataset) -> Vec<MonthlyStats> {
    let mut months: Vec<MonthlyStats> = group_by(&ds.records, |r| r.enrollment_month)
        .into_iter()
        .map(|(month, members)| MonthlyStats {
            month,
            enrollments: members.len(),
            completion_rate: group_pct(fraction(members.iter().map(|r| r.completed_trial))),
            ae_rate: group_pct(fraction(members.iter().map(|r| r.adverse_event))),
        })
        .collect();
    months.sort_by_key(|m| m.month);
    months
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::loader::load_reader;

    pub(crate) const FIXTURE: &str = "\
patient_id,trial_site,enrollment_date,age,adverse_event,completed_trial
P001,Boston,2024-01-15,25,false,true
P002,Boston,2024-02-03,65,true,false
P003,Chicago,2024-01-20,40,false,true
";

    pub(crate) fn fixture() -> CleanedDataset {
        load_reader(FIXTURE.as_bytes()).unwrap()
    }

    fn dataset(rows: &str) -> CleanedDataset {
        let body = format!(
            "patient_id,trial_site,enrollment_date,age,adverse_event,completed_trial\n{rows}"
        );
        load_reader(body.as_bytes()).unwrap()
    }

    #[test]
    fn test_group_by_first_seen_order() {
        let ds = dataset(
            "P1,Dallas,2024-01-01,20,false,true\n\
             P2,Boston,2024-01-01,20,false,true\n\
             P3,Dallas,2024-01-01,20,false,true\n",
        );
        let groups = group_by(&ds.records, site_of);
        let keys: Vec<&str> = groups.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["Dallas", "Boston"]);
        assert_eq!(groups[0].1.len(), 2);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(66.666, 1), 66.7);
        assert_eq!(round_to(0.6666, 3), 0.667);
        assert_eq!(round_to(33.35, 0), 33.0);
        assert_eq!(round_to(6.25, 1), 6.2);
        assert_eq!(round_to(43.75, 1), 43.8);
        assert_eq!(round_to(0.0625, 3), 0.062);
        assert_eq!(round_to(-2.5, 0), -2.0);
    }

    #[test]
    fn test_exact_ties_round_to_even() {
        // Fifteen non-completers aged 43, then one completer aged 47:
        // completion is exactly 1/16 and the mean age exactly 43.25.
        let mut rows = "P00,Boston,2024-01-01,43,false,false\n".repeat(15);
        rows.push_str("P16,Boston,2024-01-01,47,false,true\n");
        let ds = dataset(&rows);

        let summary = summary_statistics(&ds).unwrap();
        assert_eq!(summary.completion_rate, Some(6.2));
        assert_eq!(summary.average_age, Some(43.2));

        let site = &site_performance(&ds).unwrap()[0];
        assert!((site.completion_rate.unwrap() - 6.2).abs() < 1e-9);
    }

    #[test]
    fn test_summary_statistics_fixture() {
        let summary = summary_statistics(&fixture()).unwrap();

        assert_eq!(summary.total_patients, 3);
        assert_eq!(summary.average_age, Some(43.3));
        assert_eq!(summary.completion_rate, Some(66.7));
        assert_eq!(summary.adverse_event_rate, Some(33.3));
        assert_eq!(summary.completion_rate_with_ae, Some(0.0));
        assert_eq!(summary.completion_rate_without_ae, Some(100.0));
        assert_eq!(
            summary.patients_per_site,
            vec![
                SiteCount { trial_site: "Boston".into(), patient_count: 2 },
                SiteCount { trial_site: "Chicago".into(), patient_count: 1 },
            ]
        );
    }

    #[test]
    fn test_summary_empty_stratum_is_undefined() {
        let ds = dataset(
            "P1,Boston,2024-01-01,20,false,true\n\
             P2,Boston,2024-01-01,30,false,false\n",
        );
        let summary = summary_statistics(&ds).unwrap();
        assert_eq!(summary.completion_rate_with_ae, None);
        assert_eq!(summary.completion_rate_without_ae, Some(50.0));
    }

    #[test]
    fn test_summary_over_empty_dataset() {
        let summary = summary_statistics(&dataset("")).unwrap();
        assert_eq!(summary.total_patients, 0);
        assert!(summary.patients_per_site.is_empty());
        assert_eq!(summary.average_age, None);
        assert_eq!(summary.completion_rate, None);
        assert_eq!(summary.completion_rate_with_ae, None);
    }

    #[test]
    fn test_site_performance_ordering() {
        let sites = site_performance(&fixture()).unwrap();

        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].trial_site, "Chicago");
        assert_eq!(sites[0].completion_rate, Some(100.0));
        assert_eq!(sites[1].trial_site, "Boston");
        assert_eq!(sites[1].total_patients, 2);
        assert_eq!(sites[1].completed_count, 1);
        assert_eq!(sites[1].ae_count, 1);
        assert_eq!(sites[1].completion_rate, Some(50.0));
        assert_eq!(sites[1].ae_rate, Some(50.0));
        assert_eq!(sites[1].avg_age, Some(45.0));
    }

    #[test]
    fn test_site_performance_ties_keep_first_seen_order() {
        let ds = dataset(
            "P1,Dallas,2024-01-01,20,false,true\n\
             P2,Boston,2024-01-01,20,false,true\n\
             P3,Austin,2024-01-01,20,false,false\n",
        );
        let names: Vec<String> = site_performance(&ds)
            .unwrap()
            .into_iter()
            .map(|s| s.trial_site)
            .collect();
        assert_eq!(names, vec!["Dallas", "Boston", "Austin"]);
    }

    #[test]
    fn test_group_rate_rounds_fraction_first() {
        let ds = dataset(
            "P1,Boston,2024-01-01,20,false,true\n\
             P2,Boston,2024-01-01,20,false,true\n\
             P3,Boston,2024-01-01,20,false,false\n",
        );
        let sites = site_performance(&ds).unwrap();
        let rate = sites[0].completion_rate.unwrap();
        assert!((rate - 66.7).abs() < 1e-9);
    }

    #[test]
    fn test_site_aggregations_require_site_column() {
        let ds = dataset(
            "P1,Null,2024-01-01,20,false,true\n\
             P2,,2024-01-01,20,false,true\n",
        );
        assert!(matches!(
            site_performance(&ds),
            Err(crate::AnalyticsError::SchemaInvalid { column: Column::TrialSite })
        ));
        assert!(summary_statistics(&ds).is_err());
    }

    #[test]
    fn test_age_group_analysis_reports_all_groups() {
        let groups = age_group_analysis(&fixture());

        assert_eq!(groups.len(), 4);
        assert_eq!(groups[0].age_group, AgeGroup::Age18To30);
        assert_eq!(groups[0].count, 1);
        assert_eq!(groups[0].completion_rate, Some(100.0));
        assert_eq!(groups[2].age_group, AgeGroup::Age51To70);
        assert_eq!(groups[2].ae_rate, Some(100.0));
        assert_eq!(groups[2].min_age, Some(65.0));
        assert_eq!(groups[2].max_age, Some(65.0));

        let empty = &groups[3];
        assert_eq!(empty.age_group, AgeGroup::Age71To80);
        assert_eq!(empty.count, 0);
        assert_eq!(empty.completion_rate, None);
        assert_eq!(empty.min_age, None);
        assert_eq!(empty.avg_age, None);
    }

    #[test]
    fn test_temporal_analysis_months_ascending() {
        let months = temporal_analysis(&fixture());

        assert_eq!(months.len(), 2);
        assert_eq!(months[0].month, 1);
        assert_eq!(months[0].enrollments, 2);
        assert_eq!(months[0].completion_rate, Some(100.0));
        assert_eq!(months[0].ae_rate, Some(0.0));
        assert_eq!(months[1].month, 2);
        assert_eq!(months[1].completion_rate, Some(0.0));
    }

    #[test]
    fn test_group_counts_sum_to_total() {
        let ds = dataset(
            "P1,Boston,2024-01-01,20,false,true\n\
             P2,Chicago,2024-02-01,45,true,true\n\
             P3,Dallas,2024-02-11,55,false,false\n\
             P4,Boston,2024-05-01,75,true,false\n\
             P5,Dallas,2024-06-01,33,false,true\n",
        );
        let total = ds.len();
        let by_site: usize = site_performance(&ds).unwrap().iter().map(|s| s.total_patients).sum();
        let by_age: usize = age_group_analysis(&ds).iter().map(|g| g.count).sum();
        let by_month: usize = temporal_analysis(&ds).iter().map(|m| m.enrollments).sum();
        assert_eq!(by_site, total);
        assert_eq!(by_age, total);
        assert_eq!(by_month, total);
    }

    #[test]
    fn test_rates_within_bounds() {
        let ds = fixture();
        let in_range = |r: Option<f64>| r.is_none_or(|v| (0.0..=100.0).contains(&v));

        let summary = summary_statistics(&ds).unwrap();
        assert!(in_range(summary.completion_rate));
        assert!(in_range(summary.adverse_event_rate));
        for site in site_performance(&ds).unwrap() {
            assert!(in_range(site.completion_rate) && in_range(site.ae_rate));
        }
        for group in age_group_analysis(&ds) {
            assert!(in_range(group.completion_rate) && in_range(group.ae_rate));
        }
        for month in temporal_analysis(&ds) {
            assert!(in_range(month.completion_rate) && in_range(month.ae_rate));
        }
    }
}
