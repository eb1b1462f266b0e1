//! Loading and cleaning of raw trial CSV sources.
//!
//! Cleaning runs in a fixed order: null markers are normalized, columns with
//! no values at all are dropped, rows with any missing value are dropped, and
//! the surviving rows are type-converted. A row that fails any conversion is
//! dropped whole.

use crate::error::{AnalyticsError, Result};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};
use trial_domain::{AgeGroup, CleanedRecord, Column};

pub use trial_domain::NULL_MARKERS;

/// Normalized boolean spellings that mean `true`. Anything else is `false`.
const TRUE_VALUES: [&str; 3] = ["true", "1", "yes"];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Columns that must survive cleaning for type conversion to run.
const CONVERTED_COLUMNS: [Column; 4] = [
    Column::EnrollmentDate,
    Column::Age,
    Column::AdverseEvent,
    Column::CompletedTrial,
];

/// The cleaned record set for a single pass over a source.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedDataset {
    /// Header names that survived the all-missing column drop, in file order
    pub columns: Vec<String>,
    pub records: Vec<CleanedRecord>,
}

impl CleanedDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.iter().any(|c| c == column.as_str())
    }

    /// Fail with [`AnalyticsError::SchemaInvalid`] unless `column` survived cleaning.
    pub fn require(&self, column: Column) -> Result<()> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(AnalyticsError::SchemaInvalid { column })
        }
    }
}

/// Load and clean a CSV file.
pub fn load_path<P: AsRef<Path>>(path: P) -> Result<CleanedDataset> {
    let file = File::open(path.as_ref())?;
    load_reader(file)
}

/// Load and clean CSV text from any reader.
pub fn load_reader<R: Read>(reader: R) -> Result<CleanedDataset> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_owned).collect();
    if headers.is_empty() {
        return Err(AnalyticsError::EmptySource);
    }

    let rows = csv_reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()?;

    // With no data rows there is nothing to judge a column by, so keep them all.
    let kept: Vec<usize> = if rows.is_empty() {
        (0..headers.len()).collect()
    } else {
        (0..headers.len())
            .filter(|&i| rows.iter().any(|row| !is_missing(cell(row, i))))
            .collect()
    };

    let index_of = |column: Column| kept.iter().copied().find(|&i| headers[i] == column.as_str());

    let mut converted = [0usize; 4];
    for (slot, column) in converted.iter_mut().zip(CONVERTED_COLUMNS) {
        *slot = index_of(column).ok_or(AnalyticsError::SchemaInvalid { column })?;
    }
    let [date_idx, age_idx, ae_idx, completed_idx] = converted;
    let patient_idx = index_of(Column::PatientId);
    let site_idx = index_of(Column::TrialSite);

    let mut incomplete_rows = 0usize;
    let mut invalid_dates = 0usize;
    let mut invalid_ages = 0usize;
    let mut unbinned_ages = 0usize;
    let mut records = Vec::with_capacity(rows.len());

    for row in &rows {
        if kept.iter().any(|&i| is_missing(cell(row, i))) {
            incomplete_rows += 1;
            continue;
        }

        let date = parse_date(cell(row, date_idx));
        let age = parse_age(cell(row, age_idx));
        if date.is_none() {
            invalid_dates += 1;
        }
        if age.is_none() {
            invalid_ages += 1;
        }
        let (Some(enrollment_date), Some(age)) = (date, age) else {
            continue;
        };

        let Some(age_group) = AgeGroup::from_age(age) else {
            unbinned_ages += 1;
            continue;
        };

        records.push(CleanedRecord {
            patient_id: patient_idx.map(|i| cell(row, i).to_owned()),
            trial_site: site_idx.map(|i| cell(row, i).to_owned()),
            enrollment_date,
            age,
            adverse_event: parse_bool(cell(row, ae_idx)),
            completed_trial: parse_bool(cell(row, completed_idx)),
            age_group,
            enrollment_month: enrollment_date.month(),
        });
    }

    let columns: Vec<String> = kept.iter().map(|&i| headers[i].clone()).collect();

    if records.len() < rows.len() || columns.len() < headers.len() {
        info!(
            rows_before = rows.len(),
            rows_after = records.len(),
            columns_before = headers.len(),
            columns_after = columns.len(),
            "Data cleaning dropped rows or columns"
        );
    }
    debug!(
        incomplete_rows,
        invalid_dates,
        invalid_ages,
        unbinned_ages,
        "Cleaning breakdown"
    );

    Ok(CleanedDataset { columns, records })
}

fn cell(row: &csv::StringRecord, i: usize) -> &str {
    row.get(i).unwrap_or("")
}

/// Whether a raw cell is one of the [`NULL_MARKERS`].
pub fn is_missing(value: &str) -> bool {
    NULL_MARKERS.contains(&value)
}

/// Lower-case and trim, then test against the accepted `true` spellings.
pub fn parse_bool(value: &str) -> bool {
    let normalized = value.trim().to_lowercase();
    TRUE_VALUES.contains(&normalized.as_str())
}

fn parse_age(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok()
}

/// Parse a calendar date from the formats the generator and common exports use.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "patient_id,trial_site,enrollment_date,age,adverse_event,completed_trial\n";

    fn load(body: &str) -> Result<CleanedDataset> {
        load_reader(format!("{HEADER}{body}").as_bytes())
    }

    #[test]
    fn test_load_clean_rows() {
        let ds = load(
            "P001,Boston,2024-01-15,25,false,true\n\
             P002,Boston,2024-02-03,65,true,false\n\
             P003,Chicago,2024-03-20,40,false,true\n",
        )
        .unwrap();

        assert_eq!(ds.len(), 3);
        assert_eq!(ds.columns.len(), 6);
        let first = &ds.records[0];
        assert_eq!(first.patient_id.as_deref(), Some("P001"));
        assert_eq!(first.age_group, AgeGroup::Age18To30);
        assert_eq!(first.enrollment_month, 1);
        assert!(first.completed_trial);
        assert!(!first.adverse_event);
        assert_eq!(ds.records[1].age_group, AgeGroup::Age51To70);
        assert_eq!(ds.records[2].enrollment_month, 3);
    }

    #[test]
    fn test_all_missing_column_is_dropped() {
        let ds = load(
            "P001,Null,2024-01-15,25,false,true\n\
             P002, ,2024-02-03,65,true,false\n\
             P003,,2024-03-20,40,false,true\n",
        )
        .unwrap();

        assert_eq!(ds.len(), 3);
        assert!(!ds.has_column(Column::TrialSite));
        assert!(ds.records.iter().all(|r| r.trial_site.is_none()));
        assert!(matches!(
            ds.require(Column::TrialSite),
            Err(AnalyticsError::SchemaInvalid { column: Column::TrialSite })
        ));
    }

    #[test]
    fn test_mixed_missing_drops_rows_only() {
        let ds = load(
            "P001,Null,2024-01-15,25,false,true\n\
             P002, ,2024-02-03,65,true,false\n\
             P003,Chicago,2024-03-20,40,false,true\n\
             P004,,2024-03-21,41,false,true\n",
        )
        .unwrap();

        assert!(ds.has_column(Column::TrialSite));
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records[0].patient_id.as_deref(), Some("P003"));
    }

    #[test]
    fn test_other_casings_are_not_null_markers() {
        let ds = load("NuLL,Boston,2024-01-15,25,false,true\n").unwrap();
        assert_eq!(ds.records[0].patient_id.as_deref(), Some("NuLL"));
    }

    #[test]
    fn test_extra_column_participates_in_row_drop() {
        let body = "patient_id,trial_site,enrollment_date,age,adverse_event,completed_trial,notes\n\
                    P001,Boston,2024-01-15,25,false,true,ok\n\
                    P002,Boston,2024-01-16,26,false,true,NULL\n";
        let ds = load_reader(body.as_bytes()).unwrap();
        assert_eq!(ds.len(), 1);
        assert!(ds.columns.iter().any(|c| c == "notes"));
    }

    #[test]
    fn test_non_numeric_age_dropped() {
        let ds = load(
            "P001,Boston,2024-01-15,25,false,true\n\
             P002,Boston,2024-01-16,abc,false,true\n\
             P003,Chicago,2024-01-17,33,true,true\n",
        )
        .unwrap();
        assert_eq!(ds.len(), 2);
        assert!(ds.records.iter().all(|r| r.patient_id.as_deref() != Some("P002")));
    }

    #[test]
    fn test_unparseable_date_dropped() {
        let ds = load(
            "P001,Boston,not-a-date,25,false,true\n\
             P002,Boston,2024-13-40,30,false,true\n\
             P003,Boston,03/04/2024,30,false,true\n",
        )
        .unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records[0].enrollment_month, 3);
    }

    #[test]
    fn test_out_of_range_ages_dropped() {
        let ds = load(
            "P001,Boston,2024-01-15,0,false,true\n\
             P002,Boston,2024-01-15,101,false,true\n\
             P003,Boston,2024-01-15,100,false,true\n\
             P004,Boston,2024-01-15,NaN,false,true\n",
        )
        .unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records[0].age_group, AgeGroup::Age71To80);
    }

    #[test]
    fn test_boolean_normalization() {
        assert!(parse_bool("true"));
        assert!(parse_bool(" TRUE "));
        assert!(parse_bool("Yes"));
        assert!(parse_bool("1"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool("y"));
        assert!(!parse_bool("maybe"));
    }

    #[test]
    fn test_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        assert_eq!(parse_date("2024-06-30"), Some(expected));
        assert_eq!(parse_date("2024/06/30"), Some(expected));
        assert_eq!(parse_date("06/30/2024"), Some(expected));
        assert_eq!(parse_date("2024-06-30 08:15:00"), Some(expected));
        assert_eq!(parse_date("2024-06-30T08:15:00Z"), Some(expected));
        assert_eq!(parse_date("June 30"), None);
    }

    #[test]
    fn test_all_missing_age_column_is_schema_error() {
        let err = load(
            "P001,Boston,2024-01-15,Null,false,true\n\
             P002,Boston,2024-01-16,,false,true\n",
        )
        .unwrap_err();
        assert!(matches!(err, AnalyticsError::SchemaInvalid { column: Column::Age }));
        assert!(!err.is_source_unreadable());
    }

    #[test]
    fn test_absent_header_column_is_schema_error() {
        let body = "patient_id,trial_site,age,adverse_event,completed_trial\nP001,Boston,25,false,true\n";
        let err = load_reader(body.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::SchemaInvalid { column: Column::EnrollmentDate }
        ));
    }

    #[test]
    fn test_header_only_source_is_empty() {
        let ds = load("").unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.columns.len(), 6);
    }

    #[test]
    fn test_empty_source_fails() {
        let err = load_reader("".as_bytes()).unwrap_err();
        assert!(matches!(err, AnalyticsError::EmptySource));
        assert!(err.is_source_unreadable());
    }

    #[test]
    fn test_ragged_row_is_unreadable() {
        let err = load("P001,Boston,2024-01-15\n").unwrap_err();
        assert!(matches!(err, AnalyticsError::Csv(_)));
        assert!(err.is_source_unreadable());
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_path(dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, AnalyticsError::Io(_)));
    }

    #[test]
    fn test_duplicates_pass_through() {
        let ds = load(
            "P001,Boston,2024-01-15,25,false,true\n\
             P001,Boston,2024-01-15,25,false,true\n",
        )
        .unwrap();
        assert_eq!(ds.len(), 2);
    }
}
