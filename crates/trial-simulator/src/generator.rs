//! Synthetic patient record generation.

use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use trial_domain::{Column, NULL_MARKERS, RawRecord};

const DEFAULT_START: NaiveDate = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid constant date");
const DEFAULT_END: NaiveDate = NaiveDate::from_ymd_opt(2024, 6, 30).expect("valid constant date");

/// Generator errors.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("invalid generator config: {0}")]
    InvalidConfig(String),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parameters for one generated dataset.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub records: usize,
    pub seed: u64,
    pub sites: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub min_age: u32,
    pub max_age: u32,
    pub adverse_event_probability: f64,
    /// Completion probability for patients with an adverse event
    pub completion_with_ae: f64,
    /// Completion probability for patients without an adverse event
    pub completion_without_ae: f64,
    /// Per-cell probability of replacing a non-ID value with a null marker
    pub null_rate: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            records: 40,
            seed: 42,
            sites: ["Boston", "Chicago", "New York", "San Francisco", "Dallas"]
                .map(String::from)
                .to_vec(),
            start_date: DEFAULT_START,
            end_date: DEFAULT_END,
            min_age: 18,
            max_age: 80,
            adverse_event_probability: 0.3,
            completion_with_ae: 0.7,
            completion_without_ae: 0.9,
            null_rate: 0.0,
        }
    }
}

impl GeneratorConfig {
    fn validate(&self) -> Result<(), GeneratorError> {
        let invalid = |msg: String| Err(GeneratorError::InvalidConfig(msg));

        if self.sites.is_empty() {
            return invalid("at least one trial site is required".into());
        }
        if self.end_date < self.start_date {
            return invalid(format!(
                "end date {} precedes start date {}",
                self.end_date, self.start_date
            ));
        }
        if self.max_age < self.min_age {
            return invalid(format!(
                "max age {} is below min age {}",
                self.max_age, self.min_age
            ));
        }
        for (name, p) in [
            ("adverse_event_probability", self.adverse_event_probability),
            ("completion_with_ae", self.completion_with_ae),
            ("completion_without_ae", self.completion_without_ae),
            ("null_rate", self.null_rate),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return invalid(format!("{name} must be within [0, 1], got {p}"));
            }
        }
        Ok(())
    }
}

/// Seeded generator: the same config always yields the same records.
pub struct TrialDataGenerator {
    config: GeneratorConfig,
    rng: StdRng,
}

impl TrialDataGenerator {
    /// Create a generator, validating the config.
    pub fn new(config: GeneratorConfig) -> Result<Self, GeneratorError> {
        config.validate()?;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self { config, rng })
    }

    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate the configured number of records.
    pub fn generate(&mut self) -> Vec<RawRecord> {
        (1..=self.config.records).map(|i| self.record(i)).collect()
    }

    fn record(&mut self, index: usize) -> RawRecord {
        let site = self.rng.gen_range(0..self.config.sites.len());
        let window = (self.config.end_date - self.config.start_date).num_days();
        let offset = self.rng.gen_range(0..=window.unsigned_abs());
        let enrollment_date = self.config.start_date + Days::new(offset);
        let age = self.rng.gen_range(self.config.min_age..=self.config.max_age);

        let adverse_event = self.rng.gen_bool(self.config.adverse_event_probability);
        let completion_p = if adverse_event {
            self.config.completion_with_ae
        } else {
            self.config.completion_without_ae
        };
        let completed_trial = self.rng.gen_bool(completion_p);

        let mut record = RawRecord {
            patient_id: format!("P{index:03}"),
            trial_site: self.config.sites[site].clone(),
            enrollment_date: enrollment_date.format("%Y-%m-%d").to_string(),
            age: age.to_string(),
            adverse_event: adverse_event.to_string(),
            completed_trial: completed_trial.to_string(),
        };

        if self.config.null_rate > 0.0 {
            self.inject_nulls(&mut record);
        }
        record
    }

    fn inject_nulls(&mut self, record: &mut RawRecord) {
        let cells = [
            &mut record.trial_site,
            &mut record.enrollment_date,
            &mut record.age,
            &mut record.adverse_event,
            &mut record.completed_trial,
        ];
        for cell in cells {
            if self.rng.gen_bool(self.config.null_rate) {
                let marker = NULL_MARKERS[self.rng.gen_range(0..NULL_MARKERS.len())];
                marker.clone_into(cell);
            }
        }
    }
}

/// Write records as CSV with the standard header row.
pub fn write_csv<W: Write>(records: &[RawRecord], writer: W) -> Result<(), GeneratorError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(Column::ALL.map(|c| c.as_str()))?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write records to `path`, creating the parent directory if needed.
pub fn write_csv_file<P: AsRef<Path>>(records: &[RawRecord], path: P) -> Result<(), GeneratorError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_csv(records, File::create(path)?)
}
