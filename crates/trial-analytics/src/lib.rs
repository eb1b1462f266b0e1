//! # Trial Analytics
//!
//! Cleaning and descriptive aggregation pipeline for clinical trial datasets.
//!
//! ## Features
//!
//! - CSV loading with null-marker normalization and type coercion
//! - Summary statistics and adverse-event stratified completion rates
//! - Site performance ranking
//! - Age group and monthly breakdowns
//! - Pearson correlation with one-hot encoded sites
//! - Best/worst insights and Markdown/JSON reports

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod correlation;
pub mod engine;
pub mod error;
pub mod insights;
pub mod loader;
pub mod queries;
pub mod reports;

pub use engine::{analyze, analyze_reader, AnalyticsEngine};
pub use error::{AnalyticsError, Result};
pub use loader::{load_path, load_reader, CleanedDataset};
pub use reports::AnalyticsReport;
