//! # Trial Simulator
//!
//! Seeded synthetic dataset generator for the clinical trial analytics
//! pipeline.
//!
//! ## Features
//!
//! - Reproducible output for a given seed
//! - Configurable sites, enrollment window and age range
//! - Adverse-event dependent completion probabilities
//! - Optional null-marker injection for exercising the cleaning stage

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod generator;

pub use generator::{
    write_csv, write_csv_file, GeneratorConfig, GeneratorError, TrialDataGenerator,
};
