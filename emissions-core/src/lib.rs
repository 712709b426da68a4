//! Data-preparation core for a per-country CO₂ emissions explorer.
//!
//! This crate owns everything between the raw input files and a rendering
//! layer: it loads a country-geometry table and an annual-emissions table,
//! normalizes them into an immutable in-memory [`EmissionsDataset`], and
//! derives the view-ready tables (time series, year rankings, cumulative
//! series, global trend, top-K totals, choropleth frames) that a chart
//! renderer consumes. Rendering, layout, and projection math live elsewhere.
//!
//! The dataset is built once at startup and is read-only afterwards, so it
//! can be shared across any number of readers without synchronization; see
//! [`dataset::install_global`] for the process-wide one-time handle.
//!
//! [`EmissionsDataset`]: dataset::EmissionsDataset

pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod errors;
pub mod loader;
pub mod records;
pub mod views;
