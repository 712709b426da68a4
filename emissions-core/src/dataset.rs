//! The immutable in-memory dataset.
//!
//! An [`EmissionsDataset`] is built exactly once from the loader's output
//! and never mutated afterwards: every derived view is a pure function over
//! it, so it can be shared across any number of readers without locking.
//! For the common single-load case, [`install_global`] provides a
//! process-wide handle with one-time initialization — the explicit
//! replacement for the original application's memoized loader, which never
//! invalidated anyway because the inputs are static files.

use crate::records::{CountryGeometry, EmissionRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// The normalized emissions table plus its geometry join target, with
/// precomputed sorted indices of the countries and years present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmissionsDataset {
    records: Vec<EmissionRecord>,
    geometries: HashMap<String, CountryGeometry>,
    countries: Vec<String>,
    years: Vec<i32>,
}

impl EmissionsDataset {
    /// Build the snapshot from normalized tables.
    ///
    /// Geometry rows are keyed by code; the loader has already deduplicated
    /// them, but if a caller hands in duplicates the first occurrence wins
    /// here as well.
    pub fn from_parts(
        records: Vec<EmissionRecord>,
        geometries: Vec<CountryGeometry>,
    ) -> Self {
        let mut geometry_map = HashMap::with_capacity(geometries.len());
        for geometry in geometries {
            geometry_map
                .entry(geometry.code.clone())
                .or_insert(geometry);
        }

        let mut countries: Vec<String> = records.iter().map(|r| r.country.clone()).collect();
        countries.sort();
        countries.dedup();

        let mut years: Vec<i32> = records.iter().map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();

        Self {
            records,
            geometries: geometry_map,
            countries,
            years,
        }
    }

    /// All normalized emission records, in source order.
    pub fn records(&self) -> &[EmissionRecord] {
        &self.records
    }

    /// Number of emission records (including those with absent values).
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct country display names, sorted ascending.
    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    /// Distinct years present in the data, sorted ascending.
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// First and last year present, or `None` for an empty dataset.
    pub fn year_range(&self) -> Option<(i32, i32)> {
        match (self.years.first(), self.years.last()) {
            (Some(&first), Some(&last)) => Some((first, last)),
            _ => None,
        }
    }

    /// Geometry for a country code, if the geometry source had one.
    pub fn geometry(&self, code: &str) -> Option<&CountryGeometry> {
        self.geometries.get(code)
    }

    /// Number of geometry rows that survived deduplication.
    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    /// Wrap in an [`Arc`] for sharing across readers.
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

static GLOBAL: OnceLock<Arc<EmissionsDataset>> = OnceLock::new();

/// Install the process-wide dataset. Returns `Err` with the rejected
/// dataset if one was already installed; installation happens once.
pub fn install_global(dataset: EmissionsDataset) -> Result<(), EmissionsDataset> {
    GLOBAL
        .set(Arc::new(dataset))
        .map_err(|rejected| match Arc::into_inner(rejected) {
            Some(dataset) => dataset,
            // The rejected Arc was never cloned.
            None => unreachable!("rejected dataset has a single owner"),
        })
}

/// The process-wide dataset, if one has been installed.
pub fn global() -> Option<Arc<EmissionsDataset>> {
    GLOBAL.get().cloned()
}
