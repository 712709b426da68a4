//! Derived views over the dataset.
//!
//! Every operation here is a pure function of the immutable
//! [`EmissionsDataset`]: no caching, no shared mutable state, recomputed on
//! demand. Absent measurements are excluded before any arithmetic — a
//! missing value never contributes zero to a sum. Empty selections (an
//! unknown country, a year nobody reported) yield empty views, not errors;
//! only structurally invalid parameters fail, with
//! [`EmissionsError::InvalidParameter`].
//!
//! Determinism: rankings sort descending by value with a stable sort, so
//! ties keep their input order; all-time totals break ties by country name
//! ascending.

use crate::dataset::EmissionsDataset;
use crate::errors::{EmissionsError, EmissionsResult};
use crate::records::FloatValue;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// An ascending-by-year sequence of present measurements.
///
/// Years and values are parallel arrays; years with no measurement are
/// simply absent from the sequence, never interpolated or zero-filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearSeries {
    years: Vec<i32>,
    values: Array1<FloatValue>,
}

impl YearSeries {
    /// Build a series from (year, value) pairs already in ascending order.
    fn from_pairs(pairs: Vec<(i32, FloatValue)>) -> Self {
        let (years, values): (Vec<i32>, Vec<FloatValue>) = pairs.into_iter().unzip();
        Self {
            years,
            values: Array1::from_vec(values),
        }
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn values(&self) -> &Array1<FloatValue> {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, FloatValue)> + '_ {
        self.years
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }

    /// First (year, value) pair, if any.
    pub fn earliest(&self) -> Option<(i32, FloatValue)> {
        self.iter().next()
    }

    /// Last (year, value) pair, if any.
    pub fn latest(&self) -> Option<(i32, FloatValue)> {
        self.iter().last()
    }

    /// The (year, value) pair with the highest value; the earliest such
    /// year on ties.
    pub fn peak(&self) -> Option<(i32, FloatValue)> {
        self.iter().reduce(|best, candidate| {
            if candidate.1 > best.1 {
                candidate
            } else {
                best
            }
        })
    }

    /// Arithmetic mean of the present values, `None` when empty.
    pub fn mean(&self) -> Option<FloatValue> {
        self.values.mean()
    }

    /// Add a running-total column.
    pub fn cumulative(self) -> CumulativeSeries {
        let mut total = 0.0;
        let running = self.values.iter().map(|v| {
            total += v;
            total
        });
        let running = Array1::from_iter(running);
        CumulativeSeries {
            series: self,
            running,
        }
    }
}

/// A [`YearSeries`] with a running total.
///
/// The total advances only on years with a present measurement; gaps are
/// skipped, not interpolated. With non-negative inputs (the loader rejects
/// negatives) the running column is monotone non-decreasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeSeries {
    pub series: YearSeries,
    running: Array1<FloatValue>,
}

impl CumulativeSeries {
    pub fn running(&self) -> &Array1<FloatValue> {
        &self.running
    }

    /// All-time total: the last running value, `None` when empty.
    pub fn total(&self) -> Option<FloatValue> {
        self.running.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, FloatValue, FloatValue)> + '_ {
        self.series
            .iter()
            .zip(self.running.iter().copied())
            .map(|((year, value), running)| (year, value, running))
    }
}

/// One row of a per-year ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub country: String,
    pub code: String,
    pub co2: FloatValue,
}

/// One row of an all-time totals table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryTotal {
    pub country: String,
    pub total: FloatValue,
}

/// A labelled series, used by the global-vs-top-K comparison view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSeries {
    pub name: String,
    pub series: YearSeries,
}

/// Label attached to the aggregated world series in [`global_vs_top`].
///
/// [`global_vs_top`]: EmissionsDataset::global_vs_top
pub const WORLD_SERIES_NAME: &str = "World";

/// One frame of the animated choropleth: every reporting country's value
/// for a single year, join-ready against geometry by code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapFrame {
    pub year: i32,
    pub points: Vec<MapPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub code: String,
    pub country: String,
    pub co2: FloatValue,
}

impl EmissionsDataset {
    /// Per-country emissions over time, ascending by year.
    ///
    /// An unknown country yields an empty series, not an error.
    pub fn time_series(&self, country: &str) -> YearSeries {
        let mut pairs: Vec<(i32, FloatValue)> = self
            .records()
            .iter()
            .filter(|r| r.country == country)
            .filter_map(|r| r.co2.map(|value| (r.year, value)))
            .collect();
        pairs.sort_by_key(|&(year, _)| year);
        YearSeries::from_pairs(pairs)
    }

    /// Per-country emissions with a running total, ascending by year.
    pub fn cumulative(&self, country: &str) -> CumulativeSeries {
        self.time_series(country).cumulative()
    }

    /// The `n` highest-emitting countries for one year, descending.
    ///
    /// Ties keep input order (stable sort). Fewer than `n` reporting
    /// countries yields them all; a year nobody reported yields an empty
    /// ranking.
    pub fn year_ranking(&self, year: i32, n: usize) -> EmissionsResult<Vec<RankingEntry>> {
        if n < 1 {
            return Err(EmissionsError::InvalidParameter(
                "ranking size n must be at least 1".into(),
            ));
        }

        let mut entries: Vec<RankingEntry> = self
            .records()
            .iter()
            .filter(|r| r.year == year)
            .filter_map(|r| {
                r.co2.map(|co2| RankingEntry {
                    country: r.country.clone(),
                    code: r.code.clone(),
                    co2,
                })
            })
            .collect();
        entries.sort_by(|a, b| b.co2.partial_cmp(&a.co2).unwrap_or(Ordering::Equal));
        entries.truncate(n);
        Ok(entries)
    }

    /// Sum of emissions across all reporting countries, per year.
    ///
    /// Years where every country is missing are omitted, not zero-filled.
    pub fn global_trend(&self) -> YearSeries {
        let mut totals: BTreeMap<i32, FloatValue> = BTreeMap::new();
        for record in self.records() {
            if let Some(value) = record.co2 {
                *totals.entry(record.year).or_insert(0.0) += value;
            }
        }
        YearSeries::from_pairs(totals.into_iter().collect())
    }

    /// The `k` countries with the highest all-time summed emissions,
    /// descending, ties broken by name ascending.
    ///
    /// `k` larger than the number of countries yields them all.
    pub fn top_k(&self, k: usize) -> EmissionsResult<Vec<CountryTotal>> {
        if k < 1 {
            return Err(EmissionsError::InvalidParameter(
                "top-k size k must be at least 1".into(),
            ));
        }

        let mut totals: BTreeMap<&str, FloatValue> = BTreeMap::new();
        for record in self.records() {
            let total = totals.entry(record.country.as_str()).or_insert(0.0);
            if let Some(value) = record.co2 {
                *total += value;
            }
        }

        let mut entries: Vec<CountryTotal> = totals
            .into_iter()
            .map(|(country, total)| CountryTotal {
                country: country.to_string(),
                total,
            })
            .collect();
        entries.sort_by(|a, b| {
            b.total
                .partial_cmp(&a.total)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.country.cmp(&b.country))
        });
        entries.truncate(k);
        Ok(entries)
    }

    /// The top-`k` country series plus the aggregated world series,
    /// the combined table behind the global-vs-top-K comparison chart.
    pub fn global_vs_top(&self, k: usize) -> EmissionsResult<Vec<NamedSeries>> {
        let mut series: Vec<NamedSeries> = self
            .top_k(k)?
            .into_iter()
            .map(|entry| NamedSeries {
                series: self.time_series(&entry.country),
                name: entry.country,
            })
            .collect();
        series.push(NamedSeries {
            name: WORLD_SERIES_NAME.to_string(),
            series: self.global_trend(),
        });
        Ok(series)
    }

    /// Per-year choropleth frames, ascending by year.
    ///
    /// Absent measurements are excluded, so a country simply disappears
    /// from frames for years it did not report.
    pub fn map_frames(&self) -> Vec<MapFrame> {
        let mut frames: BTreeMap<i32, Vec<MapPoint>> = BTreeMap::new();
        for record in self.records() {
            if let Some(value) = record.co2 {
                frames.entry(record.year).or_default().push(MapPoint {
                    code: record.code.clone(),
                    country: record.country.clone(),
                    co2: value,
                });
            }
        }
        frames
            .into_iter()
            .map(|(year, points)| MapFrame { year, points })
            .collect()
    }
}
