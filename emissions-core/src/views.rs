//! Typed binding between a user's filter selection and a derived view.
//!
//! The rendering layer never touches the aggregation methods directly: it
//! holds a [`ViewSelection`] describing the current filters and asks
//! [`resolve`] for the matching [`DerivedView`]. Every view carries only
//! the canonical field names, so the renderer needs no source-specific
//! column knowledge.

use crate::aggregate::{
    CountryTotal, CumulativeSeries, MapFrame, NamedSeries, RankingEntry, YearSeries,
};
use crate::dataset::EmissionsDataset;
use crate::errors::EmissionsResult;
use serde::{Deserialize, Serialize};

/// The user's current filter selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ViewSelection {
    /// One country's emissions over time
    TimeSeries { country: String },
    /// Top-n countries for one year
    YearRanking { year: i32, n: usize },
    /// One country's emissions with a running total
    Cumulative { country: String },
    /// Sum across all reporting countries, per year
    GlobalTrend,
    /// All-time top-k emitters
    TopEmitters { k: usize },
    /// Top-k country series plus the aggregated world series
    GlobalComparison { k: usize },
    /// Per-year choropleth frames
    MapFrames,
}

/// A view ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DerivedView {
    TimeSeries(YearSeries),
    Ranking(Vec<RankingEntry>),
    Cumulative(CumulativeSeries),
    GlobalTrend(YearSeries),
    TopEmitters(Vec<CountryTotal>),
    GlobalComparison(Vec<NamedSeries>),
    MapFrames(Vec<MapFrame>),
}

impl DerivedView {
    /// True if the selection matched no data. Callers render this as an
    /// explicit "no data" state; it is never an error.
    pub fn is_empty(&self) -> bool {
        match self {
            DerivedView::TimeSeries(series) | DerivedView::GlobalTrend(series) => {
                series.is_empty()
            }
            DerivedView::Ranking(entries) => entries.is_empty(),
            DerivedView::Cumulative(cumulative) => cumulative.series.is_empty(),
            DerivedView::TopEmitters(entries) => entries.is_empty(),
            DerivedView::GlobalComparison(series) => {
                series.iter().all(|named| named.series.is_empty())
            }
            DerivedView::MapFrames(frames) => frames.is_empty(),
        }
    }
}

/// Compute the derived view for a filter selection.
///
/// Fails only on structurally invalid parameters (`n` or `k` of zero);
/// selections that match no data yield an empty view.
pub fn resolve(
    dataset: &EmissionsDataset,
    selection: &ViewSelection,
) -> EmissionsResult<DerivedView> {
    let view = match selection {
        ViewSelection::TimeSeries { country } => {
            DerivedView::TimeSeries(dataset.time_series(country))
        }
        ViewSelection::YearRanking { year, n } => {
            DerivedView::Ranking(dataset.year_ranking(*year, *n)?)
        }
        ViewSelection::Cumulative { country } => {
            DerivedView::Cumulative(dataset.cumulative(country))
        }
        ViewSelection::GlobalTrend => DerivedView::GlobalTrend(dataset.global_trend()),
        ViewSelection::TopEmitters { k } => DerivedView::TopEmitters(dataset.top_k(*k)?),
        ViewSelection::GlobalComparison { k } => {
            DerivedView::GlobalComparison(dataset.global_vs_top(*k)?)
        }
        ViewSelection::MapFrames => DerivedView::MapFrames(dataset.map_frames()),
    };
    Ok(view)
}
