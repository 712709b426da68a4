//! End-to-end pipeline tests: raw CSV sources through the loader into the
//! dataset and out through every derived view.

use approx::assert_relative_eq;
use emissions_core::loader;
use emissions_core::views::{self, DerivedView, ViewSelection};

const GEOMETRY: &str = "\
ISO_A3,NAME,geometry
CHL,Chile,POLYGON((1 1))
USA,United States,POLYGON((2 2))
DEU,Germany,POLYGON((3 3))
";

const EMISSIONS: &str = "\
Entity,Code,Year,Annual CO2 emissions
Chile,CHL,1990,50.0
Chile,CHL,1991,
Chile,CHL,1992,70.0
United States,USA,1990,500.0
United States,USA,1992,520.0
Germany,DEU,1992,300.0
United States,us,2000,100.0
World,,1990,999.0
";

fn load() -> emissions_core::dataset::EmissionsDataset {
    let loaded = loader::from_readers(GEOMETRY.as_bytes(), EMISSIONS.as_bytes()).unwrap();
    let (dataset, report) = loaded.into_dataset();
    // The lowercase 2-char code and the codeless World row are dropped at
    // load and must never surface in any derived view.
    assert_eq!(report.dropped_bad_code, 2);
    assert_eq!(report.absent_values, 1);
    dataset
}

mod scenarios {
    use super::*;

    /// A year with an absent measurement contributes nothing: the series
    /// skips 1991 and the running total jumps straight from 50 to 120.
    #[test]
    fn chile_series_and_cumulative() {
        let dataset = load();
        let series = dataset.time_series("Chile");
        assert_eq!(series.iter().collect::<Vec<_>>(), vec![(1990, 50.0), (1992, 70.0)]);

        let cumulative = dataset.cumulative("Chile");
        assert_eq!(
            cumulative.iter().collect::<Vec<_>>(),
            vec![(1990, 50.0, 50.0), (1992, 70.0, 120.0)]
        );
    }

    /// Asking for more entries than there are reporting countries returns
    /// what exists, sorted descending.
    #[test]
    fn ranking_caps_at_reporting_countries() {
        let dataset = load();
        let ranking = dataset.year_ranking(1990, 5).unwrap();
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].country, "United States");
        assert_relative_eq!(ranking[0].co2, 500.0);
        assert_eq!(ranking[1].country, "Chile");
    }

    /// Rows dropped at load never appear downstream: no country named
    /// "World", no year 2000, no 2-character code anywhere.
    #[test]
    fn dropped_rows_never_surface() {
        let dataset = load();
        assert!(!dataset.countries().iter().any(|c| c == "World"));
        assert!(!dataset.years().contains(&2000));
        assert!(dataset
            .records()
            .iter()
            .all(|r| r.code.len() == 3 && r.code == r.code.to_uppercase()));
    }

    #[test]
    fn global_trend_sums_only_reporting_countries() {
        let dataset = load();
        let trend = dataset.global_trend();
        assert_eq!(
            trend.iter().collect::<Vec<_>>(),
            vec![(1990, 550.0), (1992, 890.0)]
        );
    }

    /// The strict all-time leader must come first.
    #[test]
    fn top_k_lists_strict_leader_first() {
        let dataset = load();
        let top = dataset.top_k(10).unwrap();
        assert_eq!(top[0].country, "United States");
        assert_relative_eq!(top[0].total, 1020.0);
        assert_eq!(top.len(), 3);
    }

    #[test]
    fn map_frames_join_against_geometry_by_code() {
        let dataset = load();
        let frames = dataset.map_frames();
        assert_eq!(frames.first().map(|f| f.year), Some(1990));
        for frame in &frames {
            for point in &frame.points {
                assert!(dataset.geometry(&point.code).is_some(), "{}", point.code);
            }
        }
    }
}

mod determinism {
    use super::*;

    /// Loading identical sources twice yields identical derived views.
    #[test]
    fn reload_yields_identical_views() {
        let first = load();
        let second = load();

        assert_eq!(first.countries(), second.countries());
        assert_eq!(first.years(), second.years());

        let selections = [
            ViewSelection::TimeSeries { country: "Chile".into() },
            ViewSelection::YearRanking { year: 1992, n: 15 },
            ViewSelection::Cumulative { country: "United States".into() },
            ViewSelection::GlobalTrend,
            ViewSelection::TopEmitters { k: 10 },
            ViewSelection::GlobalComparison { k: 2 },
            ViewSelection::MapFrames,
        ];
        for selection in &selections {
            let a = views::resolve(&first, selection).unwrap();
            let b = views::resolve(&second, selection).unwrap();
            assert_eq!(a, b, "selection {selection:?}");
        }
    }

    /// Derived views survive a serde round-trip unchanged, so a rendering
    /// layer on the far side of a serialization boundary sees the same
    /// tables.
    #[test]
    fn views_round_trip_through_serde() {
        let dataset = load();
        let view = views::resolve(&dataset, &ViewSelection::GlobalComparison { k: 2 }).unwrap();
        let json = serde_json::to_string(&view).unwrap();
        let back: DerivedView = serde_json::from_str(&json).unwrap();
        assert_eq!(back, view);
    }
}
