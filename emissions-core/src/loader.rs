//! CSV ingestion and normalization.
//!
//! The loader turns the two raw sources into normalized tables with the
//! canonical field names, applying every validation rule exactly once so
//! that nothing downstream has to re-check:
//!
//! - source column headers are aliased to `country` / `code` / `year` /
//!   `boundary` (case-insensitively);
//! - the emissions quantity column is identified by elimination: exactly one
//!   column must remain after the known headers are matched, otherwise the
//!   schema is ambiguous and loading fails with
//!   [`EmissionsError::Schema`] instead of guessing;
//! - country codes are trimmed and uppercased, and rows whose code is not
//!   exactly three characters are dropped;
//! - absent or unparseable quantity cells load as `None` (excluded from
//!   every aggregate, never treated as zero);
//! - negative quantities are rejected row-wise, preserving the
//!   monotone-cumulative invariant for everything downstream;
//! - geometry rows are deduplicated by code, first occurrence wins.
//!
//! Nothing is dropped silently: every discarded row class is counted in the
//! [`LoadReport`] and surfaced through `log::warn!`.

use crate::config::DataSourceConfig;
use crate::dataset::EmissionsDataset;
use crate::errors::{EmissionsError, EmissionsResult};
use crate::records::{CountryGeometry, EmissionRecord};
use csv::StringRecord;
use log::warn;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Per-class accounting of rows discarded or degraded during a load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Emissions rows read from the source, before any filtering
    pub emission_rows_read: usize,
    /// Emissions rows kept with `co2 = None` (empty or unparseable cell)
    pub absent_values: usize,
    /// Emissions rows dropped because the code was not exactly 3 characters
    pub dropped_bad_code: usize,
    /// Emissions rows dropped because the year did not parse as an integer
    pub dropped_bad_year: usize,
    /// Emissions rows dropped because the quantity was negative
    pub dropped_negative: usize,
    /// Geometry rows read from the source
    pub geometry_rows_read: usize,
    /// Geometry rows dropped because the code was not exactly 3 characters
    pub geometry_dropped_bad_code: usize,
    /// Geometry rows dropped as duplicates of an earlier code
    pub geometry_duplicates: usize,
}

impl LoadReport {
    /// True if any row was dropped (absent values are kept, not dropped).
    pub fn has_drops(&self) -> bool {
        self.dropped_bad_code > 0
            || self.dropped_bad_year > 0
            || self.dropped_negative > 0
            || self.geometry_dropped_bad_code > 0
            || self.geometry_duplicates > 0
    }

    /// Emit one warning per nonzero drop class.
    pub fn log_warnings(&self) {
        if self.dropped_bad_code > 0 {
            warn!(
                "dropped {} emissions rows with non-ISO-3 codes",
                self.dropped_bad_code
            );
        }
        if self.dropped_bad_year > 0 {
            warn!(
                "dropped {} emissions rows with unparseable years",
                self.dropped_bad_year
            );
        }
        if self.dropped_negative > 0 {
            warn!(
                "dropped {} emissions rows with negative quantities",
                self.dropped_negative
            );
        }
        if self.geometry_dropped_bad_code > 0 {
            warn!(
                "dropped {} geometry rows with non-ISO-3 codes",
                self.geometry_dropped_bad_code
            );
        }
        if self.geometry_duplicates > 0 {
            warn!(
                "dropped {} duplicate geometry rows (first occurrence wins)",
                self.geometry_duplicates
            );
        }
    }
}

/// Output of a successful load: both normalized tables plus the drop
/// accounting.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub records: Vec<EmissionRecord>,
    pub geometries: Vec<CountryGeometry>,
    pub report: LoadReport,
}

impl LoadedData {
    /// Build the immutable dataset snapshot, handing the report back
    /// separately.
    pub fn into_dataset(self) -> (EmissionsDataset, LoadReport) {
        (
            EmissionsDataset::from_parts(self.records, self.geometries),
            self.report,
        )
    }
}

/// Load both sources named by the configuration.
///
/// Fails with [`EmissionsError::DataSourceUnavailable`] if either file
/// cannot be opened or read, and with [`EmissionsError::Schema`] if the
/// emissions quantity column cannot be identified unambiguously. Load-time
/// errors are fatal to the caller: there is no partial dataset.
pub fn load(config: &DataSourceConfig) -> EmissionsResult<LoadedData> {
    let geometry = open(config.geometry_path())?;
    let emissions = open(config.emissions_path())?;
    from_readers_with_origin(
        geometry,
        config.geometry_path(),
        emissions,
        config.emissions_path(),
    )
}

/// Load from arbitrary readers (in-memory sources, archives, tests).
pub fn from_readers<G: Read, E: Read>(geometry: G, emissions: E) -> EmissionsResult<LoadedData> {
    from_readers_with_origin(
        geometry,
        Path::new("<geometry reader>"),
        emissions,
        Path::new("<emissions reader>"),
    )
}

fn open(path: &Path) -> EmissionsResult<File> {
    File::open(path).map_err(|e| EmissionsError::DataSourceUnavailable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn from_readers_with_origin<G: Read, E: Read>(
    geometry: G,
    geometry_origin: &Path,
    emissions: E,
    emissions_origin: &Path,
) -> EmissionsResult<LoadedData> {
    let mut report = LoadReport::default();
    let geometries = read_geometry(geometry, geometry_origin, &mut report)?;
    let records = read_emissions(emissions, emissions_origin, &mut report)?;
    if report.has_drops() {
        report.log_warnings();
    }
    Ok(LoadedData {
        records,
        geometries,
        report,
    })
}

/// Column indices for the emissions source after header aliasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EmissionsSchema {
    country: usize,
    code: usize,
    year: usize,
    co2: usize,
}

impl EmissionsSchema {
    /// Resolve the canonical columns from a header row.
    ///
    /// The quantity column is whichever single column is not recognized as
    /// country, code or year. Zero leftover columns means there is nothing
    /// to aggregate; more than one means the choice would be arbitrary.
    /// Both fail loudly.
    fn infer(headers: &StringRecord) -> EmissionsResult<Self> {
        let mut country = None;
        let mut code = None;
        let mut year = None;
        let mut leftovers = Vec::new();

        for (idx, raw) in headers.iter().enumerate() {
            match raw.trim().to_ascii_lowercase().as_str() {
                "entity" | "country" | "name" => country = country.or(Some(idx)),
                "code" | "iso_a3" | "iso3" => code = code.or(Some(idx)),
                "year" => year = year.or(Some(idx)),
                _ => leftovers.push((idx, raw.to_string())),
            }
        }

        let country =
            country.ok_or_else(|| EmissionsError::Schema("no country column found".into()))?;
        let code = code.ok_or_else(|| EmissionsError::Schema("no code column found".into()))?;
        let year = year.ok_or_else(|| EmissionsError::Schema("no year column found".into()))?;

        let co2 = match leftovers.as_slice() {
            [(idx, _)] => *idx,
            [] => {
                return Err(EmissionsError::Schema(
                    "no quantity column found besides country/code/year".into(),
                ))
            }
            many => {
                let names: Vec<&str> = many.iter().map(|(_, name)| name.as_str()).collect();
                return Err(EmissionsError::Schema(format!(
                    "ambiguous quantity column, candidates: {}",
                    names.join(", ")
                )));
            }
        };

        Ok(Self {
            country,
            code,
            year,
            co2,
        })
    }
}

/// Column indices for the geometry source after header aliasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GeometrySchema {
    code: usize,
    country: usize,
    boundary: usize,
}

impl GeometrySchema {
    fn infer(headers: &StringRecord) -> EmissionsResult<Self> {
        let mut code = None;
        let mut country = None;
        let mut boundary = None;

        for (idx, raw) in headers.iter().enumerate() {
            match raw.trim().to_ascii_lowercase().as_str() {
                "iso_a3" | "iso3" | "code" => code = code.or(Some(idx)),
                "name" | "country" | "admin" => country = country.or(Some(idx)),
                "geometry" | "boundary" | "wkt" => boundary = boundary.or(Some(idx)),
                _ => {}
            }
        }

        Ok(Self {
            code: code.ok_or_else(|| EmissionsError::Schema("no geometry code column".into()))?,
            country: country
                .ok_or_else(|| EmissionsError::Schema("no geometry name column".into()))?,
            boundary: boundary
                .ok_or_else(|| EmissionsError::Schema("no geometry boundary column".into()))?,
        })
    }
}

fn read_error(origin: &Path, err: csv::Error) -> EmissionsError {
    EmissionsError::DataSourceUnavailable {
        path: origin.to_path_buf(),
        reason: err.to_string(),
    }
}

fn normalize_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_ascii_uppercase();
    if code.chars().count() == 3 {
        Some(code)
    } else {
        None
    }
}

fn read_geometry<R: Read>(
    reader: R,
    origin: &Path,
    report: &mut LoadReport,
) -> EmissionsResult<Vec<CountryGeometry>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let schema = GeometrySchema::infer(rdr.headers().map_err(|e| read_error(origin, e))?)?;

    let mut seen = HashSet::new();
    let mut geometries = Vec::new();
    for row in rdr.records() {
        let row = row.map_err(|e| read_error(origin, e))?;
        report.geometry_rows_read += 1;

        let code = match row.get(schema.code).and_then(normalize_code) {
            Some(code) => code,
            None => {
                report.geometry_dropped_bad_code += 1;
                continue;
            }
        };
        if !seen.insert(code.clone()) {
            report.geometry_duplicates += 1;
            continue;
        }

        geometries.push(CountryGeometry::new(
            code,
            row.get(schema.country).unwrap_or_default().trim(),
            row.get(schema.boundary).unwrap_or_default(),
        ));
    }
    Ok(geometries)
}

fn read_emissions<R: Read>(
    reader: R,
    origin: &Path,
    report: &mut LoadReport,
) -> EmissionsResult<Vec<EmissionRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let schema = EmissionsSchema::infer(rdr.headers().map_err(|e| read_error(origin, e))?)?;

    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row.map_err(|e| read_error(origin, e))?;
        report.emission_rows_read += 1;

        let code = match row.get(schema.code).and_then(normalize_code) {
            Some(code) => code,
            None => {
                report.dropped_bad_code += 1;
                continue;
            }
        };
        let year = match row
            .get(schema.year)
            .and_then(|cell| cell.trim().parse::<i32>().ok())
        {
            Some(year) => year,
            None => {
                report.dropped_bad_year += 1;
                continue;
            }
        };

        let cell = row.get(schema.co2).unwrap_or_default().trim();
        let co2 = if cell.is_empty() {
            report.absent_values += 1;
            None
        } else {
            match cell.parse::<f64>() {
                // Textual NaN/inf parse successfully but are not
                // measurements; treat them as absent, like pandas does.
                Ok(value) if !value.is_finite() => {
                    report.absent_values += 1;
                    None
                }
                Ok(value) if value < 0.0 => {
                    report.dropped_negative += 1;
                    continue;
                }
                Ok(value) => Some(value),
                Err(_) => {
                    report.absent_values += 1;
                    None
                }
            }
        };

        records.push(EmissionRecord::new(
            row.get(schema.country).unwrap_or_default().trim(),
            code,
            year,
            co2,
        ));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEOMETRY: &str = "\
ISO_A3,NAME,geometry
CHL,Chile,POLYGON((1 1))
USA,United States,POLYGON((2 2))
";

    fn load_emissions(csv: &str) -> EmissionsResult<LoadedData> {
        from_readers(GEOMETRY.as_bytes(), csv.as_bytes())
    }

    #[test]
    fn aliases_headers_and_uppercases_codes() {
        let loaded = load_emissions(
            "Entity,Code,Year,Annual CO2 emissions\nChile,chl,1990,50.0\n",
        )
        .unwrap();
        assert_eq!(loaded.records.len(), 1);
        let record = &loaded.records[0];
        assert_eq!(record.country, "Chile");
        assert_eq!(record.code, "CHL");
        assert_eq!(record.year, 1990);
        assert_eq!(record.co2, Some(50.0));
        assert!(!loaded.report.has_drops());
    }

    #[test]
    fn drops_non_iso3_codes() {
        let loaded = load_emissions(
            "Entity,Code,Year,Annual CO2 emissions\n\
             United States,us,2000,100.0\n\
             World,,2000,999.0\n\
             Chile,CHL,2000,50.0\n",
        )
        .unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0].code, "CHL");
        assert_eq!(loaded.report.dropped_bad_code, 2);
        assert!(loaded.report.has_drops());
    }

    #[test]
    fn empty_quantity_cell_loads_as_absent() {
        let loaded = load_emissions(
            "Entity,Code,Year,Annual CO2 emissions\n\
             Chile,CHL,1990,50.0\n\
             Chile,CHL,1991,\n",
        )
        .unwrap();
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.records[1].co2, None);
        assert_eq!(loaded.report.absent_values, 1);
    }

    #[test]
    fn non_finite_quantity_loads_as_absent() {
        let loaded = load_emissions(
            "Entity,Code,Year,Annual CO2 emissions\n\
             Chile,CHL,1990,50.0\n\
             Chile,CHL,1991,NaN\n\
             Chile,CHL,1992,70.0\n\
             Chile,CHL,1993,inf\n\
             Chile,CHL,1994,-inf\n",
        )
        .unwrap();
        assert_eq!(loaded.records.len(), 5);
        assert_eq!(loaded.records[1].co2, None);
        assert_eq!(loaded.records[3].co2, None);
        assert_eq!(loaded.records[4].co2, None);
        assert_eq!(loaded.report.absent_values, 3);
        assert_eq!(loaded.report.dropped_negative, 0);
        // Absent values are kept, not dropped.
        assert!(!loaded.report.has_drops());

        // A non-finite cell must behave exactly like an empty one
        // downstream: skipped by the series, never poisoning the total.
        let (dataset, _) = loaded.into_dataset();
        let cumulative = dataset.cumulative("Chile");
        assert_eq!(
            cumulative.iter().collect::<Vec<_>>(),
            vec![(1990, 50.0, 50.0), (1992, 70.0, 120.0)]
        );
        assert!(dataset.global_trend().values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let loaded = load_emissions(
            "Entity,Code,Year,Annual CO2 emissions\n\
             Chile,CHL,1990,-5.0\n\
             Chile,CHL,1991,5.0\n",
        )
        .unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0].year, 1991);
        assert_eq!(loaded.report.dropped_negative, 1);
    }

    #[test]
    fn ambiguous_quantity_column_fails() {
        let result = load_emissions(
            "Entity,Code,Year,Annual CO2 emissions,Population\nChile,CHL,1990,50.0,19.0\n",
        );
        match result {
            Err(EmissionsError::Schema(msg)) => {
                assert!(msg.contains("Annual CO2 emissions"));
                assert!(msg.contains("Population"));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn missing_quantity_column_fails() {
        let result = load_emissions("Entity,Code,Year\nChile,CHL,1990\n");
        assert!(matches!(result, Err(EmissionsError::Schema(_))));
    }

    #[test]
    fn geometry_duplicates_keep_first_occurrence() {
        let geometry = "\
ISO_A3,NAME,geometry
CHL,Chile,POLYGON((1 1))
CHL,Chile (again),POLYGON((9 9))
";
        let loaded = from_readers(
            geometry.as_bytes(),
            "Entity,Code,Year,co2\nChile,CHL,1990,1.0\n".as_bytes(),
        )
        .unwrap();
        assert_eq!(loaded.geometries.len(), 1);
        assert_eq!(loaded.geometries[0].country, "Chile");
        assert_eq!(loaded.report.geometry_duplicates, 1);
    }

    #[test]
    fn missing_file_is_unavailable() {
        let config = DataSourceConfig::new("/nonexistent/geometry.csv", "/nonexistent/co2.csv");
        let result = load(&config);
        assert!(matches!(
            result,
            Err(EmissionsError::DataSourceUnavailable { .. })
        ));
    }

    #[test]
    fn unparseable_year_is_dropped() {
        let loaded = load_emissions(
            "Entity,Code,Year,co2\nChile,CHL,not-a-year,1.0\nChile,CHL,1990,1.0\n",
        )
        .unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.report.dropped_bad_year, 1);
    }
}
