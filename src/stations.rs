//! Seismic station catalog.
//!
//! Whitespace-delimited lines: `NET STA <col3> <col4> LAT LON ...`.
//! Lines containing `#` are comments.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{debug, instrument, warn};

use crate::errors::SummaryError;
use crate::geodesy::{Coordinate, DistanceUnit, great_circle_distance};

/// Station locations keyed by network + station code (e.g. `CIPASC`).
#[derive(Debug, Clone, Default)]
pub struct StationCatalog {
    stations: HashMap<String, Coordinate>,
}

impl StationCatalog {
    /// Load the catalog from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read. Malformed lines are
    /// skipped with a warning.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SummaryError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SummaryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::parse(&content);
        debug!("loaded {} stations", catalog.len());
        Ok(catalog)
    }

    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut catalog = Self::default();
        for (line_no, line) in content.lines().enumerate() {
            if line.contains('#') || line.trim().is_empty() {
                continue;
            }
            match parse_station_line(line) {
                Ok((id, location)) => {
                    catalog.stations.insert(id, location);
                }
                Err(e) => warn!("skipping station line {}: {e}: {line:?}", line_no + 1),
            }
        }
        catalog
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Number of stations within `radius_km` (inclusive) of `reference`.
    #[must_use]
    pub fn count_within(&self, reference: Coordinate, radius_km: f64) -> usize {
        self.stations
            .values()
            .filter(|&&location| great_circle_distance(reference, location, DistanceUnit::Kilometers) <= radius_km)
            .count()
    }
}

fn parse_station_line(line: &str) -> Result<(String, Coordinate), String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 6 {
        return Err(format!("expected at least 6 columns, got {}", fields.len()));
    }

    let lat = fields[4].parse::<f64>().map_err(|e| format!("invalid latitude: {e}"))?;
    let lon = fields[5].parse::<f64>().map_err(|e| format!("invalid longitude: {e}"))?;

    Ok((format!("{}{}", fields[0], fields[1]), Coordinate::new(lat, lon)))
}
