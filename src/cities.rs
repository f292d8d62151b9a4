//! Nearby-city catalog and ranking.
//!
//! The catalog is a CSV-like file of `name,lat,lon,population,category`
//! lines. Ranking fills an ordered list of category slots (e.g.
//! `C, B, B, A`) with the nearest city of each category, then reports
//! S-wave warning time and direction for every selected city.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{debug, instrument, warn};

use crate::errors::SummaryError;
use crate::geodesy::{CompassOctant, Coordinate, haversine_distance, initial_bearing};

/// Category slots requested for a summary: one C, two B, one A.
pub const DEFAULT_CATEGORIES: [&str; 4] = ["C", "B", "B", "A"];

/// Distance cap for a slot search; nothing on earth is farther.
const NO_MATCH_DISTANCE_KM: f64 = 1.0e6;

/// A populated place from the city catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct City {
    pub name: String,
    pub location: Coordinate,
    pub population: u64,
    pub category: String,
}

impl std::str::FromStr for City {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(',').collect();
        let [name, lat, lon, population, category] = parts.as_slice() else {
            return Err(format!(
                "city requires 5 values (name,lat,lon,population,category), got {}",
                parts.len()
            ));
        };

        let lat = lat.trim().parse::<f64>().map_err(|e| format!("invalid latitude: {e}"))?;
        let lon = lon.trim().parse::<f64>().map_err(|e| format!("invalid longitude: {e}"))?;
        let population = population
            .trim()
            .parse::<u64>()
            .map_err(|e| format!("invalid population: {e}"))?;

        Ok(Self {
            name: (*name).to_string(),
            location: Coordinate::new(lat, lon),
            population,
            category: category.trim().to_string(),
        })
    }
}

/// S-wave arrival model used for warning times.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrivalModel {
    /// Hypocenter depth (km)
    pub depth_km: f64,
    /// Seconds from origin to the alert being judged
    pub elapsed_s: f64,
    /// Near-source S-wave velocity (km/s)
    pub s_wave_velocity: f64,
}

impl ArrivalModel {
    /// Seconds of warning before S-wave arrival at a given epicentral
    /// distance; zero once the wave has already passed.
    #[must_use]
    pub fn time_to_alert(&self, distance_km: f64) -> f64 {
        let slant_km = self.depth_km.hypot(distance_km);
        let s_travel = slant_km / self.s_wave_velocity;
        (s_travel - self.elapsed_s).max(0.0)
    }
}

/// A city selected for the nearby-cities list.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCity {
    pub name: String,
    pub location: Coordinate,
    /// Category of the slot this city filled
    pub category: String,
    pub population: u64,
    pub distance_km: f64,
    /// Bearing from the city toward the epicenter
    pub bearing_deg: f64,
    pub octant: CompassOctant,
    pub time_to_alert_s: f64,
}

/// Result of a ranking query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CityRanking {
    /// Selected cities, nearest first
    pub cities: Vec<RankedCity>,
    /// Categories of slots no catalog entry could fill
    pub unfilled: Vec<String>,
    /// Whether the first slot was re-run with the second slot's category
    pub promoted: bool,
}

/// Loaded city catalog, in file order.
#[derive(Debug, Clone, Default)]
pub struct CityCatalog {
    cities: Vec<City>,
    by_name: HashMap<String, usize>,
}

impl CityCatalog {
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
        debug!("loaded {} cities", catalog.len());
        Ok(catalog)
    }

    /// Parse catalog text. Header lines (containing `Category`) and blank
    /// lines are ignored.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut catalog = Self::default();
        for (line_no, line) in content.lines().enumerate() {
            if line.contains("Category") || line.trim().is_empty() {
                continue;
            }
            match line.parse::<City>() {
                Ok(city) => catalog.insert(city),
                Err(e) => warn!("skipping city line {}: {e}: {line:?}", line_no + 1),
            }
        }
        catalog
    }

    /// Add a city. A repeated name replaces the earlier entry in place.
    pub fn insert(&mut self, city: City) {
        if let Some(&idx) = self.by_name.get(&city.name) {
            debug!("city '{}' listed twice, keeping the later entry", city.name);
            self.cities[idx] = city;
        } else {
            self.by_name.insert(city.name.clone(), self.cities.len());
            self.cities.push(city);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Nearest city per category slot, as `(catalog index, distance km)`.
    ///
    /// Slots are filled in order. A city already chosen by an earlier
    /// slot of the same category is skipped, so `B, B` yields the two
    /// nearest B cities. Ties keep the city listed first.
    #[must_use]
    pub fn nearest_by_category(&self, reference: Coordinate, categories: &[&str]) -> Vec<Option<(usize, f64)>> {
        let mut slots: Vec<Option<(usize, f64)>> = Vec::with_capacity(categories.len());

        for (slot, &category) in categories.iter().enumerate() {
            let mut best: Option<(usize, f64)> = None;

            for (idx, city) in self.cities.iter().enumerate() {
                if city.category != category {
                    continue;
                }
                let taken = categories[..slot]
                    .iter()
                    .zip(&slots)
                    .any(|(&earlier, chosen)| earlier == category && chosen.is_some_and(|(i, _)| i == idx));
                if taken {
                    continue;
                }

                let distance = haversine_distance(reference, city.location);
                if distance < best.map_or(NO_MATCH_DISTANCE_KM, |(_, d)| d) {
                    best = Some((idx, distance));
                }
            }

            slots.push(best);
        }

        slots
    }

    /// Rank nearby cities for the summary.
    ///
    /// If the second slot's city is strictly closer than the first slot's,
    /// the whole selection is redone once with the first slot asking for
    /// the second slot's category (`C, B, B, A` becomes `B, B, B, A`).
    /// The result is sorted by distance; unfilled slots are dropped and
    /// reported in [`CityRanking::unfilled`].
    #[must_use]
    pub fn rank(&self, reference: Coordinate, categories: &[&str], arrival: &ArrivalModel) -> CityRanking {
        let mut categories: Vec<&str> = categories.to_vec();
        let mut slots = self.nearest_by_category(reference, &categories);
        let mut promoted = false;

        let leading = match (slots.first(), slots.get(1)) {
            (Some(Some((_, first))), Some(Some((_, second)))) => Some((*first, *second)),
            _ => None,
        };

        if let Some((first, second)) = leading.filter(|(first, second)| first > second) {
            debug!(
                "promoting first slot from '{}' to '{}' ({second:.1} km < {first:.1} km)",
                categories[0], categories[1]
            );
            categories[0] = categories[1];
            slots = self.nearest_by_category(reference, &categories);
            promoted = true;
        }

        let mut ranking = CityRanking {
            promoted,
            ..CityRanking::default()
        };

        for (category, slot) in categories.iter().zip(slots) {
            let Some((idx, distance_km)) = slot else {
                warn!("no city of category '{category}' in catalog");
                ranking.unfilled.push((*category).to_string());
                continue;
            };

            let city = &self.cities[idx];
            let bearing_deg = initial_bearing(city.location, reference);
            ranking.cities.push(RankedCity {
                name: city.name.clone(),
                location: city.location,
                category: (*category).to_string(),
                population: city.population,
                distance_km,
                bearing_deg,
                octant: CompassOctant::from_bearing(bearing_deg),
                time_to_alert_s: arrival.time_to_alert(distance_km),
            });
        }

        ranking.cities.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        ranking
    }
}
