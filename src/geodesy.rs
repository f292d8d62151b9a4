//! Geodesy primitives.
//!
//! Great-circle distance, forward bearing, compass octants and a
//! ray-casting point-in-polygon test. Two earth radii are in use: the
//! law-of-cosines distance (accuracy comparisons, station counts) uses
//! 6371.0 km, the haversine distance (city ranking) uses 6371.009 km.

use std::fmt;
use std::str::FromStr;

use crate::errors::SummaryError;

/// Earth radius in kilometers for the law-of-cosines distance.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Mean earth radius in kilometers for haversine calculations.
pub const HAVERSINE_RADIUS_KM: f64 = 6371.009;

/// Kilometers per statute mile.
pub const KM_PER_MILE: f64 = 1.60934;

/// An immutable latitude/longitude pair in decimal degrees.
///
/// No normalization is applied; values are assumed to lie well away
/// from the antimeridian and the poles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Returns the coordinate as an `[lon, lat]` position.
    #[must_use]
    pub fn lon_lat(self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

impl TryFrom<&[f64]> for Coordinate {
    type Error = SummaryError;

    fn try_from(values: &[f64]) -> Result<Self, Self::Error> {
        match values {
            [lat, lon] => Ok(Self::new(*lat, *lon)),
            _ => Err(SummaryError::validation(format!(
                "coordinate requires exactly 2 components (lat, lon), got {}",
                values.len()
            ))),
        }
    }
}

/// Parses a single `"lat,lon"` token.
impl FromStr for Coordinate {
    type Err = SummaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s.trim().split_once(',').ok_or_else(|| {
            SummaryError::validation(format!("expected 'lat,lon' coordinate, got '{s}'"))
        })?;

        let parse = |v: &str| {
            v.trim()
                .parse::<f64>()
                .map_err(|e| SummaryError::validation(format!("invalid number in '{s}': {e}")))
        };

        Ok(Self::new(parse(lat)?, parse(lon)?))
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.lat, self.lon)
    }
}

/// Unit for great-circle distance results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    Kilometers,
    Miles,
}

/// Great-circle distance using the spherical law of cosines.
///
/// The cosine term is clamped to `[-1, 1]` so nearly coincident points
/// never produce NaN; identical points short-circuit to zero.
#[must_use]
pub fn great_circle_distance(a: Coordinate, b: Coordinate, unit: DistanceUnit) -> f64 {
    if a == b {
        return 0.0;
    }

    let theta1 = (90.0 - a.lat).to_radians();
    let theta2 = (90.0 - b.lat).to_radians();
    let theta3 = (a.lon - b.lon).to_radians();

    let cos_angle = theta1.cos() * theta2.cos() + theta1.sin() * theta2.sin() * theta3.cos();
    let dist_km = cos_angle.clamp(-1.0, 1.0).acos() * EARTH_RADIUS_KM;

    match unit {
        DistanceUnit::Kilometers => dist_km,
        DistanceUnit::Miles => km_to_miles(dist_km),
    }
}

/// Calculate the great-circle distance between two points using the haversine formula.
///
/// Returns distance in kilometers.
#[must_use]
pub fn haversine_distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = lat1 - lat2;
    let delta_lon = (a.lon - b.lon).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    HAVERSINE_RADIUS_KM * c
}

/// Initial compass bearing from `from` to `to`, normalized to `[0, 360)`.
#[must_use]
pub fn initial_bearing(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let diff_lon = (to.lon - from.lon).to_radians();

    let x = diff_lon.sin() * lat2.cos();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * diff_lon.cos();

    (x.atan2(y).to_degrees() + 360.0) % 360.0
}

/// One of the eight compass octants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompassOctant {
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
    N,
}

impl CompassOctant {
    const BINS: [Self; 8] = [
        Self::NE,
        Self::E,
        Self::SE,
        Self::S,
        Self::SW,
        Self::W,
        Self::NW,
        Self::N,
    ];

    /// Classify a bearing into a 45° bin; bins start 22.5° east of north
    /// and include their lower edge.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_bearing(bearing_deg: f64) -> Self {
        let shifted = (bearing_deg - 22.5).rem_euclid(360.0);
        let index = ((shifted / 45.0) as usize).min(Self::BINS.len() - 1);
        Self::BINS[index]
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NE => "NE",
            Self::E => "E",
            Self::SE => "SE",
            Self::S => "S",
            Self::SW => "SW",
            Self::W => "W",
            Self::NW => "NW",
            Self::N => "N",
        }
    }
}

impl fmt::Display for CompassOctant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Ray-casting point-in-polygon test over `(x, y)` vertices.
///
/// The ring does not need to be closed; the last vertex wraps to the
/// first. Horizontal edges never produce a crossing.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn point_in_polygon(x: f64, y: f64, polygon: &[(f64, f64)]) -> bool {
    let n = polygon.len();
    if n == 0 {
        return false;
    }

    let mut inside = false;
    let (mut p1x, mut p1y) = polygon[0];

    for i in 0..=n {
        let (p2x, p2y) = polygon[i % n];

        if y > p1y.min(p2y) && y <= p1y.max(p2y) && x <= p1x.max(p2x) {
            let crosses = if p1x == p2x {
                true
            } else if p1y == p2y {
                false
            } else {
                let x_intersect = (y - p1y) * (p2x - p1x) / (p2y - p1y) + p1x;
                x <= x_intersect
            };
            if crosses {
                inside = !inside;
            }
        }

        (p1x, p1y) = (p2x, p2y);
    }

    inside
}

/// Rounds using the "round half up" tie-breaking rule.
///
/// `round_half_up(4.25, 1)` is `4.3` and `round_half_up(-4.35, 1)` is `-4.3`.
#[must_use]
pub fn round_half_up(num: f64, precision: i32) -> f64 {
    let multiplier = 10f64.powi(precision);
    (num * multiplier + 0.5).floor() / multiplier
}

/// Rounds to `digits` decimals, taking the nearest decimal to the exact
/// binary value.
///
/// Unlike [`round_half_up`], `0.35` (stored just below the tie) rounds to
/// `0.3`.
#[must_use]
pub fn round_nearest(num: f64, digits: usize) -> f64 {
    format!("{num:.digits$}").parse().unwrap_or(num)
}

#[must_use]
pub fn km_to_miles(km: f64) -> f64 {
    km / KM_PER_MILE
}
