//! Ground-motion contour model.
//!
//! A contour bounds the region expected to feel at least a given
//! Modified Mercalli Intensity (MMI). Polygons are stored in
//! `(lat, lon)` order and must be closed rings.

use std::borrow::Cow;
use std::cmp::Ordering;

use geo::{Coord, LineString, Polygon, Validation};

use crate::errors::SummaryError;
use crate::geodesy::Coordinate;

/// A single MMI contour from one alert snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    mmi: u8,
    polygon: Vec<Coordinate>,
    pga: Option<f64>,
    pgv: Option<f64>,
}

impl Contour {
    /// Build a contour from a closed polygon.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the polygon is empty or its first
    /// and last coordinates differ.
    pub fn new(
        mmi: u8,
        polygon: Vec<Coordinate>,
        pga: Option<f64>,
        pgv: Option<f64>,
    ) -> Result<Self, SummaryError> {
        match (polygon.first(), polygon.last()) {
            (Some(first), Some(last)) if first == last => {}
            (None, _) | (_, None) => {
                return Err(SummaryError::validation(format!(
                    "MMI {mmi} contour polygon is empty"
                )));
            }
            _ => {
                return Err(SummaryError::validation(format!(
                    "MMI {mmi} contour polygon is not closed: first and last \
                     coordinate must be the same"
                )));
            }
        }

        Ok(Self {
            mmi,
            polygon,
            pga,
            pgv,
        })
    }

    #[must_use]
    pub fn mmi(&self) -> u8 {
        self.mmi
    }

    /// Peak ground acceleration estimate.
    #[must_use]
    pub fn pga(&self) -> Option<f64> {
        self.pga
    }

    /// Peak ground velocity estimate.
    #[must_use]
    pub fn pgv(&self) -> Option<f64> {
        self.pgv
    }

    #[must_use]
    pub fn intensity_color(&self) -> &'static str {
        intensity_color(f64::from(self.mmi))
    }

    /// Vertices as `(x, y)` = `(lon, lat)` pairs for planar tests.
    #[must_use]
    pub fn planar_ring(&self) -> Vec<(f64, f64)> {
        self.polygon.iter().map(|c| (c.lon, c.lat)).collect()
    }

    /// Export the polygon as a `[lon, lat]` ring for GeoJSON.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the ring has fewer than four
    /// positions, is not closed, or does not form a valid simple polygon.
    pub fn to_boundary_ring(&self) -> Result<Vec<[f64; 2]>, SummaryError> {
        let ring: Vec<[f64; 2]> = self.polygon.iter().map(|c| c.lon_lat()).collect();
        validate_ring(&ring).map_err(|reason| {
            SummaryError::validation(format!("MMI {} boundary ring {reason}", self.mmi))
        })?;
        Ok(ring)
    }
}

/// Orders contours by MMI level.
#[must_use]
pub fn by_mmi(a: &Contour, b: &Contour) -> Ordering {
    a.mmi.cmp(&b.mmi)
}

/// Contours sorted from greatest to least intensity.
#[must_use]
pub fn strongest_first(contours: &[Contour]) -> Vec<&Contour> {
    let mut sorted: Vec<&Contour> = contours.iter().collect();
    sorted.sort_by(|a, b| by_mmi(b, a));
    sorted
}

/// Parse a whitespace-delimited `"lat,lon lat,lon ..."` polygon string.
///
/// # Errors
///
/// Returns a validation error for any malformed coordinate token.
pub fn parse_polygon(raw: &str) -> Result<Vec<Coordinate>, SummaryError> {
    raw.split_whitespace().map(str::parse::<Coordinate>).collect()
}

/// Reduce a raw MMI value to an integer by keeping its first character.
///
/// Alert messages may encode MMI as `4`, `4.0` or `"4.6"`; each yields 4.
/// Two-digit levels collapse: `"10"` yields 1. Values 1 through 9 are
/// unaffected.
///
/// # Errors
///
/// Returns a validation error if the first character is not a digit.
pub fn mmi_from_leading_digit(raw: &str) -> Result<u8, SummaryError> {
    raw.trim()
        .chars()
        .next()
        .and_then(|c| c.to_digit(10))
        .and_then(|d| u8::try_from(d).ok())
        .ok_or_else(|| SummaryError::validation(format!("invalid MMI value '{raw}'")))
}

/// Truncate a fractional MMI toward zero.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn truncate_mmi(value: f64) -> i64 {
    value.trunc() as i64
}

/// Hex display color for an MMI level.
///
/// Fractional levels are truncated toward zero before lookup.
#[must_use]
pub fn intensity_color(mmi: f64) -> &'static str {
    match truncate_mmi(mmi) {
        i64::MIN..=1 => "#000000",
        2 => "#c8d0fd",
        3 => "#b3f3fe",
        4 => "#b0fff7",
        5 => "#afff93",
        6 => "#fefb3c",
        7 => "#f0c52f",
        8 => "#e58620",
        9 => "#da0201",
        10 => "#ab0101",
        _ => "#800000",
    }
}

/// Roman numeral label for an MMI level; level 1 reads `<II`.
///
/// Levels outside 1..=10 are passed through as their decimal text.
#[must_use]
pub fn intensity_roman_numeral(mmi: i64) -> Cow<'static, str> {
    let numeral = match mmi {
        1 => "<II",
        2 => "II",
        3 => "III",
        4 => "IV",
        5 => "V",
        6 => "VI",
        7 => "VII",
        8 => "VIII",
        9 => "IX",
        10 => "X",
        other => return Cow::Owned(other.to_string()),
    };
    Cow::Borrowed(numeral)
}

/// Decimal MMI label for tables; anything below 2 reads `<2`.
#[must_use]
pub fn intensity_number_string(mmi: i64) -> String {
    if mmi > 1 {
        mmi.to_string()
    } else {
        "<2".to_string()
    }
}

fn validate_ring(ring: &[[f64; 2]]) -> Result<(), &'static str> {
    if ring.len() < 4 {
        return Err("needs at least 4 positions");
    }
    if ring.first() != ring.last() {
        return Err("is not closed");
    }

    let mut exterior: Vec<Coord> = ring.iter().map(|&[x, y]| Coord { x, y }).collect();
    exterior.dedup();
    // first and last are equal, so a triangle needs four positions
    if exterior.len() < 4 {
        return Err("is degenerate");
    }

    let polygon = Polygon::new(LineString::new(exterior), Vec::new());
    if polygon.is_valid() {
        Ok(())
    } else {
        Err("is not a valid simple polygon")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// MMI 2..=6 contours around 40.39,-123.98, strongest first.
    pub(crate) fn sample_contours() -> Vec<Contour> {
        let rings = [
            (6, "40.4423,-123.9823 40.4284,-123.9383 40.3949,-123.9200 40.3614,-123.9383 40.3475,-123.9823 40.3614,-124.0263 40.3949,-124.0446 40.4284,-124.0263 40.4423,-123.9823"),
            (5, "40.5082,-123.9823 40.4749,-123.8770 40.3948,-123.8336 40.3148,-123.8773 40.2816,-123.9823 40.3148,-124.0873 40.3948,-124.1310 40.4749,-124.0876 40.5082,-123.9823"),
            (4, "40.8430,-123.9823 40.7110,-123.5643 40.3934,-123.3940 40.0773,-123.5682 39.9468,-123.9823 40.0773,-124.3964 40.3934,-124.5706 40.7110,-124.4003 40.8430,-123.9823"),
            (3, "41.6717,-123.9823 41.2916,-122.7807 40.3828,-122.3060 39.4861,-122.8125 39.1181,-123.9823 39.4861,-125.1521 40.3828,-125.6586 41.2916,-125.1839 41.6717,-123.9823"),
            (2, "42.8078,-123.9823 42.0786,-121.6837 40.3517,-120.8155 38.6679,-121.7972 37.9820,-123.9823 38.6679,-126.1674 40.3517,-127.1491 42.0786,-126.2809 42.8078,-123.9823"),
        ];
        rings
            .iter()
            .map(|(mmi, raw)| Contour::new(*mmi, parse_polygon(raw).unwrap(), Some(1.0), Some(0.1)).unwrap())
            .collect()
    }

    fn square() -> Vec<Coordinate> {
        vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 1.0),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(1.0, 0.0),
            Coordinate::new(0.0, 0.0),
        ]
    }

    #[test]
    fn test_open_polygon_rejected() {
        let mut open = square();
        open.pop();
        let err = Contour::new(4, open, None, None).unwrap_err();
        assert!(matches!(err, SummaryError::Validation(_)));
        assert!(Contour::new(4, Vec::new(), None, None).is_err());
    }

    #[test]
    fn test_ordering_by_mmi() {
        let contours = sample_contours();
        let min = contours.iter().min_by(|a, b| by_mmi(a, b)).unwrap();
        let max = contours.iter().max_by(|a, b| by_mmi(a, b)).unwrap();
        assert_eq!(min.mmi(), 2);
        assert_eq!(max.mmi(), 6);

        let mut shuffled = contours.clone();
        shuffled.reverse();
        let levels: Vec<u8> = strongest_first(&shuffled).iter().map(|c| c.mmi()).collect();
        assert_eq!(levels, vec![6, 5, 4, 3, 2]);
    }

    #[test]
    fn test_boundary_ring_swaps_axes() {
        for contour in sample_contours() {
            let ring = contour.to_boundary_ring().unwrap();
            let back: Vec<Coordinate> = ring.iter().map(|[lon, lat]| Coordinate::new(*lat, *lon)).collect();
            assert_eq!(back, contour.polygon);
        }
    }

    #[test]
    fn test_boundary_ring_rejects_bow_tie() {
        let bow_tie = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(1.0, 0.0),
            Coordinate::new(0.0, 1.0),
            Coordinate::new(0.0, 0.0),
        ];
        let contour = Contour::new(3, bow_tie, None, None).unwrap();
        assert!(contour.to_boundary_ring().is_err());
    }

    #[test]
    fn test_boundary_ring_rejects_non_finite() {
        let ring = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, f64::NAN),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(0.0, 0.0),
        ];
        let contour = Contour::new(3, ring, None, None).unwrap();
        assert!(contour.to_boundary_ring().is_err());
    }

    #[test]
    fn test_boundary_ring_rejects_short_ring() {
        let sliver = vec![Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0), Coordinate::new(0.0, 0.0)];
        let contour = Contour::new(3, sliver, None, None).unwrap();
        assert!(contour.to_boundary_ring().is_err());
    }

    #[test]
    fn test_boundary_ring_tolerates_repeated_vertex() {
        let mut ring = square();
        ring.insert(2, Coordinate::new(0.0, 1.0));
        let contour = Contour::new(3, ring, None, None).unwrap();
        assert!(contour.to_boundary_ring().is_ok());
    }

    #[test]
    fn test_parse_polygon() {
        let poly = parse_polygon(" 40.1,-123.2  40.2,-123.3\n40.1,-123.2 ").unwrap();
        assert_eq!(poly.len(), 3);
        assert_eq!(poly[1], Coordinate::new(40.2, -123.3));
        assert!(parse_polygon("40.1;-123.2").is_err());
    }

    #[test]
    fn test_mmi_leading_digit() {
        assert_eq!(mmi_from_leading_digit("4").unwrap(), 4);
        assert_eq!(mmi_from_leading_digit("4.6").unwrap(), 4);
        assert_eq!(mmi_from_leading_digit("9.0").unwrap(), 9);
        assert!(mmi_from_leading_digit("").is_err());
        assert!(mmi_from_leading_digit("IV").is_err());
    }

    #[test]
    fn test_mmi_leading_digit_collapses_ten() {
        // Known defect kept for compatibility: MMI 10 reads as 1.
        assert_eq!(mmi_from_leading_digit("10").unwrap(), 1);
        assert_eq!(truncate_mmi(10.7), 10);
    }

    #[test]
    fn test_intensity_color() {
        assert_eq!(intensity_color(0.0), "#000000");
        assert_eq!(intensity_color(1.0), "#000000");
        assert_eq!(intensity_color(4.0), "#b0fff7");
        assert_eq!(intensity_color(10.0), "#ab0101");
        assert_eq!(intensity_color(12.0), "#800000");
        assert_eq!(intensity_color(-0.5), "#000000");
    }

    #[test]
    fn test_fractional_intensity_color_truncates() {
        assert_eq!(intensity_color(6.9), "#fefb3c");
        assert_eq!(intensity_color(4.2), intensity_color(4.0));
        assert_eq!(intensity_color(10.7), "#ab0101");
        let contour = &sample_contours()[0];
        assert_eq!(contour.intensity_color(), intensity_color(6.99));
    }

    #[test]
    fn test_roman_numerals() {
        assert_eq!(intensity_roman_numeral(1), "<II");
        assert_eq!(intensity_roman_numeral(4), "IV");
        assert_eq!(intensity_roman_numeral(10), "X");
        // Unrecognized levels pass through untranslated.
        assert_eq!(intensity_roman_numeral(11), "11");
        assert_eq!(intensity_roman_numeral(0), "0");
    }

    #[test]
    fn test_number_string() {
        assert_eq!(intensity_number_string(1), "<2");
        assert_eq!(intensity_number_string(0), "<2");
        assert_eq!(intensity_number_string(5), "5");
    }
}
