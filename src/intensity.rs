//! Intensity lookup at a point.

use std::borrow::Cow;

use crate::contour::{Contour, intensity_roman_numeral};
use crate::geodesy::{Coordinate, point_in_polygon};

/// MMI reported for points outside every contour.
pub const BELOW_MINIMUM_MMI: u8 = 1;

/// Intensity at `point`, testing contours in the given order.
///
/// `contours` must run from greatest to least intensity (see
/// [`crate::contour::strongest_first`]); the first polygon containing the
/// point decides. Out-of-order input yields a wrong answer, not an error.
#[must_use]
pub fn point_intensity(contours: &[&Contour], point: Coordinate) -> u8 {
    contours
        .iter()
        .find(|c| point_in_polygon(point.lon, point.lat, &c.planar_ring()))
        .map_or(BELOW_MINIMUM_MMI, |c| c.mmi())
}

/// Roman numeral form of [`point_intensity`]; outside all contours reads `<II`.
#[must_use]
pub fn point_intensity_roman(contours: &[&Contour], point: Coordinate) -> Cow<'static, str> {
    intensity_roman_numeral(i64::from(point_intensity(contours, point)))
}
