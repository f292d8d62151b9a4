//! Contour selection and display filtering.
//!
//! Every snapshot is judged against its own magnitude: events at or above
//! the large-event boundary use the alert MMI, smaller events the felt MMI.

use crate::contour::{Contour, by_mmi};

/// Magnitude-dependent contour threshold rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourFilter {
    /// Magnitude at or above which an event counts as large
    pub mag_threshold: f64,
    /// Minimum MMI shown for small events
    pub min_mmi_small: u8,
    /// Minimum MMI shown for large events
    pub min_mmi_large: u8,
}

impl Default for ContourFilter {
    fn default() -> Self {
        Self {
            mag_threshold: 5.0,
            min_mmi_small: 3,
            min_mmi_large: 4,
        }
    }
}

impl ContourFilter {
    /// Minimum MMI that applies to an event of this magnitude.
    #[must_use]
    pub fn min_mmi_for(&self, magnitude: f64) -> u8 {
        if magnitude >= self.mag_threshold {
            self.min_mmi_large
        } else {
            self.min_mmi_small
        }
    }

    /// Check if a contour is drawn for an event of this magnitude.
    #[must_use]
    pub fn matches(&self, contour: &Contour, magnitude: f64) -> bool {
        contour.mmi() >= self.min_mmi_for(magnitude)
    }

    /// Contours that meet the threshold, in their original order.
    #[must_use]
    pub fn filter<'a>(&self, contours: &'a [Contour], magnitude: f64) -> Vec<&'a Contour> {
        contours.iter().filter(|c| self.matches(c, magnitude)).collect()
    }

    /// Pick the single contour outlining the warning zone.
    ///
    /// Uses the contour at the threshold MMI when present, otherwise the
    /// weakest available one. When several contours share a level the
    /// last one listed wins.
    #[must_use]
    pub fn select_display<'a>(&self, contours: &'a [Contour], magnitude: f64) -> Option<&'a Contour> {
        let target = self.min_mmi_for(magnitude);
        let level = if contours.iter().any(|c| c.mmi() == target) {
            target
        } else {
            contours.iter().min_by(|a, b| by_mmi(a, b))?.mmi()
        };
        contours.iter().rfind(|c| c.mmi() == level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::tests::sample_contours;

    #[test]
    fn test_threshold_tiers() {
        let filter = ContourFilter::default();
        assert_eq!(filter.min_mmi_for(4.9), 3);
        assert_eq!(filter.min_mmi_for(5.0), 4);
        assert_eq!(filter.min_mmi_for(7.1), 4);
    }

    #[test]
    fn test_high_mag_filter() {
        let contours = sample_contours();
        let filtered = ContourFilter::default().filter(&contours, 5.0);
        let levels: Vec<u8> = filtered.iter().map(|c| c.mmi()).collect();
        assert_eq!(levels, vec![6, 5, 4]);
    }

    #[test]
    fn test_low_mag_filter() {
        let contours = sample_contours();
        let filtered = ContourFilter::default().filter(&contours, 4.9);
        assert!(filtered.iter().all(|c| c.mmi() >= 3));
        assert_eq!(filtered.len(), 4);
    }

    #[test]
    fn test_select_threshold_contour() {
        let contours = sample_contours();
        let filter = ContourFilter::default();
        assert_eq!(filter.select_display(&contours, 4.2).unwrap().mmi(), 3);
        assert_eq!(filter.select_display(&contours, 6.0).unwrap().mmi(), 4);
    }

    #[test]
    fn test_select_falls_back_to_weakest() {
        let contours: Vec<Contour> = sample_contours().into_iter().filter(|c| c.mmi() != 3).collect();
        let chosen = ContourFilter::default().select_display(&contours, 4.2).unwrap();
        assert_eq!(chosen.mmi(), 2);

        let strong_only: Vec<Contour> = sample_contours().into_iter().filter(|c| c.mmi() >= 5).collect();
        let chosen = ContourFilter::default().select_display(&strong_only, 6.5).unwrap();
        assert_eq!(chosen.mmi(), 5);
    }

    #[test]
    fn test_select_empty() {
        assert!(ContourFilter::default().select_display(&[], 5.5).is_none());
    }

    #[test]
    fn test_snapshots_judged_independently() {
        let contours = sample_contours();
        let filter = ContourFilter::default();
        let initial = filter.select_display(&contours, 4.6).unwrap();
        let final_ = filter.select_display(&contours, 5.1).unwrap();
        assert_eq!(initial.mmi(), 3);
        assert_eq!(final_.mmi(), 4);
    }
}
