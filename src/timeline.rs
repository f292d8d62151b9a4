//! Timestamp reconciliation.
//!
//! Alert messages and authoritative origins carry timestamps in one of
//! three string encodings. All of them are naive UTC wall-clock times.

use chrono::NaiveDateTime;

use crate::errors::SummaryError;

/// Near-source S-wave velocity in km/s.
pub const S_WAVE_VELOCITY_KM_S: f64 = 3.55;

/// `2023-01-01T10:00:07.971`
const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// `2023-01-01 10:00:07.971`
const SPACED_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// `2023-01-01 10:00:07.971000 (UTC)`
const LABELED_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f (UTC)";

/// Parse a timestamp in any of the recognised encodings.
///
/// The encoding is picked from the string's shape: a `UTC` label wins,
/// then a `T` separator, then a space. Whole-second values (no
/// fractional part) are accepted by all three.
///
/// # Errors
///
/// Returns [`SummaryError::Timestamp`] if the string matches none of them.
pub fn parse_timestamp(input: &str) -> Result<NaiveDateTime, SummaryError> {
    let trimmed = input.trim();

    let format = if trimmed.contains("UTC") {
        LABELED_FORMAT
    } else if trimmed.contains('T') {
        ISO_FORMAT
    } else if trimmed.contains(' ') {
        SPACED_FORMAT
    } else {
        return Err(SummaryError::Timestamp {
            input: input.to_string(),
        });
    };

    NaiveDateTime::parse_from_str(trimmed, format).map_err(|_| SummaryError::Timestamp {
        input: input.to_string(),
    })
}

/// Signed number of seconds from `earlier` to `later` (`later - earlier`).
///
/// # Errors
///
/// Returns an error if either timestamp cannot be parsed.
pub fn elapsed_seconds(later: &str, earlier: &str) -> Result<f64, SummaryError> {
    let later = parse_timestamp(later)?;
    let earlier = parse_timestamp(earlier)?;
    Ok(seconds_between(later, earlier))
}

/// Signed `later - earlier` in fractional seconds.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn seconds_between(later: NaiveDateTime, earlier: NaiveDateTime) -> f64 {
    let delta = later - earlier;
    delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) / 1e9
}

/// Radius in km reached by the S-wave front when the alert went out.
///
/// Depth is ignored: this is the straight-line distance travelled by `alert_time`.
///
/// # Errors
///
/// Returns an error if either timestamp cannot be parsed.
pub fn s_wave_radius(alert_time: &str, origin_time: &str, velocity_km_s: f64) -> Result<f64, SummaryError> {
    let dt = elapsed_seconds(alert_time, origin_time)?;
    Ok(dt * velocity_km_s)
}

/// Format as `2023-01-01 10:00:07.971000 (UTC)` for report text.
#[must_use]
pub fn format_labeled(time: NaiveDateTime) -> String {
    time.format("%Y-%m-%d %H:%M:%S%.6f (UTC)").to_string()
}

/// Format as `2023-01-01 10:00:07.971000Z` for the summary export.
#[must_use]
pub fn format_zulu(time: NaiveDateTime) -> String {
    time.format("%Y-%m-%d %H:%M:%S%.6fZ").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::Timelike;

    use super::*;

    #[test]
    fn test_parse_all_encodings() {
        let iso = parse_timestamp("2023-01-01T10:00:07.971").unwrap();
        let spaced = parse_timestamp("2023-01-01 10:00:07.971").unwrap();
        let labeled = parse_timestamp("2023-01-01 10:00:07.971000 (UTC)").unwrap();

        assert_eq!(iso, spaced);
        assert_eq!(iso, labeled);
        assert_eq!(iso.nanosecond(), 971_000_000);
    }

    #[test]
    fn test_parse_whole_seconds() {
        let t = parse_timestamp("2023-01-01T10:00:07").unwrap();
        assert_eq!(t.second(), 7);
        assert_eq!(t.nanosecond(), 0);
    }

    #[test]
    fn test_parse_rejects_unknown_formats() {
        for bad in ["1672567207", "2023/01/01 10:00:07", "yesterday", "", "2023-01-01T10:00:07.971Z"] {
            let err = parse_timestamp(bad).unwrap_err();
            assert!(matches!(err, SummaryError::Timestamp { .. }), "{bad}");
        }
    }

    #[test]
    fn test_elapsed_preserves_sign() {
        let forward = elapsed_seconds("2023-01-01T10:00:07.971", "2023-01-01 10:00:00.000 (UTC)").unwrap();
        assert!((forward - 7.971).abs() < 1e-9);

        let backward = elapsed_seconds("2023-01-01 10:00:00.000", "2023-01-01T10:00:07.971").unwrap();
        assert!((backward + 7.971).abs() < 1e-9);
    }

    #[test]
    fn test_elapsed_across_minute() {
        let dt = elapsed_seconds("2023-01-01T10:01:02.500", "2023-01-01T10:00:59.750").unwrap();
        assert!((dt - 2.75).abs() < 1e-9);
    }

    #[test]
    fn test_s_wave_radius() {
        let r = s_wave_radius("2023-01-01T10:00:10.000", "2023-01-01T10:00:00.000", S_WAVE_VELOCITY_KM_S).unwrap();
        assert!((r - 35.5).abs() < 1e-9);

        assert!(s_wave_radius("garbage", "2023-01-01T10:00:00.000", 3.55).is_err());
    }

    #[test]
    fn test_formats() {
        let t = parse_timestamp("2023-01-01T10:00:07.971").unwrap();
        assert_eq!(format_labeled(t), "2023-01-01 10:00:07.971000 (UTC)");
        assert_eq!(format_zulu(t), "2023-01-01 10:00:07.971000Z");
        assert_eq!(parse_timestamp(&format_labeled(t)).unwrap(), t);
    }
}
