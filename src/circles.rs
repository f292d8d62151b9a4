//! Shake-front alert circles.
//!
//! Each circle marks how far the S-wave front had travelled at the surface
//! a given number of seconds after the first alert went out.

use crate::geodesy::Coordinate;

/// Latest shake-front time drawn at the lightest grey.
pub const MAX_GREY_SECONDS: f64 = 40.0;

/// Magnitude at which the 30 s circle is added.
const LARGE_EVENT_MAG: f64 = 6.0;

const SMALL_EVENT_BINS: [f64; 3] = [0.0, 10.0, 20.0];
const LARGE_EVENT_BINS: [f64; 4] = [0.0, 10.0, 20.0, 30.0];

/// One time-binned shake-front ring.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertCircle {
    /// Seconds after the initial alert
    pub time_s: f64,
    /// Surface radius of the S-wave front in meters
    pub radius_m: f64,
}

impl AlertCircle {
    /// Stroke color: crimson for the release-time circle, grey otherwise.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn color(&self) -> String {
        if self.time_s == 0.0 {
            "crimson".to_string()
        } else {
            time_to_grey(self.time_s)
        }
    }

    /// Feature id used in exports, e.g. `acircle_10.0`.
    #[must_use]
    pub fn feature_id(&self) -> String {
        format!("acircle_{:.1}", self.time_s)
    }

    #[must_use]
    pub fn label(&self) -> String {
        format!("{:.1} s", self.time_s)
    }
}

/// Circles drawn around an epicenter.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertCircles {
    pub center: Coordinate,
    pub circles: Vec<AlertCircle>,
}

/// Compute shake-front radii for the alert map.
///
/// `alert_delay_s` is the time from origin to the initial alert. The front
/// only breaks the surface once `(delay + t) * velocity` exceeds the depth;
/// before that the radius is zero.
#[must_use]
pub fn alert_circle_radii(initial_mag: f64, alert_delay_s: f64, s_wave_velocity: f64, depth_km: f64) -> Vec<AlertCircle> {
    let bins: &[f64] = if initial_mag < LARGE_EVENT_MAG {
        &SMALL_EVENT_BINS
    } else {
        &LARGE_EVENT_BINS
    };

    bins.iter()
        .map(|&time_s| {
            let travelled_km = (alert_delay_s + time_s) * s_wave_velocity;
            let radius_m = if travelled_km > depth_km {
                (travelled_km.powi(2) - depth_km.powi(2)).sqrt() * 1000.0
            } else {
                0.0
            };
            AlertCircle { time_s, radius_m }
        })
        .collect()
}

/// Grey hue for a shake-front time: darker near 0 s, lightest at 40 s and beyond.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn time_to_grey(duration_s: f64) -> String {
    let v = (duration_s.min(MAX_GREY_SECONDS) * 255.0 / MAX_GREY_SECONDS) as u8;
    format!("#{v:02x}{v:02x}{v:02x}")
}
