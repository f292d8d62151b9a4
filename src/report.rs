//! Summary assembly.
//!
//! Runs the event record through contour selection, accuracy comparison,
//! station counting, city ranking and intensity lookup, producing the
//! typed [`SummaryReport`] consumed by the output writers.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, info, instrument};

use crate::circles::{AlertCircles, alert_circle_radii};
use crate::cities::{ArrivalModel, CityCatalog, DEFAULT_CATEGORIES, RankedCity};
use crate::config::Settings;
use crate::contour::{Contour, strongest_first};
use crate::geodesy::{CompassOctant, Coordinate, DistanceUnit, great_circle_distance, initial_bearing};
use crate::intensity::{point_intensity, point_intensity_roman};
use crate::models::{AlertSnapshot, AuthoritativeOrigin, EventRecord, SnapshotKind};
use crate::selection::ContourFilter;
use crate::stations::StationCatalog;
use crate::timeline::seconds_between;

/// Inner station-count radius (km).
pub const NEAR_STATION_RADIUS_KM: f64 = 10.0;

/// Outer station-count radius (km).
pub const FAR_STATION_RADIUS_KM: f64 = 100.0;

/// How far a snapshot's epicenter sat from the authoritative one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationError {
    /// Epicentral offset in statute miles
    pub distance_mi: f64,
    /// Bearing from the authoritative epicenter to the snapshot's
    pub bearing_deg: f64,
    pub octant: CompassOctant,
}

impl LocationError {
    #[must_use]
    pub fn between(authoritative: Coordinate, estimate: Coordinate) -> Self {
        let bearing_deg = initial_bearing(authoritative, estimate);
        Self {
            distance_mi: great_circle_distance(authoritative, estimate, DistanceUnit::Miles),
            bearing_deg,
            octant: CompassOctant::from_bearing(bearing_deg),
        }
    }
}

/// One alert revision after contour selection.
#[derive(Debug, Clone)]
pub struct SnapshotSummary {
    pub kind: SnapshotKind,
    pub magnitude: f64,
    pub location: Coordinate,
    pub depth_km: f64,
    pub sent: NaiveDateTime,
    pub num_stations: u32,
    /// Single contour outlining the warning zone
    pub display_contour: Option<Contour>,
    /// Contours at or above the magnitude-dependent threshold
    pub drawn_contours: Vec<Contour>,
    /// Offset from the authoritative epicenter
    pub location_error: Option<LocationError>,
    /// Seconds from authoritative origin to this alert
    pub elapsed_s: Option<f64>,
    /// Estimated minus authoritative origin time, seconds
    pub origin_time_error_s: Option<f64>,
}

impl SnapshotSummary {
    fn new(snapshot: &AlertSnapshot, filter: &ContourFilter, authoritative: Option<&AuthoritativeOrigin>) -> Self {
        let display_contour = filter.select_display(&snapshot.contours, snapshot.magnitude).cloned();
        let drawn_contours: Vec<Contour> = filter
            .filter(&snapshot.contours, snapshot.magnitude)
            .into_iter()
            .cloned()
            .collect();

        debug!(
            snapshot = %snapshot.kind,
            magnitude = snapshot.magnitude,
            display_mmi = display_contour.as_ref().map(Contour::mmi),
            drawn = drawn_contours.len(),
            "contours selected"
        );

        Self {
            kind: snapshot.kind,
            magnitude: snapshot.magnitude,
            location: snapshot.location,
            depth_km: snapshot.depth_km,
            sent: snapshot.sent,
            num_stations: snapshot.num_stations,
            display_contour,
            drawn_contours,
            location_error: authoritative.map(|origin| LocationError::between(origin.location, snapshot.location)),
            elapsed_s: authoritative
                .and_then(|origin| origin.origin_time)
                .map(|origin_time| seconds_between(snapshot.sent, origin_time)),
            origin_time_error_s: snapshot
                .origin_time
                .zip(authoritative.and_then(|origin| origin.origin_time))
                .map(|(estimated, actual)| seconds_between(estimated, actual)),
        }
    }
}

/// Where distances, warning times and circles are measured from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferencePoint {
    pub location: Coordinate,
    pub depth_km: f64,
    /// Seconds from origin to the initial alert
    pub elapsed_s: f64,
    /// Whether the authoritative origin supplied the values
    pub authoritative: bool,
}

impl ReferencePoint {
    /// Authoritative epicenter and initial-alert delay when known,
    /// otherwise the initial alert's epicenter with the final depth and
    /// no delay.
    #[must_use]
    pub fn choose(initial: &SnapshotSummary, final_alert: &SnapshotSummary, authoritative: Option<&AuthoritativeOrigin>) -> Self {
        match (authoritative, initial.elapsed_s) {
            (Some(origin), Some(elapsed_s)) => Self {
                location: origin.location,
                depth_km: origin.depth_km,
                elapsed_s,
                authoritative: true,
            },
            _ => Self {
                location: initial.location,
                depth_km: final_alert.depth_km,
                elapsed_s: 0.0,
                authoritative: false,
            },
        }
    }
}

/// A ranked city with the final-alert intensity at its location.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyCity {
    pub city: RankedCity,
    pub mmi: u8,
    /// Roman numeral form of `mmi`
    pub intensity: Cow<'static, str>,
}

/// Everything the output writers need for one event.
#[derive(Debug, Clone)]
pub struct SummaryReport {
    pub event_id: String,
    pub review_text: Option<String>,
    pub wea_report: Option<String>,
    pub authoritative: Option<AuthoritativeOrigin>,
    /// Seconds from origin to the last authoritative update
    pub time_to_origin_s: Option<f64>,
    pub initial: SnapshotSummary,
    pub peak: SnapshotSummary,
    pub final_alert: SnapshotSummary,
    pub reference: ReferencePoint,
    pub stations_within_10km: usize,
    pub stations_within_100km: usize,
    pub cities: Vec<NearbyCity>,
    /// City categories left unfilled by the catalog
    pub unfilled_categories: Vec<String>,
    pub alert_circles: AlertCircles,
    /// Distance (km) the S-wave had covered when the first alert went out
    pub s_wave_radius_km: Option<f64>,
    pub created: DateTime<Utc>,
}

impl SummaryReport {
    /// Assemble the summary for one event.
    #[must_use]
    #[instrument(skip_all, fields(event_id = %event.event_id))]
    pub fn build(event: &EventRecord, cities: &CityCatalog, stations: &StationCatalog, settings: &Settings) -> Self {
        let filter = ContourFilter::from(settings);
        let velocity = settings.thresholds.s_wave_velocity;
        let authoritative = event.authoritative.as_ref();

        let [initial, peak, final_alert] = event
            .snapshots()
            .map(|snapshot| SnapshotSummary::new(snapshot, &filter, authoritative));

        let reference = ReferencePoint::choose(&initial, &final_alert, authoritative);
        debug!(?reference, "reference point chosen");

        // Station coverage needs only the authoritative epicenter, not its origin time.
        let station_center = authoritative.map_or(reference.location, |origin| origin.location);
        let stations_within_10km = stations.count_within(station_center, NEAR_STATION_RADIUS_KM);
        let stations_within_100km = stations.count_within(station_center, FAR_STATION_RADIUS_KM);

        let arrival = ArrivalModel {
            depth_km: reference.depth_km,
            elapsed_s: reference.elapsed_s,
            s_wave_velocity: velocity,
        };
        let ranking = cities.rank(reference.location, &DEFAULT_CATEGORIES, &arrival);

        let intensity_order = strongest_first(&event.final_alert.contours);
        let nearby: Vec<NearbyCity> = ranking
            .cities
            .into_iter()
            .map(|city| NearbyCity {
                mmi: point_intensity(&intensity_order, city.location),
                intensity: point_intensity_roman(&intensity_order, city.location),
                city,
            })
            .collect();

        let alert_circles = AlertCircles {
            center: reference.location,
            circles: alert_circle_radii(initial.magnitude, reference.elapsed_s, velocity, reference.depth_km),
        };

        let s_wave_radius_km = initial.elapsed_s.map(|elapsed| elapsed * velocity);

        info!(
            cities = nearby.len(),
            stations_10km = stations_within_10km,
            stations_100km = stations_within_100km,
            "summary assembled"
        );

        Self {
            event_id: event.event_id.clone(),
            review_text: event.review_text.clone(),
            wea_report: event.wea_report.clone(),
            authoritative: event.authoritative.clone(),
            time_to_origin_s: authoritative.and_then(AuthoritativeOrigin::time_to_origin),
            initial,
            peak,
            final_alert,
            reference,
            stations_within_10km,
            stations_within_100km,
            cities: nearby,
            unfilled_categories: ranking.unfilled,
            alert_circles,
            s_wave_radius_km,
            created: Utc::now(),
        }
    }

    /// The three snapshots in alert order.
    #[must_use]
    pub fn snapshots(&self) -> [&SnapshotSummary; 3] {
        [&self.initial, &self.peak, &self.final_alert]
    }
}
