//! Data models for early-warning event records.
//!
//! The `Raw*` structures mirror the event JSON as delivered; numeric
//! fields may arrive either as JSON numbers or as numeric strings.
//! [`EventRecord`] is the validated, typed form the rest of the crate uses.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::contour::{Contour, mmi_from_leading_digit, parse_polygon};
use crate::errors::SummaryError;
use crate::geodesy::Coordinate;
use crate::timeline::{parse_timestamp, seconds_between};

/// A JSON value that is either a number or a string holding one.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Number(f64),
    Text(String),
}

impl NumberOrString {
    /// Numeric value of the field.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a string value is not a number.
    pub fn to_f64(&self, field: &str) -> Result<f64, SummaryError> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| SummaryError::validation(format!("{field}: expected a number, got '{s}'"))),
        }
    }

    /// Integer value of the field.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the value is not a whole number.
    #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
    pub fn to_i64(&self, field: &str) -> Result<i64, SummaryError> {
        match self {
            Self::Number(n) if n.fract() == 0.0 => Ok(*n as i64),
            Self::Number(n) => Err(SummaryError::validation(format!(
                "{field}: expected an integer, got {n}"
            ))),
            Self::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| SummaryError::validation(format!("{field}: expected an integer, got '{s}'"))),
        }
    }
}

impl fmt::Display for NumberOrString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Top-level event JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    /// Alert revisions; ordered by `version` after parsing
    #[serde(default)]
    pub shakealert_event_messages: Vec<RawAlertMessage>,

    /// Revision carrying the largest magnitude estimate
    pub peak_mag_sa_message: Option<RawAlertMessage>,

    /// Authoritative catalog event ID
    pub event_id: Option<String>,

    /// Post-event review announcement
    pub review_text: Option<String>,

    /// Wireless Emergency Alert delivery report
    pub wea_report: Option<String>,

    /// Independently determined origin
    pub preferred_origin: Option<RawOrigin>,
}

/// One alert revision as delivered.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAlertMessage {
    pub version: NumberOrString,
    pub message_id: Option<NumberOrString>,
    pub mag: NumberOrString,
    pub lat: NumberOrString,
    pub lon: NumberOrString,
    pub depth: NumberOrString,
    pub num_stations: Option<NumberOrString>,

    /// Estimated origin time
    pub origin_time: Option<String>,

    /// Time the alert was sent
    pub timestamp: String,

    pub ground_motion_contours: Option<Vec<RawContour>>,
}

/// One ground-motion contour as delivered.
#[derive(Debug, Clone, Deserialize)]
pub struct RawContour {
    pub mmi: NumberOrString,
    pub pga: Option<NumberOrString>,
    pub pgv: Option<NumberOrString>,

    /// `"lat,lon lat,lon ..."`
    pub polygon: String,
}

/// Authoritative origin as delivered.
#[derive(Debug, Clone, Deserialize)]
pub struct RawOrigin {
    pub latitude: Option<NumberOrString>,
    pub longitude: Option<NumberOrString>,
    pub depth: Option<NumberOrString>,
    pub magnitude: Option<NumberOrString>,
    pub event_time: Option<String>,
    pub update_time: Option<String>,
}

/// Which alert revision a snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    Initial,
    PeakMagnitude,
    Final,
}

impl SnapshotKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::PeakMagnitude => "peak",
            Self::Final => "final",
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One revision of the evolving event estimate.
#[derive(Debug, Clone)]
pub struct AlertSnapshot {
    pub kind: SnapshotKind,
    pub message_id: Option<String>,
    pub magnitude: f64,
    pub location: Coordinate,
    pub depth_km: f64,
    pub origin_time: Option<NaiveDateTime>,
    pub sent: NaiveDateTime,
    pub num_stations: u32,
    pub contours: Vec<Contour>,
}

impl AlertSnapshot {
    /// Build a snapshot from a raw message.
    ///
    /// # Errors
    ///
    /// Returns an error on any malformed number, timestamp or contour.
    pub fn from_raw(kind: SnapshotKind, raw: &RawAlertMessage) -> Result<Self, SummaryError> {
        let num_stations = match &raw.num_stations {
            Some(n) => u32::try_from(n.to_i64("num_stations")?)
                .map_err(|_| SummaryError::validation(format!("num_stations out of range: {n}")))?,
            None => 0,
        };

        let contours = raw
            .ground_motion_contours
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(RawContour::to_contour)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            kind,
            message_id: raw.message_id.as_ref().map(ToString::to_string),
            magnitude: raw.mag.to_f64("mag")?,
            location: Coordinate::new(raw.lat.to_f64("lat")?, raw.lon.to_f64("lon")?),
            depth_km: raw.depth.to_f64("depth")?,
            origin_time: raw.origin_time.as_deref().map(parse_timestamp).transpose()?,
            sent: parse_timestamp(&raw.timestamp)?,
            num_stations,
            contours,
        })
    }
}

impl RawContour {
    /// Convert to a validated [`Contour`].
    ///
    /// The MMI goes through the leading-digit reduction.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad MMI, amplitude or polygon.
    pub fn to_contour(&self) -> Result<Contour, SummaryError> {
        let mmi = mmi_from_leading_digit(&self.mmi.to_string())?;
        let pga = self.pga.as_ref().map(|v| v.to_f64("pga")).transpose()?;
        let pgv = self.pgv.as_ref().map(|v| v.to_f64("pgv")).transpose()?;
        Contour::new(mmi, parse_polygon(&self.polygon)?, pga, pgv)
    }
}

/// Authoritative origin used as ground truth for accuracy comparisons.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthoritativeOrigin {
    pub location: Coordinate,
    pub depth_km: f64,
    pub magnitude: Option<f64>,
    pub origin_time: Option<NaiveDateTime>,
    pub update_time: Option<NaiveDateTime>,
}

impl AuthoritativeOrigin {
    /// Build from the raw origin; `None` when the epicenter or depth is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if a present field is malformed.
    pub fn from_raw(raw: &RawOrigin) -> Result<Option<Self>, SummaryError> {
        let (Some(lat), Some(lon), Some(depth)) = (&raw.latitude, &raw.longitude, &raw.depth) else {
            warn!("preferred origin lacks epicenter or depth; accuracy comparisons skipped");
            return Ok(None);
        };

        Ok(Some(Self {
            location: Coordinate::new(lat.to_f64("latitude")?, lon.to_f64("longitude")?),
            depth_km: depth.to_f64("depth")?,
            magnitude: raw.magnitude.as_ref().map(|m| m.to_f64("magnitude")).transpose()?,
            origin_time: raw.event_time.as_deref().map(parse_timestamp).transpose()?,
            update_time: raw.update_time.as_deref().map(parse_timestamp).transpose()?,
        }))
    }

    /// Seconds from origin to the last catalog update.
    #[must_use]
    pub fn time_to_origin(&self) -> Option<f64> {
        match (self.update_time, self.origin_time) {
            (Some(update), Some(origin)) => Some(seconds_between(update, origin)),
            _ => None,
        }
    }
}

/// A fully parsed event record.
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub event_id: String,
    pub initial: AlertSnapshot,
    pub peak: AlertSnapshot,
    pub final_alert: AlertSnapshot,
    pub review_text: Option<String>,
    pub wea_report: Option<String>,
    pub authoritative: Option<AuthoritativeOrigin>,
}

impl EventRecord {
    /// Parse an event record from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed, a required message is
    /// missing, or any field fails validation.
    pub fn from_json(json: &str) -> Result<Self, SummaryError> {
        let raw: RawEvent = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    /// Validate and type a raw event.
    ///
    /// Messages are ordered by numeric version; the lowest is the initial
    /// alert and the highest the final one.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::MissingData`] if there are no alert messages
    /// or no peak-magnitude message, or a validation error for bad fields.
    pub fn from_raw(raw: RawEvent) -> Result<Self, SummaryError> {
        let mut versioned = raw
            .shakealert_event_messages
            .iter()
            .map(|m| Ok((m.version.to_i64("version")?, m)))
            .collect::<Result<Vec<_>, SummaryError>>()?;
        versioned.sort_by_key(|(version, _)| *version);

        let (Some((first_version, first)), Some((last_version, last))) = (versioned.first(), versioned.last()) else {
            return Err(SummaryError::MissingData("no alert messages in event".into()));
        };
        debug!("initial message v{first_version}, final message v{last_version}");

        let peak = raw
            .peak_mag_sa_message
            .as_ref()
            .ok_or_else(|| SummaryError::MissingData("no peak magnitude message".into()))?;

        let initial = AlertSnapshot::from_raw(SnapshotKind::Initial, first)?;
        let peak = AlertSnapshot::from_raw(SnapshotKind::PeakMagnitude, peak)?;
        let final_alert = AlertSnapshot::from_raw(SnapshotKind::Final, last)?;

        let event_id = match raw.event_id.filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => format!("ew {}", final_alert.message_id.as_deref().unwrap_or("unknown")),
        };

        let authoritative = match &raw.preferred_origin {
            Some(origin) => AuthoritativeOrigin::from_raw(origin)?,
            None => None,
        };

        Ok(Self {
            event_id,
            initial,
            peak,
            final_alert,
            review_text: raw.review_text.filter(|s| !s.is_empty()),
            wea_report: raw.wea_report.filter(|s| !s.is_empty()),
            authoritative,
        })
    }

    /// The three snapshots in alert order.
    #[must_use]
    pub fn snapshots(&self) -> [&AlertSnapshot; 3] {
        [&self.initial, &self.peak, &self.final_alert]
    }
}
