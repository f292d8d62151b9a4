//! Output writers for event summaries.
//!
//! Supports a human-readable text report and the summary GeoJSON export.

use std::io::{self, Write};

use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};
use serde::Serialize;
use tracing::info;

use crate::circles::AlertCircle;
use crate::contour::{Contour, intensity_number_string, intensity_roman_numeral};
use crate::errors::SummaryError;
use crate::geodesy::{Coordinate, km_to_miles, round_half_up, round_nearest};
use crate::models::SnapshotKind;
use crate::report::{NearbyCity, SnapshotSummary, SummaryReport};
use crate::timeline::{format_labeled, format_zulu};

/// Document type tag of the summary export.
pub const SUMMARY_TYPE: &str = "USGSEarlyWarningSummary";

/// Version of the summary export layout.
pub const SUMMARY_VERSION: &str = "1.0";

/// Radius of the initial-location marker (m).
const LOCATION_MARKER_RADIUS_M: f64 = 5000.0;

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Plain-text report (default)
    #[default]
    Human,
    /// Summary GeoJSON document
    Json,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown format: {s} (expected: human, json)")),
        }
    }
}

/// Properties attached to each feature kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureProperties {
    Marker {
        title: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        icon: Option<String>,
    },
    Ring {
        name: String,
        stroke: String,
        fill: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pga: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pgv: Option<f64>,
    },
    Circle {
        name: String,
        radius: f64,
        radiusunits: String,
        circletime: f64,
        tunits: String,
        color: String,
        #[serde(rename = "fill-opacity")]
        fill_opacity: f64,
    },
    City {
        name: String,
        citydist: f64,
        warning_time: f64,
        mmi: u8,
    },
}

/// Per-alert properties of an alert collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertProperties {
    pub elapsed: Option<f64>,
    pub magnitude: f64,
    pub num_stations: u32,
    /// Bearing from the authoritative epicenter, whole degrees
    pub location_azimuth_error: Option<i64>,
    /// Epicentral offset in miles
    pub location_distance_error: Option<f64>,
    pub caption: String,
}

/// Event-level properties of the summary.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryProperties {
    pub id: String,
    pub time: String,
    pub elapsed: Option<f64>,
    pub epicenter: Geometry,
    pub depth: f64,
    pub magnitude: Option<f64>,
    /// Position relative to the nearest listed city
    pub title: Option<String>,
    pub num_stations_10km: usize,
    pub num_stations_100km: usize,
    pub created: String,
    pub announcement: Option<String>,
    pub wea_report: Option<String>,
}

/// Top-level summary export document.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryDocument {
    #[serde(rename = "type")]
    pub type_: &'static str,
    pub version: &'static str,
    pub properties: SummaryProperties,
    pub cities: FeatureCollection,
    pub alerts: Vec<FeatureCollection>,
}

impl SummaryDocument {
    /// Build the export document.
    ///
    /// Returns `Ok(None)` when there is no authoritative origin time to
    /// anchor the summary.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a drawn contour has a malformed ring.
    pub fn from_report(report: &SummaryReport) -> Result<Option<Self>, SummaryError> {
        let Some((origin, origin_time)) = report
            .authoritative
            .as_ref()
            .and_then(|o| o.origin_time.map(|t| (o, t)))
        else {
            info!(event_id = %report.event_id, "no authoritative origin; summary export skipped");
            return Ok(None);
        };

        let epicenter = epicenter_feature(origin.location)?;

        let properties = SummaryProperties {
            id: report.event_id.clone(),
            time: format_zulu(origin_time),
            elapsed: report.time_to_origin_s,
            epicenter: point(origin.location),
            depth: origin.depth_km,
            magnitude: origin.magnitude.map(|m| round_half_up(m, 1)),
            title: title(report),
            num_stations_10km: report.stations_within_10km,
            num_stations_100km: report.stations_within_100km,
            created: report.created.format("%Y-%m-%d %H:%M:%S (UTC)").to_string(),
            announcement: report.review_text.clone(),
            wea_report: report.wea_report.clone(),
        };

        let city_features = report
            .cities
            .iter()
            .map(city_feature)
            .collect::<Result<Vec<_>, _>>()?;

        let alerts = vec![
            initial_collection(report, &epicenter)?,
            contour_collection(
                "maxMAlertCollection",
                &report.peak,
                &epicenter,
                contour_caption("the peak magnitude estimate"),
            )?,
            contour_collection(
                "finalAlertCollection",
                &report.final_alert,
                &epicenter,
                contour_caption("the final alert"),
            )?,
        ];

        Ok(Some(Self {
            type_: SUMMARY_TYPE,
            version: SUMMARY_VERSION,
            properties,
            cities: collection("cityCollection", None, city_features)?,
            alerts,
        }))
    }
}

/// Headline position of the epicenter, e.g. `9.7 mi SE of Rio Dell`.
#[must_use]
pub fn title(report: &SummaryReport) -> Option<String> {
    report.cities.first().map(|nearest| {
        let city = &nearest.city;
        format!("{:.1} mi {} of {}", km_to_miles(city.distance_km), city.octant, city.name)
    })
}

fn json_object<T: Serialize>(value: &T) -> Result<JsonObject, SummaryError> {
    match serde_json::to_value(value)? {
        JsonValue::Object(map) => Ok(map),
        other => Err(SummaryError::validation(format!("expected a JSON object, got {other}"))),
    }
}

fn point(location: Coordinate) -> Geometry {
    Geometry::new(Value::Point(location.lon_lat().to_vec()))
}

fn contour_polygon(contour: &Contour) -> Result<Geometry, SummaryError> {
    let ring = contour.to_boundary_ring()?;
    Ok(Geometry::new(Value::Polygon(vec![
        ring.iter().map(|position| position.to_vec()).collect(),
    ])))
}

fn feature(id: impl Into<String>, geometry: Geometry, properties: &FeatureProperties) -> Result<Feature, SummaryError> {
    Ok(Feature {
        bbox: None,
        geometry: Some(geometry),
        id: Some(Id::String(id.into())),
        properties: Some(json_object(properties)?),
        foreign_members: None,
    })
}

fn collection(id: &str, properties: Option<&AlertProperties>, features: Vec<Feature>) -> Result<FeatureCollection, SummaryError> {
    let mut members = JsonObject::new();
    members.insert("id".into(), JsonValue::from(id));
    if let Some(properties) = properties {
        members.insert("properties".into(), JsonValue::Object(json_object(properties)?));
    }

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(members),
    })
}

fn epicenter_feature(location: Coordinate) -> Result<Feature, SummaryError> {
    feature(
        "Epicenter",
        point(location),
        &FeatureProperties::Marker {
            title: "Earthquake Epicenter".into(),
            icon: Some("epicenter".into()),
        },
    )
}

fn city_feature(nearby: &NearbyCity) -> Result<Feature, SummaryError> {
    let city = &nearby.city;
    feature(
        city.name.clone(),
        point(city.location),
        &FeatureProperties::City {
            name: city.name.clone(),
            citydist: city.distance_km,
            warning_time: city.time_to_alert_s,
            mmi: nearby.mmi,
        },
    )
}

fn circle_feature(center: Coordinate, circle: &AlertCircle) -> Result<Feature, SummaryError> {
    feature(
        circle.feature_id(),
        point(center),
        &FeatureProperties::Circle {
            name: circle.label(),
            radius: circle.radius_m,
            radiusunits: "m".into(),
            circletime: circle.time_s,
            tunits: "s".into(),
            color: circle.color(),
            fill_opacity: 0.0,
        },
    )
}

fn ring_feature(id: String, name: String, stroke: &str, contour: &Contour) -> Result<Feature, SummaryError> {
    feature(
        id,
        contour_polygon(contour)?,
        &FeatureProperties::Ring {
            name,
            stroke: stroke.into(),
            fill: "transparent".into(),
            pga: contour.pga(),
            pgv: contour.pgv(),
        },
    )
}

#[allow(clippy::cast_possible_truncation)]
fn alert_properties(snapshot: &SnapshotSummary, caption: String) -> AlertProperties {
    AlertProperties {
        elapsed: snapshot.elapsed_s,
        magnitude: round_nearest(snapshot.magnitude, 1),
        num_stations: snapshot.num_stations,
        location_azimuth_error: snapshot.location_error.map(|e| e.bearing_deg.round_ties_even() as i64),
        location_distance_error: snapshot.location_error.map(|e| round_nearest(e.distance_mi, 1)),
        caption,
    }
}

fn initial_caption(initial: &SnapshotSummary) -> String {
    let zone = match &initial.display_contour {
        Some(contour) if contour.mmi() >= 4 => {
            format!("Polygon shows estimated MMI {} shaking intensity area.", contour.mmi())
        }
        Some(_) => "Polygon approximates the outer range for felt ground motion.".to_string(),
        None => "No intensity polygon was issued.".to_string(),
    };
    format!(
        "Initial alert location (black dot). Star is the authoritative epicenter. {zone} \
         If shown, the red circle is the front of peak shaking when the message was released. \
         Shaking takes 10 s to expand from circle to circle."
    )
}

fn contour_caption(estimate: &str) -> String {
    format!(
        "Polygons show shaking intensity contours for {estimate}. \
         Shaking of MMI 3 or less is often not felt. Star shows the authoritative epicenter."
    )
}

fn initial_collection(report: &SummaryReport, epicenter: &Feature) -> Result<FeatureCollection, SummaryError> {
    let initial = &report.initial;

    let marker = feature(
        "SAinitloc",
        point(initial.location),
        &FeatureProperties::Circle {
            name: "Initial alert location".into(),
            radius: LOCATION_MARKER_RADIUS_M,
            radiusunits: "m".into(),
            circletime: 0.0,
            tunits: "s".into(),
            color: "#000000".into(),
            fill_opacity: 1.0,
        },
    )?;

    let mut features = vec![marker, epicenter.clone()];

    if let Some(contour) = &initial.display_contour {
        features.push(ring_feature(
            "Polygon".into(),
            format!("Initial MMI {}", contour.mmi()),
            "blue",
            contour,
        )?);
    }

    let circles = &report.alert_circles;
    for circle in &circles.circles {
        features.push(circle_feature(circles.center, circle)?);
    }

    collection(
        "initialAlertCollection",
        Some(&alert_properties(initial, initial_caption(initial))),
        features,
    )
}

fn contour_collection(
    id: &str,
    snapshot: &SnapshotSummary,
    epicenter: &Feature,
    caption: String,
) -> Result<FeatureCollection, SummaryError> {
    let mut features = vec![epicenter.clone()];

    for (idx, contour) in snapshot.drawn_contours.iter().enumerate() {
        features.push(ring_feature(
            format!("poly_{idx}"),
            format!("MMI {}", contour.mmi()),
            contour.intensity_color(),
            contour,
        )?);
    }

    collection(id, Some(&alert_properties(snapshot, caption)), features)
}

fn snapshot_label(kind: SnapshotKind) -> &'static str {
    match kind {
        SnapshotKind::Initial => "Initial",
        SnapshotKind::PeakMagnitude => "Peak magnitude",
        SnapshotKind::Final => "Final",
    }
}

/// Write the plain-text summary.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human<W: Write>(writer: &mut W, report: &SummaryReport) -> io::Result<()> {
    writeln!(writer, "Earthquake Early Warning Summary: {}", report.event_id)?;
    writeln!(writer)?;

    match &report.authoritative {
        Some(origin) => {
            let time = origin
                .origin_time
                .map_or_else(|| "Not available".to_string(), format_labeled);
            let mag = origin
                .magnitude
                .map_or_else(|| "?".to_string(), |m| format!("{:.1}", round_half_up(m, 1)));
            writeln!(writer, "Origin time:  {time}")?;
            writeln!(writer, "Magnitude:    M{mag}")?;
            writeln!(writer, "Epicenter:    {}", origin.location)?;
            writeln!(writer, "Depth:        {:.1} km", origin.depth_km)?;
        }
        None => writeln!(writer, "Authoritative origin: Not available")?,
    }
    if let Some(title) = title(report) {
        writeln!(writer, "Location:     {title}")?;
    }

    if let Some(text) = &report.review_text {
        writeln!(writer, "Announcement: {text}")?;
    }
    if let Some(text) = &report.wea_report {
        writeln!(writer, "WEA report:   {text}")?;
    }

    writeln!(writer)?;
    writeln!(writer, "Alerts issued (after origin time):")?;
    writeln!(
        writer,
        "  {:<16} {:>12} {:>9} {:>5} {:>8} {:>9} {:>14} {:>10}",
        "Alert", "Sent (UTC)", "Elapsed", "Mag", "Stations", "MMI shown", "Location error", "Origin err"
    )?;
    for snapshot in report.snapshots() {
        let elapsed = snapshot
            .elapsed_s
            .map_or_else(|| "n/a".to_string(), |s| format!("{s:.1} sec"));
        let shown = snapshot
            .display_contour
            .as_ref()
            .map_or_else(|| "-".to_string(), |c| intensity_roman_numeral(i64::from(c.mmi())).into_owned());
        let location = snapshot
            .location_error
            .map_or_else(|| "n/a".to_string(), |e| format!("{:.1} mi {}", e.distance_mi, e.octant));
        let origin_error = snapshot
            .origin_time_error_s
            .map_or_else(|| "n/a".to_string(), |s| format!("{s:+.2} sec"));
        writeln!(
            writer,
            "  {:<16} {:>12} {:>9} {:>5.1} {:>8} {:>9} {:>14} {:>10}",
            snapshot_label(snapshot.kind),
            snapshot.sent.format("%H:%M:%S%.3f").to_string(),
            elapsed,
            snapshot.magnitude,
            snapshot.num_stations,
            shown,
            location,
            origin_error
        )?;
    }

    writeln!(writer)?;
    writeln!(writer, "Nearby cities:")?;
    writeln!(
        writer,
        "  {:<24} {:>16} {:>9} {:>4} {:>9}",
        "City", "Distance", "Time", "MMI", "Intensity"
    )?;
    for nearby in &report.cities {
        let city = &nearby.city;
        let distance = format!("{:.0} km ({:.0} mi)", city.distance_km, km_to_miles(city.distance_km));
        writeln!(
            writer,
            "  {:<24} {:>16} {:>9} {:>4} {:>9}",
            city.name,
            distance,
            format!("~{:.0} sec", city.time_to_alert_s),
            intensity_number_string(i64::from(nearby.mmi)),
            nearby.intensity
        )?;
    }
    for category in &report.unfilled_categories {
        writeln!(writer, "  (no city of category {category})")?;
    }

    let source = if report.reference.authoritative {
        "authoritative epicenter"
    } else {
        "initial alert location"
    };
    writeln!(writer, "  Distances from the {source} ({})", report.reference.location)?;

    let shaken = report.s_wave_radius_km.map_or_else(
        || "Not available".to_string(),
        |km| format!("{:.0} km ({:.0} mi)", km, km_to_miles(km)),
    );
    writeln!(writer)?;
    writeln!(writer, "Radius shaken before message release: {shaken}")?;
    writeln!(writer, "Stations within 10 km:  {}", report.stations_within_10km)?;
    writeln!(writer, "Stations within 100 km: {}", report.stations_within_100km)?;

    Ok(())
}

/// Write the summary GeoJSON document.
///
/// Writes nothing when the report has no authoritative origin.
///
/// # Errors
///
/// Returns an error if a contour ring is malformed or writing fails.
pub fn write_json<W: Write>(writer: &mut W, report: &SummaryReport, pretty: bool) -> io::Result<()> {
    let document = SummaryDocument::from_report(report)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let Some(document) = document else {
        return Ok(());
    };

    let json = if pretty {
        serde_json::to_string_pretty(&document)
    } else {
        serde_json::to_string(&document)
    }
    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    writeln!(writer, "{json}")
}

/// Write the report in the specified format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_report<W: Write>(writer: &mut W, report: &SummaryReport, format: Format, pretty: bool) -> io::Result<()> {
    match format {
        Format::Human => write_human(writer, report),
        Format::Json => write_json(writer, report, pretty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_report;

    fn document() -> serde_json::Value {
        let report = sample_report();
        let document = SummaryDocument::from_report(&report).unwrap().unwrap();
        serde_json::to_value(&document).unwrap()
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("human".parse::<Format>().unwrap(), Format::Human);
        assert_eq!("JSON".parse::<Format>().unwrap(), Format::Json);
        assert!("ndjson".parse::<Format>().is_err());
    }

    #[test]
    fn test_summary_properties() {
        let doc = document();
        assert_eq!(doc["type"], "USGSEarlyWarningSummary");
        assert_eq!(doc["version"], "1.0");

        let props = &doc["properties"];
        assert_eq!(props["id"], "nc73827571");
        assert_eq!(props["time"], "2023-01-01 10:00:00.000000Z");
        assert_eq!(props["elapsed"], 1500.0);
        assert_eq!(props["magnitude"], 5.3);
        assert_eq!(props["title"], "9.7 mi SE of Rio Dell");
        assert_eq!(props["epicenter"]["type"], "Point");
        assert_eq!(props["epicenter"]["coordinates"][0], -123.9823);
        assert_eq!(props["num_stations_10km"], 1);
        assert_eq!(props["num_stations_100km"], 3);
        assert!(props["wea_report"].is_null());
    }

    #[test]
    fn test_city_collection() {
        let doc = document();
        let features = doc["cities"]["features"].as_array().unwrap();
        assert_eq!(features.len(), 4);
        assert_eq!(features[0]["id"], "Rio Dell");
        assert_eq!(features[0]["properties"]["mmi"], 4);
        assert_eq!(features[3]["properties"]["mmi"], 2);
    }

    #[test]
    fn test_alert_collections() {
        let doc = document();
        let alerts = doc["alerts"].as_array().unwrap();
        assert_eq!(alerts.len(), 3);

        let initial = &alerts[0];
        assert_eq!(initial["id"], "initialAlertCollection");
        assert_eq!(initial["properties"]["elapsed"], 7.971);
        assert_eq!(initial["properties"]["magnitude"], 4.6);
        assert_eq!(initial["properties"]["location_azimuth_error"], 298);
        assert_eq!(initial["properties"]["location_distance_error"], 2.2);
        assert!(
            initial["properties"]["caption"]
                .as_str()
                .unwrap()
                .contains("approximates the outer range for felt ground motion")
        );

        let ids: Vec<&str> = initial["features"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["SAinitloc", "Epicenter", "Polygon", "acircle_0.0", "acircle_10.0", "acircle_20.0"]);
        assert_eq!(initial["features"][2]["properties"]["name"], "Initial MMI 3");
        assert_eq!(initial["features"][3]["properties"]["color"], "crimson");
        assert_eq!(initial["features"][4]["properties"]["fill-opacity"], 0.0);

        let peak = &alerts[1];
        assert_eq!(peak["id"], "maxMAlertCollection");
        let rings = peak["features"].as_array().unwrap();
        assert_eq!(rings.len(), 4);
        assert_eq!(rings[1]["properties"]["name"], "MMI 6");
        assert_eq!(rings[1]["properties"]["stroke"], "#fefb3c");
        assert_eq!(rings[1]["geometry"]["type"], "Polygon");
        // lon, lat order
        assert_eq!(rings[1]["geometry"]["coordinates"][0][0][0], -123.9823);
        assert_eq!(rings[1]["geometry"]["coordinates"][0][0][1], 40.4423);
        assert_eq!(rings[1]["properties"]["pga"], 12.1);
        assert_eq!(peak["properties"]["magnitude"], 5.4);
        assert!(
            peak["properties"]["caption"]
                .as_str()
                .unwrap()
                .contains("peak magnitude estimate")
        );

        assert_eq!(alerts[2]["id"], "finalAlertCollection");
    }

    #[test]
    fn test_collection_magnitude_rounds_to_nearest() {
        let mut report = sample_report();
        report.final_alert.magnitude = 0.35;
        let document = SummaryDocument::from_report(&report).unwrap().unwrap();
        let doc = serde_json::to_value(&document).unwrap();
        assert_eq!(doc["alerts"][2]["properties"]["magnitude"], 0.3);
    }

    #[test]
    fn test_self_intersecting_contour_blocks_export_only() {
        let bow_tie = vec![
            Coordinate::new(40.0, -124.0),
            Coordinate::new(41.0, -123.0),
            Coordinate::new(41.0, -124.0),
            Coordinate::new(40.0, -123.0),
            Coordinate::new(40.0, -124.0),
        ];
        let mut report = sample_report();
        report
            .peak
            .drawn_contours
            .push(Contour::new(4, bow_tie, None, None).unwrap());

        assert!(matches!(
            SummaryDocument::from_report(&report),
            Err(SummaryError::Validation(_))
        ));

        let mut buf = Vec::new();
        let err = write_json(&mut buf, &report, true).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(buf.is_empty());

        let mut buf = Vec::new();
        write_human(&mut buf, &report).unwrap();
        assert!(String::from_utf8(buf).unwrap().contains("Nearby cities:"));
    }

    #[test]
    fn test_export_skipped_without_origin() {
        let mut report = sample_report();
        report.authoritative = None;
        assert!(SummaryDocument::from_report(&report).unwrap().is_none());

        let mut buf = Vec::new();
        write_json(&mut buf, &report, false).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_human_report() {
        let report = sample_report();
        let mut buf = Vec::new();
        write_human(&mut buf, &report).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("Earthquake Early Warning Summary: nc73827571"));
        assert!(text.contains("2023-01-01 10:00:00.000000 (UTC)"));
        assert!(text.contains("Rio Dell"));
        assert!(text.contains("16 km (10 mi)"));
        assert!(text.contains("~1 sec"));
        assert!(text.contains("Location:     9.7 mi SE of Rio Dell"));
        assert!(text.contains("10:00:07.971"));
        assert!(text.contains("-0.05 sec"));
        assert!(text.contains("Distances from the authoritative epicenter (40.3949,-123.9823)"));
        assert!(text.contains("IV"));
        assert!(text.contains("Radius shaken before message release: 28 km (18 mi)"));
        assert!(text.contains("Stations within 100 km: 3"));
    }

    #[test]
    fn test_human_report_without_origin() {
        let mut report = sample_report();
        report.authoritative = None;
        report.s_wave_radius_km = None;
        let mut buf = Vec::new();
        write_human(&mut buf, &report).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Authoritative origin: Not available"));
        assert!(text.contains("Radius shaken before message release: Not available"));
    }

    #[test]
    fn test_human_report_lists_unfilled_categories() {
        let mut report = sample_report();
        report.unfilled_categories = vec!["A".to_string()];
        let mut buf = Vec::new();
        write_human(&mut buf, &report).unwrap();
        assert!(String::from_utf8(buf).unwrap().contains("(no city of category A)"));
    }
}
