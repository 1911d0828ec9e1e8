//! GeoJSON FeatureCollection decoding for the active-alerts feed.

use serde::Deserialize;
use serde_json::Value;
use stormwatch_core::AlertRecord;

use crate::error::{FetchError, Result};

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: String,
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    properties: Option<AlertRecord>,
    #[serde(default)]
    geometry: Value,
}

impl Feature {
    fn into_record(self) -> AlertRecord {
        let mut record = self.properties.unwrap_or_default();
        if record.id.is_empty() {
            if let Some(id) = self.id.as_str() {
                record.id = id.to_string();
            }
        }
        record.geometry = self.geometry;
        record
    }
}

/// Decode a FeatureCollection body into alert records, in feed order.
pub fn parse_feature_collection(body: &str) -> Result<Vec<AlertRecord>> {
    let collection: FeatureCollection = serde_json::from_str(body)?;
    if collection.kind != "FeatureCollection" {
        return Err(FetchError::parse(format!(
            "expected a FeatureCollection, got '{}'",
            collection.kind
        )));
    }
    Ok(collection
        .features
        .into_iter()
        .map(Feature::into_record)
        .collect())
}

/// Keep only records whose event type is in `events`; an empty filter keeps all.
pub fn filter_events(records: Vec<AlertRecord>, events: &[String]) -> Vec<AlertRecord> {
    if events.is_empty() {
        return records;
    }
    records
        .into_iter()
        .filter(|r| events.iter().any(|e| *e == r.event))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(id: &str, event: &str) -> Value {
        json!({
            "id": format!("https://api.weather.gov/alerts/{id}"),
            "type": "Feature",
            "geometry": null,
            "properties": {
                "@id": format!("https://api.weather.gov/alerts/{id}"),
                "@type": "wx:Alert",
                "id": id,
                "areaDesc": "Allegheny, PA",
                "event": event,
                "certainty": "Likely",
                "effective": "2026-04-01T08:15:00-04:00",
                "ends": null
            }
        })
    }

    #[test]
    fn test_parse_features_in_order() {
        let body = json!({
            "type": "FeatureCollection",
            "features": [feature("A1", "Flood Watch"), feature("B2", "Tornado Watch")]
        })
        .to_string();

        let records = parse_feature_collection(&body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "A1");
        assert_eq!(records[1].event, "Tornado Watch");
        assert_eq!(records[0].certainty, "Likely");
        assert_eq!(records[0].ends, "");
    }

    #[test]
    fn test_geometry_is_kept_verbatim() {
        let polygon = json!({"type": "Polygon", "coordinates": [[[-80.0, 40.0], [-79.9, 40.1], [-80.0, 40.0]]]});
        let mut f = feature("A1", "Flood Watch");
        f["geometry"] = polygon.clone();
        let body = json!({"type": "FeatureCollection", "features": [f]}).to_string();

        let records = parse_feature_collection(&body).unwrap();
        assert_eq!(records[0].geometry, polygon);
    }

    #[test]
    fn test_feature_id_fills_missing_property_id() {
        let body = json!({
            "type": "FeatureCollection",
            "features": [{"id": "urn:feature", "type": "Feature", "properties": {"event": "Flood Watch"}}]
        })
        .to_string();

        let records = parse_feature_collection(&body).unwrap();
        assert_eq!(records[0].id, "urn:feature");
    }

    #[test]
    fn test_empty_collection() {
        let records =
            parse_feature_collection(r#"{"type": "FeatureCollection", "features": []}"#).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_rejects_non_collections() {
        assert!(parse_feature_collection("<html>oops</html>").unwrap_err().is_parse_error());
        assert!(parse_feature_collection(r#"{"type": "Feature", "features": []}"#)
            .unwrap_err()
            .is_parse_error());
        assert!(parse_feature_collection(r#"{"type": "FeatureCollection"}"#)
            .unwrap_err()
            .is_parse_error());
    }

    #[test]
    fn test_event_filter_keeps_listed_events_only() {
        let records = vec![
            AlertRecord::new("A1", "Flood Watch"),
            AlertRecord::new("B2", "Tornado Watch"),
        ];

        let kept = filter_events(records.clone(), &["Tornado Watch".to_string()]);
        assert_eq!(kept, vec![AlertRecord::new("B2", "Tornado Watch")]);

        assert_eq!(filter_events(records.clone(), &[]), records);
    }
}
