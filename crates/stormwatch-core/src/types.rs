//! Alert record types shared across stormwatch crates.
//!
//! The alert source returns an open-ended property bag per feature. Here it is
//! pinned down to a fixed record with one named field per entry of
//! [`AlertField::ALL`]; anything absent or `null` decodes to an empty value.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Unique identifier for an alert (the NWS URN, e.g. `urn:oid:2.49.0.1.840.0...`).
pub type AlertId = String;

/// A single weather alert.
///
/// Immutable once fetched. Identity is `id` alone; two records with the same
/// `id` are the same alert even if other fields differ.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub id: AlertId,
    #[serde(deserialize_with = "null_as_default")]
    pub area_desc: String,
    pub geocode: Value,
    pub affected_zones: Value,
    pub references: Value,
    #[serde(deserialize_with = "null_as_default")]
    pub sent: String,
    #[serde(deserialize_with = "null_as_default")]
    pub effective: String,
    #[serde(deserialize_with = "null_as_default")]
    pub onset: String,
    #[serde(deserialize_with = "null_as_default")]
    pub expires: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ends: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub message_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(deserialize_with = "null_as_default")]
    pub severity: String,
    #[serde(deserialize_with = "null_as_default")]
    pub certainty: String,
    #[serde(deserialize_with = "null_as_default")]
    pub urgency: String,
    #[serde(deserialize_with = "null_as_default")]
    pub event: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sender: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sender_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub headline: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub instruction: String,
    #[serde(deserialize_with = "null_as_default")]
    pub response: String,
    pub parameters: Value,
    /// Feature geometry, carried along but never interpreted.
    pub geometry: Value,
}

impl AlertRecord {
    /// Create a record with only an id and event type set.
    pub fn new(id: impl Into<AlertId>, event: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            event: event.into(),
            ..Default::default()
        }
    }

    /// Builder-style setter for the area description.
    pub fn with_area(mut self, area_desc: impl Into<String>) -> Self {
        self.area_desc = area_desc.into();
        self
    }

    /// Builder-style setter for the description body.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder-style setter for the effective timestamp.
    pub fn with_effective(mut self, effective: impl Into<String>) -> Self {
        self.effective = effective.into();
        self
    }

    /// Display text of a single field.
    pub fn field(&self, field: AlertField) -> String {
        field.display(self)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Every field an [`AlertRecord`] carries, named as the NWS API names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertField {
    Id,
    AreaDesc,
    Geocode,
    AffectedZones,
    References,
    Sent,
    Effective,
    Onset,
    Expires,
    Ends,
    Status,
    MessageType,
    Category,
    Severity,
    Certainty,
    Urgency,
    Event,
    Sender,
    SenderName,
    Headline,
    Description,
    Instruction,
    Response,
    Parameters,
    Geometry,
}

impl AlertField {
    /// The full set of viable fields, in API order.
    pub const ALL: [AlertField; 25] = [
        AlertField::Id,
        AlertField::AreaDesc,
        AlertField::Geocode,
        AlertField::AffectedZones,
        AlertField::References,
        AlertField::Sent,
        AlertField::Effective,
        AlertField::Onset,
        AlertField::Expires,
        AlertField::Ends,
        AlertField::Status,
        AlertField::MessageType,
        AlertField::Category,
        AlertField::Severity,
        AlertField::Certainty,
        AlertField::Urgency,
        AlertField::Event,
        AlertField::Sender,
        AlertField::SenderName,
        AlertField::Headline,
        AlertField::Description,
        AlertField::Instruction,
        AlertField::Response,
        AlertField::Parameters,
        AlertField::Geometry,
    ];

    /// The API property name (camelCase).
    pub fn name(&self) -> &'static str {
        match self {
            AlertField::Id => "id",
            AlertField::AreaDesc => "areaDesc",
            AlertField::Geocode => "geocode",
            AlertField::AffectedZones => "affectedZones",
            AlertField::References => "references",
            AlertField::Sent => "sent",
            AlertField::Effective => "effective",
            AlertField::Onset => "onset",
            AlertField::Expires => "expires",
            AlertField::Ends => "ends",
            AlertField::Status => "status",
            AlertField::MessageType => "messageType",
            AlertField::Category => "category",
            AlertField::Severity => "severity",
            AlertField::Certainty => "certainty",
            AlertField::Urgency => "urgency",
            AlertField::Event => "event",
            AlertField::Sender => "sender",
            AlertField::SenderName => "senderName",
            AlertField::Headline => "headline",
            AlertField::Description => "description",
            AlertField::Instruction => "instruction",
            AlertField::Response => "response",
            AlertField::Parameters => "parameters",
            AlertField::Geometry => "geometry",
        }
    }

    /// Header/label text: first letter upper-cased, the rest lower-cased.
    ///
    /// `areaDesc` becomes `Areadesc`, matching how the list header and the
    /// detail pane have always labelled fields.
    pub fn label(&self) -> String {
        capitalize(self.name())
    }

    /// Whether this field holds an RFC 3339 timestamp.
    pub fn is_timestamp(&self) -> bool {
        matches!(
            self,
            AlertField::Sent
                | AlertField::Effective
                | AlertField::Onset
                | AlertField::Expires
                | AlertField::Ends
        )
    }

    /// Render this field of `record` as display text.
    pub fn display(&self, record: &AlertRecord) -> String {
        let text = match self {
            AlertField::Id => &record.id,
            AlertField::AreaDesc => &record.area_desc,
            AlertField::Sent => &record.sent,
            AlertField::Effective => &record.effective,
            AlertField::Onset => &record.onset,
            AlertField::Expires => &record.expires,
            AlertField::Ends => &record.ends,
            AlertField::Status => &record.status,
            AlertField::MessageType => &record.message_type,
            AlertField::Category => &record.category,
            AlertField::Severity => &record.severity,
            AlertField::Certainty => &record.certainty,
            AlertField::Urgency => &record.urgency,
            AlertField::Event => &record.event,
            AlertField::Sender => &record.sender,
            AlertField::SenderName => &record.sender_name,
            AlertField::Headline => &record.headline,
            AlertField::Description => &record.description,
            AlertField::Instruction => &record.instruction,
            AlertField::Response => &record.response,
            AlertField::Geocode => return display_json(&record.geocode),
            AlertField::AffectedZones => return display_json(&record.affected_zones),
            AlertField::References => return display_json(&record.references),
            AlertField::Parameters => return display_json(&record.parameters),
            AlertField::Geometry => return display_json(&record.geometry),
        };

        if self.is_timestamp() {
            format_timestamp(text)
        } else {
            text.clone()
        }
    }
}

impl fmt::Display for AlertField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a field name is not one of [`AlertField::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown alert field '{0}'")]
pub struct UnknownField(pub String);

impl FromStr for AlertField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlertField::ALL
            .iter()
            .copied()
            .find(|f| f.name() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// Upper-case the first character and lower-case the rest.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Normalize an RFC 3339 timestamp to UTC; unparseable input is passed through.
fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => ts
            .with_timezone(&Utc)
            .format("%Y-%m-%d %H:%M:%S%:z")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

fn display_json(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_names_round_trip() {
        for field in AlertField::ALL {
            assert_eq!(field.name().parse::<AlertField>(), Ok(field));
        }
        assert!("areadesc".parse::<AlertField>().is_err());
    }

    #[test]
    fn test_label_capitalizes_like_headers() {
        assert_eq!(AlertField::AreaDesc.label(), "Areadesc");
        assert_eq!(AlertField::Effective.label(), "Effective");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_deserialize_nulls_and_missing_fields() {
        let record: AlertRecord = serde_json::from_value(json!({
            "id": "urn:oid:1",
            "areaDesc": "Allegheny, PA",
            "ends": null,
            "instruction": null,
            "affectedZones": ["https://api.weather.gov/zones/county/PAC003"],
            "@type": "wx:Alert"
        }))
        .unwrap();

        assert_eq!(record.id, "urn:oid:1");
        assert_eq!(record.area_desc, "Allegheny, PA");
        assert_eq!(record.ends, "");
        assert_eq!(record.instruction, "");
        assert_eq!(record.headline, "");
        assert_eq!(record.geometry, Value::Null);
        assert_eq!(
            record.field(AlertField::AffectedZones),
            "https://api.weather.gov/zones/county/PAC003"
        );
    }

    #[test]
    fn test_timestamp_display_normalizes_to_utc() {
        let record = AlertRecord::new("a", "Flood Watch").with_effective("2026-04-01T08:15:00-04:00");
        assert_eq!(record.field(AlertField::Effective), "2026-04-01 12:15:00+00:00");

        let garbled = AlertRecord::new("b", "Flood Watch").with_effective("soon");
        assert_eq!(garbled.field(AlertField::Effective), "soon");
    }

    #[test]
    fn test_structured_fields_render_compactly() {
        let record = AlertRecord {
            geocode: json!({"UGC": ["PAC003"]}),
            ..AlertRecord::new("a", "Flood Watch")
        };
        assert_eq!(record.field(AlertField::Geocode), r#"{"UGC":["PAC003"]}"#);
        assert_eq!(record.field(AlertField::Geometry), "");
    }
}
