use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A token metadata document as loaded from the collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(
        default,
        deserialize_with = "deserialize_metadata",
        skip_serializing_if = "Option::is_none"
    )]
    pub metadata: Option<Metadata>,
    /// Every other top-level field, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Returns the image reference when it is a string.
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(Metadata::image_str)
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(Metadata::name)
    }
}

/// Token metadata. Only `image` is interpreted; the rest is an open bag.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Value>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Metadata {
    #[must_use]
    pub fn with_image(image: impl Into<String>) -> Self {
        Self {
            image: Some(Value::String(image.into())),
            attributes: Map::new(),
        }
    }

    #[must_use]
    pub fn image_str(&self) -> Option<&str> {
        self.image.as_ref().and_then(Value::as_str)
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.attributes.get("name").and_then(Value::as_str)
    }

    /// Collects `attributes` entries shaped like `{trait_type, value}`.
    #[must_use]
    pub fn traits(&self) -> Vec<Trait> {
        let Some(Value::Array(entries)) = self.attributes.get("attributes") else {
            return Vec::new();
        };
        entries
            .iter()
            .filter_map(|entry| {
                let entry = entry.as_object()?;
                let value = entry.get("value")?;
                let trait_type = entry
                    .get("trait_type")
                    .map(display_value)
                    .unwrap_or_default();
                Some(Trait {
                    trait_type,
                    value: display_value(value),
                })
            })
            .collect()
    }
}

/// A single display trait of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trait {
    pub trait_type: String,
    pub value: String,
}

/// Row of the `token` table as read back for display.
///
/// Rows keep the source document twice: as `doc` for filtering and as its
/// JSON text under `body`, which is what gets decoded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredToken {
    pub seq: u64,
    pub body: String,
}

impl StoredToken {
    /// Decodes the stored JSON text into a [`Record`].
    ///
    /// # Errors
    /// Returns an error if the text is not a JSON object.
    pub fn into_record(self) -> Result<Record, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(id) => id,
        Value::Number(id) => id.to_string(),
        _ => String::new(),
    })
}

fn deserialize_metadata<'de, D>(deserializer: D) -> Result<Option<Metadata>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => serde_json::from_value(Value::Object(map))
            .map(Some)
            .map_err(D::Error::custom),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_keeps_unknown_fields() {
        let record: Record = serde_json::from_value(json!({
            "_id": "a1",
            "id": "42",
            "contract": "0xabc",
            "metadata": { "image": "QmX", "name": "Ape #42" }
        }))
        .expect("record should decode");

        assert_eq!(record.id, "42");
        assert_eq!(record.image(), Some("QmX"));
        assert_eq!(record.name(), Some("Ape #42"));
        assert_eq!(record.extra.get("_id"), Some(&json!("a1")));
        assert_eq!(record.extra.get("contract"), Some(&json!("0xabc")));
    }

    #[test]
    fn lenient_id_and_metadata() {
        let record: Record = serde_json::from_value(json!({
            "id": 7,
            "metadata": "not an object"
        }))
        .expect("record should decode");

        assert_eq!(record.id, "7");
        assert!(record.metadata.is_none());

        let record: Record = serde_json::from_value(json!({})).expect("empty record");
        assert!(record.id.is_empty());
    }

    #[test]
    fn non_string_image_survives() {
        let record: Record = serde_json::from_value(json!({
            "id": "1",
            "metadata": { "image": { "uri": "QmX" } }
        }))
        .expect("record should decode");

        assert_eq!(record.image(), None);
        let metadata = record.metadata.expect("metadata");
        assert_eq!(metadata.image, Some(json!({ "uri": "QmX" })));
    }

    #[test]
    fn stored_body_keeps_null_fields() {
        let row = StoredToken {
            seq: 4,
            body: r#"{"id":"a","owner":null,"metadata":{"hat":null}}"#.to_string(),
        };
        let record = row.into_record().expect("record should decode");

        assert_eq!(record.extra.get("owner"), Some(&Value::Null));
        let metadata = record.metadata.expect("metadata");
        assert_eq!(metadata.attributes.get("hat"), Some(&Value::Null));
    }

    #[test]
    fn traits_from_attribute_list() {
        let metadata: Metadata = serde_json::from_value(json!({
            "attributes": [
                { "trait_type": "Fur", "value": "Gold" },
                { "trait_type": "Level", "value": 3 },
                "ignored",
                { "trait_type": "Missing" }
            ]
        }))
        .expect("metadata should decode");

        assert_eq!(
            metadata.traits(),
            vec![
                Trait {
                    trait_type: "Fur".to_string(),
                    value: "Gold".to_string(),
                },
                Trait {
                    trait_type: "Level".to_string(),
                    value: "3".to_string(),
                },
            ]
        );
    }
}
