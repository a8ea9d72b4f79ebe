//! Handles and payloads exchanged with the ION parts API.

use serde::{Deserialize, Deserializer, Serialize};

use crate::row::PartAttributes;

/// Reference to a part record that exists in ION.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct PartHandle {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: i64,
    pub part_number: String,
}

/// Reference to an MBOM item (a parent/child membership with quantity).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkHandle {
    pub id: i64,
    pub parent_id: i64,
    pub child_id: i64,
    pub quantity: f64,
}

/// Create-part payload. Fields left as `None` keep the ION default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PartInput {
    pub part_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_part_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

impl PartInput {
    pub fn new(part_number: impl Into<String>, attributes: &PartAttributes) -> Self {
        Self {
            part_number: part_number.into(),
            description: attributes.description.clone(),
            supplier_part_number: attributes.vendor_ref.clone(),
            revision: attributes.revision.clone(),
        }
    }
}

/// GraphQL `ID` values may arrive as JSON numbers or strings.
pub fn id_from_number_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(n) => Ok(n),
        RawId::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_input_omits_missing_attributes() {
        let attrs = PartAttributes {
            description: Some("Bracket".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(PartInput::new("PN-7", &attrs)).unwrap();
        assert_eq!(json, serde_json::json!({"partNumber": "PN-7", "description": "Bracket"}));
    }

    #[test]
    fn test_part_handle_accepts_string_id() {
        let handle: PartHandle =
            serde_json::from_str(r#"{"id": "42", "partNumber": "PN-1"}"#).unwrap();
        assert_eq!(handle.id, 42);
        let handle: PartHandle =
            serde_json::from_str(r#"{"id": 7, "partNumber": "PN-2"}"#).unwrap();
        assert_eq!(handle.id, 7);
    }
}
