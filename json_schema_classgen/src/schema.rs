use serde::Deserialize;
use std::collections::BTreeMap;

/// Wraps the JSON Schema `default` keyword to preserve `null`.
/// Serde deserializes `Option<Value>` with JSON null as `None`; we need to
/// distinguish absent key from `"default": null`.
#[derive(Debug, Default, Clone)]
pub enum DefaultKeyword {
    /// Key "default" was absent from the schema.
    #[default]
    Absent,
    /// Key "default" was present; the value may be `Value::Null`.
    Present(serde_json::Value),
}

impl DefaultKeyword {
    pub fn value(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Present(v) => Some(v),
            Self::Absent => None,
        }
    }
}

impl<'de> Deserialize<'de> for DefaultKeyword {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let v: serde_json::Value = Deserialize::deserialize(deserializer)?;
        Ok(Self::Present(v))
    }
}

/// `additionalProperties`: either a boolean switch or a schema for the extra values.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<JsonSchema>),
}

/// OpenAPI-style `discriminator` object attached to a `oneOf`.
#[derive(Debug, Clone, Deserialize)]
pub struct Discriminator {
    #[serde(rename = "propertyName")]
    pub property_name: String,

    /// Discriminator value -> `$ref` of the variant schema.
    #[serde(default)]
    pub mapping: BTreeMap<String, String>,
}

/// Root or nested JSON Schema object.
///
/// Only the schema fields used by the generator are modeled.
/// Extra keys in the JSON are ignored via serde's default behavior.
/// Uses `BTreeMap` for deterministic property ordering (alphabetical by key).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonSchema {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub r#type: Option<String>,

    #[serde(default)]
    pub properties: Option<BTreeMap<String, JsonSchema>>,

    #[serde(default)]
    pub required: Option<Vec<String>>,

    #[serde(default)]
    pub r#enum: Option<Vec<serde_json::Value>>,

    #[serde(default)]
    pub r#const: Option<serde_json::Value>,

    #[serde(default)]
    pub items: Option<Box<JsonSchema>>,

    #[serde(default, rename = "additionalProperties")]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(default)]
    pub default: DefaultKeyword,

    #[serde(default)]
    pub minimum: Option<serde_json::Value>,

    #[serde(default)]
    pub maximum: Option<serde_json::Value>,

    #[serde(default)]
    pub format: Option<String>,

    #[serde(default, rename = "$ref")]
    pub reference: Option<String>,

    #[serde(default, rename = "$defs")]
    pub defs: Option<BTreeMap<String, JsonSchema>>,

    #[serde(default)]
    pub definitions: Option<BTreeMap<String, JsonSchema>>,

    #[serde(default, rename = "oneOf")]
    pub one_of: Option<Vec<JsonSchema>>,

    #[serde(default, rename = "allOf")]
    pub all_of: Option<Vec<JsonSchema>>,

    #[serde(default)]
    pub discriminator: Option<Discriminator>,
}

impl JsonSchema {
    /// Returns the `enum` values when every one of them is a string and there is at least one.
    pub fn string_enum_values(&self) -> Option<Vec<String>> {
        let values: &Vec<serde_json::Value> = self.r#enum.as_ref()?;
        if values.is_empty() {
            return None;
        }
        values
            .iter()
            .map(|v| v.as_str().map(String::from))
            .collect()
    }

    /// The single string this schema pins a value to, via `const` or a one-element `enum`.
    pub fn pinned_string(&self) -> Option<String> {
        if let Some(serde_json::Value::String(s)) = &self.r#const {
            return Some(s.clone());
        }
        match self.string_enum_values() {
            Some(values) if values.len() == 1 => values.into_iter().next(),
            _ => None,
        }
    }

    /// True when this schema is a `oneOf` with a discriminator, i.e. a polymorphic base.
    pub fn is_discriminated_union(&self) -> bool {
        self.one_of.is_some() && self.discriminator.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_keyword_distinguishes_null_from_absent() {
        let with_null: JsonSchema =
            serde_json::from_str(r#"{ "default": null }"#).expect("valid schema");
        let without: JsonSchema = serde_json::from_str("{}").expect("valid schema");
        assert_eq!(with_null.default.value(), Some(&serde_json::Value::Null));
        assert!(without.default.value().is_none());
    }

    #[test]
    fn discriminator_mapping_defaults_to_empty() {
        let schema: JsonSchema = serde_json::from_str(
            r##"{ "oneOf": [{ "$ref": "#/$defs/A" }], "discriminator": { "propertyName": "kind" } }"##,
        )
        .expect("valid schema");
        let discriminator: &Discriminator = schema.discriminator.as_ref().expect("discriminator");
        assert_eq!(discriminator.property_name, "kind");
        assert!(discriminator.mapping.is_empty());
        assert!(schema.is_discriminated_union());
    }

    #[test]
    fn pinned_string_reads_const_then_single_enum() {
        let by_const: JsonSchema =
            serde_json::from_str(r#"{ "const": "Apple" }"#).expect("valid schema");
        let by_enum: JsonSchema =
            serde_json::from_str(r#"{ "enum": ["Orange"] }"#).expect("valid schema");
        let ambiguous: JsonSchema =
            serde_json::from_str(r#"{ "enum": ["a", "b"] }"#).expect("valid schema");
        assert_eq!(by_const.pinned_string().as_deref(), Some("Apple"));
        assert_eq!(by_enum.pinned_string().as_deref(), Some("Orange"));
        assert_eq!(ambiguous.pinned_string(), None);
    }

    #[test]
    fn additional_properties_accepts_bool_or_schema() {
        let closed: JsonSchema =
            serde_json::from_str(r#"{ "additionalProperties": false }"#).expect("valid schema");
        let typed: JsonSchema = serde_json::from_str(
            r#"{ "additionalProperties": { "type": "integer" } }"#,
        )
        .expect("valid schema");
        assert!(matches!(
            closed.additional_properties,
            Some(AdditionalProperties::Allowed(false))
        ));
        let Some(AdditionalProperties::Schema(value_schema)) = typed.additional_properties else {
            panic!("expected a value schema");
        };
        assert_eq!(value_schema.r#type.as_deref(), Some("integer"));
    }

    #[test]
    fn string_enum_values_rejects_mixed_values() {
        let mixed: JsonSchema =
            serde_json::from_str(r#"{ "enum": ["a", 1] }"#).expect("valid schema");
        assert_eq!(mixed.string_enum_values(), None);
    }
}
