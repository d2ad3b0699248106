//! Schema validation for `deny_invalid_unknown_json_schema` mode.
//!
//! Walks the raw JSON Schema (as `serde_json::Value`) and collects all
//! invalid/unsupported issues without panicking. Issues are reported at
//! JSON Pointer paths into the schema document.

use crate::error::{SchemaValidationError, SchemaValidationIssue, SchemaValidationIssueKind};
use crate::json_pointer;
use std::collections::BTreeSet;

/// Known JSON Schema keywords we support or explicitly recognize.
/// Keys not in this set and not in `UNSUPPORTED_KEYWORDS` are reported as `UnknownKeyword`.
const KNOWN_KEYWORDS: &[&str] = &[
    "$schema",
    "$id",
    "$comment",
    "$ref",
    "$defs",
    "definitions",
    "title",
    "description",
    "type",
    "properties",
    "required",
    "enum",
    "const",
    "items",
    "format",
    "pattern",
    "additionalProperties",
    "default",
    "minimum",
    "maximum",
    "oneOf",
    "allOf",
    "discriminator",
];

/// Standard keywords the generator recognizes but cannot express in Rust types.
const UNSUPPORTED_KEYWORDS: &[&str] = &[
    "additionalItems",
    "anyOf",
    "contains",
    "dependentRequired",
    "dependentSchemas",
    "deprecated",
    "else",
    "examples",
    "exclusiveMaximum",
    "exclusiveMinimum",
    "if",
    "maxItems",
    "maxLength",
    "maxProperties",
    "minItems",
    "minLength",
    "minProperties",
    "multipleOf",
    "not",
    "optional",
    "patternProperties",
    "prefixItems",
    "propertyNames",
    "readOnly",
    "then",
    "uniqueItems",
    "writeOnly",
];

/// Supported JSON Schema types for properties/items.
const SUPPORTED_TYPES: &[&str] = &["string", "boolean", "integer", "number", "object", "array"];

fn supported_type(ty: &str) -> bool {
    SUPPORTED_TYPES.contains(&ty)
}

type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Validates the schema (parsed as Value). Returns Ok(()) if no issues, or
/// Err(SchemaValidationError) with all collected issues.
pub fn validate_schema(value: &serde_json::Value) -> Result<(), SchemaValidationError> {
    let serde_json::Value::Object(root) = value else {
        return Err(SchemaValidationError {
            issues: vec![SchemaValidationIssue {
                path: String::new(),
                kind: SchemaValidationIssueKind::RootNotObjectOrUnion,
            }],
        });
    };

    let mut validator: Validator<'_> = Validator {
        root,
        known: KNOWN_KEYWORDS.iter().copied().collect(),
        issues: Vec::new(),
    };
    validator.check_root();
    validator.walk(root, "");

    if validator.issues.is_empty() {
        Ok(())
    } else {
        tracing::debug!(issues = validator.issues.len(), "schema failed strict validation");
        Err(SchemaValidationError {
            issues: validator.issues,
        })
    }
}

struct Validator<'a> {
    root: &'a JsonObject,
    known: BTreeSet<&'static str>,
    issues: Vec<SchemaValidationIssue>,
}

impl Validator<'_> {
    fn push(&mut self, path: &str, kind: SchemaValidationIssueKind) {
        self.issues.push(SchemaValidationIssue {
            path: path.to_string(),
            kind,
        });
    }

    fn check_root(&mut self) {
        let root: &JsonObject = self.root;
        if root.contains_key("oneOf") && root.contains_key("discriminator") {
            return;
        }
        match root.get("type") {
            None => self.push("", SchemaValidationIssueKind::RootMissingType),
            Some(serde_json::Value::String(s)) if s == "object" => {
                let has_members = |key: &str| {
                    root.get(key)
                        .and_then(serde_json::Value::as_object)
                        .is_some_and(|o| !o.is_empty())
                };
                if !has_members("properties")
                    && !has_members("$defs")
                    && !has_members("definitions")
                    && !root.contains_key("allOf")
                {
                    self.push("", SchemaValidationIssueKind::NoTypesToGenerate);
                }
            }
            Some(serde_json::Value::String(_)) => {
                self.push("", SchemaValidationIssueKind::RootNotObjectOrUnion);
            }
            // Malformed `type` values are reported by `walk`.
            Some(_) => {}
        }
    }

    fn walk(&mut self, obj: &JsonObject, path: &str) {
        // type "array" without "items"
        if obj.get("type").and_then(serde_json::Value::as_str) == Some("array")
            && obj.get("items").is_none()
        {
            self.push(path, SchemaValidationIssueKind::ArrayMissingItems);
        }

        for (key, val) in obj {
            let key_path: String = json_pointer::format(path, key);
            if !self.known.contains(key.as_str()) {
                let kind: SchemaValidationIssueKind =
                    if UNSUPPORTED_KEYWORDS.contains(&key.as_str()) {
                        SchemaValidationIssueKind::UnsupportedKeyword(key.clone())
                    } else {
                        SchemaValidationIssueKind::UnknownKeyword(key.clone())
                    };
                self.push(&key_path, kind);
                continue;
            }
            match key.as_str() {
                "type" => self.check_type(val, &key_path),
                "required" => self.check_required(val, obj, &key_path),
                "enum" => self.check_enum(val, &key_path),
                "items" => match val.as_object() {
                    Some(items) => self.walk(items, &key_path),
                    None => self.push(&key_path, SchemaValidationIssueKind::InvalidItemsFormat),
                },
                "properties" => self.walk_schema_map(val, &key_path, None),
                "$defs" | "definitions" => self.walk_schema_map(
                    val,
                    &key_path,
                    Some(SchemaValidationIssueKind::InvalidDefinitions),
                ),
                "additionalProperties" => self.check_additional_properties(val, &key_path),
                "default" => self.check_default(val, &key_path),
                "minimum" | "maximum" => {
                    if !val.is_number() {
                        self.push(&key_path, SchemaValidationIssueKind::InvalidMinimumMaximum);
                    }
                }
                "pattern" => self.check_pattern(val, &key_path),
                "$ref" => match val.as_str() {
                    Some(reference) => self.check_ref(reference, &key_path),
                    None => self.push(
                        &key_path,
                        SchemaValidationIssueKind::InvalidRef(val.to_string()),
                    ),
                },
                "oneOf" => {
                    self.walk_schema_list(val, &key_path);
                    if !obj.contains_key("discriminator") {
                        self.push(&key_path, SchemaValidationIssueKind::OneOfWithoutDiscriminator);
                    }
                }
                "allOf" => self.walk_schema_list(val, &key_path),
                "discriminator" => self.check_discriminator(val, obj, &key_path),
                _ => {}
            }
        }
    }

    /// `properties`, `$defs` and `definitions`: an object whose values are schemas.
    fn walk_schema_map(
        &mut self,
        value: &serde_json::Value,
        path: &str,
        malformed: Option<SchemaValidationIssueKind>,
    ) {
        let Some(map) = value.as_object() else {
            if let Some(kind) = malformed {
                self.push(path, kind);
            }
            return;
        };
        for (name, schema) in map {
            let schema_path: String = json_pointer::format(path, name);
            match schema.as_object() {
                Some(schema) => self.walk(schema, &schema_path),
                None => {
                    if let Some(kind) = malformed.clone() {
                        self.push(&schema_path, kind);
                    }
                }
            }
        }
    }

    /// `oneOf` and `allOf`: a non-empty array of schemas.
    fn walk_schema_list(&mut self, value: &serde_json::Value, path: &str) {
        let members: &[serde_json::Value] = match value.as_array() {
            Some(members) if !members.is_empty() => members,
            _ => {
                self.push(path, SchemaValidationIssueKind::InvalidSubschemaList);
                return;
            }
        };
        for (index, member) in members.iter().enumerate() {
            let member_path: String = json_pointer::format(path, &index.to_string());
            match member.as_object() {
                Some(member) => self.walk(member, &member_path),
                None => self.push(&member_path, SchemaValidationIssueKind::InvalidSubschemaList),
            }
        }
    }

    fn check_type(&mut self, value: &serde_json::Value, path: &str) {
        match value {
            serde_json::Value::String(s) if s == "null" => {
                self.push(path, SchemaValidationIssueKind::NullTypeNotSupported);
            }
            serde_json::Value::String(s) if !supported_type(s) => {
                self.push(path, SchemaValidationIssueKind::PropertyWithUnsupportedType);
            }
            serde_json::Value::String(_) => {}
            serde_json::Value::Array(_) => {
                self.push(path, SchemaValidationIssueKind::TypeArrayNotSupported);
            }
            _ => self.push(path, SchemaValidationIssueKind::InvalidTypeValue),
        }
    }

    fn check_required(&mut self, value: &serde_json::Value, parent: &JsonObject, path: &str) {
        let Some(names) = value.as_array() else {
            self.push(path, SchemaValidationIssueKind::InvalidRequiredFormat);
            return;
        };
        // Composed objects may require properties declared by their members.
        let composed: bool = parent.contains_key("allOf") || parent.contains_key("$ref");
        let declared: BTreeSet<&str> = parent
            .get("properties")
            .and_then(serde_json::Value::as_object)
            .map(|o| o.keys().map(String::as_str).collect())
            .unwrap_or_default();
        for name in names {
            match name.as_str() {
                Some(name) if composed || declared.contains(name) => {}
                Some(_) => {
                    self.push(path, SchemaValidationIssueKind::RequiredPropertyNotInProperties);
                    return;
                }
                None => {
                    self.push(path, SchemaValidationIssueKind::InvalidRequiredFormat);
                    return;
                }
            }
        }
    }

    fn check_enum(&mut self, value: &serde_json::Value, path: &str) {
        let Some(values) = value.as_array() else {
            self.push(path, SchemaValidationIssueKind::InvalidEnumFormat);
            return;
        };
        if values.is_empty() {
            self.push(path, SchemaValidationIssueKind::EnumEmpty);
        }
        if !values.iter().all(serde_json::Value::is_string) {
            self.push(path, SchemaValidationIssueKind::EnumContainsNonStringValues);
        }
    }

    fn check_additional_properties(&mut self, value: &serde_json::Value, path: &str) {
        if value.is_boolean() {
            return;
        }
        let Some(schema) = value.as_object() else {
            self.push(path, SchemaValidationIssueKind::AdditionalPropertiesUnsupportedSchema);
            return;
        };
        let typed: bool = match schema.get("type").and_then(serde_json::Value::as_str) {
            Some(ty) => supported_type(ty),
            None => schema.contains_key("$ref"),
        };
        if !typed {
            self.push(path, SchemaValidationIssueKind::AdditionalPropertiesUnsupportedSchema);
        }
        self.walk(schema, path);
    }

    fn check_default(&mut self, value: &serde_json::Value, path: &str) {
        if value.is_object() {
            self.push(path, SchemaValidationIssueKind::UnsupportedDefaultObject);
        } else if value.as_array().is_some_and(|a| !a.is_empty()) {
            self.push(path, SchemaValidationIssueKind::UnsupportedDefaultNonEmptyArray);
        }
    }

    fn check_pattern(&mut self, value: &serde_json::Value, path: &str) {
        let Some(pattern) = value.as_str() else {
            self.push(
                path,
                SchemaValidationIssueKind::InvalidPattern("must be a string".to_string()),
            );
            return;
        };
        if let Err(e) = regress::Regex::new(pattern) {
            self.push(path, SchemaValidationIssueKind::InvalidPattern(e.to_string()));
        }
    }

    /// Only `#`, `#/$defs/<name>` and `#/definitions/<name>` resolve.
    fn check_ref(&mut self, reference: &str, path: &str) {
        let Some(segments) = json_pointer::local_ref_segments(reference) else {
            self.push(path, SchemaValidationIssueKind::InvalidRef(reference.to_string()));
            return;
        };
        let resolves: bool = match segments.as_slice() {
            [] => true,
            [container, name] if container == "$defs" || container == "definitions" => self
                .root
                .get(container.as_str())
                .and_then(serde_json::Value::as_object)
                .is_some_and(|defs| defs.contains_key(name.as_str())),
            _ => false,
        };
        if !resolves {
            self.push(path, SchemaValidationIssueKind::UnresolvedRef(reference.to_string()));
        }
    }

    fn check_discriminator(&mut self, value: &serde_json::Value, parent: &JsonObject, path: &str) {
        let well_formed: bool = parent.contains_key("oneOf")
            && value.as_object().is_some_and(|d| {
                d.get("propertyName").is_some_and(serde_json::Value::is_string)
                    && d.get("mapping").is_none_or(serde_json::Value::is_object)
            });
        if !well_formed {
            self.push(path, SchemaValidationIssueKind::InvalidDiscriminator);
            return;
        }
        let mapping = value
            .get("mapping")
            .and_then(serde_json::Value::as_object)
            .into_iter()
            .flatten();
        let mapping_path: String = json_pointer::format(path, "mapping");
        for (tag, target) in mapping {
            let target_path: String = json_pointer::format(&mapping_path, tag);
            match target.as_str() {
                Some(reference) => self.check_ref(reference, &target_path),
                None => self.push(&target_path, SchemaValidationIssueKind::InvalidDiscriminator),
            }
        }
    }
}
