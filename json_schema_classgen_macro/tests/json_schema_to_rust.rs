//! Types expanded at compile time from an inline schema with a discriminated base.

mod pets {
    json_schema_classgen_macro::json_schema_to_rust!(
        r##"{
            "title": "Pet",
            "description": "A pet, discriminated by species.",
            "oneOf": [
                { "$ref": "#/definitions/dog" },
                { "$ref": "#/definitions/cat" }
            ],
            "discriminator": {
                "propertyName": "species",
                "mapping": {
                    "canine": "#/definitions/dog",
                    "feline": "#/definitions/cat"
                }
            },
            "definitions": {
                "base": {
                    "type": "object",
                    "required": ["id", "name"],
                    "properties": {
                        "id": { "type": "string", "format": "uuid" },
                        "name": { "type": "string" }
                    }
                },
                "color": { "type": "string", "enum": ["black", "white", "ginger"] },
                "dog": {
                    "type": "object",
                    "allOf": [{ "$ref": "#/definitions/base" }],
                    "properties": {
                        "species": { "type": "string" },
                        "good_boy": { "type": "boolean", "default": true }
                    }
                },
                "cat": {
                    "type": "object",
                    "allOf": [{ "$ref": "#/definitions/base" }],
                    "required": ["coat"],
                    "properties": {
                        "species": { "type": "string" },
                        "coat": { "$ref": "#/definitions/color" }
                    }
                }
            }
        }"##
    );
}

use json_schema_classgen::{Polymorphic, PolymorphicError, SerializeOptions, deserialize, serialize};
use pets::{Base, Cat, Color, Dog, Pet};

const REX_ID: &str = "67e55044-10b1-426f-9247-bb680e5fe0c8";

fn rex() -> Dog {
    Dog {
        good_boy: Some(false),
        id: uuid::Uuid::parse_str(REX_ID).expect("uuid"),
        name: "Rex".to_string(),
    }
}

#[test]
fn dog_serializes_with_mapped_tag() {
    let pet: Pet = Pet::from(rex());
    let actual: String = serialize(&pet, &SerializeOptions::default()).expect("serialize");
    let expected: String =
        format!(r#"{{"species":"canine","good_boy":false,"id":"{REX_ID}","name":"Rex"}}"#);
    assert_eq!(actual, expected);

    let back: Pet = deserialize(&actual).expect("deserialize");
    assert_eq!(back, pet);
}

#[test]
fn schema_default_fills_missing_field() {
    let text: String = format!(r#"{{"species":"canine","id":"{REX_ID}","name":"Rex"}}"#);
    let pet: Pet = deserialize(&text).expect("deserialize");
    let Pet::Dog(dog) = pet else {
        panic!("expected a Dog, got {pet:?}");
    };
    assert_eq!(dog.good_boy, Some(true));
    assert_eq!(dog.id.to_string(), REX_ID);
    assert_eq!(dog.name, "Rex");
}

#[test]
fn cat_carries_enum_property() {
    let text: String =
        format!(r#"{{"species":"feline","coat":"ginger","id":"{REX_ID}","name":"Tom"}}"#);
    let pet: Pet = deserialize(&text).expect("deserialize");
    assert_eq!(pet.variant_tag(), "feline");
    let Pet::Cat(cat) = pet else {
        panic!("expected a Cat, got {pet:?}");
    };
    assert_eq!(cat.coat, Color::Ginger);
    assert_eq!(cat.name, "Tom");
    assert_eq!(cat.id.to_string(), REX_ID);

    let again: Cat = Cat {
        coat: Color::Black,
        id: cat.id,
        name: cat.name,
    };
    assert_eq!(Pet::from(again.clone()), Pet::Cat(again));
}

#[test]
fn enum_values_keep_their_json_spelling() {
    let actual: Vec<String> = [Color::Black, Color::Ginger, Color::White]
        .iter()
        .map(|c| serde_json::to_string(c).expect("serialize"))
        .collect();
    assert_eq!(actual, vec![r#""black""#, r#""ginger""#, r#""white""#]);
}

#[test]
fn unreferenced_definitions_are_generated() {
    let base: Base = serde_json::from_str(&format!(r#"{{"id":"{REX_ID}","name":"Shared"}}"#))
        .expect("deserialize base");
    assert_eq!(base.id.to_string(), REX_ID);
    assert_eq!(base.name, "Shared");
}

#[test]
fn registry_uses_mapping_values() {
    assert_eq!(Pet::DISCRIMINATOR, "species");
    assert_eq!(Pet::VARIANTS, &["canine", "feline"]);
    assert_eq!(Pet::from(rex()).variant_tag(), "canine");
}

#[test]
fn unmapped_species_is_rejected() {
    let err: PolymorphicError = deserialize::<Pet>(r#"{"species":"dog","name":"Rex"}"#).unwrap_err();
    assert!(
        matches!(&err, PolymorphicError::UnknownVariant { tag, .. } if tag == "dog"),
        "got {err:?}"
    );
}
