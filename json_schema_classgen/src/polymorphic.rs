//! Discriminator-based polymorphic (de)serialization.
//!
//! A polymorphic base is an internally tagged enum whose variants wrap the
//! concrete variant structs. The generator emits an [`Polymorphic`] impl for
//! every discriminated union, naming the discriminator property and the tag
//! registered for each variant. [`deserialize`] checks the tag against that
//! registry before serde builds the variant, so an unknown tag is reported as
//! [`PolymorphicError::UnknownVariant`] instead of a generic parse failure.

use crate::error::PolymorphicError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

/// A base type whose variants are distinguished by a discriminator property.
pub trait Polymorphic: Serialize + DeserializeOwned {
    /// JSON property that carries the variant tag.
    const DISCRIMINATOR: &'static str;

    /// Every registered tag, one per variant, in declaration order.
    const VARIANTS: &'static [&'static str];

    /// Tag of this value's concrete variant.
    fn variant_tag(&self) -> &'static str;
}

/// Discriminator value -> variant index for one [`Polymorphic`] type.
#[derive(Debug, Clone)]
pub struct VariantRegistry {
    discriminator: &'static str,
    tags: BTreeMap<&'static str, usize>,
    declared: &'static [&'static str],
}

impl VariantRegistry {
    /// Build the registry for `T`, rejecting tag sets that are not injective.
    ///
    /// # Errors
    ///
    /// Returns [`PolymorphicError::DuplicateVariant`] when two variants share a tag.
    pub fn of<T: Polymorphic>() -> Result<Self, PolymorphicError> {
        let mut tags: BTreeMap<&'static str, usize> = BTreeMap::new();
        for (index, tag) in T::VARIANTS.iter().copied().enumerate() {
            if tags.insert(tag, index).is_some() {
                return Err(PolymorphicError::DuplicateVariant { tag });
            }
        }
        Ok(Self {
            discriminator: T::DISCRIMINATOR,
            tags,
            declared: T::VARIANTS,
        })
    }

    #[must_use]
    pub const fn discriminator(&self) -> &'static str {
        self.discriminator
    }

    /// Index of the variant registered under `tag`.
    #[must_use]
    pub fn resolve(&self, tag: &str) -> Option<usize> {
        self.tags.get(tag).copied()
    }

    /// Registered tags in declaration order.
    #[must_use]
    pub const fn tags(&self) -> &'static [&'static str] {
        self.declared
    }

    /// Read and check the discriminator of an already parsed document.
    ///
    /// # Errors
    ///
    /// Returns [`PolymorphicError::MissingDiscriminator`] when the property is
    /// absent or not a string, and [`PolymorphicError::UnknownVariant`] when its
    /// value is not registered.
    pub fn tag_of<'a>(
        &self,
        document: &'a serde_json::Map<String, serde_json::Value>,
    ) -> Result<&'a str, PolymorphicError> {
        let tag: &str = document
            .get(self.discriminator)
            .and_then(serde_json::Value::as_str)
            .ok_or(PolymorphicError::MissingDiscriminator {
                property: self.discriminator,
            })?;
        if self.resolve(tag).is_none() {
            return Err(PolymorphicError::UnknownVariant {
                property: self.discriminator,
                tag: tag.to_string(),
                known: self.declared.to_vec(),
            });
        }
        Ok(tag)
    }
}

/// Formatting options for [`serialize`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SerializeOptions {
    /// Indent nested values by two spaces, one property per line.
    pub pretty: bool,
}

impl SerializeOptions {
    #[must_use]
    pub const fn pretty() -> Self {
        Self { pretty: true }
    }
}

/// Serialize `value` to JSON, embedding its discriminator next to the variant's properties.
///
/// # Errors
///
/// Returns [`PolymorphicError::Format`] if serde cannot represent the value.
pub fn serialize<T: Polymorphic>(
    value: &T,
    options: &SerializeOptions,
) -> Result<String, PolymorphicError> {
    let text: String = if options.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    tracing::trace!(
        discriminator = T::DISCRIMINATOR,
        tag = value.variant_tag(),
        "serialized polymorphic value"
    );
    Ok(text)
}

/// Parse a JSON document and build the variant its discriminator names.
///
/// Reading takes no options: compact and pretty documents are both accepted,
/// and the discriminator may appear anywhere among the object's properties.
///
/// # Errors
///
/// - [`PolymorphicError::Format`] when `text` is not JSON or not a JSON object.
/// - [`PolymorphicError::MissingDiscriminator`] when there is no string discriminator.
/// - [`PolymorphicError::UnknownVariant`] when the discriminator is not registered.
/// - [`PolymorphicError::InvalidVariant`] when the variant's properties do not fit.
/// - [`PolymorphicError::DuplicateVariant`] when `T` registers a tag twice.
pub fn deserialize<T: Polymorphic>(text: &str) -> Result<T, PolymorphicError> {
    let registry: VariantRegistry = VariantRegistry::of::<T>()?;
    let document: serde_json::Map<String, serde_json::Value> = serde_json::from_str(text)?;
    let tag: String = registry.tag_of(&document)?.to_string();
    serde_json::from_value(serde_json::Value::Object(document))
        .map_err(|source| PolymorphicError::InvalidVariant { tag, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Circle {
        radius: f64,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Square {
        side: f64,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "kind")]
    enum Shape {
        #[serde(rename = "circle")]
        Circle(Circle),
        #[serde(rename = "square")]
        Square(Square),
    }

    impl Polymorphic for Shape {
        const DISCRIMINATOR: &'static str = "kind";
        const VARIANTS: &'static [&'static str] = &["circle", "square"];

        fn variant_tag(&self) -> &'static str {
            match self {
                Self::Circle(_) => "circle",
                Self::Square(_) => "square",
            }
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(tag = "kind")]
    enum Clashing {
        #[serde(rename = "same")]
        First,
    }

    impl Polymorphic for Clashing {
        const DISCRIMINATOR: &'static str = "kind";
        const VARIANTS: &'static [&'static str] = &["same", "same"];

        fn variant_tag(&self) -> &'static str {
            "same"
        }
    }

    #[test]
    fn compact_serialization_embeds_discriminator() {
        let shape: Shape = Shape::Circle(Circle { radius: 1.5 });
        let actual: String = serialize(&shape, &SerializeOptions::default()).expect("serialize");
        assert_eq!(actual, r#"{"kind":"circle","radius":1.5}"#);
    }

    #[test]
    fn pretty_serialization_indents_two_spaces() {
        let shape: Shape = Shape::Square(Square { side: 2.0 });
        let actual: String = serialize(&shape, &SerializeOptions::pretty()).expect("serialize");
        let expected: &str = "{\n  \"kind\": \"square\",\n  \"side\": 2.0\n}";
        assert_eq!(actual, expected);
    }

    #[test]
    fn deserialize_selects_variant_by_tag() {
        let actual: Shape = deserialize(r#"{"side": 3.0, "kind": "square"}"#).expect("deserialize");
        assert_eq!(actual, Shape::Square(Square { side: 3.0 }));
    }

    #[test]
    fn round_trip_preserves_every_variant() {
        let values: Vec<Shape> = vec![
            Shape::Circle(Circle { radius: 0.25 }),
            Shape::Square(Square { side: 8.0 }),
        ];
        for value in values {
            let text: String = serialize(&value, &SerializeOptions::pretty()).expect("serialize");
            let back: Shape = deserialize(&text).expect("deserialize");
            assert_eq!(back.variant_tag(), value.variant_tag());
            assert_eq!(back, value);
        }
    }

    #[test]
    fn compact_and_pretty_documents_read_the_same() {
        let expected: Shape = Shape::Square(Square { side: 3.0 });
        let compact: Shape = deserialize(r#"{"side":3.0,"kind":"square"}"#).expect("compact");
        let pretty: Shape =
            deserialize("{\n  \"side\": 3.0,\n  \"kind\": \"square\"\n}").expect("pretty");
        assert_eq!(compact, expected);
        assert_eq!(pretty, expected);
    }

    #[test]
    fn malformed_text_is_format_error() {
        let err: PolymorphicError = deserialize::<Shape>("{not json").unwrap_err();
        assert!(matches!(err, PolymorphicError::Format(_)), "got {err:?}");
    }

    #[test]
    fn non_object_document_is_format_error() {
        let err: PolymorphicError = deserialize::<Shape>(r#"["circle"]"#).unwrap_err();
        assert!(matches!(err, PolymorphicError::Format(_)), "got {err:?}");
    }

    #[test]
    fn missing_discriminator_is_reported() {
        let err: PolymorphicError = deserialize::<Shape>(r#"{"radius": 1.0}"#).unwrap_err();
        assert!(
            matches!(err, PolymorphicError::MissingDiscriminator { property: "kind" }),
            "got {err:?}"
        );
    }

    #[test]
    fn non_string_discriminator_is_missing() {
        let err: PolymorphicError = deserialize::<Shape>(r#"{"kind": 7}"#).unwrap_err();
        assert!(
            matches!(err, PolymorphicError::MissingDiscriminator { .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn unknown_tag_is_rejected_with_known_tags() {
        let err: PolymorphicError =
            deserialize::<Shape>(r#"{"kind": "triangle", "side": 1.0}"#).unwrap_err();
        match err {
            PolymorphicError::UnknownVariant {
                property,
                tag,
                known,
            } => {
                assert_eq!(property, "kind");
                assert_eq!(tag, "triangle");
                assert_eq!(known, vec!["circle", "square"]);
            }
            other => panic!("expected UnknownVariant, got {other:?}"),
        }
    }

    #[test]
    fn tag_matching_is_case_sensitive() {
        let err: PolymorphicError =
            deserialize::<Shape>(r#"{"kind": "Circle", "radius": 1.0}"#).unwrap_err();
        assert!(
            matches!(err, PolymorphicError::UnknownVariant { .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn wrong_property_type_is_invalid_variant() {
        let err: PolymorphicError =
            deserialize::<Shape>(r#"{"kind": "circle", "radius": "big"}"#).unwrap_err();
        assert!(
            matches!(&err, PolymorphicError::InvalidVariant { tag, .. } if tag == "circle"),
            "got {err:?}"
        );
    }

    #[test]
    fn registry_rejects_duplicate_tags() {
        let err: PolymorphicError = VariantRegistry::of::<Clashing>().unwrap_err();
        assert!(
            matches!(err, PolymorphicError::DuplicateVariant { tag: "same" }),
            "got {err:?}"
        );
        let first: Clashing = Clashing::First;
        assert_eq!(first.variant_tag(), "same");
        assert!(deserialize::<Clashing>(r#"{"kind": "same"}"#).is_err());
    }

    #[test]
    fn registry_resolves_declared_tags() {
        let registry: VariantRegistry = VariantRegistry::of::<Shape>().expect("registry");
        assert_eq!(registry.discriminator(), "kind");
        assert_eq!(registry.resolve("circle"), Some(0));
        assert_eq!(registry.resolve("square"), Some(1));
        assert_eq!(registry.resolve("hexagon"), None);
        assert_eq!(registry.tags(), &["circle", "square"]);
    }
}
