use std::error;
use std::fmt;

/// Error type for JSON Schema code generation operations.
#[derive(Debug)]
pub enum JsonSchemaGenError {
    /// Generic error with a message.
    GenericError(String),

    /// I/O error (e.g., reading schema file, writing output file).
    IoError(std::io::Error),

    /// JSON parsing error.
    JsonError(serde_json::Error),

    /// Strict validation rejected the schema.
    SchemaValidation(SchemaValidationError),
}

impl error::Error for JsonSchemaGenError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::GenericError(_) => None,
            Self::IoError(io_error) => Some(io_error),
            Self::JsonError(json_error) => Some(json_error),
            Self::SchemaValidation(validation_error) => Some(validation_error),
        }
    }
}

impl fmt::Display for JsonSchemaGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GenericError(message) => write!(f, "{message}"),
            Self::IoError(io_error) => fmt::Display::fmt(io_error, f),
            Self::JsonError(json_error) => fmt::Display::fmt(json_error, f),
            Self::SchemaValidation(validation_error) => fmt::Display::fmt(validation_error, f),
        }
    }
}

impl From<&str> for JsonSchemaGenError {
    fn from(message: &str) -> Self {
        Self::GenericError(message.to_string())
    }
}

impl From<String> for JsonSchemaGenError {
    fn from(message: String) -> Self {
        Self::GenericError(message)
    }
}

impl From<std::io::Error> for JsonSchemaGenError {
    fn from(io_error: std::io::Error) -> Self {
        Self::IoError(io_error)
    }
}

impl From<serde_json::Error> for JsonSchemaGenError {
    fn from(json_error: serde_json::Error) -> Self {
        Self::JsonError(json_error)
    }
}

impl From<SchemaValidationError> for JsonSchemaGenError {
    fn from(validation_error: SchemaValidationError) -> Self {
        Self::SchemaValidation(validation_error)
    }
}

/// All issues found by strict validation, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaValidationError {
    pub issues: Vec<SchemaValidationIssue>,
}

impl error::Error for SchemaValidationError {}

impl fmt::Display for SchemaValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "schema validation failed with {} issue(s):",
            self.issues.len()
        )?;
        for issue in &self.issues {
            write!(f, "\n  {issue}")?;
        }
        Ok(())
    }
}

/// A single strict-validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaValidationIssue {
    /// JSON Pointer (RFC 6901) to the offending location; empty for the root.
    pub path: String,
    pub kind: SchemaValidationIssueKind,
}

impl fmt::Display for SchemaValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path: &str = if self.path.is_empty() { "#" } else { &self.path };
        write!(f, "{path}: {}", self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaValidationIssueKind {
    RootNotObjectOrUnion,
    RootMissingType,
    NoTypesToGenerate,
    UnknownKeyword(String),
    UnsupportedKeyword(String),
    InvalidTypeValue,
    TypeArrayNotSupported,
    NullTypeNotSupported,
    PropertyWithUnsupportedType,
    InvalidRequiredFormat,
    RequiredPropertyNotInProperties,
    InvalidEnumFormat,
    EnumEmpty,
    EnumContainsNonStringValues,
    ArrayMissingItems,
    InvalidItemsFormat,
    AdditionalPropertiesUnsupportedSchema,
    UnsupportedDefaultObject,
    UnsupportedDefaultNonEmptyArray,
    InvalidMinimumMaximum,
    InvalidRef(String),
    UnresolvedRef(String),
    InvalidDefinitions,
    InvalidSubschemaList,
    OneOfWithoutDiscriminator,
    InvalidDiscriminator,
    InvalidPattern(String),
}

impl fmt::Display for SchemaValidationIssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootNotObjectOrUnion => {
                write!(f, "root schema must be an object or a discriminated oneOf")
            }
            Self::RootMissingType => write!(f, "root schema has no \"type\""),
            Self::NoTypesToGenerate => write!(f, "root object has no properties"),
            Self::UnknownKeyword(key) => write!(f, "unknown keyword \"{key}\""),
            Self::UnsupportedKeyword(key) => write!(f, "unsupported keyword \"{key}\""),
            Self::InvalidTypeValue => write!(f, "\"type\" must be a string"),
            Self::TypeArrayNotSupported => write!(f, "\"type\" arrays are not supported"),
            Self::NullTypeNotSupported => write!(f, "\"null\" type is not supported"),
            Self::PropertyWithUnsupportedType => write!(f, "unsupported \"type\" value"),
            Self::InvalidRequiredFormat => write!(f, "\"required\" must be an array of strings"),
            Self::RequiredPropertyNotInProperties => {
                write!(f, "\"required\" names a property that is not declared")
            }
            Self::InvalidEnumFormat => write!(f, "\"enum\" must be an array"),
            Self::EnumEmpty => write!(f, "\"enum\" is empty"),
            Self::EnumContainsNonStringValues => write!(f, "\"enum\" values must be strings"),
            Self::ArrayMissingItems => write!(f, "array schema has no \"items\""),
            Self::InvalidItemsFormat => write!(f, "\"items\" must be a schema object"),
            Self::AdditionalPropertiesUnsupportedSchema => {
                write!(f, "unsupported \"additionalProperties\" schema")
            }
            Self::UnsupportedDefaultObject => write!(f, "object defaults are not supported"),
            Self::UnsupportedDefaultNonEmptyArray => {
                write!(f, "non-empty array defaults are not supported")
            }
            Self::InvalidMinimumMaximum => write!(f, "bound must be a number"),
            Self::InvalidRef(reference) => write!(f, "\"$ref\" {reference:?} is not a local reference"),
            Self::UnresolvedRef(reference) => write!(f, "\"$ref\" {reference:?} does not resolve"),
            Self::InvalidDefinitions => write!(f, "definitions must be an object of schemas"),
            Self::InvalidSubschemaList => write!(f, "expected a non-empty array of schemas"),
            Self::OneOfWithoutDiscriminator => {
                write!(f, "\"oneOf\" is only supported together with \"discriminator\"")
            }
            Self::InvalidDiscriminator => write!(
                f,
                "\"discriminator\" needs a string \"propertyName\" and a string-valued \"mapping\""
            ),
            Self::InvalidPattern(message) => write!(f, "invalid \"pattern\": {message}"),
        }
    }
}

/// Errors of the discriminator-based polymorphic (de)serializer.
#[derive(Debug)]
pub enum PolymorphicError {
    /// The document is not well-formed JSON, or not a JSON object.
    Format(serde_json::Error),

    /// The discriminator property is absent or not a string.
    MissingDiscriminator { property: &'static str },

    /// The discriminator value names no registered variant.
    UnknownVariant {
        property: &'static str,
        tag: String,
        known: Vec<&'static str>,
    },

    /// The discriminator resolved, but the remaining properties do not fit the variant.
    InvalidVariant {
        tag: String,
        source: serde_json::Error,
    },

    /// Two variants claim the same discriminator value.
    DuplicateVariant { tag: &'static str },
}

impl error::Error for PolymorphicError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Format(json_error) | Self::InvalidVariant { source: json_error, .. } => {
                Some(json_error)
            }
            Self::MissingDiscriminator { .. }
            | Self::UnknownVariant { .. }
            | Self::DuplicateVariant { .. } => None,
        }
    }
}

impl fmt::Display for PolymorphicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format(json_error) => write!(f, "malformed document: {json_error}"),
            Self::MissingDiscriminator { property } => {
                write!(f, "document has no string discriminator \"{property}\"")
            }
            Self::UnknownVariant {
                property,
                tag,
                known,
            } => write!(
                f,
                "unknown variant \"{tag}\" for discriminator \"{property}\", expected one of: {}",
                known.join(", ")
            ),
            Self::InvalidVariant { tag, source } => {
                write!(f, "invalid \"{tag}\" document: {source}")
            }
            Self::DuplicateVariant { tag } => {
                write!(f, "discriminator value \"{tag}\" is registered more than once")
            }
        }
    }
}

impl From<serde_json::Error> for PolymorphicError {
    fn from(json_error: serde_json::Error) -> Self {
        Self::Format(json_error)
    }
}
