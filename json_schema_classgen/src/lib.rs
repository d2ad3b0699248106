//! Generate serde-annotated Rust types from JSON Schema.
//!
//! Object schemas become structs and string enums become enums. A `oneOf`
//! with an OpenAPI-style `discriminator` becomes a polymorphic base: an
//! internally tagged enum over its variant structs, plus a [`Polymorphic`]
//! impl that registers each variant's tag. The [`deserialize`] and
//! [`serialize`] functions read and write those bases by discriminator.

mod codegen;
mod error;
mod json_pointer;
mod output;
mod polymorphic;
mod schema;
mod settings;
mod validate;

pub use error::{
    JsonSchemaGenError, PolymorphicError, SchemaValidationError, SchemaValidationIssue,
    SchemaValidationIssueKind,
};
pub use output::{ensure_dir, write_artifact, write_atomic};
pub use polymorphic::{Polymorphic, SerializeOptions, VariantRegistry, deserialize, serialize};
pub use schema::JsonSchema;
pub use settings::GenerateSettings;

use std::io::Write;
use std::path::Path;

/// Generate Rust types from a JSON Schema string and write to `writer`.
///
/// The writer can be any type implementing `Write`, such as `File`, `Vec<u8>`, or
/// `Cursor<Vec<u8>>`, enabling easy unit testing without file system interaction.
///
/// # Errors
///
/// Returns `JsonSchemaGenError` if the schema JSON is invalid, strict validation
/// fails, the root is neither an object nor a discriminated `oneOf`, a `$ref`
/// cannot be resolved, or writing to the writer fails.
pub fn generate_to_writer<W: Write>(
    schema_json: &str,
    writer: &mut W,
    settings: &GenerateSettings,
) -> Result<(), JsonSchemaGenError> {
    codegen::generate_to_writer(schema_json, writer, settings)
}

/// Generate Rust types from a JSON Schema string and return them as a `String`.
///
/// # Errors
///
/// Same as [`generate_to_writer`].
pub fn generate_to_string(
    schema_json: &str,
    settings: &GenerateSettings,
) -> Result<String, JsonSchemaGenError> {
    let mut buffer: Vec<u8> = Vec::new();
    generate_to_writer(schema_json, &mut buffer, settings)?;
    String::from_utf8(buffer).map_err(|e| JsonSchemaGenError::GenericError(e.to_string()))
}

/// Generate Rust types from a JSON Schema file and write them to an output file.
///
/// The output is replaced atomically: on failure an existing output file is
/// left untouched. Missing parent directories of the output are created.
///
/// # Errors
///
/// Returns `JsonSchemaGenError` if reading the input file fails, generation
/// fails, or writing the output file fails.
pub fn generate_from_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    settings: &GenerateSettings,
) -> Result<(), JsonSchemaGenError> {
    let input_path: &Path = input_path.as_ref();
    let output_path: &Path = output_path.as_ref();
    let schema_json: String = std::fs::read_to_string(input_path)?;
    let generated: String = generate_to_string(&schema_json, settings)?;
    output::write_atomic(output_path, generated.as_bytes())?;
    tracing::info!(
        input = %input_path.display(),
        output = %output_path.display(),
        "generated Rust types"
    );
    Ok(())
}
