//! Procedural macro `json_schema_to_rust!` for json-schema-classgen.
//!
//! Expands a JSON Schema string literal into the same items the
//! `json-schema-classgen` binary would write, minus the file header.
//! The expansion refers to `serde`, and to `json_schema_classgen` when the
//! schema declares a discriminated union, so the calling crate needs both.
//!
//! ```ignore
//! json_schema_classgen_macro::json_schema_to_rust!(r#"{
//!     "title": "Point",
//!     "type": "object",
//!     "required": ["x", "y"],
//!     "properties": { "x": { "type": "number" }, "y": { "type": "number" } }
//! }"#);
//! ```

use json_schema_classgen::{GenerateSettings, generate_to_string};
use proc_macro::TokenStream;
use syn::{LitStr, parse_macro_input};

/// Generate Rust types from an inline JSON Schema.
///
/// Schema and generation errors become a `compile_error!` pointing at the literal.
#[proc_macro]
pub fn json_schema_to_rust(input: TokenStream) -> TokenStream {
    let literal: LitStr = parse_macro_input!(input as LitStr);
    match expand(&literal) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(literal: &LitStr) -> syn::Result<proc_macro2::TokenStream> {
    let settings: GenerateSettings = GenerateSettings::default().with_omit_header(true);
    let source: String = generate_to_string(&literal.value(), &settings)
        .map_err(|e| syn::Error::new(literal.span(), format!("json_schema_to_rust!: {e}")))?;
    source.parse::<proc_macro2::TokenStream>().map_err(|e| {
        syn::Error::new(
            literal.span(),
            format!("json_schema_to_rust!: generated code does not tokenize: {e}"),
        )
    })
}
