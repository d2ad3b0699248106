//! Settings for JSON Schema code generation.

/// Settings that control code generation behavior.
#[derive(Debug, Clone, Default)]
pub struct GenerateSettings {
    /// Wrap every generated item in `pub mod` blocks, one per `.` or `::`
    /// separated segment (converted to `snake_case`). `None` emits items at
    /// the top level of the output file.
    pub namespace: Option<String>,

    /// When true, fail before code generation if the schema contains invalid
    /// or unsupported JSON Schema features. Collects all issues and returns
    /// them together.
    ///
    /// **Default: false (disabled).** When false, unsupported features are
    /// silently ignored.
    pub deny_invalid_unknown_json_schema: bool,

    /// Skip the `//!` file header. Inner doc comments are not valid where a
    /// macro expands, so the proc-macro sets this.
    pub omit_header: bool,
}

impl GenerateSettings {
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    #[must_use]
    pub fn with_deny_invalid_unknown_json_schema(mut self, deny: bool) -> Self {
        self.deny_invalid_unknown_json_schema = deny;
        self
    }

    #[must_use]
    pub fn with_omit_header(mut self, omit: bool) -> Self {
        self.omit_header = omit;
        self
    }
}
