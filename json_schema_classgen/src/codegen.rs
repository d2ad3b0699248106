use crate::error::JsonSchemaGenError;
use crate::json_pointer;
use crate::schema::{AdditionalProperties, Discriminator, JsonSchema};
use crate::settings::GenerateSettings;
use crate::validate;
use heck::{ToSnakeCase, ToUpperCamelCase};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

const HEADER: &str = "//! Generated by json-schema-classgen. Do not edit manually.";

/// Derive line shared by every generated struct and enum.
const DERIVE: &str = "#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]";

/// Crate path used by generated `Polymorphic` impls.
const RUNTIME_CRATE: &str = "json_schema_classgen";

/// Bound on `allOf`/`$ref` folding; deeper chains are treated as cycles.
const MAX_ALL_OF_DEPTH: usize = 32;

const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Keywords that cannot be raw identifiers.
const RESERVED_PATH_KEYWORDS: &[&str] = &["crate", "self", "super", "Self"];

/// A Rust type expression plus the generated type it refers to, if any.
#[derive(Debug, Clone, PartialEq)]
struct TypeRef {
    rust: String,
    depends_on: Option<String>,
}

impl TypeRef {
    fn plain(rust: &str) -> Self {
        Self {
            rust: rust.to_string(),
            depends_on: None,
        }
    }

    fn named(name: &str) -> Self {
        Self {
            rust: name.to_string(),
            depends_on: Some(name.to_string()),
        }
    }

    /// Reference back into a type that is still being collected.
    fn boxed(name: &str) -> Self {
        Self {
            rust: format!("Box<{name}>"),
            depends_on: Some(name.to_string()),
        }
    }

    fn json_value() -> Self {
        Self::plain("serde_json::Value")
    }

    fn vec(self) -> Self {
        Self {
            rust: format!("Vec<{}>", self.rust),
            depends_on: self.depends_on,
        }
    }

    fn optional(self) -> Self {
        Self {
            rust: format!("Option<{}>", self.rust),
            depends_on: self.depends_on,
        }
    }

    fn mentions(&self, ident: &str) -> bool {
        self.rust
            .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
            .any(|token| token == ident)
    }
}

/// How a field gets its default value when the JSON key is missing.
#[derive(Debug, PartialEq)]
enum DefaultSpec {
    /// `#[serde(default)]`, i.e. the type's `Default`.
    UseTypeDefault,
    /// `#[serde(default = "fn_name")]` returning `rust_expr`.
    Custom { fn_name: String, rust_expr: String },
}

/// Type kind for default resolution.
enum DefaultTypeKind {
    Bool,
    Integer(String),
    Number(String),
    String,
    Uuid,
    Vec,
    Enum {
        type_name: String,
        variants: Vec<(String, String)>,
    },
    Object,
}

#[derive(PartialEq)]
struct FieldDef {
    name: String,
    json_key: String,
    ty: TypeRef,
    default: Option<DefaultSpec>,
    description: Option<String>,
}

#[derive(PartialEq)]
struct StructDef {
    name: String,
    fields: Vec<FieldDef>,
    additional_properties: Option<TypeRef>,
    deny_unknown_fields: bool,
    description: Option<String>,
}

/// String enum with its variants (`rust_name`, `json_value`).
#[derive(PartialEq)]
struct EnumDef {
    name: String,
    variants: Vec<(String, String)>,
    description: Option<String>,
}

/// Polymorphic base: an internally tagged enum over variant structs.
#[derive(PartialEq)]
struct UnionDef {
    name: String,
    discriminator: String,
    variants: Vec<UnionVariant>,
    description: Option<String>,
}

#[derive(PartialEq)]
struct UnionVariant {
    tag: String,
    type_name: String,
}

#[derive(PartialEq)]
enum TypeDef {
    Struct(StructDef),
    Union(UnionDef),
}

impl TypeDef {
    fn dependencies(&self) -> Vec<&str> {
        match self {
            Self::Struct(def) => def
                .fields
                .iter()
                .map(|f| &f.ty)
                .chain(def.additional_properties.iter())
                .filter_map(|t| t.depends_on.as_deref())
                .collect(),
            Self::Union(def) => def.variants.iter().map(|v| v.type_name.as_str()).collect(),
        }
    }
}

/// Resolution of a local `$ref`.
struct Target<'a> {
    schema: &'a JsonSchema,
    /// Raw definition key (or the root type name for `#`).
    key: String,
    type_name: String,
}

/// Object view of a schema with its `allOf` members folded in.
#[derive(Default)]
struct ObjectShape<'a> {
    properties: BTreeMap<&'a str, &'a JsonSchema>,
    required: BTreeSet<&'a str>,
    additional_properties: Option<&'a AdditionalProperties>,
}

/// Everything collected from one schema document.
struct Collected {
    root_name: String,
    types: BTreeMap<String, TypeDef>,
    enums: BTreeMap<String, EnumDef>,
}

/// Normalize description: trim and treat empty/whitespace as None.
fn normalize_description(s: Option<&str>) -> Option<String> {
    let trimmed: &str = s?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Convert a string to a Rust type identifier (`PascalCase`).
/// Names that would start with a digit (or be empty) get a `T` prefix.
fn to_type_name(s: &str) -> String {
    let base: String = s.to_upper_camel_case();
    if base.is_empty() || base.starts_with(|c: char| c.is_ascii_digit()) {
        format!("T{base}")
    } else if base == "Self" {
        "SelfType".to_string()
    } else {
        base
    }
}

/// Type name from a property key, preferring a non-blank `title`.
fn struct_name_from_property(property_key: &str, title: Option<&str>) -> String {
    match title.map(str::trim) {
        Some(t) if !t.is_empty() => to_type_name(t),
        _ => to_type_name(property_key),
    }
}

/// Turn a `snake_case` candidate into a usable identifier (raw for keywords).
fn escape_ident(base: String) -> String {
    if RESERVED_PATH_KEYWORDS.contains(&base.as_str()) {
        format!("{base}_")
    } else if RUST_KEYWORDS.contains(&base.as_str()) {
        format!("r#{base}")
    } else {
        base
    }
}

/// Convert a JSON property key to a Rust field name (`snake_case`).
fn to_field_name(key: &str) -> String {
    let base: String = key.to_snake_case();
    if base.is_empty() {
        "field".to_string()
    } else if base.starts_with(|c: char| c.is_ascii_digit()) {
        format!("field_{base}")
    } else {
        escape_ident(base)
    }
}

/// Field name for `key`, suffixed with `_N` when it collides with an earlier field.
fn unique_field_name(key: &str, used: &mut BTreeSet<String>) -> String {
    let base: String = to_field_name(key);
    if used.insert(base.clone()) {
        return base;
    }
    let mut index: usize = 1;
    loop {
        let candidate: String = format!("{base}_{index}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        index += 1;
    }
}

/// The name serde sees for a field (raw identifiers lose their `r#`).
fn serde_name(field_name: &str) -> &str {
    field_name.strip_prefix("r#").unwrap_or(field_name)
}

/// Convert a JSON enum value to a Rust enum variant identifier (`PascalCase`).
/// Prefixes with `E` if the result is empty or starts with a digit.
fn to_rust_variant_name(s: &str) -> String {
    let base: String = s.to_upper_camel_case();
    if base.is_empty() || base.starts_with(|c: char| c.is_ascii_digit()) {
        format!("E{base}")
    } else {
        base
    }
}

/// Returns true if the format indicates a UUID (uuid, uuid1..uuid8, case-insensitive).
fn is_uuid_format(format: Option<&str>) -> bool {
    let Some(f) = format else {
        return false;
    };
    matches!(
        f.to_lowercase().as_str(),
        "uuid" | "uuid1" | "uuid2" | "uuid3" | "uuid4" | "uuid5" | "uuid6" | "uuid7" | "uuid8"
    )
}

/// Build enum variants from JSON Schema enum values: sort, deduplicate, handle collisions.
/// Returns `Vec<(rust_name, json_value)>`.
fn build_enum_variants(enum_values: &[String]) -> Vec<(String, String)> {
    let mut unique: Vec<String> = enum_values.to_vec();
    unique.sort();
    unique.dedup();

    let base_names: Vec<String> = unique.iter().map(|s| to_rust_variant_name(s)).collect();
    let mut name_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for base in &base_names {
        *name_counts.entry(base.as_str()).or_insert(0) += 1;
    }

    let mut next_index: BTreeMap<&str, usize> = BTreeMap::new();
    unique
        .iter()
        .zip(base_names.iter())
        .map(|(json_val, base_name)| {
            let rust_name: String = if name_counts.get(base_name.as_str()).copied() > Some(1) {
                let idx: &mut usize = next_index.entry(base_name.as_str()).or_insert(0);
                let name: String = format!("{base_name}_{idx}");
                *idx += 1;
                name
            } else {
                base_name.clone()
            };
            (rust_name, json_val.clone())
        })
        .collect()
}

/// Choose the smallest Rust integer type that fits the schema's minimum/maximum range.
/// Falls back to `i64` when min/max are absent, not integers, or inverted.
pub(crate) fn choose_integer_type(schema: &JsonSchema) -> &'static str {
    let min_val: Option<i64> = schema.minimum.as_ref().and_then(serde_json::Value::as_i64);
    let max_val: Option<i64> = schema.maximum.as_ref().and_then(serde_json::Value::as_i64);
    let (Some(min_val), Some(max_val)) = (min_val, max_val) else {
        return "i64";
    };
    if min_val > max_val {
        return "i64";
    }
    if min_val >= 0 {
        if max_val <= i64::from(u8::MAX) {
            "u8"
        } else if max_val <= i64::from(u16::MAX) {
            "u16"
        } else if max_val <= i64::from(u32::MAX) {
            "u32"
        } else {
            "u64"
        }
    } else if min_val >= i64::from(i8::MIN) && max_val <= i64::from(i8::MAX) {
        "i8"
    } else if min_val >= i64::from(i16::MIN) && max_val <= i64::from(i16::MAX) {
        "i16"
    } else if min_val >= i64::from(i32::MIN) && max_val <= i64::from(i32::MAX) {
        "i32"
    } else {
        "i64"
    }
}

/// `f32` only when both bounds are present and within `f32` range; otherwise `f64`.
pub(crate) fn choose_number_type(schema: &JsonSchema) -> &'static str {
    let bound = |v: Option<&serde_json::Value>| v.and_then(serde_json::Value::as_f64);
    match (bound(schema.minimum.as_ref()), bound(schema.maximum.as_ref())) {
        (Some(min_val), Some(max_val))
            if min_val >= f64::from(f32::MIN) && max_val <= f64::from(f32::MAX) =>
        {
            "f32"
        }
        _ => "f64",
    }
}

/// Resolve `DefaultSpec` from a property's default value.
/// Returns None if no default, or if the default is unsupported (object, non-empty array, null for required, etc.).
fn resolve_default_spec(
    default_value: Option<&serde_json::Value>,
    type_kind: DefaultTypeKind,
    fn_name: String,
    optional: bool,
) -> Option<DefaultSpec> {
    let dv: &serde_json::Value = default_value?;

    // For optional fields, null means None
    if dv.is_null() {
        return optional.then_some(DefaultSpec::UseTypeDefault);
    }
    let custom = |rust_expr: String| Some(DefaultSpec::Custom { fn_name, rust_expr });

    match type_kind {
        DefaultTypeKind::Bool => {
            if dv.as_bool()? {
                custom("true".to_string())
            } else {
                Some(DefaultSpec::UseTypeDefault)
            }
        }
        DefaultTypeKind::Integer(type_name) => match dv.as_i64()? {
            0 => Some(DefaultSpec::UseTypeDefault),
            n => custom(format!("{n}{type_name}")),
        },
        DefaultTypeKind::Number(type_name) => {
            let n: f64 = dv.as_f64()?;
            if n == 0.0 {
                Some(DefaultSpec::UseTypeDefault)
            } else {
                custom(format!("{n}{type_name}"))
            }
        }
        DefaultTypeKind::String => match dv.as_str()? {
            "" => Some(DefaultSpec::UseTypeDefault),
            s => custom(format!("{s:?}.to_string()")),
        },
        DefaultTypeKind::Uuid => {
            let s: &str = dv.as_str()?;
            custom(format!("Uuid::parse_str({s:?}).expect(\"invalid default uuid\")"))
        }
        DefaultTypeKind::Vec => dv
            .as_array()
            .is_some_and(Vec::is_empty)
            .then_some(DefaultSpec::UseTypeDefault),
        DefaultTypeKind::Enum {
            type_name,
            variants,
        } => {
            let json_str: &str = dv.as_str()?;
            let (rust_name, _) = variants.iter().find(|(_, json_val)| json_val == json_str)?;
            custom(format!("{type_name}::{rust_name}"))
        }
        DefaultTypeKind::Object => None,
    }
}

/// Walks a schema document and records the types to emit.
struct Collector<'a> {
    root: &'a JsonSchema,
    root_name: String,
    types: BTreeMap<String, TypeDef>,
    enums: BTreeMap<String, EnumDef>,
    /// `$ref` -> resolved type, for references already collected.
    resolved: BTreeMap<String, TypeRef>,
    /// References currently being collected; a reference back into one of them is boxed.
    in_progress: BTreeSet<String>,
    /// Schema each generated name was last collected from.
    owners: BTreeMap<String, &'a JsonSchema>,
}

impl<'a> Collector<'a> {
    fn new(root: &'a JsonSchema, root_name: String) -> Self {
        Self {
            root,
            root_name,
            types: BTreeMap::new(),
            enums: BTreeMap::new(),
            resolved: BTreeMap::new(),
            in_progress: BTreeSet::new(),
            owners: BTreeMap::new(),
        }
    }

    fn collect(mut self) -> Result<Collected, JsonSchemaGenError> {
        let root: &'a JsonSchema = self.root;
        let root_name: String = self.root_name.clone();
        self.in_progress.insert("#".to_string());
        if let (Some(members), Some(discriminator)) = (&root.one_of, &root.discriminator) {
            self.collect_union(&root_name, root, members, discriminator)?;
        } else if root.r#type.as_deref() == Some("object") {
            self.collect_struct(&root_name, root, None, false)?;
        } else {
            return Err(JsonSchemaGenError::GenericError(
                "Root schema must have type \"object\" or be a discriminated oneOf".to_string(),
            ));
        }
        self.in_progress.remove("#");
        self.resolved
            .insert("#".to_string(), TypeRef::named(&root_name));

        // Definitions are generated even when nothing references them.
        let containers = [("$defs", &root.defs), ("definitions", &root.definitions)];
        for (container, definitions) in containers {
            let container_path: String = json_pointer::format("", container);
            for key in definitions.iter().flat_map(BTreeMap::keys) {
                let reference: String = format!("#{}", json_pointer::format(&container_path, key));
                self.resolve_ref(&reference)?;
            }
        }

        if self.types.is_empty() && self.enums.is_empty() {
            return Err(JsonSchemaGenError::GenericError(
                "No types to generate (root object has no supported properties)".to_string(),
            ));
        }
        tracing::debug!(
            root = %self.root_name,
            types = self.types.len(),
            enums = self.enums.len(),
            "collected schema types"
        );
        Ok(Collected {
            root_name: self.root_name,
            types: self.types,
            enums: self.enums,
        })
    }

    fn lookup(&self, reference: &str) -> Result<Target<'a>, JsonSchemaGenError> {
        let unresolved =
            || JsonSchemaGenError::GenericError(format!("Unresolved $ref \"{reference}\""));
        let segments: Vec<String> = json_pointer::local_ref_segments(reference).ok_or_else(|| {
            JsonSchemaGenError::GenericError(format!(
                "Unsupported $ref \"{reference}\": only references within the same document are supported"
            ))
        })?;
        let root: &'a JsonSchema = self.root;
        match segments.as_slice() {
            [] => Ok(Target {
                schema: root,
                key: self.root_name.clone(),
                type_name: self.root_name.clone(),
            }),
            [container, key] => {
                let definitions: Option<&'a BTreeMap<String, JsonSchema>> =
                    match container.as_str() {
                        "$defs" => root.defs.as_ref(),
                        "definitions" => root.definitions.as_ref(),
                        _ => None,
                    };
                let schema: &'a JsonSchema = definitions
                    .and_then(|d| d.get(key))
                    .ok_or_else(unresolved)?;
                Ok(Target {
                    schema,
                    key: key.clone(),
                    type_name: struct_name_from_property(key, schema.title.as_deref()),
                })
            }
            _ => Err(unresolved()),
        }
    }

    fn resolve_ref(&mut self, reference: &str) -> Result<Option<TypeRef>, JsonSchemaGenError> {
        if let Some(resolved) = self.resolved.get(reference) {
            return Ok(Some(resolved.clone()));
        }
        let target: Target<'a> = self.lookup(reference)?;
        if self.in_progress.contains(reference) {
            return Ok(Some(TypeRef::boxed(&target.type_name)));
        }
        self.in_progress.insert(reference.to_string());
        let resolved: Result<Option<TypeRef>, JsonSchemaGenError> =
            self.resolve_schema(&target.type_name, target.schema);
        self.in_progress.remove(reference);
        let resolved: Option<TypeRef> = resolved?;
        if let Some(type_ref) = &resolved {
            self.resolved
                .insert(reference.to_string(), type_ref.clone());
        }
        Ok(resolved)
    }

    /// Resolve the Rust type for `schema`, collecting any struct, enum or union it needs.
    /// `hint` names the generated type. Returns `None` for unsupported schemas.
    fn resolve_schema(
        &mut self,
        hint: &str,
        schema: &'a JsonSchema,
    ) -> Result<Option<TypeRef>, JsonSchemaGenError> {
        if let Some(reference) = &schema.reference {
            return self.resolve_ref(reference);
        }
        if let (Some(members), Some(discriminator)) = (&schema.one_of, &schema.discriminator) {
            self.collect_union(hint, schema, members, discriminator)?;
            return Ok(Some(TypeRef::named(hint)));
        }
        // Check for enum before type match
        if let Some(values) = schema.string_enum_values() {
            self.record_enum(
                EnumDef {
                    name: hint.to_string(),
                    variants: build_enum_variants(&values),
                    description: normalize_description(schema.description.as_deref()),
                },
                schema,
            )?;
            return Ok(Some(TypeRef::plain(hint)));
        }
        if schema.all_of.is_some() {
            return self.object_type(hint, schema).map(Some);
        }
        let resolved: TypeRef = match schema.r#type.as_deref() {
            Some("string") if is_uuid_format(schema.format.as_deref()) => TypeRef::plain("Uuid"),
            Some("string") => TypeRef::plain("String"),
            Some("boolean") => TypeRef::plain("bool"),
            Some("integer") => TypeRef::plain(choose_integer_type(schema)),
            Some("number") => TypeRef::plain(choose_number_type(schema)),
            Some("object") => self.object_type(hint, schema)?,
            Some("array") => {
                let Some(items) = schema.items.as_deref() else {
                    return Ok(None);
                };
                let item_hint: String = match items.title.as_deref().map(str::trim) {
                    Some(t) if !t.is_empty() => to_type_name(t),
                    _ => hint.to_string(),
                };
                return Ok(self.resolve_schema(&item_hint, items)?.map(TypeRef::vec));
            }
            // Ignore other types (null, etc.)
            _ => return Ok(None),
        };
        Ok(Some(resolved))
    }

    /// A named struct when the object has anything to hold, else a free-form JSON value.
    fn object_type(
        &mut self,
        name: &str,
        schema: &'a JsonSchema,
    ) -> Result<TypeRef, JsonSchemaGenError> {
        if self.collect_struct(name, schema, None, false)? {
            Ok(TypeRef::named(name))
        } else {
            Ok(TypeRef::json_value())
        }
    }

    /// Merge `schema`'s own properties with those of its `allOf` members.
    fn object_shape(&self, schema: &'a JsonSchema) -> Result<ObjectShape<'a>, JsonSchemaGenError> {
        let mut shape: ObjectShape<'a> = ObjectShape::default();
        self.fold_object(schema, &mut shape, 0)?;
        Ok(shape)
    }

    fn fold_object(
        &self,
        schema: &'a JsonSchema,
        shape: &mut ObjectShape<'a>,
        depth: usize,
    ) -> Result<(), JsonSchemaGenError> {
        if depth > MAX_ALL_OF_DEPTH {
            return Err(JsonSchemaGenError::GenericError(
                "allOf composition is nested too deeply or is cyclic".to_string(),
            ));
        }
        if let Some(reference) = &schema.reference {
            let target: Target<'a> = self.lookup(reference)?;
            return self.fold_object(target.schema, shape, depth + 1);
        }
        for member in schema.all_of.iter().flatten() {
            self.fold_object(member, shape, depth + 1)?;
        }
        for (key, prop) in schema.properties.iter().flatten() {
            shape.properties.insert(key.as_str(), prop);
        }
        shape
            .required
            .extend(schema.required.iter().flatten().map(String::as_str));
        if schema.additional_properties.is_some() {
            shape.additional_properties = schema.additional_properties.as_ref();
        }
        Ok(())
    }

    /// Collect the struct for an object schema. Returns whether a struct was recorded:
    /// objects with nothing to hold are skipped unless `force` is set (union variants).
    fn collect_struct(
        &mut self,
        name: &str,
        schema: &'a JsonSchema,
        skip_property: Option<&str>,
        force: bool,
    ) -> Result<bool, JsonSchemaGenError> {
        let shape: ObjectShape<'a> = self.object_shape(schema)?;
        let deny_unknown_fields: bool = matches!(
            shape.additional_properties,
            Some(AdditionalProperties::Allowed(false))
        );
        let mut used_names: BTreeSet<String> = BTreeSet::new();
        let additional_properties: Option<TypeRef> = match shape.additional_properties {
            Some(AdditionalProperties::Schema(value_schema)) => {
                used_names.insert("additional_properties".to_string());
                let hint: String = if value_schema.string_enum_values().is_some() {
                    format!("{name}Value")
                } else {
                    format!("{name}Extra")
                };
                Some(
                    self.resolve_schema(&hint, value_schema)?
                        .unwrap_or_else(TypeRef::json_value),
                )
            }
            _ => None,
        };

        let mut fields: Vec<FieldDef> = Vec::with_capacity(shape.properties.len());
        for (&key, &prop) in &shape.properties {
            if skip_property == Some(key) {
                continue;
            }
            let hint: String = struct_name_from_property(key, prop.title.as_deref());
            let Some(base) = self.resolve_schema(&hint, prop)? else {
                continue;
            };
            // Required/optional comes from the object-level `required` list only.
            let optional: bool = !shape.required.contains(key);
            let field_name: String = unique_field_name(key, &mut used_names);
            let default: Option<DefaultSpec> = self.default_kind(prop, &base).and_then(|kind| {
                let fn_name: String = format!(
                    "default_{}_{}",
                    name.to_snake_case(),
                    serde_name(&field_name)
                );
                resolve_default_spec(prop.default.value(), kind, fn_name, optional)
            });
            fields.push(FieldDef {
                name: field_name,
                json_key: key.to_string(),
                ty: if optional { base.optional() } else { base },
                default,
                description: normalize_description(prop.description.as_deref()),
            });
        }

        if fields.is_empty() && !deny_unknown_fields && additional_properties.is_none() && !force
        {
            return Ok(false);
        }
        self.record_type(
            name,
            TypeDef::Struct(StructDef {
                name: name.to_string(),
                fields,
                additional_properties,
                deny_unknown_fields,
                description: normalize_description(schema.description.as_deref()),
            }),
            schema,
        )?;
        Ok(true)
    }

    /// Record a struct or union collected from `schema`. Re-collecting the same schema
    /// replaces its entry; another schema may only reuse the name for an identical type.
    fn record_type(
        &mut self,
        name: &str,
        def: TypeDef,
        schema: &'a JsonSchema,
    ) -> Result<(), JsonSchemaGenError> {
        let clash: bool = self.enums.contains_key(name)
            || (!self.owned_by(name, schema)
                && self.types.get(name).is_some_and(|existing| *existing != def));
        if clash {
            return Err(name_clash(name));
        }
        self.owners.insert(name.to_string(), schema);
        self.types.insert(name.to_string(), def);
        Ok(())
    }

    fn record_enum(
        &mut self,
        def: EnumDef,
        schema: &'a JsonSchema,
    ) -> Result<(), JsonSchemaGenError> {
        let clash: bool = self.types.contains_key(&def.name)
            || (!self.owned_by(&def.name, schema)
                && self.enums.get(&def.name).is_some_and(|existing| *existing != def));
        if clash {
            return Err(name_clash(&def.name));
        }
        self.owners.insert(def.name.clone(), schema);
        self.enums.insert(def.name.clone(), def);
        Ok(())
    }

    fn owned_by(&self, name: &str, schema: &JsonSchema) -> bool {
        self.owners
            .get(name)
            .is_some_and(|owner| std::ptr::eq(*owner, schema))
    }

    fn default_kind(&self, prop: &JsonSchema, base: &TypeRef) -> Option<DefaultTypeKind> {
        if prop.reference.is_some() || prop.one_of.is_some() {
            return None;
        }
        if prop.string_enum_values().is_some() {
            let variants: Vec<(String, String)> = self.enums.get(&base.rust)?.variants.clone();
            return Some(DefaultTypeKind::Enum {
                type_name: base.rust.clone(),
                variants,
            });
        }
        let kind: DefaultTypeKind = match prop.r#type.as_deref()? {
            "boolean" => DefaultTypeKind::Bool,
            "integer" => DefaultTypeKind::Integer(base.rust.clone()),
            "number" => DefaultTypeKind::Number(base.rust.clone()),
            "string" if base.rust == "Uuid" => DefaultTypeKind::Uuid,
            "string" => DefaultTypeKind::String,
            "array" => DefaultTypeKind::Vec,
            "object" => DefaultTypeKind::Object,
            _ => return None,
        };
        Some(kind)
    }

    /// Collect a discriminated `oneOf` as a union named `name`, plus one struct per variant.
    fn collect_union(
        &mut self,
        name: &str,
        schema: &'a JsonSchema,
        members: &'a [JsonSchema],
        discriminator: &'a Discriminator,
    ) -> Result<(), JsonSchemaGenError> {
        let property: &str = &discriminator.property_name;
        let mut tags_by_ref: BTreeMap<&str, &str> = BTreeMap::new();
        for (tag, reference) in &discriminator.mapping {
            if tags_by_ref.insert(reference.as_str(), tag.as_str()).is_some() {
                return Err(JsonSchemaGenError::GenericError(format!(
                    "Discriminator mapping of \"{name}\" assigns more than one value to \"{reference}\""
                )));
            }
        }

        let mut listed_refs: BTreeSet<&str> = BTreeSet::new();
        let mut seen_tags: BTreeSet<String> = BTreeSet::new();
        let mut seen_types: BTreeSet<String> = BTreeSet::new();
        let mut variants: Vec<UnionVariant> = Vec::with_capacity(members.len());
        for (index, member) in members.iter().enumerate() {
            let reference: Option<&'a str> = member.reference.as_deref();
            let (member_schema, key, type_name): (&'a JsonSchema, Option<String>, Option<String>) =
                match reference {
                    Some(r) => {
                        listed_refs.insert(r);
                        let target: Target<'a> = self.lookup(r)?;
                        (target.schema, Some(target.key), Some(target.type_name))
                    }
                    None => (member, None, None),
                };
            let pinned: Option<String> = self
                .object_shape(member_schema)?
                .properties
                .get(property)
                .and_then(|p| p.pinned_string());
            let title: Option<&str> = member_schema
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty());
            let type_name: String = type_name
                .or_else(|| title.map(to_type_name))
                .or_else(|| pinned.as_deref().map(to_type_name))
                .unwrap_or_else(|| format!("{name}Variant{}", index + 1));
            let tag: String = reference
                .and_then(|r| tags_by_ref.get(r))
                .map(|t| (*t).to_string())
                .or(pinned)
                .or(key)
                .or_else(|| title.map(String::from))
                .unwrap_or_else(|| type_name.clone());

            if !seen_tags.insert(tag.clone()) {
                return Err(JsonSchemaGenError::GenericError(format!(
                    "Discriminator value \"{tag}\" of \"{name}\" maps to more than one variant"
                )));
            }
            if !seen_types.insert(type_name.clone()) {
                return Err(JsonSchemaGenError::GenericError(format!(
                    "\"{name}\" lists variant \"{type_name}\" more than once"
                )));
            }

            if let Some(r) = reference {
                self.in_progress.insert(r.to_string());
            }
            let collected: Result<bool, JsonSchemaGenError> =
                self.collect_struct(&type_name, member_schema, Some(property), true);
            if let Some(r) = reference {
                self.in_progress.remove(r);
                self.resolved
                    .insert(r.to_string(), TypeRef::named(&type_name));
            }
            collected?;
            variants.push(UnionVariant { tag, type_name });
        }

        for (tag, reference) in &discriminator.mapping {
            if !listed_refs.contains(reference.as_str()) {
                return Err(JsonSchemaGenError::GenericError(format!(
                    "Discriminator mapping \"{tag}\" of \"{name}\" targets \"{reference}\", which is not listed in oneOf"
                )));
            }
        }

        tracing::debug!(union = name, variants = variants.len(), "collected discriminated union");
        self.record_type(
            name,
            TypeDef::Union(UnionDef {
                name: name.to_string(),
                discriminator: property.to_string(),
                variants,
                description: normalize_description(schema.description.as_deref()),
            }),
            schema,
        )
    }
}

fn name_clash(name: &str) -> JsonSchemaGenError {
    JsonSchemaGenError::GenericError(format!(
        "Type name \"{name}\" is generated by more than one schema with different definitions"
    ))
}

/// Emit a doc comment from a description: each line becomes a `///` line.
fn emit_doc_comment<W: Write>(
    writer: &mut W,
    description: Option<&str>,
    line_prefix: &str,
) -> std::io::Result<()> {
    let Some(desc) = description else {
        return Ok(());
    };
    for line in desc.trim().lines() {
        let line: &str = line.trim_end();
        if line.is_empty() {
            writeln!(writer, "{line_prefix}///")?;
        } else {
            writeln!(writer, "{line_prefix}/// {line}")?;
        }
    }
    Ok(())
}

fn emit_enum<W: Write>(enum_def: &EnumDef, writer: &mut W) -> std::io::Result<()> {
    emit_doc_comment(writer, enum_def.description.as_deref(), "")?;
    writeln!(writer, "{DERIVE}")?;
    writeln!(writer, "pub enum {} {{", enum_def.name)?;
    for (rust_name, json_value) in &enum_def.variants {
        writeln!(writer, "    #[serde(rename = {json_value:?})]")?;
        writeln!(writer, "    {rust_name},")?;
    }
    writeln!(writer, "}}")?;
    writeln!(writer)?;
    Ok(())
}

/// Emit default functions for all custom defaults, following struct emission order.
fn emit_default_functions<W: Write>(
    types: &BTreeMap<String, TypeDef>,
    order: &[String],
    writer: &mut W,
) -> std::io::Result<()> {
    let structs = order.iter().filter_map(|name| match types.get(name) {
        Some(TypeDef::Struct(def)) => Some(def),
        _ => None,
    });
    for struct_def in structs {
        for field in &struct_def.fields {
            let Some(DefaultSpec::Custom { fn_name, rust_expr }) = &field.default else {
                continue;
            };
            writeln!(writer, "fn {fn_name}() -> {} {{", field.ty.rust)?;
            if field.ty.rust.starts_with("Option<") {
                writeln!(writer, "    Some({rust_expr})")?;
            } else {
                writeln!(writer, "    {rust_expr}")?;
            }
            writeln!(writer, "}}")?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

fn emit_field<W: Write>(field: &FieldDef, writer: &mut W) -> std::io::Result<()> {
    emit_doc_comment(writer, field.description.as_deref(), "    ")?;
    if serde_name(&field.name) != field.json_key {
        writeln!(writer, "    #[serde(rename = {:?})]", field.json_key)?;
    }
    match &field.default {
        Some(DefaultSpec::UseTypeDefault) => writeln!(writer, "    #[serde(default)]")?,
        Some(DefaultSpec::Custom { fn_name, .. }) => {
            writeln!(writer, "    #[serde(default = {fn_name:?})]")?;
        }
        None => {}
    }
    writeln!(writer, "    pub {}: {},", field.name, field.ty.rust)
}

fn emit_struct<W: Write>(struct_def: &StructDef, writer: &mut W) -> std::io::Result<()> {
    emit_doc_comment(writer, struct_def.description.as_deref(), "")?;
    writeln!(writer, "{DERIVE}")?;
    if struct_def.deny_unknown_fields {
        writeln!(writer, "#[serde(deny_unknown_fields)]")?;
    }
    if struct_def.fields.is_empty() && struct_def.additional_properties.is_none() {
        writeln!(writer, "pub struct {} {{}}", struct_def.name)?;
        writeln!(writer)?;
        return Ok(());
    }
    writeln!(writer, "pub struct {} {{", struct_def.name)?;
    for field in &struct_def.fields {
        emit_field(field, writer)?;
    }
    if let Some(value_type) = &struct_def.additional_properties {
        writeln!(writer, "    #[serde(flatten)]")?;
        writeln!(
            writer,
            "    pub additional_properties: BTreeMap<String, {}>,",
            value_type.rust
        )?;
    }
    writeln!(writer, "}}")?;
    writeln!(writer)?;
    Ok(())
}

/// Emit the tagged enum, `From` conversions and the `Polymorphic` registry impl.
fn emit_union<W: Write>(union_def: &UnionDef, writer: &mut W) -> std::io::Result<()> {
    let name: &str = &union_def.name;
    emit_doc_comment(writer, union_def.description.as_deref(), "")?;
    writeln!(writer, "{DERIVE}")?;
    writeln!(writer, "#[serde(tag = {:?})]", union_def.discriminator)?;
    writeln!(writer, "pub enum {name} {{")?;
    for variant in &union_def.variants {
        writeln!(writer, "    #[serde(rename = {:?})]", variant.tag)?;
        writeln!(writer, "    {0}({0}),", variant.type_name)?;
    }
    writeln!(writer, "}}")?;
    writeln!(writer)?;

    for variant in &union_def.variants {
        let type_name: &str = &variant.type_name;
        writeln!(writer, "impl From<{type_name}> for {name} {{")?;
        writeln!(writer, "    fn from(value: {type_name}) -> Self {{")?;
        writeln!(writer, "        Self::{type_name}(value)")?;
        writeln!(writer, "    }}")?;
        writeln!(writer, "}}")?;
        writeln!(writer)?;
    }

    let tags: Vec<String> = union_def
        .variants
        .iter()
        .map(|v| format!("{:?}", v.tag))
        .collect();
    writeln!(writer, "impl {RUNTIME_CRATE}::Polymorphic for {name} {{")?;
    writeln!(
        writer,
        "    const DISCRIMINATOR: &'static str = {:?};",
        union_def.discriminator
    )?;
    writeln!(
        writer,
        "    const VARIANTS: &'static [&'static str] = &[{}];",
        tags.join(", ")
    )?;
    writeln!(writer)?;
    writeln!(writer, "    fn variant_tag(&self) -> &'static str {{")?;
    writeln!(writer, "        match self {{")?;
    for variant in &union_def.variants {
        writeln!(
            writer,
            "            Self::{}(_) => {:?},",
            variant.type_name, variant.tag
        )?;
    }
    writeln!(writer, "        }}")?;
    writeln!(writer, "    }}")?;
    writeln!(writer, "}}")?;
    writeln!(writer)?;
    Ok(())
}

/// Determine emission order: dependencies before the types that use them, starting from the root.
fn emission_order(types: &BTreeMap<String, TypeDef>, root_name: &str) -> Vec<String> {
    fn visit(
        name: &str,
        types: &BTreeMap<String, TypeDef>,
        order: &mut Vec<String>,
        visited: &mut BTreeSet<String>,
    ) {
        if !visited.insert(name.to_string()) {
            return;
        }
        let Some(def) = types.get(name) else {
            return;
        };
        for dependency in def.dependencies() {
            visit(dependency, types, order, visited);
        }
        order.push(name.to_string());
    }

    let mut order: Vec<String> = Vec::with_capacity(types.len());
    let mut visited: BTreeSet<String> = BTreeSet::new();
    visit(root_name, types, &mut order, &mut visited);
    for name in types.keys() {
        visit(name, types, &mut order, &mut visited);
    }
    order
}

/// Emit imports and every collected item, unindented.
fn emit_items<W: Write>(collected: &Collected, writer: &mut W) -> std::io::Result<()> {
    let structs = || {
        collected.types.values().filter_map(|def| match def {
            TypeDef::Struct(s) => Some(s),
            TypeDef::Union(_) => None,
        })
    };
    writeln!(writer, "use serde::{{Deserialize, Serialize}};")?;
    if structs().any(|s| s.additional_properties.is_some()) {
        writeln!(writer, "use std::collections::BTreeMap;")?;
    }
    let needs_uuid: bool = structs().any(|s| {
        s.fields
            .iter()
            .map(|f| &f.ty)
            .chain(s.additional_properties.iter())
            .any(|t| t.mentions("Uuid"))
    });
    if needs_uuid {
        writeln!(writer, "use uuid::Uuid;")?;
    }
    writeln!(writer)?;

    // Enums first (alphabetically), then default functions, then structs and unions
    for enum_def in collected.enums.values() {
        emit_enum(enum_def, writer)?;
    }
    let order: Vec<String> = emission_order(&collected.types, &collected.root_name);
    emit_default_functions(&collected.types, &order, writer)?;
    for name in &order {
        match collected.types.get(name) {
            Some(TypeDef::Struct(def)) => emit_struct(def, writer)?,
            Some(TypeDef::Union(def)) => emit_union(def, writer)?,
            None => {}
        }
    }
    Ok(())
}

/// Module path segments for a namespace such as `Fruit.Schemas` or `fruit::schemas`.
fn namespace_segments(namespace: Option<&str>) -> Vec<String> {
    let Some(ns) = namespace else {
        return Vec::new();
    };
    ns.split("::")
        .flat_map(|part| part.split('.'))
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let base: String = part.to_snake_case();
            if base.is_empty() || base.starts_with(|c: char| c.is_ascii_digit()) {
                format!("ns_{base}")
            } else {
                escape_ident(base)
            }
        })
        .collect()
}

/// Write `body` inside nested `pub mod` blocks, indenting four spaces per level.
fn emit_in_modules<W: Write>(
    segments: &[String],
    body: &str,
    writer: &mut W,
) -> std::io::Result<()> {
    for (depth, segment) in segments.iter().enumerate() {
        writeln!(writer, "{}pub mod {segment} {{", "    ".repeat(depth))?;
    }
    let inner: String = "    ".repeat(segments.len());
    for line in body.trim_end().lines() {
        if line.is_empty() {
            writeln!(writer)?;
        } else {
            writeln!(writer, "{inner}{line}")?;
        }
    }
    for depth in (0..segments.len()).rev() {
        writeln!(writer, "{}}}", "    ".repeat(depth))?;
    }
    Ok(())
}

/// Generate Rust types from a JSON Schema string and write to `writer`.
///
/// # Errors
///
/// Returns `JsonSchemaGenError` if the schema is not valid JSON, fails strict
/// validation, has an unsupported root or `$ref`, or writing fails.
pub fn generate_to_writer<W: Write>(
    schema_json: &str,
    writer: &mut W,
    settings: &GenerateSettings,
) -> Result<(), JsonSchemaGenError> {
    let schema_value: serde_json::Value = serde_json::from_str(schema_json)?;
    if settings.deny_invalid_unknown_json_schema {
        validate::validate_schema(&schema_value)?;
    }
    let schema: JsonSchema = serde_json::from_value(schema_value)?;

    let root_name: String = match schema.title.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => to_type_name(t),
        _ => "Root".to_string(),
    };
    let collected: Collected = Collector::new(&schema, root_name).collect()?;

    let mut body: Vec<u8> = Vec::new();
    emit_items(&collected, &mut body)?;

    if !settings.omit_header {
        writeln!(writer, "{HEADER}")?;
        writeln!(writer)?;
    }
    let segments: Vec<String> = namespace_segments(settings.namespace.as_deref());
    if segments.is_empty() {
        writer.write_all(&body)?;
    } else {
        let body: String = String::from_utf8(body).map_err(|e| e.to_string())?;
        emit_in_modules(&segments, &body, writer)?;
    }
    Ok(())
}
