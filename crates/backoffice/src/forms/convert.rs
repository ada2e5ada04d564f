use super::{FormField, FormFieldTy, FormValidator};
use crate::db::Db;

use backoffice_core::schema::{ColumnTy, Direction, Field, FieldTy, Model};
use backoffice_core::stmt::{Row, Select, Value};
use backoffice_core::{Error, Result};

use indexmap::IndexMap;

/// Field selection and extras for one form build.
#[derive(Debug, Clone, Default)]
pub struct ScaffoldOptions {
    /// When set, only these attributes are included.
    pub only: Option<Vec<String>>,

    /// Attributes to leave out.
    pub exclude: Vec<String>,

    /// Caller-supplied fields appended after the scaffolded ones.
    pub extra_fields: Vec<FormField>,
}

/// Common arguments handed to every converter.
#[derive(Debug, Clone)]
pub struct FieldArgs {
    pub name: String,
    pub label: String,
    pub validators: Vec<FormValidator>,
    pub default: Option<Value>,
    pub description: Option<String>,

    /// `(primary-key-string, display-label)` pairs, populated for
    /// relationship conversions.
    pub choices: Vec<(String, String)>,

    /// Whether a blank choice is allowed, derived from nullability.
    pub allow_blank: bool,
}

type Converter = fn(Option<&ColumnTy>, FieldArgs) -> Result<FormField>;

/// Maps attribute storage types to form-field specifications through a
/// pluggable dispatch table keyed by type name.
///
/// An attribute whose type has no registered converter fails the form build
/// with an unsupported-field-type error. The single whitelisted exception is
/// untyped computed properties, which fall back to a best-effort string
/// field under the `computed` key.
pub struct ModelConverter {
    converters: IndexMap<&'static str, Converter>,
}

impl Default for ModelConverter {
    fn default() -> Self {
        let mut converter = Self {
            converters: IndexMap::new(),
        };
        converter.register(&["string", "uuid"], conv_string);
        converter.register(&["text", "json", "array"], conv_text_area);
        converter.register(&["boolean"], conv_boolean);
        converter.register(&["date"], conv_date);
        converter.register(&["datetime"], conv_datetime);
        converter.register(&["integer"], conv_integer);
        converter.register(&["numeric"], conv_numeric);
        converter.register(&["enum"], conv_enum);
        converter.register(&["computed"], conv_computed);
        converter.register(&["many_to_one"], conv_many_to_one);
        converter.register(&["one_to_many", "many_to_many"], conv_to_many);
        converter
    }
}

impl ModelConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A converter with no registrations, for callers that want to build the
    /// dispatch table from scratch.
    pub fn empty() -> Self {
        Self {
            converters: IndexMap::new(),
        }
    }

    /// Register a converter under one or more type names, replacing any
    /// previous registration.
    pub fn register(&mut self, names: &[&'static str], converter: Converter) {
        for name in names {
            self.converters.insert(name, converter);
        }
    }

    /// Convert one model attribute to a form field.
    ///
    /// Returns `None` for attributes that are never editable: primary keys
    /// and foreign-key columns.
    pub async fn convert(&self, db: &Db, model: &Model, field: &Field) -> Result<Option<FormField>> {
        if field.primary_key || field.foreign_key {
            return Ok(None);
        }

        let mut args = FieldArgs {
            name: field.name.app_name.snake_case(),
            label: field.name.app_name.human(),
            validators: vec![],
            // Callable defaults are computed once here, at form-build time.
            default: field.default.as_ref().map(|default| default.materialize()),
            description: None,
            choices: vec![],
            allow_blank: field.nullable,
        };

        match &field.ty {
            FieldTy::Column(ty) => {
                // Checkboxes post nothing when unchecked, so booleans are
                // always optional.
                if field.nullable || matches!(ty, ColumnTy::Boolean) {
                    args.validators.push(FormValidator::Optional);
                } else {
                    args.validators.push(FormValidator::InputRequired);
                }
                self.dispatch(ty.type_name(), Some(ty), args, field)
                    .map(Some)
            }
            FieldTy::Computed(computed) => {
                args.validators.push(FormValidator::Optional);
                match &computed.value_ty {
                    Some(ty) => self
                        .dispatch(ty.type_name(), Some(ty), args, field)
                        .map(Some),
                    // Descriptor-only untyped property: best-effort string
                    // field.
                    None => self.dispatch("computed", None, args, field).map(Some),
                }
            }
            FieldTy::Relation(_) => {
                let direction = db.registry().relation_direction(field.id);
                let related = db.registry().related_model(field.id);

                args.choices = relation_choices(db, related).await?;
                if field.nullable || direction.is_to_many() {
                    args.validators.push(FormValidator::Optional);
                } else {
                    args.validators.push(FormValidator::InputRequired);
                }

                let key = match direction {
                    Direction::ManyToOne => "many_to_one",
                    Direction::OneToMany => "one_to_many",
                    Direction::ManyToMany => "many_to_many",
                };
                self.dispatch(key, None, args, field).map(Some)
            }
        }
    }

    fn dispatch(
        &self,
        type_name: &str,
        ty: Option<&ColumnTy>,
        args: FieldArgs,
        field: &Field,
    ) -> Result<FormField> {
        let converter = self.converters.get(type_name).ok_or_else(|| {
            Error::unsupported_field_type(type_name, field.name.app_name.snake_case())
        })?;
        converter(ty, args)
    }
}

/// Fetch the full related collection and render it as selection choices.
async fn relation_choices(db: &Db, related: &Model) -> Result<Vec<(String, String)>> {
    let rows = db.all(Select::new(related.id, true)).await?;
    Ok(rows
        .iter()
        .map(|row| {
            let pk = row.value(related.primary_key);
            (pk.to_string(), display_label(related, row))
        })
        .collect())
}

/// A human-readable label for a related row: its first non-key string
/// column, falling back to `Model(pk)`.
fn display_label(model: &Model, row: &Row) -> String {
    for field in model.columns() {
        if field.primary_key || field.foreign_key {
            continue;
        }
        if let Value::String(text) = row.value(field) {
            return text.clone();
        }
    }
    format!(
        "{}({})",
        model.name.upper_camel_case(),
        row.value(model.primary_key)
    )
}

fn base_field(ty: FormFieldTy, args: FieldArgs) -> FormField {
    FormField {
        name: args.name,
        label: args.label,
        ty,
        validators: args.validators,
        default: args.default,
        description: args.description,
    }
}

fn conv_string(ty: Option<&ColumnTy>, mut args: FieldArgs) -> Result<FormField> {
    let max_length = match ty {
        Some(ColumnTy::String { max_length }) => *max_length,
        _ => None,
    };
    if let Some(max) = max_length {
        args.validators.push(FormValidator::Length { max });
    }
    Ok(base_field(FormFieldTy::Text { max_length }, args))
}

fn conv_text_area(_ty: Option<&ColumnTy>, args: FieldArgs) -> Result<FormField> {
    Ok(base_field(FormFieldTy::TextArea, args))
}

fn conv_boolean(_ty: Option<&ColumnTy>, args: FieldArgs) -> Result<FormField> {
    Ok(base_field(FormFieldTy::Checkbox, args))
}

fn conv_date(_ty: Option<&ColumnTy>, args: FieldArgs) -> Result<FormField> {
    Ok(base_field(FormFieldTy::Date, args))
}

fn conv_datetime(_ty: Option<&ColumnTy>, args: FieldArgs) -> Result<FormField> {
    Ok(base_field(FormFieldTy::DateTime, args))
}

fn conv_integer(_ty: Option<&ColumnTy>, args: FieldArgs) -> Result<FormField> {
    Ok(base_field(FormFieldTy::Integer, args))
}

fn conv_numeric(_ty: Option<&ColumnTy>, args: FieldArgs) -> Result<FormField> {
    Ok(base_field(FormFieldTy::Decimal, args))
}

fn conv_enum(ty: Option<&ColumnTy>, args: FieldArgs) -> Result<FormField> {
    let choices = match ty {
        Some(ColumnTy::Enum(labels)) => labels
            .iter()
            .map(|label| (label.clone(), label.clone()))
            .collect(),
        _ => vec![],
    };
    let allow_blank = args.allow_blank;
    Ok(base_field(
        FormFieldTy::Select {
            choices,
            allow_blank,
        },
        args,
    ))
}

fn conv_computed(_ty: Option<&ColumnTy>, args: FieldArgs) -> Result<FormField> {
    Ok(base_field(FormFieldTy::Text { max_length: None }, args))
}

fn conv_many_to_one(_ty: Option<&ColumnTy>, args: FieldArgs) -> Result<FormField> {
    let choices = args.choices.clone();
    let allow_blank = args.allow_blank;
    Ok(base_field(
        FormFieldTy::Select {
            choices,
            allow_blank,
        },
        args,
    ))
}

fn conv_to_many(_ty: Option<&ColumnTy>, args: FieldArgs) -> Result<FormField> {
    let choices = args.choices.clone();
    Ok(base_field(FormFieldTy::SelectMultiple { choices }, args))
}
