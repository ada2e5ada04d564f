use super::{FormField, FormFieldTy, FormValidator};
use crate::form_data::FormData;

use backoffice_core::schema::{FieldId, FieldTy, Model, Registry};
use backoffice_core::stmt::Value;

use indexmap::IndexMap;

/// A scaffolded form: an ordered list of field specifications.
#[derive(Debug, Clone, PartialEq)]
pub struct FormSpec {
    pub name: String,
    pub fields: Vec<FormField>,
}

/// Per-field validation failures, rendered back inline with a 400-class
/// response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormErrors {
    errors: IndexMap<String, String>,
}

/// A validated submission split into column assignments and relationship
/// target-id lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedForm {
    pub columns: Vec<(FieldId, Value)>,
    pub relations: Vec<(FieldId, Vec<Value>)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Valid(ValidatedForm),
    Invalid(FormErrors),
}

impl FormErrors {
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.insert(field.into(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors
            .iter()
            .map(|(field, message)| (field.as_str(), message.as_str()))
    }
}

impl FormSpec {
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Validate posted data against the form and the model's declared
    /// types.
    ///
    /// Cast failures and missing required values are collected per field
    /// and returned as [`ValidationOutcome::Invalid`]; they never escape as
    /// errors.
    pub fn validate(
        &self,
        registry: &Registry,
        model: &Model,
        data: &FormData,
    ) -> ValidationOutcome {
        let mut validated = ValidatedForm::default();
        let mut errors = FormErrors::default();

        for form_field in &self.fields {
            let Some(attr) = model.field_by_name(&form_field.name) else {
                // Caller-supplied extra field with no model binding.
                continue;
            };

            match &attr.ty {
                FieldTy::Column(ty) => {
                    if matches!(form_field.ty, FormFieldTy::Checkbox) {
                        let checked = data
                            .get(&form_field.name)
                            .map(|raw| !raw.is_empty() && raw != "false")
                            .unwrap_or(false);
                        validated.columns.push((attr.id, Value::Bool(checked)));
                        continue;
                    }

                    let raw = data.get(&form_field.name).unwrap_or_default();
                    if raw.is_empty() {
                        if form_field.is_required() {
                            errors.insert(&form_field.name, "This field is required");
                        } else {
                            validated.columns.push((attr.id, Value::Null));
                        }
                        continue;
                    }

                    if let Some(max) = max_length(form_field) {
                        if raw.chars().count() > max {
                            errors.insert(
                                &form_field.name,
                                format!("Value is longer than {max} characters"),
                            );
                            continue;
                        }
                    }

                    match ty.cast(raw) {
                        Ok(value) => validated.columns.push((attr.id, value)),
                        Err(message) => errors.insert(&form_field.name, message),
                    }
                }
                FieldTy::Relation(relation) => {
                    let pk_ty = registry
                        .model(relation.target)
                        .primary_key_field()
                        .column_ty()
                        .cloned();

                    let mut ids = vec![];
                    let mut failed = false;
                    for raw in data.get_all(&form_field.name) {
                        if raw.is_empty() {
                            continue;
                        }
                        let cast = match &pk_ty {
                            Some(ty) => ty.cast(raw),
                            None => Ok(Value::String(raw.clone())),
                        };
                        match cast {
                            Ok(value) => ids.push(value),
                            Err(message) => {
                                errors.insert(&form_field.name, message);
                                failed = true;
                                break;
                            }
                        }
                    }
                    if failed {
                        continue;
                    }

                    if ids.is_empty() && form_field.is_required() {
                        errors.insert(&form_field.name, "This field is required");
                        continue;
                    }
                    validated.relations.push((attr.id, ids));
                }
                // Computed properties are display-only; submissions never
                // write them.
                FieldTy::Computed(_) => {}
            }
        }

        if errors.is_empty() {
            ValidationOutcome::Valid(validated)
        } else {
            ValidationOutcome::Invalid(errors)
        }
    }
}

fn max_length(field: &FormField) -> Option<usize> {
    field.validators.iter().find_map(|validator| match validator {
        FormValidator::Length { max } => Some(*max),
        _ => None,
    })
}
