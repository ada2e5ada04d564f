mod convert;
pub use convert::{FieldArgs, ModelConverter, ScaffoldOptions};

mod field;
pub use field::{FormField, FormFieldTy, FormValidator};

mod spec;
pub use spec::{FormErrors, FormSpec, ValidatedForm, ValidationOutcome};

use crate::db::Db;

use backoffice_core::schema::Model;
use backoffice_core::Result;

/// Build a form specification for `model`, one field per editable attribute.
///
/// Primary-key and foreign-key columns are never included. Failure to find a
/// converter for any attribute fails the whole build; fields are never
/// silently omitted.
pub async fn scaffold_form(
    db: &Db,
    model: &Model,
    converter: &ModelConverter,
    options: &ScaffoldOptions,
) -> Result<FormSpec> {
    let mut fields = vec![];

    for attr in db.registry().mapper(model).attrs() {
        let name = attr.name.app_name.snake_case();
        if let Some(only) = &options.only {
            if !only.iter().any(|o| *o == name) {
                continue;
            }
        }
        if options.exclude.iter().any(|e| *e == name) {
            continue;
        }
        if let Some(field) = converter.convert(db, model, attr).await? {
            fields.push(field);
        }
    }

    fields.extend(options.extra_fields.iter().cloned());

    Ok(FormSpec {
        name: format!("{}Form", model.name.upper_camel_case()),
        fields,
    })
}
