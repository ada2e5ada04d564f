use super::{Field, FieldId, FieldTy, Name};
use crate::stmt::{self, Value};

use std::fmt;

/// The conventional name of the foreign-key column backing a relationship
/// attribute: `{relation_name}_id`.
pub(crate) fn foreign_key_name(relation_name: &str) -> String {
    format!("{relation_name}_id")
}

#[derive(Debug)]
pub struct Model {
    /// Uniquely identifies the model within the registry
    pub id: ModelId,

    /// Name of the model
    pub name: Name,

    /// Dotted module path the model was declared under, used for path-based
    /// lookups.
    pub module: Option<String>,

    /// Name of the backing table, when it differs from the model name.
    pub table_name: Option<String>,

    /// Fields contained by the model, in declaration order.
    pub fields: Vec<Field>,

    /// The resolved single-column primary key.
    pub primary_key: FieldId,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct ModelId(pub usize);

impl Model {
    #[track_caller]
    pub fn field(&self, field: impl Into<FieldId>) -> &Field {
        let field_id = field.into();
        assert_eq!(self.id, field_id.model);
        &self.fields[field_id.index]
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|field| field.name.app_name.snake_case() == name)
    }

    pub fn primary_key_field(&self) -> &Field {
        &self.fields[self.primary_key.index]
    }

    pub fn table_name(&self) -> String {
        self.table_name
            .clone()
            .unwrap_or_else(|| self.name.snake_case())
    }

    /// Fully qualified dotted name, e.g. `crm.models.User`.
    pub fn qualified_name(&self) -> String {
        match &self.module {
            Some(module) => format!("{}.{}", module, self.name.upper_camel_case()),
            None => self.name.upper_camel_case(),
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|field| field.is_column())
    }

    pub fn relations(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|field| field.is_relation())
    }

    /// The foreign-key column conventionally backing the named relationship
    /// attribute, if the model carries one.
    pub fn foreign_key_for(&self, relation_name: &str) -> Option<&Field> {
        self.field_by_name(&foreign_key_name(relation_name))
            .filter(|field| field.is_column())
    }

    /// A point-lookup query for the row whose primary key equals `value`.
    pub fn find_by_id(&self, value: impl Into<Value>) -> stmt::Select {
        stmt::Select::new(
            self.id,
            stmt::Expr::eq(self.primary_key, stmt::Expr::value(value.into())),
        )
    }
}

impl ModelId {
    /// Create a `FieldId` representing the current model's field at index
    /// `index`.
    pub const fn field(self, index: usize) -> FieldId {
        FieldId { model: self, index }
    }

    pub(crate) const fn placeholder() -> Self {
        Self(usize::MAX)
    }
}

impl From<&Self> for ModelId {
    fn from(src: &Self) -> Self {
        *src
    }
}

impl From<&Model> for ModelId {
    fn from(value: &Model) -> Self {
        value.id
    }
}

impl fmt::Debug for ModelId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "ModelId({})", self.0)
    }
}

impl Model {
    /// Relation fields paired with their relation metadata.
    pub fn relation_fields(&self) -> impl Iterator<Item = (&Field, &super::Relation)> {
        self.fields.iter().filter_map(|field| match &field.ty {
            FieldTy::Relation(relation) => Some((field, relation)),
            _ => None,
        })
    }
}
