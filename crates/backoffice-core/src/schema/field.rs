use super::{ColumnTy, ModelId, Name, Relation};
use crate::stmt::Value;

use std::fmt;
use std::sync::Arc;

#[derive(Debug)]
pub struct Field {
    /// Uniquely identifies the field within the containing model.
    pub id: FieldId,

    /// The field name
    pub name: FieldName,

    /// Column, relation, or computed property
    pub ty: FieldTy,

    /// True if the field may hold null.
    pub nullable: bool,

    /// True if the field is the model's primary key.
    pub primary_key: bool,

    /// True if the column holds a foreign key to another model. Foreign-key
    /// columns are never directly editable through generated forms.
    pub foreign_key: bool,

    /// Database-side default, pre-populated into create forms.
    pub default: Option<FieldDefault>,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct FieldId {
    pub model: ModelId,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct FieldName {
    pub app_name: Name,
    pub storage_name: Option<String>,
}

impl FieldName {
    pub fn new(app_name: &str) -> Self {
        Self {
            app_name: Name::new(app_name),
            storage_name: None,
        }
    }

    pub fn storage_name(&self) -> String {
        self.storage_name
            .clone()
            .unwrap_or_else(|| self.app_name.snake_case())
    }
}

#[derive(Debug)]
pub enum FieldTy {
    Column(ColumnTy),
    Relation(Relation),
    Computed(Computed),
}

/// A derived, read-mostly property exposed alongside stored columns.
#[derive(Debug, Clone)]
pub struct Computed {
    /// The property's declared value type. Untyped computed properties fall
    /// back to a best-effort string form field.
    pub value_ty: Option<ColumnTy>,
}

/// A column default: either a literal or a zero-argument callable evaluated
/// once at form-build time.
#[derive(Clone)]
pub enum FieldDefault {
    Value(Value),
    Callable(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl FieldDefault {
    /// Compute the default's current value. Callables are invoked here, once
    /// per call site.
    pub fn materialize(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Callable(f) => f(),
        }
    }
}

impl Field {
    pub fn is_column(&self) -> bool {
        self.ty.is_column()
    }

    pub fn is_relation(&self) -> bool {
        self.ty.is_relation()
    }

    pub fn is_computed(&self) -> bool {
        matches!(self.ty, FieldTy::Computed(_))
    }

    /// The column type for columns and typed computed properties.
    pub fn column_ty(&self) -> Option<&ColumnTy> {
        match &self.ty {
            FieldTy::Column(ty) => Some(ty),
            FieldTy::Computed(computed) => computed.value_ty.as_ref(),
            FieldTy::Relation(_) => None,
        }
    }
}

impl FieldTy {
    pub fn is_column(&self) -> bool {
        matches!(self, Self::Column(_))
    }

    pub fn as_column(&self) -> Option<&ColumnTy> {
        match self {
            Self::Column(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn is_relation(&self) -> bool {
        matches!(self, Self::Relation(_))
    }

    pub fn as_relation(&self) -> Option<&Relation> {
        match self {
            Self::Relation(relation) => Some(relation),
            _ => None,
        }
    }

    #[track_caller]
    pub fn expect_relation(&self) -> &Relation {
        match self {
            Self::Relation(relation) => relation,
            _ => panic!("expected field to be a relation, but was {self:?}"),
        }
    }
}

impl FieldId {
    pub(crate) const fn placeholder() -> Self {
        Self {
            model: ModelId::placeholder(),
            index: usize::MAX,
        }
    }
}

impl From<&Self> for FieldId {
    fn from(val: &Self) -> Self {
        *val
    }
}

impl From<&Field> for FieldId {
    fn from(val: &Field) -> Self {
        val.id
    }
}

impl fmt::Debug for FieldId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "FieldId({}/{})", self.model.0, self.index)
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => fmt.debug_tuple("Value").field(value).finish(),
            Self::Callable(_) => fmt.write_str("Callable(..)"),
        }
    }
}
