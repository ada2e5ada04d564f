use super::{Field, Model};
use crate::stmt::{Row, Value};
use crate::{Error, Result};

/// A view over a model's immutable metadata: the ordered attribute list and
/// the resolved primary key.
///
/// Mappers are cheap borrowed values. Per-row state never lives here; use
/// [`BoundMapper`] to pair the shared metadata with a specific row.
#[derive(Debug, Clone, Copy)]
pub struct Mapper<'a> {
    model: &'a Model,
}

/// A [`Mapper`] bound to a specific row for per-row identity and attribute
/// access.
#[derive(Debug, Clone, Copy)]
pub struct BoundMapper<'a> {
    mapper: Mapper<'a>,
    row: &'a Row,
}

impl<'a> Mapper<'a> {
    pub(crate) fn new(model: &'a Model) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &'a Model {
        self.model
    }

    /// The model's attributes in declaration order.
    pub fn attrs(&self) -> impl Iterator<Item = &'a Field> {
        self.model.fields.iter()
    }

    pub fn attr(&self, name: &str) -> Result<&'a Field> {
        self.model.field_by_name(name).ok_or_else(|| {
            Error::field_not_found(self.model.name.upper_camel_case(), name)
        })
    }

    pub fn primary_key(&self) -> &'a Field {
        self.model.primary_key_field()
    }

    pub fn bind(self, row: &'a Row) -> Result<BoundMapper<'a>> {
        if row.model != self.model.id {
            return Err(Error::model_introspection(format!(
                "row does not belong to model `{}`",
                self.model.name.upper_camel_case()
            )));
        }
        Ok(BoundMapper { mapper: self, row })
    }
}

impl<'a> BoundMapper<'a> {
    pub fn model(&self) -> &'a Model {
        self.mapper.model()
    }

    pub fn row(&self) -> &'a Row {
        self.row
    }

    /// The bound row's identity: its primary-key values in key order.
    ///
    /// Single-column keys yield a one-element list.
    pub fn identity(&self) -> Vec<Value> {
        vec![self.row.value(self.mapper.model().primary_key).clone()]
    }

    /// The bound row's primary-key value.
    pub fn pk(&self) -> &'a Value {
        self.row.value(self.mapper.model().primary_key)
    }

    pub fn value(&self, name: &str) -> Result<&'a Value> {
        let field = self.mapper.attr(name)?;
        Ok(self.row.value(field))
    }
}
