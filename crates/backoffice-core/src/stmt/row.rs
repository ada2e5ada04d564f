use super::Value;
use crate::schema::{FieldId, ModelId};

/// A stored record: one value per model field, in field declaration order.
///
/// Relation fields hold `Value::Null` in stored rows; only the loader
/// materializes them.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub model: ModelId,
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(model: impl Into<ModelId>, values: Vec<Value>) -> Self {
        Self {
            model: model.into(),
            values,
        }
    }

    #[track_caller]
    pub fn value(&self, field: impl Into<FieldId>) -> &Value {
        let field = field.into();
        assert_eq!(self.model, field.model, "field does not belong to this row's model");
        &self.values[field.index]
    }

    pub fn set(&mut self, field: impl Into<FieldId>, value: impl Into<Value>) {
        let field = field.into();
        assert_eq!(self.model, field.model, "field does not belong to this row's model");
        self.values[field.index] = value.into();
    }
}
