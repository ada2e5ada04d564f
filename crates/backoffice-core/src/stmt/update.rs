use super::{Expr, Value};
use crate::schema::{FieldId, ModelId};

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub model: ModelId,
    pub assignments: Vec<Assignment>,
    pub filter: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub field: FieldId,
    pub value: Value,
}

impl Update {
    pub fn new(model: impl Into<ModelId>, filter: impl Into<Expr>) -> Self {
        Self {
            model: model.into(),
            assignments: vec![],
            filter: filter.into(),
        }
    }

    pub fn set(mut self, field: impl Into<FieldId>, value: impl Into<Value>) -> Self {
        self.assignments.push(Assignment {
            field: field.into(),
            value: value.into(),
        });
        self
    }
}
