use super::Expr;
use crate::schema::ModelId;

/// An inner join against another model.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub model: ModelId,

    /// Join condition; field references may name either side.
    pub on: Expr,
}

impl Join {
    pub fn new(model: impl Into<ModelId>, on: impl Into<Expr>) -> Self {
        Self {
            model: model.into(),
            on: on.into(),
        }
    }
}
