use super::Expr;
use crate::schema::ModelId;

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub model: ModelId,
    pub filter: Expr,
}

impl Delete {
    pub fn new(model: impl Into<ModelId>, filter: impl Into<Expr>) -> Self {
        Self {
            model: model.into(),
            filter: filter.into(),
        }
    }
}
