use super::Row;
use crate::schema::ModelId;

#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub model: ModelId,
    pub rows: Vec<Row>,
}

impl Insert {
    pub fn new(model: impl Into<ModelId>, rows: Vec<Row>) -> Self {
        Self {
            model: model.into(),
            rows,
        }
    }
}
