use crate::schema::FieldId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub field: FieldId,
    pub desc: bool,
}

impl OrderBy {
    pub fn asc(field: impl Into<FieldId>) -> Self {
        Self {
            field: field.into(),
            desc: false,
        }
    }

    pub fn desc(field: impl Into<FieldId>) -> Self {
        Self {
            field: field.into(),
            desc: true,
        }
    }
}
