use super::item::resolve_field;
use super::{Clause, SortDirection, ORDERING_PARAMS_KEY, URL_ARRAY_SEPARATOR, URL_KEY_SEPARATOR};
use crate::form_data::FormData;

use backoffice_core::schema::{FieldId, Registry};
use backoffice_core::stmt::{Expr, OrderBy};
use backoffice_core::{Error, Result};

/// A list-view column together with its own active filter clauses and sort
/// state. This is the unit the list view iterates over to render per-column
/// filter/sort controls.
///
/// Form names for the column's filter inputs are scoped by the key prefix
/// `Model__field__`; the sort state is posted under the shared bare sort key
/// since sorting is a single cross-column concept.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamColumn {
    pub model: String,
    pub field: String,
    pub label: String,

    /// Active filter clauses with their raw (uncast) operands.
    pub where_clauses: Vec<(Clause, String)>,

    pub sort: Option<SortDirection>,
}

impl ParamColumn {
    pub fn new(model: &str, field: &str, label: &str) -> Self {
        Self {
            model: model.to_string(),
            field: field.to_string(),
            label: label.to_string(),
            where_clauses: vec![],
            sort: None,
        }
    }

    /// A column for a registered field, labeled with the humanized field
    /// name.
    pub fn for_field(registry: &Registry, field: impl Into<FieldId>) -> Self {
        let field = registry.field(field);
        let model = registry.model(field.id.model);
        Self::new(
            &model.name.upper_camel_case(),
            &field.name.app_name.snake_case(),
            &field.name.app_name.human(),
        )
    }

    pub fn identity(&self) -> String {
        super::item::identity_of(&self.model, &self.field)
    }

    /// The scoped prefix of this column's form keys: `Model__field__`.
    pub fn form_key_prefix(&self) -> String {
        format!("{}{URL_KEY_SEPARATOR}", self.identity())
    }

    pub fn matches_identity(&self, other: &Self) -> bool {
        self.model == other.model && self.field == other.field
    }

    pub fn is_form_key_match(&self, form_key: &str) -> bool {
        form_key.starts_with(&self.form_key_prefix())
    }

    /// Reconstruct the column's filter/sort state from posted form data (or
    /// parsed query parameters), keeping only keys scoped to this column.
    pub fn from_form_data(model: &str, field: &str, label: &str, data: &FormData) -> Self {
        let mut column = Self::new(model, field, label);
        let prefix = column.form_key_prefix();

        for (key, value) in data.pairs() {
            if key == ORDERING_PARAMS_KEY {
                continue;
            }
            let Some(suffix) = key.strip_prefix(&prefix) else {
                continue;
            };
            if let Some(clause) = Clause::parse(suffix) {
                column.where_clauses.push((clause, value.to_string()));
            }
        }

        for entry in data
            .get_all(ORDERING_PARAMS_KEY)
            .iter()
            .flat_map(|value| value.split(URL_ARRAY_SEPARATOR))
        {
            let Some(suffix) = entry.strip_prefix(&prefix) else {
                continue;
            };
            if let Some(direction) = SortDirection::parse(suffix) {
                column.sort.get_or_insert(direction);
            }
        }

        column
    }

    /// Render the column's state as form `(name, value)` pairs. Filter
    /// entries carry the scoped prefix; the sort entry goes under the shared
    /// sort key with the prefixed direction as its value.
    pub fn form_data(&self) -> Vec<(String, String)> {
        let prefix = self.form_key_prefix();
        let mut pairs: Vec<(String, String)> = self
            .where_clauses
            .iter()
            .map(|(clause, operand)| (format!("{prefix}{}", clause.key()), operand.clone()))
            .collect();
        if let Some(sort) = self.sort {
            pairs.push((
                ORDERING_PARAMS_KEY.to_string(),
                format!("{prefix}{}", sort.key()),
            ));
        }
        pairs
    }

    /// A copy with the filter clauses replaced.
    pub fn with_where(&self, where_clauses: Vec<(Clause, String)>) -> Self {
        Self {
            where_clauses,
            ..self.clone()
        }
    }

    /// A copy with the sort state replaced.
    pub fn with_sort(&self, sort: Option<SortDirection>) -> Self {
        Self {
            sort,
            ..self.clone()
        }
    }

    /// A copy with filter and sort state cleared.
    pub fn cleared(&self) -> Self {
        Self {
            where_clauses: vec![],
            sort: None,
            ..self.clone()
        }
    }

    pub fn is_where_active(&self) -> bool {
        !self.where_clauses.is_empty()
    }

    pub fn is_clause_active(&self, clause: Clause) -> bool {
        self.where_clauses.iter().any(|(c, _)| *c == clause)
    }

    /// The first active operand, used to pre-fill the filter form.
    pub fn active_operand(&self) -> Option<&str> {
        self.where_clauses
            .first()
            .map(|(_, operand)| operand.as_str())
    }

    /// Cast every operand against the field's declared type and render the
    /// active clauses as predicates.
    pub fn where_exprs(&self, registry: &Registry) -> Result<Vec<Expr>> {
        if self.where_clauses.is_empty() {
            return Ok(vec![]);
        }
        let (_, field) = resolve_field(registry, &self.model, &self.field)?;
        let ty = field.column_ty().ok_or_else(|| {
            Error::validation(&self.field, "field does not support filtering")
        })?;

        self.where_clauses
            .iter()
            .map(|(clause, operand)| {
                let operand = ty
                    .cast(operand)
                    .map_err(|msg| Error::validation(&self.field, msg))?;
                Ok(clause.to_expr(field.id, &operand))
            })
            .collect()
    }

    pub fn sort_order_by(&self, registry: &Registry) -> Result<Option<OrderBy>> {
        let Some(sort) = self.sort else {
            return Ok(None);
        };
        let (_, field) = resolve_field(registry, &self.model, &self.field)?;
        Ok(Some(sort.to_order_by(field.id)))
    }
}
