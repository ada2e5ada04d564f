use super::{Clause, ParamColumn, SortDirection, ORDERING_PARAMS_KEY};
use crate::form_data::FormData;

use backoffice_core::schema::Registry;
use backoffice_core::stmt::{Expr, OrderBy};
use backoffice_core::Result;

/// The ordered set of parametrized columns backing one list view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnSet {
    pub columns: Vec<ParamColumn>,
}

/// One selectable sort state for a column header, carrying the query string
/// that applies it while leaving every other column's state untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct SortOption {
    pub direction: SortDirection,
    pub label: &'static str,
    pub form_name: String,
    pub is_active: bool,
    pub url_query: String,
}

/// One selectable filter clause for a column's filter form.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereOption {
    pub clause: Clause,
    pub label: &'static str,
    pub form_name: String,
    pub is_active: bool,
}

impl ColumnSet {
    pub fn new(columns: Vec<ParamColumn>) -> Self {
        Self { columns }
    }

    /// Rebuild every column's filter/sort state from a request query string.
    pub fn from_query_str(templates: &[ParamColumn], query: &str) -> Self {
        let data = FormData::from_query_str(query);
        Self::from_form_data(templates, &data)
    }

    pub fn from_form_data(templates: &[ParamColumn], data: &FormData) -> Self {
        let columns = templates
            .iter()
            .map(|template| {
                ParamColumn::from_form_data(&template.model, &template.field, &template.label, data)
            })
            .collect();
        Self { columns }
    }

    pub fn get(&self, model: &str, field: &str) -> Option<&ParamColumn> {
        self.columns
            .iter()
            .find(|column| column.model == model && column.field == field)
    }

    /// Flatten every column's form data into one combined pair list.
    ///
    /// Filter entries keep their per-column scoped keys and column order;
    /// the sort entries of all columns merge under the single shared sort
    /// key, emitted last.
    pub fn columns_form_data(&self) -> Vec<(String, String)> {
        Self::form_data_of(&self.columns)
    }

    /// Form data as if `overlay` replaced the identity-matched column —
    /// the building block for "apply this filter/sort" links that preserve
    /// every other active column state.
    pub fn form_data_overlayed(&self, overlay: &ParamColumn) -> Vec<(String, String)> {
        let columns: Vec<ParamColumn> = self
            .columns
            .iter()
            .map(|column| {
                if column.matches_identity(overlay) {
                    overlay.clone()
                } else {
                    column.clone()
                }
            })
            .collect();
        Self::form_data_of(&columns)
    }

    fn form_data_of(columns: &[ParamColumn]) -> Vec<(String, String)> {
        let mut pairs = vec![];
        let mut ordering = vec![];
        for column in columns {
            for (key, value) in column.form_data() {
                if key == ORDERING_PARAMS_KEY {
                    ordering.push(value);
                } else {
                    pairs.push((key, value));
                }
            }
        }
        for value in ordering {
            pairs.push((ORDERING_PARAMS_KEY.to_string(), value));
        }
        pairs
    }

    /// Serialize form-data pairs as a query string.
    pub fn urlencode(pairs: &[(String, String)]) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in pairs {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }

    /// All active filter predicates, in column order.
    pub fn where_exprs(&self, registry: &Registry) -> Result<Vec<Expr>> {
        let mut exprs = vec![];
        for column in &self.columns {
            exprs.extend(column.where_exprs(registry)?);
        }
        Ok(exprs)
    }

    /// All active sort keys, in column order.
    pub fn order_by(&self, registry: &Registry) -> Result<Vec<OrderBy>> {
        let mut order_by = vec![];
        for column in &self.columns {
            if let Some(entry) = column.sort_order_by(registry)? {
                order_by.push(entry);
            }
        }
        Ok(order_by)
    }

    /// Sort options for one column header. Each option's query string
    /// overlays that column's sort while carrying every other column's
    /// current state.
    pub fn sort_options(&self, column: &ParamColumn) -> Vec<SortOption> {
        let prefix = column.form_key_prefix();
        SortDirection::ALL
            .into_iter()
            .map(|direction| {
                let overlayed = self.form_data_overlayed(&column.with_sort(Some(direction)));
                SortOption {
                    direction,
                    label: direction.label(),
                    form_name: format!("{prefix}{}", direction.key()),
                    is_active: column.sort == Some(direction),
                    url_query: Self::urlencode(&overlayed),
                }
            })
            .collect()
    }

    /// Clause options for one column's filter form.
    pub fn where_options(&self, column: &ParamColumn) -> Vec<WhereOption> {
        let prefix = column.form_key_prefix();
        Clause::ALL
            .into_iter()
            .map(|clause| WhereOption {
                clause,
                label: clause.label(),
                form_name: format!("{prefix}{}", clause.key()),
                is_active: column.is_clause_active(clause),
            })
            .collect()
    }
}
