use super::{Clause, SortDirection, ORDERING_PARAMS_KEY, RESERVED_PAGINATION_KEYS, URL_ARRAY_SEPARATOR, URL_KEY_SEPARATOR};

use backoffice_core::schema::{Field, Model, Registry};
use backoffice_core::stmt::{Expr, OrderBy};
use backoffice_core::{Error, Result};

use tracing::debug;

/// A single active filter: `(model, field, clause, operand)`.
///
/// Identity is the `(model, field)` pair; items with the same identity but
/// different clauses coexist as separate entries, distinguished by the
/// clause segment of the encoded key.
#[derive(Debug, Clone, PartialEq)]
pub struct ListFilterItem {
    pub model: String,
    pub field: String,
    pub clause: Clause,
    pub operand: String,
}

/// A single active sort key: `(model, field, direction)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListOrderingItem {
    pub model: String,
    pub field: String,
    pub direction: SortDirection,
}

/// Either parameter item, for identity-based override operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamItem {
    Filter(ListFilterItem),
    Ordering(ListOrderingItem),
}

/// The parsed filter/ordering state of one list view request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListViewParams {
    pub filters: Vec<ListFilterItem>,
    pub ordering: Vec<ListOrderingItem>,
}

pub(crate) fn identity_of(model: &str, field: &str) -> String {
    format!("{model}{URL_KEY_SEPARATOR}{field}")
}

/// Resolve a `(model, field)` name pair against the registry.
pub(crate) fn resolve_field<'a>(
    registry: &'a Registry,
    model: &str,
    field: &str,
) -> Result<(&'a Model, &'a Field)> {
    let model = registry.find_model(&model.into())?;
    let field = model
        .field_by_name(field)
        .ok_or_else(|| Error::field_not_found(model.name.upper_camel_case(), field))?;
    Ok((model, field))
}

impl ListFilterItem {
    pub fn new(model: &str, field: &str, clause: Clause, operand: &str) -> Self {
        Self {
            model: model.to_string(),
            field: field.to_string(),
            clause,
            operand: operand.to_string(),
        }
    }

    /// Canonical identity string: `Model__field`.
    pub fn identity(&self) -> String {
        identity_of(&self.model, &self.field)
    }

    /// The full URL parameter key: `Model__field__clause`.
    pub fn full_clause(&self) -> String {
        format!("{}{URL_KEY_SEPARATOR}{}", self.identity(), self.clause.key())
    }

    pub fn as_url_pair(&self) -> (String, String) {
        (self.full_clause(), self.operand.clone())
    }

    pub fn from_url_pair(key: &str, operand: &str) -> Result<Self> {
        let parts: Vec<&str> = key.split(URL_KEY_SEPARATOR).collect();
        let &[model, field, clause] = parts.as_slice() else {
            return Err(Error::validation(
                key,
                "filter keys take the form Model__field__clause",
            ));
        };
        let clause = Clause::parse(clause)
            .ok_or_else(|| Error::validation(key, format!("unknown clause `{clause}`")))?;
        Ok(Self::new(model, field, clause, operand))
    }

    pub fn matches(&self, model: &str, field: &str, clause: Option<Clause>) -> bool {
        self.model == model
            && self.field == field
            && clause.map(|clause| clause == self.clause).unwrap_or(true)
    }

    /// Render the filter as a predicate, casting the raw operand to the
    /// field's declared type. A failed cast is a validation error, surfaced
    /// to the caller rather than swallowed.
    pub fn to_expr(&self, registry: &Registry) -> Result<Expr> {
        let (_, field) = resolve_field(registry, &self.model, &self.field)?;
        let ty = field.column_ty().ok_or_else(|| {
            Error::validation(&self.field, "field does not support filtering")
        })?;
        let operand = ty
            .cast(&self.operand)
            .map_err(|msg| Error::validation(&self.field, msg))?;
        Ok(self.clause.to_expr(field.id, &operand))
    }
}

impl ListOrderingItem {
    pub fn new(model: &str, field: &str, direction: SortDirection) -> Self {
        Self {
            model: model.to_string(),
            field: field.to_string(),
            direction,
        }
    }

    pub fn identity(&self) -> String {
        identity_of(&self.model, &self.field)
    }

    /// The encoded ordering entry: `Model__field__direction`.
    pub fn as_url_param(&self) -> String {
        format!(
            "{}{URL_KEY_SEPARATOR}{}",
            self.identity(),
            self.direction.key()
        )
    }

    pub fn from_url_param(param: &str) -> Result<Self> {
        let parts: Vec<&str> = param.split(URL_KEY_SEPARATOR).collect();
        let &[model, field, direction] = parts.as_slice() else {
            return Err(Error::validation(
                param,
                "ordering entries take the form Model__field__direction",
            ));
        };
        let direction = SortDirection::parse(direction)
            .ok_or_else(|| Error::validation(param, format!("unknown direction `{direction}`")))?;
        Ok(Self::new(model, field, direction))
    }

    pub fn matches(&self, model: &str, field: &str, direction: Option<SortDirection>) -> bool {
        self.model == model
            && self.field == field
            && direction
                .map(|direction| direction == self.direction)
                .unwrap_or(true)
    }

    pub fn to_order_by(&self, registry: &Registry) -> Result<OrderBy> {
        let (_, field) = resolve_field(registry, &self.model, &self.field)?;
        Ok(self.direction.to_order_by(field.id))
    }
}

impl ListViewParams {
    /// Parse a URL query string.
    ///
    /// Every parameter except the reserved ordering key and the pagination
    /// keys is treated as a filter; the ordering value splits on the array
    /// separator (repeated ordering keys accumulate the same way). Keys that
    /// do not fit the mini-language are skipped, not fatal — list pages
    /// routinely carry unrelated parameters.
    pub fn from_url_str(query: &str) -> Result<Self> {
        let mut params = Self::default();

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if RESERVED_PAGINATION_KEYS.contains(&key.as_ref()) {
                continue;
            }
            if key == ORDERING_PARAMS_KEY {
                for entry in value.split(URL_ARRAY_SEPARATOR).filter(|e| !e.is_empty()) {
                    params.ordering.push(ListOrderingItem::from_url_param(entry)?);
                }
                continue;
            }
            if key.split(URL_KEY_SEPARATOR).count() != 3 {
                debug!(key = %key, "skipping query parameter outside the filter mini-language");
                continue;
            }
            params
                .filters
                .push(ListFilterItem::from_url_pair(&key, &value)?);
        }

        Ok(params)
    }

    /// The canonical query-string form.
    ///
    /// Deterministic: filter keys in item order first, the ordering key
    /// last, its entries joined with the array separator. Stable under
    /// re-encoding: `from_url_str(urlencode(p)).urlencode() == urlencode(p)`.
    pub fn urlencode(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for filter in &self.filters {
            let (key, value) = filter.as_url_pair();
            serializer.append_pair(&key, &value);
        }
        if !self.ordering.is_empty() {
            let joined = self
                .ordering
                .iter()
                .map(ListOrderingItem::as_url_param)
                .collect::<Vec<_>>()
                .join(&URL_ARRAY_SEPARATOR.to_string());
            serializer.append_pair(ORDERING_PARAMS_KEY, &joined);
        }
        serializer.finish()
    }

    /// Return a new params value with `item` either replacing any existing
    /// item of the same identity (prepended) or removed by identity match.
    ///
    /// Never mutates the receiver; "toggle filter" links are built against
    /// the currently rendered params without disturbing them.
    pub fn override_item(&self, item: impl Into<ParamItem>, remove: bool) -> Self {
        let mut params = self.clone();
        match item.into() {
            ParamItem::Filter(item) => {
                let identity = item.identity();
                params.filters.retain(|f| f.identity() != identity);
                if !remove {
                    params.filters.insert(0, item);
                }
            }
            ParamItem::Ordering(item) => {
                let identity = item.identity();
                params.ordering.retain(|o| o.identity() != identity);
                if !remove {
                    params.ordering.insert(0, item);
                }
            }
        }
        params
    }

    /// The first filter matching the given identity, optionally narrowed to
    /// one clause.
    pub fn get_filter(
        &self,
        model: &str,
        field: &str,
        clause: Option<Clause>,
    ) -> Option<&ListFilterItem> {
        self.filters
            .iter()
            .find(|item| item.matches(model, field, clause))
    }

    pub fn get_ordering(
        &self,
        model: &str,
        field: &str,
        direction: Option<SortDirection>,
    ) -> Option<&ListOrderingItem> {
        self.ordering
            .iter()
            .find(|item| item.matches(model, field, direction))
    }

    /// Render all filters as predicates and all ordering items as sort keys.
    pub fn to_stmt(&self, registry: &Registry) -> Result<(Vec<Expr>, Vec<OrderBy>)> {
        let filters = self
            .filters
            .iter()
            .map(|item| item.to_expr(registry))
            .collect::<Result<Vec<_>>>()?;
        let ordering = self
            .ordering
            .iter()
            .map(|item| item.to_order_by(registry))
            .collect::<Result<Vec<_>>>()?;
        Ok((filters, ordering))
    }
}

impl From<ListFilterItem> for ParamItem {
    fn from(value: ListFilterItem) -> Self {
        Self::Filter(value)
    }
}

impl From<ListOrderingItem> for ParamItem {
    fn from(value: ListOrderingItem) -> Self {
        Self::Ordering(value)
    }
}
