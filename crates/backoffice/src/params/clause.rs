use backoffice_core::schema::FieldId;
use backoffice_core::stmt::{Expr, OrderBy, Value};

use tracing::warn;

/// A filter comparison clause, as spelled in URL parameter keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clause {
    Exact,
    ILike,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Clause {
    pub const ALL: [Clause; 6] = [
        Clause::Exact,
        Clause::ILike,
        Clause::Gt,
        Clause::Gte,
        Clause::Lt,
        Clause::Lte,
    ];

    /// The clause's key segment in URL parameters and form names.
    pub fn key(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::ILike => "ilike",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|clause| clause.key() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Exact => "Equals",
            Self::ILike => "Contains",
            Self::Gt => "Greater than",
            Self::Gte => "Greater than or equal",
            Self::Lt => "Less than",
            Self::Lte => "Less than or equal",
        }
    }

    /// Render the clause as a filter predicate over `field`.
    ///
    /// `ilike` over a non-string operand is ignored (always-true predicate)
    /// rather than failing the whole filter set.
    pub fn to_expr(self, field: FieldId, operand: &Value) -> Expr {
        match self {
            Self::Exact => Expr::eq(field, Expr::value(operand.clone())),
            Self::ILike => match operand {
                Value::String(pattern) => Expr::ilike(
                    field,
                    Expr::value(Value::String(format!("%{}%", pattern.trim()))),
                ),
                _ => {
                    warn!(?operand, "non-string ilike operand, ignoring clause");
                    Expr::value(true)
                }
            },
            Self::Gt => Expr::gt(field, Expr::value(operand.clone())),
            Self::Gte => Expr::ge(field, Expr::value(operand.clone())),
            Self::Lt => Expr::lt(field, Expr::value(operand.clone())),
            Self::Lte => Expr::le(field, Expr::value(operand.clone())),
        }
    }
}

/// A sort direction, as spelled in the ordering URL parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub const ALL: [SortDirection; 2] = [SortDirection::Ascending, SortDirection::Descending];

    pub fn key(self) -> &'static str {
        match self {
            Self::Ascending => "a",
            Self::Descending => "d",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|direction| direction.key() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Ascending => "Ascending",
            Self::Descending => "Descending",
        }
    }

    pub fn to_order_by(self, field: FieldId) -> OrderBy {
        match self {
            Self::Ascending => OrderBy::asc(field),
            Self::Descending => OrderBy::desc(field),
        }
    }
}
