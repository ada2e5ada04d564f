use super::{Select, Value};
use crate::schema::FieldId;

/// A boolean or scalar expression appearing in a statement's filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value
    Value(Value),

    /// A reference to a model field
    Field(FieldId),

    /// Binary comparison
    BinaryOp(ExprBinaryOp),

    /// All operands must be true
    And(Vec<Expr>),

    /// At least one operand must be true
    Or(Vec<Expr>),

    /// The operand is contained in a literal list
    InList(ExprInList),

    /// The operand is contained in a subquery's result set
    InSubquery(ExprInSubquery),

    /// The operand evaluates to null
    IsNull(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprBinaryOp {
    pub lhs: Box<Expr>,
    pub op: BinaryOp,
    pub rhs: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,

    /// Case-insensitive substring match. The right-hand side is a pattern
    /// using `%` wildcards.
    ILike,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprInList {
    pub expr: Box<Expr>,
    pub list: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprInSubquery {
    pub expr: Box<Expr>,
    pub query: Box<Select>,
}

impl Expr {
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    pub fn field(field: impl Into<FieldId>) -> Self {
        Self::Field(field.into())
    }

    pub fn eq(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Self::binary_op(lhs, BinaryOp::Eq, rhs)
    }

    pub fn ne(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Self::binary_op(lhs, BinaryOp::Ne, rhs)
    }

    pub fn gt(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Self::binary_op(lhs, BinaryOp::Gt, rhs)
    }

    pub fn ge(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Self::binary_op(lhs, BinaryOp::Ge, rhs)
    }

    pub fn lt(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Self::binary_op(lhs, BinaryOp::Lt, rhs)
    }

    pub fn le(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Self::binary_op(lhs, BinaryOp::Le, rhs)
    }

    pub fn ilike(lhs: impl Into<Expr>, pattern: impl Into<Expr>) -> Self {
        Self::binary_op(lhs, BinaryOp::ILike, pattern)
    }

    pub fn binary_op(lhs: impl Into<Expr>, op: BinaryOp, rhs: impl Into<Expr>) -> Self {
        Self::BinaryOp(ExprBinaryOp {
            lhs: Box::new(lhs.into()),
            op,
            rhs: Box::new(rhs.into()),
        })
    }

    pub fn and_from_vec(operands: Vec<Expr>) -> Self {
        match operands.len() {
            1 => operands.into_iter().next().unwrap(),
            _ => Self::And(operands),
        }
    }

    pub fn in_list(expr: impl Into<Expr>, list: Vec<Value>) -> Self {
        Self::InList(ExprInList {
            expr: Box::new(expr.into()),
            list,
        })
    }

    pub fn in_subquery(expr: impl Into<Expr>, query: Select) -> Self {
        Self::InSubquery(ExprInSubquery {
            expr: Box::new(expr.into()),
            query: Box::new(query),
        })
    }

    pub fn is_null(expr: impl Into<Expr>) -> Self {
        Self::IsNull(Box::new(expr.into()))
    }

    /// True if the expression is the constant `true` (an empty filter).
    pub fn is_true(&self) -> bool {
        matches!(self, Self::Value(Value::Bool(true)))
    }

    /// Fold another condition into this one with `AND`.
    pub fn add_filter(&mut self, filter: impl Into<Expr>) {
        let filter = filter.into();
        if self.is_true() {
            *self = filter;
        } else if let Self::And(operands) = self {
            operands.push(filter);
        } else {
            let lhs = std::mem::replace(self, Self::Value(Value::Bool(true)));
            *self = Self::And(vec![lhs, filter]);
        }
    }
}

impl Default for Expr {
    fn default() -> Self {
        Self::Value(Value::Bool(true))
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<FieldId> for Expr {
    fn from(value: FieldId) -> Self {
        Self::Field(value)
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Self::Value(Value::Bool(value))
    }
}
