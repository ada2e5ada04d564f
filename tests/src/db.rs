use backoffice_core::driver::{Driver, Response};
use backoffice_core::schema::{ColumnTy, ModelId, Registry};
use backoffice_core::stmt::{
    BinaryOp, Expr, Returning, Row, Select, Statement, Value,
};
use backoffice_core::{async_trait, Error, Result};

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// An in-memory storage backend evaluating statements over plain row
/// vectors. Supports the statement surface the admin engine emits: filtered
/// and joined selects with ordering, distinct, limit/offset and counts, plus
/// inserts (with integer key assignment), updates, and deletes.
#[derive(Debug)]
pub struct MemoryDriver {
    registry: Arc<Registry>,
    tables: Mutex<HashMap<ModelId, Vec<Row>>>,
}

/// The rows visible to one filter evaluation: the source row plus any
/// joined rows, keyed by model.
type EvalCtx = HashMap<ModelId, Row>;

impl MemoryDriver {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            tables: Mutex::new(HashMap::new()),
        }
    }

    /// Direct table access for test assertions.
    pub fn rows(&self, model: impl Into<ModelId>) -> Vec<Row> {
        self.tables
            .lock()
            .unwrap()
            .get(&model.into())
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl Driver for MemoryDriver {
    async fn execute(&self, stmt: Statement) -> Result<Response> {
        let mut tables = self.tables.lock().unwrap();

        match stmt {
            Statement::Select(select) => {
                let rows = exec_select(&self.registry, &tables, &select)?;
                match select.returning {
                    Returning::Count => Ok(Response::from_count(rows.len() as u64)),
                    Returning::Rows => Ok(Response::from_values(rows)),
                }
            }
            Statement::Insert(insert) => {
                let model = self.registry.model(insert.model);
                let pk = model.primary_key_field();
                let table = tables.entry(insert.model).or_default();

                let mut next_id = table
                    .iter()
                    .filter_map(|row| row.value(pk).as_i64())
                    .max()
                    .unwrap_or(0)
                    + 1;

                let mut inserted = vec![];
                for mut row in insert.rows {
                    if row.value(pk).is_null()
                        && matches!(pk.column_ty(), Some(ColumnTy::Integer))
                    {
                        row.set(pk, Value::I64(next_id));
                        next_id += 1;
                    }
                    table.push(row.clone());
                    inserted.push(row);
                }
                Ok(Response::from_values(inserted))
            }
            Statement::Update(update) => {
                let table = tables.entry(update.model).or_default();
                let mut affected = 0;
                for row in table.iter_mut() {
                    let ctx = EvalCtx::from([(update.model, row.clone())]);
                    if eval_bool(&ctx, &update.filter)? {
                        for assignment in &update.assignments {
                            row.values[assignment.field.index] = assignment.value.clone();
                        }
                        affected += 1;
                    }
                }
                Ok(Response::from_count(affected))
            }
            Statement::Delete(delete) => {
                let table = tables.entry(delete.model).or_default();
                let mut keep = vec![];
                let mut removed = 0;
                for row in table.drain(..) {
                    let ctx = EvalCtx::from([(delete.model, row.clone())]);
                    if eval_bool(&ctx, &delete.filter)? {
                        removed += 1;
                    } else {
                        keep.push(row);
                    }
                }
                *table = keep;
                Ok(Response::from_count(removed))
            }
        }
    }
}

fn exec_select(
    registry: &Registry,
    tables: &HashMap<ModelId, Vec<Row>>,
    select: &Select,
) -> Result<Vec<Row>> {
    let base = tables.get(&select.source).cloned().unwrap_or_default();

    let mut tuples: Vec<EvalCtx> = base
        .into_iter()
        .map(|row| EvalCtx::from([(select.source, row)]))
        .collect();

    for join in &select.joins {
        let join_rows = tables.get(&join.model).cloned().unwrap_or_default();
        let mut next = vec![];
        for ctx in &tuples {
            for row in &join_rows {
                let mut ctx = ctx.clone();
                ctx.insert(join.model, row.clone());
                if eval_bool(&ctx, &join.on)? {
                    next.push(ctx);
                }
            }
        }
        tuples = next;
    }

    let mut rows = vec![];
    for mut ctx in tuples {
        if eval_bool(&ctx, &select.filter)? {
            rows.push(ctx.remove(&select.source).expect("source row present"));
        }
    }

    if select.distinct {
        let pk = registry.model(select.source).primary_key;
        let mut seen: Vec<Value> = vec![];
        rows.retain(|row| {
            let id = row.value(pk).clone();
            if seen.contains(&id) {
                false
            } else {
                seen.push(id);
                true
            }
        });
    }

    if !select.order_by.is_empty() {
        rows.sort_by(|a, b| {
            for key in &select.order_by {
                let ord = a
                    .value(key.field)
                    .partial_cmp_value(b.value(key.field))
                    .unwrap_or(Ordering::Equal);
                let ord = if key.desc { ord.reverse() } else { ord };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
    }

    if let Some(limit) = select.limit {
        rows = rows
            .into_iter()
            .skip(limit.offset as usize)
            .take(limit.limit as usize)
            .collect();
    }

    Ok(rows)
}

fn eval_bool(ctx: &EvalCtx, expr: &Expr) -> Result<bool> {
    Ok(matches!(eval(ctx, expr)?, Value::Bool(true)))
}

fn eval(ctx: &EvalCtx, expr: &Expr) -> Result<Value> {
    match expr {
        Expr::Value(value) => Ok(value.clone()),
        Expr::Field(field) => Ok(ctx
            .get(&field.model)
            .map(|row| row.values[field.index].clone())
            .unwrap_or(Value::Null)),
        Expr::BinaryOp(op) => {
            let lhs = eval(ctx, &op.lhs)?;
            let rhs = eval(ctx, &op.rhs)?;
            let result = match op.op {
                BinaryOp::Eq => !lhs.is_null() && !rhs.is_null() && lhs == rhs,
                BinaryOp::Ne => !lhs.is_null() && !rhs.is_null() && lhs != rhs,
                BinaryOp::Gt => cmp(&lhs, &rhs, |ord| ord == Ordering::Greater),
                BinaryOp::Ge => cmp(&lhs, &rhs, |ord| ord != Ordering::Less),
                BinaryOp::Lt => cmp(&lhs, &rhs, |ord| ord == Ordering::Less),
                BinaryOp::Le => cmp(&lhs, &rhs, |ord| ord != Ordering::Greater),
                BinaryOp::ILike => match (&lhs, &rhs) {
                    (Value::String(text), Value::String(pattern)) => ilike_match(text, pattern),
                    _ => false,
                },
            };
            Ok(Value::Bool(result))
        }
        Expr::And(operands) => {
            for operand in operands {
                if !eval_bool(ctx, operand)? {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }
        Expr::Or(operands) => {
            for operand in operands {
                if eval_bool(ctx, operand)? {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        Expr::InList(in_list) => {
            let value = eval(ctx, &in_list.expr)?;
            Ok(Value::Bool(!value.is_null() && in_list.list.contains(&value)))
        }
        Expr::InSubquery(_) => Err(Error::driver(
            "in-subquery expressions are not supported by the memory driver",
        )),
        Expr::IsNull(inner) => Ok(Value::Bool(eval(ctx, inner)?.is_null())),
    }
}

fn cmp(lhs: &Value, rhs: &Value, check: impl Fn(Ordering) -> bool) -> bool {
    lhs.partial_cmp_value(rhs).map(check).unwrap_or(false)
}

/// Case-insensitive `LIKE` with `%` wildcards.
fn ilike_match(text: &str, pattern: &str) -> bool {
    let text = text.to_lowercase();
    let pattern = pattern.to_lowercase();

    if !pattern.contains('%') {
        return text == pattern;
    }

    let segments: Vec<&str> = pattern.split('%').collect();
    let mut pos = 0;

    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }
        if i == 0 {
            // Anchored prefix
            if !text.starts_with(segment) {
                return false;
            }
            pos = segment.len();
        } else if i == segments.len() - 1 {
            // Anchored suffix
            let rest = &text[pos..];
            return rest.ends_with(segment);
        } else {
            match text[pos..].find(segment) {
                Some(found) => pos += found + segment.len(),
                None => return false,
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ilike_wildcards() {
        assert!(ilike_match("alice@example.com", "%.com%"));
        assert!(ilike_match("Alice", "%ali%"));
        assert!(ilike_match("alice", "alice"));
        assert!(!ilike_match("bob@example.org", "%.com%"));
        assert!(ilike_match("xx.comyy", "%%.com%%"));
    }
}
