use super::{Expr, Join, Limit, OrderBy};
use crate::schema::ModelId;

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    /// What the query evaluates to: the matching rows or their count.
    pub returning: Returning,

    /// The model being selected.
    pub source: ModelId,

    /// Inner joins applied before filtering. Used for association-table
    /// traversal in many-to-many loads.
    pub joins: Vec<Join>,

    /// Query filter
    pub filter: Expr,

    /// Sort keys, primary first.
    pub order_by: Vec<OrderBy>,

    /// Limit / offset pair
    pub limit: Option<Limit>,

    /// De-duplicate result rows by the source model's primary key.
    pub distinct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Returning {
    #[default]
    Rows,
    Count,
}

impl Select {
    pub fn new(source: impl Into<ModelId>, filter: impl Into<Expr>) -> Self {
        Self {
            returning: Returning::Rows,
            source: source.into(),
            joins: vec![],
            filter: filter.into(),
            order_by: vec![],
            limit: None,
            distinct: false,
        }
    }

    pub fn add_filter(&mut self, filter: impl Into<Expr>) {
        self.filter.add_filter(filter);
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by.push(order_by);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Convert this query into a row-count query.
    pub fn count(mut self) -> Self {
        self.returning = Returning::Count;
        self.order_by.clear();
        self.limit = None;
        self
    }

    /// Apply limit/offset for a 1-based page number.
    pub fn paginate(mut self, page: u64, page_size: u64) -> Self {
        let page = page.max(1);
        self.limit = Some(Limit {
            limit: page_size,
            offset: (page - 1) * page_size,
        });
        self
    }
}
