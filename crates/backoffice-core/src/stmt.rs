mod delete;
pub use delete::Delete;

mod expr;
pub use expr::{BinaryOp, Expr, ExprBinaryOp, ExprInList, ExprInSubquery};

mod insert;
pub use insert::Insert;

mod join;
pub use join::Join;

mod limit;
pub use limit::Limit;

mod order_by;
pub use order_by::OrderBy;

mod row;
pub use row::Row;

mod select;
pub use select::{Returning, Select};

mod statement;
pub use statement::Statement;

mod update;
pub use update::{Assignment, Update};

mod value;
pub use value::Value;
