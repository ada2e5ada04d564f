pub use crate::db::MemoryDriver;
pub use crate::fixtures::{self, test_db};

pub use backoffice::form_data::FormData;
pub use backoffice::{Db, ModelAdmin};

pub use backoffice_core::schema::{Direction, Registry};
pub use backoffice_core::stmt::{Row, Select, Value};
pub use backoffice_core::Result;
