pub mod admin;
pub use admin::{ModelAdmin, Pagination};

pub mod db;
pub use db::Db;

pub mod form_data;
pub use form_data::FormData;

pub mod forms;
pub use forms::{FormField, FormSpec, ModelConverter};

pub mod loader;
pub use loader::RelationLoader;

pub mod params;
pub use params::{ColumnSet, ListFilterItem, ListOrderingItem, ListViewParams, ParamColumn};

pub use backoffice_core::{driver, schema, stmt, Error, Result};
