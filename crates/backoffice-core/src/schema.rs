mod builder;
pub use builder::{Builder, FieldDescriptor, ModelDescriptor, RelationDescriptor};

mod column;
pub use column::ColumnTy;

mod field;
pub use field::{Computed, Field, FieldDefault, FieldId, FieldName, FieldTy};

mod mapper;
pub use mapper::{BoundMapper, Mapper};

mod model;
pub use model::{Model, ModelId};

mod name;
pub use name::Name;

mod registry;
pub use registry::{ModelIdentity, Registry};

mod relation;
pub use relation::{Direction, Relation};
