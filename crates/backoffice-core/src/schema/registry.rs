use super::model::foreign_key_name;
use super::{Builder, BoundMapper, Direction, Field, FieldId, Mapper, Model, ModelId, Relation};
use crate::stmt::Row;
use crate::{Error, Result};

use indexmap::IndexMap;
use tracing::debug;

/// The set of registered models and their linked relationship metadata.
///
/// A registry is built once through [`Builder`] and immutable afterwards.
/// It is an explicit service value: callers may hold several independent
/// registries (one per tenant, one per test) and share each behind an `Arc`.
#[derive(Debug)]
pub struct Registry {
    pub(crate) models: IndexMap<ModelId, Model>,
}

/// The identity shapes accepted by [`Registry::find_model`].
pub enum ModelIdentity {
    /// A model name (`"User"`) or dotted path (`"crm.models.User"`,
    /// suffix-matched against qualified names).
    Name(String),

    /// A column or relationship attribute; resolves to its owning model.
    Field(FieldId),

    /// A zero-argument factory producing the model id.
    Factory(Box<dyn Fn() -> ModelId + Send + Sync>),
}

impl Registry {
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }

    /// Get a model by ID
    #[track_caller]
    pub fn model(&self, id: impl Into<ModelId>) -> &Model {
        self.models.get(&id.into()).expect("invalid model ID")
    }

    /// Get a field by ID
    #[track_caller]
    pub fn field(&self, id: impl Into<FieldId>) -> &Field {
        let id = id.into();
        self.model(id.model).field(id)
    }

    pub fn model_by_name(&self, name: &str) -> Option<&Model> {
        self.models
            .values()
            .find(|model| model.name.upper_camel_case() == name)
    }

    /// Resolve a model through any of the supported identity shapes,
    /// exhausting every strategy before failing.
    pub fn find_model(&self, identity: &ModelIdentity) -> Result<&Model> {
        match identity {
            ModelIdentity::Name(name) => {
                if let Some(model) = self.model_by_name(name) {
                    return Ok(model);
                }
                if name.contains('.') {
                    if let Some(model) = self
                        .models
                        .values()
                        .find(|model| model.qualified_name().ends_with(name))
                    {
                        return Ok(model);
                    }
                }
                if let Some(model) = self
                    .models
                    .values()
                    .find(|model| model.table_name() == *name)
                {
                    return Ok(model);
                }
                Err(Error::model_not_found(name.clone()))
            }
            ModelIdentity::Field(field) => self
                .models
                .values()
                .find(|model| {
                    model.id == field.model && field.index < model.fields.len()
                })
                .ok_or_else(|| Error::model_not_found(format!("{field:?}"))),
            ModelIdentity::Factory(factory) => {
                let id = factory();
                self.models
                    .get(&id)
                    .ok_or_else(|| Error::model_not_found(format!("{id:?}")))
            }
        }
    }

    /// A mapper view over a model's metadata.
    pub fn mapper(&self, id: impl Into<ModelId>) -> Mapper<'_> {
        Mapper::new(self.model(id))
    }

    /// A mapper bound to a specific row for per-row identity access.
    pub fn mapper_for<'a>(&'a self, row: &'a Row) -> Result<BoundMapper<'a>> {
        self.mapper(row.model).bind(row)
    }

    /// Resolve the direction of a relationship attribute.
    ///
    /// The first call memoizes the result onto the relation; later calls
    /// return the cached value without re-running the heuristic.
    #[track_caller]
    pub fn relation_direction(&self, field: impl Into<FieldId>) -> Direction {
        let field_id = field.into();
        let owner = self.model(field_id.model);
        let field = owner.field(field_id);
        let relation = field.ty.expect_relation();

        relation.resolve_direction_with(|| self.infer_direction(owner, field, relation))
    }

    /// Foreign-key naming heuristic, used only when the relation declares no
    /// direction. Ambiguity falls back to many-to-one.
    fn infer_direction(&self, owner: &Model, field: &Field, relation: &Relation) -> Direction {
        if let Some(declared) = relation.declared {
            return declared;
        }
        if relation.secondary.is_some() {
            return Direction::ManyToMany;
        }

        let related = self.model(relation.target);
        let field_name = field.name.app_name.snake_case();
        let owner_fk = owner.foreign_key_for(&field_name).is_some();

        let (related_attr, related_fk) = match &relation.back_reference {
            Some(back) => (
                related.field_by_name(back).is_some(),
                related.foreign_key_for(back).is_some(),
            ),
            None => (false, false),
        };

        let direction = if owner_fk && !related_fk {
            Direction::ManyToOne
        } else if related_attr && related_fk && !owner_fk {
            Direction::OneToMany
        } else {
            debug!(
                model = %owner.name.upper_camel_case(),
                field = %field_name,
                "ambiguous relationship direction, falling back to many-to-one"
            );
            Direction::ManyToOne
        };

        debug!(
            model = %owner.name.upper_camel_case(),
            field = %field_name,
            ?direction,
            "resolved relationship direction"
        );

        direction
    }

    /// The related model of a relationship attribute.
    pub fn related_model(&self, field: impl Into<FieldId>) -> &Model {
        let relation = self.field(field).ty.expect_relation();
        self.model(relation.target)
    }

    /// The association model of a many-to-many relationship attribute.
    pub fn secondary_model(&self, field: impl Into<FieldId>) -> Result<&Model> {
        let field = self.field(field);
        let relation = field.ty.expect_relation();
        match relation.secondary {
            Some(secondary) => Ok(self.model(secondary)),
            None => Err(Error::relationship_configuration(format!(
                "many-to-many relationship `{}` requires a secondary model",
                field.name.app_name.snake_case()
            ))),
        }
    }

    /// The foreign-key column on `model` conventionally pointing at
    /// `target`: `{target_name}_id`.
    pub fn secondary_fk(&self, model: &Model, target: &Model) -> Result<FieldId> {
        let key = foreign_key_name(&target.name.snake_case());
        model
            .field_by_name(&key)
            .map(|field| field.id)
            .ok_or_else(|| {
                Error::relationship_configuration(format!(
                    "association model `{}` has no `{}` column",
                    model.name.upper_camel_case(),
                    key
                ))
            })
    }
}

impl From<&str> for ModelIdentity {
    fn from(value: &str) -> Self {
        Self::Name(value.to_string())
    }
}

impl From<String> for ModelIdentity {
    fn from(value: String) -> Self {
        Self::Name(value)
    }
}

impl From<FieldId> for ModelIdentity {
    fn from(value: FieldId) -> Self {
        Self::Field(value)
    }
}

impl std::fmt::Debug for ModelIdentity {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name(name) => fmt.debug_tuple("Name").field(name).finish(),
            Self::Field(field) => fmt.debug_tuple("Field").field(field).finish(),
            Self::Factory(_) => fmt.write_str("Factory(..)"),
        }
    }
}
