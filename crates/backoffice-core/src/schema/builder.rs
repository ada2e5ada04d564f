use super::model::foreign_key_name;
use super::{
    ColumnTy, Computed, Direction, Field, FieldDefault, FieldId, FieldName, FieldTy, Model,
    ModelId, Name, Registry, Relation,
};
use crate::stmt::Value;
use crate::{Error, Result};

use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;

/// Builds a [`Registry`] from model descriptors in two passes: pass 1
/// collects and validates every declared model; pass 2 resolves relation
/// targets, synthesizes missing reciprocal relationships, and marks
/// foreign-key columns. No model is mutated after the registry is built.
#[derive(Default)]
pub struct Builder {
    models: Vec<ModelDescriptor>,
}

/// Declares a model to be registered.
pub struct ModelDescriptor {
    name: String,
    module: Option<String>,
    table_name: Option<String>,
    primary_key: Option<String>,
    fields: Vec<FieldDescriptor>,
}

/// Declares one model attribute: a column, a relationship, or a computed
/// property.
pub struct FieldDescriptor {
    name: String,
    storage_name: Option<String>,
    kind: FieldKind,
    nullable: bool,
    primary_key: bool,
    foreign_key: bool,
    default: Option<FieldDefault>,
}

enum FieldKind {
    Column(ColumnTy),
    Relation(RelationDescriptor),
    Computed(Option<ColumnTy>),
}

/// Declares a relationship attribute. The target and secondary models are
/// referenced by name and resolved when the registry is built.
pub struct RelationDescriptor {
    target: String,
    secondary: Option<String>,
    back_reference: Option<String>,
    direction: Option<Direction>,
}

impl ModelDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            module: None,
            table_name: None,
            primary_key: None,
            fields: vec![],
        }
    }

    pub fn module(mut self, module: &str) -> Self {
        self.module = Some(module.to_string());
        self
    }

    pub fn table(mut self, table_name: &str) -> Self {
        self.table_name = Some(table_name.to_string());
        self
    }

    /// Override primary-key selection. Without an override the first field
    /// declared with the primary-key flag is used.
    pub fn primary_key(mut self, field_name: &str) -> Self {
        self.primary_key = Some(field_name.to_string());
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }
}

impl FieldDescriptor {
    pub fn column(name: &str, ty: ColumnTy) -> Self {
        Self::new(name, FieldKind::Column(ty))
    }

    pub fn relation(name: &str, relation: RelationDescriptor) -> Self {
        Self::new(name, FieldKind::Relation(relation))
    }

    pub fn computed(name: &str) -> Self {
        Self::new(name, FieldKind::Computed(None))
    }

    pub fn computed_typed(name: &str, ty: ColumnTy) -> Self {
        Self::new(name, FieldKind::Computed(Some(ty)))
    }

    fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            storage_name: None,
            kind,
            nullable: false,
            primary_key: false,
            foreign_key: false,
            default: None,
        }
    }

    pub fn storage(mut self, storage_name: &str) -> Self {
        self.storage_name = Some(storage_name.to_string());
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn foreign_key(mut self) -> Self {
        self.foreign_key = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(FieldDefault::Value(value.into()));
        self
    }

    /// A zero-argument callable default, evaluated once at form-build time.
    pub fn default_fn(mut self, f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.default = Some(FieldDefault::Callable(Arc::new(f)));
        self
    }
}

impl RelationDescriptor {
    pub fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            secondary: None,
            back_reference: None,
            direction: None,
        }
    }

    /// The association model mediating a many-to-many relationship.
    pub fn secondary(mut self, secondary: &str) -> Self {
        self.secondary = Some(secondary.to_string());
        self
    }

    /// The reciprocal relationship attribute on the target model. Synthesized
    /// there at build time when absent.
    pub fn back_reference(mut self, name: &str) -> Self {
        self.back_reference = Some(name.to_string());
        self
    }

    /// Explicit direction declaration; skips the naming-convention heuristic.
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }
}

/// A reciprocal relationship to install on a target model during linking.
struct SynthesizedRelation {
    target: ModelId,
    name: String,
    owner: ModelId,
    owner_field: String,
    secondary: Option<ModelId>,
    declared: Option<Direction>,
}

impl Builder {
    pub fn model(mut self, model: ModelDescriptor) -> Self {
        self.models.push(model);
        self
    }

    pub fn build(self) -> Result<Registry> {
        // Pass 1: collect model names so relation targets can be resolved.
        let mut name_to_id: IndexMap<String, ModelId> = IndexMap::new();
        for (index, desc) in self.models.iter().enumerate() {
            if desc.fields.is_empty() && desc.table_name.is_none() {
                return Err(Error::model_introspection(format!(
                    "model `{}` has no fields and no table binding",
                    desc.name
                )));
            }
            let name = Name::new(&desc.name).upper_camel_case();
            if name_to_id.insert(name.clone(), ModelId(index)).is_some() {
                return Err(Error::model_introspection(format!(
                    "model `{name}` is registered more than once"
                )));
            }
        }

        // Pass 2: build each model, resolving relation targets by name.
        let mut models: IndexMap<ModelId, Model> = IndexMap::new();
        for (index, desc) in self.models.into_iter().enumerate() {
            let id = ModelId(index);
            let model = build_model(id, desc, &name_to_id)?;
            models.insert(id, model);
        }

        link_reciprocals(&mut models);
        mark_foreign_keys(&mut models);

        Ok(Registry { models })
    }
}

fn build_model(
    id: ModelId,
    desc: ModelDescriptor,
    name_to_id: &IndexMap<String, ModelId>,
) -> Result<Model> {
    let mut fields = Vec::with_capacity(desc.fields.len());

    for (index, field_desc) in desc.fields.into_iter().enumerate() {
        let ty = match field_desc.kind {
            FieldKind::Column(ty) => FieldTy::Column(ty),
            FieldKind::Computed(value_ty) => FieldTy::Computed(Computed { value_ty }),
            FieldKind::Relation(rel) => {
                let target = resolve_model_name(&rel.target, name_to_id, &desc.name)?;
                let secondary = rel
                    .secondary
                    .as_deref()
                    .map(|name| resolve_model_name(name, name_to_id, &desc.name))
                    .transpose()?;

                let mut relation = Relation::new(target);
                relation.secondary = secondary;
                relation.back_reference = rel.back_reference;
                relation.declared = rel.direction;
                FieldTy::Relation(relation)
            }
        };

        fields.push(Field {
            id: FieldId { model: id, index },
            name: FieldName {
                app_name: Name::new(&field_desc.name),
                storage_name: field_desc.storage_name,
            },
            ty,
            nullable: field_desc.nullable,
            primary_key: field_desc.primary_key,
            foreign_key: field_desc.foreign_key,
            default: field_desc.default,
        });
    }

    let primary_key = resolve_primary_key(&desc.name, desc.primary_key.as_deref(), &fields)?;

    Ok(Model {
        id,
        name: Name::new(&desc.name),
        module: desc.module,
        table_name: desc.table_name,
        fields,
        primary_key,
    })
}

fn resolve_model_name(
    name: &str,
    name_to_id: &IndexMap<String, ModelId>,
    owner: &str,
) -> Result<ModelId> {
    name_to_id.get(name).copied().ok_or_else(|| {
        Error::model_not_found(format!(
            "`{owner}` references model `{name}`, which was not registered; \
             did you forget to add it to the registry builder?"
        ))
    })
}

/// Single-column primary keys only: the explicit override wins, otherwise the
/// first field declared with the primary-key flag.
fn resolve_primary_key(
    model_name: &str,
    primary_key_override: Option<&str>,
    fields: &[Field],
) -> Result<FieldId> {
    if let Some(name) = primary_key_override {
        return fields
            .iter()
            .find(|field| field.name.app_name.snake_case() == name)
            .map(|field| field.id)
            .ok_or_else(|| Error::field_not_found(model_name, name));
    }

    fields
        .iter()
        .find(|field| field.primary_key && field.is_column())
        .map(|field| field.id)
        .ok_or_else(|| {
            Error::model_introspection(format!("model `{model_name}` has no primary key column"))
        })
}

/// Install the reciprocal relationship attribute on every relation target
/// that declares a back-reference the target does not yet carry.
///
/// Runs eagerly at build time so downstream loads never hit a missing
/// attribute.
fn link_reciprocals(models: &mut IndexMap<ModelId, Model>) {
    let mut synthesized: Vec<SynthesizedRelation> = vec![];

    for model in models.values() {
        for (field, relation) in model.relation_fields() {
            let Some(back) = &relation.back_reference else {
                continue;
            };
            let target = &models[&relation.target];
            if target.field_by_name(back).is_some() {
                continue;
            }
            synthesized.push(SynthesizedRelation {
                target: relation.target,
                name: back.clone(),
                owner: model.id,
                owner_field: field.name.app_name.snake_case(),
                secondary: relation.secondary,
                declared: relation.declared.map(Direction::inverse),
            });
        }
    }

    for synth in synthesized {
        let target = models.get_mut(&synth.target).expect("invalid model ID");
        let index = target.fields.len();

        debug!(
            model = %target.name.upper_camel_case(),
            field = %synth.name,
            "synthesizing reciprocal relationship attribute"
        );

        let mut relation = Relation::new(synth.owner);
        relation.secondary = synth.secondary;
        relation.back_reference = Some(synth.owner_field);
        relation.declared = synth.declared;

        target.fields.push(Field {
            id: FieldId {
                model: synth.target,
                index,
            },
            name: FieldName::new(&synth.name),
            ty: FieldTy::Relation(relation),
            nullable: true,
            primary_key: false,
            foreign_key: false,
            default: None,
        });
    }
}

/// Mark the columns conventionally backing relationship attributes so form
/// scaffolding can exclude them from editing.
fn mark_foreign_keys(models: &mut IndexMap<ModelId, Model>) {
    let mut marks: Vec<FieldId> = vec![];

    for model in models.values() {
        for (field, relation) in model.relation_fields() {
            // `{relation}_id` on the owning model
            if let Some(fk) = model.foreign_key_for(&field.name.app_name.snake_case()) {
                marks.push(fk.id);
            }

            // `{owner}_id` / `{target}_id` on the association model
            if let Some(secondary) = relation.secondary {
                let secondary = &models[&secondary];
                for side in [model.id, relation.target] {
                    let key = foreign_key_name(&models[&side].name.snake_case());
                    if let Some(fk) = secondary.field_by_name(&key) {
                        marks.push(fk.id);
                    }
                }
            }
        }
    }

    for id in marks {
        let model = models.get_mut(&id.model).expect("invalid model ID");
        model.fields[id.index].foreign_key = true;
    }
}
