use crate::db::Db;

use backoffice_core::schema::{Direction, Field, FieldId, Model, Registry, Relation};
use backoffice_core::stmt::{Delete, Expr, Insert, Join, Row, Select, Update, Value};
use backoffice_core::{Error, Result};

use tracing::debug;

/// Resolves relationship attributes into executable queries and reconciles
/// relationship links after create/update form submissions.
#[derive(Debug, Clone, Copy)]
pub struct RelationLoader<'a> {
    registry: &'a Registry,
}

/// A relationship resolved eagerly into fetched rows.
#[derive(Debug)]
pub enum LoadedRelation {
    /// Many-to-one: at most one related row.
    One(Option<Row>),

    /// One-to-many / many-to-many: the related collection.
    Many(Vec<Row>),
}

/// The audited effect of one reconciliation: the related set read before
/// any write, the set read after, and the ids that were linked/unlinked.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub before: Vec<Row>,
    pub after: Vec<Row>,
    pub linked: Vec<Value>,
    pub unlinked: Vec<Value>,
}

impl<'a> RelationLoader<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Build the query resolving `field` for the given row, keyed by the
    /// relationship's direction.
    ///
    /// Returns `None` for a many-to-one relationship whose foreign key is
    /// null: there is nothing to fetch, so no query is executed.
    pub fn load(&self, row: &Row, field: impl Into<FieldId>) -> Result<Option<Select>> {
        let field_id = field.into();
        let owner = self.registry.model(row.model);
        let field = owner.field(field_id);
        let relation = relation_of(field)?;

        match self.registry.relation_direction(field_id) {
            Direction::ManyToOne => self.many_to_one(owner, row, field, relation),
            Direction::OneToMany => self.one_to_many(owner, row, field, relation).map(Some),
            Direction::ManyToMany => self.many_to_many(owner, row, field_id).map(Some),
        }
    }

    /// Resolve `field` and fetch the result, for callers that want the
    /// collection rather than a live query.
    pub async fn load_eager(
        &self,
        db: &Db,
        row: &Row,
        field: impl Into<FieldId>,
    ) -> Result<LoadedRelation> {
        let field_id = field.into();
        let query = self.load(row, field_id)?;

        match self.registry.relation_direction(field_id) {
            Direction::ManyToOne => match query {
                Some(query) => Ok(LoadedRelation::One(db.first(query).await?)),
                None => Ok(LoadedRelation::One(None)),
            },
            _ => {
                let query = query.expect("collection directions always produce a query");
                Ok(LoadedRelation::Many(db.all(query).await?))
            }
        }
    }

    /// Point lookup: the related row whose primary key equals the value
    /// stored in this row's foreign-key attribute.
    fn many_to_one(
        &self,
        owner: &Model,
        row: &Row,
        field: &Field,
        relation: &Relation,
    ) -> Result<Option<Select>> {
        let related = self.registry.model(relation.target);
        let fk = owner
            .foreign_key_for(&field.name.app_name.snake_case())
            .ok_or_else(|| {
                Error::relationship_configuration(format!(
                    "many-to-one relationship `{}` has no foreign-key column on `{}`",
                    field.name.app_name.snake_case(),
                    owner.name.upper_camel_case()
                ))
            })?;

        let fk_value = row.value(fk);
        if fk_value.is_null() {
            return Ok(None);
        }
        Ok(Some(related.find_by_id(fk_value.clone())))
    }

    /// Collection query: all related rows whose reciprocal foreign key
    /// equals this row's primary key.
    fn one_to_many(
        &self,
        owner: &Model,
        row: &Row,
        field: &Field,
        relation: &Relation,
    ) -> Result<Select> {
        let related = self.registry.model(relation.target);
        let related_fk = self.reciprocal_fk(owner, field, relation, related)?;
        let pk_value = row.value(owner.primary_key).clone();

        Ok(Select::new(
            related.id,
            Expr::eq(related_fk, Expr::value(pk_value)),
        ))
    }

    /// Three-way join through the association model, filtered by this row's
    /// primary key, de-duplicated on both sides of the join fan-out.
    fn many_to_many(&self, owner: &Model, row: &Row, field: FieldId) -> Result<Select> {
        let related = self.registry.related_model(field);
        let secondary = self.registry.secondary_model(field)?;

        let owner_fk = self.registry.secondary_fk(secondary, owner)?;
        let related_fk = self.registry.secondary_fk(secondary, related)?;
        let pk_value = row.value(owner.primary_key).clone();

        let select = Select::new(related.id, Expr::eq(owner_fk, Expr::value(pk_value)))
            .join(Join::new(
                secondary.id,
                Expr::eq(related_fk, Expr::field(related.primary_key)),
            ))
            .distinct();
        Ok(select)
    }

    /// The foreign-key column on the related model backing the reciprocal
    /// relationship. Requires a declared back-reference; without one the
    /// join column cannot be resolved.
    fn reciprocal_fk(
        &self,
        owner: &Model,
        field: &Field,
        relation: &Relation,
        related: &Model,
    ) -> Result<FieldId> {
        let back = relation.back_reference.as_deref().ok_or_else(|| {
            Error::relationship_configuration(format!(
                "one-to-many relationship `{}::{}` declares no back-reference",
                owner.name.upper_camel_case(),
                field.name.app_name.snake_case()
            ))
        })?;

        related
            .foreign_key_for(back)
            .map(|fk| fk.id)
            .ok_or_else(|| {
                Error::relationship_configuration(format!(
                    "related model `{}` has no foreign-key column for back-reference `{back}`",
                    related.name.upper_camel_case()
                ))
            })
    }

    /// Reconcile a relationship's links against the target-id list posted
    /// from a create/update form.
    ///
    /// The affected set is read before and after the writes so callers can
    /// audit the transition.
    pub async fn reconcile_links(
        &self,
        db: &Db,
        row: &Row,
        field: impl Into<FieldId>,
        target_ids: &[Value],
    ) -> Result<ReconcileReport> {
        let field_id = field.into();
        let owner = self.registry.model(row.model);
        let field = owner.field(field_id);
        let relation = relation_of(field)?;

        match self.registry.relation_direction(field_id) {
            // The foreign key is part of the owning row; nothing to do here.
            Direction::ManyToOne => Ok(ReconcileReport::default()),
            Direction::OneToMany => {
                self.reconcile_one_to_many(db, owner, row, field, relation, target_ids)
                    .await
            }
            Direction::ManyToMany => {
                self.reconcile_many_to_many(db, owner, row, field_id, target_ids)
                    .await
            }
        }
    }

    /// Re-point rows no longer in the id list to a null foreign key, then
    /// re-point every listed row at this owner.
    async fn reconcile_one_to_many(
        &self,
        db: &Db,
        owner: &Model,
        row: &Row,
        field: &Field,
        relation: &Relation,
        target_ids: &[Value],
    ) -> Result<ReconcileReport> {
        let related = self.registry.model(relation.target);
        let related_fk = self.reciprocal_fk(owner, field, relation, related)?;
        let pk_value = row.value(owner.primary_key).clone();

        let linked_query = Select::new(
            related.id,
            Expr::eq(related_fk, Expr::value(pk_value.clone())),
        );

        let before = db.all(linked_query.clone()).await?;

        let unlinked: Vec<Value> = before
            .iter()
            .map(|related_row| related_row.value(related.primary_key).clone())
            .filter(|id| !target_ids.contains(id))
            .collect();

        if !unlinked.is_empty() {
            debug!(
                relation = %field.name.app_name.snake_case(),
                count = unlinked.len(),
                "unlinking related rows"
            );
            db.exec(
                Update::new(
                    related.id,
                    Expr::in_list(related.primary_key, unlinked.clone()),
                )
                .set(related_fk, Value::Null),
            )
            .await?;
        }

        if !target_ids.is_empty() {
            db.exec(
                Update::new(
                    related.id,
                    Expr::in_list(related.primary_key, target_ids.to_vec()),
                )
                .set(related_fk, pk_value),
            )
            .await?;
        }

        let after = db.all(linked_query).await?;

        Ok(ReconcileReport {
            before,
            after,
            linked: target_ids.to_vec(),
            unlinked,
        })
    }

    /// Drop association rows for ids no longer present, then insert rows
    /// only for ids not already associated. Inserting the same id twice
    /// never creates duplicate association rows.
    async fn reconcile_many_to_many(
        &self,
        db: &Db,
        owner: &Model,
        row: &Row,
        field: FieldId,
        target_ids: &[Value],
    ) -> Result<ReconcileReport> {
        let related = self.registry.related_model(field);
        let secondary = self.registry.secondary_model(field)?;
        let owner_fk = self.registry.secondary_fk(secondary, owner)?;
        let related_fk = self.registry.secondary_fk(secondary, related)?;
        let pk_value = row.value(owner.primary_key).clone();

        let assoc_query = Select::new(
            secondary.id,
            Expr::eq(owner_fk, Expr::value(pk_value.clone())),
        );

        let before = db.all(assoc_query.clone()).await?;
        let associated: Vec<Value> = before
            .iter()
            .map(|assoc| assoc.value(related_fk).clone())
            .collect();

        let unlinked: Vec<Value> = associated
            .iter()
            .filter(|id| !target_ids.contains(id))
            .cloned()
            .collect();

        if !unlinked.is_empty() {
            let mut filter = Expr::eq(owner_fk, Expr::value(pk_value.clone()));
            filter.add_filter(Expr::in_list(related_fk, unlinked.clone()));
            db.exec(Delete::new(secondary.id, filter)).await?;
        }

        let mut linked: Vec<Value> = vec![];
        for id in target_ids {
            if associated.contains(id) || linked.contains(id) {
                continue;
            }
            linked.push(id.clone());
        }

        if !linked.is_empty() {
            let rows = linked
                .iter()
                .map(|id| {
                    let mut assoc = Row::new(secondary.id, vec![Value::Null; secondary.fields.len()]);
                    assoc.set(owner_fk, pk_value.clone());
                    assoc.set(related_fk, id.clone());
                    assoc
                })
                .collect();
            db.exec(Insert::new(secondary.id, rows)).await?;
        }

        let after = db.all(assoc_query).await?;

        Ok(ReconcileReport {
            before,
            after,
            linked,
            unlinked,
        })
    }
}

fn relation_of(field: &Field) -> Result<&Relation> {
    field.ty.as_relation().ok_or_else(|| {
        Error::relationship_configuration(format!(
            "attribute `{}` is not a relationship",
            field.name.app_name.snake_case()
        ))
    })
}
