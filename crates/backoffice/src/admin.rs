mod page;
pub use page::{PageParams, Pagination};

use crate::db::Db;
use crate::form_data::FormData;
use crate::forms::{self, FormErrors, FormField, FormSpec, ModelConverter, ScaffoldOptions};
use crate::loader::{ReconcileReport, RelationLoader};
use crate::params::{ColumnSet, ParamColumn, SortOption, WhereOption};

use backoffice_core::schema::{Direction, FieldId, Model, ModelId, ModelIdentity};
use backoffice_core::stmt::{Delete, Expr, Insert, Row, Select, Update, Value};
use backoffice_core::{Error, Result};

use std::sync::Arc;
use tracing::debug;

/// The per-model admin unit: configuration plus the list / detail / create /
/// edit / delete flows, HTTP-free. Callers own routing, templating, and the
/// permission responses derived from [`ModelAdmin::can`].
pub struct ModelAdmin {
    db: Db,
    model: ModelId,
    pub config: AdminConfig,
    converter: ModelConverter,

    /// Caller-supplied accessibility predicate, consulted on top of the
    /// capability flags. Policy itself lives outside the engine.
    accessible: Option<Arc<dyn Fn(Action) -> bool + Send + Sync>>,
}

#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Display name; defaults to the prettified model name.
    pub name: String,

    /// Plural display name; defaults to the pluralized model name.
    pub name_plural: String,

    /// Field names shown as list-view columns.
    pub list_columns: Vec<String>,

    /// Field names shown on the detail view.
    pub details_columns: Vec<String>,

    /// Restrict scaffolded form fields.
    pub form_only: Option<Vec<String>>,
    pub form_exclude: Vec<String>,

    pub page_size: u64,
    pub page_size_options: Vec<u64>,

    pub can_create: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_view: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Detail,
    Create,
    Edit,
    Delete,
}

/// Everything a template needs to render one list page.
#[derive(Debug)]
pub struct ListPage {
    pub pagination: Pagination,
    pub columns: ColumnSet,
    pub headers: Vec<ColumnHeader>,
    pub rows: Vec<Row>,
}

/// Per-column header controls: sort links carrying the overlayed query
/// string, the filter form's clause options, and the hidden fields
/// preserving every other column's state.
#[derive(Debug)]
pub struct ColumnHeader {
    pub field: String,
    pub label: String,
    pub sort_options: Vec<SortOption>,
    pub where_options: Vec<WhereOption>,
    pub filter_active: bool,
    pub filter_operand: Option<String>,

    /// The operand input, converted with the same table used for model
    /// forms.
    pub operand_field: Option<FormField>,

    /// Hidden `(name, value)` pairs carrying the other columns' state
    /// through a filter submission.
    pub hidden_pairs: Vec<(String, String)>,
}

/// The outcome of a create/edit submission.
#[derive(Debug)]
pub enum SubmitOutcome {
    Saved {
        pk: Value,
        reports: Vec<ReconcileReport>,
    },
    Invalid(FormErrors),
}

impl ModelAdmin {
    pub fn new(db: Db, identity: impl Into<ModelIdentity>) -> Result<Self> {
        let model = db.registry().find_model(&identity.into())?;
        let config = AdminConfig::defaults(model);
        let model = model.id;
        Ok(Self {
            db,
            model,
            config,
            converter: ModelConverter::new(),
            accessible: None,
        })
    }

    pub fn with_config(mut self, config: AdminConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_converter(mut self, converter: ModelConverter) -> Self {
        self.converter = converter;
        self
    }

    pub fn with_accessible(mut self, f: impl Fn(Action) -> bool + Send + Sync + 'static) -> Self {
        self.accessible = Some(Arc::new(f));
        self
    }

    pub fn model(&self) -> &Model {
        self.db.registry().model(self.model)
    }

    /// Capability check for an action: the config flag, narrowed by the
    /// accessibility predicate when one is supplied. A `false` here is a
    /// policy answer (403 at the caller), never an error.
    pub fn can(&self, action: Action) -> bool {
        let allowed = match action {
            Action::List | Action::Detail => self.config.can_view,
            Action::Create => self.config.can_create,
            Action::Edit => self.config.can_edit,
            Action::Delete => self.config.can_delete,
        };
        allowed
            && self
                .accessible
                .as_ref()
                .map(|accessible| accessible(action))
                .unwrap_or(true)
    }

    /// Blank parametrized columns for the configured list columns.
    pub fn column_templates(&self) -> Vec<ParamColumn> {
        let model = self.model();
        let model_name = model.name.upper_camel_case();
        self.config
            .list_columns
            .iter()
            .filter_map(|name| {
                let field = model.field_by_name(name)?;
                Some(ParamColumn::new(
                    &model_name,
                    name,
                    &field.name.app_name.human(),
                ))
            })
            .collect()
    }

    /// The list view: parse filters/sorts from the query string, run the
    /// paginated query, and build per-column header controls whose links
    /// preserve all other active filter/sort state.
    pub async fn list(&self, query: &str) -> Result<ListPage> {
        let registry = self.db.registry();
        let model = self.model();

        let page_params = PageParams::from_query_str(query, self.config.page_size);
        let templates = self.column_templates();
        let set = ColumnSet::from_query_str(&templates, query);

        let mut select = Select::new(model.id, true);
        for expr in set.where_exprs(registry)? {
            select.add_filter(expr);
        }

        let count = self.db.count(select.clone()).await?;

        let mut select = select;
        for order in set.order_by(registry)? {
            select = select.order_by(order);
        }
        let rows = self
            .db
            .all(select.paginate(page_params.page, page_params.page_size))
            .await?;

        let mut headers = vec![];
        for column in &set.columns {
            headers.push(self.column_header(&set, column).await?);
        }

        Ok(ListPage {
            pagination: Pagination {
                page: page_params.page,
                page_size: page_params.page_size,
                count,
            },
            columns: set,
            headers,
            rows,
        })
    }

    async fn column_header(&self, set: &ColumnSet, column: &ParamColumn) -> Result<ColumnHeader> {
        let model = self.model();
        let operand_field = match model.field_by_name(&column.field) {
            Some(attr) => self.converter.convert(&self.db, model, attr).await?,
            None => None,
        };

        Ok(ColumnHeader {
            field: column.field.clone(),
            label: column.label.clone(),
            sort_options: set.sort_options(column),
            where_options: set.where_options(column),
            filter_active: column.is_where_active(),
            filter_operand: column.active_operand().map(str::to_string),
            operand_field,
            hidden_pairs: set.form_data_overlayed(&column.cleared()),
        })
    }

    /// Fetch one row by its primary key, cast from its URL string form.
    pub async fn detail(&self, pk: &str) -> Result<Row> {
        let model = self.model();
        let pk = self.cast_pk(pk)?;
        self.db.get_by_pk_or_err(model, &pk).await
    }

    /// Scaffold the create/edit form for this model.
    pub async fn scaffold_form(&self) -> Result<FormSpec> {
        let options = ScaffoldOptions {
            only: self.config.form_only.clone(),
            exclude: self.config.form_exclude.clone(),
            extra_fields: vec![],
        };
        forms::scaffold_form(&self.db, self.model(), &self.converter, &options).await
    }

    /// Handle a create submission: validate, insert, then reconcile
    /// relationship links against the posted target ids.
    pub async fn create(&self, data: &FormData) -> Result<SubmitOutcome> {
        let registry = self.db.registry();
        let model = self.model();

        let form = self.scaffold_form().await?;
        let validated = match form.validate(registry, model, data) {
            forms::ValidationOutcome::Invalid(errors) => {
                return Ok(SubmitOutcome::Invalid(errors))
            }
            forms::ValidationOutcome::Valid(validated) => validated,
        };

        let mut row = Row::new(model.id, vec![Value::Null; model.fields.len()]);
        for (field, value) in &validated.columns {
            row.set(*field, value.clone());
        }

        let to_many = self.apply_many_to_one(&mut row, &validated.relations)?;

        let mut inserted = self
            .db
            .exec(Insert::new(model.id, vec![row]))
            .await?
            .into_values()?;
        if inserted.is_empty() {
            return Err(Error::driver("insert returned no rows"));
        }
        let row = inserted.swap_remove(0);

        let reports = self.reconcile(&row, &to_many).await?;
        debug!(model = %model.name.upper_camel_case(), "created row");

        Ok(SubmitOutcome::Saved {
            pk: row.value(model.primary_key).clone(),
            reports,
        })
    }

    /// Handle an edit submission for the row with the given primary key.
    pub async fn edit(&self, pk: &str, data: &FormData) -> Result<SubmitOutcome> {
        let registry = self.db.registry();
        let model = self.model();

        let row = self.detail(pk).await?;

        let form = self.scaffold_form().await?;
        let validated = match form.validate(registry, model, data) {
            forms::ValidationOutcome::Invalid(errors) => {
                return Ok(SubmitOutcome::Invalid(errors))
            }
            forms::ValidationOutcome::Valid(validated) => validated,
        };

        let mut update = Update::new(model.id, pk_filter(model, &row));
        for (field, value) in &validated.columns {
            update = update.set(*field, value.clone());
        }

        let mut fk_row = row.clone();
        let to_many = self.apply_many_to_one(&mut fk_row, &validated.relations)?;
        for field in model.fields.iter().filter(|field| field.foreign_key) {
            if fk_row.value(field) != row.value(field) {
                update = update.set(field, fk_row.value(field).clone());
            }
        }

        self.db.exec(update).await?;

        let reports = self.reconcile(&row, &to_many).await?;

        Ok(SubmitOutcome::Saved {
            pk: row.value(model.primary_key).clone(),
            reports,
        })
    }

    /// Delete one row by primary key.
    pub async fn delete(&self, pk: &str) -> Result<()> {
        let model = self.model();
        let row = self.detail(pk).await?;
        self.db
            .exec(Delete::new(model.id, pk_filter(model, &row)))
            .await?;
        Ok(())
    }

    /// Write many-to-one selections into their foreign-key columns; collect
    /// the to-many lists for post-write reconciliation.
    fn apply_many_to_one(
        &self,
        row: &mut Row,
        relations: &[(FieldId, Vec<Value>)],
    ) -> Result<Vec<(FieldId, Vec<Value>)>> {
        let registry = self.db.registry();
        let model = self.model();
        let mut to_many = vec![];

        for (field_id, ids) in relations {
            match registry.relation_direction(*field_id) {
                Direction::ManyToOne => {
                    let field = model.field(*field_id);
                    let fk = model
                        .foreign_key_for(&field.name.app_name.snake_case())
                        .ok_or_else(|| {
                            Error::relationship_configuration(format!(
                                "many-to-one relationship `{}` has no foreign-key column",
                                field.name.app_name.snake_case()
                            ))
                        })?;
                    row.set(fk.id, ids.first().cloned().unwrap_or(Value::Null));
                }
                _ => to_many.push((*field_id, ids.clone())),
            }
        }

        Ok(to_many)
    }

    async fn reconcile(
        &self,
        row: &Row,
        to_many: &[(FieldId, Vec<Value>)],
    ) -> Result<Vec<ReconcileReport>> {
        let registry = self.db.registry_handle();
        let loader = RelationLoader::new(&registry);
        let mut reports = vec![];
        for (field_id, ids) in to_many {
            reports.push(loader.reconcile_links(&self.db, row, *field_id, ids).await?);
        }
        Ok(reports)
    }

    /// Cast a primary key's URL string form to its declared type.
    fn cast_pk(&self, raw: &str) -> Result<Value> {
        let model = self.model();
        let pk = model.primary_key_field();
        match pk.column_ty() {
            Some(ty) => ty
                .cast(raw)
                .map_err(|msg| Error::validation(pk.name.app_name.snake_case(), msg)),
            None => Ok(Value::String(raw.to_string())),
        }
    }
}

impl AdminConfig {
    pub fn defaults(model: &Model) -> Self {
        let name = model.name.title();
        let name_plural = pluralizer::pluralize(&name, 2, false);
        let list_columns: Vec<String> = model
            .columns()
            .map(|field| field.name.app_name.snake_case())
            .collect();
        let details_columns = model
            .fields
            .iter()
            .map(|field| field.name.app_name.snake_case())
            .collect();

        Self {
            name,
            name_plural,
            list_columns,
            details_columns,
            form_only: None,
            form_exclude: vec![],
            page_size: 10,
            page_size_options: vec![10, 25, 50, 100],
            can_create: true,
            can_edit: true,
            can_delete: true,
            can_view: true,
        }
    }
}

fn pk_filter(model: &Model, row: &Row) -> Expr {
    Expr::eq(
        model.primary_key,
        Expr::value(row.value(model.primary_key).clone()),
    )
}
