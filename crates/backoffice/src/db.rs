use backoffice_core::driver::{Driver, Rows};
use backoffice_core::schema::{Model, Registry};
use backoffice_core::stmt::{Row, Select, Statement, Value};
use backoffice_core::{Error, Result};

use std::fmt;
use std::sync::Arc;

/// Handle pairing a model registry with a storage driver.
///
/// Cloning is cheap; all clones share the same registry and driver.
#[derive(Clone)]
pub struct Db {
    registry: Arc<Registry>,
    driver: Arc<dyn Driver>,
}

impl Db {
    pub fn new(registry: Arc<Registry>, driver: Arc<dyn Driver>) -> Self {
        Self { registry, driver }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_handle(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Execute a statement and return the raw driver response.
    pub async fn exec(&self, stmt: impl Into<Statement>) -> Result<Rows> {
        let response = self.driver.execute(stmt.into()).await?;
        Ok(response.rows)
    }

    /// Execute a select and collect all result rows.
    pub async fn all(&self, select: Select) -> Result<Vec<Row>> {
        self.exec(select).await?.into_values()
    }

    /// Execute a select expected to match at most one row.
    pub async fn first(&self, select: Select) -> Result<Option<Row>> {
        let mut rows = self.all(select).await?;
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.swap_remove(0)))
        }
    }

    /// Execute a count query.
    pub async fn count(&self, select: Select) -> Result<u64> {
        self.exec(select.count()).await?.into_count()
    }

    /// Fetch the row of `model` whose primary key equals `pk`.
    pub async fn get_by_pk(&self, model: &Model, pk: &Value) -> Result<Option<Row>> {
        self.first(model.find_by_id(pk.clone())).await
    }

    /// Fetch the row or fail with a record-not-found error.
    pub async fn get_by_pk_or_err(&self, model: &Model, pk: &Value) -> Result<Row> {
        self.get_by_pk(model, pk).await?.ok_or_else(|| {
            Error::record_not_found(format!("{}({})", model.name.upper_camel_case(), pk))
        })
    }
}

impl fmt::Debug for Db {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db").field("driver", &self.driver).finish()
    }
}
