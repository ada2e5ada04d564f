use crate::stmt::{Row, Statement};
use crate::{async_trait, Error, Result};

use std::fmt::Debug;
use std::sync::Arc;

/// The storage collaborator: executes one statement per call.
///
/// Drivers never see mapper or form state; they receive fully-built
/// statements and return rows or counts. A driver call is the only point at
/// which the engine holds backend resources, and it never holds them across
/// another suspension point.
#[async_trait]
pub trait Driver: Debug + Send + Sync + 'static {
    /// Execute a statement.
    async fn execute(&self, stmt: Statement) -> Result<Response>;
}

#[derive(Debug)]
pub struct Response {
    pub rows: Rows,
}

#[derive(Debug)]
pub enum Rows {
    /// Number of affected or counted rows
    Count(u64),

    /// The result rows
    Values(Vec<Row>),
}

impl Response {
    pub fn from_count(count: u64) -> Self {
        Self {
            rows: Rows::Count(count),
        }
    }

    pub fn from_values(values: Vec<Row>) -> Self {
        Self {
            rows: Rows::Values(values),
        }
    }

    pub fn empty() -> Self {
        Self::from_values(vec![])
    }
}

impl Rows {
    pub fn into_values(self) -> Result<Vec<Row>> {
        match self {
            Self::Values(values) => Ok(values),
            Self::Count(_) => Err(crate::err!("expected rows, driver returned a count")),
        }
    }

    pub fn into_count(self) -> Result<u64> {
        match self {
            Self::Count(count) => Ok(count),
            Self::Values(_) => Err(crate::err!("expected a count, driver returned rows")),
        }
    }
}

/// A synchronous storage backend.
///
/// Bridged onto the async [`Driver`] contract through [`BlockingDriver`], so
/// async callers see a uniform suspend/resume interface regardless of the
/// backend's execution model.
pub trait BlockingBackend: Debug + Send + Sync + 'static {
    fn execute(&self, stmt: Statement) -> Result<Response>;
}

/// Runs a [`BlockingBackend`] on the blocking worker pool.
#[derive(Debug)]
pub struct BlockingDriver<T> {
    backend: Arc<T>,
}

impl<T: BlockingBackend> BlockingDriver<T> {
    pub fn new(backend: T) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }
}

#[async_trait]
impl<T: BlockingBackend> Driver for BlockingDriver<T> {
    async fn execute(&self, stmt: Statement) -> Result<Response> {
        let backend = self.backend.clone();
        tokio::task::spawn_blocking(move || backend.execute(stmt))
            .await
            .map_err(|err| Error::driver(err.to_string()))?
    }
}
