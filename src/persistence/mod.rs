use crate::catalog::{CatalogSnapshot, ScheduleCatalog};
use crate::error::ScheduleError;
use polars::prelude::PolarsError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("dataframe conversion error: {0}")]
    DataFrame(#[from] PolarsError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("no catalog stored")]
    NotFound,
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

pub trait CatalogStore {
    fn save_catalog(&self, snapshot: &CatalogSnapshot) -> PersistenceResult<()>;
    fn load_catalog(&self) -> PersistenceResult<Option<CatalogSnapshot>>;

    /// Loads and validates the stored catalog.
    fn open_catalog(&self) -> PersistenceResult<ScheduleCatalog> {
        let snapshot = self.load_catalog()?.ok_or(PersistenceError::NotFound)?;
        Ok(ScheduleCatalog::from_snapshot(snapshot)?)
    }
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    load_catalog_from_json, load_exception_days_from_csv, save_catalog_to_json,
    save_resolved_days_to_csv,
};
