use async_trait::async_trait;
use dbsage_core::{NewQueryTemplate, QueryTemplate};

use crate::error::StorageError;

/// Normalized query templates.
#[async_trait]
pub trait QueryStore: Send + Sync {
    /// Insert a template; a name that already exists is skipped.
    ///
    /// Returns `true` when a row was inserted.
    async fn insert_template(&self, template: &NewQueryTemplate) -> Result<bool, StorageError>;

    async fn get_template(&self, id: i32) -> Result<Option<QueryTemplate>, StorageError>;

    /// Ids of every template in `environment`, ascending.
    async fn list_template_ids(&self, environment: &str) -> Result<Vec<i32>, StorageError>;
}
