//! Base repository trait for store operations.

/// A repository is the data access layer for one key namespace of the store.
/// It provides methods for creating, reading, updating, and deleting records,
/// as well as listing them with simple filters.
use crate::store::errors::Result;

/// Base repository trait providing common store operations
///
/// This trait has separate associated types for create requests, update requests, and responses.
#[async_trait::async_trait]
pub trait Repository {
    /// The request type for creating records
    type CreateRequest;

    /// The request type for updating records
    type UpdateRequest;

    /// The record type returned by operations
    type Response;

    /// The identifier type for lookups
    type Id: Send + Sync;

    /// The filter type for list operations
    type Filter: Send + Sync;

    /// Create a new record
    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response>;

    /// Get a record by ID
    async fn get_by_id(&self, id: &Self::Id) -> Result<Option<Self::Response>>;

    /// List records matching a filter
    async fn list(&self, filter: &Self::Filter) -> Result<Vec<Self::Response>>;

    /// Update a record by ID
    async fn update(&self, id: &Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response>;

    /// Delete a record by ID
    async fn delete(&self, id: &Self::Id) -> Result<bool>;
}
