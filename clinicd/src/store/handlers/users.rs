//! User repository over the `user:` namespace.

use chrono::Utc;
use uuid::Uuid;

use crate::store::errors::{Result, StoreError};
use crate::store::handlers::repository::Repository;
use crate::store::models::users::{UserCreateStoreRequest, UserFilter, UserRecord, UserUpdateStoreRequest};
use crate::store::{KvStore, keys};

/// Repository for user records. Emails are the natural key and are
/// normalized to lowercase on the way in, so lookups are case-insensitive.
pub struct Users<'a> {
    store: &'a KvStore,
}

impl<'a> Users<'a> {
    pub fn new(store: &'a KvStore) -> Self {
        Self { store }
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        self.store.get(&keys::user(email))
    }

    /// Total number of user records, for the health endpoint.
    pub async fn count(&self) -> usize {
        self.store.count_by_prefix(keys::USER)
    }
}

#[async_trait::async_trait]
impl Repository for Users<'_> {
    type CreateRequest = UserCreateStoreRequest;
    type UpdateRequest = UserUpdateStoreRequest;
    type Response = UserRecord;
    type Id = String;
    type Filter = UserFilter;

    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let now = Utc::now();
        let user = UserRecord {
            id: Uuid::new_v4(),
            email: request.email.to_lowercase(),
            name: request.name.clone(),
            role: request.role,
            phone: request.phone.clone(),
            password_hash: request.password_hash.clone(),
            can_login: request.can_login,
            is_walk_in: request.is_walk_in,
            created_by: request.created_by.clone(),
            created_at: now,
            updated_at: now,
        };
        self.store.insert_new(&keys::user(&user.email), &user)?;
        Ok(user)
    }

    async fn get_by_id(&self, email: &Self::Id) -> Result<Option<Self::Response>> {
        self.get_by_email(email).await
    }

    async fn list(&self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut users: Vec<UserRecord> = self.store.get_by_prefix(keys::USER)?;
        if !filter.roles.is_empty() {
            users.retain(|user| filter.roles.contains(&user.role));
        }
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    async fn update(&self, email: &Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let key = keys::user(email);
        let mut user: UserRecord = self.store.get(&key)?.ok_or(StoreError::NotFound)?;

        if let Some(name) = &request.name {
            user.name = name.clone();
        }
        if let Some(phone) = &request.phone {
            user.phone = Some(phone.clone());
        }
        if let Some(password_hash) = &request.password_hash {
            user.password_hash = Some(password_hash.clone());
        }
        if let Some(can_login) = request.can_login {
            user.can_login = can_login;
        }
        if let Some(is_walk_in) = request.is_walk_in {
            user.is_walk_in = is_walk_in;
        }
        user.updated_at = Utc::now();

        self.store.set(&key, &user)?;
        Ok(user)
    }

    async fn delete(&self, email: &Self::Id) -> Result<bool> {
        Ok(self.store.delete(&keys::user(email)))
    }
}
