//! Database Layer
//!
//! The [`Store`] trait is the persistence boundary for users, roles,
//! communities and the membership ledger. `PgStore` backs it with `PostgreSQL`;
//! `MemoryStore` keeps everything in process for development and tests.
//!
//! Both implementations enforce the same constraints:
//! - `users.email` unique
//! - `roles.name` unique
//! - `communities.name` unique
//! - `(members.community_id, members.user_id)` unique
//! - deleting a community deletes its members

mod memory;
mod models;
mod postgres;


use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::pagination::{Page, PageRequest};

pub use memory::MemoryStore;
pub use models::*;
pub use postgres::PgStore;

/// Persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// The write references a row that does not exist.
    #[error("Referenced record missing: {0}")]
    MissingReference(String),

    /// Any other database failure.
    #[error("Database error")]
    Database(#[source] sqlx::Error),
}

impl StoreError {
    #[must_use]
    pub const fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            if db_err.is_unique_violation() {
                return Self::UniqueViolation(constraint);
            }
            if db_err.is_foreign_key_violation() {
                return Self::MissingReference(constraint);
            }
        }
        Self::Database(err)
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence port used by every handler.
#[async_trait]
pub trait Store: Send + Sync {
    // Users

    /// Insert a user. Fails with `UniqueViolation` if the email is taken.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    // Roles

    /// Insert a role. Fails with `UniqueViolation` if the name is taken.
    async fn create_role(&self, name: &str) -> StoreResult<Role>;

    async fn find_role_by_id(&self, id: Uuid) -> StoreResult<Option<Role>>;

    async fn find_role_by_name(&self, name: &str) -> StoreResult<Option<Role>>;

    async fn list_roles(&self, page: PageRequest) -> StoreResult<Page<Role>>;

    // Communities

    /// Insert a community together with its owner's membership under
    /// `owner_role_id`. Either both rows become visible or neither does.
    async fn create_community(
        &self,
        community: NewCommunity,
        owner_role_id: Uuid,
    ) -> StoreResult<(Community, Member)>;

    async fn find_community_by_id(&self, id: Uuid) -> StoreResult<Option<Community>>;

    async fn community_name_exists(&self, name: &str) -> StoreResult<bool>;

    /// Delete a community and all of its members. Returns `false` if it did not exist.
    async fn delete_community(&self, id: Uuid) -> StoreResult<bool>;

    async fn list_communities(&self, page: PageRequest) -> StoreResult<Page<CommunityWithOwner>>;

    async fn list_owned_communities(
        &self,
        owner_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<Community>>;

    /// Communities where `user_id` holds any membership.
    async fn list_joined_communities(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<CommunityWithOwner>>;

    // Members

    /// Insert a member. Fails with `UniqueViolation` if the user already
    /// belongs to the community.
    async fn create_member(&self, member: NewMember) -> StoreResult<Member>;

    async fn find_member_by_id(&self, id: Uuid) -> StoreResult<Option<Member>>;

    async fn find_member(&self, community_id: Uuid, user_id: Uuid)
        -> StoreResult<Option<Member>>;

    /// Delete a member.
    ///
    /// With `protected_role_id` set, refuses (`MemberRemoval::LastOfRole`) when
    /// the member holds that role and nobody else in the community does. The
    /// check and the delete are atomic.
    async fn remove_member(
        &self,
        id: Uuid,
        protected_role_id: Option<Uuid>,
    ) -> StoreResult<MemberRemoval>;

    async fn list_members(
        &self,
        community_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<MemberDetail>>;
}

/// Create `PostgreSQL` connection pool with health configuration.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        // Keep minimum connections warm to prevent cold-start latency
        .min_connections(2)
        .max_connections(20)
        // Prevent hanging requests on pool exhaustion
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .test_before_acquire(true)
        .connect(database_url)
        .await?;

    info!("Connected to PostgreSQL");
    Ok(pool)
}

/// Run database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations completed");
    Ok(())
}
