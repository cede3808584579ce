//! Database Models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User model.
///
/// Carries the password hash, so it is never serialized directly; handlers
/// convert it into a public profile first.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Role model.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Community model.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Community {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to insert a community.
#[derive(Debug, Clone)]
pub struct NewCommunity {
    pub name: String,
    pub slug: String,
    pub owner_id: Uuid,
}

/// Community joined with its owner's display name.
#[derive(Debug, Clone, FromRow)]
pub struct CommunityWithOwner {
    #[sqlx(flatten)]
    pub community: Community,
    pub owner_name: String,
}

/// Member model: one (community, user, role) binding.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub community_id: Uuid,
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to insert a member.
#[derive(Debug, Clone, Copy)]
pub struct NewMember {
    pub community_id: Uuid,
    pub user_id: Uuid,
    pub role_id: Uuid,
}

/// Member joined with the user and role display names.
#[derive(Debug, Clone, FromRow)]
pub struct MemberDetail {
    #[sqlx(flatten)]
    pub member: Member,
    pub user_name: String,
    pub role_name: String,
}

/// Outcome of a guarded member deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRemoval {
    /// The member row was deleted.
    Removed,
    /// No member with that id exists (anymore).
    NotFound,
    /// The member holds the protected role and is the last one holding it.
    LastOfRole,
}
