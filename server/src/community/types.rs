//! Community Type Definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::db::{Community, CommunityWithOwner, MemberDetail};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommunityRequest {
    #[serde(default)]
    #[validate(length(min = 2, message = "Name should be at least 2 characters."))]
    pub name: String,
}

// ============================================================================
// Response Types
// ============================================================================

/// `{id, name}` reference to a related record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamedRef {
    pub id: Uuid,
    pub name: String,
}

/// Community with the owner as a bare id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub owner: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Community> for CommunityResponse {
    fn from(c: Community) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
            owner: c.owner_id,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Community with the owner expanded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityListing {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub owner: NamedRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CommunityWithOwner> for CommunityListing {
    fn from(row: CommunityWithOwner) -> Self {
        let c = row.community;
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
            owner: NamedRef {
                id: c.owner_id,
                name: row.owner_name,
            },
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Member row of a community listing, user and role expanded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberListing {
    pub id: Uuid,
    pub community: Uuid,
    pub user: NamedRef,
    pub role: NamedRef,
    pub created_at: DateTime<Utc>,
}

impl From<MemberDetail> for MemberListing {
    fn from(row: MemberDetail) -> Self {
        let m = row.member;
        Self {
            id: m.id,
            community: m.community_id,
            user: NamedRef {
                id: m.user_id,
                name: row.user_name,
            },
            role: NamedRef {
                id: m.role_id,
                name: row.role_name,
            },
            created_at: m.created_at,
        }
    }
}
