//! Member HTTP Handlers

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::MemberError;
use crate::api::response::{Ack, ApiResponse};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::db::{Member, MemberRemoval, NewMember, StoreError};
use crate::permissions::require_moderation;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub community: Uuid,
    pub user: Uuid,
    pub role: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberResponse {
    pub id: Uuid,
    pub community: Uuid,
    pub user: Uuid,
    pub role: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<Member> for MemberResponse {
    fn from(m: Member) -> Self {
        Self {
            id: m.id,
            community: m.community_id,
            user: m.user_id,
            role: m.role_id,
            created_at: m.created_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Add a user to a community under a role.
///
/// The caller must be an admin or moderator of the community.
///
/// POST /v1/member
#[tracing::instrument(skip_all, fields(user_id = %auth.id))]
pub async fn add_member(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Json(body), _): WithRejection<Json<AddMemberRequest>, MemberError>,
) -> Result<ApiResponse<MemberResponse>, MemberError> {
    let store = state.store.as_ref();

    if store.find_community_by_id(body.community).await?.is_none() {
        return Err(MemberError::CommunityNotFound);
    }
    if store.find_role_by_id(body.role).await?.is_none() {
        return Err(MemberError::RoleNotFound);
    }

    let ctx = require_moderation(store, body.community, auth.id).await?;
    ctx.can_grant(body.role, state.config.grant_policy)?;

    if store.find_user_by_id(body.user).await?.is_none() {
        return Err(MemberError::UserNotFound);
    }

    // Fast path; the (community, user) unique constraint settles races.
    if store.find_member(body.community, body.user).await?.is_some() {
        return Err(MemberError::AlreadyMember);
    }

    let member = store
        .create_member(NewMember {
            community_id: body.community,
            user_id: body.user,
            role_id: body.role,
        })
        .await
        .map_err(|e| match e {
            StoreError::UniqueViolation(_) => MemberError::AlreadyMember,
            other => MemberError::Store(other),
        })?;

    tracing::info!(
        member_id = %member.id,
        community_id = %member.community_id,
        role_id = %member.role_id,
        "Member added"
    );

    Ok(ApiResponse::created(member.into()))
}

/// Remove a member from its community.
///
/// The caller must be an admin or moderator of that community. The last
/// admin of a community cannot be removed.
///
/// DELETE /v1/member/{id}
#[tracing::instrument(skip_all, fields(user_id = %auth.id))]
pub async fn remove_member(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Path(member_id), _): WithRejection<Path<Uuid>, MemberError>,
) -> Result<Ack, MemberError> {
    let store = state.store.as_ref();

    let member = store
        .find_member_by_id(member_id)
        .await?
        .ok_or(MemberError::NotFound)?;

    let ctx = require_moderation(store, member.community_id, auth.id).await?;
    ctx.can_remove(member.role_id, state.config.grant_policy)?;

    match store
        .remove_member(member_id, Some(ctx.roles.admin.id))
        .await?
    {
        MemberRemoval::Removed => {
            tracing::info!(%member_id, community_id = %member.community_id, "Member removed");
            Ok(Ack::new())
        }
        MemberRemoval::NotFound => Err(MemberError::NotFound),
        MemberRemoval::LastOfRole => Err(MemberError::LastAdmin),
    }
}
