//! Community HTTP Handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;
use validator::Validate;

use super::error::CommunityError;
use super::slug::slugify;
use super::types::{CommunityListing, CommunityResponse, CreateCommunityRequest, MemberListing};
use crate::api::response::{validation_errors, Ack, ApiResponse};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::db::{NewCommunity, StoreError};
use crate::pagination::{PageMeta, PageQuery, DEFAULT_PAGE_SIZE};
use crate::permissions::{require_admin, BuiltinRoles};

type Listing<T> = Result<ApiResponse<Vec<T>, PageMeta>, CommunityError>;

/// Create a community; the caller becomes its owner and first admin.
///
/// POST /v1/community
#[tracing::instrument(skip_all, fields(user_id = %auth.id))]
pub async fn create_community(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Json(body), _): WithRejection<Json<CreateCommunityRequest>, CommunityError>,
) -> Result<ApiResponse<CommunityResponse>, CommunityError> {
    body.validate()
        .map_err(|e| CommunityError::Validation(validation_errors(&e)))?;

    if state.store.community_name_exists(&body.name).await? {
        return Err(CommunityError::AlreadyExists);
    }

    let roles = BuiltinRoles::load(state.store.as_ref()).await?;
    let slug = slugify(&body.name);

    let (community, _owner) = state
        .store
        .create_community(
            NewCommunity {
                name: body.name,
                slug,
                owner_id: auth.id,
            },
            roles.admin.id,
        )
        .await
        .map_err(|e| match e {
            StoreError::UniqueViolation(_) => CommunityError::AlreadyExists,
            other => CommunityError::Store(other),
        })?;

    tracing::info!(community_id = %community.id, slug = %community.slug, "Community created");

    Ok(ApiResponse::created(community.into()))
}

/// List all communities, ten per page.
///
/// GET /v1/community?page=
#[tracing::instrument(skip_all)]
pub async fn list_communities(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Listing<CommunityListing> {
    let request = query.with_fixed_size(DEFAULT_PAGE_SIZE);
    let page = state.store.list_communities(request).await?;
    Ok(ApiResponse::page(page.map(Into::into), request))
}

/// List the members of a community, ten per page.
///
/// An unknown community yields an empty page.
///
/// GET /v1/community/{id}/members?page=
#[tracing::instrument(skip_all)]
pub async fn list_members(
    State(state): State<AppState>,
    WithRejection(Path(community_id), _): WithRejection<Path<Uuid>, CommunityError>,
    Query(query): Query<PageQuery>,
) -> Listing<MemberListing> {
    let request = query.with_fixed_size(DEFAULT_PAGE_SIZE);
    let page = state.store.list_members(community_id, request).await?;
    Ok(ApiResponse::page(page.map(Into::into), request))
}

/// Communities owned by the caller.
///
/// GET /v1/community/me/owner?page=&limit=
#[tracing::instrument(skip_all, fields(user_id = %auth.id))]
pub async fn list_owned(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> Listing<CommunityResponse> {
    let request = query.to_request();
    let page = state.store.list_owned_communities(auth.id, request).await?;
    Ok(ApiResponse::page(page.map(Into::into), request))
}

/// Communities the caller holds any membership in.
///
/// GET /v1/community/me/member?page=&limit=
#[tracing::instrument(skip_all, fields(user_id = %auth.id))]
pub async fn list_joined(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> Listing<CommunityListing> {
    let request = query.to_request();
    let page = state.store.list_joined_communities(auth.id, request).await?;
    Ok(ApiResponse::page(page.map(Into::into), request))
}

/// Delete a community and every membership in it. Admins only.
///
/// DELETE /v1/community/{id}
#[tracing::instrument(skip_all, fields(user_id = %auth.id))]
pub async fn delete_community(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Path(community_id), _): WithRejection<Path<Uuid>, CommunityError>,
) -> Result<Ack, CommunityError> {
    if state.store.find_community_by_id(community_id).await?.is_none() {
        return Err(CommunityError::NotFound);
    }

    require_admin(state.store.as_ref(), community_id, auth.id).await?;

    if !state.store.delete_community(community_id).await? {
        return Err(CommunityError::NotFound);
    }

    tracing::info!(%community_id, "Community deleted");

    Ok(Ack::new())
}
