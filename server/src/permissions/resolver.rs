//! Permission resolution logic.
//!
//! Decides whether a user may manage the membership of a community, based on
//! the built-in role they hold there.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use uuid::Uuid;

use crate::api::response::{self, ErrorCode, FieldError};
use crate::config::GrantPolicy;
use crate::db::{Store, StoreError, StoreResult};

use super::builtin::BuiltinRoles;

/// Permission check errors.
#[derive(Debug, Error)]
pub enum PermissionError {
    /// Actor holds neither built-in role in the community.
    #[error("Not a moderator or admin of this community")]
    NotAllowed,

    /// A moderator tried to grant or remove the admin role.
    #[error("Cannot act on a role ranked above your own")]
    CannotEscalate,

    /// Built-in role absent from the catalog.
    #[error("Built-in role missing: {0}")]
    MissingBuiltinRole(&'static str),

    #[error("Store error")]
    Store(#[from] StoreError),
}

impl IntoResponse for PermissionError {
    fn into_response(self) -> Response {
        match self {
            Self::NotAllowed | Self::CannotEscalate => response::failure(
                StatusCode::FORBIDDEN,
                &[FieldError::new(
                    ErrorCode::NotAllowedAccess,
                    "You are not authorized to perform this action.",
                )],
            ),
            err @ (Self::MissingBuiltinRole(_) | Self::Store(_)) => {
                tracing::error!(error = ?err, "Permission check failed");
                response::server_error()
            }
        }
    }
}

/// Rank of a built-in role. Admin outranks moderator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rank {
    Moderator,
    Admin,
}

/// Whether `user_id` holds `role_id` in `community_id`.
pub async fn has_role(
    store: &dyn Store,
    community_id: Uuid,
    user_id: Uuid,
    role_id: Uuid,
) -> StoreResult<bool> {
    Ok(store
        .find_member(community_id, user_id)
        .await?
        .is_some_and(|m| m.role_id == role_id))
}

/// Authority an actor holds over one community's membership.
#[derive(Debug, Clone)]
pub struct ModerationContext {
    pub community_id: Uuid,
    pub rank: Rank,
    pub roles: BuiltinRoles,
}

impl ModerationContext {
    /// Check that the actor may hand out `role_id`.
    pub fn can_grant(&self, role_id: Uuid, policy: GrantPolicy) -> Result<(), PermissionError> {
        self.check_rank(role_id, policy)
    }

    /// Check that the actor may remove a member holding `target_role_id`.
    pub fn can_remove(
        &self,
        target_role_id: Uuid,
        policy: GrantPolicy,
    ) -> Result<(), PermissionError> {
        self.check_rank(target_role_id, policy)
    }

    fn check_rank(&self, role_id: Uuid, policy: GrantPolicy) -> Result<(), PermissionError> {
        match policy {
            GrantPolicy::Permissive => Ok(()),
            GrantPolicy::Hierarchical => {
                if role_id == self.roles.admin.id && self.rank < Rank::Admin {
                    return Err(PermissionError::CannotEscalate);
                }
                Ok(())
            }
        }
    }
}

/// Resolve the actor's rank in a community, failing with `NotAllowed` if
/// they hold neither built-in role.
pub async fn require_moderation(
    store: &dyn Store,
    community_id: Uuid,
    user_id: Uuid,
) -> Result<ModerationContext, PermissionError> {
    let roles = BuiltinRoles::load(store).await?;
    let rank = resolve_rank(store, community_id, user_id, &roles)
        .await?
        .ok_or(PermissionError::NotAllowed)?;

    Ok(ModerationContext {
        community_id,
        rank,
        roles,
    })
}

/// Resolve the actor's rank, failing unless they are an admin.
pub async fn require_admin(
    store: &dyn Store,
    community_id: Uuid,
    user_id: Uuid,
) -> Result<ModerationContext, PermissionError> {
    let ctx = require_moderation(store, community_id, user_id).await?;
    if ctx.rank < Rank::Admin {
        return Err(PermissionError::NotAllowed);
    }
    Ok(ctx)
}

async fn resolve_rank(
    store: &dyn Store,
    community_id: Uuid,
    user_id: Uuid,
    roles: &BuiltinRoles,
) -> StoreResult<Option<Rank>> {
    if has_role(store, community_id, user_id, roles.admin.id).await? {
        return Ok(Some(Rank::Admin));
    }
    if has_role(store, community_id, user_id, roles.moderator.id).await? {
        return Ok(Some(Rank::Moderator));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, NewCommunity, NewMember, NewUser};
    use crate::permissions::ensure_builtin_roles;

    async fn user(store: &MemoryStore, name: &str) -> Uuid {
        store
            .create_user(NewUser {
                name: name.into(),
                email: format!("{name}@example.com"),
                password_hash: "x".into(),
            })
            .await
            .unwrap()
            .id
    }

    struct Fixture {
        store: MemoryStore,
        roles: BuiltinRoles,
        community_id: Uuid,
        owner: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let roles = ensure_builtin_roles(&store).await.unwrap();
        let owner = user(&store, "owner").await;
        let (community, _) = store
            .create_community(
                NewCommunity {
                    name: "Test Co".into(),
                    slug: "test-co".into(),
                    owner_id: owner,
                },
                roles.admin.id,
            )
            .await
            .unwrap();
        Fixture {
            store,
            roles,
            community_id: community.id,
            owner,
        }
    }

    #[tokio::test]
    async fn test_owner_is_admin() {
        let f = fixture().await;
        let ctx = require_moderation(&f.store, f.community_id, f.owner)
            .await
            .unwrap();
        assert_eq!(ctx.rank, Rank::Admin);
        assert!(require_admin(&f.store, f.community_id, f.owner).await.is_ok());
    }

    #[tokio::test]
    async fn test_moderator_rank() {
        let f = fixture().await;
        let moderator = user(&f.store, "mod").await;
        f.store
            .create_member(NewMember {
                community_id: f.community_id,
                user_id: moderator,
                role_id: f.roles.moderator.id,
            })
            .await
            .unwrap();

        let ctx = require_moderation(&f.store, f.community_id, moderator)
            .await
            .unwrap();
        assert_eq!(ctx.rank, Rank::Moderator);
        assert!(matches!(
            require_admin(&f.store, f.community_id, moderator).await,
            Err(PermissionError::NotAllowed)
        ));
    }

    #[tokio::test]
    async fn test_plain_member_and_stranger_are_rejected() {
        let f = fixture().await;
        let plain = f.store.create_role("Community Member").await.unwrap();
        let member = user(&f.store, "member").await;
        let stranger = user(&f.store, "stranger").await;
        f.store
            .create_member(NewMember {
                community_id: f.community_id,
                user_id: member,
                role_id: plain.id,
            })
            .await
            .unwrap();

        for actor in [member, stranger] {
            assert!(matches!(
                require_moderation(&f.store, f.community_id, actor).await,
                Err(PermissionError::NotAllowed)
            ));
        }
    }

    #[tokio::test]
    async fn test_has_role() {
        let f = fixture().await;
        let moderator = user(&f.store, "mod").await;
        let stranger = user(&f.store, "stranger").await;
        f.store
            .create_member(NewMember {
                community_id: f.community_id,
                user_id: moderator,
                role_id: f.roles.moderator.id,
            })
            .await
            .unwrap();

        let held = |user_id, role_id| has_role(&f.store, f.community_id, user_id, role_id);
        assert!(!held(stranger, f.roles.moderator.id).await.unwrap());
        assert!(!held(moderator, f.roles.admin.id).await.unwrap());
        assert!(held(moderator, f.roles.moderator.id).await.unwrap());
        assert!(held(f.owner, f.roles.admin.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_grant_policy() {
        let f = fixture().await;
        let ctx = ModerationContext {
            community_id: f.community_id,
            rank: Rank::Moderator,
            roles: f.roles.clone(),
        };

        assert!(ctx.can_grant(f.roles.admin.id, GrantPolicy::Permissive).is_ok());
        assert!(matches!(
            ctx.can_grant(f.roles.admin.id, GrantPolicy::Hierarchical),
            Err(PermissionError::CannotEscalate)
        ));
        assert!(ctx
            .can_grant(f.roles.moderator.id, GrantPolicy::Hierarchical)
            .is_ok());
        assert!(matches!(
            ctx.can_remove(f.roles.admin.id, GrantPolicy::Hierarchical),
            Err(PermissionError::CannotEscalate)
        ));

        let admin = ModerationContext {
            rank: Rank::Admin,
            ..ctx
        };
        assert!(admin.can_grant(f.roles.admin.id, GrantPolicy::Hierarchical).is_ok());
        assert!(admin.can_remove(f.roles.admin.id, GrantPolicy::Hierarchical).is_ok());
    }

    #[test]
    fn test_rank_order() {
        assert!(Rank::Admin > Rank::Moderator);
    }
}
