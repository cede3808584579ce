//! Privileged roles recognized by the authorization checks.

use crate::db::{Role, Store, StoreError, StoreResult};

use super::resolver::PermissionError;

/// Roles with a fixed meaning, looked up by name in the role catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinRole {
    CommunityAdmin,
    CommunityModerator,
}

impl BuiltinRole {
    pub const ALL: [Self; 2] = [Self::CommunityAdmin, Self::CommunityModerator];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CommunityAdmin => "Community Admin",
            Self::CommunityModerator => "Community Moderator",
        }
    }
}

/// The resolved catalog entries for both built-in roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinRoles {
    pub admin: Role,
    pub moderator: Role,
}

impl BuiltinRoles {
    /// Look both roles up; a missing one is a deployment error.
    pub async fn load(store: &dyn Store) -> Result<Self, PermissionError> {
        let admin = find(store, BuiltinRole::CommunityAdmin).await?;
        let moderator = find(store, BuiltinRole::CommunityModerator).await?;
        Ok(Self { admin, moderator })
    }
}

async fn find(store: &dyn Store, role: BuiltinRole) -> Result<Role, PermissionError> {
    store
        .find_role_by_name(role.name())
        .await?
        .ok_or(PermissionError::MissingBuiltinRole(role.name()))
}

/// Create any missing built-in role. Safe to run concurrently and repeatedly.
pub async fn ensure_builtin_roles(store: &dyn Store) -> StoreResult<BuiltinRoles> {
    let mut resolved = Vec::with_capacity(BuiltinRole::ALL.len());

    for role in BuiltinRole::ALL {
        let existing = store.find_role_by_name(role.name()).await?;
        let row = match existing {
            Some(row) => row,
            None => match store.create_role(role.name()).await {
                Ok(row) => {
                    tracing::info!(role = role.name(), "Created built-in role");
                    row
                }
                // Another instance won the race.
                Err(StoreError::UniqueViolation(_)) => store
                    .find_role_by_name(role.name())
                    .await?
                    .ok_or_else(|| StoreError::MissingReference(role.name().to_string()))?,
                Err(e) => return Err(e),
            },
        };
        resolved.push(row);
    }

    let moderator = resolved.pop();
    let admin = resolved.pop();
    match (admin, moderator) {
        (Some(admin), Some(moderator)) => Ok(BuiltinRoles { admin, moderator }),
        _ => Err(StoreError::MissingReference("builtin roles".into())),
    }
}
