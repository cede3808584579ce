//! Community authorization.
//!
//! Two built-in roles gate membership management:
//! - Community Admin: granted to the creator of a community
//! - Community Moderator: may add and remove members alongside admins

mod builtin;
mod resolver;

pub use builtin::{ensure_builtin_roles, BuiltinRole, BuiltinRoles};
pub use resolver::{
    has_role, require_admin, require_moderation, ModerationContext, PermissionError, Rank,
};
