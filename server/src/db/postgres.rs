//! `PostgreSQL` implementation of [`Store`].

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{
    Community, CommunityWithOwner, Member, MemberDetail, MemberRemoval, NewCommunity, NewMember,
    NewUser, Role, User,
};
use super::{Store, StoreResult};
use crate::pagination::{Page, PageRequest};

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at";
const ROLE_COLUMNS: &str = "id, name, created_at, updated_at";
const COMMUNITY_COLUMNS: &str = "id, name, slug, owner_id, created_at, updated_at";
const MEMBER_COLUMNS: &str = "id, community_id, user_id, role_id, created_at";

/// Store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    // ========================================================================
    // Users
    // ========================================================================

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let created = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, name, email, password_hash)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::now_v7())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    // ========================================================================
    // Roles
    // ========================================================================

    async fn create_role(&self, name: &str) -> StoreResult<Role> {
        let role = sqlx::query_as::<_, Role>(&format!(
            "INSERT INTO roles (id, name) VALUES ($1, $2) RETURNING {ROLE_COLUMNS}"
        ))
        .bind(Uuid::now_v7())
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(role)
    }

    async fn find_role_by_id(&self, id: Uuid) -> StoreResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }

    async fn find_role_by_name(&self, name: &str) -> StoreResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }

    async fn list_roles(&self, page: PageRequest) -> StoreResult<Page<Role>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles")
            .fetch_one(&self.pool)
            .await?;

        let items = sqlx::query_as::<_, Role>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles
             ORDER BY created_at, id
             LIMIT $1 OFFSET $2"
        ))
        .bind(i64::from(page.limit))
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page { items, total })
    }

    // ========================================================================
    // Communities
    // ========================================================================

    async fn create_community(
        &self,
        community: NewCommunity,
        owner_role_id: Uuid,
    ) -> StoreResult<(Community, Member)> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Community>(&format!(
            "INSERT INTO communities (id, name, slug, owner_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {COMMUNITY_COLUMNS}"
        ))
        .bind(Uuid::now_v7())
        .bind(&community.name)
        .bind(&community.slug)
        .bind(community.owner_id)
        .fetch_one(&mut *tx)
        .await?;

        let owner = sqlx::query_as::<_, Member>(&format!(
            "INSERT INTO members (id, community_id, user_id, role_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(Uuid::now_v7())
        .bind(created.id)
        .bind(created.owner_id)
        .bind(owner_role_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((created, owner))
    }

    async fn find_community_by_id(&self, id: Uuid) -> StoreResult<Option<Community>> {
        let community = sqlx::query_as::<_, Community>(&format!(
            "SELECT {COMMUNITY_COLUMNS} FROM communities WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(community)
    }

    async fn community_name_exists(&self, name: &str) -> StoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM communities WHERE name = $1)")
                .bind(name)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn delete_community(&self, id: Uuid) -> StoreResult<bool> {
        // members rows go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM communities WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_communities(&self, page: PageRequest) -> StoreResult<Page<CommunityWithOwner>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM communities")
            .fetch_one(&self.pool)
            .await?;

        let items = sqlx::query_as::<_, CommunityWithOwner>(
            r"
            SELECT c.id, c.name, c.slug, c.owner_id, c.created_at, c.updated_at,
                   u.name AS owner_name
            FROM communities c
            INNER JOIN users u ON u.id = c.owner_id
            ORDER BY c.created_at, c.id
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(i64::from(page.limit))
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page { items, total })
    }

    async fn list_owned_communities(
        &self,
        owner_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<Community>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM communities WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;

        let items = sqlx::query_as::<_, Community>(&format!(
            "SELECT {COMMUNITY_COLUMNS} FROM communities
             WHERE owner_id = $1
             ORDER BY created_at, id
             LIMIT $2 OFFSET $3"
        ))
        .bind(owner_id)
        .bind(i64::from(page.limit))
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page { items, total })
    }

    async fn list_joined_communities(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<CommunityWithOwner>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        let items = sqlx::query_as::<_, CommunityWithOwner>(
            r"
            SELECT c.id, c.name, c.slug, c.owner_id, c.created_at, c.updated_at,
                   u.name AS owner_name
            FROM members m
            INNER JOIN communities c ON c.id = m.community_id
            INNER JOIN users u ON u.id = c.owner_id
            WHERE m.user_id = $1
            ORDER BY m.created_at, m.id
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(user_id)
        .bind(i64::from(page.limit))
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page { items, total })
    }

    // ========================================================================
    // Members
    // ========================================================================

    async fn create_member(&self, member: NewMember) -> StoreResult<Member> {
        let created = sqlx::query_as::<_, Member>(&format!(
            "INSERT INTO members (id, community_id, user_id, role_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(Uuid::now_v7())
        .bind(member.community_id)
        .bind(member.user_id)
        .bind(member.role_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_member_by_id(&self, id: Uuid) -> StoreResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    async fn find_member(
        &self,
        community_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE community_id = $1 AND user_id = $2"
        ))
        .bind(community_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    async fn remove_member(
        &self,
        id: Uuid,
        protected_role_id: Option<Uuid>,
    ) -> StoreResult<MemberRemoval> {
        let mut tx = self.pool.begin().await?;

        let community_id: Option<Uuid> =
            sqlx::query_scalar("SELECT community_id FROM members WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(community_id) = community_id else {
            return Ok(MemberRemoval::NotFound);
        };

        // Serialize removals within one community so two concurrent requests
        // cannot each remove "one of two" admins.
        sqlx::query("SELECT id FROM communities WHERE id = $1 FOR UPDATE")
            .bind(community_id)
            .execute(&mut *tx)
            .await?;

        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(member) = member else {
            return Ok(MemberRemoval::NotFound);
        };

        if let Some(role_id) = protected_role_id.filter(|r| *r == member.role_id) {
            let holders: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM members WHERE community_id = $1 AND role_id = $2",
            )
            .bind(community_id)
            .bind(role_id)
            .fetch_one(&mut *tx)
            .await?;

            if holders <= 1 {
                return Ok(MemberRemoval::LastOfRole);
            }
        }

        sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(MemberRemoval::Removed)
    }

    async fn list_members(
        &self,
        community_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<MemberDetail>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM members WHERE community_id = $1")
                .bind(community_id)
                .fetch_one(&self.pool)
                .await?;

        let items = sqlx::query_as::<_, MemberDetail>(
            r"
            SELECT m.id, m.community_id, m.user_id, m.role_id, m.created_at,
                   u.name AS user_name, r.name AS role_name
            FROM members m
            INNER JOIN users u ON u.id = m.user_id
            INNER JOIN roles r ON r.id = m.role_id
            WHERE m.community_id = $1
            ORDER BY m.created_at, m.id
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(community_id)
        .bind(i64::from(page.limit))
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page { items, total })
    }
}
