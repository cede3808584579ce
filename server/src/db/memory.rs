//! In-process implementation of [`Store`].
//!
//! Rows live in insertion-ordered vectors behind one `RwLock`; every
//! mutation takes the write lock, so constraint checks and writes are atomic
//! with respect to each other, just like the unique indexes in Postgres.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{
    Community, CommunityWithOwner, Member, MemberDetail, MemberRemoval, NewCommunity, NewMember,
    NewUser, Role, User,
};
use super::{Store, StoreError, StoreResult};
use crate::pagination::{Page, PageRequest};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    roles: Vec<Role>,
    communities: Vec<Community>,
    members: Vec<Member>,
}

impl Tables {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn with_owner(&self, community: &Community) -> CommunityWithOwner {
        CommunityWithOwner {
            community: community.clone(),
            owner_name: self
                .user(community.owner_id)
                .map(|u| u.name.clone())
                .unwrap_or_default(),
        }
    }

    fn check_member_refs(&self, member: &NewMember) -> StoreResult<()> {
        if !self.communities.iter().any(|c| c.id == member.community_id) {
            return Err(StoreError::MissingReference("members_community_id_fkey".into()));
        }
        if self.user(member.user_id).is_none() {
            return Err(StoreError::MissingReference("members_user_id_fkey".into()));
        }
        if !self.roles.iter().any(|r| r.id == member.role_id) {
            return Err(StoreError::MissingReference("members_role_id_fkey".into()));
        }
        if self
            .members
            .iter()
            .any(|m| m.community_id == member.community_id && m.user_id == member.user_id)
        {
            return Err(StoreError::UniqueViolation("members_community_user_key".into()));
        }
        Ok(())
    }

    fn insert_member(&mut self, member: NewMember) -> Member {
        let row = Member {
            id: Uuid::now_v7(),
            community_id: member.community_id,
            user_id: member.user_id,
            role_id: member.role_id,
            created_at: Utc::now(),
        };
        self.members.push(row.clone());
        row
    }
}

/// Store that keeps all rows in memory. Data is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation("users_email_key".into()));
        }

        let row = User {
            id: Uuid::now_v7(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        tables.users.push(row.clone());
        Ok(row)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.user(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_role(&self, name: &str) -> StoreResult<Role> {
        let mut tables = self.tables.write().await;
        if tables.roles.iter().any(|r| r.name == name) {
            return Err(StoreError::UniqueViolation("roles_name_key".into()));
        }

        let now = Utc::now();
        let row = Role {
            id: Uuid::now_v7(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.roles.push(row.clone());
        Ok(row)
    }

    async fn find_role_by_id(&self, id: Uuid) -> StoreResult<Option<Role>> {
        let tables = self.tables.read().await;
        Ok(tables.roles.iter().find(|r| r.id == id).cloned())
    }

    async fn find_role_by_name(&self, name: &str) -> StoreResult<Option<Role>> {
        let tables = self.tables.read().await;
        Ok(tables.roles.iter().find(|r| r.name == name).cloned())
    }

    async fn list_roles(&self, page: PageRequest) -> StoreResult<Page<Role>> {
        let tables = self.tables.read().await;
        Ok(Page::from_ordered(tables.roles.clone(), page))
    }

    async fn create_community(
        &self,
        community: NewCommunity,
        owner_role_id: Uuid,
    ) -> StoreResult<(Community, Member)> {
        let mut tables = self.tables.write().await;
        if tables.communities.iter().any(|c| c.name == community.name) {
            return Err(StoreError::UniqueViolation("communities_name_key".into()));
        }
        if tables.user(community.owner_id).is_none() {
            return Err(StoreError::MissingReference("communities_owner_id_fkey".into()));
        }
        if !tables.roles.iter().any(|r| r.id == owner_role_id) {
            return Err(StoreError::MissingReference("members_role_id_fkey".into()));
        }

        let now = Utc::now();
        let row = Community {
            id: Uuid::now_v7(),
            name: community.name,
            slug: community.slug,
            owner_id: community.owner_id,
            created_at: now,
            updated_at: now,
        };
        tables.communities.push(row.clone());

        // Both rows are pushed under the same write guard, so no reader can
        // observe the community without its owner membership.
        let owner = tables.insert_member(NewMember {
            community_id: row.id,
            user_id: row.owner_id,
            role_id: owner_role_id,
        });

        Ok((row, owner))
    }

    async fn find_community_by_id(&self, id: Uuid) -> StoreResult<Option<Community>> {
        let tables = self.tables.read().await;
        Ok(tables.communities.iter().find(|c| c.id == id).cloned())
    }

    async fn community_name_exists(&self, name: &str) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.communities.iter().any(|c| c.name == name))
    }

    async fn delete_community(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.communities.len();
        tables.communities.retain(|c| c.id != id);
        if tables.communities.len() == before {
            return Ok(false);
        }
        tables.members.retain(|m| m.community_id != id);
        Ok(true)
    }

    async fn list_communities(&self, page: PageRequest) -> StoreResult<Page<CommunityWithOwner>> {
        let tables = self.tables.read().await;
        let all = tables
            .communities
            .iter()
            .map(|c| tables.with_owner(c))
            .collect();
        Ok(Page::from_ordered(all, page))
    }

    async fn list_owned_communities(
        &self,
        owner_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<Community>> {
        let tables = self.tables.read().await;
        let owned = tables
            .communities
            .iter()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect();
        Ok(Page::from_ordered(owned, page))
    }

    async fn list_joined_communities(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<CommunityWithOwner>> {
        let tables = self.tables.read().await;
        let joined = tables
            .members
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| tables.communities.iter().find(|c| c.id == m.community_id))
            .map(|c| tables.with_owner(c))
            .collect();
        Ok(Page::from_ordered(joined, page))
    }

    async fn create_member(&self, member: NewMember) -> StoreResult<Member> {
        let mut tables = self.tables.write().await;
        tables.check_member_refs(&member)?;
        Ok(tables.insert_member(member))
    }

    async fn find_member_by_id(&self, id: Uuid) -> StoreResult<Option<Member>> {
        let tables = self.tables.read().await;
        Ok(tables.members.iter().find(|m| m.id == id).cloned())
    }

    async fn find_member(
        &self,
        community_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Member>> {
        let tables = self.tables.read().await;
        Ok(tables
            .members
            .iter()
            .find(|m| m.community_id == community_id && m.user_id == user_id)
            .cloned())
    }

    async fn remove_member(
        &self,
        id: Uuid,
        protected_role_id: Option<Uuid>,
    ) -> StoreResult<MemberRemoval> {
        let mut tables = self.tables.write().await;
        let Some(position) = tables.members.iter().position(|m| m.id == id) else {
            return Ok(MemberRemoval::NotFound);
        };

        let target = &tables.members[position];
        if let Some(role_id) = protected_role_id.filter(|r| *r == target.role_id) {
            let holders = tables
                .members
                .iter()
                .filter(|m| m.community_id == target.community_id && m.role_id == role_id)
                .count();
            if holders <= 1 {
                return Ok(MemberRemoval::LastOfRole);
            }
        }

        tables.members.remove(position);
        Ok(MemberRemoval::Removed)
    }

    async fn list_members(
        &self,
        community_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<MemberDetail>> {
        let tables = self.tables.read().await;
        let all = tables
            .members
            .iter()
            .filter(|m| m.community_id == community_id)
            .map(|m| MemberDetail {
                member: m.clone(),
                user_name: tables.user(m.user_id).map(|u| u.name.clone()).unwrap_or_default(),
                role_name: tables
                    .roles
                    .iter()
                    .find(|r| r.id == m.role_id)
                    .map(|r| r.name.clone())
                    .unwrap_or_default(),
            })
            .collect();
        Ok(Page::from_ordered(all, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_user(store: &MemoryStore, email: &str) -> User {
        store
            .create_user(NewUser {
                name: "Someone".into(),
                email: email.into(),
                password_hash: "$argon2id$dummy".into(),
            })
            .await
            .unwrap()
    }

    async fn seed_community(store: &MemoryStore, name: &str, owner: &User, role: &Role) -> Community {
        store
            .create_community(
                NewCommunity {
                    name: name.into(),
                    slug: name.to_lowercase(),
                    owner_id: owner.id,
                },
                role.id,
            )
            .await
            .unwrap()
            .0
    }

    #[tokio::test]
    async fn test_email_is_unique() {
        let store = MemoryStore::new();
        seed_user(&store, "a@x.com").await;

        let err = store
            .create_user(NewUser {
                name: "Other".into(),
                email: "a@x.com".into(),
                password_hash: "h".into(),
            })
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_role_name_is_unique() {
        let store = MemoryStore::new();
        store.create_role("Community Admin").await.unwrap();
        let err = store.create_role("Community Admin").await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_create_community_adds_owner_membership() {
        let store = MemoryStore::new();
        let admin = store.create_role("Community Admin").await.unwrap();
        let owner = seed_user(&store, "a@x.com").await;

        let (community, member) = store
            .create_community(
                NewCommunity {
                    name: "Test Co".into(),
                    slug: "test-co".into(),
                    owner_id: owner.id,
                },
                admin.id,
            )
            .await
            .unwrap();

        assert_eq!(member.community_id, community.id);
        assert_eq!(member.user_id, owner.id);
        assert_eq!(member.role_id, admin.id);
        assert_eq!(
            store.find_member(community.id, owner.id).await.unwrap(),
            Some(member)
        );
    }

    #[tokio::test]
    async fn test_create_community_with_unknown_role_writes_nothing() {
        let store = MemoryStore::new();
        let owner = seed_user(&store, "a@x.com").await;

        let err = store
            .create_community(
                NewCommunity {
                    name: "Orphan".into(),
                    slug: "orphan".into(),
                    owner_id: owner.id,
                },
                Uuid::now_v7(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::MissingReference(_)));
        assert!(!store.community_name_exists("Orphan").await.unwrap());
    }

    #[tokio::test]
    async fn test_member_pair_is_unique() {
        let store = MemoryStore::new();
        let admin = store.create_role("Community Admin").await.unwrap();
        let other = store.create_role("Member").await.unwrap();
        let owner = seed_user(&store, "a@x.com").await;
        let guest = seed_user(&store, "b@x.com").await;
        let community = seed_community(&store, "Test Co", &owner, &admin).await;

        let new_member = NewMember {
            community_id: community.id,
            user_id: guest.id,
            role_id: other.id,
        };
        store.create_member(new_member).await.unwrap();

        let err = store
            .create_member(NewMember {
                role_id: admin.id,
                ..new_member
            })
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_remove_member_guards_last_of_role() {
        let store = MemoryStore::new();
        let admin = store.create_role("Community Admin").await.unwrap();
        let owner = seed_user(&store, "a@x.com").await;
        let second = seed_user(&store, "b@x.com").await;
        let community = seed_community(&store, "Test Co", &owner, &admin).await;
        let owner_member = store.find_member(community.id, owner.id).await.unwrap().unwrap();

        assert_eq!(
            store.remove_member(owner_member.id, Some(admin.id)).await.unwrap(),
            MemberRemoval::LastOfRole
        );

        let second_member = store
            .create_member(NewMember {
                community_id: community.id,
                user_id: second.id,
                role_id: admin.id,
            })
            .await
            .unwrap();

        assert_eq!(
            store.remove_member(owner_member.id, Some(admin.id)).await.unwrap(),
            MemberRemoval::Removed
        );
        assert_eq!(
            store.remove_member(second_member.id, Some(admin.id)).await.unwrap(),
            MemberRemoval::LastOfRole
        );
        assert_eq!(
            store.remove_member(owner_member.id, Some(admin.id)).await.unwrap(),
            MemberRemoval::NotFound
        );
    }

    #[tokio::test]
    async fn test_delete_community_cascades_members() {
        let store = MemoryStore::new();
        let admin = store.create_role("Community Admin").await.unwrap();
        let owner = seed_user(&store, "a@x.com").await;
        let community = seed_community(&store, "Test Co", &owner, &admin).await;

        assert!(store.delete_community(community.id).await.unwrap());
        assert!(!store.delete_community(community.id).await.unwrap());
        assert!(store.find_member(community.id, owner.id).await.unwrap().is_none());

        let joined = store
            .list_joined_communities(owner.id, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(joined.total, 0);
    }

    #[tokio::test]
    async fn test_listings_keep_insertion_order() {
        let store = MemoryStore::new();
        let admin = store.create_role("Community Admin").await.unwrap();
        let owner = seed_user(&store, "a@x.com").await;
        for i in 0..12 {
            seed_community(&store, &format!("Community {i:02}"), &owner, &admin).await;
        }

        let second = store
            .list_communities(PageRequest::new(2, 10))
            .await
            .unwrap();
        assert_eq!(second.total, 12);
        let names: Vec<_> = second.items.iter().map(|c| c.community.name.as_str()).collect();
        assert_eq!(names, vec!["Community 10", "Community 11"]);
        assert_eq!(second.items[0].owner_name, "Someone");

        let owned = store
            .list_owned_communities(owner.id, PageRequest::new(1, 5))
            .await
            .unwrap();
        assert_eq!(owned.total, 12);
        assert_eq!(owned.items.len(), 5);
    }
}
