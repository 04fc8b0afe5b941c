/// Bounded manager-hierarchy traversal
///
/// Walks the reports-to chain upward from a user, one lookup per hop. The
/// walk is capped at [`MAX_HIERARCHY_HOPS`] and keeps a visited set, so a
/// cyclic or corrupt chain terminates instead of looping.
///
/// The chain source is abstracted behind [`ManagerDirectory`] so the walk
/// can be exercised against an in-memory map in tests.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Upper bound on reports-to hops followed from any starting user
pub const MAX_HIERARCHY_HOPS: usize = 5;

/// Source of reports-to edges
#[async_trait]
pub trait ManagerDirectory {
    /// Returns the manager a user reports to, or None at the top of the
    /// chain (or if the user does not exist)
    async fn manager_of(&self, user_id: Uuid) -> Result<Option<Uuid>, sqlx::Error>;
}

#[async_trait]
impl ManagerDirectory for PgPool {
    async fn manager_of(&self, user_id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
        let manager_id: Option<Option<Uuid>> =
            sqlx::query_scalar("SELECT manager_id FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(self)
                .await?;

        Ok(manager_id.flatten())
    }
}

/// Walks the manager chain upward from `user_id`
///
/// Returns the managers above the user, nearest first, excluding the user
/// themselves. The walk stops at the top of the chain, at
/// [`MAX_HIERARCHY_HOPS`] entries, or on the first repeated id.
pub async fn walk_hierarchy<D: ManagerDirectory + Sync>(
    directory: &D,
    user_id: Uuid,
) -> Result<Vec<Uuid>, sqlx::Error> {
    let mut chain = Vec::new();
    let mut current = user_id;

    while chain.len() < MAX_HIERARCHY_HOPS {
        match directory.manager_of(current).await? {
            Some(manager_id) => {
                if manager_id == user_id || chain.contains(&manager_id) {
                    break;
                }
                chain.push(manager_id);
                current = manager_id;
            }
            None => break,
        }
    }

    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapDirectory(HashMap<Uuid, Uuid>);

    #[async_trait]
    impl ManagerDirectory for MapDirectory {
        async fn manager_of(&self, user_id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
            Ok(self.0.get(&user_id).copied())
        }
    }

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[tokio::test]
    async fn test_walk_stops_at_top_of_chain() {
        let people = ids(3);
        let mut edges = HashMap::new();
        edges.insert(people[0], people[1]);
        edges.insert(people[1], people[2]);
        let directory = MapDirectory(edges);

        let chain = walk_hierarchy(&directory, people[0]).await.unwrap();
        assert_eq!(chain, vec![people[1], people[2]]);
    }

    #[tokio::test]
    async fn test_walk_empty_for_top_level_user() {
        let directory = MapDirectory(HashMap::new());
        let chain = walk_hierarchy(&directory, Uuid::new_v4()).await.unwrap();
        assert!(chain.is_empty());
    }

    #[tokio::test]
    async fn test_walk_caps_hop_count() {
        let people = ids(MAX_HIERARCHY_HOPS + 3);
        let mut edges = HashMap::new();
        for pair in people.windows(2) {
            edges.insert(pair[0], pair[1]);
        }
        let directory = MapDirectory(edges);

        let chain = walk_hierarchy(&directory, people[0]).await.unwrap();
        assert_eq!(chain.len(), MAX_HIERARCHY_HOPS);
    }

    #[tokio::test]
    async fn test_walk_terminates_on_cycle() {
        let people = ids(3);
        let mut edges = HashMap::new();
        edges.insert(people[0], people[1]);
        edges.insert(people[1], people[2]);
        edges.insert(people[2], people[0]);
        let directory = MapDirectory(edges);

        let chain = walk_hierarchy(&directory, people[0]).await.unwrap();
        assert_eq!(chain, vec![people[1], people[2]]);
    }

    #[tokio::test]
    async fn test_walk_terminates_on_self_reference() {
        let me = Uuid::new_v4();
        let mut edges = HashMap::new();
        edges.insert(me, me);
        let directory = MapDirectory(edges);

        let chain = walk_hierarchy(&directory, me).await.unwrap();
        assert!(chain.is_empty());
    }
}
