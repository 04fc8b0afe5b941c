/// User model and database operations
///
/// Users form a shallow hierarchy: team leads and members report to a
/// manager (`manager_id`), managers own one department, and admins sit
/// outside the team structure.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email CITEXT NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     title VARCHAR(255) NOT NULL DEFAULT '',
///     role user_role NOT NULL DEFAULT 'team_member',
///     team team,
///     manager_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     is_admin BOOLEAN NOT NULL DEFAULT FALSE,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Note there is no stored `is_manager` column: the capability is derived
/// from `role` (see [`User::is_manager`]), so it can never drift.
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::models::user::{CreateUser, User};
/// use taskdeck_shared::org::{Role, Team};
///
/// # async fn example(pool: sqlx::PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     name: "Alice".to_string(),
///     email: "alice@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     title: "Sales Manager".to_string(),
///     role: Role::Manager,
///     team: Some(Team::Sales),
///     manager_id: None,
///     is_admin: false,
/// }).await?;
/// println!("Created user {}", user.id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::org::{Role, Team};
use crate::policy::evaluator::UserScope;

/// User account record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address (case-insensitive via CITEXT, unique)
    pub email: String,

    /// Argon2id password hash; never serialized into responses
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Job title (free text)
    pub title: String,

    /// Role in the organization
    pub role: Role,

    /// Department; required for every role except sub_admin
    pub team: Option<Team>,

    /// Manager this user reports to; required for team_lead/team_member
    pub manager_id: Option<Uuid>,

    /// Administrative capability, checked independently of role
    pub is_admin: bool,

    /// Soft-disable flag; inactive users cannot log in
    pub is_active: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Derived capability: true iff `role` is manager
    pub fn is_manager(&self) -> bool {
        self.role.is_manager()
    }
}

/// Input for creating a new user
///
/// Field-level role rules (team required unless sub_admin, manager_id
/// required for team_lead/team_member) are enforced by the registration
/// handler before this reaches the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub title: String,
    pub role: Role,
    pub team: Option<Team>,
    pub manager_id: Option<Uuid>,
    pub is_admin: bool,
}

/// Input for updating a user's profile
///
/// Only non-None fields are updated. `manager_id` uses a nested Option so
/// callers can distinguish "leave unchanged" from "clear the manager".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub title: Option<String>,
    pub role: Option<Role>,
    pub team: Option<Team>,
    pub manager_id: Option<Option<Uuid>>,
}

/// A directory listing row: user plus their manager's display name
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DirectoryUser {
    pub id: Uuid,
    pub name: String,
    pub title: String,
    pub role: Role,
    pub email: String,
    pub team: Option<Team>,
    pub is_active: bool,
    pub manager_id: Option<Uuid>,
    /// Display name of the manager, if one is assigned
    pub manager_name: Option<String>,
}

/// A slim user row offered as an assignment/selection candidate
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserPick {
    pub id: Uuid,
    pub name: String,
    pub title: String,
    pub role: Role,
    pub team: Option<Team>,
}

const USER_COLUMNS: &str = "id, name, email, password_hash, title, role, team, manager_id, \
                            is_admin, is_active, created_at, updated_at";

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists (unique constraint) or
    /// the database is unreachable.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, title, role, team, manager_id, is_admin)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.title)
        .bind(data.role)
        .bind(data.team)
        .bind(data.manager_id)
        .bind(data.is_admin)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email address (case-insensitive via CITEXT)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Checks whether an email address is already registered
    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(pool)
            .await
    }

    /// Updates profile fields; only non-None fields are touched
    ///
    /// Returns the updated user, or None if the id does not exist.
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build the update dynamically based on which fields are present.
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.role.is_some() {
            bind_count += 1;
            query.push_str(&format!(", role = ${}", bind_count));
        }
        if data.team.is_some() {
            bind_count += 1;
            query.push_str(&format!(", team = ${}", bind_count));
        }
        if data.manager_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", manager_id = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {USER_COLUMNS}"));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(role) = data.role {
            q = q.bind(role);
        }
        if let Some(team) = data.team {
            q = q.bind(team);
        }
        if let Some(manager_id) = data.manager_id {
            q = q.bind(manager_id);
        }

        q.fetch_optional(pool).await
    }

    /// Replaces the stored password hash
    pub async fn set_password(pool: &PgPool, id: Uuid, password_hash: &str) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Activates or deactivates an account (soft-disable)
    pub async fn set_active(pool: &PgPool, id: Uuid, is_active: bool) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(is_active)
        .fetch_optional(pool)
        .await
    }

    /// Sets the manager a user reports to
    ///
    /// Authorization (self-assignment only, same-team only for non-admin
    /// managers) is the policy evaluator's job; this is the raw write.
    pub async fn set_manager(pool: &PgPool, id: Uuid, manager_id: Uuid) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET manager_id = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(manager_id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Permanently deletes a user account
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists the user directory within a role scope, with optional search
    ///
    /// Search matches name, title, email, or role, case-insensitively.
    /// The scope narrows before search is applied; search never widens it.
    pub async fn list_directory(
        pool: &PgPool,
        scope: &UserScope,
        search: Option<&str>,
    ) -> Result<Vec<DirectoryUser>, sqlx::Error> {
        let team = match scope {
            UserScope::All => None,
            UserScope::Team(team) => Some(*team),
            UserScope::Empty => return Ok(Vec::new()),
        };

        let mut query = String::from(
            "SELECT u.id, u.name, u.title, u.role, u.email, u.team, u.is_active, \
                    u.manager_id, m.name AS manager_name \
             FROM users u LEFT JOIN users m ON m.id = u.manager_id \
             WHERE TRUE",
        );
        let mut bind_count = 0;

        if team.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND u.team = ${}", bind_count));
        }
        if search.is_some() {
            bind_count += 1;
            query.push_str(&format!(
                " AND (u.name ILIKE ${n} OR u.title ILIKE ${n} OR u.email ILIKE ${n} \
                   OR u.role::text ILIKE ${n})",
                n = bind_count
            ));
        }
        query.push_str(" ORDER BY u.created_at DESC");

        let mut q = sqlx::query_as::<_, DirectoryUser>(&query);
        if let Some(team) = team {
            q = q.bind(team);
        }
        if let Some(search) = search {
            q = q.bind(format!("%{}%", search));
        }

        q.fetch_all(pool).await
    }

    /// Lists active managers, optionally narrowed to one team
    pub async fn list_managers(pool: &PgPool, team: Option<Team>) -> Result<Vec<UserPick>, sqlx::Error> {
        let mut query = String::from(
            "SELECT id, name, title, role, team FROM users \
             WHERE role = 'manager' AND is_active",
        );
        if team.is_some() {
            query.push_str(" AND team = $1");
        }
        query.push_str(" ORDER BY name");

        let mut q = sqlx::query_as::<_, UserPick>(&query);
        if let Some(team) = team {
            q = q.bind(team);
        }

        q.fetch_all(pool).await
    }

    /// Lists active users reporting to the given manager
    pub async fn list_direct_reports(pool: &PgPool, manager_id: Uuid) -> Result<Vec<UserPick>, sqlx::Error> {
        sqlx::query_as::<_, UserPick>(
            "SELECT id, name, title, role, team FROM users \
             WHERE manager_id = $1 AND is_active ORDER BY name",
        )
        .bind(manager_id)
        .fetch_all(pool)
        .await
    }

    /// Lists users a principal may assign tasks to
    ///
    /// Admin scope returns all active users; a manager's team scope returns
    /// active team leads and members of that team (peer managers and admins
    /// are never assignment candidates).
    pub async fn list_assignment_candidates(
        pool: &PgPool,
        scope: &UserScope,
    ) -> Result<Vec<UserPick>, sqlx::Error> {
        match scope {
            UserScope::All => {
                sqlx::query_as::<_, UserPick>(
                    "SELECT id, name, title, role, team FROM users \
                     WHERE is_active ORDER BY name",
                )
                .fetch_all(pool)
                .await
            }
            UserScope::Team(team) => {
                sqlx::query_as::<_, UserPick>(
                    "SELECT id, name, title, role, team FROM users \
                     WHERE is_active AND team = $1 AND role IN ('team_lead', 'team_member') \
                     ORDER BY name",
                )
                .bind(*team)
                .fetch_all(pool)
                .await
            }
            UserScope::Empty => Ok(Vec::new()),
        }
    }

    /// Fetches the stored team of each given user id
    ///
    /// Used by the cross-team assignment check: every assignee's stored team
    /// must match the assigning manager's team.
    pub async fn teams_of(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<(Uuid, Option<Team>)>, sqlx::Error> {
        sqlx::query_as("SELECT id, team FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Most recently created active users within a scope (dashboard panel)
    pub async fn recent_active(
        pool: &PgPool,
        scope: &UserScope,
        limit: i64,
    ) -> Result<Vec<DirectoryUser>, sqlx::Error> {
        let team = match scope {
            UserScope::All => None,
            UserScope::Team(team) => Some(*team),
            UserScope::Empty => return Ok(Vec::new()),
        };

        let mut query = String::from(
            "SELECT u.id, u.name, u.title, u.role, u.email, u.team, u.is_active, \
                    u.manager_id, m.name AS manager_name \
             FROM users u LEFT JOIN users m ON m.id = u.manager_id \
             WHERE u.is_active",
        );
        if team.is_some() {
            query.push_str(" AND u.team = $2");
        }
        query.push_str(" ORDER BY u.created_at DESC LIMIT $1");

        let mut q = sqlx::query_as::<_, DirectoryUser>(&query).bind(limit);
        if let Some(team) = team {
            q = q.bind(team);
        }

        q.fetch_all(pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_manager_derived_from_role() {
        let mut user = sample_user(Role::Manager);
        assert!(user.is_manager());

        user.role = Role::TeamLead;
        assert!(!user.is_manager());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = sample_user(Role::TeamMember);
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("team_member"));
    }

    #[test]
    fn test_update_profile_default_is_noop() {
        let update = UpdateProfile::default();
        assert!(update.name.is_none());
        assert!(update.role.is_none());
        assert!(update.manager_id.is_none());
    }

    fn sample_user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "secret-hash".to_string(),
            title: "Engineer".to_string(),
            role,
            team: Some(Team::Development),
            manager_id: None,
            is_admin: false,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    // Query tests require a running database; see tests/model_query_tests.rs.
}
