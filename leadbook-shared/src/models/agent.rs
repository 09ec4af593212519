/// Agent model and database operations
///
/// An agent is a salesperson inside one organisation. Each agent owns exactly one
/// non-organisor [`User`](super::user::User); deleting the agent's user cascades to
/// the agent row, and leads assigned to it fall back to unassigned
/// (`ON DELETE SET NULL`).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE agents (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
///     organisation_id UUID NOT NULL REFERENCES organisations(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::visibility::AgentFilter;

const PROFILE_COLUMNS: &str = "agents.id, agents.user_id, agents.organisation_id, \
     users.email, users.first_name, users.last_name, agents.created_at";

/// Agent row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Agent {
    /// Unique agent ID
    pub id: Uuid,

    /// Linked user account
    pub user_id: Uuid,

    /// Organisation the agent works for
    pub organisation_id: Uuid,

    /// When the agent was created
    pub created_at: DateTime<Utc>,
}

/// Agent joined with its user's profile fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AgentProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub organisation_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAgent {
    /// Freshly provisioned non-organisor user
    pub user_id: Uuid,

    /// Organisation of the organisor creating the agent
    pub organisation_id: Uuid,
}

impl Agent {
    /// Links a user to an organisation as an agent
    ///
    /// # Errors
    ///
    /// Fails with a unique violation (`agents_user_id_key`) if the user already
    /// has an agent row.
    pub async fn create<'e, E>(executor: E, data: CreateAgent) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let agent = sqlx::query_as::<_, Agent>(
            r#"
            INSERT INTO agents (user_id, organisation_id)
            VALUES ($1, $2)
            RETURNING id, user_id, organisation_id, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.organisation_id)
        .fetch_one(executor)
        .await?;

        Ok(agent)
    }

    /// Finds the agent row linked to a user
    pub async fn find_by_user<'e, E>(executor: E, user_id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Agent>(
            "SELECT id, user_id, organisation_id, created_at FROM agents WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(executor)
        .await
    }

    /// Lists agent profiles matching a filter, oldest first
    pub async fn list(pool: &PgPool, filter: &AgentFilter) -> Result<Vec<AgentProfile>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PROFILE_COLUMNS} FROM agents JOIN users ON users.id = agents.user_id WHERE "
        ));
        filter.push_predicate(&mut qb);
        qb.push(" ORDER BY agents.created_at ASC, agents.id ASC");

        let agents = qb.build_query_as::<AgentProfile>().fetch_all(pool).await?;
        Ok(agents)
    }

    /// Finds one agent profile by ID inside a filter
    pub async fn find(
        pool: &PgPool,
        filter: &AgentFilter,
        id: Uuid,
    ) -> Result<Option<AgentProfile>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PROFILE_COLUMNS} FROM agents JOIN users ON users.id = agents.user_id WHERE agents.id = "
        ));
        qb.push_bind(id).push(" AND ");
        filter.push_predicate(&mut qb);

        let agent = qb.build_query_as::<AgentProfile>().fetch_optional(pool).await?;
        Ok(agent)
    }
}
