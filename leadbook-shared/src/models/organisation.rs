/// Organisation model and database operations
///
/// An organisation is the isolation boundary: every agent, lead and category
/// belongs to exactly one organisation, and each organisation is owned by exactly
/// one organisor user (1:1).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE organisations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     owner_id UUID NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Organisation owned by an organisor
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organisation {
    /// Unique organisation ID
    pub id: Uuid,

    /// Organisor user who owns this organisation
    pub owner_id: Uuid,

    /// Display name
    pub name: String,

    /// When the organisation was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating an organisation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganisation {
    /// Organisor user ID
    pub owner_id: Uuid,

    /// Display name
    pub name: String,
}

impl Organisation {
    /// Creates an organisation for an organisor
    ///
    /// # Errors
    ///
    /// Fails with a unique violation (`organisations_owner_id_key`) if the user
    /// already owns an organisation.
    pub async fn create<'e, E>(executor: E, data: CreateOrganisation) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let organisation = sqlx::query_as::<_, Organisation>(
            r#"
            INSERT INTO organisations (owner_id, name)
            VALUES ($1, $2)
            RETURNING id, owner_id, name, created_at
            "#,
        )
        .bind(data.owner_id)
        .bind(data.name)
        .fetch_one(executor)
        .await?;

        Ok(organisation)
    }

    /// Finds an organisation by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Organisation>(
            "SELECT id, owner_id, name, created_at FROM organisations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Finds the organisation owned by a user
    ///
    /// Returns `None` for agent users and for organisors whose organisation is
    /// missing.
    pub async fn find_by_owner<'e, E>(executor: E, owner_id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Organisation>(
            "SELECT id, owner_id, name, created_at FROM organisations WHERE owner_id = $1",
        )
        .bind(owner_id)
        .fetch_optional(executor)
        .await
    }
}
