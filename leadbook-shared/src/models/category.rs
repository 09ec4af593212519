/// Category model and database operations
///
/// Categories are per-organisation stage tags ("New", "Contacted", "Converted",
/// ...). Names are unique within an organisation; deleting a category leaves its
/// leads uncategorised.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE categories (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     organisation_id UUID NOT NULL REFERENCES organisations(id) ON DELETE CASCADE,
///     name VARCHAR(30) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (organisation_id, name)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::visibility::CategoryFilter;

const CATEGORY_COLUMNS: &str =
    "categories.id, categories.organisation_id, categories.name, categories.created_at";

/// Organisation-scoped lead tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategory {
    pub organisation_id: Uuid,
    pub name: String,
}

impl Category {
    /// Creates a category
    ///
    /// # Errors
    ///
    /// Unique violation (`categories_organisation_name_key`) if the organisation
    /// already has a category with this name.
    pub async fn create<'e, E>(executor: E, data: CreateCategory) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let category = sqlx::query_as::<_, Category>(&format!(
            r#"
            INSERT INTO categories (organisation_id, name)
            VALUES ($1, $2)
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(data.organisation_id)
        .bind(data.name.trim())
        .fetch_one(executor)
        .await?;

        Ok(category)
    }

    /// Lists categories matching a filter, by name
    pub async fn list(pool: &PgPool, filter: &CategoryFilter) -> Result<Vec<Self>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE "
        ));
        filter.push_predicate(&mut qb);
        qb.push(" ORDER BY categories.name ASC");

        let categories = qb.build_query_as::<Category>().fetch_all(pool).await?;
        Ok(categories)
    }

    /// Finds one category by ID inside a filter
    pub async fn find(
        pool: &PgPool,
        filter: &CategoryFilter,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE categories.id = "
        ));
        qb.push_bind(id).push(" AND ");
        filter.push_predicate(&mut qb);

        let category = qb.build_query_as::<Category>().fetch_optional(pool).await?;
        Ok(category)
    }

    /// Renames a category inside a filter
    pub async fn rename(
        pool: &PgPool,
        filter: &CategoryFilter,
        id: Uuid,
        name: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE categories SET name = ");
        qb.push_bind(name.trim().to_string());
        qb.push(" WHERE categories.id = ").push_bind(id).push(" AND ");
        filter.push_predicate(&mut qb);
        qb.push(format!(" RETURNING {CATEGORY_COLUMNS}"));

        let category = qb.build_query_as::<Category>().fetch_optional(pool).await?;
        Ok(category)
    }

    /// Deletes a category inside a filter
    pub async fn delete(pool: &PgPool, filter: &CategoryFilter, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM categories WHERE categories.id = ");
        qb.push_bind(id).push(" AND ");
        filter.push_predicate(&mut qb);

        let result = qb.build().execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
