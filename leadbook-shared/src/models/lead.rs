/// Lead model and database operations
///
/// Leads are the central entity of the registry. A lead always belongs to one
/// organisation and moves along two independent axes:
///
/// - **assignment**: `agent_id` is `NULL` until an organisor assigns an agent
/// - **categorisation**: `category_id` is `NULL` until someone tags the lead
///
/// Every query except [`Lead::create`] takes a [`LeadFilter`], so reads and writes
/// can only ever touch rows inside the caller's visibility scope. A row outside the
/// scope behaves exactly like a missing row (`None` / `false`).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE leads (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     organisation_id UUID NOT NULL REFERENCES organisations(id) ON DELETE CASCADE,
///     agent_id UUID REFERENCES agents(id) ON DELETE SET NULL,
///     category_id UUID REFERENCES categories(id) ON DELETE SET NULL,
///     first_name VARCHAR(50) NOT NULL,
///     last_name VARCHAR(50) NOT NULL,
///     age INTEGER NOT NULL DEFAULT 0,
///     description TEXT NOT NULL DEFAULT '',
///     email VARCHAR(254),
///     phone_number VARCHAR(20),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use leadbook_shared::models::lead::{Lead, CreateLead};
/// use leadbook_shared::visibility::LeadFilter;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, organisation_id: Uuid) -> Result<(), sqlx::Error> {
/// let lead = Lead::create(&pool, CreateLead {
///     organisation_id,
///     first_name: "Ada".to_string(),
///     last_name: "Prospect".to_string(),
///     age: 41,
///     description: String::new(),
///     email: None,
///     phone_number: None,
/// }).await?;
///
/// let waiting = Lead::list(&pool, &LeadFilter::organisation(organisation_id).unassigned()).await?;
/// assert!(waiting.iter().any(|l| l.id == lead.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::visibility::LeadFilter;

const LEAD_COLUMNS: &str = "leads.id, leads.organisation_id, leads.agent_id, leads.category_id, \
     leads.first_name, leads.last_name, leads.age, leads.description, leads.email, \
     leads.phone_number, leads.created_at, leads.updated_at";

/// Prospect record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lead {
    /// Unique lead ID
    pub id: Uuid,

    /// Owning organisation
    pub organisation_id: Uuid,

    /// Assigned agent (`None` = unassigned)
    pub agent_id: Option<Uuid>,

    /// Category tag (`None` = uncategorised)
    pub category_id: Option<Uuid>,

    pub first_name: String,

    pub last_name: String,

    pub age: i32,

    /// Free-form notes
    pub description: String,

    pub email: Option<String>,

    pub phone_number: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// Whether an agent from `agent_organisation_id` may be assigned to this lead
    pub fn accepts_agent_from(&self, agent_organisation_id: Uuid) -> bool {
        self.organisation_id == agent_organisation_id
    }

    /// Whether a category from `category_organisation_id` may tag this lead
    pub fn accepts_category_from(&self, category_organisation_id: Uuid) -> bool {
        self.organisation_id == category_organisation_id
    }
}

/// Input for creating a lead
///
/// There is deliberately no agent or category here: new leads always start
/// unassigned and uncategorised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLead {
    pub organisation_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub description: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

/// Input for updating a lead
///
/// `None` leaves a field untouched. For the nullable columns (`email`,
/// `phone_number`, `category_id`), `Some(None)` clears the value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateLead {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<i32>,
    pub description: Option<String>,
    pub email: Option<Option<String>>,
    pub phone_number: Option<Option<String>>,
    pub category_id: Option<Option<Uuid>>,
}

impl Lead {
    /// Creates a new, unassigned and uncategorised lead
    pub async fn create<'e, E>(executor: E, data: CreateLead) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let lead = sqlx::query_as::<_, Lead>(&format!(
            r#"
            INSERT INTO leads (organisation_id, first_name, last_name, age, description, email, phone_number)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {LEAD_COLUMNS}
            "#
        ))
        .bind(data.organisation_id)
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.age)
        .bind(data.description)
        .bind(data.email)
        .bind(data.phone_number)
        .fetch_one(executor)
        .await?;

        tracing::debug!(lead_id = %lead.id, organisation_id = %lead.organisation_id, "Lead created");
        Ok(lead)
    }

    /// Lists leads matching a filter, oldest first
    pub async fn list(pool: &PgPool, filter: &LeadFilter) -> Result<Vec<Self>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {LEAD_COLUMNS} FROM leads WHERE "));
        filter.push_predicate(&mut qb);
        qb.push(" ORDER BY leads.created_at ASC, leads.id ASC");

        let leads = qb.build_query_as::<Lead>().fetch_all(pool).await?;
        Ok(leads)
    }

    /// Finds one lead by ID inside a filter
    ///
    /// Returns `None` both when the lead does not exist and when it exists outside
    /// the filter, so callers cannot tell the two apart.
    pub async fn find(pool: &PgPool, filter: &LeadFilter, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {LEAD_COLUMNS} FROM leads WHERE leads.id = "));
        qb.push_bind(id).push(" AND ");
        filter.push_predicate(&mut qb);

        let lead = qb.build_query_as::<Lead>().fetch_optional(pool).await?;
        Ok(lead)
    }

    /// Counts leads matching a filter
    pub async fn count(pool: &PgPool, filter: &LeadFilter) -> Result<i64, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM leads WHERE ");
        filter.push_predicate(&mut qb);

        let (count,): (i64,) = qb.build_query_as().fetch_one(pool).await?;
        Ok(count)
    }

    /// Updates a lead inside a filter
    ///
    /// The category is written as given; callers check that it belongs to the
    /// lead's organisation first.
    pub async fn update(
        pool: &PgPool,
        filter: &LeadFilter,
        id: Uuid,
        data: UpdateLead,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE leads SET updated_at = NOW()");

        if let Some(first_name) = data.first_name {
            qb.push(", first_name = ").push_bind(first_name);
        }
        if let Some(last_name) = data.last_name {
            qb.push(", last_name = ").push_bind(last_name);
        }
        if let Some(age) = data.age {
            qb.push(", age = ").push_bind(age);
        }
        if let Some(description) = data.description {
            qb.push(", description = ").push_bind(description);
        }
        if let Some(email) = data.email {
            qb.push(", email = ").push_bind(email);
        }
        if let Some(phone_number) = data.phone_number {
            qb.push(", phone_number = ").push_bind(phone_number);
        }
        if let Some(category_id) = data.category_id {
            qb.push(", category_id = ").push_bind(category_id);
        }

        qb.push(" WHERE leads.id = ").push_bind(id).push(" AND ");
        filter.push_predicate(&mut qb);
        qb.push(format!(" RETURNING {LEAD_COLUMNS}"));

        let lead = qb.build_query_as::<Lead>().fetch_optional(pool).await?;
        Ok(lead)
    }

    /// Assigns an agent to a lead inside a filter
    pub async fn assign_agent(
        pool: &PgPool,
        filter: &LeadFilter,
        id: Uuid,
        agent_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE leads SET updated_at = NOW(), agent_id = ");
        qb.push_bind(agent_id);
        qb.push(" WHERE leads.id = ").push_bind(id).push(" AND ");
        filter.push_predicate(&mut qb);
        qb.push(format!(" RETURNING {LEAD_COLUMNS}"));

        let lead = qb.build_query_as::<Lead>().fetch_optional(pool).await?;
        Ok(lead)
    }

    /// Sets or clears the category of a lead inside a filter
    pub async fn set_category(
        pool: &PgPool,
        filter: &LeadFilter,
        id: Uuid,
        category_id: Option<Uuid>,
    ) -> Result<Option<Self>, sqlx::Error> {
        Self::update(
            pool,
            filter,
            id,
            UpdateLead {
                category_id: Some(category_id),
                ..Default::default()
            },
        )
        .await
    }

    /// Hard-deletes a lead inside a filter
    pub async fn delete(pool: &PgPool, filter: &LeadFilter, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM leads WHERE leads.id = ");
        qb.push_bind(id).push(" AND ");
        filter.push_predicate(&mut qb);

        let result = qb.build().execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
