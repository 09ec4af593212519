/// Visibility filters
///
/// Every read or write in the registry goes through one of these filters. A filter
/// is always pinned to a single organisation, so nothing outside the caller's
/// organisation can be selected, counted, updated or deleted.
///
/// Each filter renders its predicate into a `QueryBuilder` through
/// `push_predicate`. [`LeadFilter::matches`] evaluates the lead rule in memory
/// and must agree with the SQL rendering.
///
/// Filters are produced by [`Caller`](crate::auth::caller::Caller); handlers never
/// build them from raw request input.

use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::lead::Lead;

/// Constraint on a lead's assigned agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "agent_id")]
pub enum Assignee {
    /// Any assignment state
    Any,

    /// Assigned to this agent
    Agent(Uuid),

    /// `agent IS NULL`
    Unassigned,
}

/// Constraint on a lead's category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "category_id")]
pub enum CategoryMatch {
    /// Any category state
    Any,

    /// Tagged with this category
    Is(Uuid),

    /// `category IS NULL`
    Uncategorised,
}

/// Lead selection scoped to one organisation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadFilter {
    /// Organisation every selected lead belongs to
    pub organisation_id: Uuid,

    /// Assignment constraint
    pub assignee: Assignee,

    /// Category constraint
    pub category: CategoryMatch,
}

impl LeadFilter {
    /// All leads of an organisation
    pub fn organisation(organisation_id: Uuid) -> Self {
        Self {
            organisation_id,
            assignee: Assignee::Any,
            category: CategoryMatch::Any,
        }
    }

    /// Narrows to leads assigned to one agent
    pub fn assigned_to(mut self, agent_id: Uuid) -> Self {
        self.assignee = Assignee::Agent(agent_id);
        self
    }

    /// Narrows to leads with no agent
    pub fn unassigned(mut self) -> Self {
        self.assignee = Assignee::Unassigned;
        self
    }

    /// Narrows to leads tagged with one category
    pub fn in_category(mut self, category_id: Uuid) -> Self {
        self.category = CategoryMatch::Is(category_id);
        self
    }

    /// Narrows to leads with no category
    pub fn uncategorised(mut self) -> Self {
        self.category = CategoryMatch::Uncategorised;
        self
    }

    /// Appends the predicate (without `WHERE`) over the `leads` table
    pub fn push_predicate(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push("leads.organisation_id = ")
            .push_bind(self.organisation_id);

        match self.assignee {
            Assignee::Any => {}
            Assignee::Agent(agent_id) => {
                qb.push(" AND leads.agent_id = ").push_bind(agent_id);
            }
            Assignee::Unassigned => {
                qb.push(" AND leads.agent_id IS NULL");
            }
        }

        match self.category {
            CategoryMatch::Any => {}
            CategoryMatch::Is(category_id) => {
                qb.push(" AND leads.category_id = ").push_bind(category_id);
            }
            CategoryMatch::Uncategorised => {
                qb.push(" AND leads.category_id IS NULL");
            }
        }
    }

    /// Evaluates the filter against a loaded lead
    pub fn matches(&self, lead: &Lead) -> bool {
        if lead.organisation_id != self.organisation_id {
            return false;
        }

        let assignee_ok = match self.assignee {
            Assignee::Any => true,
            Assignee::Agent(agent_id) => lead.agent_id == Some(agent_id),
            Assignee::Unassigned => lead.agent_id.is_none(),
        };

        let category_ok = match self.category {
            CategoryMatch::Any => true,
            CategoryMatch::Is(category_id) => lead.category_id == Some(category_id),
            CategoryMatch::Uncategorised => lead.category_id.is_none(),
        };

        assignee_ok && category_ok
    }
}

/// Category selection scoped to one organisation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFilter {
    /// Organisation every selected category belongs to
    pub organisation_id: Uuid,
}

impl CategoryFilter {
    pub fn push_predicate(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push("categories.organisation_id = ")
            .push_bind(self.organisation_id);
    }
}

/// Agent selection scoped to one organisation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentFilter {
    /// Organisation every selected agent belongs to
    pub organisation_id: Uuid,
}

impl AgentFilter {
    pub fn push_predicate(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push("agents.organisation_id = ")
            .push_bind(self.organisation_id);
    }
}
