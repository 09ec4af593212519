/// Resolved request caller
///
/// A [`Caller`] is computed once per request from the authenticated user ID and
/// carries everything the registry needs to scope an operation: the caller's
/// role, organisation and (for agents) agent ID.
///
/// # Resolution
///
/// | User                                      | Result                         |
/// |-------------------------------------------|--------------------------------|
/// | `is_organisor = true`, owns organisation  | `Caller::Organisor`            |
/// | `is_organisor = false`, has agent row     | `Caller::Agent`                |
/// | neither                                   | `AuthzError::NoScope`          |
/// | unknown user ID                           | `AuthzError::UnknownUser`      |
///
/// # Visibility
///
/// | Producer                 | Organisor                  | Agent                               |
/// |--------------------------|----------------------------|-------------------------------------|
/// | `visible_leads`          | all leads of organisation  | leads of organisation assigned to it |
/// | `unassigned_leads`       | leads with no agent        | `None`                              |
/// | `visible_categories`     | categories of organisation | categories of organisation          |
/// | `uncategorised_leads`    | uncategorised leads        | uncategorised leads (all of them)   |
/// | `visible_agents`         | agents of organisation     | `None`                              |
///
/// `uncategorised_leads` is organisation-wide for agents too, unlike
/// `visible_leads`. The category overview reports the organisation's backlog.
///
/// # Example
///
/// ```no_run
/// use leadbook_shared::auth::caller::Caller;
/// use leadbook_shared::models::lead::Lead;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let caller = Caller::resolve(&pool, user_id).await?;
/// let leads = Lead::list(&pool, &caller.visible_leads()).await?;
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::authorization::AuthzError;
use crate::models::{agent::Agent, organisation::Organisation, user::User};
use crate::visibility::{AgentFilter, CategoryFilter, LeadFilter};

/// Role of a resolved caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Organisor,
    Agent,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Organisor => "organisor",
            Role::Agent => "agent",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated user with its organisation scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Caller {
    Organisor {
        user_id: Uuid,
        organisation_id: Uuid,
    },
    Agent {
        user_id: Uuid,
        agent_id: Uuid,
        organisation_id: Uuid,
    },
}

impl Caller {
    /// Resolves a user ID into a caller
    ///
    /// # Errors
    ///
    /// - `UnknownUser` if the user does not exist (deleted since the token was issued)
    /// - `NoScope` if the user has neither an owned organisation nor an agent row
    /// - `DatabaseError` on query failure
    pub async fn resolve(pool: &PgPool, user_id: Uuid) -> Result<Self, AuthzError> {
        let user = User::find_by_id(pool, user_id)
            .await?
            .ok_or(AuthzError::UnknownUser(user_id))?;

        let caller = if user.is_organisor {
            Organisation::find_by_owner(pool, user.id)
                .await?
                .map(|organisation| Caller::Organisor {
                    user_id: user.id,
                    organisation_id: organisation.id,
                })
        } else {
            Agent::find_by_user(pool, user.id)
                .await?
                .map(|agent| Caller::Agent {
                    user_id: user.id,
                    agent_id: agent.id,
                    organisation_id: agent.organisation_id,
                })
        };

        caller.ok_or(AuthzError::NoScope(user_id))
    }

    pub fn user_id(&self) -> Uuid {
        match *self {
            Caller::Organisor { user_id, .. } | Caller::Agent { user_id, .. } => user_id,
        }
    }

    pub fn organisation_id(&self) -> Uuid {
        match *self {
            Caller::Organisor { organisation_id, .. } | Caller::Agent { organisation_id, .. } => {
                organisation_id
            }
        }
    }

    /// Agent ID for agent callers
    pub fn agent_id(&self) -> Option<Uuid> {
        match *self {
            Caller::Organisor { .. } => None,
            Caller::Agent { agent_id, .. } => Some(agent_id),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Caller::Organisor { .. } => Role::Organisor,
            Caller::Agent { .. } => Role::Agent,
        }
    }

    pub fn is_organisor(&self) -> bool {
        matches!(self, Caller::Organisor { .. })
    }

    /// Leads the caller may list, view and update
    pub fn visible_leads(&self) -> LeadFilter {
        let filter = LeadFilter::organisation(self.organisation_id());

        match *self {
            Caller::Organisor { .. } => filter,
            Caller::Agent { agent_id, .. } => filter.assigned_to(agent_id),
        }
    }

    /// Unassigned leads, shown to organisors only
    pub fn unassigned_leads(&self) -> Option<LeadFilter> {
        match self {
            Caller::Organisor { organisation_id, .. } => {
                Some(LeadFilter::organisation(*organisation_id).unassigned())
            }
            Caller::Agent { .. } => None,
        }
    }

    pub fn visible_categories(&self) -> CategoryFilter {
        CategoryFilter {
            organisation_id: self.organisation_id(),
        }
    }

    /// The organisation's uncategorised leads, regardless of assignee
    pub fn uncategorised_leads(&self) -> LeadFilter {
        LeadFilter::organisation(self.organisation_id()).uncategorised()
    }

    /// Agents the caller may see, `None` for agents
    pub fn visible_agents(&self) -> Option<AgentFilter> {
        match self {
            Caller::Organisor { organisation_id, .. } => Some(AgentFilter {
                organisation_id: *organisation_id,
            }),
            Caller::Agent { .. } => None,
        }
    }

    pub fn can_create_lead(&self) -> bool {
        self.is_organisor()
    }

    pub fn can_delete_lead(&self) -> bool {
        self.is_organisor()
    }

    pub fn can_assign_agent(&self) -> bool {
        self.is_organisor()
    }

    pub fn can_manage_agents(&self) -> bool {
        self.is_organisor()
    }

    pub fn can_manage_categories(&self) -> bool {
        self.is_organisor()
    }
}
