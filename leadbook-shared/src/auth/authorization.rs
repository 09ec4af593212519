/// Authorization gate
///
/// Role checks happen here, before any query runs. Scope checks (which rows a
/// caller can reach) are not done here: they are part of the filter every model
/// query takes, so an out-of-scope row simply comes back as missing.
///
/// # Example
///
/// ```
/// use leadbook_shared::auth::authorization::{require, Action, AuthzError};
/// use leadbook_shared::auth::caller::Caller;
/// use uuid::Uuid;
///
/// let agent = Caller::Agent {
///     user_id: Uuid::new_v4(),
///     agent_id: Uuid::new_v4(),
///     organisation_id: Uuid::new_v4(),
/// };
///
/// assert!(require(&agent, Action::UpdateLead).is_ok());
/// assert!(matches!(
///     require(&agent, Action::DeleteLead),
///     Err(AuthzError::PermissionDenied(Action::DeleteLead))
/// ));
/// ```

use serde::Serialize;
use uuid::Uuid;

use super::caller::Caller;

#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Token subject no longer exists
    #[error("Unknown user {0}")]
    UnknownUser(Uuid),

    /// User is neither an organisation owner nor an agent
    #[error("User {0} has no organisation")]
    NoScope(Uuid),

    #[error("Permission denied: {0}")]
    PermissionDenied(Action),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Registry operations subject to a role check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ListLeads,
    ViewLead,
    CreateLead,
    UpdateLead,
    DeleteLead,
    AssignAgent,
    UpdateLeadCategory,
    ListCategories,
    ViewCategory,
    ManageCategories,
    ListAgents,
    ViewAgent,
    ManageAgents,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ListLeads => "list_leads",
            Action::ViewLead => "view_lead",
            Action::CreateLead => "create_lead",
            Action::UpdateLead => "update_lead",
            Action::DeleteLead => "delete_lead",
            Action::AssignAgent => "assign_agent",
            Action::UpdateLeadCategory => "update_lead_category",
            Action::ListCategories => "list_categories",
            Action::ViewCategory => "view_category",
            Action::ManageCategories => "manage_categories",
            Action::ListAgents => "list_agents",
            Action::ViewAgent => "view_agent",
            Action::ManageAgents => "manage_agents",
        }
    }

    /// Whether the caller's role permits this action at all
    pub fn permitted_for(&self, caller: &Caller) -> bool {
        match self {
            Action::ListLeads
            | Action::ViewLead
            | Action::UpdateLead
            | Action::UpdateLeadCategory
            | Action::ListCategories
            | Action::ViewCategory => true,
            Action::CreateLead => caller.can_create_lead(),
            Action::DeleteLead => caller.can_delete_lead(),
            Action::AssignAgent => caller.can_assign_agent(),
            Action::ManageCategories => caller.can_manage_categories(),
            Action::ListAgents | Action::ViewAgent | Action::ManageAgents => {
                caller.can_manage_agents()
            }
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fails with `PermissionDenied` unless the caller's role permits `action`
pub fn require(caller: &Caller, action: Action) -> Result<(), AuthzError> {
    if !action.permitted_for(caller) {
        tracing::debug!(
            user_id = %caller.user_id(),
            role = %caller.role(),
            action = %action,
            "Permission denied"
        );
        return Err(AuthzError::PermissionDenied(action));
    }

    Ok(())
}
