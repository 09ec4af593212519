/// Agent management endpoints (organisors only)
///
/// - `GET /v1/agents` - List agents of the caller's organisation
/// - `POST /v1/agents` - Provision a user and link it as an agent
/// - `GET /v1/agents/:id` - Agent profile
/// - `PUT /v1/agents/:id` - Update the agent's email or names
/// - `DELETE /v1/agents/:id` - Delete the agent and its user
///
/// Deleting an agent leaves its leads in place, unassigned.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::not_blank,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use leadbook_shared::{
    auth::{
        authorization::{require, Action},
        caller::Caller,
        password,
    },
    models::{
        agent::{Agent, AgentProfile, CreateAgent},
        organisation::Organisation,
        user::{CreateUser, UpdateUser, User},
    },
    notify::{self, dispatch_best_effort},
    visibility::AgentFilter,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAgentRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(
        length(max = 150, message = "First name must be at most 150 characters"),
        custom(function = "not_blank", message = "First name must not be blank")
    )]
    pub first_name: String,

    #[validate(
        length(max = 150, message = "Last name must be at most 150 characters"),
        custom(function = "not_blank", message = "Last name must not be blank")
    )]
    pub last_name: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateAgentRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(
        length(max = 150, message = "First name must be at most 150 characters"),
        custom(function = "not_blank", message = "First name must not be blank")
    )]
    pub first_name: Option<String>,

    #[validate(
        length(max = 150, message = "Last name must be at most 150 characters"),
        custom(function = "not_blank", message = "Last name must not be blank")
    )]
    pub last_name: Option<String>,
}

/// Role gate plus the organisation filter for agent queries
fn agent_scope(caller: &Caller, action: Action) -> ApiResult<AgentFilter> {
    require(caller, action)?;

    let filter = caller
        .visible_agents()
        .ok_or_else(|| ApiError::Forbidden(format!("Organisor role required for {action}")))?;
    Ok(filter)
}

pub async fn list_agents(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<Vec<AgentProfile>>> {
    let filter = agent_scope(&caller, Action::ListAgents)?;

    let agents = Agent::list(&state.db, &filter).await?;
    Ok(Json(agents))
}

pub async fn get_agent(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AgentProfile>> {
    let filter = agent_scope(&caller, Action::ViewAgent)?;

    let agent = Agent::find(&state.db, &filter, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Agent"))?;
    Ok(Json(agent))
}

/// Provisions a new agent
///
/// Creates a non-organisor user with a random temporary password and links it
/// to the caller's organisation, both in one transaction. The temporary password
/// is only ever sent in the invitation notification.
///
/// # Errors
///
/// - `403 Forbidden`: caller is an agent
/// - `409 Conflict`: email already registered
/// - `422 Unprocessable Entity`: validation failed
pub async fn create_agent(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<CreateAgentRequest>,
) -> ApiResult<(StatusCode, Json<AgentProfile>)> {
    let filter = agent_scope(&caller, Action::ManageAgents)?;
    req.validate()?;

    let temporary_password = password::generate_temporary_password();
    let password_hash = password::hash_password(&temporary_password)?;

    let mut tx = state.db.begin().await?;

    let user = User::create(
        &mut *tx,
        CreateUser {
            email: req.email,
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            password_hash,
            is_organisor: false,
        },
    )
    .await?;

    let agent = Agent::create(
        &mut *tx,
        CreateAgent {
            user_id: user.id,
            organisation_id: filter.organisation_id,
        },
    )
    .await?;

    let organisation = Organisation::find_by_id(&mut *tx, filter.organisation_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Organisation"))?;

    tx.commit().await?;

    tracing::info!(
        agent_id = %agent.id,
        user_id = %user.id,
        organisation_id = %agent.organisation_id,
        "Agent created"
    );

    dispatch_best_effort(
        state.notifier.clone(),
        notify::agent_invitation(
            &state.config.notify.from,
            &user.email,
            &organisation.name,
            &temporary_password,
        ),
    );

    let profile = AgentProfile {
        id: agent.id,
        user_id: user.id,
        organisation_id: agent.organisation_id,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        created_at: agent.created_at,
    };

    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn update_agent(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAgentRequest>,
) -> ApiResult<Json<AgentProfile>> {
    let filter = agent_scope(&caller, Action::ManageAgents)?;

    let agent = Agent::find(&state.db, &filter, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Agent"))?;

    req.validate()?;

    let update = UpdateUser {
        email: req.email,
        first_name: req.first_name.map(|s| s.trim().to_string()),
        last_name: req.last_name.map(|s| s.trim().to_string()),
    };
    if update.is_empty() {
        return Ok(Json(agent));
    }

    let user = User::update(&state.db, agent.user_id, update)
        .await?
        .ok_or_else(|| ApiError::not_found("Agent"))?;

    tracing::info!(agent_id = %agent.id, user_id = %user.id, "Agent updated");

    Ok(Json(AgentProfile {
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        ..agent
    }))
}

/// Deletes the agent together with its user account
pub async fn delete_agent(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let filter = agent_scope(&caller, Action::ManageAgents)?;

    let agent = Agent::find(&state.db, &filter, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Agent"))?;

    if !User::delete(&state.db, agent.user_id).await? {
        return Err(ApiError::not_found("Agent"));
    }

    tracing::info!(agent_id = %agent.id, user_id = %agent.user_id, "Agent deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn organisor() -> Caller {
        Caller::Organisor {
            user_id: Uuid::new_v4(),
            organisation_id: Uuid::new_v4(),
        }
    }

    fn agent() -> Caller {
        Caller::Agent {
            user_id: Uuid::new_v4(),
            agent_id: Uuid::new_v4(),
            organisation_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_agent_scope_for_organisor() {
        let caller = organisor();
        let filter = agent_scope(&caller, Action::ListAgents).unwrap();
        assert_eq!(filter.organisation_id, caller.organisation_id());
    }

    #[test]
    fn test_agent_scope_denied_for_agent() {
        for action in [Action::ListAgents, Action::ViewAgent, Action::ManageAgents] {
            let err = agent_scope(&agent(), action).unwrap_err();
            assert_eq!(err.status(), StatusCode::FORBIDDEN);
        }
    }

    #[test]
    fn test_create_request_validation() {
        let req = CreateAgentRequest {
            email: "agent@example.com".to_string(),
            first_name: "Sam".to_string(),
            last_name: "Seller".to_string(),
        };
        assert!(req.validate().is_ok());

        let req = CreateAgentRequest {
            email: "agent".to_string(),
            ..req
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_empty_update_is_valid() {
        assert!(UpdateAgentRequest::default().validate().is_ok());
    }

    #[test]
    fn test_blank_names_rejected() {
        let req = CreateAgentRequest {
            email: "agent@example.com".to_string(),
            first_name: " ".to_string(),
            last_name: "Seller".to_string(),
        };
        assert!(req.validate().is_err());

        let req = UpdateAgentRequest {
            last_name: Some("\n".to_string()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }
}
