/// Lead endpoints
///
/// Every query runs through the caller's visibility filter: an organisor sees the
/// whole organisation, an agent sees only the leads assigned to them. A lead
/// outside that filter answers `404`, exactly like a lead that does not exist.
///
/// | Endpoint                        | Organisor | Agent          |
/// |---------------------------------|-----------|----------------|
/// | `GET /v1/leads`                 | all + unassigned | assigned |
/// | `POST /v1/leads`                | yes       | `403`          |
/// | `GET /v1/leads/:id`             | yes       | assigned only  |
/// | `PUT /v1/leads/:id`             | yes       | assigned only  |
/// | `DELETE /v1/leads/:id`          | yes       | `403`          |
/// | `POST /v1/leads/:id/assign`     | yes       | `403`          |
/// | `PUT /v1/leads/:id/category`    | yes       | assigned only  |

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{double_option, not_blank},
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
    },
    models::{
        agent::Agent,
        category::Category,
        lead::{CreateLead, Lead, UpdateLead},
    },
    notify::{self, dispatch_best_effort},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct LeadListResponse {
    pub leads: Vec<Lead>,

    /// Organisors only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unassigned_leads: Option<Vec<Lead>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLeadRequest {
    #[validate(
        length(max = 50, message = "First name must be at most 50 characters"),
        custom(function = "not_blank", message = "First name must not be blank")
    )]
    pub first_name: String,

    #[validate(
        length(max = 50, message = "Last name must be at most 50 characters"),
        custom(function = "not_blank", message = "Last name must not be blank")
    )]
    pub last_name: String,

    #[validate(range(min = 0, max = 150, message = "Age must be between 0 and 150"))]
    pub age: i32,

    #[serde(default)]
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(max = 20, message = "Phone number must be at most 20 characters"))]
    pub phone_number: Option<String>,
}

/// Partial update; absent fields are left alone, `null` clears the nullable ones
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateLeadRequest {
    #[validate(
        length(max = 50, message = "First name must be at most 50 characters"),
        custom(function = "not_blank", message = "First name must not be blank")
    )]
    pub first_name: Option<String>,

    #[validate(
        length(max = 50, message = "Last name must be at most 50 characters"),
        custom(function = "not_blank", message = "Last name must not be blank")
    )]
    pub last_name: Option<String>,

    #[validate(range(min = 0, max = 150, message = "Age must be between 0 and 150"))]
    pub age: Option<i32>,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 20, message = "Phone number must be at most 20 characters"))]
    pub phone_number: Option<Option<String>>,

    /// `null` clears the category
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<Uuid>>,
}

#[derive(Debug, Deserialize)]
pub struct AssignAgentRequest {
    pub agent_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct LeadCategoryRequest {
    /// `null` or absent clears the category
    #[serde(default)]
    pub category_id: Option<Uuid>,
}

/// Result of a category change, pointing back at the lead
#[derive(Debug, Serialize)]
pub struct LeadCategoryResponse {
    pub lead: Lead,
    pub lead_url: String,
}

pub async fn list_leads(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<LeadListResponse>> {
    require(&caller, Action::ListLeads)?;

    let leads = Lead::list(&state.db, &caller.visible_leads()).await?;

    let unassigned_leads = match caller.unassigned_leads() {
        Some(filter) => Some(Lead::list(&state.db, &filter).await?),
        None => None,
    };

    Ok(Json(LeadListResponse {
        leads,
        unassigned_leads,
    }))
}

pub async fn get_lead(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Lead>> {
    require(&caller, Action::ViewLead)?;

    let lead = Lead::find(&state.db, &caller.visible_leads(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lead"))?;

    Ok(Json(lead))
}

/// Creates an unassigned, uncategorised lead in the caller's organisation
///
/// After the insert a "lead created" notification is handed to the notifier on a
/// detached task; its outcome never changes this response.
pub async fn create_lead(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<CreateLeadRequest>,
) -> ApiResult<(StatusCode, Json<Lead>)> {
    require(&caller, Action::CreateLead)?;
    req.validate()?;

    let lead = Lead::create(
        &state.db,
        CreateLead {
            organisation_id: caller.organisation_id(),
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            age: req.age,
            description: req.description,
            email: req.email,
            phone_number: req.phone_number,
        },
    )
    .await?;

    tracing::info!(
        lead_id = %lead.id,
        organisation_id = %lead.organisation_id,
        user_id = %caller.user_id(),
        "Lead created"
    );

    let notify_config = &state.config.notify;
    dispatch_best_effort(
        state.notifier.clone(),
        notify::lead_created(&notify_config.from, &notify_config.recipients),
    );

    Ok((StatusCode::CREATED, Json(lead)))
}

pub async fn update_lead(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateLeadRequest>,
) -> ApiResult<Json<Lead>> {
    require(&caller, Action::UpdateLead)?;

    let filter = caller.visible_leads();
    let lead = Lead::find(&state.db, &filter, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lead"))?;

    req.validate()?;
    if let Some(Some(category_id)) = req.category_id {
        ensure_category(&state, &caller, &lead, category_id).await?;
    }

    let updated = Lead::update(
        &state.db,
        &filter,
        id,
        UpdateLead {
            first_name: req.first_name.map(|s| s.trim().to_string()),
            last_name: req.last_name.map(|s| s.trim().to_string()),
            age: req.age,
            description: req.description,
            email: req.email,
            phone_number: req.phone_number,
            category_id: req.category_id,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Lead"))?;

    tracing::info!(lead_id = %id, user_id = %caller.user_id(), "Lead updated");
    Ok(Json(updated))
}

pub async fn delete_lead(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require(&caller, Action::DeleteLead)?;

    if !Lead::delete(&state.db, &caller.visible_leads(), id).await? {
        return Err(ApiError::not_found("Lead"));
    }

    tracing::info!(lead_id = %id, user_id = %caller.user_id(), "Lead deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Assigns an agent of the caller's organisation to a lead
///
/// # Errors
///
/// - `403 Forbidden`: caller is an agent
/// - `404 Not Found`: lead outside the caller's organisation
/// - `422 Unprocessable Entity` (field `agent`): agent from another organisation;
///   the lead is left unchanged
pub async fn assign_agent(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignAgentRequest>,
) -> ApiResult<Json<Lead>> {
    require(&caller, Action::AssignAgent)?;

    let filter = caller.visible_leads();
    let lead = Lead::find(&state.db, &filter, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lead"))?;

    let agent_filter = caller
        .visible_agents()
        .ok_or_else(|| ApiError::Forbidden("Organisor role required".to_string()))?;

    let agent = Agent::find(&state.db, &agent_filter, req.agent_id)
        .await?
        .filter(|agent| lead.accepts_agent_from(agent.organisation_id))
        .ok_or_else(|| ApiError::invalid("agent", "Agent is not in your organisation"))?;

    let updated = Lead::assign_agent(&state.db, &filter, id, agent.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lead"))?;

    tracing::info!(lead_id = %id, agent_id = %agent.id, "Agent assigned");
    Ok(Json(updated))
}

/// Sets or clears a lead's category
pub async fn update_lead_category(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(req): Json<LeadCategoryRequest>,
) -> ApiResult<Json<LeadCategoryResponse>> {
    require(&caller, Action::UpdateLeadCategory)?;

    let filter = caller.visible_leads();
    let lead = Lead::find(&state.db, &filter, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lead"))?;

    if let Some(category_id) = req.category_id {
        ensure_category(&state, &caller, &lead, category_id).await?;
    }

    let updated = Lead::set_category(&state.db, &filter, id, req.category_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lead"))?;

    tracing::info!(lead_id = %id, category_id = ?req.category_id, "Lead category changed");

    Ok(Json(LeadCategoryResponse {
        lead_url: lead_url(updated.id),
        lead: updated,
    }))
}

pub fn lead_url(id: Uuid) -> String {
    format!("/v1/leads/{id}")
}

/// Fails with a `category` validation error unless the category belongs to the
/// lead's organisation
async fn ensure_category(
    state: &AppState,
    caller: &Caller,
    lead: &Lead,
    category_id: Uuid,
) -> ApiResult<()> {
    let category = Category::find(&state.db, &caller.visible_categories(), category_id).await?;

    match category {
        Some(category) if lead.accepts_category_from(category.organisation_id) => Ok(()),
        _ => Err(ApiError::invalid("category", "Category is not in your organisation")),
    }
}
