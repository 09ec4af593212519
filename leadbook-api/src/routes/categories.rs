/// Category endpoints
///
/// Both roles see every category of their organisation. Only organisors create,
/// rename or delete them.
///
/// The list carries `unassigned_lead_count`: the number of the organisation's
/// leads without a category. For agents this is still organisation-wide, not
/// narrowed to their own leads.

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
    },
    models::{
        category::{Category, CreateCategory},
        lead::Lead,
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub categories: Vec<Category>,
    pub unassigned_lead_count: i64,
}

/// A category with the leads in it the caller can see
#[derive(Debug, Serialize)]
pub struct CategoryDetailResponse {
    pub category: Category,
    pub leads: Vec<Lead>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(
        length(min = 1, max = 30, message = "Name must be 1-30 characters"),
        custom(function = "not_blank", message = "Name must not be blank")
    )]
    pub name: String,
}

pub async fn list_categories(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<CategoryListResponse>> {
    require(&caller, Action::ListCategories)?;

    let categories = Category::list(&state.db, &caller.visible_categories()).await?;
    let unassigned_lead_count = Lead::count(&state.db, &caller.uncategorised_leads()).await?;

    Ok(Json(CategoryListResponse {
        categories,
        unassigned_lead_count,
    }))
}

pub async fn get_category(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CategoryDetailResponse>> {
    require(&caller, Action::ViewCategory)?;

    let category = Category::find(&state.db, &caller.visible_categories(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category"))?;

    let leads = Lead::list(&state.db, &caller.visible_leads().in_category(category.id)).await?;

    Ok(Json(CategoryDetailResponse { category, leads }))
}

pub async fn create_category(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<CategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    require(&caller, Action::ManageCategories)?;
    req.validate()?;

    let category = Category::create(
        &state.db,
        CreateCategory {
            organisation_id: caller.organisation_id(),
            name: req.name,
        },
    )
    .await?;

    tracing::info!(
        category_id = %category.id,
        organisation_id = %category.organisation_id,
        "Category created"
    );
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn rename_category(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(req): Json<CategoryRequest>,
) -> ApiResult<Json<Category>> {
    require(&caller, Action::ManageCategories)?;
    req.validate()?;

    let category = Category::rename(&state.db, &caller.visible_categories(), id, &req.name)
        .await?
        .ok_or_else(|| ApiError::not_found("Category"))?;

    tracing::info!(category_id = %id, "Category renamed");
    Ok(Json(category))
}

/// Deletes a category; its leads become uncategorised
pub async fn delete_category(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require(&caller, Action::ManageCategories)?;

    if !Category::delete(&state.db, &caller.visible_categories(), id).await? {
        return Err(ApiError::not_found("Category"));
    }

    tracing::info!(category_id = %id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}
