/// Bearer authentication layer
///
/// Resolves the [`Caller`] once per request and stores it in request
/// extensions. Handlers behind this layer take `Extension<Caller>`.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use leadbook_shared::auth::{caller::Caller, middleware::authenticate};

use crate::{app::AppState, error::ApiError};

pub async fn require_caller(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller: Caller = authenticate(&state.db, state.jwt_secret(), req.headers()).await?;
    req.extensions_mut().insert(caller);

    Ok(next.run(req).await)
}
