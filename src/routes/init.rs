use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::Utc;

use crate::{
    dto::init_dto::{InitRequest, InitResponse},
    error::{Error, Result},
    utils::telegram_auth::InitData,
    AppState,
};

pub async fn init_mini_app(
    State(state): State<AppState>,
    payload: std::result::Result<Json<InitRequest>, JsonRejection>,
) -> Result<Json<InitResponse>> {
    let Json(request) = payload?;

    let init_data = InitData::parse(&request.init_data);
    if !init_data.verify(state.bot_token()) {
        tracing::warn!("Rejected mini-app init data with invalid signature");
        return Err(Error::Unauthorized("Invalid signature".to_string()));
    }

    let user_id = init_data.user_id();
    tracing::info!(
        user_id = ?user_id,
        fields = init_data.fields().len(),
        "Mini-app session initialized"
    );

    Ok(Json(InitResponse {
        status: "ok".to_string(),
        user_data: init_data.into_fields(),
        user_id,
        timestamp: Utc::now(),
    }))
}
