use crate::models::ApiKeyCheck;
use crate::services::search_service;
use crate::AppState;
use rocket::serde::json::Json;
use rocket::{get, State};

#[get("/health/api-key")]
pub async fn check_api_key(state: &State<AppState>) -> Json<ApiKeyCheck> {
    Json(search_service::check_api_key(state.provider.as_ref()).await)
}
